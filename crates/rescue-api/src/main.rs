//! rescue-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `RESCUE_*` environment variables, opens the SQLite store and the media
//! directory, and serves the REST API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use rescue_api::{AppState, ServerConfig};
use rescue_media_fs::DiskMediaStore;
use rescue_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Animal-rescue coordination API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("RESCUE").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let media_dir = expand_tilde(&server_cfg.media_dir);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let media = DiskMediaStore::open(&media_dir, &server_cfg.media_base_url)
    .await
    .with_context(|| format!("failed to open media directory {media_dir:?}"))?;

  let state = AppState {
    store:        Arc::new(store),
    media:        Arc::new(media),
    auth:         Arc::new(server_cfg.auth_config()),
    media_policy: server_cfg.media_policy(),
  };

  // Uploaded media is served from disk unless it lives on another host.
  let mut app = rescue_api::router(state);
  let mount = server_cfg.media_base_url.trim_end_matches('/');
  if mount.starts_with('/') {
    app = app.nest_service(mount, ServeDir::new(&media_dir));
  }
  let app = app.layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
