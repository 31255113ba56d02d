//! Session and profile endpoints shared by every account kind.
//!
//! | Method  | Path                | Notes |
//! |---------|---------------------|-------|
//! | `POST`  | `.../login`         | JSON `{email \| username, password}` |
//! | `POST`  | `.../refresh-token` | cookie, JSON `{refreshToken}`, or bearer |
//! | `POST`  | `.../logout`        | clears the stored refresh token |
//! | `GET`   | `.../current-*`     | the sanitised account |
//! | `PATCH` | `.../change-password` | JSON `{oldPassword, newPassword}` |
//!
//! Each handler is generic over a [`Role`] and is mounted once per kind.

use axum::{
  Json,
  body::Bytes,
  extract::{State, rejection::JsonRejection},
  http::HeaderMap,
};
use rescue_core::{
  account::{Account, AccountKind, AccountView, LoginForm, NewAccount, PasswordChangeForm, Registration},
  media::{MediaStore, Upload},
  store::RescueStore,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
  AppState,
  auth::{Auth, Role, TokenKind, TokenPair, refresh_token, token_digest},
  error::{ApiError, store_err},
  media,
  reply::Reply,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
  pub account: AccountView,
  #[serde(flatten)]
  pub tokens:  TokenPair,
}

// ─── Shared operations ───────────────────────────────────────────────────────

/// Hash the password, store the image, and persist the account. The image
/// is discarded again if the account cannot be created.
pub async fn register<S, M>(
  state: &AppState<S, M>,
  registration: Registration,
  image: Upload,
) -> Result<Account, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let password_hash = state.auth.hash_password(registration.password).await?;
  let url = media::upload(state.media.as_ref(), state.media_policy, image).await?;

  let input = NewAccount {
    email: registration.email,
    phone_number: registration.phone_number,
    password_hash,
    profile: registration.details.with_image(url.clone()),
  };
  match state.store.create_account(input).await {
    Ok(account) => {
      info!(kind = %account.kind(), id = %account.account_id, "account registered");
      Ok(account)
    }
    Err(e) => {
      media::discard(state.media.clone(), url);
      Err(store_err(e))
    }
  }
}

/// Store a new avatar or logo, swap it in, and discard the old one.
pub async fn change_image<S, M>(
  state: &AppState<S, M>,
  account: &Account,
  image: Upload,
) -> Result<AccountView, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let url = media::upload(state.media.as_ref(), state.media_policy, image).await?;
  match state
    .store
    .replace_image(account.kind(), account.account_id, url.clone())
    .await
  {
    Ok((updated, previous)) => {
      media::discard(state.media.clone(), previous);
      Ok(updated.view())
    }
    Err(e) => {
      media::discard(state.media.clone(), url);
      Err(store_err(e))
    }
  }
}

async fn start_session<S, M>(
  state: &AppState<S, M>,
  account: &Account,
) -> Result<TokenPair, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let tokens = state.auth.issue_pair(account)?;
  state
    .store
    .set_refresh_token(
      account.kind(),
      account.account_id,
      Some(token_digest(&tokens.refresh_token)),
    )
    .await
    .map_err(store_err)?;
  Ok(tokens)
}

fn kind_noun(kind: AccountKind) -> &'static str {
  match kind {
    AccountKind::Informant => "user",
    AccountKind::Rescuer => "rescuer",
    AccountKind::Organization => "organization",
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST .../login`
pub async fn login<S, M, R>(
  State(state): State<AppState<S, M>>,
  body: Result<Json<LoginForm>, JsonRejection>,
) -> Result<Reply<SessionData>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
  R: Role,
{
  let Json(form) = body?;
  let (credential, password) = form.validate(R::KIND)?;

  let account = state
    .store
    .find_account(R::KIND, &credential)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("{} does not exist", kind_noun(R::KIND))))?;

  if !state
    .auth
    .verify_password(password, account.password_hash.clone())
    .await
  {
    return Err(ApiError::Unauthorized("invalid credentials".into()));
  }

  let tokens = start_session(&state, &account).await?;
  info!(kind = %R::KIND, id = %account.account_id, "logged in");

  let cookies = state.auth.session_cookies(&tokens);
  let data = SessionData { account: account.view(), tokens };
  Ok(Reply::ok(data, format!("{} logged in successfully", kind_noun(R::KIND))).with_cookies(cookies))
}

/// `POST .../refresh-token`
///
/// Rotation is a compare-and-swap on the stored digest: a token that has
/// already been rotated, or cleared by logout, is rejected.
pub async fn refresh<S, M, R>(
  State(state): State<AppState<S, M>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Reply<TokenPair>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
  R: Role,
{
  let presented = refresh_token(&headers, &body).ok_or_else(ApiError::unauthorized)?;

  let claims = state
    .auth
    .verify(TokenKind::Refresh, &presented)
    .filter(|c| c.kind == R::KIND)
    .ok_or_else(ApiError::unauthorized)?;

  let account = state
    .store
    .get_account(R::KIND, claims.sub)
    .await
    .map_err(store_err)?
    .ok_or_else(ApiError::unauthorized)?;

  let tokens = state.auth.issue_pair(&account)?;
  let rotated = state
    .store
    .rotate_refresh_token(
      R::KIND,
      account.account_id,
      token_digest(&presented),
      token_digest(&tokens.refresh_token),
    )
    .await
    .map_err(store_err)?;
  if !rotated {
    return Err(ApiError::Unauthorized("refresh token is expired or used".into()));
  }

  let cookies = state.auth.session_cookies(&tokens);
  Ok(Reply::ok(tokens, "access token refreshed").with_cookies(cookies))
}

/// `POST .../logout`
pub async fn logout<S, M, R>(
  State(state): State<AppState<S, M>>,
  auth: Auth<R>,
) -> Result<Reply<Value>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
  R: Role,
{
  state
    .store
    .set_refresh_token(R::KIND, auth.id(), None)
    .await
    .map_err(store_err)?;
  info!(kind = %R::KIND, id = %auth.id(), "logged out");

  let cookies = state.auth.cleared_cookies();
  Ok(Reply::ok(json!({}), format!("{} logged out", kind_noun(R::KIND))).with_cookies(cookies))
}

/// `GET .../current-*`
pub async fn current<R: Role>(auth: Auth<R>) -> Result<Reply<AccountView>, ApiError> {
  Ok(Reply::ok(
    auth.account.view(),
    format!("current {} fetched successfully", kind_noun(R::KIND)),
  ))
}

/// `PATCH .../change-password`
///
/// Does not touch the session: existing tokens stay valid.
pub async fn change_password<S, M, R>(
  State(state): State<AppState<S, M>>,
  auth: Auth<R>,
  body: Result<Json<PasswordChangeForm>, JsonRejection>,
) -> Result<Reply<Value>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
  R: Role,
{
  let Json(form) = body?;
  let (old, new) = form.validate()?;

  if !state
    .auth
    .verify_password(old, auth.account.password_hash.clone())
    .await
  {
    return Err(ApiError::Unauthorized("invalid old password".into()));
  }

  let hash = state.auth.hash_password(new).await?;
  state
    .store
    .set_password_hash(R::KIND, auth.id(), hash)
    .await
    .map_err(store_err)?;
  info!(kind = %R::KIND, id = %auth.id(), "password changed");

  Ok(Reply::ok(json!({}), "password changed successfully"))
}
