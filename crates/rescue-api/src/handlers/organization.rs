//! Organization endpoints under `/api/v1/orgs`.
//!
//! | Method   | Path                             | Notes |
//! |----------|----------------------------------|-------|
//! | `POST`   | `/register`                      | multipart, file field `logo` |
//! | `PATCH`  | `/change-logo`                   | multipart, file field `logo` |
//! | `POST`   | `/add-rescuer`                   | multipart, file field `avatar` |
//! | `GET`    | `/rescuers`                      | the caller's roster |
//! | `DELETE` | `/remove-rescuer/{rescuerId}`    | 404 unless on the caller's roster |
//! | `GET`    | `/rescued-animals`               | the caller's rescue history |
//! | `POST`   | `/rescued-animal-report/{animalId}` | multipart, file field `animalPic` |

use axum::extract::{Path, State, rejection::PathRejection};
use rescue_core::{
  Entity,
  account::{AccountView, OrganizationForm, RescuerForm},
  media::MediaStore,
  report::{NewReport, ReportForm, RescueReport},
  rescue::OrgRescue,
  store::RescueStore,
};
use tracing::info;

use crate::{
  AppState,
  auth::{Auth, Organization},
  error::{ApiError, store_err},
  form::{FormData, parse_id},
  handlers::session,
  media,
  reply::Reply,
};

/// `POST /register`
pub async fn register<S, M>(
  State(state): State<AppState<S, M>>,
  mut form: FormData,
) -> Result<Reply<AccountView>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let registration = form.parse::<OrganizationForm>()?.validate()?;
  let logo = form.take_file("logo")?;

  let account = session::register(&state, registration, logo).await?;
  Ok(Reply::created(account.view(), "organization registered successfully"))
}

/// `PATCH /change-logo`
pub async fn change_logo<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
  mut form: FormData,
) -> Result<Reply<AccountView>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let logo = form.take_file("logo")?;
  let view = session::change_image(&state, &auth.account, logo).await?;
  Ok(Reply::ok(view, "logo updated successfully"))
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// `POST /add-rescuer`
pub async fn add_rescuer<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
  mut form: FormData,
) -> Result<Reply<AccountView>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let registration = form.parse::<RescuerForm>()?.validate(auth.id())?;
  let avatar = form.take_file("avatar")?;

  let rescuer = session::register(&state, registration, avatar).await?;
  Ok(Reply::created(rescuer.view(), "rescuer added successfully"))
}

/// `GET /rescuers`
pub async fn rescuers<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
) -> Result<Reply<Vec<AccountView>>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let roster = state.store.list_rescuers(auth.id()).await.map_err(store_err)?;
  let views = roster.iter().map(|a| a.view()).collect();
  Ok(Reply::ok(views, "rescuers fetched successfully"))
}

/// `DELETE /remove-rescuer/{rescuerId}`
///
/// The avatar is deleted in the background; the removal stands even if that
/// fails.
pub async fn remove_rescuer<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Reply<AccountView>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Path(raw) = path?;
  let rescuer_id = parse_id(&raw, "rescuer")?;

  let removed = state
    .store
    .delete_rescuer(auth.id(), rescuer_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("rescuer not found: {rescuer_id}")))?;

  media::discard(state.media.clone(), removed.profile.image().to_owned());
  info!(org = %auth.id(), rescuer = %rescuer_id, "rescuer removed");
  Ok(Reply::ok(removed.view(), "rescuer removed successfully"))
}

// ─── Rescues and reports ─────────────────────────────────────────────────────

/// `GET /rescued-animals`
pub async fn rescued_animals<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
) -> Result<Reply<Vec<OrgRescue>>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let history = state
    .store
    .list_rescued_by_org(auth.id())
    .await
    .map_err(store_err)?;
  Ok(Reply::ok(history, "rescued animals fetched successfully"))
}

/// `POST /rescued-animal-report/{animalId}`
pub async fn file_report<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Organization>,
  path: Result<Path<String>, PathRejection>,
  mut form: FormData,
) -> Result<Reply<RescueReport>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Path(raw) = path?;
  let animal_id = parse_id(&raw, "animal")?;
  let description = form.parse::<ReportForm>()?.validate()?;
  let picture = form.take_file("animalPic")?;

  // Reject unknown animals before uploading anything.
  if state.store.get_animal(animal_id).await.map_err(store_err)?.is_none() {
    return Err(rescue_core::Error::not_found(Entity::Animal, animal_id).into());
  }

  let url = media::upload(state.media.as_ref(), state.media_policy, picture).await?;
  let input = NewReport {
    animal_id,
    org_id: auth.id(),
    description,
    rescued_animal_pic: url.clone(),
  };
  let report = match state.store.file_report(input).await {
    Ok(report) => report,
    Err(e) => {
      media::discard(state.media.clone(), url);
      return Err(store_err(e));
    }
  };

  info!(org = %auth.id(), animal = %animal_id, "rescue report filed");
  Ok(Reply::created(report, "rescue report filed successfully"))
}
