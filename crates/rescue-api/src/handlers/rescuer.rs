//! Rescuer endpoints under `/api/v1/rescuers`.
//!
//! | Method  | Path                        | Notes |
//! |---------|-----------------------------|-------|
//! | `PATCH` | `/change-avatar`            | multipart, file field `avatar` |
//! | `POST`  | `/rescued-animal/{animalId}`| 409 if already rescued |
//! | `GET`   | `/get-all-animal`           | `{animals, total}` |

use axum::extract::{Path, State, rejection::PathRejection};
use rescue_core::{
  account::AccountView,
  media::MediaStore,
  rescue::{RescueAssignment, RescuerTally},
  store::RescueStore,
};
use tracing::info;

use crate::{
  AppState,
  auth::{Auth, Rescuer},
  error::{ApiError, store_err},
  form::{FormData, parse_id},
  handlers::session,
  reply::Reply,
};

/// `PATCH /change-avatar`
pub async fn change_avatar<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Rescuer>,
  mut form: FormData,
) -> Result<Reply<AccountView>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let avatar = form.take_file("avatar")?;
  let view = session::change_image(&state, &auth.account, avatar).await?;
  Ok(Reply::ok(view, "avatar updated successfully"))
}

/// `POST /rescued-animal/{animalId}`
///
/// Records the rescue on behalf of the rescuer's organization.
pub async fn rescue<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Rescuer>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Reply<RescueAssignment>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Path(raw) = path?;
  let animal_id = parse_id(&raw, "animal")?;
  let org_id = auth.account.profile.org_id().ok_or_else(ApiError::unauthorized)?;

  let assignment = state
    .store
    .assign_rescue(animal_id, auth.id(), org_id)
    .await
    .map_err(store_err)?;

  info!(animal = %animal_id, rescuer = %auth.id(), org = %org_id, "animal rescued");
  Ok(Reply::created(assignment, "animal rescued successfully"))
}

/// `GET /get-all-animal`
pub async fn rescued_animals<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Rescuer>,
) -> Result<Reply<RescuerTally>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let tally = state
    .store
    .list_rescued_by_rescuer(auth.id())
    .await
    .map_err(store_err)?;
  Ok(Reply::ok(tally, "rescued animals fetched successfully"))
}
