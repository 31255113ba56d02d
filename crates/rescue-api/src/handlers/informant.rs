//! Informant endpoints under `/api/v1/users`.
//!
//! | Method  | Path             | Notes |
//! |---------|------------------|-------|
//! | `POST`  | `/register`      | multipart, file field `avatar` |
//! | `PATCH` | `/change-avatar` | multipart, file field `avatar` |
//! | `POST`  | `/create-animal` | multipart, file field `animalPicture` |
//! | `GET`   | `/get-all-animal`| animals reported by the caller |

use axum::extract::State;
use rescue_core::{
  account::{AccountView, InformantForm},
  animal::{Animal, AnimalForm, NewAnimal},
  media::MediaStore,
  store::RescueStore,
};
use tracing::info;

use crate::{
  AppState,
  auth::{Auth, Informant},
  error::{ApiError, store_err},
  form::FormData,
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
  let registration = form.parse::<InformantForm>()?.validate()?;
  let avatar = form.take_file("avatar")?;

  let account = session::register(&state, registration, avatar).await?;
  Ok(Reply::created(account.view(), "user registered successfully"))
}

/// `PATCH /change-avatar`
pub async fn change_avatar<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Informant>,
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

/// `POST /create-animal`
pub async fn create_animal<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Informant>,
  mut form: FormData,
) -> Result<Reply<Animal>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let attributes = form.parse::<AnimalForm>()?.validate()?;
  let picture = form.take_file("animalPicture")?;

  let url = media::upload(state.media.as_ref(), state.media_policy, picture).await?;
  let input = NewAnimal {
    informant_id:   auth.id(),
    attributes,
    animal_picture: url.clone(),
  };
  let animal = match state.store.create_animal(input).await {
    Ok(animal) => animal,
    Err(e) => {
      media::discard(state.media.clone(), url);
      return Err(store_err(e));
    }
  };

  info!(animal = %animal.animal_id, informant = %auth.id(), "animal reported");
  Ok(Reply::created(animal, "animal reported successfully"))
}

/// `GET /get-all-animal`
pub async fn list_animals<S, M>(
  State(state): State<AppState<S, M>>,
  auth: Auth<Informant>,
) -> Result<Reply<Vec<Animal>>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let animals = state
    .store
    .list_animals_by_informant(auth.id())
    .await
    .map_err(store_err)?;
  Ok(Reply::ok(animals, "animals fetched successfully"))
}
