//! Public animal endpoints under `/api/v1/animals`.
//!
//! | Method | Path                               | Notes |
//! |--------|------------------------------------|-------|
//! | `GET`  | `/get-all-animals`                 | `?rescueStatus&page&limit` |
//! | `GET`  | `/get-notrescued-animals`          | `?page&limit` |
//! | `GET`  | `/animal-info/{animalId}`          | 404 if not found |
//! | `GET`  | `/animal-info/{animalId}/report`   | 404 if no report was filed |
//!
//! Listings are newest first; a page past the end is an empty list.

use axum::extract::{
  Path, Query, State,
  rejection::{PathRejection, QueryRejection},
};
use rescue_core::{
  Entity,
  animal::Animal,
  media::MediaStore,
  report::RescueReport,
  store::{AnimalListParams, AnimalQuery, RescueStore},
};
use serde::Deserialize;

use crate::{
  AppState,
  error::{ApiError, store_err},
  form::parse_id,
  reply::Reply,
};

/// `GET /get-all-animals`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  query: Result<Query<AnimalListParams>, QueryRejection>,
) -> Result<Reply<Vec<Animal>>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Query(params) = query?;
  let animals = state
    .store
    .list_animals(params.validate()?)
    .await
    .map_err(store_err)?;
  Ok(Reply::ok(animals, "animals fetched successfully"))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

/// `GET /get-notrescued-animals`
pub async fn list_unrescued<S, M>(
  State(state): State<AppState<S, M>>,
  query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Reply<Vec<Animal>>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Query(params) = query?;
  let query = AnimalQuery::new(Some(false), params.page, params.limit)?;
  let animals = state.store.list_animals(query).await.map_err(store_err)?;
  Ok(Reply::ok(animals, "unrescued animals fetched successfully"))
}

/// `GET /animal-info/{animalId}`
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Reply<Animal>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Path(raw) = path?;
  let id = parse_id(&raw, "animal")?;
  let animal = state
    .store
    .get_animal(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| rescue_core::Error::not_found(Entity::Animal, id))?;
  Ok(Reply::ok(animal, "animal fetched successfully"))
}

/// `GET /animal-info/{animalId}/report`
pub async fn report<S, M>(
  State(state): State<AppState<S, M>>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Reply<RescueReport>, ApiError>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let Path(raw) = path?;
  let id = parse_id(&raw, "animal")?;
  let report = state
    .store
    .get_report(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| rescue_core::Error::not_found(Entity::Report, id))?;
  Ok(Reply::ok(report, "rescue report fetched successfully"))
}
