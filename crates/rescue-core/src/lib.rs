//! Core types and trait definitions for the animal-rescue coordination
//! platform.
//!
//! This crate is free of HTTP and database dependencies. The storage backend
//! (`rescue-store-sqlite`), the media backend (`rescue-media-fs`) and the HTTP
//! layer (`rescue-api`) all depend on it.

// Native `async fn` / `impl Future` in traits; the returned futures carry
// explicit `Send` bounds where the traits need them.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod animal;
pub mod error;
pub mod media;
pub mod report;
pub mod rescue;
pub mod store;
pub mod validate;

pub use error::{Entity, Error, Result};
