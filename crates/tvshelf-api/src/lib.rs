//! Remote catalog access for tvshelf.
//!
//! [`traits::CatalogService`] is the gateway contract the rest of the
//! workspace programs against; [`tmdb::TmdbClient`] implements it over the
//! TMDB v3 REST API.

pub mod tmdb;
pub mod traits;

pub use tmdb::{TmdbClient, TmdbError};
pub use traits::CatalogService;
