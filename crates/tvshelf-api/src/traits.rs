//! Gateway contract for remote show catalogs.

use std::future::Future;

use crate::tmdb::types::{RawSeason, RawShowDetail, SearchResponse};

/// Read-only access to a remote TV show catalog.
///
/// Responses are returned in their raw shape; turning them into domain
/// models (and defaulting missing fields) is the caller's job.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search shows by name.
    fn search_by_name(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send;

    /// Fetch one show by its catalog id.
    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<RawShowDetail, Self::Error>> + Send;

    /// Fetch one season of a show, with its episodes.
    fn get_season(
        &self,
        show_id: i64,
        season_number: u32,
    ) -> impl Future<Output = Result<RawSeason, Self::Error>> + Send;
}
