//! Local persistence contract.

use std::future::Future;

use tvshelf_core::models::{RecentShow, SeasonEpisode};

/// Embedded store for cached episodes, watched flags and recent shows.
///
/// The store is the single source of truth for `is_watched`.
pub trait LocalStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upsert_episode(
        &self,
        episode: SeasonEpisode,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn get_episodes_by_season(
        &self,
        tv_show_id: i64,
        season_number: u32,
    ) -> impl Future<Output = Result<Vec<SeasonEpisode>, Self::Error>> + Send;

    fn get_watched_status(
        &self,
        episode_id: i64,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    fn set_watched_status(
        &self,
        episode_id: i64,
        watched: bool,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn upsert_recent_show(
        &self,
        recent: RecentShow,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn get_recent_shows(&self) -> impl Future<Output = Result<Vec<RecentShow>, Self::Error>> + Send;

    /// Highest-rated cached episodes of a show, best first.
    fn get_top_episodes(
        &self,
        tv_show_id: i64,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<SeasonEpisode>, Self::Error>> + Send;
}
