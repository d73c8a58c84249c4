use std::future::Future;

use tvshelf_api::CatalogService;
use tvshelf_core::models::{RecentShow, SeasonEpisode, Show, ShowDetail};

use crate::mapper;
use crate::store::LocalStore;
use crate::RuntimeError;

/// Everything the coordinator needs from the outside world.
///
/// Remote calls and local calls sit side by side; choosing between the
/// online and offline path is left to the caller. Nothing is retried.
pub trait ShowRepository: Send + Sync {
    /// Search the remote catalog. Duplicate hits are collapsed before mapping.
    fn search_shows(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Show>, RuntimeError>> + Send;

    fn get_show_detail(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<ShowDetail, RuntimeError>> + Send;

    /// Fetch a season remotely. Watched flags are not merged in.
    fn get_season(
        &self,
        show_id: i64,
        season_number: u32,
    ) -> impl Future<Output = Result<Vec<SeasonEpisode>, RuntimeError>> + Send;

    /// Read a season from the local store only.
    fn get_season_cached(
        &self,
        show_id: i64,
        season_number: u32,
    ) -> impl Future<Output = Result<Vec<SeasonEpisode>, RuntimeError>> + Send;

    fn upsert_season_episode(
        &self,
        episode: SeasonEpisode,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    fn get_watched_status(
        &self,
        episode_id: i64,
    ) -> impl Future<Output = Result<bool, RuntimeError>> + Send;

    fn set_watched_status(
        &self,
        episode_id: i64,
        watched: bool,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    fn add_recent_show(
        &self,
        recent: RecentShow,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    fn get_recent_shows(&self) -> impl Future<Output = Result<Vec<RecentShow>, RuntimeError>> + Send;

    fn get_top_episodes(
        &self,
        show_id: i64,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<SeasonEpisode>, RuntimeError>> + Send;
}

/// [`ShowRepository`] over a remote catalog and a local store.
pub struct Repository<G, S> {
    catalog: G,
    store: S,
}

impl<G, S> Repository<G, S> {
    pub fn new(catalog: G, store: S) -> Self {
        Self { catalog, store }
    }
}

fn transport(err: impl std::error::Error) -> RuntimeError {
    RuntimeError::Transport(err.to_string())
}

fn storage(err: impl std::error::Error) -> RuntimeError {
    RuntimeError::Storage(err.to_string())
}

impl<G: CatalogService, S: LocalStore> ShowRepository for Repository<G, S> {
    async fn search_shows(&self, query: &str) -> Result<Vec<Show>, RuntimeError> {
        let response = self.catalog.search_by_name(query).await.map_err(transport)?;
        let hits = mapper::dedup_raw_shows(response.results);
        Ok(mapper::to_show_list(&hits)?)
    }

    async fn get_show_detail(&self, id: i64) -> Result<ShowDetail, RuntimeError> {
        let raw = self.catalog.get_by_id(id).await.map_err(transport)?;
        Ok(mapper::to_show_detail(&raw)?)
    }

    async fn get_season(
        &self,
        show_id: i64,
        season_number: u32,
    ) -> Result<Vec<SeasonEpisode>, RuntimeError> {
        let raw = self
            .catalog
            .get_season(show_id, season_number)
            .await
            .map_err(transport)?;
        Ok(mapper::to_season_episodes(&raw)?)
    }

    async fn get_season_cached(
        &self,
        show_id: i64,
        season_number: u32,
    ) -> Result<Vec<SeasonEpisode>, RuntimeError> {
        self.store
            .get_episodes_by_season(show_id, season_number)
            .await
            .map_err(storage)
    }

    async fn upsert_season_episode(&self, episode: SeasonEpisode) -> Result<(), RuntimeError> {
        self.store.upsert_episode(episode).await.map_err(storage)
    }

    async fn get_watched_status(&self, episode_id: i64) -> Result<bool, RuntimeError> {
        self.store
            .get_watched_status(episode_id)
            .await
            .map_err(storage)
    }

    async fn set_watched_status(&self, episode_id: i64, watched: bool) -> Result<(), RuntimeError> {
        self.store
            .set_watched_status(episode_id, watched)
            .await
            .map_err(storage)
    }

    async fn add_recent_show(&self, recent: RecentShow) -> Result<(), RuntimeError> {
        self.store.upsert_recent_show(recent).await.map_err(storage)
    }

    async fn get_recent_shows(&self) -> Result<Vec<RecentShow>, RuntimeError> {
        self.store.get_recent_shows().await.map_err(storage)
    }

    async fn get_top_episodes(
        &self,
        show_id: i64,
        limit: u32,
    ) -> Result<Vec<SeasonEpisode>, RuntimeError> {
        self.store
            .get_top_episodes(show_id, limit)
            .await
            .map_err(storage)
    }
}
