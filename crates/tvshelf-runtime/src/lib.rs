pub mod connectivity;
pub mod coordinator;
mod db;
pub mod logging;
pub mod mapper;
pub mod observable;
pub mod repository;
pub mod store;
pub mod task;

#[cfg(test)]
mod testing;

use tvshelf_api::TmdbClient;
use tvshelf_core::config::AppConfig;

pub use connectivity::{ConnectivityProbe, StaticProbe, TcpProbe};
pub use coordinator::{Coordinator, CoordinatorSettings, ViewState};
pub use db::DbHandle;
pub use mapper::MappingError;
pub use observable::Observable;
pub use repository::{Repository, ShowRepository};
pub use store::LocalStore;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Mapping(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("no network connection")]
    NotOnline,
    #[error("config error: {0}")]
    Config(String),
}

impl From<MappingError> for RuntimeError {
    fn from(err: MappingError) -> Self {
        RuntimeError::Mapping(err.to_string())
    }
}

pub type DefaultRepository = Repository<TmdbClient, DbHandle>;

/// Everything wired together: TMDB client, local store, coordinator, probe.
pub struct App {
    config: AppConfig,
    coordinator: Coordinator<DefaultRepository>,
    probe: TcpProbe,
}

impl App {
    /// Open the database in the platform data directory and wire the app.
    pub fn open(config: AppConfig) -> Result<Self, RuntimeError> {
        let db_path =
            AppConfig::ensure_db_path().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let db = DbHandle::open(&db_path).map_err(|e| RuntimeError::Storage(e.to_string()))?;
        Ok(Self::open_with(config, db))
    }

    /// Wire the app around an already opened database.
    pub fn open_with(config: AppConfig, db: DbHandle) -> Self {
        if config.tmdb.api_key.trim().is_empty() {
            tracing::warn!(
                "no TMDB API key configured, set {} or tmdb.api_key",
                tvshelf_core::config::API_KEY_ENV
            );
        }

        let client = TmdbClient::new(config.tmdb.api_key.clone())
            .with_base_url(config.tmdb.base_url.clone())
            .with_language(config.tmdb.language.clone());
        let coordinator = Coordinator::new(
            Repository::new(client, db),
            CoordinatorSettings::from(&config.search),
        );
        let probe = TcpProbe::from_config(&config.connectivity);

        tracing::info!(
            base_url = %config.tmdb.base_url,
            debounce_ms = config.search.debounce_ms,
            "tvshelf ready"
        );

        Self {
            config,
            coordinator,
            probe,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator<DefaultRepository> {
        &self.coordinator
    }

    pub fn state(&self) -> &ViewState {
        self.coordinator.state()
    }

    pub fn probe(&self) -> &TcpProbe {
        &self.probe
    }

    /// Load a season, online if the catalog is reachable.
    ///
    /// The probe blocks for up to the configured timeout, so it runs on the
    /// blocking pool.
    pub async fn load_season(&self, show_id: i64, season_number: u32) {
        let probe = self.probe.clone();
        let reachable = tokio::task::spawn_blocking(move || probe.check())
            .await
            .unwrap_or(Err(RuntimeError::NotOnline));
        if let Err(e) = &reachable {
            tracing::debug!(show_id, season_number, "{e}, reading season from cache");
        }
        let _ = self
            .coordinator
            .load_season(show_id, season_number, reachable.is_ok())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_open_with_wires_config() {
        let mut config = AppConfig::default();
        config.search.debounce_ms = 250;

        let app = App::open_with(config, DbHandle::open_memory().unwrap());

        assert_eq!(
            app.coordinator().settings().debounce,
            Duration::from_millis(250)
        );
        assert!(app.state().recent_shows.get().is_empty());
    }

    #[tokio::test]
    async fn test_offline_season_load_uses_cache() {
        let closed = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let mut config = AppConfig::default();
        config.connectivity.probe_addr = closed.to_string();
        config.connectivity.timeout_ms = 100;

        let app = App::open_with(config, DbHandle::open_memory().unwrap());
        app.load_season(1668, 1).await;

        let state = app.state();
        assert!(state.current_season_episodes.get().is_empty());
        assert!(state.last_error.get().is_none());
        assert!(!state.is_season_loading.get());
    }
}
