//! In-memory fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use tvshelf_api::tmdb::types::{RawEpisode, RawSeason, RawShow, RawShowDetail, SearchResponse};
use tvshelf_api::CatalogService;
use tvshelf_core::models::{RecentShow, SeasonEpisode};

use crate::db::DbHandle;
use crate::store::LocalStore;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

pub fn raw_show(id: i64, name: &str) -> RawShow {
    RawShow {
        id: Some(id),
        name: Some(name.into()),
        overview: Some(format!("All about {name}")),
        poster_path: Some(format!("/{id}.jpg")),
        first_air_date: Some("1994-09-22".into()),
        ..Default::default()
    }
}

pub fn raw_episode(id: Option<i64>, episode_number: u32) -> RawEpisode {
    RawEpisode {
        id,
        name: Some(format!("Episode {episode_number}")),
        episode_number: Some(episode_number),
        vote_average: Some(5.0 + episode_number as f64 / 10.0),
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    Search(String),
    Detail(i64),
    Season(i64, u32),
}

#[derive(Default)]
struct CatalogState {
    search_results: Vec<RawShow>,
    details: HashMap<i64, RawShowDetail>,
    seasons: HashMap<(i64, u32), Vec<RawEpisode>>,
    failure: Option<String>,
    search_delay: Option<Duration>,
    season_delay: Option<Duration>,
    calls: Vec<(Instant, CatalogCall)>,
}

/// Scripted [`CatalogService`] that records every call.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn set_search_results(&self, results: Vec<RawShow>) {
        self.state.lock().unwrap().search_results = results;
    }

    pub fn set_detail(&self, id: i64, name: &str, seasons: u32) {
        self.state.lock().unwrap().details.insert(
            id,
            RawShowDetail {
                id: Some(id),
                name: Some(name.into()),
                number_of_seasons: Some(seasons),
                ..Default::default()
            },
        );
    }

    pub fn set_season(&self, show_id: i64, season_number: u32, episodes: Vec<RawEpisode>) {
        self.state
            .lock()
            .unwrap()
            .seasons
            .insert((show_id, season_number), episodes);
    }

    /// Make the next call fail with `message`.
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.into());
    }

    /// Keep searches in flight for `delay` before answering.
    pub fn delay_searches(&self, delay: Duration) {
        self.state.lock().unwrap().search_delay = Some(delay);
    }

    /// Keep season fetches in flight for `delay` before answering.
    pub fn delay_seasons(&self, delay: Duration) {
        self.state.lock().unwrap().season_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn searches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::Search(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    /// Instants at which searches reached the catalog.
    pub fn search_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, call)| matches!(call, CatalogCall::Search(_)))
            .map(|(at, _)| *at)
            .collect()
    }

    fn record(&self, call: CatalogCall) -> Result<(), FakeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Instant::now(), call));
        match state.failure.take() {
            Some(message) => Err(FakeError(message)),
            None => Ok(()),
        }
    }
}

impl CatalogService for FakeCatalog {
    type Error = FakeError;

    async fn search_by_name(&self, query: &str) -> Result<SearchResponse, FakeError> {
        self.record(CatalogCall::Search(query.into()))?;
        let delay = self.state.lock().unwrap().search_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let results = self.state.lock().unwrap().search_results.clone();
        Ok(SearchResponse {
            page: 1,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<RawShowDetail, FakeError> {
        self.record(CatalogCall::Detail(id))?;
        self.state
            .lock()
            .unwrap()
            .details
            .get(&id)
            .cloned()
            .ok_or_else(|| FakeError(format!("show {id} not found")))
    }

    async fn get_season(&self, show_id: i64, season_number: u32) -> Result<RawSeason, FakeError> {
        self.record(CatalogCall::Season(show_id, season_number))?;
        let delay = self.state.lock().unwrap().season_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let episodes = self
            .state
            .lock()
            .unwrap()
            .seasons
            .get(&(show_id, season_number))
            .cloned()
            .ok_or_else(|| FakeError(format!("season {season_number} not found")))?;
        Ok(RawSeason {
            season_number: Some(season_number),
            episodes,
            ..Default::default()
        })
    }
}

/// Points in [`FlakyStore`] where a caller can be held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Right after the watched flag of an episode has been read.
    ReadWatched(i64),
    /// Right after the watched flag of an episode has been written.
    WroteWatched(i64),
}

struct Gate {
    at: Checkpoint,
    reached: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// [`DbHandle`] whose writes can be switched to fail, and whose calls can be
/// paused at a [`Checkpoint`] to force an interleaving.
#[derive(Clone)]
pub struct FlakyStore {
    inner: DbHandle,
    fail_writes: Arc<AtomicBool>,
    gates: Arc<Mutex<Vec<Gate>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: DbHandle::open_memory().unwrap(),
            fail_writes: Arc::new(AtomicBool::new(false)),
            gates: Arc::default(),
        }
    }

    /// Hold the next caller passing `at` until the returned sender fires.
    /// The returned receiver fires once that caller has arrived.
    pub fn pause_at(&self, at: Checkpoint) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().unwrap().push(Gate {
            at,
            reached: reached_tx,
            release: release_rx,
        });
        (reached_rx, release_tx)
    }

    async fn pass(&self, at: Checkpoint) {
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates
                .iter()
                .position(|g| g.at == at)
                .map(|i| gates.remove(i))
        };
        if let Some(gate) = gate {
            let _ = gate.reached.send(());
            let _ = gate.release.await;
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), FakeError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(FakeError("disk I/O error".into()))
        } else {
            Ok(())
        }
    }
}

fn wrap<T>(result: Result<T, tvshelf_core::error::TvShelfError>) -> Result<T, FakeError> {
    result.map_err(|e| FakeError(e.to_string()))
}

impl LocalStore for FlakyStore {
    type Error = FakeError;

    async fn upsert_episode(&self, episode: SeasonEpisode) -> Result<(), FakeError> {
        self.check_write()?;
        wrap(self.inner.upsert_episode(episode).await)
    }

    async fn get_episodes_by_season(
        &self,
        tv_show_id: i64,
        season_number: u32,
    ) -> Result<Vec<SeasonEpisode>, FakeError> {
        wrap(self.inner.get_episodes_by_season(tv_show_id, season_number).await)
    }

    async fn get_watched_status(&self, episode_id: i64) -> Result<bool, FakeError> {
        let watched = wrap(self.inner.get_watched_status(episode_id).await)?;
        self.pass(Checkpoint::ReadWatched(episode_id)).await;
        Ok(watched)
    }

    async fn set_watched_status(&self, episode_id: i64, watched: bool) -> Result<(), FakeError> {
        self.check_write()?;
        wrap(self.inner.set_watched_status(episode_id, watched).await)?;
        self.pass(Checkpoint::WroteWatched(episode_id)).await;
        Ok(())
    }

    async fn upsert_recent_show(&self, recent: RecentShow) -> Result<(), FakeError> {
        self.check_write()?;
        wrap(self.inner.upsert_recent_show(recent).await)
    }

    async fn get_recent_shows(&self) -> Result<Vec<RecentShow>, FakeError> {
        wrap(self.inner.get_recent_shows().await)
    }

    async fn get_top_episodes(
        &self,
        tv_show_id: i64,
        limit: u32,
    ) -> Result<Vec<SeasonEpisode>, FakeError> {
        wrap(self.inner.get_top_episodes(tv_show_id, limit).await)
    }
}
