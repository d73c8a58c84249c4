//! View-state coordinator.
//!
//! Owns the observable fields a presentation layer binds to and runs every
//! user action as a tokio task. Search and season loads each live in a
//! [`TaskSlot`], so a newer request aborts the older one and a superseded
//! task never publishes. Errors never escape an action: they are logged and
//! surfaced through `last_error`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use tvshelf_core::config::SearchConfig;
use tvshelf_core::models::{RecentShow, SearchMatch, SeasonEpisode, Show, ShowDetail};

use crate::connectivity::ConnectivityProbe;
use crate::observable::Observable;
use crate::repository::ShowRepository;
use crate::task::{LoadingGuard, TaskSlot, Ticket};
use crate::RuntimeError;

/// How many episodes `load_top_episodes` publishes.
pub const TOP_EPISODE_LIMIT: u32 = 10;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Quiet period after the last keystroke before a search is sent.
    pub debounce: Duration,
    pub search_match: SearchMatch,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            search_match: SearchMatch::default(),
        }
    }
}

impl From<&SearchConfig> for CoordinatorSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            search_match: config.match_fields,
        }
    }
}

/// Observable state exposed to the presentation layer.
#[derive(Debug, Default)]
pub struct ViewState {
    pub search_text: Observable<String>,
    pub is_searching: Observable<bool>,
    pub search_results: Observable<Vec<Show>>,
    pub selected_show_detail: Observable<Option<ShowDetail>>,
    pub current_season_episodes: Observable<Vec<SeasonEpisode>>,
    pub is_season_loading: Observable<bool>,
    pub recent_shows: Observable<Vec<RecentShow>>,
    pub top_episodes: Observable<Vec<SeasonEpisode>>,
    pub last_error: Observable<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeasonRequest {
    show_id: i64,
    season_number: u32,
    online: bool,
}

struct Inner<R> {
    repo: R,
    settings: CoordinatorSettings,
    state: ViewState,
    search_slot: TaskSlot,
    detail_slot: TaskSlot,
    season_slot: TaskSlot,
    last_season: Mutex<Option<SeasonRequest>>,
}

/// Cheap to clone; all clones drive the same state.
pub struct Coordinator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for Coordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ShowRepository + 'static> Coordinator<R> {
    pub fn new(repo: R, settings: CoordinatorSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                settings,
                state: ViewState::default(),
                search_slot: TaskSlot::new("search"),
                detail_slot: TaskSlot::new("show-detail"),
                season_slot: TaskSlot::new("season"),
                last_season: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.inner.state
    }

    pub fn repository(&self) -> &R {
        &self.inner.repo
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.inner.settings
    }

    /// Start-up work: publish the recent shows.
    pub fn init(&self) -> JoinHandle<()> {
        self.load_recent_shows()
    }

    /// Store `text` and schedule a search once the debounce window passes.
    ///
    /// Any pending or in-flight search is aborted first.
    pub fn set_search_text(&self, text: impl Into<String>) -> JoinHandle<()> {
        let text = text.into();
        self.inner.state.search_text.set(text.clone());
        self.inner.state.is_searching.set_if_changed(false);

        let inner = Arc::clone(&self.inner);
        let debounce = inner.settings.debounce;
        self.inner.search_slot.spawn(move |ticket| async move {
            tokio::time::sleep(debounce).await;
            inner.run_search(text, ticket).await;
        })
    }

    /// Abort the pending or in-flight search. Returns whether one was running.
    pub fn cancel_search(&self) -> bool {
        let cancelled = self.inner.search_slot.cancel();
        self.inner.state.is_searching.set_if_changed(false);
        cancelled
    }

    pub fn select_show(&self, id: i64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.inner.detail_slot.spawn(move |ticket| async move {
            inner.begin_action();
            tracing::debug!(id, "loading show detail");
            match inner.repo.get_show_detail(id).await {
                Ok(detail) => {
                    inner.detail_slot.publish(&ticket, || {
                        inner.state.selected_show_detail.set(Some(detail));
                    });
                }
                Err(e) => inner.record_error(&inner.detail_slot, &ticket, "select show", e),
            }
        })
    }

    /// Load a season remotely (`online`) or from the local cache, replacing
    /// any load still running.
    pub fn load_season(&self, show_id: i64, season_number: u32, online: bool) -> JoinHandle<()> {
        Inner::spawn_season_load(
            &self.inner,
            SeasonRequest {
                show_id,
                season_number,
                online,
            },
        )
    }

    /// Like [`load_season`](Self::load_season), with the mode picked by `probe`.
    pub fn load_season_auto(
        &self,
        show_id: i64,
        season_number: u32,
        probe: &dyn ConnectivityProbe,
    ) -> JoinHandle<()> {
        let online = match probe.check() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(show_id, season_number, "{e}, reading season from cache");
                false
            }
        };
        self.load_season(show_id, season_number, online)
    }

    pub fn cancel_season_load(&self) -> bool {
        let cancelled = self.inner.season_slot.cancel();
        self.inner.state.is_season_loading.set_if_changed(false);
        cancelled
    }

    /// Persist a watched flag, then reload the last requested season so the
    /// display reflects what storage now holds.
    pub fn toggle_watched(&self, episode_id: i64, watched: bool) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.begin_action();
            if let Err(e) = inner.repo.set_watched_status(episode_id, watched).await {
                inner.report("toggle watched", &e);
                return;
            }

            let last = *inner.last_season.lock().unwrap_or_else(PoisonError::into_inner);
            match last {
                Some(request) => {
                    // A cancelled reload means a newer load took over.
                    let _ = Inner::spawn_season_load(&inner, request).await;
                }
                None => tracing::debug!(episode_id, "no season loaded, nothing to reload"),
            }
        })
    }

    /// Remember `show` as recently viewed and republish the list.
    pub fn add_recent_show(&self, show: Show) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.begin_action();
            if let Err(e) = inner.repo.add_recent_show(RecentShow::now(show)).await {
                inner.report("add recent show", &e);
                return;
            }
            inner.refresh_recent_shows().await;
        })
    }

    pub fn load_recent_shows(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.begin_action();
            inner.refresh_recent_shows().await;
        })
    }

    /// Publish the best rated cached episodes of a show.
    pub fn load_top_episodes(&self, show_id: i64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.begin_action();
            match inner.repo.get_top_episodes(show_id, TOP_EPISODE_LIMIT).await {
                Ok(episodes) => inner.state.top_episodes.set(episodes),
                Err(e) => inner.report("load top episodes", &e),
            }
        })
    }
}

impl<R: ShowRepository + 'static> Inner<R> {
    async fn run_search(&self, text: String, ticket: Ticket) {
        if !ticket.is_current() {
            return;
        }
        self.begin_action();
        let _searching = LoadingGuard::raise(&self.search_slot, &self.state.is_searching, &ticket);
        tracing::debug!(query = %text, "searching");

        match self.repo.search_shows(&text).await {
            Ok(shows) => {
                let visible = filter_shows(&shows, &text, self.settings.search_match);
                self.search_slot
                    .publish(&ticket, || self.state.search_results.set(visible));
            }
            Err(e) => self.record_error(&self.search_slot, &ticket, "search", e),
        }
    }

    fn spawn_season_load(this: &Arc<Self>, request: SeasonRequest) -> JoinHandle<()> {
        *this.last_season.lock().unwrap_or_else(PoisonError::into_inner) = Some(request);
        let inner = Arc::clone(this);
        this.season_slot.spawn(move |ticket| async move {
            inner.run_season_load(request, ticket).await;
        })
    }

    async fn run_season_load(&self, request: SeasonRequest, ticket: Ticket) {
        self.begin_action();
        let _loading =
            LoadingGuard::raise(&self.season_slot, &self.state.is_season_loading, &ticket);
        tracing::debug!(
            show_id = request.show_id,
            season = request.season_number,
            online = request.online,
            "loading season"
        );

        let result = if request.online {
            self.fetch_season(request).await
        } else {
            self.repo
                .get_season_cached(request.show_id, request.season_number)
                .await
        };

        match result {
            Ok(episodes) => {
                self.season_slot
                    .publish(&ticket, || self.state.current_season_episodes.set(episodes));
            }
            Err(e) => self.record_error(&self.season_slot, &ticket, "load season", e),
        }
    }

    /// Remote fetch with persisted watched flags merged in, written through
    /// to the local store.
    async fn fetch_season(&self, request: SeasonRequest) -> Result<Vec<SeasonEpisode>, RuntimeError> {
        let mut episodes = self
            .repo
            .get_season(request.show_id, request.season_number)
            .await?;
        for episode in &mut episodes {
            episode.is_watched = self.repo.get_watched_status(episode.episode_id).await?;
            episode.stamp(request.show_id, request.season_number);
            self.repo.upsert_season_episode(episode.clone()).await?;
        }
        Ok(episodes)
    }

    async fn refresh_recent_shows(&self) {
        match self.repo.get_recent_shows().await {
            Ok(rows) => self.state.recent_shows.set(dedup_recent(rows)),
            Err(e) => self.report("load recent shows", &e),
        }
    }

    fn begin_action(&self) {
        self.state.last_error.set_if_changed(None);
    }

    /// Record a failure from a slotted task, unless it has been superseded.
    fn record_error(&self, slot: &TaskSlot, ticket: &Ticket, action: &'static str, err: RuntimeError) {
        if !slot.publish(ticket, || self.report(action, &err)) {
            tracing::debug!(action, "dropping error from superseded task: {err}");
        }
    }

    fn report(&self, action: &'static str, err: &RuntimeError) {
        tracing::warn!(action, "{err}");
        self.state.last_error.set(Some(err.to_string()));
    }
}

/// Shows from `pool` matching `text`, in pool order. Blank text keeps everything.
pub fn filter_shows(pool: &[Show], text: &str, mode: SearchMatch) -> Vec<Show> {
    pool.iter()
        .filter(|show| show.matches_query(text, mode))
        .cloned()
        .collect()
}

/// Keep the first row per show id.
fn dedup_recent(rows: Vec<RecentShow>) -> Vec<RecentShow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.show.id))
        .collect()
}
