use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use tvshelf_core::error::TvShelfError;
use tvshelf_core::models::{RecentShow, SeasonEpisode};
use tvshelf_core::storage::Storage;

use crate::store::LocalStore;

/// Async handle to the SQLite actor thread.
///
/// `rusqlite::Connection` is not `Sync`, so a dedicated thread owns the
/// [`Storage`] and serves commands sent over a channel.
#[derive(Clone)]
pub struct DbHandle {
    tx: mpsc::UnboundedSender<DbCommand>,
}

enum DbCommand {
    UpsertEpisode {
        episode: SeasonEpisode,
        reply: oneshot::Sender<Result<(), TvShelfError>>,
    },
    GetEpisodesBySeason {
        tv_show_id: i64,
        season_number: u32,
        reply: oneshot::Sender<Result<Vec<SeasonEpisode>, TvShelfError>>,
    },
    GetWatchedStatus {
        episode_id: i64,
        reply: oneshot::Sender<Result<bool, TvShelfError>>,
    },
    SetWatchedStatus {
        episode_id: i64,
        watched: bool,
        reply: oneshot::Sender<Result<(), TvShelfError>>,
    },
    UpsertRecentShow {
        recent: RecentShow,
        reply: oneshot::Sender<Result<(), TvShelfError>>,
    },
    GetRecentShows {
        reply: oneshot::Sender<Result<Vec<RecentShow>, TvShelfError>>,
    },
    GetTopEpisodes {
        tv_show_id: i64,
        limit: u32,
        reply: oneshot::Sender<Result<Vec<SeasonEpisode>, TvShelfError>>,
    },
}

impl DbHandle {
    pub fn open(path: &Path) -> Result<Self, TvShelfError> {
        let storage = Storage::open(path)?;
        tracing::info!(path = %path.display(), "database opened");
        Self::spawn(storage)
    }

    /// In-memory database, used by tests and throwaway sessions.
    pub fn open_memory() -> Result<Self, TvShelfError> {
        Self::spawn(Storage::open_memory()?)
    }

    fn spawn(storage: Storage) -> Result<Self, TvShelfError> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("db-actor".into())
            .spawn(move || actor_loop(storage, rx))?;

        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, TvShelfError>>) -> DbCommand,
    ) -> Result<T, TvShelfError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(build(reply)).is_err() {
            return Err(TvShelfError::Closed);
        }
        rx.await.unwrap_or(Err(TvShelfError::Closed))
    }
}

impl LocalStore for DbHandle {
    type Error = TvShelfError;

    async fn upsert_episode(&self, episode: SeasonEpisode) -> Result<(), TvShelfError> {
        self.request(|reply| DbCommand::UpsertEpisode { episode, reply })
            .await
    }

    async fn get_episodes_by_season(
        &self,
        tv_show_id: i64,
        season_number: u32,
    ) -> Result<Vec<SeasonEpisode>, TvShelfError> {
        self.request(|reply| DbCommand::GetEpisodesBySeason {
            tv_show_id,
            season_number,
            reply,
        })
        .await
    }

    async fn get_watched_status(&self, episode_id: i64) -> Result<bool, TvShelfError> {
        self.request(|reply| DbCommand::GetWatchedStatus { episode_id, reply })
            .await
    }

    async fn set_watched_status(&self, episode_id: i64, watched: bool) -> Result<(), TvShelfError> {
        self.request(|reply| DbCommand::SetWatchedStatus {
            episode_id,
            watched,
            reply,
        })
        .await
    }

    async fn upsert_recent_show(&self, recent: RecentShow) -> Result<(), TvShelfError> {
        self.request(|reply| DbCommand::UpsertRecentShow { recent, reply })
            .await
    }

    async fn get_recent_shows(&self) -> Result<Vec<RecentShow>, TvShelfError> {
        self.request(|reply| DbCommand::GetRecentShows { reply })
            .await
    }

    async fn get_top_episodes(
        &self,
        tv_show_id: i64,
        limit: u32,
    ) -> Result<Vec<SeasonEpisode>, TvShelfError> {
        self.request(|reply| DbCommand::GetTopEpisodes {
            tv_show_id,
            limit,
            reply,
        })
        .await
    }
}

fn actor_loop(storage: Storage, mut rx: mpsc::UnboundedReceiver<DbCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            DbCommand::UpsertEpisode { episode, reply } => {
                let _ = reply.send(storage.upsert_episode(&episode));
            }
            DbCommand::GetEpisodesBySeason {
                tv_show_id,
                season_number,
                reply,
            } => {
                let _ = reply.send(storage.get_episodes_by_season(tv_show_id, season_number));
            }
            DbCommand::GetWatchedStatus { episode_id, reply } => {
                let _ = reply.send(storage.get_watched_status(episode_id));
            }
            DbCommand::SetWatchedStatus {
                episode_id,
                watched,
                reply,
            } => {
                let _ = reply.send(storage.set_watched_status(episode_id, watched));
            }
            DbCommand::UpsertRecentShow { recent, reply } => {
                let _ = reply.send(storage.upsert_recent_show(&recent));
            }
            DbCommand::GetRecentShows { reply } => {
                let _ = reply.send(storage.get_recent_shows());
            }
            DbCommand::GetTopEpisodes {
                tv_show_id,
                limit,
                reply,
            } => {
                let _ = reply.send(storage.get_top_episodes(tv_show_id, limit));
            }
        }
    }
    tracing::debug!("db actor stopped");
}
