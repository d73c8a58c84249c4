mod episode;
mod show;

pub use episode::SeasonEpisode;
pub use show::{RecentShow, SearchMatch, Show, ShowDetail};
