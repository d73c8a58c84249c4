use serde::{Deserialize, Serialize};

/// One episode of a season, enriched with the locally stored watched flag.
///
/// `tv_show_id` and `season_number` are not part of the remote payload; they
/// are stamped after the season has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonEpisode {
    pub episode_id: i64,
    pub tv_show_id: i64,
    pub season_number: u32,
    pub episode_number: u32,
    pub name: String,
    pub air_date: String,
    pub overview: String,
    pub vote_average: f64,
    pub image: String,
    pub is_watched: bool,
}

impl SeasonEpisode {
    /// Attach the owning show and season.
    pub fn stamp(&mut self, tv_show_id: i64, season_number: u32) {
        self.tv_show_id = tv_show_id;
        self.season_number = season_number;
    }
}
