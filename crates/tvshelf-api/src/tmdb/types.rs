use serde::{Deserialize, Serialize};

// ── Search ──────────────────────────────────────────────────────

/// Response of `GET /search/tv`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RawShow>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// One search hit. TMDB omits or nulls most fields for obscure entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawShow {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
}

// ── Show detail ─────────────────────────────────────────────────

/// Response of `GET /tv/{id}` (only the fields tvshelf reads).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawShowDetail {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub first_air_date: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
}

// ── Season ──────────────────────────────────────────────────────

/// Response of `GET /tv/{id}/season/{n}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSeason {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub season_number: Option<u32>,
    pub air_date: Option<String>,
    #[serde(default)]
    pub episodes: Vec<RawEpisode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEpisode {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub episode_number: Option<u32>,
    pub season_number: Option<u32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
}

/// Error body TMDB sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct TmdbStatus {
    pub status_code: Option<i64>,
    pub status_message: Option<String>,
}
