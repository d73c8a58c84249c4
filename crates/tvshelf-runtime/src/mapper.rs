//! Conversion from raw catalog payloads into domain models.
//!
//! Default substitution rules, applied in one place:
//!
//! | raw field                                  | when absent          |
//! |--------------------------------------------|----------------------|
//! | any `id`                                   | [`MappingError`]     |
//! | show `name` / `overview` / `poster_path`   | `""`                 |
//! | show `first_air_date`                      | `""`                 |
//! | detail `number_of_seasons`                 | `0`                  |
//! | episode strings, `still_path`              | `""`                 |
//! | episode `episode_number`                   | `0`                  |
//! | episode `vote_average`                     | `0.0`                |
//!
//! Episodes come out unwatched with `tv_show_id` and `season_number` zeroed;
//! the coordinator fills those in from the local store and the request.

use std::collections::HashSet;

use thiserror::Error;

use tvshelf_api::tmdb::types::{RawEpisode, RawSeason, RawShow, RawShowDetail};
use tvshelf_core::models::{SeasonEpisode, Show, ShowDetail};

/// A required field was missing from a remote payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{shape} is missing required field `{field}`")]
pub struct MappingError {
    pub shape: &'static str,
    pub field: &'static str,
}

impl MappingError {
    fn missing(shape: &'static str, field: &'static str) -> Self {
        Self { shape, field }
    }
}

/// Every field of a search hit, with floats compared by bit pattern.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ContentKey {
    id: Option<i64>,
    name: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    first_air_date: Option<String>,
    original_language: Option<String>,
    origin_country: Vec<String>,
    genre_ids: Vec<i64>,
    popularity: Option<u64>,
    vote_average: Option<u64>,
    vote_count: Option<u64>,
}

impl ContentKey {
    fn of(raw: &RawShow) -> Self {
        Self {
            id: raw.id,
            name: raw.name.clone(),
            original_name: raw.original_name.clone(),
            overview: raw.overview.clone(),
            poster_path: raw.poster_path.clone(),
            backdrop_path: raw.backdrop_path.clone(),
            first_air_date: raw.first_air_date.clone(),
            original_language: raw.original_language.clone(),
            origin_country: raw.origin_country.clone(),
            genre_ids: raw.genre_ids.clone(),
            popularity: raw.popularity.map(f64::to_bits),
            vote_average: raw.vote_average.map(f64::to_bits),
            vote_count: raw.vote_count,
        }
    }
}

/// Drop search hits whose content repeats an earlier hit. Order is kept.
///
/// Hits sharing an id but differing in any field are both kept here.
pub fn dedup_raw_shows(raw: Vec<RawShow>) -> Vec<RawShow> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .filter(|hit| seen.insert(ContentKey::of(hit)))
        .collect()
}

/// One [`Show`] per hit, in input order.
pub fn to_show_list(raw: &[RawShow]) -> Result<Vec<Show>, MappingError> {
    raw.iter().map(to_show).collect()
}

fn to_show(raw: &RawShow) -> Result<Show, MappingError> {
    Ok(Show {
        id: raw.id.ok_or(MappingError::missing("search result", "id"))?,
        title: raw.name.clone().unwrap_or_default(),
        description: raw.overview.clone().unwrap_or_default(),
        poster_path: raw.poster_path.clone().unwrap_or_default(),
        air_date: raw.first_air_date.clone().unwrap_or_default(),
    })
}

pub fn to_show_detail(raw: &RawShowDetail) -> Result<ShowDetail, MappingError> {
    Ok(ShowDetail {
        show_id: raw.id.ok_or(MappingError::missing("show detail", "id"))?,
        title: raw.name.clone().unwrap_or_default(),
        season_count: raw.number_of_seasons.unwrap_or(0),
    })
}

pub fn to_season_episodes(raw: &RawSeason) -> Result<Vec<SeasonEpisode>, MappingError> {
    raw.episodes.iter().map(to_season_episode).collect()
}

fn to_season_episode(raw: &RawEpisode) -> Result<SeasonEpisode, MappingError> {
    Ok(SeasonEpisode {
        episode_id: raw.id.ok_or(MappingError::missing("episode", "id"))?,
        tv_show_id: 0,
        season_number: 0,
        episode_number: raw.episode_number.unwrap_or(0),
        name: raw.name.clone().unwrap_or_default(),
        air_date: raw.air_date.clone().unwrap_or_default(),
        overview: raw.overview.clone().unwrap_or_default(),
        vote_average: raw.vote_average.unwrap_or(0.0),
        image: raw.still_path.clone().unwrap_or_default(),
        is_watched: false,
    })
}
