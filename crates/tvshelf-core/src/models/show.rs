use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A show as listed in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub poster_path: String,
    pub air_date: String,
}

/// Which fields a search query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMatch {
    #[default]
    Title,
    TitleAndDescription,
}

impl Show {
    /// Case-insensitive substring match of `query` against this show.
    ///
    /// A blank query matches everything.
    pub fn matches_query(&self, query: &str, mode: SearchMatch) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if self.title.to_lowercase().contains(&needle) {
            return true;
        }
        match mode {
            SearchMatch::Title => false,
            SearchMatch::TitleAndDescription => {
                self.description.to_lowercase().contains(&needle)
            }
        }
    }
}

/// The currently selected show, as returned by a fetch-by-id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    pub show_id: i64,
    pub title: String,
    pub season_count: u32,
}

/// A show the user navigated to, with the time it was last opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentShow {
    pub show: Show,
    pub added_at: DateTime<Utc>,
}

impl RecentShow {
    pub fn now(show: Show) -> Self {
        Self {
            show,
            added_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(title: &str, description: &str) -> Show {
        Show {
            id: 1,
            title: title.into(),
            description: description.into(),
            poster_path: String::new(),
            air_date: String::new(),
        }
    }

    #[test]
    fn test_matches_title_case_insensitive() {
        let friends = show("Friends", "Six friends in New York");
        assert!(friends.matches_query("fri", SearchMatch::Title));
        assert!(friends.matches_query("FRIENDS", SearchMatch::Title));
        assert!(!friends.matches_query("office", SearchMatch::Title));
    }

    #[test]
    fn test_description_only_when_enabled() {
        let office = show("The Office", "A mockumentary about paper sales");
        assert!(!office.matches_query("paper", SearchMatch::Title));
        assert!(office.matches_query("paper", SearchMatch::TitleAndDescription));
    }

    #[test]
    fn test_blank_query_matches_everything() {
        let office = show("The Office", "");
        assert!(office.matches_query("", SearchMatch::Title));
        assert!(office.matches_query("   ", SearchMatch::Title));
    }
}
