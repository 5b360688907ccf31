use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod filters;
pub mod tmdb;

pub use filters::{DiscoverFilters, SortKey};

/// Discriminant of a catalog item
///
/// Set once at the normalization boundary and never inferred from the item's shape later.
/// Path segments accept the TMDB spelling (`movie`, `tv`) as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[serde(alias = "movie")]
    Film,
    #[serde(alias = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment TMDB uses for this kind
    pub fn tmdb_segment(&self) -> &'static str {
        match self {
            MediaKind::Film => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Parses TMDB's `media_type` field. Anything other than `movie`/`tv` (e.g. `person`) is `None`.
    pub fn from_tmdb(media_type: &str) -> Option<Self> {
        match media_type {
            "movie" => Some(MediaKind::Film),
            "tv" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Film => write!(f, "film"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// Identity of a catalog item. Films and series may share a numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaKey {
    pub id: u64,
    pub kind: MediaKind,
}

impl Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// A film or series as surfaced to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    /// `release_date` for films, `first_air_date` for series
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Only populated by detail-level fetches
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl MediaItem {
    pub fn key(&self) -> MediaKey {
        MediaKey {
            id: self.id,
            kind: self.kind,
        }
    }
}

/// Season summary of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: u64,
    pub name: String,
    pub season_number: u32,
    #[serde(default)]
    pub episode_count: u32,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Trailer or clip attached to a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

/// Detail-level record for a single title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    #[serde(flatten)]
    pub item: MediaItem,
    pub tagline: Option<String>,
    /// Minutes; films only
    pub runtime: Option<u32>,
    /// Series only
    pub season_count: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

/// Credited performer, in billing order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Cast list of a single title
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    pub cast: Vec<CastMember>,
}

impl Credits {
    /// Keeps the first `limit` billed members
    pub fn top(mut self, limit: usize) -> Self {
        self.cast.truncate(limit);
        self
    }
}

/// Which trending feed to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingScope {
    #[serde(alias = "movie")]
    Film,
    #[serde(alias = "tv")]
    Series,
    All,
}

impl TrendingScope {
    pub fn tmdb_segment(&self) -> &'static str {
        match self {
            TrendingScope::Film => "movie",
            TrendingScope::Series => "tv",
            TrendingScope::All => "all",
        }
    }

    /// Fixed kind for single-kind feeds; `None` means each item carries its own `media_type`
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            TrendingScope::Film => Some(MediaKind::Film),
            TrendingScope::Series => Some(MediaKind::Series),
            TrendingScope::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_accepts_tmdb_aliases() {
        let film: MediaKind = serde_json::from_str("\"movie\"").unwrap();
        let series: MediaKind = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(film, MediaKind::Film);
        assert_eq!(series, MediaKind::Series);
        assert_eq!(serde_json::to_string(&MediaKind::Series).unwrap(), "\"series\"");
    }

    #[test]
    fn test_media_kind_from_tmdb_rejects_person() {
        assert_eq!(MediaKind::from_tmdb("movie"), Some(MediaKind::Film));
        assert_eq!(MediaKind::from_tmdb("tv"), Some(MediaKind::Series));
        assert_eq!(MediaKind::from_tmdb("person"), None);
    }

    #[test]
    fn test_key_distinguishes_kind() {
        let film = MediaKey { id: 7, kind: MediaKind::Film };
        let series = MediaKey { id: 7, kind: MediaKind::Series };
        assert_ne!(film, series);
        assert_eq!(format!("{}", series), "series:7");
    }

    #[test]
    fn test_details_serialize_flat() {
        let details = MediaDetails {
            item: MediaItem {
                id: 603,
                kind: MediaKind::Film,
                title: "The Matrix".to_string(),
                poster_path: Some("/matrix.jpg".to_string()),
                backdrop_path: None,
                vote_average: 8.2,
                popularity: 80.0,
                release_date: Some("1999-03-30".to_string()),
                overview: None,
                genres: vec![Genre { id: 878, name: "Science Fiction".to_string() }],
            },
            tagline: Some("Welcome to the Real World.".to_string()),
            runtime: Some(136),
            season_count: None,
            seasons: vec![],
            imdb_id: Some("tt0133093".to_string()),
            videos: vec![],
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["id"], 603);
        assert_eq!(json["kind"], "film");
        assert_eq!(json["runtime"], 136);
        assert_eq!(json["genres"][0]["name"], "Science Fiction");
    }
}
