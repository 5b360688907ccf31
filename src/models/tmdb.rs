//! Raw TMDB API shapes and their normalization into [`MediaItem`], [`MediaDetails`] and [`Credits`].

use serde::Deserialize;

use super::{CastMember, Credits, Genre, MediaDetails, MediaItem, MediaKind, Season, Video};

/// One entry of a TMDB result page (`/trending`, `/discover`, `/search`, ...)
///
/// Films carry `title`/`release_date`, series carry `name`/`first_air_date`; mixed feeds
/// add `media_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl TmdbListItem {
    /// Normalizes into a [`MediaItem`] of the given kind
    ///
    /// Returns `None` for items without a poster: such items are never surfaced.
    pub fn into_media_item(self, kind: MediaKind) -> Option<MediaItem> {
        let poster_path = non_empty(self.poster_path.clone())?;
        Some(self.build(kind, Some(poster_path)))
    }

    fn build(self, kind: MediaKind, poster_path: Option<String>) -> MediaItem {
        let (title, release_date) = match kind {
            MediaKind::Film => (
                self.title.or(self.name),
                self.release_date.or(self.first_air_date),
            ),
            MediaKind::Series => (
                self.name.or(self.title),
                self.first_air_date.or(self.release_date),
            ),
        };

        MediaItem {
            id: self.id,
            kind,
            title: title.unwrap_or_default(),
            poster_path,
            backdrop_path: non_empty(self.backdrop_path),
            vote_average: self.vote_average,
            popularity: self.popularity,
            release_date: non_empty(release_date),
            overview: non_empty(self.overview),
            genres: Vec::new(),
        }
    }
}

/// Normalizes the `results` array of a TMDB page
///
/// With `kind = None` each entry's `media_type` decides its kind and entries that are
/// neither films nor series are dropped. Entries that fail to deserialize are skipped
/// rather than failing the page.
pub fn normalize_results(page: &serde_json::Value, kind: Option<MediaKind>) -> Vec<MediaItem> {
    let Some(results) = page["results"].as_array() else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|result| serde_json::from_value::<TmdbListItem>(result.clone()).ok())
        .filter_map(|item| {
            let kind = match kind {
                Some(kind) => kind,
                None => item.media_type.as_deref().and_then(MediaKind::from_tmdb)?,
            };
            item.into_media_item(kind)
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Vec<Video>,
}

/// Response of `/movie/{id}` and `/tv/{id}` with `append_to_response=videos`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    #[serde(flatten)]
    base: TmdbListItem,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    number_of_seasons: Option<u32>,
    #[serde(default)]
    seasons: Vec<Season>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    videos: Option<TmdbVideos>,
}

impl TmdbDetails {
    /// Detail records are single lookups, so they are kept even without a poster
    pub fn into_details(self, kind: MediaKind) -> MediaDetails {
        let poster_path = non_empty(self.base.poster_path.clone());
        let mut item = self.base.build(kind, poster_path);
        item.genres = self.genres;

        MediaDetails {
            item,
            tagline: non_empty(self.tagline),
            runtime: match kind {
                MediaKind::Film => self.runtime,
                MediaKind::Series => None,
            },
            season_count: match kind {
                MediaKind::Film => None,
                MediaKind::Series => self.number_of_seasons,
            },
            seasons: self.seasons,
            imdb_id: non_empty(self.imdb_id),
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbCastMember {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    profile_path: Option<String>,
    /// Billing position; entries without one sort last
    #[serde(default)]
    order: Option<u32>,
}

/// Response of `/movie/{id}/credits` and `/tv/{id}/credits`; crew is ignored
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
}

impl TmdbCredits {
    pub fn into_credits(self) -> Credits {
        let mut cast = self.cast;
        cast.sort_by_key(|member| member.order.unwrap_or(u32::MAX));

        Credits {
            cast: cast
                .into_iter()
                .filter(|member| !member.name.trim().is_empty())
                .map(|member| CastMember {
                    id: member.id,
                    name: member.name,
                    character: non_empty(member.character),
                    profile_path: non_empty(member.profile_path),
                })
                .collect(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_film_normalization() {
        let item: TmdbListItem = serde_json::from_value(json!({
            "id": 27205,
            "title": "Inception",
            "poster_path": "/inception.jpg",
            "backdrop_path": null,
            "vote_average": 8.4,
            "popularity": 95.5,
            "release_date": "2010-07-15"
        }))
        .unwrap();

        let media = item.into_media_item(MediaKind::Film).unwrap();
        assert_eq!(media.id, 27205);
        assert_eq!(media.kind, MediaKind::Film);
        assert_eq!(media.title, "Inception");
        assert_eq!(media.release_date.as_deref(), Some("2010-07-15"));
        assert_eq!(media.backdrop_path, None);
    }

    #[test]
    fn test_series_uses_name_and_first_air_date() {
        let item: TmdbListItem = serde_json::from_value(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "poster_path": "/bb.jpg",
            "first_air_date": "2008-01-20"
        }))
        .unwrap();

        let media = item.into_media_item(MediaKind::Series).unwrap();
        assert_eq!(media.title, "Breaking Bad");
        assert_eq!(media.release_date.as_deref(), Some("2008-01-20"));
    }

    #[test]
    fn test_items_without_poster_are_dropped() {
        let page = json!({
            "results": [
                { "id": 1, "title": "Has Poster", "poster_path": "/a.jpg" },
                { "id": 2, "title": "Null Poster", "poster_path": null },
                { "id": 3, "title": "No Poster Field" },
                { "id": 4, "title": "Empty Poster", "poster_path": "" }
            ]
        });

        let items = normalize_results(&page, Some(MediaKind::Film));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
    }

    #[test]
    fn test_mixed_feed_uses_media_type_and_drops_people() {
        let page = json!({
            "results": [
                { "id": 1, "title": "A Film", "poster_path": "/a.jpg", "media_type": "movie" },
                { "id": 1, "name": "A Show", "poster_path": "/b.jpg", "media_type": "tv" },
                { "id": 9, "name": "An Actor", "poster_path": "/c.jpg", "media_type": "person" },
                { "id": 10, "title": "Untagged", "poster_path": "/d.jpg" }
            ]
        });

        let items = normalize_results(&page, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Film);
        assert_eq!(items[1].kind, MediaKind::Series);
        assert_eq!(items[1].title, "A Show");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let page = json!({
            "results": [
                { "id": "not-a-number", "title": "Broken", "poster_path": "/x.jpg" },
                { "id": 5, "title": "Fine", "poster_path": "/y.jpg" }
            ]
        });

        let items = normalize_results(&page, Some(MediaKind::Film));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 5);
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(normalize_results(&json!({ "status_code": 7 }), Some(MediaKind::Film)).is_empty());
    }

    #[test]
    fn test_series_details() {
        let details: TmdbDetails = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "poster_path": null,
            "first_air_date": "2011-04-17",
            "vote_average": 8.4,
            "popularity": 300.0,
            "genres": [{ "id": 18, "name": "Drama" }],
            "tagline": "Winter is coming.",
            "number_of_seasons": 8,
            "seasons": [
                { "id": 3624, "name": "Season 1", "season_number": 1, "episode_count": 10 }
            ],
            "videos": { "results": [
                { "key": "abc", "name": "Trailer", "site": "YouTube", "type": "Trailer", "official": true }
            ]}
        }))
        .unwrap();

        let details = details.into_details(MediaKind::Series);
        assert_eq!(details.item.title, "Game of Thrones");
        assert_eq!(details.item.poster_path, None);
        assert_eq!(details.item.genres.len(), 1);
        assert_eq!(details.season_count, Some(8));
        assert_eq!(details.runtime, None);
        assert_eq!(details.seasons[0].episode_count, 10);
        assert_eq!(details.videos[0].video_type, "Trailer");
    }

    #[test]
    fn test_credits_follow_billing_order() {
        let credits: TmdbCredits = serde_json::from_value(json!({
            "id": 1399,
            "cast": [
                { "id": 3, "name": "Third", "character": "", "order": 2 },
                { "id": 9, "name": "Unbilled", "character": "Extra" },
                { "id": 1, "name": "Lead", "character": "Hero", "profile_path": "/lead.jpg", "order": 0 },
                { "id": 2, "name": "Second", "character": "Sidekick", "profile_path": null, "order": 1 }
            ],
            "crew": [{ "id": 50, "name": "Director", "job": "Director" }]
        }))
        .unwrap();

        let credits = credits.into_credits();
        let ids: Vec<u64> = credits.cast.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 9]);
        assert_eq!(credits.cast[0].profile_path.as_deref(), Some("/lead.jpg"));
        assert_eq!(credits.cast[2].character, None);
        assert_eq!(credits.top(2).cast.len(), 2);
    }
}
