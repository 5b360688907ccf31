use serde::{Deserialize, Serialize};

use super::MediaKind;

/// Sort keys understood by TMDB's discover endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PopularityDesc,
    VoteAverageDesc,
    /// `primary_release_date.desc` for films, `first_air_date.desc` for series
    ReleaseDateDesc,
}

impl SortKey {
    pub fn as_query(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (SortKey::PopularityDesc, _) => "popularity.desc",
            (SortKey::VoteAverageDesc, _) => "vote_average.desc",
            (SortKey::ReleaseDateDesc, MediaKind::Film) => "primary_release_date.desc",
            (SortKey::ReleaseDateDesc, MediaKind::Series) => "first_air_date.desc",
        }
    }
}

/// Typed query filters for the popular, discover and search endpoints
///
/// Values are passed to TMDB verbatim; nothing here validates them. Anything without a
/// named field goes through [`DiscoverFilters::param`], which is appended after the named
/// fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverFilters {
    /// Comma for AND, pipe for OR (e.g. `9648|53|878`)
    pub with_genres: Option<String>,
    pub without_genres: Option<String>,
    pub with_original_language: Option<String>,
    pub region: Option<String>,
    pub watch_region: Option<String>,
    pub with_watch_providers: Option<String>,
    pub with_watch_monetization_types: Option<String>,
    pub vote_count_gte: Option<u32>,
    pub release_date_gte: Option<String>,
    pub release_date_lte: Option<String>,
    pub sort_by: Option<SortKey>,
    pub include_adult: Option<bool>,
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl DiscoverFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn genres(mut self, genres: impl Into<String>) -> Self {
        self.with_genres = Some(genres.into());
        self
    }

    pub fn without_genres(mut self, genres: impl Into<String>) -> Self {
        self.without_genres = Some(genres.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.with_original_language = Some(language.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Restricts to a streaming provider (e.g. `8` for Netflix) in the given watch region
    pub fn watch_provider(
        mut self,
        region: impl Into<String>,
        provider_ids: impl Into<String>,
        monetization: impl Into<String>,
    ) -> Self {
        self.watch_region = Some(region.into());
        self.with_watch_providers = Some(provider_ids.into());
        self.with_watch_monetization_types = Some(monetization.into());
        self
    }

    pub fn min_votes(mut self, count: u32) -> Self {
        self.vote_count_gte = Some(count);
        self
    }

    pub fn released_before(mut self, date: impl Into<String>) -> Self {
        self.release_date_lte = Some(date.into());
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort_by = Some(key);
        self
    }

    pub fn adult(mut self, include: bool) -> Self {
        self.include_adult = Some(include);
        self
    }

    /// Pass-through parameter with no typed counterpart
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Renders the filters as TMDB query pairs for the given kind
    pub fn to_query(&self, kind: MediaKind) -> Vec<(String, String)> {
        let date_field = match kind {
            MediaKind::Film => "primary_release_date",
            MediaKind::Series => "first_air_date",
        };

        let mut query: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                query.push((key.to_string(), value));
            }
        };

        push("with_genres", self.with_genres.clone());
        push("without_genres", self.without_genres.clone());
        push("with_original_language", self.with_original_language.clone());
        push("region", self.region.clone());
        push("watch_region", self.watch_region.clone());
        push("with_watch_providers", self.with_watch_providers.clone());
        push(
            "with_watch_monetization_types",
            self.with_watch_monetization_types.clone(),
        );
        push("vote_count.gte", self.vote_count_gte.map(|v| v.to_string()));
        push(&format!("{date_field}.gte"), self.release_date_gte.clone());
        push(&format!("{date_field}.lte"), self.release_date_lte.clone());
        push(
            "sort_by",
            self.sort_by.map(|key| key.as_query(kind).to_string()),
        );
        push("include_adult", self.include_adult.map(|v| v.to_string()));

        query.extend(self.extra.iter().cloned());
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_query_uses_kind_specific_date_fields() {
        let filters = DiscoverFilters::new()
            .released_before("2000-12-31")
            .sort(SortKey::ReleaseDateDesc);

        let film = filters.to_query(MediaKind::Film);
        assert!(film.contains(&("primary_release_date.lte".to_string(), "2000-12-31".to_string())));
        assert!(film.contains(&("sort_by".to_string(), "primary_release_date.desc".to_string())));

        let series = filters.to_query(MediaKind::Series);
        assert!(series.contains(&("first_air_date.lte".to_string(), "2000-12-31".to_string())));
        assert!(series.contains(&("sort_by".to_string(), "first_air_date.desc".to_string())));
    }

    #[test]
    fn test_to_query_skips_unset_fields() {
        let query = DiscoverFilters::new().language("ko").to_query(MediaKind::Film);
        assert_eq!(
            query,
            vec![("with_original_language".to_string(), "ko".to_string())]
        );
    }

    #[test]
    fn test_extra_params_pass_through_verbatim() {
        let query = DiscoverFilters::new()
            .genres("9648|53|878")
            .param("with_keywords", "not|validated")
            .to_query(MediaKind::Film);

        assert_eq!(query[0], ("with_genres".to_string(), "9648|53|878".to_string()));
        assert_eq!(
            query.last(),
            Some(&("with_keywords".to_string(), "not|validated".to_string()))
        );
    }

    #[test]
    fn test_watch_provider_and_votes() {
        let query = DiscoverFilters::new()
            .watch_provider("US", "8", "flatrate")
            .min_votes(300)
            .adult(false)
            .to_query(MediaKind::Film);

        assert!(query.contains(&("watch_region".to_string(), "US".to_string())));
        assert!(query.contains(&("with_watch_providers".to_string(), "8".to_string())));
        assert!(query.contains(&("vote_count.gte".to_string(), "300".to_string())));
        assert!(query.contains(&("include_adult".to_string(), "false".to_string())));
    }
}
