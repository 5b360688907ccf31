//! Embed player URLs.
//!
//! Playback is delegated to third-party players loaded in an iframe; this module only builds
//! their URLs. Providers are tried in priority order (lower first) and a caller may pin one
//! to the front.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{AppError, AppResult},
    models::MediaKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedProvider {
    VidPlus,
    Videasy,
    #[serde(rename = "movies111", alias = "111movies")]
    Movies111,
    VidSrc,
}

impl EmbedProvider {
    pub const ALL: [EmbedProvider; 4] = [
        EmbedProvider::VidPlus,
        EmbedProvider::Videasy,
        EmbedProvider::Movies111,
        EmbedProvider::VidSrc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EmbedProvider::VidPlus => "VidPlus",
            EmbedProvider::Videasy => "VIDEASY",
            EmbedProvider::Movies111 => "111Movies",
            EmbedProvider::VidSrc => "VidSrc",
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            EmbedProvider::VidPlus => "https://player.vidplus.to/embed",
            EmbedProvider::Videasy => "https://player.videasy.net",
            EmbedProvider::Movies111 => "https://111movies.com",
            EmbedProvider::VidSrc => "https://vidsrc.xyz",
        }
    }

    /// Lower is preferred
    pub fn priority(&self) -> u8 {
        match self {
            EmbedProvider::VidPlus => 1,
            EmbedProvider::Videasy => 2,
            EmbedProvider::Movies111 => 3,
            EmbedProvider::VidSrc => 4,
        }
    }

    pub fn is_active(&self) -> bool {
        true
    }

    fn path(&self, target: &PlaybackTarget) -> String {
        match (self, target) {
            (EmbedProvider::VidSrc, PlaybackTarget::Film { id }) => format!("/embed/movie/{id}"),
            (EmbedProvider::VidSrc, PlaybackTarget::Episode { id, season, episode }) => {
                format!("/embed/tv/{id}/{season}-{episode}")
            }
            (_, PlaybackTarget::Film { id }) => format!("/movie/{id}"),
            (_, PlaybackTarget::Episode { id, season, episode }) => {
                format!("/tv/{id}/{season}/{episode}")
            }
        }
    }

    fn default_params(&self, target: &PlaybackTarget) -> Vec<(String, String)> {
        let pairs: &[(&str, &str)] = match (self, target) {
            (EmbedProvider::VidPlus | EmbedProvider::Movies111, _) => &[],
            (EmbedProvider::Videasy, _) => &[
                ("color", "8B5CF6"),
                ("episodeSelector", "true"),
                ("nextEpisode", "true"),
                ("autoplayNextEpisode", "true"),
                ("autoplay", "true"),
                ("fullscreen", "true"),
            ],
            (EmbedProvider::VidSrc, PlaybackTarget::Film { .. }) => {
                &[("autoplay", "1"), ("ds_lang", "en")]
            }
            (EmbedProvider::VidSrc, PlaybackTarget::Episode { .. }) => {
                &[("autoplay", "1"), ("autonext", "0"), ("ds_lang", "en")]
            }
        };

        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Whether the player reads query parameters at all
    fn accepts_params(&self) -> bool {
        matches!(self, EmbedProvider::Videasy | EmbedProvider::VidSrc)
    }
}

impl Display for EmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EmbedProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vidplus" => Ok(EmbedProvider::VidPlus),
            "videasy" => Ok(EmbedProvider::Videasy),
            "movies111" | "111movies" => Ok(EmbedProvider::Movies111),
            "vidsrc" => Ok(EmbedProvider::VidSrc),
            other => Err(AppError::InvalidInput(format!("Unknown embed provider: {}", other))),
        }
    }
}

/// What to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTarget {
    Film { id: u64 },
    Episode { id: u64, season: u32, episode: u32 },
}

impl PlaybackTarget {
    /// Series without an explicit episode start at season 1, episode 1
    pub fn new(kind: MediaKind, id: u64, season: Option<u32>, episode: Option<u32>) -> Self {
        match kind {
            MediaKind::Film => PlaybackTarget::Film { id },
            MediaKind::Series => PlaybackTarget::Episode {
                id,
                season: season.unwrap_or(1).max(1),
                episode: episode.unwrap_or(1).max(1),
            },
        }
    }
}

/// Builds the player URL for `target`
///
/// `extra_params` override the provider's defaults key by key; unknown keys are appended.
/// Providers that take no query parameters ignore them.
pub fn build_url(
    provider: EmbedProvider,
    target: &PlaybackTarget,
    extra_params: &[(String, String)],
) -> AppResult<Url> {
    let raw = format!("{}{}", provider.base_url(), provider.path(target));
    let mut url = Url::parse(&raw)
        .map_err(|e| AppError::Internal(format!("Invalid embed URL {}: {}", raw, e)))?;

    if provider.accepts_params() {
        let mut params = provider.default_params(target);
        for (key, value) in extra_params {
            match params.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.clone(),
                None => params.push((key.clone(), value.clone())),
            }
        }

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
    }

    Ok(url)
}

/// One playable source for a title
#[derive(Debug, Clone, Serialize)]
pub struct EmbedSource {
    pub provider: EmbedProvider,
    pub name: &'static str,
    pub priority: u8,
    pub url: String,
}

/// Active providers sorted by priority, with `preferred` (if any) moved to the front
pub fn ordered_providers(preferred: Option<EmbedProvider>) -> Vec<EmbedProvider> {
    let mut providers: Vec<EmbedProvider> = EmbedProvider::ALL
        .into_iter()
        .filter(EmbedProvider::is_active)
        .collect();
    providers.sort_by_key(EmbedProvider::priority);

    if let Some(preferred) = preferred {
        if let Some(pos) = providers.iter().position(|p| *p == preferred) {
            let pinned = providers.remove(pos);
            providers.insert(0, pinned);
        }
    }

    providers
}

/// URLs for every active provider, in the order they should be offered
pub fn embed_sources(
    target: &PlaybackTarget,
    preferred: Option<EmbedProvider>,
    extra_params: &[(String, String)],
) -> Vec<EmbedSource> {
    ordered_providers(preferred)
        .into_iter()
        .filter_map(|provider| match build_url(provider, target, extra_params) {
            Ok(url) => Some(EmbedSource {
                provider,
                name: provider.name(),
                priority: provider.priority(),
                url: url.to_string(),
            }),
            Err(e) => {
                tracing::error!(error = %e, provider = %provider, "Failed to build embed URL");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film() -> PlaybackTarget {
        PlaybackTarget::new(MediaKind::Film, 550, None, None)
    }

    fn episode() -> PlaybackTarget {
        PlaybackTarget::new(MediaKind::Series, 1399, Some(2), Some(5))
    }

    #[test]
    fn test_plain_providers_have_no_query() {
        let url = build_url(EmbedProvider::VidPlus, &film(), &[]).unwrap();
        assert_eq!(url.as_str(), "https://player.vidplus.to/embed/movie/550");

        let url = build_url(EmbedProvider::Movies111, &episode(), &[]).unwrap();
        assert_eq!(url.as_str(), "https://111movies.com/tv/1399/2/5");
    }

    #[test]
    fn test_plain_providers_ignore_extra_params() {
        let extra = vec![("autoplay".to_string(), "false".to_string())];
        let url = build_url(EmbedProvider::VidPlus, &episode(), &extra).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_videasy_defaults() {
        let url = build_url(EmbedProvider::Videasy, &film(), &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://player.videasy.net/movie/550?color=8B5CF6&episodeSelector=true&nextEpisode=true&autoplayNextEpisode=true&autoplay=true&fullscreen=true"
        );
    }

    #[test]
    fn test_vidsrc_episode_path_and_autonext() {
        let url = build_url(EmbedProvider::VidSrc, &episode(), &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://vidsrc.xyz/embed/tv/1399/2-5?autoplay=1&autonext=0&ds_lang=en"
        );

        let url = build_url(EmbedProvider::VidSrc, &film(), &[]).unwrap();
        assert_eq!(url.as_str(), "https://vidsrc.xyz/embed/movie/550?autoplay=1&ds_lang=en");
    }

    #[test]
    fn test_extra_params_override_in_place_and_append() {
        let extra = vec![
            ("ds_lang".to_string(), "de".to_string()),
            ("sub_url".to_string(), "https://subs.example/a.vtt".to_string()),
        ];
        let url = build_url(EmbedProvider::VidSrc, &film(), &extra).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("autoplay".to_string(), "1".to_string()),
                ("ds_lang".to_string(), "de".to_string()),
                ("sub_url".to_string(), "https://subs.example/a.vtt".to_string()),
            ]
        );
    }

    #[test]
    fn test_series_defaults_to_first_episode() {
        let target = PlaybackTarget::new(MediaKind::Series, 42, None, Some(0));
        assert_eq!(
            target,
            PlaybackTarget::Episode {
                id: 42,
                season: 1,
                episode: 1
            }
        );
    }

    #[test]
    fn test_provider_order_and_override() {
        assert_eq!(ordered_providers(None), EmbedProvider::ALL.to_vec());
        assert_eq!(
            ordered_providers(Some(EmbedProvider::VidSrc)),
            vec![
                EmbedProvider::VidSrc,
                EmbedProvider::VidPlus,
                EmbedProvider::Videasy,
                EmbedProvider::Movies111
            ]
        );
    }

    #[test]
    fn test_embed_sources_cover_every_provider() {
        let sources = embed_sources(&film(), Some(EmbedProvider::Videasy), &[]);
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].provider, EmbedProvider::Videasy);
        assert!(sources.iter().all(|s| s.url.starts_with("https://")));
    }

    #[test]
    fn test_provider_from_query_value() {
        assert_eq!("VidSrc".parse::<EmbedProvider>().unwrap(), EmbedProvider::VidSrc);
        assert!("youtube".parse::<EmbedProvider>().is_err());
    }

    #[test]
    fn test_provider_names_parse() {
        let provider: EmbedProvider = serde_json::from_str("\"111movies\"").unwrap();
        assert_eq!(provider, EmbedProvider::Movies111);
        let provider: EmbedProvider = serde_json::from_str("\"vidsrc\"").unwrap();
        assert_eq!(provider, EmbedProvider::VidSrc);
    }
}
