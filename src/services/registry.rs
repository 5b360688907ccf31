//! Static registry of category listings, keyed by slug.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult, FetchError, FetchResult},
    models::{DiscoverFilters, MediaItem, MediaKind, SortKey, TimeWindow, TrendingScope},
    services::{
        aggregator::{self, SubQuery},
        catalog,
        pagination::PageSource,
        providers::CatalogProvider,
    },
};

/// How a category produces its pages
#[derive(Debug, Clone)]
pub enum CategorySource {
    Trending {
        scope: TrendingScope,
        window: TimeWindow,
    },
    Discover {
        kind: MediaKind,
        filters: DiscoverFilters,
        /// Adds `release_date_lte = today` at request time
        released_until_today: bool,
    },
    /// Curated picks resolved title-by-title; only page 1 has content
    TitleList(Vec<&'static str>),
}

/// A registry entry: heading plus page source
#[derive(Debug, Clone)]
pub struct CategoryDescriptor {
    pub slug: &'static str,
    pub title: &'static str,
    pub source: CategorySource,
}

impl CategoryDescriptor {
    pub fn new(slug: &'static str, title: &'static str, source: CategorySource) -> Self {
        Self {
            slug,
            title,
            source,
        }
    }

    /// Fetches one 1-based page; an empty page means the category is exhausted
    pub async fn fetch_page(
        &self,
        provider: Arc<dyn CatalogProvider>,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>> {
        let page = page.max(1);

        match &self.source {
            CategorySource::Trending { scope, window } => {
                provider.fetch_trending(*scope, *window, page).await
            }
            CategorySource::Discover {
                kind,
                filters,
                released_until_today,
            } => {
                let filters = if *released_until_today {
                    filters.clone().released_before(today())
                } else {
                    filters.clone()
                };
                provider.fetch_discover_page(*kind, &filters, page).await
            }
            CategorySource::TitleList(titles) => {
                if page > 1 {
                    return Ok(Vec::new());
                }
                Ok(resolve_titles(provider, titles).await)
            }
        }
    }
}

/// Resolves curated titles concurrently, keeping declaration order
///
/// Each title takes the first series match, falling back to the first film match. Titles
/// with no match are dropped, and a title list that names the same show twice yields it once.
pub async fn resolve_titles(provider: Arc<dyn CatalogProvider>, titles: &[&'static str]) -> Vec<MediaItem> {
    let sub_queries: Vec<SubQuery> = titles
        .iter()
        .map(|title| {
            let provider = provider.clone();
            let title = *title;
            let query: SubQuery = async move {
                let found = catalog::first_match(
                    provider.as_ref(),
                    title,
                    &[MediaKind::Series, MediaKind::Film],
                )
                .await;
                Ok::<_, FetchError>(found.into_iter().collect::<Vec<_>>())
            }
            .boxed();
            query
        })
        .collect();

    aggregator::aggregate(sub_queries).await
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// A category bound to a provider, usable as a page source by list sessions
#[derive(Clone)]
pub struct CategoryPages {
    descriptor: Arc<CategoryDescriptor>,
    provider: Arc<dyn CatalogProvider>,
}

impl CategoryPages {
    pub fn new(descriptor: Arc<CategoryDescriptor>, provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            descriptor,
            provider,
        }
    }
}

#[async_trait::async_trait]
impl PageSource for CategoryPages {
    async fn fetch_page(&self, page: u32) -> FetchResult<Vec<MediaItem>> {
        self.descriptor.fetch_page(self.provider.clone(), page).await
    }

    fn slug(&self) -> &str {
        self.descriptor.slug
    }

    fn title(&self) -> &str {
        self.descriptor.title
    }
}

/// Summary row for listing categories
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub slug: &'static str,
    pub title: &'static str,
}

/// Read-only slug → descriptor mapping
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: HashMap<&'static str, Arc<CategoryDescriptor>>,
    order: Vec<&'static str>,
}

impl CategoryRegistry {
    /// Builds a registry; a later descriptor with a duplicate slug replaces the earlier one
    pub fn from_descriptors(descriptors: Vec<CategoryDescriptor>) -> Self {
        let mut categories = HashMap::new();
        let mut order = Vec::new();

        for descriptor in descriptors {
            let slug = descriptor.slug;
            if categories.insert(slug, Arc::new(descriptor)).is_none() {
                order.push(slug);
            }
        }

        Self { categories, order }
    }

    /// Looks up a slug. Unknown slugs are a not-found condition, never a default.
    pub fn resolve(&self, slug: &str) -> AppResult<Arc<CategoryDescriptor>> {
        self.categories
            .get(slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown category: {}", slug)))
    }

    /// Categories in registration order
    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.order
            .iter()
            .filter_map(|slug| self.categories.get(slug))
            .map(|descriptor| CategorySummary {
                slug: descriptor.slug,
                title: descriptor.title,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// The built-in category set
    pub fn builtin() -> Self {
        Self::from_descriptors(builtin_descriptors())
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Built-in categories
// ============================================================================

const SURVIVALISTS: &[&str] = &[
    "Man vs. Wild",
    "Survivorman",
    "Alone",
    "Naked and Afraid",
    "Bear Grylls",
    "Dual Survival",
];
const ADVENTURERS: &[&str] = &[
    "Expedition Unknown",
    "River Monsters",
    "Parts Unknown",
    "Man vs. Wild",
];
const WILD_KINGDOM: &[&str] = &["Planet Earth", "Blue Planet", "Our Planet", "Frozen Planet"];
const COMPETITION: &[&str] = &["Survivor", "The Amazing Race", "Wipeout", "American Ninja Warrior"];
const EXPEDITIONS: &[&str] = &["Free Solo", "The Dawn Wall", "14 Peaks", "Meru"];

const CARTOON_NETWORK: &[&str] = &[
    "Ben 10",
    "Dexter",
    "Powerpuff Girls",
    "Johnny Bravo",
    "Courage the Cowardly Dog",
    "Samurai Jack",
    "Teen Titans",
];
const POGO: &[&str] = &["M.A.D", "Takeshi Castle", "Mr. Bean", "Oswald", "Noddy", "Bob the Builder"];
const NICKELODEON: &[&str] = &[
    "SpongeBob",
    "Avatar: The Last Airbender",
    "Danny Phantom",
    "Fairly OddParents",
];
const DISNEY_CHANNEL: &[&str] = &["Doraemon", "Shinchan", "Phineas and Ferb", "Gravity Falls", "Kim Possible"];

/// Netflix in TMDB's watch-provider ids
const NETFLIX_PROVIDER_ID: &str = "8";

/// English-language titles as released in the US
pub(crate) fn hollywood() -> DiscoverFilters {
    DiscoverFilters::new().language("en").region("US")
}

fn discover(kind: MediaKind, filters: DiscoverFilters) -> CategorySource {
    CategorySource::Discover {
        kind,
        filters,
        released_until_today: false,
    }
}

fn discover_released(kind: MediaKind, filters: DiscoverFilters) -> CategorySource {
    CategorySource::Discover {
        kind,
        filters,
        released_until_today: true,
    }
}

fn titles(lists: &[&[&'static str]]) -> CategorySource {
    CategorySource::TitleList(lists.concat())
}

fn builtin_descriptors() -> Vec<CategoryDescriptor> {
    use MediaKind::{Film, Series};
    use SortKey::{PopularityDesc, ReleaseDateDesc, VoteAverageDesc};

    vec![
        CategoryDescriptor::new(
            "top-weekly",
            "Trending Now",
            CategorySource::Trending {
                scope: TrendingScope::All,
                window: TimeWindow::Week,
            },
        ),
        CategoryDescriptor::new(
            "latest-release",
            "Latest Release",
            discover_released(Film, hollywood().min_votes(150).sort(ReleaseDateDesc)),
        ),
        CategoryDescriptor::new(
            "featured-hollywood",
            "Featured Hollywood",
            discover_released(Film, hollywood().min_votes(200).sort(PopularityDesc)),
        ),
        CategoryDescriptor::new(
            "top-rated-hollywood-movies",
            "Top Rated Hollywood Movies",
            discover(Film, hollywood().min_votes(300).sort(VoteAverageDesc)),
        ),
        CategoryDescriptor::new(
            "featured-bollywood",
            "Featured Bollywood",
            discover(Film, DiscoverFilters::new().language("hi").min_votes(10).sort(PopularityDesc)),
        ),
        CategoryDescriptor::new(
            "featured-animated",
            "Featured Animated",
            discover(Film, DiscoverFilters::new().genres("16").sort(PopularityDesc)),
        ),
        CategoryDescriptor::new(
            "featured-korean",
            "Featured Korean Cinema",
            discover(Film, DiscoverFilters::new().language("ko").min_votes(10).sort(PopularityDesc)),
        ),
        CategoryDescriptor::new(
            "featured-adventure",
            "Adventure & Survival",
            titles(&[SURVIVALISTS, ADVENTURERS, WILD_KINGDOM, COMPETITION, EXPEDITIONS]),
        ),
        CategoryDescriptor::new(
            "mindfucks-movies",
            "Best Mindfucks",
            discover(
                Film,
                DiscoverFilters::new()
                    .sort(VoteAverageDesc)
                    .min_votes(200)
                    .genres("9648|53|878")
                    .without_genres("10751")
                    .adult(false),
            ),
        ),
        CategoryDescriptor::new(
            "survival-docs",
            "The Survivalists: Pushing Human Limits",
            titles(&[SURVIVALISTS]),
        ),
        CategoryDescriptor::new(
            "explorer-docs",
            "The Adventurers & Explorers: Journey to the Unknown",
            titles(&[ADVENTURERS]),
        ),
        CategoryDescriptor::new("wildlife-docs", "The Wild Kingdom", titles(&[WILD_KINGDOM])),
        CategoryDescriptor::new(
            "competition-docs",
            "The Competition: Survival of the Fittest",
            titles(&[COMPETITION]),
        ),
        CategoryDescriptor::new(
            "expedition-docs",
            "Deep Dives: Ocean and Mountain Expeditions",
            titles(&[EXPEDITIONS]),
        ),
        CategoryDescriptor::new(
            "popular-hindi-tv",
            "Popular Hindi TV Shows",
            discover(Series, DiscoverFilters::new().language("hi").sort(PopularityDesc).min_votes(5)),
        ),
        CategoryDescriptor::new(
            "top-rated-netflix",
            "Top Rated on Netflix",
            discover(
                Film,
                DiscoverFilters::new()
                    .watch_provider("US", NETFLIX_PROVIDER_ID, "flatrate")
                    .sort(VoteAverageDesc)
                    .min_votes(300),
            ),
        ),
        CategoryDescriptor::new(
            "popular-animated-tv",
            "Popular Animated TV Shows",
            discover(Series, DiscoverFilters::new().genres("16,10751").sort(PopularityDesc)),
        ),
        CategoryDescriptor::new(
            "popular-korean-tv",
            "Popular Korean TV Shows",
            discover(
                Series,
                DiscoverFilters::new()
                    .language("ko")
                    .sort(PopularityDesc)
                    .min_votes(10)
                    .adult(false),
            ),
        ),
        CategoryDescriptor::new(
            "latest-bollywood",
            "Latest Bollywood Releases",
            discover_released(Film, DiscoverFilters::new().language("hi").sort(ReleaseDateDesc)),
        ),
        CategoryDescriptor::new(
            "classics-bollywood",
            "Top-Rated Bollywood Classics",
            discover(
                Film,
                DiscoverFilters::new()
                    .language("hi")
                    .released_before("2000-12-31")
                    .sort(VoteAverageDesc)
                    .min_votes(20),
            ),
        ),
        CategoryDescriptor::new(
            "action-bollywood",
            "Action Bollywood",
            discover(Film, DiscoverFilters::new().language("hi").genres("28")),
        ),
        CategoryDescriptor::new(
            "romance-bollywood",
            "Romantic Bollywood",
            discover(Film, DiscoverFilters::new().language("hi").genres("10749")),
        ),
        CategoryDescriptor::new(
            "latest-korean-movies",
            "Latest Korean Releases",
            discover(Film, DiscoverFilters::new().language("ko").sort(ReleaseDateDesc).min_votes(10)),
        ),
        CategoryDescriptor::new(
            "top-rated-korean-movies",
            "Top-Rated Korean Movies",
            discover(Film, DiscoverFilters::new().language("ko").sort(VoteAverageDesc).min_votes(20)),
        ),
        CategoryDescriptor::new("cartoons-cn", "Cartoon Network", titles(&[CARTOON_NETWORK])),
        CategoryDescriptor::new("cartoons-pogo", "Pogo", titles(&[POGO])),
        CategoryDescriptor::new("cartoons-nick", "Nickelodeon", titles(&[NICKELODEON])),
        CategoryDescriptor::new("cartoons-disney", "Disney Channel", titles(&[DISNEY_CHANNEL])),
    ]
}
