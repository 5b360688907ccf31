pub mod aggregator;
pub mod catalog;
pub mod embed;
pub mod favorites;
pub mod home;
pub mod pagination;
pub mod providers;
pub mod recommendations;
pub mod registry;

pub use favorites::FavoritesStore;
pub use pagination::IncrementalList;
pub use providers::{CatalogProvider, TmdbProvider};
pub use registry::CategoryRegistry;
