pub mod enrich;
pub mod models;
pub mod normalize;
pub mod scrapers;
pub mod sink;
