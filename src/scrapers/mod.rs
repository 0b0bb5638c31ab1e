pub mod driver;
pub mod headers;
pub mod most_active;
pub mod pagination;
pub mod rows;
pub mod traits;
pub mod types;

pub use driver::ChromeDriver;
pub use most_active::MostActiveScraper;
pub use traits::TableScraper;
pub use types::ScrapeOptions;
