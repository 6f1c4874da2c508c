//! Booli specifics: where listings live on the page and how a session walks
//! the sold-price search.

pub mod extract;
pub mod session;

pub use extract::{extract_listing_refs, extract_market_status, extract_relevant_data};
pub use session::{scrape_listings, search_endpoint, ScrapeOptions, ScrapeSummary, StopReason};
