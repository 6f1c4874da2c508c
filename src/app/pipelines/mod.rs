pub mod listings_pipeline;

pub use listings_pipeline::{ListingsPipeline, OUTPUT_FILENAME};
