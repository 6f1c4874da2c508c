//! Turning a valuation request into validated model input.

pub mod geocode;
pub mod request;
pub mod validator;

pub use geocode::{
    extract_coordinates, format_search_query, Address, Coordinates, Geocoder,
    DEFAULT_GEOCODER_URL,
};
pub use request::ValuationRequest;
pub use validator::{FeatureRange, ModelInput, TrainingDomain};
