pub mod records;

pub use records::{
    format_entry, get_nested_value, parse_url_id, previous_sales, property_details,
    LISTING_COLUMNS,
};
