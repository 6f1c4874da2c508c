use crate::domain::model::{ListingRecord, ScrapedEntry};
use crate::utils::error::{HousingError, Result};
use serde_json::Value;

/// CSV header, in [`ListingRecord`] field order.
pub const LISTING_COLUMNS: [&str; 28] = [
    "url_listing_type",
    "url_listing_id",
    "booli_id",
    "sold_date",
    "days_listed",
    "residence_type",
    "address",
    "apartment_number",
    "urban_area",
    "municipality",
    "construction_year",
    "list_price",
    "sold_price",
    "sold_price_type",
    "first_price",
    "monthly_payment",
    "rent",
    "operating_cost",
    "energy_class",
    "floor",
    "building_floors",
    "latitude",
    "longitude",
    "has_solar_panels",
    "agency_id",
    "agent_id",
    "booli_ids_of_previous_sales",
    "n_previous_sales",
];

/// Follows `path` through nested objects; `None` as soon as a key is missing.
pub fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// `bostad/2556516` -> (`bostad`, 2556516)
pub fn parse_url_id(entry_id: &str) -> Result<(String, u64)> {
    let (listing_type, listing_id) = entry_id
        .split_once('/')
        .ok_or_else(|| HousingError::missing_data(entry_id, "id is not of the form type/number"))?;
    let listing_id = listing_id
        .parse::<u64>()
        .map_err(|e| HousingError::missing_data(entry_id, format!("listing id: {}", e)))?;
    Ok((listing_type.to_string(), listing_id))
}

/// The sale or listing object of an entry's Apollo state.
pub fn property_details(entry: &ScrapedEntry) -> Result<&Value> {
    entry
        .data
        .as_object()
        .and_then(|data| {
            data.iter()
                .find(|(key, _)| key.starts_with("SoldProperty:") || key.starts_with("Listing:"))
                .map(|(_, details)| details)
        })
        .ok_or_else(|| {
            HousingError::missing_data(&entry.id, "no 'SoldProperty' or 'Listing' data key")
        })
}

pub fn previous_sales(details: &Value) -> Vec<i64> {
    details
        .get("salesOfResidence")
        .and_then(Value::as_array)
        .map(|sales| {
            sales
                .iter()
                .filter_map(|sale| sale.get("booliId").and_then(as_i64))
                .collect()
        })
        .unwrap_or_default()
}

pub fn format_entry(entry: &ScrapedEntry) -> Result<ListingRecord> {
    let (url_listing_type, url_listing_id) = parse_url_id(&entry.id)?;
    let details = property_details(entry)?;

    let field = |key: &str| details.get(key);
    let nested = |path: &[&str]| get_nested_value(details, path);
    let sales = previous_sales(details);

    Ok(ListingRecord {
        url_listing_type,
        url_listing_id,
        booli_id: field("booliId").and_then(as_i64),
        sold_date: field("soldDate").and_then(as_string),
        days_listed: field("daysActive").and_then(as_i64),
        residence_type: field("objectType").and_then(as_string),
        address: field("streetAddress").and_then(as_string),
        apartment_number: nested(&["apartmentNumber", "value"]).and_then(as_string),
        urban_area: field("descriptiveAreaName").and_then(as_string),
        municipality: nested(&["location", "region", "municipalityName"]).and_then(as_string),
        construction_year: field("constructionYear").and_then(as_i64),
        list_price: nested(&["listPrice", "raw"]).and_then(as_f64),
        sold_price: nested(&["soldPrice", "raw"]).and_then(as_f64),
        sold_price_type: field("soldPriceType").and_then(as_string),
        first_price: nested(&["firstPrice", "value"]).and_then(as_f64),
        monthly_payment: nested(&["monthlyPayment", "formatted"]).and_then(as_string),
        rent: nested(&["rent", "raw"]).and_then(as_f64),
        operating_cost: nested(&["operatingCost", "raw"]).and_then(as_f64),
        energy_class: nested(&["energyClass", "score"]).and_then(as_string),
        floor: nested(&["floor", "value"]).and_then(as_f64),
        building_floors: field("buildingFloors").and_then(as_i64),
        latitude: field("latitude").and_then(as_f64),
        longitude: field("longitude").and_then(as_f64),
        has_solar_panels: field("hasSolarPanels").and_then(Value::as_bool),
        agency_id: field("agencyId").and_then(as_string),
        agent_id: field("agentId").and_then(as_string),
        booli_ids_of_previous_sales: sales
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(";"),
        n_previous_sales: sales.len(),
    })
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Prices sometimes arrive formatted, e.g. "3 250 000 kr"
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}
