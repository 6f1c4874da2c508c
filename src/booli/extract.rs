use crate::domain::model::{ListingRef, ListingType};
use crate::utils::error::{HousingError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static LISTING_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://www\.booli\.se/(annons|bostad)/(\d+)").expect("listing url pattern")
});

static NEXT_DATA_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("next data pattern")
});

// The sold/for-sale badge; the class list is how the site marks it.
static MARKET_STATUS_BADGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<div\b[^>]*\bclass\s*=\s*"py-1 rounded w-fit bg-bui-color-black text-bui-color-white[^"]*"[^>]*>(.*?)</div>"#,
    )
    .expect("market status pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Listing references in a search result page, in page order, without duplicates.
pub fn extract_listing_refs(search_content: &str) -> Vec<ListingRef> {
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for caps in LISTING_URL.captures_iter(search_content) {
        let Ok(listing_type) = caps[1].parse::<ListingType>() else {
            continue;
        };
        let listing = ListingRef {
            listing_type,
            listing_id: caps[2].to_string(),
        };
        if seen.insert(listing.clone()) {
            listings.push(listing);
        }
    }
    listings
}

pub fn extract_market_status(html: &str) -> Result<String> {
    let caps = MARKET_STATUS_BADGE
        .captures(html)
        .ok_or_else(|| HousingError::processing("Entry missing market status tag."))?;
    let text = TAG.replace_all(&caps[1], "");
    Ok(decode_entities(text.trim()))
}

/// Apollo state of a listing page, minus `ROOT_QUERY`, plus its `market_status`.
pub fn extract_relevant_data(html: &str) -> Result<serde_json::Value> {
    let script = NEXT_DATA_SCRIPT
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            HousingError::processing("Relevant script tag with specified id not found in html.")
        })?;
    let market_status = extract_market_status(html)?;

    let page_data: serde_json::Value = serde_json::from_str(&script)
        .map_err(|e| HousingError::processing(format!("Failed to decode JSON: {}", e)))?;

    let mut relevant_data = page_data
        .pointer("/props/pageProps/__APOLLO_STATE__")
        .and_then(|v| v.as_object())
        .cloned()
        .ok_or_else(|| {
            HousingError::processing("Error accessing data: no props.pageProps.__APOLLO_STATE__")
        })?;

    relevant_data.remove("ROOT_QUERY");
    relevant_data.insert(
        "market_status".to_string(),
        serde_json::Value::String(market_status),
    );
    Ok(serde_json::Value::Object(relevant_data))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r#"<html><head>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"__APOLLO_STATE__":{"ROOT_QUERY":{"q":1},"SoldProperty:123":{"booliId":123,"soldPrice":{"raw":3250000}}}}},"page":"/bostad/[id]"}</script>
</head><body>
<div class="py-1 rounded w-fit bg-bui-color-black text-bui-color-white inline-flex items-center justify-center font-semibold rounded px-2 text-sm"> Slutpris &amp; klart </div>
</body></html>"#;

    #[test]
    fn test_extract_listing_refs_in_order_without_duplicates() {
        let search = r#"
            <a href="https://www.booli.se/bostad/2556516">a</a>
            <a href="https://www.booli.se/annons/4471">b</a>
            <a href="https://www.booli.se/bostad/2556516">again</a>
            <a href="https://www.booli.se/sok/slutpriser">search</a>
        "#;

        let refs = extract_listing_refs(search);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].endpoint(), "bostad/2556516");
        assert_eq!(refs[1].listing_type, ListingType::Annons);
        assert_eq!(refs[1].listing_id, "4471");
    }

    #[test]
    fn test_extract_listing_refs_empty_page() {
        assert!(extract_listing_refs("<html>Inga resultat</html>").is_empty());
    }

    #[test]
    fn test_extract_market_status() {
        assert_eq!(extract_market_status(LISTING_PAGE).unwrap(), "Slutpris & klart");
        assert!(extract_market_status("<div class=\"other\">Såld</div>").is_err());
    }

    #[test]
    fn test_extract_relevant_data() {
        let data = extract_relevant_data(LISTING_PAGE).unwrap();

        assert!(data.get("ROOT_QUERY").is_none());
        assert_eq!(data["SoldProperty:123"]["soldPrice"]["raw"], 3250000);
        assert_eq!(data["market_status"], "Slutpris & klart");
    }

    #[test]
    fn test_missing_script_is_processing_error() {
        let err = extract_relevant_data("<html><body>nothing</body></html>").unwrap_err();
        assert!(matches!(err, HousingError::ProcessingError { .. }));
    }

    #[test]
    fn test_invalid_json_is_processing_error() {
        let html = LISTING_PAGE.replace(r#"{"props""#, r#"{props"#);
        let err = extract_relevant_data(&html).unwrap_err();
        assert!(err.to_string().contains("Failed to decode JSON"));
    }

    #[test]
    fn test_missing_apollo_state_is_processing_error() {
        let html = LISTING_PAGE.replace("__APOLLO_STATE__", "somethingElse");
        let err = extract_relevant_data(&html).unwrap_err();
        assert!(err.to_string().contains("Error accessing data"));
    }
}
