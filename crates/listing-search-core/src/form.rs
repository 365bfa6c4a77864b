//! Filter extraction from named form controls.
//!
//! The search form exposes a fixed set of select/input controls. A
//! [`FormSource`] gives read access to their raw string values;
//! [`extract_filter`] turns them into a [`SearchFilter`].
//!
//! Missing controls, blank values, and values that do not parse as numbers
//! all resolve to "unset". Nothing here fails.

use std::collections::{BTreeMap, HashMap};

use crate::models::SearchFilter;

/// Identifiers of the search form controls.
pub mod controls {
    pub const LOCATION: &str = "location-select";
    pub const PROPERTY_TYPE: &str = "property-type-select";
    pub const BEDS: &str = "beds-select";
    pub const BATHS: &str = "baths-select";
    pub const MIN_PRICE: &str = "min-price-select";
    pub const MAX_PRICE: &str = "max-price-select";
    pub const SQFT: &str = "sqft-select";
    pub const DAYS_ON_MARKET: &str = "dom-select";
    pub const STATUS: &str = "status-select";

    /// Every control the extractor reads, in form order.
    pub const ALL: [&str; 9] = [
        LOCATION,
        PROPERTY_TYPE,
        BEDS,
        BATHS,
        MIN_PRICE,
        MAX_PRICE,
        SQFT,
        DAYS_ON_MARKET,
        STATUS,
    ];
}

/// Read-only view of the current form state.
pub trait FormSource {
    /// Raw value of the named control, or `None` if the control is absent.
    fn value(&self, control: &str) -> Option<&str>;
}

impl FormSource for HashMap<String, String> {
    fn value(&self, control: &str) -> Option<&str> {
        self.get(control).map(String::as_str)
    }
}

impl FormSource for BTreeMap<String, String> {
    fn value(&self, control: &str) -> Option<&str> {
        self.get(control).map(String::as_str)
    }
}

impl<F: FormSource + ?Sized> FormSource for &F {
    fn value(&self, control: &str) -> Option<&str> {
        (**self).value(control)
    }
}

/// Build a [`SearchFilter`] from the form controls.
pub fn extract_filter<F: FormSource + ?Sized>(form: &F) -> SearchFilter {
    SearchFilter {
        location: text(form, controls::LOCATION),
        property_type: text(form, controls::PROPERTY_TYPE),
        min_bedrooms: count(form, controls::BEDS),
        min_bathrooms: count(form, controls::BATHS),
        min_price: form.value(controls::MIN_PRICE).and_then(parse_price),
        max_price: form.value(controls::MAX_PRICE).and_then(parse_price),
        min_living_area_sqft: count(form, controls::SQFT),
        max_days_on_market: count(form, controls::DAYS_ON_MARKET),
        status: text(form, controls::STATUS),
    }
}

fn text<F: FormSource + ?Sized>(form: &F, control: &str) -> Option<String> {
    form.value(control)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn count<F: FormSource + ?Sized>(form: &F, control: &str) -> Option<u32> {
    form.value(control).and_then(parse_count)
}

/// Parse a count such as `"3"` or `"3+"`.
pub fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.strip_suffix('+').unwrap_or(raw).trim().parse().ok()
}

/// Parse a price such as `"400000"`, `"$400,000"` or `"$400,000+"`.
pub fn parse_price(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim()
        .trim_end_matches('+')
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    digits.trim().parse().ok()
}
