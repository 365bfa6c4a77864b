//! Core data models shared by every provider adapter.
//!
//! [`SearchFilter`] is the normalized form of what a user asked for;
//! [`Listing`] is the canonical record every provider response (and the
//! fallback sample set) is reduced to before presentation.

use serde::{Deserialize, Serialize};

/// Stock photo used when a provider record carries no image.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1568605114967-8130f3a36994?ixlib=rb-4.0.3&auto=format&fit=crop&w=2070&q=80";

/// Price at or above which a maximum is treated as "no max".
///
/// Price selects offer a top bucket whose upper bound is this value; it
/// must never reach a provider as a literal constraint.
pub const UNBOUNDED_MAX_PRICE: u64 = 999_999_999;

/// Normalized search criteria.
///
/// Every field is optional. `None` means "no constraint"; `Some(0)` is a
/// real (if vacuous, for minimums) constraint and is never collapsed into
/// `None`.
///
/// Deserialization rejects unknown keys: a misspelled field must not turn
/// into an unconstrained search. `city` is accepted for `location`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SearchFilter {
    /// City or area name, matched exactly.
    #[serde(alias = "city")]
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_living_area_sqft: Option<u32>,
    pub max_days_on_market: Option<u32>,
    /// Listing status, e.g. `"Active"`.
    pub status: Option<String>,
}

impl SearchFilter {
    /// True when no field carries a constraint.
    pub fn is_unconstrained(&self) -> bool {
        *self == SearchFilter::default()
    }

    /// The maximum price, unless it is the "no max" sentinel (or above).
    pub fn bounded_max_price(&self) -> Option<u64> {
        self.max_price.filter(|p| *p < UNBOUNDED_MAX_PRICE)
    }

    /// Fill `status` from a configured default when the user left it unset.
    pub fn with_default_status(mut self, status: Option<&str>) -> Self {
        if self.status.is_none() {
            self.status = status.map(str::to_string);
        }
        self
    }
}

/// Canonical display record produced by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub price: u64,
    pub bedrooms: u32,
    /// Half baths are allowed (e.g. `4.5`).
    pub bathrooms: f64,
    #[serde(default)]
    pub living_area_sqft: Option<u32>,
    #[serde(default)]
    pub days_on_market: Option<u32>,
    pub property_type: String,
    pub status: String,
    #[serde(default = "default_image_url")]
    pub primary_image_url: String,
    /// The provider's MLS-style identifier.
    pub listing_reference: String,
    pub description: String,
    /// Which provider or path produced the record.
    pub source_label: String,
}

fn default_image_url() -> String {
    PLACEHOLDER_IMAGE_URL.to_string()
}

impl Listing {
    /// Description used when the provider supplies none.
    pub fn synthesized_description(bedrooms: u32, bathrooms: f64, city: &str, state: &str) -> String {
        format!(
            "{} bed, {} bath property in {}, {}",
            bedrooms,
            format_bathrooms(bathrooms),
            city,
            state
        )
    }
}

/// Render a bathroom count without a trailing `.0` for whole numbers.
pub fn format_bathrooms(bathrooms: f64) -> String {
    if bathrooms.fract() == 0.0 {
        format!("{}", bathrooms as u64)
    } else {
        format!("{}", bathrooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_unconstrained() {
        assert!(SearchFilter::default().is_unconstrained());
        let f = SearchFilter {
            min_bedrooms: Some(0),
            ..Default::default()
        };
        assert!(!f.is_unconstrained(), "explicit zero is a constraint");
    }

    #[test]
    fn test_bounded_max_price_drops_sentinel() {
        let mut f = SearchFilter {
            max_price: Some(UNBOUNDED_MAX_PRICE),
            ..Default::default()
        };
        assert_eq!(f.bounded_max_price(), None);
        f.max_price = Some(400_000);
        assert_eq!(f.bounded_max_price(), Some(400_000));
    }

    #[test]
    fn test_default_status_only_fills_unset() {
        let f = SearchFilter::default().with_default_status(Some("Active"));
        assert_eq!(f.status.as_deref(), Some("Active"));

        let f = SearchFilter {
            status: Some("Pending".into()),
            ..Default::default()
        }
        .with_default_status(Some("Active"));
        assert_eq!(f.status.as_deref(), Some("Pending"));
    }

    #[test]
    fn test_filter_deserializes_camel_case_with_missing_fields() {
        let f: SearchFilter =
            serde_json::from_str(r#"{"location":"Vienna","minBedrooms":3}"#).unwrap();
        assert_eq!(f.location.as_deref(), Some("Vienna"));
        assert_eq!(f.min_bedrooms, Some(3));
        assert_eq!(f.max_price, None);
    }

    #[test]
    fn test_filter_accepts_city_for_location() {
        let f: SearchFilter = serde_json::from_str(r#"{"city":"Arlington"}"#).unwrap();
        assert_eq!(f.location.as_deref(), Some("Arlington"));
        assert!(!f.is_unconstrained());
    }

    #[test]
    fn test_filter_rejects_unknown_keys() {
        let err = serde_json::from_str::<SearchFilter>(r#"{"bogus":1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `bogus`"));
        assert!(serde_json::from_str::<SearchFilter>(r#"{"min_price":5}"#).is_err());
    }

    #[test]
    fn test_synthesized_description() {
        assert_eq!(
            Listing::synthesized_description(4, 3.5, "Reston", "VA"),
            "4 bed, 3.5 bath property in Reston, VA"
        );
        assert_eq!(
            Listing::synthesized_description(5, 4.0, "Washington", "DC"),
            "5 bed, 4 bath property in Washington, DC"
        );
    }
}
