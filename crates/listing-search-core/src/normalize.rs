//! Provider response normalization.
//!
//! A [`ResponseMapper`] locates the record list in a provider's JSON
//! response and maps each record to the canonical [`Listing`].
//!
//! Field precedence is always: provider value → computed default
//! (synthesized description, derived reference) → fixed placeholder
//! (stock image). Missing optional fields never fail a record; a record is
//! skipped only when its identifying field is absent, it is not an object,
//! or its id repeats one already seen in the same response.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{Listing, PLACEHOLDER_IMAGE_URL};

/// Result of normalizing one response.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub listings: Vec<Listing>,
    /// Records dropped for lacking an id, being malformed, or repeating an id.
    pub skipped: usize,
}

/// Maps one provider's response shape onto [`Listing`].
pub trait ResponseMapper: Send + Sync {
    /// Key of the record array in the response object.
    fn records_key(&self) -> &str;

    /// Map one record; `None` when it has no usable id.
    fn map_record(&self, record: &Value, source_label: &str) -> Option<Listing>;

    /// Map a whole response body.
    ///
    /// Accepts either `{ "<records_key>": [...] }` or a bare array. Any other
    /// shape yields zero listings.
    fn map_response(&self, body: &Value, source_label: &str) -> Normalized {
        let records = body
            .get(self.records_key())
            .and_then(Value::as_array)
            .or_else(|| body.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut seen = HashSet::new();
        let mut out = Normalized::default();
        for record in records {
            match self.map_record(record, source_label) {
                Some(listing) if seen.insert(listing.id.clone()) => out.listings.push(listing),
                _ => out.skipped += 1,
            }
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lenient field helpers
// ═══════════════════════════════════════════════════════════════════════

/// Accept a JSON number or a numeric string; anything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

/// Accept a string or a number as an identifier.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn whole<T: TryFrom<u64>>(n: Option<f64>) -> Option<T> {
    n.filter(|v| v.is_finite() && *v >= 0.0)
        .and_then(|v| T::try_from(v.round() as u64).ok())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════
// RESO (Bridge, MLS Grid)
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ResoRecord {
    #[serde(deserialize_with = "lenient_id")]
    listing_id: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    listing_key_numeric: Option<String>,
    unparsed_address: Option<String>,
    city: Option<String>,
    state_or_province: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    postal_code: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    list_price: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    bedrooms_total: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    bathrooms_total_integer: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    living_area: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    days_on_market: Option<f64>,
    property_type: Option<String>,
    standard_status: Option<String>,
    public_remarks: Option<String>,
    media: Option<Vec<ResoMedia>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResoMedia {
    #[serde(rename = "MediaURL")]
    media_url: Option<String>,
}

/// Maps RESO Data Dictionary records found under `value`.
#[derive(Debug, Clone, Default)]
pub struct ResoMapper;

impl ResponseMapper for ResoMapper {
    fn records_key(&self) -> &str {
        "value"
    }

    fn map_record(&self, record: &Value, source_label: &str) -> Option<Listing> {
        if !record.is_object() {
            return None;
        }
        let r: ResoRecord = serde_json::from_value(record.clone()).ok()?;
        let id = r.listing_id.clone().or_else(|| r.listing_key_numeric.clone())?;
        let reference = r.listing_key_numeric.or(r.listing_id).unwrap_or_else(|| id.clone());

        let city = r.city.unwrap_or_default();
        let state = r.state_or_province.unwrap_or_default();
        let bedrooms = whole(r.bedrooms_total).unwrap_or(0);
        let bathrooms = r.bathrooms_total_integer.filter(|b| *b >= 0.0).unwrap_or(0.0);
        let description = non_empty(r.public_remarks).unwrap_or_else(|| {
            Listing::synthesized_description(bedrooms, bathrooms, &city, &state)
        });
        let image = r
            .media
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|m| non_empty(m.media_url))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());

        Some(Listing {
            id,
            address: r.unparsed_address.unwrap_or_default(),
            city,
            state,
            postal_code: r.postal_code.unwrap_or_default(),
            price: whole(r.list_price).unwrap_or(0),
            bedrooms,
            bathrooms,
            living_area_sqft: whole(r.living_area),
            days_on_market: whole(r.days_on_market),
            property_type: r.property_type.unwrap_or_default(),
            status: r.standard_status.unwrap_or_default(),
            primary_image_url: image,
            listing_reference: reference,
            description,
            source_label: source_label.to_string(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RentSpree
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RentSpreeRecord {
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    address: Option<RentSpreeAddress>,
    #[serde(deserialize_with = "lenient_number")]
    rent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    price: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    bedrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    bathrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    square_feet: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    days_on_market: Option<f64>,
    property_type: Option<String>,
    status: Option<String>,
    photos: Option<Vec<RentSpreePhoto>>,
    #[serde(deserialize_with = "lenient_id")]
    mls_number: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RentSpreeAddress {
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    zip_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RentSpreePhoto {
    url: Option<String>,
}

/// Maps RentSpree records found under `listings`.
#[derive(Debug, Clone, Default)]
pub struct RentSpreeMapper;

impl ResponseMapper for RentSpreeMapper {
    fn records_key(&self) -> &str {
        "listings"
    }

    fn map_record(&self, record: &Value, source_label: &str) -> Option<Listing> {
        if !record.is_object() {
            return None;
        }
        let r: RentSpreeRecord = serde_json::from_value(record.clone()).ok()?;
        let id = r.id?;
        let address = r.address.unwrap_or_default();

        let city = address.city.unwrap_or_default();
        let state = address.state.unwrap_or_default();
        let bedrooms = whole(r.bedrooms).unwrap_or(0);
        let bathrooms = r.bathrooms.filter(|b| *b >= 0.0).unwrap_or(0.0);
        let description = non_empty(r.description).unwrap_or_else(|| {
            Listing::synthesized_description(bedrooms, bathrooms, &city, &state)
        });
        let image = r
            .photos
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|p| non_empty(p.url))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());

        Some(Listing {
            listing_reference: r.mls_number.unwrap_or_else(|| format!("RS{}", id)),
            id,
            address: address.street.unwrap_or_default(),
            city,
            state,
            postal_code: address.zip_code.unwrap_or_default(),
            price: whole(r.rent.or(r.price)).unwrap_or(0),
            bedrooms,
            bathrooms,
            living_area_sqft: whole(r.square_feet),
            days_on_market: whole(r.days_on_market),
            property_type: r.property_type.unwrap_or_default(),
            status: r.status.unwrap_or_default(),
            primary_image_url: image,
            description,
            source_label: source_label.to_string(),
        })
    }
}
