//! Local fallback filtering over an in-memory sample set.
//!
//! When a provider cannot be reached (or rejects the request), the adapter
//! answers from a small [`SampleSet`] instead. Samples are authored directly
//! in the canonical [`Listing`] shape, so no normalization step is involved,
//! and filtering cannot fail.
//!
//! Constraints combine with AND semantics. A listing whose optional measure
//! (living area, days on market) is unknown is not excluded by a constraint
//! on that measure.

use anyhow::{Context, Result};

use crate::models::{Listing, SearchFilter, PLACEHOLDER_IMAGE_URL};

/// Label carried by the built-in samples.
pub const SAMPLE_SOURCE_LABEL: &str = "Featured Listings (Sample)";

/// A fixed set of canonical listings used when the remote path fails.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    listings: Vec<Listing>,
}

impl SampleSet {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Parse a JSON array of canonical listings (camelCase keys).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let listings: Vec<Listing> =
            serde_json::from_str(json).context("Failed to parse sample listings")?;
        Ok(Self { listings })
    }

    /// Replace every sample's `source_label`.
    pub fn with_source_label(mut self, label: &str) -> Self {
        for l in &mut self.listings {
            l.source_label = label.to_string();
        }
        self
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings satisfying every set constraint, in sample order.
    pub fn filter(&self, filter: &SearchFilter) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|l| matches(filter, l))
            .cloned()
            .collect()
    }

    /// The featured properties shown on the agent's home page.
    pub fn builtin() -> Self {
        let sample = |id: &str,
                      address: &str,
                      city: &str,
                      state: &str,
                      postal_code: &str,
                      price: u64,
                      bedrooms: u32,
                      bathrooms: f64,
                      sqft: u32,
                      days: u32,
                      image: &str,
                      description: &str| Listing {
            id: id.to_string(),
            address: address.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: postal_code.to_string(),
            price,
            bedrooms,
            bathrooms,
            living_area_sqft: Some(sqft),
            days_on_market: Some(days),
            property_type: "Single Family".to_string(),
            status: "Active".to_string(),
            primary_image_url: image.to_string(),
            listing_reference: id.to_string(),
            description: description.to_string(),
            source_label: SAMPLE_SOURCE_LABEL.to_string(),
        };

        Self::new(vec![
            sample(
                "KW001",
                "822 Gallatin St NW",
                "Washington",
                "DC",
                "20011",
                1_350_000,
                5,
                4.0,
                2450,
                10,
                "https://images.unsplash.com/photo-1570129477492-45c003edd2be?ixlib=rb-4.0.3&auto=format&fit=crop&w=2070&q=80",
                "Stunning 5-bedroom home in a desirable Washington DC location with modern amenities and excellent connectivity.",
            ),
            sample(
                "KW002",
                "2307 Waterside Dr",
                "Bumpass",
                "VA",
                "23024",
                1_249_000,
                5,
                4.0,
                2890,
                17,
                "https://images.unsplash.com/photo-1600607687939-ce8a6c25118c?ixlib=rb-4.0.3&auto=format&fit=crop&w=2070&q=80",
                "Luxurious waterfront home with 5 bedrooms and 4 baths, offering serene water views and premium finishes.",
            ),
            sample(
                "KW003",
                "407 16th St SE",
                "Washington",
                "DC",
                "20003",
                950_000,
                4,
                3.5,
                2180,
                24,
                "https://images.unsplash.com/photo-1600585154340-be6161a56a0c?ixlib=rb-4.0.3&auto=format&fit=crop&w=2070&q=80",
                "Beautiful 4-bedroom home in the historic Capitol Hill neighborhood with classic architecture and modern updates.",
            ),
            sample(
                "KW004",
                "187 Verbena Dr",
                "Stafford",
                "VA",
                "22554",
                935_001,
                5,
                4.5,
                3200,
                31,
                PLACEHOLDER_IMAGE_URL,
                "Spacious 5-bedroom family home in Stafford with 4.5 baths, perfect for growing families seeking comfort and space.",
            ),
        ])
    }
}

/// True when `listing` satisfies every constraint set in `filter`.
pub fn matches(filter: &SearchFilter, listing: &Listing) -> bool {
    if let Some(loc) = &filter.location {
        if listing.city != *loc {
            return false;
        }
    }
    if let Some(pt) = &filter.property_type {
        if listing.property_type != *pt {
            return false;
        }
    }
    if let Some(status) = &filter.status {
        if listing.status != *status {
            return false;
        }
    }
    if filter.min_bedrooms.is_some_and(|n| listing.bedrooms < n) {
        return false;
    }
    if filter
        .min_bathrooms
        .is_some_and(|n| listing.bathrooms < f64::from(n))
    {
        return false;
    }
    if filter.min_price.is_some_and(|p| listing.price < p) {
        return false;
    }
    if filter.bounded_max_price().is_some_and(|p| listing.price > p) {
        return false;
    }
    if let (Some(min), Some(area)) = (filter.min_living_area_sqft, listing.living_area_sqft) {
        if area < min {
            return false;
        }
    }
    if let (Some(max), Some(days)) = (filter.max_days_on_market, listing.days_on_market) {
        if days > max {
            return false;
        }
    }
    true
}
