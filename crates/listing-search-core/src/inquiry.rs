//! Follow-up "request info" action.
//!
//! Selecting a listing pre-fills the contact form with a templated message
//! that names the property and its MLS reference.

use serde::Serialize;

use crate::models::Listing;

/// Text to drop into the contact form's message field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPrefill {
    pub listing_id: String,
    pub message: String,
}

impl ContactPrefill {
    pub fn for_listing(listing: &Listing) -> Self {
        Self {
            listing_id: listing.id.clone(),
            message: inquiry_message(listing),
        }
    }
}

/// `"I'm interested in 12 Maple Ave, Vienna, VA (MLS# 998877). ..."`
pub fn inquiry_message(listing: &Listing) -> String {
    let place: Vec<&str> = [
        listing.address.as_str(),
        listing.city.as_str(),
        listing.state.as_str(),
    ]
    .into_iter()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect();

    format!(
        "I'm interested in {} (MLS# {}). Please send me more details about this property.",
        place.join(", "),
        listing.listing_reference
    )
}
