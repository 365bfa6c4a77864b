//! Result view-models.
//!
//! The presenter turns an ordered slice of [`Listing`]s into a
//! [`ResultsView`]: either a list of [`ListingCard`]s with a count line, or
//! a distinct no-results state carrying a recovery action. Whatever renders
//! the view (terminal, JSON client, template) consumes these structures;
//! no markup is produced here.

use serde::Serialize;

use crate::models::{format_bathrooms, Listing, PLACEHOLDER_IMAGE_URL};

/// Display-ready fields of one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCard {
    pub id: String,
    pub address: String,
    /// `"City, ST 12345"`.
    pub location_line: String,
    /// `"$1,350,000"`.
    pub price_label: String,
    pub beds_label: String,
    pub baths_label: String,
    /// `"2,450 sqft"`, absent when the living area is unknown.
    pub area_label: Option<String>,
    pub property_type: String,
    pub status: String,
    pub image_url: String,
    /// Image to show if `image_url` fails to load.
    pub fallback_image_url: String,
    /// `"MLS# KW001"`.
    pub reference_label: String,
    pub description: String,
    pub source_label: String,
}

impl ListingCard {
    pub fn from_listing(listing: &Listing) -> Self {
        let mut location_line = format!("{}, {}", listing.city, listing.state);
        if !listing.postal_code.is_empty() {
            location_line.push(' ');
            location_line.push_str(&listing.postal_code);
        }

        Self {
            id: listing.id.clone(),
            address: listing.address.clone(),
            location_line,
            price_label: format_price(listing.price),
            beds_label: format!("{} Beds", listing.bedrooms),
            baths_label: format!("{} Baths", format_bathrooms(listing.bathrooms)),
            area_label: listing.living_area_sqft.map(format_sqft),
            property_type: listing.property_type.clone(),
            status: listing.status.clone(),
            image_url: listing.primary_image_url.clone(),
            fallback_image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            reference_label: format!("MLS# {}", listing.listing_reference),
            description: listing.description.clone(),
            source_label: listing.source_label.clone(),
        }
    }
}

/// Alternate paths offered when a search finds nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryAction {
    /// e.g. `"Call (571) 454-3438"`.
    pub contact_label: Option<String>,
    /// e.g. `"tel:571-454-3438"`.
    pub contact_href: Option<String>,
    pub new_search_label: String,
}

/// What the results region should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ResultsView {
    #[serde(rename_all = "camelCase")]
    Listings {
        title: String,
        count_label: String,
        cards: Vec<ListingCard>,
    },
    #[serde(rename_all = "camelCase")]
    NoResults {
        title: String,
        message: String,
        recovery: RecoveryAction,
    },
}

impl ResultsView {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResultsView::NoResults { .. })
    }

    pub fn cards(&self) -> &[ListingCard] {
        match self {
            ResultsView::Listings { cards, .. } => cards,
            ResultsView::NoResults { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A transient message for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Presentation settings shared by every search.
#[derive(Debug, Clone)]
pub struct Presenter {
    pub title: String,
    /// Phone number offered as the alternate contact path.
    pub contact_phone: Option<String>,
}

impl Default for Presenter {
    fn default() -> Self {
        Self {
            title: "Search Results".to_string(),
            contact_phone: None,
        }
    }
}

impl Presenter {
    /// Build the view for an ordered result list.
    pub fn present(&self, listings: &[Listing]) -> ResultsView {
        if listings.is_empty() {
            return ResultsView::NoResults {
                title: self.title.clone(),
                message: "No properties found matching your criteria. Try adjusting your search filters."
                    .to_string(),
                recovery: self.recovery(),
            };
        }

        ResultsView::Listings {
            title: self.title.clone(),
            count_label: count_label(listings.len()),
            cards: listings.iter().map(ListingCard::from_listing).collect(),
        }
    }

    /// Notification accompanying a view: a count on success, nothing for
    /// the no-results state (which carries its own message).
    pub fn notification_for(&self, view: &ResultsView) -> Option<Notification> {
        match view {
            ResultsView::Listings { cards, .. } => Some(Notification::success(format!(
                "Found {} properties matching your criteria.",
                cards.len()
            ))),
            ResultsView::NoResults { .. } => None,
        }
    }

    fn recovery(&self) -> RecoveryAction {
        let phone = self
            .contact_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        RecoveryAction {
            contact_label: phone.map(|p| format!("Call {}", p)),
            contact_href: phone.map(tel_href),
            new_search_label: "New Search".to_string(),
        }
    }
}

fn count_label(n: usize) -> String {
    if n == 1 {
        "Found 1 property matching your criteria".to_string()
    } else {
        format!("Found {} properties matching your criteria", n)
    }
}

/// `tel:` link keeping only digits and `+`.
fn tel_href(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{}", digits)
}

/// Group digits in threes: `1350000` → `"1,350,000"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_price(price: u64) -> String {
    format!("${}", format_thousands(price))
}

pub fn format_sqft(sqft: u32) -> String {
    format!("{} sqft", format_thousands(sqft.into()))
}
