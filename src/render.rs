//! Plain-text rendering of a [`ResultsView`] for the terminal.

use std::fmt::Write;

use listing_search_core::present::{ListingCard, ResultsView};

pub fn render_text(view: &ResultsView) -> String {
    let mut out = String::new();
    match view {
        ResultsView::Listings {
            title,
            count_label,
            cards,
        } => {
            let _ = writeln!(out, "{}", title);
            let _ = writeln!(out, "{}", count_label);
            for card in cards {
                out.push('\n');
                render_card(&mut out, card);
            }
        }
        ResultsView::NoResults {
            title,
            message,
            recovery,
        } => {
            let _ = writeln!(out, "{}", title);
            let _ = writeln!(out, "{}", message);
            if let (Some(label), Some(href)) = (&recovery.contact_label, &recovery.contact_href) {
                let _ = writeln!(out, "  {} ({})", label, href);
            }
            let _ = writeln!(out, "  {}", recovery.new_search_label);
        }
    }
    out
}

fn render_card(out: &mut String, card: &ListingCard) {
    let _ = writeln!(out, "{}", card.address);
    let _ = writeln!(out, "  {}", card.location_line);

    let mut facts = vec![
        card.price_label.clone(),
        card.beds_label.clone(),
        card.baths_label.clone(),
    ];
    if let Some(area) = &card.area_label {
        facts.push(area.clone());
    }
    let _ = writeln!(out, "  {}", facts.join(" | "));

    let _ = writeln!(
        out,
        "  {} · {} · {}",
        card.property_type, card.status, card.reference_label
    );
    if !card.description.is_empty() {
        let _ = writeln!(out, "  {}", card.description);
    }
    let _ = writeln!(out, "  id: {}  source: {}", card.id, card.source_label);
}
