//! Renders an alert email for one saved search and its matching listings.

use std::fmt::Write as _;

use homealert_core::{PropertyRecord, SavedSearch, SearchCriteria};
use rust_decimal::Decimal;

use crate::mailer::{AlertEmail, Recipient};

/// Builds the subject, plain-text and HTML bodies for an alert.
///
/// `frontend_base_url` must not end with `/`; config loading trims it.
#[must_use]
pub fn render_alert(
    search: &SavedSearch,
    properties: &[PropertyRecord],
    frontend_base_url: &str,
) -> AlertEmail {
    AlertEmail {
        to: Recipient {
            email: search.owner.email.clone(),
            name: search.owner.name.clone(),
        },
        subject: format!("New Properties Match Your Search: {}", search.name),
        text_body: render_text(search, properties, frontend_base_url),
        html_body: render_html(search, properties, frontend_base_url),
        property_count: properties.len(),
    }
}

fn render_text(search: &SavedSearch, properties: &[PropertyRecord], base: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "New Properties Match Your Search: {}", search.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Hello {},", search.owner.name);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "We found {} new {} that match your saved search.",
        properties.len(),
        plural(properties.len())
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Matching Properties:");
    for property in properties {
        let _ = writeln!(out);
        let _ = writeln!(out, "- {}", property.title);
        let _ = writeln!(out, "- {}", format_price(property.price));
        let _ = writeln!(out, "- {}", property.property_type);
        let _ = writeln!(out, "- {}", property.display_location());
        let _ = writeln!(out, "- View: {base}/listings/{}", property.public_id);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "View all properties: {base}/listings");
    let _ = writeln!(out, "Manage your searches: {base}/dashboard");
    out
}

fn render_html(search: &SavedSearch, properties: &[PropertyRecord], base: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Property Alert</title></head>\n<body>\n");
    let _ = writeln!(out, "<h1>New Properties Match Your Search!</h1>");
    let _ = writeln!(out, "<p>Hello {},</p>", escape_html(&search.owner.name));
    let _ = writeln!(
        out,
        "<p>We found <strong>{}</strong> new {} that match your saved search: <strong>\"{}\"</strong></p>",
        properties.len(),
        plural(properties.len()),
        escape_html(&search.name)
    );

    let criteria_lines = describe_criteria(&search.criteria);
    if !criteria_lines.is_empty() {
        out.push_str("<h2>Your Search Criteria:</h2>\n<ul>\n");
        for line in criteria_lines {
            let _ = writeln!(out, "<li>{}</li>", escape_html(&line));
        }
        out.push_str("</ul>\n");
    }

    out.push_str("<h2>New Matching Properties:</h2>\n");
    for property in properties {
        out.push_str("<div class=\"property\">\n");
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&property.title));
        let _ = writeln!(out, "<p class=\"price\">{}</p>", format_price(property.price));
        let _ = writeln!(
            out,
            "<p><strong>Type:</strong> {}</p>",
            escape_html(&property.property_type)
        );
        let _ = writeln!(
            out,
            "<p><strong>Location:</strong> {}</p>",
            escape_html(&property.display_location())
        );
        if property.bedrooms > 0 {
            let _ = writeln!(out, "<p><strong>Bedrooms:</strong> {}</p>", property.bedrooms);
        }
        if property.bathrooms > 0 {
            let _ = writeln!(out, "<p><strong>Bathrooms:</strong> {}</p>", property.bathrooms);
        }
        let _ = writeln!(out, "<p>{}</p>", escape_html(&property.description));
        let _ = writeln!(
            out,
            "<a href=\"{base}/listings/{}\">View Property</a>",
            property.public_id
        );
        out.push_str("</div>\n");
    }

    let _ = writeln!(out, "<p><a href=\"{base}/listings\">View All Properties</a></p>");
    let _ = writeln!(
        out,
        "<p>This alert was sent because you have an active saved search. You can manage your saved searches or turn alerts off in your <a href=\"{base}/dashboard\">dashboard</a>.</p>"
    );
    out.push_str("</body>\n</html>\n");
    out
}

fn describe_criteria(criteria: &SearchCriteria) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(county) = criteria.county.as_deref().filter(|c| !c.is_empty()) {
        let place: Vec<&str> = [Some(county), criteria.constituency.as_deref(), criteria.ward.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        lines.push(format!("Location: {}", place.join(", ")));
    }
    if !criteria.property_types.is_empty() {
        let tags: Vec<&str> = criteria.property_types.iter().map(|t| t.as_str()).collect();
        lines.push(format!("Property Types: {}", tags.join(", ")));
    }
    let min_price = criteria.min_price.filter(|p| !p.is_zero());
    let max_price = criteria.max_price.filter(|p| !p.is_zero());
    if min_price.is_some() || max_price.is_some() {
        let bound = |p: Option<Decimal>| p.map_or_else(|| "Any".to_string(), format_price);
        lines.push(format!("Price Range: {} - {}", bound(min_price), bound(max_price)));
    }
    if let Some(min) = criteria.min_bedrooms.filter(|n| *n != 0) {
        lines.push(format!("Min Bedrooms: {min}"));
    }
    if let Some(min) = criteria.min_bathrooms.filter(|n| *n != 0) {
        lines.push(format!("Min Bathrooms: {min}"));
    }
    if let Some(term) = criteria.search_term.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Search Term: \"{term}\""));
    }
    lines
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "property"
    } else {
        "properties"
    }
}

/// `KSh 1,250,000` style; fractional shillings are kept to two places.
fn format_price(price: Decimal) -> String {
    let rendered = price.round_dp(2).normalize().to_string();
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("KSh {sign}{grouped}.{fraction}"),
        None => format!("KSh {sign}{grouped}"),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
