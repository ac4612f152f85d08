// src/payload/format.rs

//! Human-readable summaries of member fields for downstream attributes.

use crate::models::{CreditCard, Download, Subscription};

/// Summarize a credit card as its last four digits plus known details.
///
/// Returns `None` when the last four digits are missing, whatever else the
/// card carries.
pub fn credit_card(card: Option<&CreditCard>) -> Option<String> {
    let card = card?;
    let last_four = card.last_four_digits.as_deref().filter(|d| !d.is_empty())?;

    let mut properties = Vec::new();
    if let (Some(month), Some(year)) = (card.exp_month, card.exp_year) {
        properties.push(format!("expiration: {month}/{year}"));
    }
    if let Some(brand) = card.brand.as_deref().filter(|b| !b.is_empty()) {
        properties.push(format!("brand: {brand}"));
    }

    Some(with_properties(last_four, &properties))
}

/// Comma-joined download names, or `None` when there are none.
pub fn downloads(downloads: &[Download]) -> Option<String> {
    if downloads.is_empty() {
        return None;
    }
    let names: Vec<&str> = downloads
        .iter()
        .map(|d| d.name.as_deref().unwrap_or("Unknown"))
        .collect();
    Some(names.join(", "))
}

/// Comma-joined subscription summaries, or `None` when there are none.
pub fn subscriptions(subscriptions: &[Subscription]) -> Option<String> {
    if subscriptions.is_empty() {
        return None;
    }
    let summaries: Vec<String> = subscriptions.iter().map(subscription).collect();
    Some(summaries.join(", "))
}

/// `"{plan} (active: yes, auto renew: on, past due: no, coupon: CODE)"`,
/// keeping only the clauses whose field is present.
pub fn subscription(subscription: &Subscription) -> String {
    let mut properties = Vec::new();
    if let Some(active) = subscription.active {
        properties.push(format!("active: {}", yes_no(active)));
    }
    if let Some(autorenew) = subscription.autorenew {
        properties.push(format!(
            "auto renew: {}",
            if autorenew { "on" } else { "off" }
        ));
    }
    if let Some(past_due) = subscription.past_due {
        properties.push(format!("past due: {}", yes_no(past_due)));
    }
    if let Some(code) = subscription.coupon_code() {
        properties.push(format!("coupon: {code}"));
    }

    with_properties(subscription.plan_name().unwrap_or("Unknown"), &properties)
}

/// Convert integer cents to currency units.
pub fn total_spend(cents: i64) -> f64 {
    if cents == 0 {
        return 0.0;
    }
    cents as f64 / 100.0
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn with_properties(head: &str, properties: &[String]) -> String {
    if properties.is_empty() {
        head.to_string()
    } else {
        format!("{head} ({})", properties.join(", "))
    }
}
