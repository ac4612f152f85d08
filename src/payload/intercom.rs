// src/payload/intercom.rs

//! Intercom request bodies built from Memberful members.

use crate::models::{ContactPayload, CustomAttributes, Member, QueryNode, SearchRequest};
use crate::payload::format;
use crate::utils::gravatar_url;

/// Contact create/update body for a member, stamped with `last_updated`
/// (Unix seconds).
pub fn contact_payload(member: &Member, last_updated: i64) -> ContactPayload {
    ContactPayload {
        role: "user".to_string(),
        external_id: member.id.clone(),
        email: member.email.clone(),
        phone: member.phone_number.clone(),
        name: member.full_name.clone(),
        avatar: gravatar_url(&member.email),
        custom_attributes: CustomAttributes {
            credit_card: format::credit_card(member.credit_card.as_ref()),
            discord_user_id: member.discord_user_id.clone(),
            downloads: format::downloads(&member.downloads),
            last_updated,
            postal_code: member.postal_code().map(String::from),
            stripe_customer_id: member.stripe_customer_id.clone(),
            subscriptions: format::subscriptions(&member.subscriptions),
            total_spend: member.total_spend_cents.map(format::total_spend),
            unrestricted_access: member.unrestricted_access,
        },
    }
}

/// Search for users matching either the e-mail or the external id.
///
/// Either identifier may already exist on a contact on its own, hence an OR
/// of two ANDs rather than a single conjunction.
pub fn search_query(email: &str, member_id: &str) -> SearchRequest {
    SearchRequest {
        query: QueryNode::or(vec![
            QueryNode::and(vec![
                QueryNode::field_eq("role", "user"),
                QueryNode::field_eq("email", email),
            ]),
            QueryNode::and(vec![
                QueryNode::field_eq("role", "user"),
                QueryNode::field_eq("external_id", member_id),
            ]),
        ]),
    }
}
