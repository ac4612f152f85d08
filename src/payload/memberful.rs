// src/payload/memberful.rs

//! GraphQL documents for the Memberful API.

use serde_json::{Map, Value, json};

/// Member fields requested for every page.
const MEMBER_FIELDS: &str = "address { city country postalCode state street } \
creditCard { brand expMonth expYear lastFourDigits } \
discordUserId \
downloads { id name } \
email fullName id metadata phoneNumber stripeCustomerId \
subscriptions { id active autorenew pastDue coupon { id code } plan { id name } } \
totalSpendCents unrestrictedAccess";

const PAGE_INFO_FIELDS: &str = "startCursor endCursor hasPreviousPage hasNextPage";

/// `members` query for the page after `after`, or the first page.
pub fn members_query(after: Option<&str>) -> String {
    let args = match after {
        Some(cursor) => format!(" (after: {})", Value::from(cursor)),
        None => String::new(),
    };
    format!(
        "query {{ members{args} {{ nodes {{ {MEMBER_FIELDS} }} pageInfo {{ {PAGE_INFO_FIELDS} }} }} }}"
    )
}

/// `memberUpdate` mutation replacing a member's metadata.
///
/// Arguments travel as variables, see [`member_update_variables`].
pub const MEMBER_UPDATE_MUTATION: &str = "mutation ($id: ID!, $metadata: Metadata) { \
memberUpdate (id: $id, metadata: $metadata) { member { id metadata } } }";

/// Variables for [`MEMBER_UPDATE_MUTATION`].
pub fn member_update_variables(id: &str, metadata: &Map<String, Value>) -> Value {
    json!({ "id": id, "metadata": metadata })
}
