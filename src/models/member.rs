// src/models/member.rs

//! Memberful member records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A member as returned by the Memberful `members` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub address: Option<Address>,

    #[serde(default)]
    pub credit_card: Option<CreditCard>,

    #[serde(default)]
    pub discord_user_id: Option<String>,

    #[serde(default)]
    pub stripe_customer_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub downloads: Vec<Download>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subscriptions: Vec<Subscription>,

    #[serde(default)]
    pub total_spend_cents: Option<i64>,

    /// Free-form metadata; holds downstream identifiers once known
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub unrestricted_access: Option<bool>,
}

impl Member {
    /// Downstream identifier cached in metadata under `key`, if any.
    ///
    /// Numeric ids are accepted and rendered as strings; empty strings
    /// count as absent.
    pub fn cached_id(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Metadata with `key` set to `id`, keeping every other entry.
    pub fn metadata_with(&self, key: &str, id: &str) -> Map<String, Value> {
        let mut metadata = self.metadata.clone();
        metadata.insert(key.to_string(), Value::String(id.to_string()));
        metadata
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.address.as_ref()?.postal_code.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub exp_month: Option<u32>,
    #[serde(default)]
    pub exp_year: Option<u32>,
    #[serde(default)]
    pub last_four_digits: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Download {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A member's subscription. Every flag may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub autorenew: Option<bool>,
    #[serde(default)]
    pub past_due: Option<bool>,
    #[serde(default)]
    pub coupon: Option<Coupon>,
    #[serde(default)]
    pub plan: Option<Plan>,
}

impl Subscription {
    pub fn plan_name(&self) -> Option<&str> {
        self.plan.as_ref()?.name.as_deref()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon.as_ref()?.code.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Cursor information for one page of the `members` connection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
}

impl PageInfo {
    /// Cursor for the following page, if pagination should continue.
    pub fn next_cursor(&self) -> Option<&str> {
        if !self.has_next_page {
            return None;
        }
        self.end_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// One page of members.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Member>,
    #[serde(default)]
    pub page_info: PageInfo,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
