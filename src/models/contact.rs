// src/models/contact.rs

//! Downstream record shapes: Intercom contacts and WordPress users.

use serde::{Deserialize, Serialize};

/// Body of an Intercom contact create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPayload {
    pub role: String,
    pub external_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub avatar: String,
    pub custom_attributes: CustomAttributes,
}

/// Intercom custom attributes derived from a member.
///
/// Absent values serialize as `null` so stale attributes are cleared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomAttributes {
    pub credit_card: Option<String>,
    pub discord_user_id: Option<String>,
    pub downloads: Option<String>,
    pub last_updated: i64,
    pub postal_code: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscriptions: Option<String>,
    pub total_spend: Option<f64>,
    pub unrestricted_access: Option<bool>,
}

/// Boolean operator of a search query group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// A node of an Intercom structured search query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryNode {
    Group {
        operator: Operator,
        value: Vec<QueryNode>,
    },
    Field {
        field: String,
        operator: String,
        value: String,
    },
}

impl QueryNode {
    /// `field = value` comparison.
    pub fn field_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        QueryNode::Field {
            field: field.into(),
            operator: "=".to_string(),
            value: value.into(),
        }
    }

    pub fn and(value: Vec<QueryNode>) -> Self {
        QueryNode::Group {
            operator: Operator::And,
            value,
        }
    }

    pub fn or(value: Vec<QueryNode>) -> Self {
        QueryNode::Group {
            operator: Operator::Or,
            value,
        }
    }
}

/// Body of `POST /contacts/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: QueryNode,
}

/// Minimal contact reference returned by Intercom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContactRef {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Response of `POST /contacts/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub data: Vec<ContactRef>,
}

/// A WordPress user as returned with `context=edit`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WpUser {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a WordPress user create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WpUserPayload {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
