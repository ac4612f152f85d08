// src/services/memberful.rs

//! Memberful GraphQL client.
//!
//! Reads the member list with cursor pagination and writes downstream
//! identifiers back into member metadata.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, Member, MemberPage};
use crate::payload::memberful::{MEMBER_UPDATE_MUTATION, member_update_variables, members_query};
use crate::utils::http::read_json;

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MembersData {
    members: MemberPage,
}

/// Downstream ids written for one member, guarded so write-backs take turns.
type WrittenIds = Arc<Mutex<Map<String, Value>>>;

/// Client for the Memberful GraphQL API.
#[derive(Debug)]
pub struct MemberfulClient {
    client: Client,
    endpoint: String,
    api_key: String,
    /// Keyed by member id.
    written: Mutex<HashMap<String, WrittenIds>>,
}

impl MemberfulClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            written: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        Ok(Self::new(
            client,
            config.memberful_endpoint()?,
            config.memberful_api_key()?,
        ))
    }

    /// Fetch every member, one page at a time.
    ///
    /// Fails soft: a failed page ends pagination and whatever was collected
    /// so far is returned.
    pub async fn fetch_all_members(&self) -> Vec<Member> {
        let mut members = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = match self.fetch_page(after.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    log::error!(
                        "Failed to fetch members (fetched members: {}, after this cursor: {}): {}",
                        members.len(),
                        after.as_deref().unwrap_or("none"),
                        e
                    );
                    break;
                }
            };

            members.extend(page.nodes);
            let info = page.page_info;
            log::debug!(
                "Successfully fetched members (fetched members: {}, start cursor: {:?}, end cursor: {:?}, has previous page: {}, has next page: {})",
                members.len(),
                info.start_cursor,
                info.end_cursor,
                info.has_previous_page,
                info.has_next_page
            );

            match info.next_cursor() {
                Some(cursor) => after = Some(cursor.to_string()),
                None => break,
            }
        }

        members
    }

    /// Fetch one page of members after `after`, or the first page.
    pub async fn fetch_page(&self, after: Option<&str>) -> Result<MemberPage> {
        let data: MembersData = self
            .execute("members", members_query(after), None)
            .await?;
        Ok(data.members)
    }

    /// Replace a member's metadata.
    pub async fn update_member_metadata(
        &self,
        member_id: &str,
        metadata: &Map<String, Value>,
    ) -> Result<()> {
        let _: Value = self
            .execute(
                "memberUpdate",
                MEMBER_UPDATE_MUTATION.to_string(),
                Some(member_update_variables(member_id, metadata)),
            )
            .await?;
        Ok(())
    }

    /// Store a downstream identifier in the member's metadata under `key`.
    ///
    /// The mutation replaces metadata wholesale. Write-backs for the same
    /// member run one at a time, each carrying every id already written for
    /// that member on top of the fetched metadata.
    /// Logs the outcome and reports success as a boolean.
    pub async fn write_back(&self, member: &Member, key: &str, id: &str) -> bool {
        let ids = {
            let mut written = self.written.lock().await;
            Arc::clone(written.entry(member.id.clone()).or_default())
        };
        let mut ids = ids.lock().await;

        let mut metadata = member.metadata_with(key, id);
        for (written_key, written_id) in ids.iter() {
            if written_key != key {
                metadata.insert(written_key.clone(), written_id.clone());
            }
        }

        match self.update_member_metadata(&member.id, &metadata).await {
            Ok(()) => {
                ids.insert(key.to_string(), Value::String(id.to_string()));
                log::debug!(
                    "Successfully updated Memberful member metadata (member id: {}, {}: {})",
                    member.id,
                    key,
                    id
                );
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to update Memberful member metadata (member id: {}, member metadata: {}): {}",
                    member.id,
                    Value::Object(metadata),
                    e
                );
                false
            }
        }
    }

    /// Send a GraphQL document and unwrap its `data`.
    ///
    /// A response carrying `errors` is a failure even on HTTP 2xx.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        document: String,
        variables: Option<Value>,
    ) -> Result<T> {
        let mut body = json!({ "query": document });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let body: GraphQlResponse<T> = read_json(response).await?;
        if let Some(errors) = body.errors {
            return Err(AppError::graphql(operation, errors));
        }
        body.data
            .ok_or_else(|| AppError::unexpected(operation, "response has no data"))
    }
}
