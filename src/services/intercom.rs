// src/services/intercom.rs

//! Intercom contact reconciliation.
//!
//! Every call to the contacts API goes through a [`Dispatcher`], so however
//! many members are reconciled concurrently, Intercom sees one request at a
//! time with a fixed gap between request starts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{Config, ContactRef, Member, MultipleMatchPolicy, SearchResponse};
use crate::payload::intercom::{contact_payload, search_query};
use crate::pipeline::Dispatcher;
use crate::services::{MemberfulClient, Reconciler};
use crate::utils::http::read_json;
use crate::utils::url::join;

/// Metadata key holding the Intercom contact id on a Memberful member.
pub const INTERCOM_ID_KEY: &str = "intercomId";

/// Rate-limited client for the Intercom contacts API.
#[derive(Debug)]
pub struct IntercomClient {
    client: Client,
    api_base: String,
    access_token: String,
    dispatcher: Dispatcher,
}

impl IntercomClient {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            access_token: access_token.into(),
            dispatcher,
        }
    }

    /// Search contacts by the member's e-mail or external id.
    pub async fn search(&self, member: &Member) -> Result<SearchResponse> {
        let url = join(&self.api_base, &["contacts", "search"])?;
        let body = search_query(&member.email, &member.id);
        self.dispatcher
            .schedule(|| self.send_json(Method::POST, &url, &body))
            .await
    }

    /// Create a contact for the member.
    pub async fn create(&self, member: &Member) -> Result<ContactRef> {
        let url = join(&self.api_base, &["contacts"])?;
        let body = contact_payload(member, Utc::now().timestamp());
        self.dispatcher
            .schedule(|| self.send_json(Method::POST, &url, &body))
            .await
    }

    /// Overwrite contact `contact_id` with the member's current data.
    pub async fn update(&self, contact_id: &str, member: &Member) -> Result<()> {
        let url = join(&self.api_base, &["contacts", contact_id])?;
        let body = contact_payload(member, Utc::now().timestamp());
        self.dispatcher
            .schedule(|| self.send(Method::PUT, &url, &body))
            .await
    }

    async fn send_json<B, T>(&self, method: Method, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, url).json(body).send().await?;
        read_json(response).await
    }

    async fn send<B: Serialize + ?Sized>(&self, method: Method, url: &str, body: &B) -> Result<()> {
        self.request(method, url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

/// Reconciles members into Intercom contacts.
pub struct IntercomSync {
    contacts: IntercomClient,
    memberful: Arc<MemberfulClient>,
    multiple_matches: MultipleMatchPolicy,
}

impl IntercomSync {
    pub fn new(
        contacts: IntercomClient,
        memberful: Arc<MemberfulClient>,
        multiple_matches: MultipleMatchPolicy,
    ) -> Self {
        Self {
            contacts,
            memberful,
            multiple_matches,
        }
    }

    /// Build from configuration; `None` when no access token is configured.
    pub fn from_config(
        config: &Config,
        client: Client,
        memberful: Arc<MemberfulClient>,
    ) -> Option<Self> {
        let intercom = &config.intercom;
        let token = intercom.access_token.as_deref().filter(|_| intercom.enabled())?;
        let contacts = IntercomClient::new(
            client,
            intercom.api_base.clone(),
            token,
            Dispatcher::new(intercom.min_request_interval()),
        );
        Some(Self::new(contacts, memberful, intercom.multiple_matches))
    }

    /// Reconcile one member. Never fails; errors are logged and reported
    /// as `false`.
    pub async fn reconcile_member(&self, member: &Member) -> bool {
        if let Some(contact_id) = member.cached_id(INTERCOM_ID_KEY) {
            return self.update(&contact_id, member).await;
        }

        let found = match self.contacts.search(member).await {
            Ok(found) => found,
            Err(e) => {
                log::error!(
                    "Failed to query search results (memberful member id: {}): {}",
                    member.id,
                    e
                );
                return false;
            }
        };

        log::debug!(
            "Successfully queried search results (memberful member id: {}, total count: {})",
            member.id,
            found.total_count
        );

        match found.total_count {
            0 => self.create(member).await,
            1 => match found.data.first() {
                Some(contact) => self.adopt(&contact.id, member).await,
                None => {
                    let e = AppError::unexpected("contacts/search", "total_count 1 with no data");
                    log::error!(
                        "Failed to read search results (memberful member id: {}): {}",
                        member.id,
                        e
                    );
                    false
                }
            },
            count => match self.multiple_matches {
                MultipleMatchPolicy::Create => self.create(member).await,
                MultipleMatchPolicy::Conflict => {
                    log::warn!(
                        "Conflict: {} contacts match member (memberful member id: {}, email: {}), skipping",
                        count,
                        member.id,
                        member.email
                    );
                    false
                }
            },
        }
    }

    /// Update an existing contact found by search and remember its id.
    async fn adopt(&self, contact_id: &str, member: &Member) -> bool {
        let (updated, written) = tokio::join!(
            self.update(contact_id, member),
            self.memberful.write_back(member, INTERCOM_ID_KEY, contact_id)
        );
        updated && written
    }

    async fn create(&self, member: &Member) -> bool {
        match self.contacts.create(member).await {
            Ok(contact) => {
                log::debug!(
                    "Successfully created contact (memberful member id: {}, intercom contact id: {})",
                    contact.external_id.as_deref().unwrap_or(&member.id),
                    contact.id
                );
                self.memberful
                    .write_back(member, INTERCOM_ID_KEY, &contact.id)
                    .await
            }
            Err(e) => {
                log::error!(
                    "Failed to create contact (memberful member id: {}): {}",
                    member.id,
                    e
                );
                false
            }
        }
    }

    async fn update(&self, contact_id: &str, member: &Member) -> bool {
        match self.contacts.update(contact_id, member).await {
            Ok(()) => {
                log::debug!("Successfully updated contact (intercom contact id: {contact_id})");
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to update contact (intercom contact id: {}, memberful member id: {}): {}",
                    contact_id,
                    member.id,
                    e
                );
                false
            }
        }
    }
}

#[async_trait]
impl Reconciler for IntercomSync {
    fn system(&self) -> &'static str {
        "intercom"
    }

    async fn reconcile(&self, members: &[Member]) -> Vec<bool> {
        join_all(members.iter().map(|member| self.reconcile_member(member))).await
    }
}
