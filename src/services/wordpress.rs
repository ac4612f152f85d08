// src/services/wordpress.rs

//! WordPress user reconciliation over the REST API (`/wp-json/wp/v2/users`).
//!
//! Authenticates with an application password. Follows the same lookup
//! precedence as the Intercom sync: cached id, then search by e-mail,
//! then create.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Method, RequestBuilder};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Config, Member, MultipleMatchPolicy, WpUser};
use crate::payload::wordpress::{user_create_payload, user_update_payload};
use crate::services::{MemberfulClient, Reconciler};
use crate::utils::http::read_json;
use crate::utils::url::join;

/// Metadata key holding the WordPress user id on a Memberful member.
pub const WORDPRESS_ID_KEY: &str = "wordpressId";

/// Client for the WordPress users endpoint.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    client: Client,
    site_url: String,
    username: String,
    application_password: String,
}

impl WordPressClient {
    pub fn new(
        client: Client,
        site_url: impl Into<String>,
        username: impl Into<String>,
        application_password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            site_url: site_url.into(),
            username: username.into(),
            application_password: application_password.into(),
        }
    }

    /// Users whose e-mail equals `email`, ignoring case.
    ///
    /// The `search` parameter also matches logins and display names, so
    /// results are narrowed to exact e-mail matches.
    pub async fn find_by_email(&self, email: &str) -> Result<Vec<WpUser>> {
        let url = self.users_url(&[])?;
        let response = self
            .request(Method::GET, &url)
            .query(&[("search", email), ("context", "edit")])
            .send()
            .await?;
        let users: Vec<WpUser> = read_json(response).await?;
        Ok(users
            .into_iter()
            .filter(|user| {
                user.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .collect())
    }

    /// Create a user for the member.
    pub async fn create(&self, member: &Member) -> Result<WpUser> {
        let url = self.users_url(&[])?;
        let password = Uuid::new_v4().simple().to_string();
        let response = self
            .request(Method::POST, &url)
            .json(&user_create_payload(member, password))
            .send()
            .await?;
        read_json(response).await
    }

    /// Update user `user_id` with the member's current data.
    pub async fn update(&self, user_id: &str, member: &Member) -> Result<()> {
        let url = self.users_url(&[user_id])?;
        self.request(Method::POST, &url)
            .json(&user_update_payload(member))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn users_url(&self, tail: &[&str]) -> Result<String> {
        let mut segments = vec!["wp-json", "wp", "v2", "users"];
        segments.extend_from_slice(tail);
        join(&self.site_url, &segments)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.application_password))
    }
}

/// Reconciles members into WordPress users.
pub struct WordPressSync {
    users: WordPressClient,
    memberful: Arc<MemberfulClient>,
    max_concurrent: usize,
    multiple_matches: MultipleMatchPolicy,
}

impl WordPressSync {
    pub fn new(
        users: WordPressClient,
        memberful: Arc<MemberfulClient>,
        max_concurrent: usize,
        multiple_matches: MultipleMatchPolicy,
    ) -> Self {
        Self {
            users,
            memberful,
            max_concurrent: max_concurrent.max(1),
            multiple_matches,
        }
    }

    /// Build from configuration; `None` when no application password is set.
    pub fn from_config(
        config: &Config,
        client: Client,
        memberful: Arc<MemberfulClient>,
    ) -> Result<Option<Self>> {
        let wp = &config.wordpress;
        let Some(password) = wp.application_password.as_deref().filter(|_| wp.enabled()) else {
            return Ok(None);
        };
        let url = wp
            .url
            .as_deref()
            .ok_or_else(|| AppError::config("wordpress.url is not configured"))?;
        let username = wp
            .username
            .as_deref()
            .ok_or_else(|| AppError::config("wordpress.username is not configured"))?;

        let users = WordPressClient::new(client, url, username, password);
        Ok(Some(Self::new(
            users,
            memberful,
            wp.max_concurrent,
            wp.multiple_matches,
        )))
    }

    /// Reconcile one member. Never fails; errors are logged and reported
    /// as `false`.
    pub async fn reconcile_member(&self, member: &Member) -> bool {
        if let Some(user_id) = member.cached_id(WORDPRESS_ID_KEY) {
            return self.update(&user_id, member).await;
        }

        let matches = match self.users.find_by_email(&member.email).await {
            Ok(matches) => matches,
            Err(e) => {
                log::error!(
                    "Failed to search WordPress users (memberful member id: {}): {}",
                    member.id,
                    e
                );
                return false;
            }
        };

        match matches.as_slice() {
            [] => self.create(member).await,
            [user] => {
                let user_id = user.id.to_string();
                let (updated, written) = tokio::join!(
                    self.update(&user_id, member),
                    self.memberful.write_back(member, WORDPRESS_ID_KEY, &user_id)
                );
                updated && written
            }
            many => match self.multiple_matches {
                MultipleMatchPolicy::Create => self.create(member).await,
                MultipleMatchPolicy::Conflict => {
                    log::warn!(
                        "Conflict: {} WordPress users match member (memberful member id: {}, email: {}), skipping",
                        many.len(),
                        member.id,
                        member.email
                    );
                    false
                }
            },
        }
    }

    async fn create(&self, member: &Member) -> bool {
        match self.users.create(member).await {
            Ok(user) => {
                log::debug!(
                    "Successfully created WordPress user (memberful member id: {}, wordpress user id: {})",
                    member.id,
                    user.id
                );
                self.memberful
                    .write_back(member, WORDPRESS_ID_KEY, &user.id.to_string())
                    .await
            }
            Err(e) => {
                log::error!(
                    "Failed to create WordPress user (memberful member id: {}): {}",
                    member.id,
                    e
                );
                false
            }
        }
    }

    async fn update(&self, user_id: &str, member: &Member) -> bool {
        match self.users.update(user_id, member).await {
            Ok(()) => {
                log::debug!("Successfully updated WordPress user (wordpress user id: {user_id})");
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to update WordPress user (wordpress user id: {}, memberful member id: {}): {}",
                    user_id,
                    member.id,
                    e
                );
                false
            }
        }
    }
}

#[async_trait]
impl Reconciler for WordPressSync {
    fn system(&self) -> &'static str {
        "wordpress"
    }

    async fn reconcile(&self, members: &[Member]) -> Vec<bool> {
        let futures: Vec<_> = members
            .iter()
            .map(|member| self.reconcile_member(member))
            .collect();
        stream::iter(futures)
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn setup() -> (MockServer, MockServer, WordPressSync) {
        let wordpress = MockServer::start().await;
        let memberful = MockServer::start().await;
        let sync = WordPressSync::new(
            WordPressClient::new(Client::new(), wordpress.uri(), "admin", "abcd efgh"),
            Arc::new(MemberfulClient::new(
                Client::new(),
                format!("{}/api/graphql", memberful.uri()),
                "mf-key",
            )),
            2,
            MultipleMatchPolicy::Conflict,
        );
        (wordpress, memberful, sync)
    }

    fn member() -> Member {
        Member {
            id: "42".into(),
            email: "ada@example.com".into(),
            full_name: Some("Ada Lovelace".into()),
            ..Member::default()
        }
    }

    async fn mount_write_back(memberful: &MockServer, user_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(body_string_contains("memberUpdate"))
            .and(body_string_contains(user_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "memberUpdate": { "member": { "id": "42", "metadata": {} } } }
            })))
            .expect(times)
            .mount(memberful)
            .await;
    }

    #[tokio::test]
    async fn test_cached_id_updates_directly() {
        let (wordpress, _memberful, sync) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&wordpress)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users/17"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 17 })))
            .expect(1)
            .mount(&wordpress)
            .await;

        let mut member = member();
        member.metadata.insert(WORDPRESS_ID_KEY.into(), json!("17"));
        assert!(sync.reconcile_member(&member).await);
    }

    #[tokio::test]
    async fn test_no_user_creates_and_writes_back() {
        let (wordpress, memberful, sync) = setup().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/users"))
            .and(query_param("search", "ada@example.com"))
            .and(query_param("context", "edit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 3, "email": "ada.other@example.com" }
            ])))
            .expect(1)
            .mount(&wordpress)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users"))
            .and(body_string_contains("\"username\":\"ada@example.com\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
            .expect(1)
            .mount(&wordpress)
            .await;
        mount_write_back(&memberful, "wordpressId: \\\"99\\\"", 1).await;

        assert!(sync.reconcile_member(&member()).await);
    }

    #[tokio::test]
    async fn test_single_user_is_adopted() {
        let (wordpress, memberful, sync) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 5, "email": "ADA@example.com" }
            ])))
            .expect(1)
            .mount(&wordpress)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
            .expect(1)
            .mount(&wordpress)
            .await;
        mount_write_back(&memberful, "wordpressId", 1).await;

        assert!(sync.reconcile_member(&member()).await);
    }

    #[tokio::test]
    async fn test_duplicate_users_are_a_conflict() {
        let (wordpress, _memberful, sync) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 5, "email": "ada@example.com" },
                { "id": 6, "email": "ada@example.com" }
            ])))
            .mount(&wordpress)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
            .expect(0)
            .mount(&wordpress)
            .await;

        assert!(!sync.reconcile_member(&member()).await);
    }

    #[tokio::test]
    async fn test_reconcile_preserves_member_order() {
        let (wordpress, _memberful, sync) = setup().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .mount(&wordpress)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users/2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&wordpress)
            .await;

        let members: Vec<Member> = ["1", "2", "1"]
            .iter()
            .map(|id| {
                let mut m = member();
                m.metadata.insert(WORDPRESS_ID_KEY.into(), json!(id));
                m
            })
            .collect();

        assert_eq!(sync.reconcile(&members).await, vec![true, false, true]);
    }
}
