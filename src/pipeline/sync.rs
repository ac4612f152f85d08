// src/pipeline/sync.rs

//! One sync cycle: fetch every member, fan out to each downstream system,
//! tally the outcomes.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::Result;
use crate::models::{Config, SyncCycleResult, SyncTally};
use crate::services::{IntercomSync, MemberfulClient, Reconciler, WordPressSync};
use crate::utils::http;

/// Runs sync cycles against the configured downstream systems.
pub struct SyncService {
    memberful: Arc<MemberfulClient>,
    reconcilers: Vec<Arc<dyn Reconciler>>,
}

impl SyncService {
    pub fn new(memberful: Arc<MemberfulClient>, reconcilers: Vec<Arc<dyn Reconciler>>) -> Self {
        Self {
            memberful,
            reconcilers,
        }
    }

    /// Wire up clients for every downstream system enabled in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::create_client(&config.http)?;
        let memberful = Arc::new(MemberfulClient::from_config(config, client.clone())?);

        let mut reconcilers: Vec<Arc<dyn Reconciler>> = Vec::new();
        if let Some(intercom) = IntercomSync::from_config(config, client.clone(), Arc::clone(&memberful))
        {
            reconcilers.push(Arc::new(intercom));
        }
        if let Some(wordpress) = WordPressSync::from_config(config, client, Arc::clone(&memberful))? {
            reconcilers.push(Arc::new(wordpress));
        }

        if reconcilers.is_empty() {
            log::warn!("No downstream system is configured; cycles will only fetch members");
        } else {
            let systems: Vec<&str> = reconcilers.iter().map(|r| r.system()).collect();
            log::info!("Syncing members into: {}", systems.join(", "));
        }

        Ok(Self::new(memberful, reconcilers))
    }

    /// Run one full cycle. Failures are logged and counted, never raised.
    pub async fn run_cycle(&self) -> SyncCycleResult {
        log::info!("Sync started");

        let members = self.memberful.fetch_all_members().await;
        log::debug!("Successfully fetched all members (fetched members: {})", members.len());

        let jobs = self.reconcilers.iter().map(|reconciler| {
            let members = &members;
            async move {
                let outcomes = reconciler.reconcile(members).await;
                SyncTally::from_outcomes(reconciler.system(), &outcomes)
            }
        });

        let result = SyncCycleResult {
            members_fetched: members.len(),
            systems: join_all(jobs).await,
        };

        for tally in &result.systems {
            log::debug!(
                "{} sync finished (total: {}, succeeded: {}, failed: {})",
                tally.system,
                tally.total,
                tally.succeeded,
                tally.failed
            );
        }
        log::info!(
            "Sync completed (total jobs: {}, succeeded jobs: {}, failed jobs: {})",
            result.total(),
            result.succeeded(),
            result.failed()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::{Member, MultipleMatchPolicy};
    use crate::pipeline::Dispatcher;
    use crate::services::{IntercomClient, WordPressClient};

    /// Fails every member whose id is listed.
    struct Scripted {
        name: &'static str,
        failing: Vec<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Reconciler for Scripted {
        fn system(&self) -> &'static str {
            self.name
        }

        async fn reconcile(&self, members: &[Member]) -> Vec<bool> {
            let mut seen = self.seen.lock().unwrap();
            members
                .iter()
                .map(|m| {
                    seen.push(m.id.clone());
                    !self.failing.iter().any(|id| *id == m.id)
                })
                .collect()
        }
    }

    async fn memberful_with(ids: &[&str]) -> (MockServer, Arc<MemberfulClient>) {
        let server = MockServer::start().await;
        let nodes: Vec<_> = ids
            .iter()
            .map(|id| json!({ "id": id, "email": format!("{id}@example.com") }))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "members": {
                    "nodes": nodes,
                    "pageInfo": { "hasNextPage": false, "hasPreviousPage": false }
                } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        let client = MemberfulClient::new(Client::new(), format!("{}/graphql", server.uri()), "k");
        (server, Arc::new(client))
    }

    #[tokio::test]
    async fn test_cycle_tallies_each_system() {
        let (_server, memberful) = memberful_with(&["a", "b", "c"]).await;
        let intercom = Arc::new(Scripted {
            name: "intercom",
            failing: vec!["b"],
            seen: Mutex::new(Vec::new()),
        });
        let wordpress = Arc::new(Scripted {
            name: "wordpress",
            failing: vec![],
            seen: Mutex::new(Vec::new()),
        });

        let service = SyncService::new(
            memberful,
            vec![intercom.clone() as Arc<dyn Reconciler>, wordpress.clone()],
        );
        let result = service.run_cycle().await;

        assert_eq!(result.members_fetched, 3);
        assert_eq!(result.total(), 6);
        assert_eq!(result.succeeded(), 5);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.systems[0].system, "intercom");
        assert_eq!(result.systems[0].failed, 1);
        assert_eq!(*wordpress.seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cycle_without_reconcilers_only_fetches() {
        let (_server, memberful) = memberful_with(&["a"]).await;
        let result = SyncService::new(memberful, Vec::new()).run_cycle().await;
        assert_eq!(result.members_fetched, 1);
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_from_config_enables_configured_systems() {
        let config = Config::parse(
            r#"
            [settings]
            time-zone = "UTC"
            log-level = 10
            memberful-api-key = "k"
            memberful-subdomain = "acme"

            [intercom]
            access-token = "t"

            [wordpress]
            application-password = "p"
            url = "https://example.com"
            username = "admin"
            "#,
        )
        .unwrap();

        let service = SyncService::from_config(&config).unwrap();
        let systems: Vec<_> = service.reconcilers.iter().map(|r| r.system()).collect();
        assert_eq!(systems, vec!["intercom", "wordpress"]);
    }

    #[tokio::test]
    async fn test_new_member_keeps_ids_from_both_systems() {
        let (memberful_server, memberful) = memberful_with(&["42"]).await;
        Mock::given(method("POST"))
            .and(body_string_contains("memberUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "memberUpdate": { "member": { "id": "42", "metadata": {} } } }
            })))
            .with_priority(1)
            .expect(2)
            .mount(&memberful_server)
            .await;

        let intercom_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total_count": 0, "data": [] })),
            )
            .mount(&intercom_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/contacts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "ic_new", "external_id": "42" })),
            )
            .expect(1)
            .mount(&intercom_server)
            .await;

        let wordpress_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&wordpress_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/users"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
            .expect(1)
            .mount(&wordpress_server)
            .await;

        let intercom = IntercomSync::new(
            IntercomClient::new(
                Client::new(),
                intercom_server.uri(),
                "ic-token",
                Dispatcher::new(Duration::ZERO),
            ),
            Arc::clone(&memberful),
            MultipleMatchPolicy::Conflict,
        );
        let wordpress = WordPressSync::new(
            WordPressClient::new(Client::new(), wordpress_server.uri(), "admin", "pw"),
            Arc::clone(&memberful),
            5,
            MultipleMatchPolicy::Conflict,
        );

        let service = SyncService::new(
            memberful,
            vec![Arc::new(intercom) as Arc<dyn Reconciler>, Arc::new(wordpress)],
        );
        let result = service.run_cycle().await;
        assert_eq!(result.succeeded(), 2);

        let updates: Vec<serde_json::Value> = memberful_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap())
            .filter(|body| body["query"].as_str().unwrap_or("").contains("memberUpdate"))
            .collect();
        assert_eq!(updates.len(), 2);
        let last = &updates[1]["variables"]["metadata"];
        assert_eq!(last["intercomId"], "ic_new");
        assert_eq!(last["wordpressId"], "99");
    }
}
