// src/services/mod.rs

//! Service layer for the sync application.
//!
//! This module contains the business logic for:
//! - Member fetching and metadata write-back (`MemberfulClient`)
//! - Intercom contact reconciliation (`IntercomSync`)
//! - WordPress user reconciliation (`WordPressSync`)

mod intercom;
mod memberful;
mod wordpress;

use async_trait::async_trait;

use crate::models::Member;

pub use intercom::{INTERCOM_ID_KEY, IntercomClient, IntercomSync};
pub use memberful::MemberfulClient;
pub use wordpress::{WORDPRESS_ID_KEY, WordPressClient, WordPressSync};

/// A downstream system members are reconciled into.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Short name used in logs and cycle tallies.
    fn system(&self) -> &'static str;

    /// Reconcile every member, returning one outcome per member.
    ///
    /// A failure for one member never aborts the others.
    async fn reconcile(&self, members: &[Member]) -> Vec<bool>;
}
