// src/models/mod.rs

//! Domain models for the sync application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod contact;
mod member;

// Re-export all public types
pub use config::{
    Config, HttpConfig, IntercomConfig, LogLevel, MultipleMatchPolicy, Settings, WordPressConfig,
};
pub use contact::{
    ContactPayload, ContactRef, CustomAttributes, Operator, QueryNode, SearchRequest,
    SearchResponse, WpUser, WpUserPayload,
};
pub use member::{
    Address, Coupon, CreditCard, Download, Member, MemberPage, PageInfo, Plan, Subscription,
};

/// Tally of per-member outcomes for one downstream system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncTally {
    pub system: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncTally {
    pub fn from_outcomes(system: impl Into<String>, outcomes: &[bool]) -> Self {
        let succeeded = outcomes.iter().filter(|ok| **ok).count();
        Self {
            system: system.into(),
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}

/// Aggregate result of one sync cycle. Exists only to be logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCycleResult {
    pub members_fetched: usize,
    pub systems: Vec<SyncTally>,
}

impl SyncCycleResult {
    pub fn total(&self) -> usize {
        self.systems.iter().map(|s| s.total).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.systems.iter().map(|s| s.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.systems.iter().map(|s| s.failed).sum()
    }
}
