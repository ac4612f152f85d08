// src/lib.rs

//! Memberful member sync library

pub mod error;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod services;
pub mod utils;
