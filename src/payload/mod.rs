// src/payload/mod.rs

//! Pure transforms from members into downstream request bodies.
//!
//! Nothing here performs I/O.

pub mod format;
pub mod intercom;
pub mod memberful;
pub mod wordpress;
