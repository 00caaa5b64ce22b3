//! Request-level adapter the HTTP layer calls into.
//!
//! # Responsibility
//! - Turn raw request inputs into data access calls.
//! - Turn outcomes into a status code and a JSON body.
//!
//! # Invariants
//! - Replies never contain driver error text.
//! - Every reply body is JSON.

pub mod inventory_service;
