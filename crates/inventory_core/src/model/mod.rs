//! Parts inventory domain model.
//!
//! # Responsibility
//! - Describe the persisted part record and its column layout.
//! - Validate caller input before it reaches the store.
//!
//! # Invariants
//! - `id` is assigned by the store exactly once and never supplied by callers.
//! - Records are never updated or deleted through this crate.

pub mod part;
