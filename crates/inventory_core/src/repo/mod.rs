//! Data access operations over the parts store.
//!
//! # Responsibility
//! - Compose connection acquisition, bound-parameter execution and result
//!   mapping into use-case level operations.
//! - Keep SQL text and driver errors inside the persistence boundary.
//!
//! # Invariants
//! - Every operation returns an `OperationOutcome`; nothing escapes raw.
//! - Caller values reach SQL only as bound parameters.
//! - Each call acquires its own connection and releases it before returning.

pub mod parts_repo;
