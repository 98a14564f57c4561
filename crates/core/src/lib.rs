//! Dockyard domain core.
//!
//! Hosts the rule-based payload validation engine shared by every request
//! handler in the backend. Pure logic, no database or HTTP dependencies.

pub mod error;
pub mod validation;
