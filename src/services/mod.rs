//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the entitlement and metering logic so route handlers
//! stay focused on protocol translation and auth plumbing. All billable
//! state flows through the storage port; nothing here assumes process-local
//! memory except the rate limiter and cache, which tolerate it by contract.

pub mod billing;
pub mod entitlement;
pub mod generate;
pub mod session;
pub mod usage;
