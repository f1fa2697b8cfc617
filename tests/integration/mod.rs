// tests/integration/mod.rs
//! Integration tests for fabric-governance
//!
//! These drive the orchestrator and individual stages end to end against
//! the canned tenant in `common`, writing to in-memory or temporary sinks.

#[cfg(test)]
mod tenant_stage;

#[cfg(test)]
mod full_run;
