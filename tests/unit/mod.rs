// tests/unit/mod.rs
//! Unit tests for fabric-governance components
//!
//! Each test exercises one component in isolation through the public API,
//! without network access.

#[cfg(test)]
mod configuration;

#[cfg(test)]
mod records;

#[cfg(test)]
mod parsing;

#[cfg(test)]
mod sink;
