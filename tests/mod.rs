// tests/mod.rs
//! Test suite organization for fabric-governance
//!
//! Unit tests exercise single components through the public API; integration
//! tests drive whole stages against an in-memory fake of the metadata APIs.

#[cfg(test)]
pub mod common;

#[cfg(test)]
pub mod unit;

#[cfg(test)]
pub mod integration;
