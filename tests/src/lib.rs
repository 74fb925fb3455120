//! Shared test support: in-memory stores and a scripted platform.

pub mod fixtures;
pub mod mocks;
