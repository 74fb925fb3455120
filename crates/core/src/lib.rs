//! Core types and pure logic for the Adlens reconciliation engine.

pub mod account;
pub mod bcg;
pub mod campaign;
pub mod dates;
pub mod error;
pub mod health;
pub mod metrics;

pub use account::*;
pub use bcg::*;
pub use campaign::*;
pub use dates::*;
pub use error::{Error, Result};
pub use health::*;
pub use metrics::*;
