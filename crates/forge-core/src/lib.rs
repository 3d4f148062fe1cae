//! # Forge Core
//!
//! The domain layer of the Forge content generation service.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, ports, the credit ledger and the generation workflow.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, GenerationError};
