//! Application services - orchestration over the ports.

mod generation;
pub mod ledger;

pub use generation::{GenerationOutcome, GenerationService, derive_title};
pub use ledger::CreditPolicy;
