//! Credit ledger - pricing and balance arithmetic.
//!
//! Pure functions only. Balances are mutated by the stores, which use
//! [`apply_deduction`] semantics (floored at zero).

use crate::error::DomainError;

/// Words per billing unit.
const WORDS_PER_UNIT: u64 = 100;

/// Process-wide credit configuration, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPolicy {
    /// Credits charged per started block of 100 words.
    pub rate_per_hundred_words: i64,
    /// Balance granted to new accounts.
    pub starting_credits: i64,
    /// Generated output below this many words is rejected.
    pub min_generated_words: i64,
    /// Word count assumed for the balance check made before calling the generator.
    pub preflight_word_estimate: i64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            rate_per_hundred_words: 1,
            starting_credits: 10,
            min_generated_words: 10,
            preflight_word_estimate: 200,
        }
    }
}

impl CreditPolicy {
    /// Reject settings under which billing would grant credits or never reject output.
    pub fn validate(&self) -> Result<(), DomainError> {
        let checks = [
            ("rate_per_hundred_words", self.rate_per_hundred_words, 0),
            ("starting_credits", self.starting_credits, 0),
            ("min_generated_words", self.min_generated_words, 1),
            ("preflight_word_estimate", self.preflight_word_estimate, 0),
        ];
        for (name, value, minimum) in checks {
            if value < minimum {
                return Err(DomainError::Validation(format!(
                    "{name} must be at least {minimum}, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Cost checked against the balance before any upstream call.
    pub fn preflight_cost(&self) -> i64 {
        estimate_cost(self.preflight_word_estimate, self.rate_per_hundred_words)
    }

    /// Cost of content with `words` words.
    pub fn cost_for(&self, words: i64) -> i64 {
        estimate_cost(words, self.rate_per_hundred_words)
    }
}

/// `ceil(words / 100) * rate`, saturating at `i64::MAX`. Zero (or negative)
/// words and negative rates cost nothing.
pub fn estimate_cost(words: i64, rate_per_hundred: i64) -> i64 {
    let units = (words.max(0) as u64).div_ceil(WORDS_PER_UNIT);
    (units as i64).saturating_mul(rate_per_hundred.max(0))
}

pub fn sufficient_funds(balance: i64, cost: i64) -> bool {
    balance >= cost
}

/// Balance after paying `cost`, never below zero.
pub fn apply_deduction(balance: i64, cost: i64) -> i64 {
    balance.saturating_sub(cost).max(0)
}
