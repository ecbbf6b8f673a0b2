//! Gas accounting: remaining budget, consumption, and refunds.
//!
//! Grounded on the teacher's inline gas bookkeeping in `state.rs`/
//! `instructions/memory.rs` (`num_words` formula), generalized into its own
//! type so the interpreter and the call-frame manager share one accounting
//! surface instead of threading raw `i64`/`u64` fields through both.

use crate::error::StatusCode;

/// `3*words + words^2/512`, the memory expansion cost tier shared by every
/// opcode that can grow memory.
fn memory_cost(words: u64) -> u64 {
    3 * words + words * words / 512
}

#[derive(Clone, Copy, Debug)]
pub struct Gas {
    limit: u64,
    remaining: u64,
    refund: i64,
    /// Total cost of the largest memory size paid for so far, so growth only
    /// charges the delta.
    memory_words_paid: u64,
}

impl Gas {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            refund: 0,
            memory_words_paid: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn used(&self) -> u64 {
        self.limit - self.remaining
    }

    pub fn refund(&self) -> i64 {
        self.refund
    }

    /// Charges a flat cost, failing with `OutOfGas` rather than going
    /// negative.
    pub fn consume(&mut self, cost: u64) -> Result<(), StatusCode> {
        match self.remaining.checked_sub(cost) {
            Some(r) => {
                self.remaining = r;
                Ok(())
            }
            None => {
                self.remaining = 0;
                Err(StatusCode::OutOfGas)
            }
        }
    }

    /// Credits the call stipend (2300) back to the caller's own remaining
    /// gas, mirroring the forwarded amount added to the callee's budget.
    pub fn grant_stipend(&mut self, amount: u64) {
        self.remaining += amount;
    }

    /// Adds (or, for SSTORE clawbacks, subtracts) from the refund counter.
    /// The counter is allowed to go negative transiently; only the final
    /// cap in [`Self::capped_refund`] matters.
    pub fn add_refund(&mut self, delta: i64) {
        self.refund += delta;
    }

    /// Charges the incremental cost of growing memory to `new_words`,
    /// recording the new high-water mark. A no-op if `new_words` does not
    /// exceed what has already been paid for.
    pub fn consume_memory_expansion(&mut self, new_words: u64) -> Result<(), StatusCode> {
        if new_words <= self.memory_words_paid {
            return Ok(());
        }
        let delta = memory_cost(new_words) - memory_cost(self.memory_words_paid);
        self.consume(delta)?;
        self.memory_words_paid = new_words;
        Ok(())
    }

    /// The refund actually granted at the end of a transaction: capped at
    /// `used / max_refund_quotient` (quotient is 2 pre-London, 5 from
    /// London on, per EIP-3529).
    pub fn capped_refund(&self, max_refund_quotient: u64) -> u64 {
        if self.refund <= 0 {
            return 0;
        }
        let cap = self.used() / max_refund_quotient;
        (self.refund as u64).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_past_limit_errors_and_zeroes() {
        let mut g = Gas::new(10);
        assert_eq!(g.consume(15).unwrap_err(), StatusCode::OutOfGas);
        assert_eq!(g.remaining(), 0);
    }

    #[test]
    fn memory_expansion_only_charges_delta() {
        let mut g = Gas::new(1_000_000);
        g.consume_memory_expansion(10).unwrap();
        let used_first = g.used();
        g.consume_memory_expansion(10).unwrap();
        assert_eq!(g.used(), used_first);
        g.consume_memory_expansion(20).unwrap();
        assert!(g.used() > used_first);
    }

    #[test]
    fn refund_is_capped() {
        let mut g = Gas::new(100);
        g.consume(40).unwrap();
        g.add_refund(100);
        assert_eq!(g.capped_refund(5), 8); // used=40, cap=8
        assert_eq!(g.capped_refund(2), 20); // cap=20, refund=100 -> min(100,20)
    }

    #[test]
    fn negative_refund_floor_is_zero() {
        let mut g = Gas::new(100);
        g.add_refund(-5);
        assert_eq!(g.capped_refund(2), 0);
    }
}
