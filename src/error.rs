//! Execution outcomes and host-boundary errors.

use strum_macros::Display;

/// The result of executing one call frame, or the internal error a handler
/// raises mid-step before it is mapped onto a frame result.
///
/// `Success` and `Revert` carry no special data of their own here; the
/// associated return data lives alongside this code in [`crate::message::Output`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum StatusCode {
    /// Execution finished with success.
    #[strum(serialize = "success")]
    Success,
    /// Execution terminated with the REVERT opcode, a static-context
    /// violation, or an insufficient-balance value transfer.
    #[strum(serialize = "revert")]
    Revert,
    /// The execution ran out of gas.
    #[strum(serialize = "out of gas")]
    OutOfGas,
    /// Pushed past the 1024-word stack limit.
    #[strum(serialize = "stack overflow")]
    StackOverflow,
    /// Popped/peeked past the bottom of the stack.
    #[strum(serialize = "stack underflow")]
    StackUnderflow,
    /// Unknown opcode, an opcode unavailable in the active fork, or the
    /// explicit INVALID (0xfe) instruction.
    #[strum(serialize = "invalid opcode")]
    InvalidOpcode,
    /// JUMP/JUMPI targeted a position that is not a valid JUMPDEST.
    #[strum(serialize = "invalid jump")]
    InvalidJump,
    /// The program counter ran past the end of the code (including an
    /// incomplete PUSH immediate).
    #[strum(serialize = "invalid program counter")]
    InvalidPc,
    /// RETURNDATACOPY (or similar) addressed bytes outside the current
    /// return-data buffer.
    #[strum(serialize = "invalid offset")]
    InvalidOffset,
    /// The call depth limit (1024) was reached before a new frame could be
    /// constructed.
    #[strum(serialize = "call depth exceeded")]
    CallDepthExceeded,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A hard failure from the `Host` collaborator (storage I/O, network, a
/// poisoned lock in the embedder, etc). Distinct from [`StatusCode`]: a
/// `HostError` is not an EVM execution outcome and is never mapped onto one.
/// It propagates out of `Evm::call` as `Err`.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host backend failure: {0}")]
    Backend(String),
    #[error("nested EIP-7702 delegation is not permitted")]
    NestedDelegation,
}
