//! Execution tracing hooks.
//!
//! The teacher declares a `tracing` module (`pub mod tracing;` in `lib.rs`,
//! driven from `AnalyzedCode::execute`'s `notify_execution_start`/
//! `notify_instruction_start` call sites) whose contents weren't part of
//! this retrieval; this reconstructs the trait from those call sites and
//! wires it through `tracing::span!`/`event!` instead of a bespoke
//! notification protocol, since that's the ambient observability stack the
//! rest of the crate uses.

use ethereum_types::Address;

use crate::{error::StatusCode, opcode::OpCode, primitives::Word};

/// Observes a call frame's execution without being able to influence it.
/// Every method has a default no-op body so implementors only override what
/// they care about.
pub trait Tracer {
    fn on_frame_start(&mut self, _depth: u32, _address: Address, _code: &[u8]) {}

    fn on_step(&mut self, _pc: usize, _op: OpCode, _gas_left: u64, _stack: &[Word]) {}

    fn on_frame_end(&mut self, _depth: u32, _status: StatusCode, _gas_left: u64) {}
}

/// The default tracer: does nothing, and the interpreter is free to skip
/// even the trait-object call overhead for it via monomorphization.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Forwards every hook to `tracing::trace!`/`tracing::debug!` events, for
/// embedders happy to drive a subscriber instead of implementing `Tracer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingTracer;

impl Tracer for LoggingTracer {
    fn on_frame_start(&mut self, depth: u32, address: Address, code: &[u8]) {
        tracing::debug!(depth, ?address, code_len = code.len(), "frame start");
    }

    fn on_step(&mut self, pc: usize, op: OpCode, gas_left: u64, stack: &[Word]) {
        tracing::trace!(pc, %op, gas_left, stack_depth = stack.len(), "step");
    }

    fn on_frame_end(&mut self, depth: u32, status: StatusCode, gas_left: u64) {
        tracing::debug!(depth, %status, gas_left, "frame end");
    }
}
