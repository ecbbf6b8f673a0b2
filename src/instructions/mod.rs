//! Per-category opcode handlers.
//!
//! Each handler takes the running [`crate::interpreter::Interpreter`] (and,
//! for anything that touches chain state, a `&mut dyn Host`) and returns
//! [`crate::interpreter::Action`] — `Continue` for the common case, `Jump`
//! for JUMP/JUMPI, or `Halt` for anything that ends the frame. Gas for the
//! opcode's flat tier is charged by the dispatch loop before the handler
//! runs; handlers are only responsible for their own dynamic component
//! (memory expansion, cold-access surcharges, per-word costs).

pub mod arithmetic;
pub mod bitwise;
pub mod boolean;
pub mod call;
pub mod create;
pub mod log;
pub mod memory;
pub mod storage;
pub mod system;
