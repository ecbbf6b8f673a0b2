//! Test-only helpers: a bytecode builder DSL, an in-memory [`Host`], and a
//! fluent runner tying both to a single call frame.
//!
//! [`Host`]: crate::host::Host

pub mod bytecode;
pub mod mocked_host;
pub mod tester;

pub use bytecode::{Bytecode, CallInstruction};
pub use mocked_host::MockedHost;
pub use tester::EvmTester;
