#![doc = include_str!("../README.md")]

pub use access_list::{AccessList, AccessStatus};
pub use bytecode::{AnalyzedBytecode, JumpdestMap};
pub use error::{HostError, StatusCode};
pub use evm::Evm;
pub use gas::Gas;
pub use host::{BlockEnv, CallInputs, CallKind, CallResult, Env, Host, SnapshotId, StorageStatus, TxEnv};
pub use interpreter::{Action, CallContext, Interpreter};
pub use memory::Memory;
pub use opcode::OpCode;
pub use spec::{Hardfork, Spec};
pub use stack::Stack;
pub use tracer::{LoggingTracer, NoopTracer, Tracer};

/// Maximum allowed EVM bytecode size, per EIP-170.
pub const MAX_CODE_SIZE: usize = 0x6000;

mod access_list;
mod bytecode;
mod error;
mod evm;
mod gas;
mod host;
#[doc(hidden)]
pub mod instructions;
mod interpreter;
mod memory;
pub mod opcode;
pub mod primitives;
mod spec;
mod stack;
mod tracer;

#[cfg(any(test, feature = "util"))]
pub mod util;
