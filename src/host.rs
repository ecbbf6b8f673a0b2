//! The `Host` trait: everything the interpreter needs from the surrounding
//! chain state, made synchronous.
//!
//! The teacher's `Host` is `#[async_trait]` so a node backed by a remote
//! database can await disk or network I/O mid-instruction. This crate has no
//! task system to suspend into, so every method here returns a plain
//! `Result` instead of a future; an embedder that genuinely needs async I/O
//! is expected to block on it at its own boundary rather than leak an
//! executor into the interpreter loop.

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    access_list::AccessStatus,
    error::HostError,
    primitives::{B256, Word},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    /// `0 -> 0` or `X -> X`.
    Unchanged,
    /// `X -> Y`.
    Modified,
    /// `X -> Y -> Z` within the same transaction.
    ModifiedAgain,
    /// `0 -> X`.
    Added,
    /// `X -> 0`.
    Deleted,
}

/// An opaque marker for a point the host can later roll back to. The
/// interpreter never inspects it, only holds it and passes it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotId(pub u64);

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockEnv {
    pub number: u64,
    pub coinbase: Address,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub difficulty: U256,
    pub prevrandao: B256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxEnv {
    pub origin: Address,
    pub gas_price: U256,
    pub chain_id: U256,
    /// EIP-4844 versioned hashes of the blobs attached to this transaction,
    /// indexed by `BLOBHASH`. Empty for a non-blob transaction.
    pub blob_hashes: Vec<B256>,
}

/// Block and transaction context visible to opcodes like `TIMESTAMP` or
/// `ORIGIN`, bundled the way a `Host` implementation typically stores it.
/// Constructible directly, or (behind the `serde` feature) deserialized
/// straight from a JSON test fixture.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Env {
    pub block: BlockEnv,
    pub tx: TxEnv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2 { salt: Word },
}

/// A request to enter a new call frame, whether from a CALL-family opcode
/// or a top-level transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct CallInputs {
    pub kind: CallKind,
    pub is_static: bool,
    pub depth: u32,
    pub gas: u64,
    /// Where the executed code is fetched from.
    pub destination: Address,
    /// `msg.sender` as seen by the callee.
    pub sender: Address,
    /// Whose storage/balance/`ADDRESS` the new frame runs as. Equal to
    /// `destination` for CALL/STATICCALL/CREATE*; equal to the calling
    /// frame's own address for CALLCODE/DELEGATECALL, which borrow another
    /// contract's code but keep their own storage.
    pub storage_target: Address,
    pub input_data: Bytes,
    pub value: U256,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallResult {
    pub status_code: crate::error::StatusCode,
    pub gas_left: u64,
    pub gas_refund: i64,
    pub output_data: Bytes,
    pub create_address: Option<Address>,
}

/// Everything the interpreter asks of the surrounding chain state.
pub trait Host {
    fn account_exists(&self, address: Address) -> Result<bool, HostError>;

    /// Returns `B256::zero()` if the slot has never been written.
    fn get_storage(&self, address: Address, key: Word) -> Result<Word, HostError>;

    /// The value this slot held at the start of the enclosing transaction,
    /// for EIP-2200/1283 net-metering. Equal to `get_storage`'s current
    /// value until the first `set_storage` call against this slot this
    /// transaction; unaffected by nested-call snapshot/revert.
    fn original_storage(&self, address: Address, key: Word) -> Result<Word, HostError>;

    fn set_storage(
        &mut self,
        address: Address,
        key: Word,
        value: Word,
    ) -> Result<StorageStatus, HostError>;

    /// Returns `0` if the account does not exist.
    fn get_balance(&self, address: Address) -> Result<U256, HostError>;

    fn get_code_size(&self, address: Address) -> Result<u64, HostError>;

    fn get_code_hash(&self, address: Address) -> Result<B256, HostError>;

    fn code(&self, address: Address) -> Result<Bytes, HostError>;

    /// Runs a nested call/create, returning the sub-frame's outcome.
    fn call(&mut self, inputs: &CallInputs) -> Result<CallResult, HostError>;

    /// Moves `value` from `from` to `to`, failing if `from`'s balance is
    /// insufficient. Call sites check the balance themselves first; this is
    /// the actual ledger mutation.
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), HostError>;

    /// Assigns the address a new CREATE/CREATE2 contract will live at
    /// (`keccak(rlp(sender, nonce))` or the EIP-1014 salted variant over
    /// `init_code`) and bumps whatever nonce backs it.
    fn create_address(
        &mut self,
        sender: Address,
        kind: CallKind,
        init_code: &[u8],
    ) -> Result<Address, HostError>;

    /// Installs the deployed code at `address` after a successful CREATE.
    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), HostError>;

    fn env(&self) -> &Env;

    /// Returns `B256::zero()` for a block outside the 256-block window.
    fn block_hash(&self, block_number: u64) -> Result<B256, HostError>;

    fn log(&mut self, address: Address, data: Bytes, topics: &[Word]) -> Result<(), HostError>;

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<bool, HostError>;

    /// Marks the account accessed, returning whether it was cold before.
    fn access_account(&mut self, address: Address) -> Result<AccessStatus, HostError>;

    /// Marks the storage slot accessed, returning whether it was cold before.
    fn access_storage(&mut self, address: Address, key: Word) -> Result<AccessStatus, HostError>;

    /// EIP-1153 transient storage read; always zero if unset, and cleared at
    /// the end of the enclosing transaction (not this call).
    fn tload(&self, address: Address, key: Word) -> Word;

    fn tstore(&mut self, address: Address, key: Word, value: Word);

    /// Records a rollback point for the current call frame's side effects.
    fn snapshot(&mut self) -> SnapshotId;

    /// Rolls back every storage write, log, balance transfer, and
    /// self-destruct recorded since `id` was taken.
    fn revert_to_snapshot(&mut self, id: SnapshotId);
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn env_deserializes_from_a_json_fixture() {
        let json = r#"{
            "block": {
                "number": 18000000,
                "coinbase": "0x0000000000000000000000000000000000000001",
                "timestamp": 1700000000,
                "gas_limit": 30000000,
                "difficulty": "0x0",
                "prevrandao": "0x0000000000000000000000000000000000000000000000000000000000000002",
                "base_fee": "0x3b9aca00",
                "blob_base_fee": "0x1"
            },
            "tx": {
                "origin": "0x0000000000000000000000000000000000000003",
                "gas_price": "0x3b9aca00",
                "chain_id": "0x1",
                "blob_hashes": []
            }
        }"#;

        let env: Env = serde_json::from_str(json).expect("fixture should parse");
        assert_eq!(env.block.number, 18000000);
        assert_eq!(env.tx.chain_id, U256::one());
    }
}
