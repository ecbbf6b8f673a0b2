//! An in-memory `Host` for tests: all state lives in `HashMap`s, snapshots
//! are full clones of that state, and `call` recurses straight into
//! [`crate::evm::Evm::call`].
//!
//! Grounded on the teacher's `util::mocked_host::MockedHost`, which played
//! the same role against the generator-based interpreter; this version has
//! no need for the teacher's per-call `Message` bookkeeping since
//! `Evm::call` owns that now.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use ethereum_types::{Address, U256};
use sha3::{Digest, Keccak256};

use crate::{
    access_list::{AccessList, AccessStatus},
    error::HostError,
    evm::Evm,
    host::{BlockEnv, CallInputs, CallKind, CallResult, Env, Host, SnapshotId, StorageStatus, TxEnv},
    primitives::{address_to_word, word_to_address, B256, Word},
    spec::{Hardfork, Spec},
    tracer::NoopTracer,
};

#[derive(Clone, Debug, Default)]
struct AccountState {
    balance: U256,
    nonce: u64,
    code: Bytes,
    storage: HashMap<Word, Word>,
}

#[derive(Clone)]
struct Snapshot {
    accounts: HashMap<Address, AccountState>,
    transient: HashMap<(Address, Word), Word>,
    logs: Vec<(Address, Bytes, Vec<Word>)>,
    destructed: HashSet<Address>,
    created_this_tx: HashSet<Address>,
}

/// A self-contained chain state an [`crate::evm::Evm`] can run against.
///
/// `original` and `created_this_tx` model transaction-scoped state that
/// never existed in the synchronous per-call `Host` contract: a slot's
/// EIP-2200 "original" value and EIP-6780's "created in this transaction"
/// marker both live for the whole transaction, not just one call frame, so
/// they are populated lazily and only rolled back on revert, never reset
/// between calls. This host has no explicit "begin transaction" boundary;
/// callers that need a second, independent transaction should construct a
/// fresh `MockedHost`.
#[derive(Clone)]
pub struct MockedHost {
    pub env: Env,
    pub spec: Spec,
    accounts: HashMap<Address, AccountState>,
    original: HashMap<(Address, Word), Word>,
    transient: HashMap<(Address, Word), Word>,
    access: AccessList,
    logs: Vec<(Address, Bytes, Vec<Word>)>,
    destructed: HashSet<Address>,
    created_this_tx: HashSet<Address>,
    block_hashes: HashMap<u64, B256>,
    snapshots: Vec<Snapshot>,
}

impl MockedHost {
    pub fn new(spec: Spec) -> Self {
        let always_cold = !spec.has_access_list;
        Self {
            env: Env {
                block: BlockEnv {
                    number: 1,
                    coinbase: Address::zero(),
                    timestamp: 0,
                    gas_limit: 30_000_000,
                    difficulty: U256::zero(),
                    prevrandao: B256::zero(),
                    base_fee: U256::zero(),
                    blob_base_fee: U256::zero(),
                },
                tx: TxEnv {
                    origin: Address::zero(),
                    gas_price: U256::zero(),
                    chain_id: U256::one(),
                    blob_hashes: Vec::new(),
                },
            },
            spec,
            accounts: HashMap::new(),
            original: HashMap::new(),
            transient: HashMap::new(),
            access: if always_cold {
                AccessList::always_cold()
            } else {
                AccessList::new()
            },
            logs: Vec::new(),
            destructed: HashSet::new(),
            created_this_tx: HashSet::new(),
            block_hashes: HashMap::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    pub fn set_storage_value(&mut self, address: Address, key: Word, value: Word) {
        self.accounts
            .entry(address)
            .or_default()
            .storage
            .insert(key, value);
    }

    pub fn set_block_hash(&mut self, number: u64, hash: B256) {
        self.block_hashes.insert(number, hash);
    }

    pub fn logs(&self) -> &[(Address, Bytes, Vec<Word>)] {
        &self.logs
    }

    pub fn is_destructed(&self, address: Address) -> bool {
        self.destructed.contains(&address)
    }

    /// Runs `inputs` as a top-level entry point (depth 0), the synchronous
    /// equivalent of the teacher's `AnalyzedCode::execute`.
    pub fn run(&mut self, inputs: CallInputs) -> CallResult {
        let spec = self.spec.clone();
        Evm::call(self, &inputs, &spec, &mut NoopTracer).expect("mocked host never errors")
    }
}

impl Host for MockedHost {
    fn account_exists(&self, address: Address) -> Result<bool, HostError> {
        Ok(self.accounts.contains_key(&address))
    }

    fn get_storage(&self, address: Address, key: Word) -> Result<Word, HostError> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or_default())
    }

    fn original_storage(&self, address: Address, key: Word) -> Result<Word, HostError> {
        Ok(self.original.get(&(address, key)).copied().unwrap_or_else(|| {
            self.accounts
                .get(&address)
                .and_then(|a| a.storage.get(&key))
                .copied()
                .unwrap_or_default()
        }))
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: Word,
        value: Word,
    ) -> Result<StorageStatus, HostError> {
        let account = self.accounts.entry(address).or_default();
        let current = account.storage.get(&key).copied().unwrap_or_default();
        let original = *self.original.entry((address, key)).or_insert(current);

        let status = if current == value {
            StorageStatus::Unchanged
        } else if current != original {
            StorageStatus::ModifiedAgain
        } else if original.is_zero() {
            StorageStatus::Added
        } else if value.is_zero() {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        };

        let account = self.accounts.entry(address).or_default();
        if value.is_zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
        Ok(status)
    }

    fn get_balance(&self, address: Address) -> Result<U256, HostError> {
        Ok(self.accounts.get(&address).map(|a| a.balance).unwrap_or_default())
    }

    fn get_code_size(&self, address: Address) -> Result<u64, HostError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|a| a.code.len() as u64)
            .unwrap_or_default())
    }

    fn get_code_hash(&self, address: Address) -> Result<B256, HostError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|a| B256::from_slice(&Keccak256::digest(&a.code)))
            .unwrap_or_else(B256::zero))
    }

    fn code(&self, address: Address) -> Result<Bytes, HostError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default())
    }

    fn call(&mut self, inputs: &CallInputs) -> Result<CallResult, HostError> {
        let spec = self.spec.clone();
        Evm::call(self, inputs, &spec, &mut NoopTracer)
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), HostError> {
        let from_balance = self.accounts.entry(from).or_default().balance;
        if from_balance < value {
            return Err(HostError::Backend(format!(
                "insufficient balance: {from:?} has {from_balance}, needs {value}"
            )));
        }
        self.accounts.entry(from).or_default().balance -= value;
        self.accounts.entry(to).or_default().balance += value;
        Ok(())
    }

    fn create_address(
        &mut self,
        sender: Address,
        kind: CallKind,
        init_code: &[u8],
    ) -> Result<Address, HostError> {
        let account = self.accounts.entry(sender).or_default();
        let nonce = account.nonce;
        account.nonce += 1;

        let digest = match kind {
            CallKind::Create2 { salt } => {
                let init_code_hash = Keccak256::digest(init_code);
                let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
                buf.push(0xff);
                buf.extend_from_slice(&sender.0);
                let mut salt_bytes = [0u8; 32];
                salt.to_big_endian(&mut salt_bytes);
                buf.extend_from_slice(&salt_bytes);
                buf.extend_from_slice(&init_code_hash);
                Keccak256::digest(&buf)
            }
            _ => {
                let mut buf = Vec::with_capacity(20 + 8);
                buf.extend_from_slice(&sender.0);
                buf.extend_from_slice(&nonce.to_be_bytes());
                Keccak256::digest(&buf)
            }
        };
        let address = Address::from_slice(&digest[12..]);
        self.created_this_tx.insert(address);
        Ok(address)
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), HostError> {
        self.accounts.entry(address).or_default().code = code;
        Ok(())
    }

    fn env(&self) -> &Env {
        &self.env
    }

    fn block_hash(&self, block_number: u64) -> Result<B256, HostError> {
        Ok(self
            .block_hashes
            .get(&block_number)
            .copied()
            .unwrap_or_else(B256::zero))
    }

    fn log(&mut self, address: Address, data: Bytes, topics: &[Word]) -> Result<(), HostError> {
        self.logs.push((address, data, topics.to_vec()));
        Ok(())
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<bool, HostError> {
        let already_destructed = self.destructed.contains(&address);
        let balance = self.accounts.get(&address).map(|a| a.balance).unwrap_or_default();
        self.accounts.entry(beneficiary).or_default().balance += balance;
        self.accounts.entry(address).or_default().balance = U256::zero();

        // EIP-6780: post-Cancun, the account/code survive unless this
        // contract was created earlier in the same transaction. The
        // balance move above still happens unconditionally.
        let schedules_deletion =
            self.spec.fork < Hardfork::Cancun || self.created_this_tx.contains(&address);
        if schedules_deletion {
            self.destructed.insert(address);
        }
        Ok(!already_destructed)
    }

    fn access_account(&mut self, address: Address) -> Result<AccessStatus, HostError> {
        Ok(self.access.access_address(address))
    }

    fn access_storage(&mut self, address: Address, key: Word) -> Result<AccessStatus, HostError> {
        Ok(self.access.access_storage_key(address, key))
    }

    fn tload(&self, address: Address, key: Word) -> Word {
        self.transient.get(&(address, key)).copied().unwrap_or_default()
    }

    fn tstore(&mut self, address: Address, key: Word, value: Word) {
        if value.is_zero() {
            self.transient.remove(&(address, key));
        } else {
            self.transient.insert((address, key), value);
        }
    }

    fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(Snapshot {
            accounts: self.accounts.clone(),
            transient: self.transient.clone(),
            logs: self.logs.clone(),
            destructed: self.destructed.clone(),
            created_this_tx: self.created_this_tx.clone(),
        });
        SnapshotId((self.snapshots.len() - 1) as u64)
    }

    fn revert_to_snapshot(&mut self, id: SnapshotId) {
        let idx = id.0 as usize;
        if let Some(snap) = self.snapshots.get(idx).cloned() {
            self.accounts = snap.accounts;
            self.transient = snap.transient;
            self.logs = snap.logs;
            self.destructed = snap.destructed;
            self.created_this_tx = snap.created_this_tx;
            self.snapshots.truncate(idx);
        }
    }
}

/// Reinterprets an address as a 256-bit word, the inverse of
/// [`word_to_address`], for the ADDRESS/CALLER family of opcodes as seen
/// from tests constructing expected stack values directly.
pub fn address_word(address: Address) -> Word {
    address_to_word(address)
}

#[allow(dead_code)]
fn _unused_word_to_address_reexport(w: Word) -> Address {
    word_to_address(w)
}
