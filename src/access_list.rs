//! EIP-2929/2930 warm/cold access tracking.
//!
//! The teacher's `instructions/external.rs` macros (`balance!`, `sload!`,
//! `extcodesize!`, ...) call back into the host's `access_account`/
//! `access_storage` on every access and branch on the returned
//! `AccessStatus` to pick warm or cold pricing; this module is the
//! bookkeeping those macros relied on the host to keep, pulled out into the
//! interpreter's own side so hosts only need to answer "what's the current
//! value", not "is this warm".

use ethereum_types::Address;
use std::collections::HashSet;

use crate::primitives::Word;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

/// Precompile addresses 0x01..=0x09, always considered warm (they're
/// accessed on effectively every call and EIP-2929 exempts them).
fn is_precompile(addr: Address) -> bool {
    addr.0[..19] == [0u8; 19] && (1..=9).contains(&addr.0[19])
}

#[derive(Clone, Debug, Default)]
pub struct AccessList {
    addresses: HashSet<Address>,
    storage_keys: HashSet<(Address, Word)>,
    /// Pre-Berlin forks have no warm/cold distinction; every access prices
    /// as if cold.
    always_cold: bool,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// For forks predating EIP-2929: every access reports `Cold`, and
    /// nothing is ever recorded as warmed.
    pub fn always_cold() -> Self {
        Self {
            always_cold: true,
            ..Self::default()
        }
    }

    /// Pre-warms the transaction sender, the recipient/contract address,
    /// and (Shanghai+) the block's coinbase, per EIP-2929/3651.
    pub fn pre_warm(&mut self, sender: Address, recipient: Address, coinbase: Option<Address>) {
        if self.always_cold {
            return;
        }
        self.addresses.insert(sender);
        self.addresses.insert(recipient);
        if let Some(coinbase) = coinbase {
            self.addresses.insert(coinbase);
        }
        for i in 1u8..=9 {
            let mut bytes = [0u8; 20];
            bytes[19] = i;
            self.addresses.insert(Address::from(bytes));
        }
    }

    /// Warms `addr` from an EIP-2930 access list entry.
    pub fn pre_warm_address(&mut self, addr: Address) {
        if !self.always_cold {
            self.addresses.insert(addr);
        }
    }

    pub fn pre_warm_storage_key(&mut self, addr: Address, key: Word) {
        if !self.always_cold {
            self.storage_keys.insert((addr, key));
        }
    }

    /// Marks `addr` accessed, returning whether it was cold before this
    /// call. Precompiles and an always-cold access list never report cold.
    pub fn access_address(&mut self, addr: Address) -> AccessStatus {
        if self.always_cold {
            return AccessStatus::Cold;
        }
        if is_precompile(addr) {
            return AccessStatus::Warm;
        }
        if self.addresses.insert(addr) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    /// Also warms the containing address (a later BALANCE/EXTCODESIZE/CALL
    /// to the same address must see it as warm), without letting the
    /// address's own novelty affect the slot's reported status.
    pub fn access_storage_key(&mut self, addr: Address, key: Word) -> AccessStatus {
        if self.always_cold {
            return AccessStatus::Cold;
        }
        self.addresses.insert(addr);
        if self.storage_keys.insert((addr, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    pub fn is_address_warm(&self, addr: Address) -> bool {
        !self.always_cold && (is_precompile(addr) || self.addresses.contains(&addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;

    #[test]
    fn first_access_is_cold_second_is_warm() {
        let mut al = AccessList::new();
        let addr = Address::from_low_u64_be(0x1234);
        assert_eq!(al.access_address(addr), AccessStatus::Cold);
        assert_eq!(al.access_address(addr), AccessStatus::Warm);
    }

    #[test]
    fn precompiles_are_always_warm() {
        let mut al = AccessList::new();
        let precompile = Address::from_low_u64_be(1);
        assert_eq!(al.access_address(precompile), AccessStatus::Warm);
    }

    #[test]
    fn always_cold_never_warms() {
        let mut al = AccessList::always_cold();
        let addr = Address::from_low_u64_be(7);
        assert_eq!(al.access_address(addr), AccessStatus::Cold);
        assert_eq!(al.access_address(addr), AccessStatus::Cold);
    }

    #[test]
    fn storage_keys_are_tracked_per_address() {
        let mut al = AccessList::new();
        let a = Address::from_low_u64_be(1);
        let b = Address::from_low_u64_be(2);
        assert_eq!(al.access_storage_key(a, Word::zero()), AccessStatus::Cold);
        assert_eq!(al.access_storage_key(a, Word::zero()), AccessStatus::Warm);
        assert_eq!(al.access_storage_key(b, Word::zero()), AccessStatus::Cold);
    }

    #[test]
    fn touching_a_storage_key_also_warms_its_address() {
        let mut al = AccessList::new();
        let a = Address::from_low_u64_be(3);
        assert_eq!(al.access_storage_key(a, Word::zero()), AccessStatus::Cold);
        assert_eq!(al.access_address(a), AccessStatus::Warm);
    }
}
