//! Bytecode analysis: the JUMPDEST validity bitmap, code hashing, and
//! EIP-7702 delegation parsing.
//!
//! The jump analysis itself is lifted almost unchanged from the teacher's
//! `AnalyzedCode::analyze` — walk the bytes once, skip PUSHn immediates, mark
//! JUMPDEST positions, and pad a trailing STOP so a fetch that runs off the
//! end always terminates instead of reading out of bounds.

use bytes::Bytes;
use ethereum_types::Address;
use once_cell::sync::OnceCell;
use sha3::{Digest, Keccak256};

use crate::{opcode::OpCode, primitives::B256};

const EIP7702_MAGIC: [u8; 3] = [0xef, 0x01, 0x00];

#[derive(Clone, Debug)]
pub struct JumpdestMap(Vec<bool>);

impl JumpdestMap {
    pub fn contains(&self, dst: u64) -> bool {
        (dst as usize) < self.0.len() && self.0[dst as usize]
    }
}

/// Bytecode plus the one-time analysis every call into it reuses.
#[derive(Clone, Debug)]
pub struct AnalyzedBytecode {
    code: Bytes,
    original_len: usize,
    jumpdest_map: JumpdestMap,
    hash: OnceCell<B256>,
}

impl AnalyzedBytecode {
    pub fn analyze(code: impl Into<Bytes>) -> Self {
        let code: Bytes = code.into();
        let original_len = code.len();
        let mut jumpdest_map = vec![false; code.len()];

        let mut i = 0;
        while i < code.len() {
            let opcode = OpCode(code[i]);
            let step = if opcode == OpCode::JUMPDEST {
                jumpdest_map[i] = true;
                1
            } else {
                let push = opcode.push_bytes();
                if push > 0 {
                    push + 1
                } else {
                    1
                }
            };
            i += step;
        }

        let mut padded = vec![0u8; i + 1];
        padded[..code.len()].copy_from_slice(&code);
        padded[i] = OpCode::STOP.to_u8();

        Self {
            code: padded.into(),
            original_len,
            jumpdest_map: JumpdestMap(jumpdest_map),
            hash: OnceCell::new(),
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Length of the code as originally submitted, before the trailing STOP
    /// padding byte analysis may have appended.
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    pub fn is_valid_jump_dest(&self, dst: u64) -> bool {
        self.jumpdest_map.contains(dst)
    }

    pub fn code_hash(&self) -> B256 {
        *self.hash.get_or_init(|| {
            let digest = Keccak256::digest(&self.code[..self.original_len]);
            B256::from_slice(&digest)
        })
    }
}

/// EIP-7702: a 23-byte account code of the form `0xef0100 || address`
/// designates delegation to `address`. Returns `None` for ordinary code.
pub fn parse_delegation(code: &[u8]) -> Option<Address> {
    if code.len() == 23 && code[..3] == EIP7702_MAGIC {
        Some(Address::from_slice(&code[3..]))
    } else {
        None
    }
}

/// EIP-3541: deployed code may not start with the `0xEF` byte (reserved for
/// the EOF format family), except for a well-formed EIP-7702 delegation
/// designator.
pub fn starts_with_reserved_byte(code: &[u8]) -> bool {
    !code.is_empty() && code[0] == 0xef && parse_delegation(code).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_immediate_is_invalid() {
        // PUSH1 0x5b, then a real JUMPDEST at offset 2.
        let code = [OpCode::PUSH1.to_u8(), 0x5b, OpCode::JUMPDEST.to_u8()];
        let analyzed = AnalyzedBytecode::analyze(Bytes::copy_from_slice(&code));
        assert!(!analyzed.is_valid_jump_dest(1));
        assert!(analyzed.is_valid_jump_dest(2));
    }

    #[test]
    fn analysis_pads_trailing_stop() {
        let code = [OpCode::PUSH1.to_u8(), 0x01];
        let analyzed = AnalyzedBytecode::analyze(Bytes::copy_from_slice(&code));
        assert_eq!(analyzed.code().last().copied(), Some(OpCode::STOP.to_u8()));
    }

    #[test]
    fn code_hash_is_deterministic_and_excludes_padding() {
        let code = [OpCode::PUSH1.to_u8(), 0x01];
        let a = AnalyzedBytecode::analyze(Bytes::copy_from_slice(&code));
        let b = AnalyzedBytecode::analyze(Bytes::copy_from_slice(&code));
        assert_eq!(a.code_hash(), b.code_hash());
    }

    #[test]
    fn delegation_header_parses_address() {
        let mut code = vec![0xef, 0x01, 0x00];
        code.extend_from_slice(&[0x11; 20]);
        assert_eq!(parse_delegation(&code), Some(Address::from([0x11; 20])));
    }

    #[test]
    fn reserved_byte_rejected_unless_delegation() {
        assert!(starts_with_reserved_byte(&[0xef, 0x00]));
        let mut delegation = vec![0xef, 0x01, 0x00];
        delegation.extend_from_slice(&[0x22; 20]);
        assert!(!starts_with_reserved_byte(&delegation));
    }
}
