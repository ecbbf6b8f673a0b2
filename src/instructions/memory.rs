//! Memory-touching opcodes that don't need the `Host`: loads/stores,
//! MSIZE, KECCAK256, the calldata/code/return-data *COPY family, and MCOPY.
//!
//! Gas formulas (word-rounded expansion cost, 3/word copy cost, 6/word
//! hash cost) are lifted from the teacher's `verify_memory_region_u64` and
//! `keccak256`/`calldatacopy`/`codecopy`.

use sha3::{Digest, Keccak256};

use crate::{
    interpreter::{Action, Interpreter},
    primitives::Word,
    StatusCode,
};

pub fn mload(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let offset = i.stack.pop()?;
    i.charge_memory_expansion(offset, 32)?;
    let value = i.memory.mload(offset)?;
    i.stack.push(value)?;
    Ok(Action::Continue)
}

pub fn mstore(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let offset = i.stack.pop()?;
    let value = i.stack.pop()?;
    i.charge_memory_expansion(offset, 32)?;
    i.memory.mstore(offset, value)?;
    Ok(Action::Continue)
}

pub fn mstore8(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let offset = i.stack.pop()?;
    let value = i.stack.pop()?;
    i.charge_memory_expansion(offset, 1)?;
    i.memory.mstore8(offset, value.low_u32() as u8)?;
    Ok(Action::Continue)
}

pub fn msize(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(i.memory.len()))?;
    Ok(Action::Continue)
}

pub fn mcopy(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let dst = i.stack.pop()?;
    let src = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    let max_offset = dst.max(src);
    i.charge_memory_expansion(max_offset, size)?;
    i.charge_copy_cost(size, 3)?;
    i.memory.mcopy(dst, src, size)?;
    Ok(Action::Continue)
}

pub fn calldataload(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let index = i.stack.pop()?;
    let input = &i.context.calldata;
    let value = if index > Word::from(input.len()) {
        Word::zero()
    } else {
        let start = index.as_usize();
        let end = (start + 32).min(input.len());
        let mut buf = [0u8; 32];
        buf[..end - start].copy_from_slice(&input[start..end]);
        Word::from_big_endian(&buf)
    };
    i.stack.push(value)?;
    Ok(Action::Continue)
}

pub fn calldatasize(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(i.context.calldata.len()))?;
    Ok(Action::Continue)
}

pub fn calldatacopy(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let dest_offset = i.stack.pop()?;
    let src_offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    i.charge_memory_expansion(dest_offset, size)?;
    i.charge_copy_cost(size, 3)?;
    let data = slice_from(&i.context.calldata, src_offset, size);
    i.memory.set_data(dest_offset, &data, size)?;
    Ok(Action::Continue)
}

pub fn codesize(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(i.bytecode.original_len()))?;
    Ok(Action::Continue)
}

pub fn codecopy(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let dest_offset = i.stack.pop()?;
    let src_offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    i.charge_memory_expansion(dest_offset, size)?;
    i.charge_copy_cost(size, 3)?;
    let code = &i.bytecode.code()[..i.bytecode.original_len()];
    let data = slice_from(code, src_offset, size);
    i.memory.set_data(dest_offset, &data, size)?;
    Ok(Action::Continue)
}

pub fn returndatasize(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(i.return_data.len()))?;
    Ok(Action::Continue)
}

pub fn returndatacopy(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let dest_offset = i.stack.pop()?;
    let src_offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    let return_len = i.return_data.len() as u64;
    if src_offset > Word::from(return_len) || src_offset.as_u64() + size > return_len {
        return Err(StatusCode::InvalidOffset);
    }
    i.charge_memory_expansion(dest_offset, size)?;
    i.charge_copy_cost(size, 3)?;
    let start = src_offset.as_usize();
    let data = i.return_data[start..start + size as usize].to_vec();
    i.memory.set_data(dest_offset, &data, size)?;
    Ok(Action::Continue)
}

pub fn keccak256(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    i.charge_memory_expansion(offset, size)?;
    i.charge_copy_cost(size, 6)?;
    let data = i.memory.get_slice(offset, size)?;
    let digest = Keccak256::digest(&data);
    i.stack.push(Word::from_big_endian(&digest))?;
    Ok(Action::Continue)
}

/// A defensively bounds-checked read of `data[offset..offset+size]`,
/// zero-filling anything past the end, used by every *COPY opcode's source
/// side (calldata, own code, external code).
pub(crate) fn slice_from(data: &[u8], offset: Word, size: u64) -> Vec<u8> {
    if size == 0 {
        return Vec::new();
    }
    let start = if offset > Word::from(data.len()) {
        data.len()
    } else {
        offset.as_usize()
    };
    let end = (start + size as usize).min(data.len());
    data[start..end].to_vec()
}
