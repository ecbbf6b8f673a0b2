//! Context opcodes that need the `Host`: account and block information,
//! environment queries, and SELFDESTRUCT.
//!
//! The cold/warm surcharge pattern (flat warm cost already charged as the
//! opcode's base tier, [`crate::spec::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST`]
//! charged on top when the access list reports the address was cold) is
//! lifted from the teacher's `balance!`/`extcodesize!`/`extcodehash!` macros.

use crate::{
    access_list::AccessStatus,
    host::Host,
    interpreter::{Action, Interpreter},
    primitives::{self, Word},
    spec::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST,
    StatusCode,
};

fn charge_cold_surcharge(i: &mut Interpreter, status: AccessStatus) -> Result<(), StatusCode> {
    if i.spec.has_access_list && status == AccessStatus::Cold {
        i.gas.consume(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }
    Ok(())
}

pub fn address(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(primitives::address_to_word(i.context.address))?;
    Ok(Action::Continue)
}

pub fn balance(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let addr = primitives::word_to_address(i.stack.pop()?);
    let status = host
        .access_account(addr)
        .map_err(|_| StatusCode::Revert)?;
    charge_cold_surcharge(i, status)?;
    let balance = host.get_balance(addr).map_err(|_| StatusCode::Revert)?;
    i.stack.push(balance)?;
    Ok(Action::Continue)
}

pub fn origin(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack
        .push(primitives::address_to_word(host.env().tx.origin))?;
    Ok(Action::Continue)
}

pub fn caller(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(primitives::address_to_word(i.context.caller))?;
    Ok(Action::Continue)
}

pub fn callvalue(i: &mut Interpreter) -> Result<Action, StatusCode> {
    i.stack.push(i.context.value)?;
    Ok(Action::Continue)
}

pub fn gasprice(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(host.env().tx.gas_price)?;
    Ok(Action::Continue)
}

pub fn extcodesize(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let addr = primitives::word_to_address(i.stack.pop()?);
    let status = host
        .access_account(addr)
        .map_err(|_| StatusCode::Revert)?;
    charge_cold_surcharge(i, status)?;
    let size = host.get_code_size(addr).map_err(|_| StatusCode::Revert)?;
    i.stack.push(Word::from(size))?;
    Ok(Action::Continue)
}

pub fn extcodecopy(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let addr = primitives::word_to_address(i.stack.pop()?);
    let dest_offset = i.stack.pop()?;
    let src_offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    let status = host
        .access_account(addr)
        .map_err(|_| StatusCode::Revert)?;
    charge_cold_surcharge(i, status)?;
    i.charge_memory_expansion(dest_offset, size)?;
    i.charge_copy_cost(size, 3)?;
    let code = host.code(addr).map_err(|_| StatusCode::Revert)?;
    let data = super::memory::slice_from(&code, src_offset, size);
    i.memory.set_data(dest_offset, &data, size)?;
    Ok(Action::Continue)
}

pub fn extcodehash(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let addr = primitives::word_to_address(i.stack.pop()?);
    let status = host
        .access_account(addr)
        .map_err(|_| StatusCode::Revert)?;
    charge_cold_surcharge(i, status)?;
    let exists = host.account_exists(addr).map_err(|_| StatusCode::Revert)?;
    let hash = if exists {
        host.get_code_hash(addr).map_err(|_| StatusCode::Revert)?
    } else {
        crate::primitives::B256::zero()
    };
    i.stack.push(Word::from_big_endian(hash.as_bytes()))?;
    Ok(Action::Continue)
}

pub fn blockhash(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let number = i.stack.pop()?;
    let hash = if number > Word::from(u64::MAX) {
        crate::primitives::B256::zero()
    } else {
        host.block_hash(number.as_u64())
            .map_err(|_| StatusCode::Revert)?
    };
    i.stack.push(Word::from_big_endian(hash.as_bytes()))?;
    Ok(Action::Continue)
}

pub fn coinbase(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack
        .push(primitives::address_to_word(host.env().block.coinbase))?;
    Ok(Action::Continue)
}

pub fn timestamp(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(host.env().block.timestamp))?;
    Ok(Action::Continue)
}

pub fn number(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(host.env().block.number))?;
    Ok(Action::Continue)
}

/// Same opcode byte (`0x44`) as DIFFICULTY pre-Merge and PREVRANDAO from
/// Paris on; which `BlockEnv` field it reads is a fork decision, not a
/// runtime one, so the two never coexist for one `Spec`.
pub fn difficulty(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    use crate::spec::Hardfork;
    let value = if i.spec.fork >= Hardfork::Paris {
        Word::from_big_endian(host.env().block.prevrandao.as_bytes())
    } else {
        host.env().block.difficulty
    };
    i.stack.push(value)?;
    Ok(Action::Continue)
}

pub fn gaslimit(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(Word::from(host.env().block.gas_limit))?;
    Ok(Action::Continue)
}

pub fn chainid(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(host.env().tx.chain_id)?;
    Ok(Action::Continue)
}

pub fn selfbalance(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let balance = host
        .get_balance(i.context.address)
        .map_err(|_| StatusCode::Revert)?;
    i.stack.push(balance)?;
    Ok(Action::Continue)
}

pub fn basefee(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(host.env().block.base_fee)?;
    Ok(Action::Continue)
}

pub fn blobhash(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    let index = i.stack.pop()?;
    let hashes = &host.env().tx.blob_hashes;
    let value = if index >= Word::from(hashes.len()) {
        Word::zero()
    } else {
        Word::from_big_endian(hashes[index.as_usize()].as_bytes())
    };
    i.stack.push(value)?;
    Ok(Action::Continue)
}

pub fn blobbasefee(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.stack.push(host.env().block.blob_base_fee)?;
    Ok(Action::Continue)
}

pub fn selfdestruct(i: &mut Interpreter, host: &mut dyn Host) -> Result<Action, StatusCode> {
    i.require_not_static()?;
    let beneficiary = primitives::word_to_address(i.stack.pop()?);

    let status = host
        .access_account(beneficiary)
        .map_err(|_| StatusCode::Revert)?;
    if i.spec.has_access_list && status == AccessStatus::Cold {
        i.gas.consume(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }

    if i.spec.gas_selfdestruct_new_account > 0 {
        let balance = host
            .get_balance(i.context.address)
            .map_err(|_| StatusCode::Revert)?;
        let beneficiary_exists = host
            .account_exists(beneficiary)
            .map_err(|_| StatusCode::Revert)?;
        if !balance.is_zero() && !beneficiary_exists {
            i.gas.consume(i.spec.gas_selfdestruct_new_account)?;
        }
    }

    let is_first_destruction = host
        .selfdestruct(i.context.address, beneficiary)
        .map_err(|_| StatusCode::Revert)?;
    if is_first_destruction && i.spec.fork < crate::spec::Hardfork::London {
        i.gas.add_refund(i.spec.selfdestruct_refund);
    }
    Ok(Action::Halt(StatusCode::Success, bytes::Bytes::new()))
}
