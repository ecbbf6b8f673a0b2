//! CREATE/CREATE2.
//!
//! Gas composition (CREATE2's 6 gas/word salt cost, the 63/64 forwarding
//! rule from Tangerine on vs. forwarding everything before it, the
//! depth/balance pre-check) is lifted from the teacher's `do_create!`
//! macro. EIP-3860's init-code size cap and 2 gas/word cost are this
//! crate's Shanghai-era addition, gated on the same
//! `create_contract_init_size_limit` flag that also bounds the size.

use bytes::Bytes;

use crate::{
    host::{CallInputs, CallKind, Host},
    interpreter::{Action, Interpreter},
    primitives::{ceil_div, Word},
    spec::Hardfork,
    StatusCode,
};

const MAX_CALL_DEPTH: u32 = 1024;

pub fn create(i: &mut Interpreter, host: &mut dyn Host, is_create2: bool) -> Result<Action, StatusCode> {
    i.require_not_static()?;

    let endowment = i.stack.pop()?;
    let init_code_offset = i.stack.pop()?;
    let init_code_size = i.stack.pop()?.as_u64();

    if let Some(limit) = i.spec.create_contract_init_size_limit {
        if init_code_size as usize > limit {
            return Err(StatusCode::OutOfGas);
        }
        i.gas.consume(2 * ceil_div(init_code_size, 32))?;
    }

    i.charge_memory_expansion(init_code_offset, init_code_size)?;

    let kind = if is_create2 {
        let salt = i.stack.pop()?;
        i.gas.consume(ceil_div(init_code_size, 32) * 6)?;
        CallKind::Create2 { salt }
    } else {
        CallKind::Create
    };

    i.stack.push(Word::zero())?; // assume failure; overwritten below on success
    i.return_data = Bytes::new();

    if i.context.depth >= MAX_CALL_DEPTH {
        return Ok(Action::Continue);
    }
    if !endowment.is_zero() {
        let sender_balance = host
            .get_balance(i.context.address)
            .map_err(|_| StatusCode::Revert)?;
        if sender_balance < endowment {
            return Ok(Action::Continue);
        }
    }

    let init_code: Bytes = i.memory.get_slice(init_code_offset, init_code_size)?.into();

    let msg_gas = if i.spec.fork >= Hardfork::Tangerine {
        let remaining = i.gas.remaining();
        remaining - remaining / 64
    } else {
        i.gas.remaining()
    };

    let inputs = CallInputs {
        kind,
        is_static: false,
        depth: i.context.depth + 1,
        gas: msg_gas,
        destination: ethereum_types::Address::zero(),
        sender: i.context.address,
        storage_target: ethereum_types::Address::zero(),
        input_data: init_code,
        value: endowment,
    };

    let result = host.call(&inputs).map_err(|_| StatusCode::Revert)?;
    i.gas.consume(msg_gas.saturating_sub(result.gas_left))?;
    i.gas.add_refund(result.gas_refund);
    i.return_data = result.output_data;

    if result.status_code.is_success() {
        if let Some(addr) = result.create_address {
            *i.stack.peek_mut(0)? = crate::primitives::address_to_word(addr);
        }
    }
    Ok(Action::Continue)
}
