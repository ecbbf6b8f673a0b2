//! CALL/CALLCODE/DELEGATECALL/STATICCALL.
//!
//! Gas composition (cold-access surcharge, 9000 value-transfer surcharge,
//! 25000 new-account surcharge, the 63/64 forwarding rule, and the 2300
//! stipend added back on value transfer) is lifted from the teacher's
//! `do_call!` macro, translated onto a synchronous [`Host::call`]: instead
//! of yielding an interrupt and resuming with the callee's result, the call
//! happens inline and gas is reconciled against `result.gas_left` right
//! after it returns.

use bytes::Bytes;
use ethereum_types::U256;

use crate::{
    access_list::AccessStatus,
    host::{CallInputs, CallKind, Host},
    interpreter::{Action, Interpreter},
    primitives::{self, Word},
    spec::{Hardfork, ADDITIONAL_COLD_ACCOUNT_ACCESS_COST},
    StatusCode,
};

const CALL_VALUE_COST: u64 = 9000;
const CALL_NEW_ACCOUNT_COST: u64 = 25000;
const CALL_STIPEND: u64 = 2300;
const MAX_CALL_DEPTH: u32 = 1024;

pub fn call(i: &mut Interpreter, host: &mut dyn Host, kind: CallKind) -> Result<Action, StatusCode> {
    let has_value_arg = matches!(kind, CallKind::Call | CallKind::CallCode);

    let gas_arg = i.stack.pop()?;
    let addr = primitives::word_to_address(i.stack.pop()?);
    let value = if has_value_arg {
        i.stack.pop()?
    } else {
        Word::zero()
    };
    let in_offset = i.stack.pop()?;
    let in_size = i.stack.pop()?.as_u64();
    let out_offset = i.stack.pop()?;
    let out_size = i.stack.pop()?.as_u64();

    if kind == CallKind::Call && i.context.is_static && !value.is_zero() {
        return Err(StatusCode::Revert);
    }

    let access_status = host.access_account(addr).map_err(|_| StatusCode::Revert)?;
    if i.spec.has_access_list && access_status == AccessStatus::Cold {
        i.gas.consume(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }

    i.charge_memory_expansion(in_offset, in_size)?;
    i.charge_memory_expansion(out_offset, out_size)?;

    let has_value = !value.is_zero();
    let mut surcharge = if has_value { CALL_VALUE_COST } else { 0 };
    if kind == CallKind::Call {
        let target_exists = host.account_exists(addr).map_err(|_| StatusCode::Revert)?;
        if (has_value || i.spec.fork < Hardfork::Spurious) && !target_exists {
            surcharge += CALL_NEW_ACCOUNT_COST;
        }
    }
    i.gas.consume(surcharge)?;

    let requested = if gas_arg > Word::from(u64::MAX) {
        u64::MAX
    } else {
        gas_arg.as_u64()
    };
    let mut msg_gas = if i.spec.fork >= Hardfork::Tangerine {
        let remaining = i.gas.remaining();
        requested.min(remaining - remaining / 64)
    } else {
        if requested > i.gas.remaining() {
            return Err(StatusCode::OutOfGas);
        }
        requested
    };
    if has_value {
        msg_gas += CALL_STIPEND;
        i.gas.grant_stipend(CALL_STIPEND);
    }

    i.return_data = Bytes::new();
    i.stack.push(Word::zero())?; // assume failure; overwritten below on success

    if i.context.depth >= MAX_CALL_DEPTH {
        return Ok(Action::Continue);
    }
    if has_value {
        let sender_balance = host
            .get_balance(i.context.address)
            .map_err(|_| StatusCode::Revert)?;
        if sender_balance < value {
            return Ok(Action::Continue);
        }
    }

    let input_data: Bytes = i.memory.get_slice(in_offset, in_size)?.into();

    let (sender, call_value, is_static) = match kind {
        CallKind::Call | CallKind::CallCode => (i.context.address, value, i.context.is_static),
        CallKind::DelegateCall => (i.context.caller, i.context.value, i.context.is_static),
        CallKind::StaticCall => (i.context.address, U256::zero(), true),
        CallKind::Create | CallKind::Create2 { .. } => unreachable!("not a CALL-family kind"),
    };
    let storage_target = match kind {
        CallKind::CallCode | CallKind::DelegateCall => i.context.address,
        _ => addr,
    };

    let inputs = CallInputs {
        kind,
        is_static,
        depth: i.context.depth + 1,
        gas: msg_gas,
        destination: addr,
        sender,
        storage_target,
        input_data,
        value: call_value,
    };

    let result = host.call(&inputs).map_err(|_| StatusCode::Revert)?;
    i.gas.consume(msg_gas.saturating_sub(result.gas_left))?;
    i.gas.add_refund(result.gas_refund);
    i.return_data = result.output_data.clone();

    let copy_size = out_size.min(result.output_data.len() as u64);
    if copy_size > 0 {
        i.memory
            .set_data(out_offset, &result.output_data[..copy_size as usize], copy_size)?;
    }

    if result.status_code.is_success() {
        *i.stack.peek_mut(0)? = Word::one();
    }
    Ok(Action::Continue)
}
