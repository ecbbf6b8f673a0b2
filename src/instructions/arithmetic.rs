//! Arithmetic opcodes.
//!
//! The teacher dispatches these onto its vendored `i256` crate; this crate
//! carries its own signed helpers in [`crate::primitives`] instead (see
//! that module's doc comment), so the bodies here are thin pops/pushes
//! around those helpers.

use crate::{
    interpreter::{Action, Interpreter},
    primitives,
    StatusCode,
};

pub fn add(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a.overflowing_add(b).0)?;
    Ok(Action::Continue)
}

pub fn mul(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a.overflowing_mul(b).0)?;
    Ok(Action::Continue)
}

pub fn sub(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a.overflowing_sub(b).0)?;
    Ok(Action::Continue)
}

pub fn div(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(if b.is_zero() { b } else { a / b })?;
    Ok(Action::Continue)
}

pub fn sdiv(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::signed_div(a, b))?;
    Ok(Action::Continue)
}

pub fn modulo(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(if b.is_zero() { b } else { a % b })?;
    Ok(Action::Continue)
}

pub fn smod(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::signed_mod(a, b))?;
    Ok(Action::Continue)
}

pub fn addmod(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b, n) = (i.stack.pop()?, i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::addmod(a, b, n))?;
    Ok(Action::Continue)
}

pub fn mulmod(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b, n) = (i.stack.pop()?, i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::mulmod(a, b, n))?;
    Ok(Action::Continue)
}

/// The `10` base plus `50`/byte of the exponent, per EIP-160; the `50`/byte
/// component is charged here, the flat `10` by the dispatch loop.
pub fn exp(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (base, power) = (i.stack.pop()?, i.stack.pop()?);
    let byte_cost = i.spec.gas_expbyte * primitives::byte_len(power);
    i.gas.consume(byte_cost)?;
    i.stack.push(primitives::exp(base, power))?;
    Ok(Action::Continue)
}

pub fn signextend(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (byte_index, value) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::signextend(byte_index, value))?;
    Ok(Action::Continue)
}
