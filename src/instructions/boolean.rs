//! Comparison and bitwise-logic opcodes.

use crate::{
    interpreter::{Action, Interpreter},
    primitives::{self, Word},
    StatusCode,
};

fn push_bool(i: &mut Interpreter, v: bool) -> Result<Action, StatusCode> {
    i.stack.push(if v { Word::one() } else { Word::zero() })?;
    Ok(Action::Continue)
}

pub fn lt(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    push_bool(i, a < b)
}

pub fn gt(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    push_bool(i, a > b)
}

pub fn slt(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    push_bool(i, primitives::signed_lt(a, b))
}

pub fn sgt(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    push_bool(i, primitives::signed_gt(a, b))
}

pub fn eq(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    push_bool(i, a == b)
}

pub fn iszero(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let a = i.stack.pop()?;
    push_bool(i, a.is_zero())
}

pub fn and(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a & b)?;
    Ok(Action::Continue)
}

pub fn or(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a | b)?;
    Ok(Action::Continue)
}

pub fn xor(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (a, b) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(a ^ b)?;
    Ok(Action::Continue)
}

pub fn not(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let a = i.stack.pop()?;
    i.stack.push(!a)?;
    Ok(Action::Continue)
}
