//! Shift and byte-extraction opcodes.

use crate::{
    interpreter::{Action, Interpreter},
    primitives::{self, Word},
    StatusCode,
};

pub fn byte(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (index, value) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::byte(index, value))?;
    Ok(Action::Continue)
}

pub fn shl(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (shift, value) = (i.stack.pop()?, i.stack.pop()?);
    let result = if shift >= Word::from(256) {
        Word::zero()
    } else {
        value << shift.as_usize()
    };
    i.stack.push(result)?;
    Ok(Action::Continue)
}

pub fn shr(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (shift, value) = (i.stack.pop()?, i.stack.pop()?);
    let result = if shift >= Word::from(256) {
        Word::zero()
    } else {
        value >> shift.as_usize()
    };
    i.stack.push(result)?;
    Ok(Action::Continue)
}

pub fn sar(i: &mut Interpreter) -> Result<Action, StatusCode> {
    let (shift, value) = (i.stack.pop()?, i.stack.pop()?);
    i.stack.push(primitives::signed_shr(value, shift))?;
    Ok(Action::Continue)
}
