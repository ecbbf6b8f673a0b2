//! LOG0..LOG4.

use crate::{
    host::Host,
    interpreter::{Action, Interpreter},
    StatusCode,
};

pub fn log(i: &mut Interpreter, host: &mut dyn Host, num_topics: usize) -> Result<Action, StatusCode> {
    i.require_not_static()?;
    let offset = i.stack.pop()?;
    let size = i.stack.pop()?.as_u64();
    let mut topics = Vec::with_capacity(num_topics);
    for _ in 0..num_topics {
        topics.push(i.stack.pop()?);
    }
    i.charge_memory_expansion(offset, size)?;
    i.gas.consume(8 * size)?;
    let data = i.memory.get_slice(offset, size)?;
    host.log(i.context.address, data.into(), &topics)
        .map_err(|_| StatusCode::Revert)?;
    Ok(Action::Continue)
}
