//! The fetch-decode-execute loop for a single call frame.
//!
//! Grounded on the teacher's `AnalyzedCode::execute_resumable`/
//! `check_requirements`: charge the opcode's flat tier, check stack
//! height, dispatch, repeat. The teacher suspends this loop through a
//! generator so a `Host` can be awaited mid-instruction; this version calls
//! `Host` methods directly and returns `Action::Halt` to stop, since there
//! is no coroutine machinery to resume into.

use bytes::Bytes;
use ethereum_types::Address;
use ethereum_types::U256;

use crate::{
    bytecode::AnalyzedBytecode,
    error::StatusCode,
    gas::Gas,
    host::Host,
    instructions::{arithmetic, bitwise, boolean, call, create, log, memory as mem_ops, storage, system},
    memory::Memory,
    opcode::OpCode,
    primitives::{ceil_div, Word},
    spec::Spec,
    stack::Stack,
    tracer::Tracer,
};

/// What a handler wants the dispatch loop to do next.
pub enum Action {
    Continue,
    Jump(usize),
    Halt(StatusCode, Bytes),
}

/// The identity and calling convention of the frame currently executing,
/// as distinct from the interpreter's internal execution state.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// `ADDRESS` / whose storage SLOAD and SSTORE touch.
    pub address: Address,
    /// `CALLER`.
    pub caller: Address,
    /// The address the running bytecode was fetched from — differs from
    /// `address` only for DELEGATECALL and CALLCODE.
    pub code_address: Address,
    pub value: U256,
    pub calldata: Bytes,
    pub is_static: bool,
    pub depth: u32,
}

pub struct Interpreter<'a> {
    pub stack: Stack,
    pub memory: Memory,
    pub gas: Gas,
    pub pc: usize,
    pub bytecode: &'a AnalyzedBytecode,
    pub context: CallContext,
    pub spec: &'a Spec,
    /// The most recent child call's output, visible to RETURNDATASIZE/COPY.
    pub return_data: Bytes,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        bytecode: &'a AnalyzedBytecode,
        context: CallContext,
        spec: &'a Spec,
        gas_limit: u64,
    ) -> Self {
        Self {
            stack: Stack::new(),
            memory: Memory::new(),
            gas: Gas::new(gas_limit),
            pc: 0,
            bytecode,
            context,
            spec,
            return_data: Bytes::new(),
        }
    }

    fn current_op(&self) -> OpCode {
        OpCode(self.bytecode.code()[self.pc])
    }

    /// Runs until the frame halts (STOP/RETURN/REVERT/INVALID/error/ran off
    /// the end) and returns the final status and output bytes.
    pub fn run(&mut self, host: &mut dyn Host, tracer: &mut dyn Tracer) -> (StatusCode, Bytes) {
        tracer.on_frame_start(self.context.depth, self.context.address, self.bytecode.code());
        loop {
            if self.pc >= self.bytecode.code().len() {
                let result = (StatusCode::Success, Bytes::new());
                tracer.on_frame_end(self.context.depth, result.0, self.gas.remaining());
                return result;
            }
            let op = self.current_op();
            tracer.on_step(self.pc, op, self.gas.remaining(), self.stack_snapshot());

            match self.step(op, host) {
                Ok(Action::Continue) => {
                    self.pc += 1 + op.push_bytes();
                }
                Ok(Action::Jump(dest)) => {
                    self.pc = dest;
                }
                Ok(Action::Halt(status, output)) => {
                    tracer.on_frame_end(self.context.depth, status, self.gas.remaining());
                    return (status, output);
                }
                Err(status) => {
                    tracer.on_frame_end(self.context.depth, status, self.gas.remaining());
                    return (status, Bytes::new());
                }
            }
        }
    }

    fn stack_snapshot(&self) -> &[Word] {
        self.stack.as_slice()
    }

    fn step(&mut self, op: OpCode, host: &mut dyn Host) -> Result<Action, StatusCode> {
        self.charge_base_cost(op)?;
        self.check_stack_height(op)?;
        self.check_fork_gate(op)?;

        use OpCode as Op;
        match op {
            Op::STOP => Ok(Action::Halt(StatusCode::Success, Bytes::new())),

            Op::ADD => arithmetic::add(self),
            Op::MUL => arithmetic::mul(self),
            Op::SUB => arithmetic::sub(self),
            Op::DIV => arithmetic::div(self),
            Op::SDIV => arithmetic::sdiv(self),
            Op::MOD => arithmetic::modulo(self),
            Op::SMOD => arithmetic::smod(self),
            Op::ADDMOD => arithmetic::addmod(self),
            Op::MULMOD => arithmetic::mulmod(self),
            Op::EXP => arithmetic::exp(self),
            Op::SIGNEXTEND => arithmetic::signextend(self),

            Op::LT => boolean::lt(self),
            Op::GT => boolean::gt(self),
            Op::SLT => boolean::slt(self),
            Op::SGT => boolean::sgt(self),
            Op::EQ => boolean::eq(self),
            Op::ISZERO => boolean::iszero(self),
            Op::AND => boolean::and(self),
            Op::OR => boolean::or(self),
            Op::XOR => boolean::xor(self),
            Op::NOT => boolean::not(self),
            Op::BYTE => bitwise::byte(self),
            Op::SHL => bitwise::shl(self),
            Op::SHR => bitwise::shr(self),
            Op::SAR => bitwise::sar(self),

            Op::KECCAK256 => mem_ops::keccak256(self),

            Op::ADDRESS => system::address(self),
            Op::BALANCE => system::balance(self, host),
            Op::ORIGIN => system::origin(self, host),
            Op::CALLER => system::caller(self),
            Op::CALLVALUE => system::callvalue(self),
            Op::CALLDATALOAD => mem_ops::calldataload(self),
            Op::CALLDATASIZE => mem_ops::calldatasize(self),
            Op::CALLDATACOPY => mem_ops::calldatacopy(self),
            Op::CODESIZE => mem_ops::codesize(self),
            Op::CODECOPY => mem_ops::codecopy(self),
            Op::GASPRICE => system::gasprice(self, host),
            Op::EXTCODESIZE => system::extcodesize(self, host),
            Op::EXTCODECOPY => system::extcodecopy(self, host),
            Op::RETURNDATASIZE => mem_ops::returndatasize(self),
            Op::RETURNDATACOPY => mem_ops::returndatacopy(self),
            Op::EXTCODEHASH => system::extcodehash(self, host),

            Op::BLOCKHASH => system::blockhash(self, host),
            Op::COINBASE => system::coinbase(self, host),
            Op::TIMESTAMP => system::timestamp(self, host),
            Op::NUMBER => system::number(self, host),
            Op::DIFFICULTY => system::difficulty(self, host),
            Op::GASLIMIT => system::gaslimit(self, host),
            Op::CHAINID => system::chainid(self, host),
            Op::SELFBALANCE => system::selfbalance(self, host),
            Op::BASEFEE => system::basefee(self, host),
            Op::BLOBHASH => system::blobhash(self, host),
            Op::BLOBBASEFEE => system::blobbasefee(self, host),

            Op::POP => {
                self.stack.pop()?;
                Ok(Action::Continue)
            }
            Op::MLOAD => mem_ops::mload(self),
            Op::MSTORE => mem_ops::mstore(self),
            Op::MSTORE8 => mem_ops::mstore8(self),
            Op::SLOAD => storage::sload(self, host),
            Op::SSTORE => storage::sstore(self, host),
            Op::JUMP => self.op_jump(),
            Op::JUMPI => self.op_jumpi(),
            Op::PC => {
                self.stack.push(Word::from(self.pc))?;
                Ok(Action::Continue)
            }
            Op::MSIZE => mem_ops::msize(self),
            Op::GAS => {
                self.stack.push(Word::from(self.gas.remaining()))?;
                Ok(Action::Continue)
            }
            Op::JUMPDEST => Ok(Action::Continue),
            Op::TLOAD => storage::tload(self, host),
            Op::TSTORE => storage::tstore(self, host),
            Op::MCOPY => mem_ops::mcopy(self),
            Op::PUSH0 => {
                self.stack.push(Word::zero())?;
                Ok(Action::Continue)
            }

            op if op.push_bytes() > 0 => self.op_push(op.push_bytes()),
            op if op.dup_height().is_some() => {
                self.stack.dup(op.dup_height().unwrap())?;
                Ok(Action::Continue)
            }
            op if op.swap_height().is_some() => {
                self.stack.swap(op.swap_height().unwrap())?;
                Ok(Action::Continue)
            }
            op if op.log_topics().is_some() => log::log(self, host, op.log_topics().unwrap()),

            Op::CREATE => create::create(self, host, false),
            Op::CALL => call::call(self, host, crate::host::CallKind::Call),
            Op::CALLCODE => call::call(self, host, crate::host::CallKind::CallCode),
            Op::RETURN => self.op_return(false),
            Op::DELEGATECALL => call::call(self, host, crate::host::CallKind::DelegateCall),
            Op::CREATE2 => create::create(self, host, true),
            Op::STATICCALL => call::call(self, host, crate::host::CallKind::StaticCall),
            Op::REVERT => self.op_return(true),
            Op::INVALID => Err(StatusCode::InvalidOpcode),
            Op::SELFDESTRUCT => system::selfdestruct(self, host),

            _ => Err(StatusCode::InvalidOpcode),
        }
    }

    fn op_push(&mut self, n: usize) -> Result<Action, StatusCode> {
        let code = self.bytecode.code();
        let start = self.pc + 1;
        let end = (start + n).min(code.len());
        let mut buf = [0u8; 32];
        buf[32 - n..32 - n + (end - start)].copy_from_slice(&code[start..end]);
        self.stack.push(Word::from_big_endian(&buf))?;
        Ok(Action::Continue)
    }

    fn op_jump(&mut self) -> Result<Action, StatusCode> {
        let dst = self.stack.pop()?;
        self.jump_to(dst)
    }

    fn op_jumpi(&mut self) -> Result<Action, StatusCode> {
        let dst = self.stack.pop()?;
        let cond = self.stack.pop()?;
        if cond.is_zero() {
            Ok(Action::Continue)
        } else {
            self.jump_to(dst)
        }
    }

    fn jump_to(&mut self, dst: Word) -> Result<Action, StatusCode> {
        if dst > Word::from(u64::MAX) {
            return Err(StatusCode::InvalidJump);
        }
        let dst = dst.as_u64();
        if !self.bytecode.is_valid_jump_dest(dst) {
            return Err(StatusCode::InvalidJump);
        }
        Ok(Action::Jump(dst as usize))
    }

    fn op_return(&mut self, is_revert: bool) -> Result<Action, StatusCode> {
        let offset = self.stack.pop()?;
        let size = self.stack.pop()?;
        let size = size.as_u64();
        self.charge_memory_expansion(offset, size)?;
        let data = self.memory.get_slice(offset, size)?;
        let status = if is_revert {
            StatusCode::Revert
        } else {
            StatusCode::Success
        };
        Ok(Action::Halt(status, data.into()))
    }

    /// Errors if the current context is static and `write` is being
    /// attempted — the shared guard every state-mutating opcode calls first.
    pub fn require_not_static(&self) -> Result<(), StatusCode> {
        if self.context.is_static {
            Err(StatusCode::Revert)
        } else {
            Ok(())
        }
    }

    pub fn charge_memory_expansion(&mut self, offset: Word, size: u64) -> Result<(), StatusCode> {
        if size == 0 {
            return Ok(());
        }
        let words = Memory::words_needed(
            if offset > Word::from(u64::MAX) {
                return Err(StatusCode::OutOfGas);
            } else {
                offset.as_u64()
            },
            size,
        )
        .ok_or(StatusCode::OutOfGas)?;
        self.gas.consume_memory_expansion(words)
    }

    /// `3` gas per 32-byte word, the tier shared by every *COPY opcode and
    /// KECCAK256 (which instead charges 6/word, passed in as `per_word`).
    pub fn charge_copy_cost(&mut self, size: u64, per_word: u64) -> Result<(), StatusCode> {
        let words = ceil_div(size, 32);
        self.gas.consume(words * per_word)
    }

    fn charge_base_cost(&mut self, op: OpCode) -> Result<(), StatusCode> {
        let cost = base_cost(op, self.spec);
        self.gas.consume(cost)
    }

    fn check_stack_height(&self, op: OpCode) -> Result<(), StatusCode> {
        let (required, change) = stack_requirements(op);
        if self.stack.len() < required {
            return Err(StatusCode::StackUnderflow);
        }
        let after = self.stack.len() as i64 + change as i64;
        if after > Stack::limit() as i64 {
            return Err(StatusCode::StackOverflow);
        }
        Ok(())
    }

    /// Rejects opcodes whose introducing fork hasn't activated yet. Bytes
    /// not yet assigned any meaning at all are already caught by the
    /// catch-all arm in `step`; this only covers bytes that mean something
    /// different (or nothing) on an earlier `Spec`.
    fn check_fork_gate(&self, op: OpCode) -> Result<(), StatusCode> {
        use OpCode as Op;
        let supported = match op {
            Op::DELEGATECALL => self.spec.has_delegate_call,
            Op::CREATE2 => self.spec.has_create2,
            Op::REVERT => self.spec.has_revert,
            Op::STATICCALL => self.spec.has_static_call,
            Op::SHL | Op::SHR | Op::SAR => self.spec.has_bitwise_shifting,
            Op::CHAINID => self.spec.has_chain_id,
            Op::SELFBALANCE => self.spec.has_self_balance,
            Op::EXTCODEHASH => self.spec.has_ext_code_hash,
            Op::BASEFEE => self.spec.has_base_fee,
            Op::PUSH0 => self.spec.has_push0,
            Op::TLOAD | Op::TSTORE => self.spec.has_transient_storage,
            Op::MCOPY => self.spec.has_mcopy,
            Op::BLOBBASEFEE | Op::BLOBHASH => self.spec.has_blob_base_fee,
            _ => true,
        };
        if supported {
            Ok(())
        } else {
            Err(StatusCode::InvalidOpcode)
        }
    }
}

/// Flat, statically-known gas tier for `op`, per the active fork. Dynamic
/// components (memory growth, cold-access surcharges, per-byte costs) are
/// charged separately by the handler.
fn base_cost(op: OpCode, spec: &Spec) -> u64 {
    use crate::spec::{GAS_BASE, GAS_HIGH, GAS_JUMPDEST, GAS_LOW, GAS_MID, GAS_VERYLOW, GAS_ZERO};
    match op {
        OpCode::STOP | OpCode::RETURN | OpCode::REVERT | OpCode::INVALID => GAS_ZERO,
        OpCode::ADD | OpCode::SUB | OpCode::LT | OpCode::GT | OpCode::SLT | OpCode::SGT
        | OpCode::EQ | OpCode::ISZERO | OpCode::AND | OpCode::OR | OpCode::XOR | OpCode::NOT
        | OpCode::BYTE | OpCode::SHL | OpCode::SHR | OpCode::SAR | OpCode::CALLDATALOAD
        | OpCode::CALLDATASIZE | OpCode::CODESIZE | OpCode::GASPRICE | OpCode::COINBASE
        | OpCode::TIMESTAMP | OpCode::NUMBER | OpCode::DIFFICULTY | OpCode::GASLIMIT
        | OpCode::RETURNDATASIZE | OpCode::CHAINID | OpCode::BASEFEE | OpCode::BLOBBASEFEE
        | OpCode::BLOBHASH | OpCode::PUSH0 | OpCode::ADDRESS | OpCode::ORIGIN | OpCode::CALLER
        | OpCode::CALLVALUE | OpCode::POP | OpCode::PC | OpCode::MSIZE | OpCode::GAS
        | OpCode::MLOAD | OpCode::MSTORE | OpCode::MSTORE8 => {
            if op.push_bytes() > 0 {
                GAS_VERYLOW
            } else {
                match op {
                    OpCode::ISZERO | OpCode::NOT | OpCode::POP | OpCode::PC | OpCode::MSIZE
                    | OpCode::GAS | OpCode::CALLDATASIZE | OpCode::CODESIZE | OpCode::GASPRICE
                    | OpCode::COINBASE | OpCode::TIMESTAMP | OpCode::NUMBER
                    | OpCode::DIFFICULTY | OpCode::GASLIMIT | OpCode::RETURNDATASIZE
                    | OpCode::CHAINID | OpCode::BASEFEE | OpCode::BLOBBASEFEE
                    | OpCode::BLOBHASH | OpCode::ADDRESS | OpCode::ORIGIN | OpCode::CALLER
                    | OpCode::CALLVALUE => GAS_BASE,
                    _ => GAS_VERYLOW,
                }
            }
        }
        OpCode::MUL | OpCode::DIV | OpCode::SDIV | OpCode::MOD | OpCode::SMOD
        | OpCode::SIGNEXTEND => GAS_LOW,
        OpCode::ADDMOD | OpCode::MULMOD | OpCode::JUMP => GAS_MID,
        OpCode::JUMPI => GAS_HIGH,
        OpCode::JUMPDEST => GAS_JUMPDEST,
        OpCode::EXP => GAS_HIGH,
        OpCode::KECCAK256 => 30,
        OpCode::CALLDATACOPY | OpCode::CODECOPY | OpCode::RETURNDATACOPY | OpCode::MCOPY => {
            GAS_VERYLOW
        }
        OpCode::BALANCE => spec.gas_balance,
        OpCode::EXTCODESIZE => spec.gas_ext_code,
        OpCode::EXTCODECOPY => spec.gas_ext_code_copy,
        OpCode::EXTCODEHASH => spec.gas_ext_code_hash,
        OpCode::SLOAD => spec.gas_sload,
        OpCode::SSTORE => GAS_ZERO,
        OpCode::SELFBALANCE => {
            if spec.has_self_balance {
                5
            } else {
                0
            }
        }
        OpCode::BLOCKHASH => 20,
        OpCode::LOG0 | OpCode::LOG1 | OpCode::LOG2 | OpCode::LOG3 | OpCode::LOG4 => {
            375 * (1 + op.log_topics().unwrap() as u64)
        }
        OpCode::CREATE => 32000,
        OpCode::CREATE2 => 32000,
        OpCode::CALL | OpCode::CALLCODE | OpCode::DELEGATECALL | OpCode::STATICCALL => {
            spec.gas_call
        }
        OpCode::SELFDESTRUCT => spec.gas_selfdestruct,
        OpCode::TLOAD | OpCode::TSTORE => 100,
        _ if op.push_bytes() > 0 => GAS_VERYLOW,
        _ if op.dup_height().is_some() || op.swap_height().is_some() => GAS_VERYLOW,
        _ => GAS_ZERO,
    }
}

/// `(min stack height required, net stack height change)` for `op`.
fn stack_requirements(op: OpCode) -> (usize, i32) {
    if op.push_bytes() > 0 {
        return (0, 1);
    }
    if let Some(n) = op.dup_height() {
        return (n, 1);
    }
    if let Some(n) = op.swap_height() {
        return (n + 1, 0);
    }
    if let Some(n) = op.log_topics() {
        return (2 + n, -(2 + n as i32));
    }
    match op {
        OpCode::STOP | OpCode::JUMPDEST | OpCode::INVALID => (0, 0),
        OpCode::ADD | OpCode::MUL | OpCode::SUB | OpCode::DIV | OpCode::SDIV | OpCode::MOD
        | OpCode::SMOD | OpCode::EXP | OpCode::SIGNEXTEND | OpCode::LT | OpCode::GT
        | OpCode::SLT | OpCode::SGT | OpCode::EQ | OpCode::AND | OpCode::OR | OpCode::XOR
        | OpCode::BYTE | OpCode::SHL | OpCode::SHR | OpCode::SAR | OpCode::KECCAK256 => (2, -1),
        OpCode::ADDMOD | OpCode::MULMOD => (3, -2),
        OpCode::ISZERO | OpCode::NOT | OpCode::BALANCE | OpCode::CALLDATALOAD
        | OpCode::EXTCODESIZE | OpCode::EXTCODEHASH | OpCode::SLOAD | OpCode::MLOAD
        | OpCode::BLOCKHASH | OpCode::BLOBHASH => (1, 0),
        OpCode::ADDRESS | OpCode::ORIGIN | OpCode::CALLER | OpCode::CALLVALUE
        | OpCode::CALLDATASIZE | OpCode::CODESIZE | OpCode::GASPRICE
        | OpCode::RETURNDATASIZE | OpCode::COINBASE | OpCode::TIMESTAMP | OpCode::NUMBER
        | OpCode::DIFFICULTY | OpCode::GASLIMIT | OpCode::CHAINID | OpCode::SELFBALANCE
        | OpCode::BASEFEE | OpCode::BLOBBASEFEE | OpCode::PC | OpCode::MSIZE | OpCode::GAS
        | OpCode::PUSH0 => (0, 1),
        OpCode::POP | OpCode::JUMP | OpCode::SELFDESTRUCT => (1, -1),
        OpCode::TLOAD => (1, 0),
        OpCode::MSTORE | OpCode::MSTORE8 | OpCode::SSTORE | OpCode::JUMPI | OpCode::TSTORE => {
            (2, -2)
        }
        OpCode::CALLDATACOPY | OpCode::CODECOPY | OpCode::RETURNDATACOPY | OpCode::MCOPY => {
            (3, -3)
        }
        OpCode::EXTCODECOPY => (4, -4),
        OpCode::CREATE => (3, -2),
        OpCode::CREATE2 => (4, -3),
        OpCode::CALL | OpCode::CALLCODE => (7, -6),
        OpCode::DELEGATECALL | OpCode::STATICCALL => (6, -5),
        OpCode::RETURN | OpCode::REVERT => (2, -2),
        _ => (0, 0),
    }
}
