//! Boundary behaviors and invariants called out for the arithmetic, bitwise,
//! jump, and stack components.

use ethereum_types::U256;
use revolver_evm::{
    opcode::OpCode,
    primitives::{min_i256, negate},
    util::{Bytecode, EvmTester},
    Hardfork, StatusCode,
};

#[test]
fn sdiv_min_i256_by_minus_one_saturates() {
    let min = min_i256();
    let minus_one = negate(U256::one());

    EvmTester::new()
        .code(Bytecode::new().pushv(minus_one).pushv(min).opcode(OpCode::SDIV).ret_top())
        .status(StatusCode::Success)
        .output_value(min)
        .check();
}

#[test]
fn div_mod_by_zero_yield_zero() {
    EvmTester::new()
        .code(Bytecode::new().pushv(0).pushv(7).opcode(OpCode::DIV).ret_top())
        .status(StatusCode::Success)
        .output_value(0)
        .check();

    EvmTester::new()
        .code(Bytecode::new().pushv(0).pushv(7).opcode(OpCode::MOD).ret_top())
        .status(StatusCode::Success)
        .output_value(0)
        .check();
}

#[test]
fn signextend_is_a_noop_at_and_past_byte_31() {
    EvmTester::new()
        .code(Bytecode::new().pushv(0x7f).pushv(31).opcode(OpCode::SIGNEXTEND).ret_top())
        .status(StatusCode::Success)
        .output_value(0x7f)
        .check();

    EvmTester::new()
        .code(Bytecode::new().pushv(0x7f).pushv(100).opcode(OpCode::SIGNEXTEND).ret_top())
        .status(StatusCode::Success)
        .output_value(0x7f)
        .check();
}

#[test]
fn shl_and_shr_past_256_yield_zero() {
    EvmTester::new()
        .revision(Hardfork::Constantinople)
        .code(Bytecode::new().pushv(1).pushv(256).opcode(OpCode::SHL).ret_top())
        .status(StatusCode::Success)
        .output_value(0)
        .check();

    EvmTester::new()
        .revision(Hardfork::Constantinople)
        .code(Bytecode::new().pushv(1).pushv(256).opcode(OpCode::SHR).ret_top())
        .status(StatusCode::Success)
        .output_value(0)
        .check();
}

#[test]
fn sar_past_256_preserves_sign() {
    EvmTester::new()
        .revision(Hardfork::Constantinople)
        .code(Bytecode::new().pushv(1).pushv(256).opcode(OpCode::SAR).ret_top())
        .status(StatusCode::Success)
        .output_value(0)
        .check();

    EvmTester::new()
        .revision(Hardfork::Constantinople)
        .code(
            Bytecode::new()
                .pushv(U256::max_value())
                .pushv(256)
                .opcode(OpCode::SAR)
                .ret_top(),
        )
        .status(StatusCode::Success)
        .output_value(U256::max_value())
        .check();
}

#[test]
fn exp_byte_cost_scales_with_exponent_length_and_fork() {
    EvmTester::new()
        .revision(Hardfork::Frontier)
        .code(
            Bytecode::new()
                .pushv(0xff)
                .pushv(2)
                .opcode(OpCode::EXP)
                .opcode(OpCode::STOP),
        )
        .status(StatusCode::Success)
        .gas_used(26) // 2*PUSH1(3) + EXP base(10) + 1 byte * 10/byte (pre-Spurious Dragon)
        .check();

    EvmTester::new()
        .revision(Hardfork::Berlin)
        .code(
            Bytecode::new()
                .pushv(0xff)
                .pushv(2)
                .opcode(OpCode::EXP)
                .opcode(OpCode::STOP),
        )
        .status(StatusCode::Success)
        .gas_used(66) // 2*PUSH1(3) + EXP base(10) + 1 byte * 50/byte (post-EIP-160)
        .check();

    EvmTester::new()
        .revision(Hardfork::Berlin)
        .code(
            Bytecode::new()
                .pushv(0)
                .pushv(2)
                .opcode(OpCode::EXP)
                .opcode(OpCode::STOP),
        )
        .status(StatusCode::Success)
        .gas_used(16) // zero exponent: base cost only
        .check();
}

#[test]
fn jump_into_a_push_immediate_is_invalid_even_if_the_byte_value_is_0x5b() {
    // PUSH1 5; JUMP; PUSH2 0x005b; JUMPDEST; STOP
    // Target 5 lands on PUSH2's low immediate byte, which happens to equal
    // the JUMPDEST opcode but is data, not an instruction boundary.
    let code = vec![
        OpCode::PUSH1.to_u8(),
        5,
        OpCode::JUMP.to_u8(),
        OpCode::PUSH2.to_u8(),
        0x00,
        0x5b,
        OpCode::JUMPDEST.to_u8(),
        OpCode::STOP.to_u8(),
    ];

    EvmTester::new().code(code).status(StatusCode::InvalidJump).check();

    let code = vec![
        OpCode::PUSH1.to_u8(),
        6,
        OpCode::JUMP.to_u8(),
        OpCode::PUSH2.to_u8(),
        0x00,
        0x5b,
        OpCode::JUMPDEST.to_u8(),
        OpCode::STOP.to_u8(),
    ];

    EvmTester::new().code(code).status(StatusCode::Success).check();
}

#[test]
fn stack_overflows_past_1024_entries() {
    let code = (1024 * Bytecode::new().pushv(1)).pushv(1);

    EvmTester::new().code(code).status(StatusCode::StackOverflow).check();
}

#[test]
fn mstore_mload_round_trips_big_endian() {
    EvmTester::new()
        .code(
            Bytecode::new()
                .pushv(0x0102_0304u64)
                .mstore(0)
                .pushv(0)
                .opcode(OpCode::MLOAD)
                .ret_top(),
        )
        .status(StatusCode::Success)
        .output_value(0x0102_0304u64)
        .check();
}

#[test]
fn reverted_sstore_leaves_storage_untouched() {
    let callee = {
        let mut bytes = [0u8; 20];
        bytes[19] = 0x42;
        ethereum_types::Address::from(bytes)
    };

    EvmTester::new()
        .destination(callee)
        .code(
            Bytecode::new()
                .sstore(1, 0x99)
                .pushv(0)
                .pushv(0)
                .opcode(OpCode::REVERT),
        )
        .status(StatusCode::Revert)
        .inspect_host(move |host, _| {
            use revolver_evm::Host;
            assert!(host.get_storage(callee, U256::one()).unwrap().is_zero());
        })
        .check();
}
