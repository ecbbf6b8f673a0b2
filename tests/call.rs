use ethereum_types::{Address, U256};
use hex_literal::hex;
use revolver_evm::{
    host::CallKind,
    opcode::OpCode,
    primitives::address_to_word,
    util::{Bytecode, CallInstruction, EvmTester, MockedHost},
    Hardfork, Host, Spec, StatusCode,
};

fn addr(last_byte: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = last_byte;
    Address::from(bytes)
}

#[test]
fn call_returns_callee_output() {
    let callee = addr(0xaa);
    let callee_code = Bytecode::new().pushv(0x0a0bu32).mstore(0).ret(30, 2);

    EvmTester::new()
        .apply_host_fn(move |host, _| {
            host.set_code(callee, callee_code.clone().build()).unwrap();
        })
        .code(
            Bytecode::new()
                .append_bc(
                    CallInstruction::call(address_to_word(callee))
                        .gas(10000)
                        .value(0)
                        .input(0, 0)
                        .output(0, 2),
                )
                .ret(0, 2),
        )
        .gas(100000)
        .status(StatusCode::Success)
        .output_data(hex!("0a0b"))
        .check();
}

#[test]
fn delegatecall_runs_against_caller_storage() {
    let callee = addr(0xbb);
    let callee_code = Bytecode::new().sstore(1, 0x2a).opcode(OpCode::STOP);

    EvmTester::new()
        .apply_host_fn(move |host, _| {
            host.set_code(callee, callee_code.clone().build()).unwrap();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::delegatecall(address_to_word(callee)).gas(50000))
                .opcode(OpCode::STOP),
        )
        .gas(100000)
        .status(StatusCode::Success)
        .inspect_host(move |host, inputs| {
            assert_eq!(
                host.get_storage(inputs.destination, U256::one()).unwrap(),
                U256::from(0x2a)
            );
            assert!(host.get_storage(callee, U256::one()).unwrap().is_zero());
        })
        .check();
}

#[test]
fn staticcall_rejects_sstore() {
    let callee = addr(0xcc);
    let callee_code = Bytecode::new().sstore(1, 1).opcode(OpCode::STOP);

    EvmTester::new()
        .apply_host_fn(move |host, _| {
            host.set_code(callee, callee_code.clone().build()).unwrap();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::staticcall(address_to_word(callee)).gas(50000))
                .ret_top(),
        )
        .gas(100000)
        .status(StatusCode::Success)
        .output_value(0)
        .inspect_host(move |host, _| {
            assert!(host.get_storage(callee, U256::one()).unwrap().is_zero());
        })
        .check();
}

#[test]
fn call_depth_limit_returns_zero_without_recursing() {
    let callee = addr(0xaa);

    EvmTester::new()
        .depth(1024)
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_word(callee)).gas(1000))
                .ret_top(),
        )
        .gas(100000)
        .status(StatusCode::Success)
        .output_value(0)
        .check();
}

#[test]
fn create_then_call_installs_code() {
    let init_code = Bytecode::new().pushv(0xdeadbeefu32).mstore(0).ret(28, 4).build();

    EvmTester::new()
        .input(init_code)
        .code(
            Bytecode::new()
                .opcode(OpCode::CALLDATASIZE)
                .pushv(0)
                .pushv(0)
                .opcode(OpCode::CALLDATACOPY)
                .opcode(OpCode::CALLDATASIZE)
                .pushv(0)
                .pushv(0)
                .opcode(OpCode::CREATE)
                .ret_top(),
        )
        .gas(1_000_000)
        .status(StatusCode::Success)
        .inspect(|host, _, output| {
            assert_eq!(output.len(), 32);
            let created = Address::from_slice(&output[12..32]);
            assert_ne!(created, Address::zero());
            let code = host.code(created).unwrap();
            assert_eq!(&code[..], &hex!("deadbeef"));
        })
        .check();
}

#[test]
fn create2_address_is_deterministic_and_salt_sensitive() {
    let sender = addr(0x42);
    let init_code = [1u8, 2, 3, 4];
    let salt = U256::from(7);

    let mut host_a = MockedHost::new(Spec::for_fork(Hardfork::Constantinople));
    let mut host_b = MockedHost::new(Spec::for_fork(Hardfork::Constantinople));

    let addr_a = host_a
        .create_address(sender, CallKind::Create2 { salt }, &init_code)
        .unwrap();
    let addr_b = host_b
        .create_address(sender, CallKind::Create2 { salt }, &init_code)
        .unwrap();
    assert_eq!(addr_a, addr_b);

    let addr_other_salt = host_a
        .create_address(sender, CallKind::Create2 { salt: salt + 1 }, &init_code)
        .unwrap();
    assert_ne!(addr_a, addr_other_salt);
}

#[test]
fn selfdestruct_moves_balance_to_beneficiary() {
    let beneficiary = addr(0xbb);

    EvmTester::new()
        .apply_host_fn(move |host, inputs| {
            host.set_balance(inputs.destination, U256::from(1000));
        })
        .code(
            Bytecode::new()
                .pushv(address_to_word(beneficiary))
                .opcode(OpCode::SELFDESTRUCT),
        )
        .gas(40000)
        .status(StatusCode::Success)
        .inspect_host(move |host, inputs| {
            assert!(host.is_destructed(inputs.destination));
            assert_eq!(host.get_balance(beneficiary).unwrap(), U256::from(1000));
            assert!(host.get_balance(inputs.destination).unwrap().is_zero());
        })
        .check();
}
