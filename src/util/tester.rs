//! A fluent builder for running a single call frame against a
//! [`MockedHost`] and asserting on its outcome.
//!
//! Grounded on the teacher's `EvmTester`, with its `async`/`Educe`/`Arc`
//! machinery dropped: this crate's `Host` is synchronous, so there is
//! nothing to await, and `Rc` replaces `Arc` since tests are single-threaded.

use std::rc::Rc;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    error::StatusCode,
    evm::Evm,
    host::{CallInputs, CallKind, CallResult, Host},
    spec::{Hardfork, Spec},
    tracer::NoopTracer,
    util::{bytecode::Bytecode, mocked_host::MockedHost},
};

#[derive(Clone, Copy, Debug)]
enum GasCheck {
    Used(u64),
    Left(u64),
}

#[derive(Clone)]
struct HostFn(Rc<dyn Fn(&mut MockedHost, &CallInputs)>);

/// Tester that executes EVM bytecode against a [`MockedHost`] and runs the
/// checks queued on it.
#[must_use]
#[derive(Clone)]
pub struct EvmTester {
    host: MockedHost,
    apply_host_fns: Vec<HostFn>,
    inspect_output_fn: Rc<dyn Fn(&[u8])>,
    inspect_host_fn: Rc<dyn Fn(&MockedHost, &CallInputs)>,
    inspect_fn: Rc<dyn Fn(&MockedHost, &CallInputs, &[u8])>,
    fork: Hardfork,
    inputs: CallInputs,
    code: Bytes,
    gas_check: Option<GasCheck>,
    expected_status_codes: Option<Vec<StatusCode>>,
    expected_output_data: Option<Vec<u8>>,
}

impl Default for EvmTester {
    fn default() -> Self {
        Self::new()
    }
}

impl EvmTester {
    pub fn new() -> Self {
        let fork = Hardfork::Byzantium;
        Self {
            host: MockedHost::new(Spec::for_fork(fork)),
            apply_host_fns: vec![],
            inspect_output_fn: Rc::new(|_| ()),
            inspect_host_fn: Rc::new(|_, _| ()),
            inspect_fn: Rc::new(|_, _, _| ()),
            fork,
            inputs: CallInputs {
                kind: CallKind::Call,
                is_static: false,
                depth: 0,
                gas: u64::MAX,
                destination: Address::zero(),
                sender: Address::zero(),
                storage_target: Address::zero(),
                input_data: Bytes::new(),
                value: U256::zero(),
            },
            code: Bytes::new(),
            gas_check: None,
            expected_status_codes: None,
            expected_output_data: None,
        }
    }

    /// Set the code to be executed.
    pub fn code(mut self, code: impl Into<Bytecode>) -> Self {
        self.code = code.into().build().into();
        self
    }

    /// Queue a function that modifies the host before execution.
    pub fn apply_host_fn(mut self, host_fn: impl Fn(&mut MockedHost, &CallInputs) + 'static) -> Self {
        self.apply_host_fns.push(HostFn(Rc::new(host_fn)));
        self
    }

    /// Set the fork this call runs under. Rebuilds the host's spec, so call
    /// this before any `apply_host_fn`.
    pub fn revision(mut self, fork: Hardfork) -> Self {
        self.fork = fork;
        self.host = MockedHost::new(Spec::for_fork(fork));
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.inputs.depth = depth;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.inputs.gas = gas;
        self
    }

    pub fn set_static(mut self, is_static: bool) -> Self {
        self.inputs.is_static = is_static;
        self
    }

    /// Sets both `destination` and `storage_target` to the same address;
    /// use `apply_host_fn` to diverge them for a CALLCODE/DELEGATECALL case.
    pub fn destination(mut self, destination: impl Into<Address>) -> Self {
        let destination = destination.into();
        self.inputs.destination = destination;
        self.inputs.storage_target = destination;
        self
    }

    pub fn sender(mut self, sender: impl Into<Address>) -> Self {
        self.inputs.sender = sender.into();
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.inputs.value = value.into();
        self
    }

    pub fn kind(mut self, kind: CallKind) -> Self {
        self.inputs.kind = kind;
        self
    }

    /// Check how much gas will be used. Mutually exclusive with `gas_left`.
    pub fn gas_used(mut self, expected_gas_used: u64) -> Self {
        self.gas_check = Some(GasCheck::Used(expected_gas_used));
        self
    }

    /// Check how much gas will be left after execution. Mutually exclusive
    /// with `gas_used`.
    pub fn gas_left(mut self, expected_gas_left: u64) -> Self {
        self.gas_check = Some(GasCheck::Left(expected_gas_left));
        self
    }

    pub fn input(mut self, input: impl Into<Bytes>) -> Self {
        self.inputs.input_data = input.into();
        self
    }

    pub fn status(mut self, expected_status_code: StatusCode) -> Self {
        self.expected_status_codes = Some(vec![expected_status_code]);
        self
    }

    pub fn status_one_of<const N: usize>(mut self, expected_status_code: [StatusCode; N]) -> Self {
        self.expected_status_codes = Some(expected_status_code.to_vec());
        self
    }

    pub fn output_value(mut self, expected_output_data: impl Into<U256>) -> Self {
        let mut data = [0; 32];
        expected_output_data.into().to_big_endian(&mut data);
        self.expected_output_data = Some(data.to_vec());
        self
    }

    pub fn output_data(mut self, expected_output_data: impl Into<Vec<u8>>) -> Self {
        self.expected_output_data = Some(expected_output_data.into());
        self
    }

    pub fn inspect_output(mut self, f: impl Fn(&[u8]) + 'static) -> Self {
        self.inspect_output_fn = Rc::new(f);
        self
    }

    pub fn inspect_host(mut self, f: impl Fn(&MockedHost, &CallInputs) + 'static) -> Self {
        self.inspect_host_fn = Rc::new(f);
        self
    }

    pub fn inspect(mut self, f: impl Fn(&MockedHost, &CallInputs, &[u8]) + 'static) -> Self {
        self.inspect_fn = Rc::new(f);
        self
    }

    /// Runs the queued call, checks the result, and returns it.
    pub fn check_and_get_result(mut self) -> CallResult {
        self.host
            .set_code(self.inputs.destination, self.code.clone())
            .expect("mocked host never errors");

        for f in &self.apply_host_fns {
            (f.0)(&mut self.host, &self.inputs);
        }

        let spec = Spec::for_fork(self.fork);
        let result = Evm::call(&mut self.host, &self.inputs, &spec, &mut NoopTracer)
            .expect("mocked host never errors");

        if let Some(status_codes) = &self.expected_status_codes {
            assert!(
                status_codes.contains(&result.status_code),
                "status code mismatch: {:?}, must be one of {:?}",
                result.status_code,
                status_codes
            );
        }

        if let Some(gas_check) = self.gas_check {
            match gas_check {
                GasCheck::Used(used) => assert_eq!(self.inputs.gas - result.gas_left, used),
                GasCheck::Left(left) => assert_eq!(result.gas_left, left),
            }
        }

        if let Some(expected_data) = &self.expected_output_data {
            assert_eq!(&result.output_data[..], &expected_data[..]);
        }

        (self.inspect_output_fn)(&result.output_data);
        (self.inspect_host_fn)(&self.host, &self.inputs);
        (self.inspect_fn)(&self.host, &self.inputs, &result.output_data);

        result
    }

    /// Runs the queued call and checks the result, discarding it.
    pub fn check(self) {
        self.check_and_get_result();
    }
}
