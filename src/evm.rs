//! The call-frame manager: resolves a [`CallInputs`] into a concrete frame
//! (code fetch, EIP-7702 delegation, value transfer, snapshot/revert) and
//! drives one [`Interpreter`] through it.
//!
//! Grounded on the teacher's resumable `AnalyzedCode::execute_resumable`,
//! which performs the same steps across `Call`/`GetBalance`/`AccountExists`
//! interrupts; this version runs them inline against a synchronous `Host`,
//! since there is no coroutine to suspend.

use bytes::Bytes;
use ethereum_types::Address;
use tracing::{instrument, trace};

use crate::{
    bytecode::{self, AnalyzedBytecode},
    error::{HostError, StatusCode},
    host::{CallInputs, CallKind, CallResult, Host},
    interpreter::{CallContext, Interpreter},
    spec::Spec,
    tracer::Tracer,
};

/// Gas charged per byte of code deposited after a successful CREATE
/// (EIP-2's flat 200/byte; untouched by the later forks this crate models).
const CREATE_DATA_GAS: u64 = 200;

/// Mirrors `instructions::call::MAX_CALL_DEPTH`: the CALL-family opcodes
/// already refuse to recurse past this depth, so this only guards a caller
/// that invokes `Evm::call` directly with an already-too-deep frame.
const MAX_CALL_DEPTH: u32 = 1024;

pub struct Evm;

impl Evm {
    /// Resolves `inputs` into a frame and runs it to completion, rolling
    /// back every side effect recorded since entry via
    /// `host.revert_to_snapshot` on anything other than a clean success.
    #[instrument(skip(host, spec, tracer), fields(kind = ?inputs.kind, depth = inputs.depth))]
    pub fn call(
        host: &mut dyn Host,
        inputs: &CallInputs,
        spec: &Spec,
        tracer: &mut dyn Tracer,
    ) -> Result<CallResult, HostError> {
        if inputs.depth > MAX_CALL_DEPTH {
            return Ok(CallResult {
                status_code: StatusCode::CallDepthExceeded,
                gas_left: 0,
                gas_refund: 0,
                output_data: Bytes::new(),
                create_address: None,
            });
        }

        let snapshot = host.snapshot();
        let is_create = matches!(inputs.kind, CallKind::Create | CallKind::Create2 { .. });

        let (frame_address, code_address) = if is_create {
            let addr = host.create_address(inputs.sender, inputs.kind, &inputs.input_data)?;
            (addr, addr)
        } else {
            (inputs.storage_target, inputs.destination)
        };

        if !inputs.value.is_zero() {
            let sender_balance = host.get_balance(inputs.sender)?;
            if sender_balance < inputs.value {
                return Ok(CallResult {
                    status_code: StatusCode::Revert,
                    gas_left: 0,
                    gas_refund: 0,
                    output_data: Bytes::new(),
                    create_address: None,
                });
            }
            host.transfer(inputs.sender, frame_address, inputs.value)?;
        }

        let code = if is_create {
            inputs.input_data.clone()
        } else {
            resolve_code(host, code_address)?
        };

        if code.is_empty() && !is_create {
            return Ok(empty_result(inputs.gas));
        }

        let analyzed = AnalyzedBytecode::analyze(code);
        let context = CallContext {
            address: frame_address,
            caller: inputs.sender,
            code_address,
            value: inputs.value,
            calldata: if is_create {
                Bytes::new()
            } else {
                inputs.input_data.clone()
            },
            is_static: inputs.is_static,
            depth: inputs.depth,
        };

        let mut interpreter = Interpreter::new(&analyzed, context, spec, inputs.gas);
        let (status, output) = interpreter.run(host, tracer);
        let gas_left = interpreter.gas.remaining();
        let refund = interpreter.gas.refund();

        trace!(?status, gas_left, "frame finished");

        if !status.is_success() {
            host.revert_to_snapshot(snapshot);
            return Ok(CallResult {
                status_code: status,
                gas_left: if status == StatusCode::Revert { gas_left } else { 0 },
                gas_refund: 0,
                output_data: if status == StatusCode::Revert {
                    output
                } else {
                    Bytes::new()
                },
                create_address: None,
            });
        }

        if is_create {
            return Ok(finish_create(host, snapshot, spec, frame_address, output, gas_left, refund)?);
        }

        Ok(CallResult {
            status_code: StatusCode::Success,
            gas_left,
            gas_refund: refund,
            output_data: output,
            create_address: None,
        })
    }
}

fn empty_result(gas: u64) -> CallResult {
    CallResult {
        status_code: StatusCode::Success,
        gas_left: gas,
        gas_refund: 0,
        output_data: Bytes::new(),
        create_address: None,
    }
}

fn reverted_create_result(status: StatusCode) -> CallResult {
    CallResult {
        status_code: status,
        gas_left: 0,
        gas_refund: 0,
        output_data: Bytes::new(),
        create_address: None,
    }
}

/// Validates and deploys the init code's return data, charging the 200
/// gas/byte deposit cost and rejecting oversized or EIP-3541-reserved code.
fn finish_create(
    host: &mut dyn Host,
    snapshot: crate::host::SnapshotId,
    spec: &Spec,
    frame_address: Address,
    output: Bytes,
    gas_left: u64,
    refund: i64,
) -> Result<CallResult, HostError> {
    if let Some(limit) = spec.create_contract_size_limit {
        if output.len() > limit {
            host.revert_to_snapshot(snapshot);
            return Ok(reverted_create_result(StatusCode::Revert));
        }
    }
    if spec.rejects_code_starting_with_0xef && bytecode::starts_with_reserved_byte(&output) {
        host.revert_to_snapshot(snapshot);
        return Ok(reverted_create_result(StatusCode::Revert));
    }
    let deploy_cost = CREATE_DATA_GAS * output.len() as u64;
    if deploy_cost > gas_left {
        host.revert_to_snapshot(snapshot);
        return Ok(reverted_create_result(StatusCode::OutOfGas));
    }
    host.set_code(frame_address, output)?;
    Ok(CallResult {
        status_code: StatusCode::Success,
        gas_left: gas_left - deploy_cost,
        gas_refund: refund,
        output_data: Bytes::new(),
        create_address: Some(frame_address),
    })
}

/// Follows one level of an EIP-7702 delegation header; a delegation whose
/// target is itself a delegation is a hard error rather than a loop.
fn resolve_code(host: &mut dyn Host, address: Address) -> Result<Bytes, HostError> {
    let code = host.code(address)?;
    match bytecode::parse_delegation(&code) {
        Some(delegate) => {
            let delegate_code = host.code(delegate)?;
            if bytecode::parse_delegation(&delegate_code).is_some() {
                return Err(HostError::NestedDelegation);
            }
            Ok(delegate_code)
        }
        None => Ok(code),
    }
}
