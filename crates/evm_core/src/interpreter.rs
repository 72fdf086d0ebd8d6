//! The fetch/decode/charge/execute loop: drives one `Frame` from
//! `pc = 0` to a halt, recursing into a nested `Frame` whenever a
//! `CALL`-family or `CREATE`-family handler leaves a `PendingCall`
//! behind.
//!
//! Per step: bounds-check `pc`, look up the opcode's structural info
//! and dispatch function for the frame's fork, validate the immediate
//! doesn't run off the end of the code, charge base gas, dispatch, then
//! either advance `pc` or honor whatever the handler did to it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use alloy::primitives::{Address, U256};
use log::{debug, trace, warn};
use primitives::U256Ext;

use crate::analysis::AnalyzedBytecode;
use crate::frame::{Frame, HaltReason};
use crate::gas;
use crate::host::{CallKind, CallResult, CallStatus, Env, Host};
use crate::opcodes;
use crate::spec::Spec;
use crate::table;

fn address_word(addr: Address) -> U256 {
    U256::from_be_slice_padded(addr.as_slice())
}

/// Fetch the code the EVM should actually execute for `addr`: if the
/// account's raw code is an EIP-7702 delegation header, follow it to
/// the delegate's code once (delegations do not chain). Otherwise
/// return the raw code unchanged.
fn resolve_code(host: &dyn Host, addr: Address) -> Vec<u8> {
    let raw = host.code(addr);
    match crate::analysis::classify(&raw) {
        crate::analysis::AccountCode::Delegated(delegation) => host.code(delegation.target),
        crate::analysis::AccountCode::Analyzed(_) => raw,
    }
}

fn halt_reason_to_status(reason: HaltReason) -> CallStatus {
    match reason {
        HaltReason::Success => CallStatus::Success,
        HaltReason::Revert => CallStatus::Revert,
        HaltReason::OutOfGas => CallStatus::OutOfGas,
        HaltReason::InvalidOpcode => CallStatus::InvalidOpcode,
        HaltReason::InvalidJump => CallStatus::InvalidJump,
        HaltReason::InvalidPc => CallStatus::InvalidPc,
        HaltReason::StackOverflow => CallStatus::StackOverflow,
        HaltReason::StackUnderflow => CallStatus::StackUnderflow,
        HaltReason::StateChangeDuringStaticCall => CallStatus::StateChangeDuringStaticCall,
        HaltReason::ReturnDataOutOfBounds => CallStatus::ReturnDataOutOfBounds,
    }
}

/// Run `frame` to completion: dispatch instructions until it halts,
/// resolving any nested `CALL`/`CREATE` along the way, and produce the
/// `CallResult` the parent (or the outermost caller) observes.
///
/// `selfdestructed_this_tx` is shared with every frame in the same
/// transaction so a second `SELFDESTRUCT` on an address already
/// scheduled this transaction does not re-earn the refund.
pub fn run(frame: &mut Frame, host: &mut dyn Host) -> CallResult {
    let dispatch = table::table_for(frame.spec.id);
    debug!(
        "entering frame depth={} address={:?} gas_limit={}",
        frame.depth,
        frame.address,
        frame.gas.remaining()
    );

    loop {
        if let Some(reason) = frame.halt {
            return finish(frame, reason);
        }

        if frame.pc >= frame.bytecode.len() {
            return finish(frame, HaltReason::Success);
        }

        let opcode = frame.bytecode.byte_at(frame.pc).expect("pc checked in bounds above");
        let info = opcodes::info(opcode);

        if frame.pc + 1 + info.immediate_bytes as usize > frame.bytecode.len() {
            return finish(frame, HaltReason::InvalidPc);
        }

        let base = gas::base_cost(opcode, &frame.spec);
        if frame.gas.consume(base).is_err() {
            return finish(frame, HaltReason::OutOfGas);
        }

        trace!(
            "pc={} op={} ({:#04x}) gas_remaining={}",
            frame.pc,
            info.name,
            opcode,
            frame.gas.remaining()
        );

        frame.jumped = false;
        let handler = dispatch[opcode as usize];
        let result = handler(frame, host);

        if let Err(reason) = result {
            return finish(frame, reason);
        }

        if let Some(pending) = frame.pending_call.take() {
            run_pending_call(frame, host, pending);
            continue;
        }

        if !frame.jumped {
            frame.pc += 1 + info.immediate_bytes as usize;
        }
    }
}

fn finish(frame: &mut Frame, reason: HaltReason) -> CallResult {
    frame.halt(reason);
    let status = halt_reason_to_status(reason);
    debug!("frame depth={} halted: {:?}", frame.depth, status);
    let (output, logs) = if status == CallStatus::Success {
        (std::mem::take(&mut frame.output), std::mem::take(&mut frame.logs))
    } else if status == CallStatus::Revert {
        (std::mem::take(&mut frame.output), Vec::new())
    } else {
        (Vec::new(), Vec::new())
    };
    CallResult {
        status,
        gas_used: frame.gas.used(),
        gas_refund: frame.gas.final_refund(&frame.spec),
        output,
        logs,
    }
}

/// Resolve one `PendingCall` against the host: snapshot, optionally
/// transfer value, build and run the nested frame, then commit the
/// result onto the parent's stack/memory/return-data buffer, rolling
/// back to the pre-call snapshot if the child didn't succeed.
fn run_pending_call(
    parent: &mut Frame,
    host: &mut dyn Host,
    pending: crate::frame::PendingCall,
) {
    let crate::frame::PendingCall {
        inputs,
        ret_offset,
        ret_size,
    } = pending;

    let snapshot = host.snapshot();

    if inputs.transfer_value && !inputs.value.is_zero() {
        if host.transfer(inputs.caller, inputs.target, inputs.value).is_err() {
            host.revert_to_snapshot(snapshot);
            push_call_failure(parent);
            return;
        }
    }

    let code = match inputs.kind {
        CallKind::Create | CallKind::Create2 => inputs.input.clone(),
        _ => resolve_code(host, inputs.target),
    };
    let call_input = match inputs.kind {
        CallKind::Create | CallKind::Create2 => Vec::new(),
        _ => inputs.input.clone(),
    };

    let bytecode = Rc::new(AnalyzedBytecode::analyze(&code));
    let is_static = matches!(inputs.kind, CallKind::StaticCall) || parent.is_static;

    let mut child = Frame::new(
        bytecode,
        inputs.gas_limit,
        parent.spec,
        Rc::clone(&parent.env),
        is_static,
        parent.depth + 1,
        inputs.target,
        inputs.caller,
        inputs.value,
        call_input,
        Rc::clone(&parent.selfdestructed_this_tx),
    );

    let result = run(&mut child, host);

    let gas_remaining = inputs.gas_limit.saturating_sub(result.gas_used);
    unconsume(parent, gas_remaining);

    parent.return_data = result.output.clone();

    let is_create = matches!(inputs.kind, CallKind::Create | CallKind::Create2);
    let code_too_large = is_create && result.output.len() > parent.spec.max_code_size;

    match result.status {
        CallStatus::Success if code_too_large => {
            host.revert_to_snapshot(snapshot);
            parent.return_data.clear();
            push_call_failure(parent);
        }
        CallStatus::Success => {
            if !is_create {
                let copy_len = result.output.len().min(ret_size);
                let _ = parent.memory.set(ret_offset, &result.output[..copy_len]);
            }
            parent.gas.adjust_refund(result.gas_refund as i64);
            parent.logs.extend(result.logs);
            if is_create {
                // Persisting the deployed code into the account database
                // is the embedder's job: `Host` deliberately has no
                // code-write method (the persistent account database is
                // out of scope for this core). `result.output` carries
                // the deployed bytecode for the caller to store.
                push_word(parent, address_word(inputs.target));
            } else {
                push_word(parent, U256::from(1u8));
            }
        }
        CallStatus::Revert => {
            host.revert_to_snapshot(snapshot);
            if !is_create {
                let copy_len = result.output.len().min(ret_size);
                let _ = parent.memory.set(ret_offset, &result.output[..copy_len]);
            }
            push_call_failure(parent);
        }
        _ => {
            warn!(
                "child call at depth={} halted abnormally ({:?}), rolling back to pre-call snapshot",
                parent.depth + 1,
                result.status
            );
            host.revert_to_snapshot(snapshot);
            parent.return_data.clear();
            push_call_failure(parent);
        }
    }
}

fn push_call_failure(parent: &mut Frame) {
    push_word(parent, U256::ZERO);
}

fn push_word(parent: &mut Frame, v: U256) {
    let _ = parent.stack.push(v);
}

/// Refund unused forwarded gas back to the parent's own counter: the
/// parent already charged the full `gas_limit` up front (per the
/// 63/64 forwarding rule in `system.rs`), so whatever the child didn't
/// spend needs crediting back.
fn unconsume(parent: &mut Frame, amount: u64) {
    parent.gas.give_back(amount);
}

/// The ten precompile addresses (`0x01`..`0x0A`) pre-warmed by the
/// access list regardless of whether the precompile itself is wired up
/// on `Host` (spec §4.G); this core has no precompile dispatch of its
/// own, but the addresses are still part of every fork's warm set.
fn precompile_addresses() -> impl Iterator<Item = Address> {
    (1u8..=10).map(|byte| {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        Address::from(bytes)
    })
}

/// Pre-warm the origin, the recipient, the precompiles, and the
/// EIP-2930 access-list entries, per spec §4.G ("the transaction entry
/// point pre-warms ..."). A no-op pre-Berlin, where there is no
/// warm/cold distinction to pre-populate.
fn warm_up_access_list(host: &mut dyn Host, spec: &Spec, env: &Env, address: Address, caller: Address) {
    if !spec.has_access_list {
        return;
    }
    host.access_address(caller);
    host.access_address(address);
    for precompile in precompile_addresses() {
        host.access_address(precompile);
    }
    for (addr, slots) in &env.tx.access_list {
        host.access_address(*addr);
        for slot in slots {
            host.access_slot(*addr, *slot);
        }
    }
}

/// Build the outermost `Frame` for a transaction-level call and run it
/// to completion. `selfdestructed_this_tx` should be a fresh empty set
/// for a new transaction, shared across every nested frame within it.
#[allow(clippy::too_many_arguments)]
pub fn run_transaction(
    code: &[u8],
    input: Vec<u8>,
    gas_limit: u64,
    spec: Spec,
    env: Rc<Env>,
    is_static: bool,
    address: Address,
    caller: Address,
    value: U256,
    host: &mut dyn Host,
) -> CallResult {
    warm_up_access_list(host, &spec, &env, address, caller);
    let bytecode = Rc::new(AnalyzedBytecode::analyze(code));
    let selfdestructed = Rc::new(RefCell::new(HashSet::<Address>::new()));
    let mut frame = Frame::new(
        bytecode, gas_limit, spec, env, is_static, 0, address, caller, value, input, selfdestructed,
    );
    run(&mut frame, host)
}
