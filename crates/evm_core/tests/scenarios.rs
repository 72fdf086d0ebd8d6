//! End-to-end scenarios against a single call frame, mirroring the
//! concrete test vectors and universal invariants this core is built
//! against: wrapping arithmetic, division-by-zero, JUMPDEST analysis
//! around a fake destination hidden in a PUSH immediate, PUSH0's
//! fork gate, SSTORE net metering across transactions, the EIP-3529
//! refund cap, and EIP-2929 cold/warm account access.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use alloy::primitives::{Address, U256};
use evm_core::host::mock::MockHost;
use evm_core::{CallStatus, Env, Frame, HaltReason, Host, Spec, SpecId};

fn run_frame(code: &[u8], spec_id: SpecId, gas_limit: u64, host: &mut MockHost) -> Frame {
    let bytecode = Rc::new(evm_core::analysis::AnalyzedBytecode::analyze(code));
    let spec = Spec::resolve(spec_id);
    let env = Rc::new(Env::default());
    let selfdestructed = Rc::new(RefCell::new(HashSet::<Address>::new()));
    let mut frame = Frame::new(
        bytecode,
        gas_limit,
        spec,
        env,
        false,
        0,
        Address::ZERO,
        Address::ZERO,
        U256::ZERO,
        Vec::new(),
        selfdestructed,
    );
    evm_core::interpreter::run(&mut frame, host);
    frame
}

/// S1: `PUSH32 MAX, PUSH1 1, ADD, STOP` on Berlin wraps to zero and
/// costs exactly 9 gas (3 + 3 + 3 + 0).
#[test]
fn s1_add_wraps_to_zero() {
    let mut code = vec![0x7F];
    code.extend_from_slice(&[0xFF; 32]);
    code.extend_from_slice(&[0x60, 0x01, 0x01, 0x00]);

    let mut host = MockHost::new();
    let mut frame = run_frame(&code, SpecId::Berlin, 10_000, &mut host);
    assert_eq!(frame.halt, Some(HaltReason::Success));
    assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    assert_eq!(frame.gas.used(), 9);
}

/// S2: `PUSH1 10, PUSH1 0, DIV, STOP` divides by zero, which the EVM
/// defines as yielding zero rather than trapping; costs 11 gas.
#[test]
fn s2_division_by_zero_yields_zero() {
    let code = [0x60, 0x0A, 0x60, 0x00, 0x04, 0x00];
    let mut host = MockHost::new();
    let mut frame = run_frame(&code, SpecId::Berlin, 10_000, &mut host);
    assert_eq!(frame.halt, Some(HaltReason::Success));
    assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    assert_eq!(frame.gas.used(), 11);
}

/// S3: `PUSH2 0x5B5B, JUMPDEST` hides two `0x5B` bytes inside the PUSH2
/// immediate; only the byte after the immediate is a real JUMPDEST.
#[test]
fn s3_jumpdest_inside_push_immediate_is_not_a_valid_target() {
    let code = [0x61, 0x5B, 0x5B, 0x5B];
    let analyzed = evm_core::analysis::AnalyzedBytecode::analyze(&code);
    assert!(!analyzed.is_valid_jump(1));
    assert!(!analyzed.is_valid_jump(2));
    assert!(analyzed.is_valid_jump(3));
}

/// S4: `PUSH0, STOP`. Undefined before Shanghai; pushes zero and costs
/// 2 gas from Shanghai on.
#[test]
fn s4_push0_gated_by_shanghai() {
    let code = [0x5F, 0x00];

    let mut host = MockHost::new();
    let pre = run_frame(&code, SpecId::Berlin, 10_000, &mut host);
    assert_eq!(pre.halt, Some(HaltReason::InvalidOpcode));

    let mut host = MockHost::new();
    let mut post = run_frame(&code, SpecId::Shanghai, 10_000, &mut host);
    assert_eq!(post.halt, Some(HaltReason::Success));
    assert_eq!(post.stack.pop().unwrap(), U256::ZERO);
    assert_eq!(post.gas.used(), 2);
}

/// S5: net-metered SSTORE on Istanbul, across two transactions sharing
/// one host. The first write to an untouched slot is a full SSTORE_SET;
/// after `clear_transaction_state` re-snapshots the "original" value,
/// writing a second time is a cheaper SSTORE_RESET, not a "subsequent
/// change within the same transaction".
#[test]
fn s5_sstore_net_metering_resets_original_value_per_transaction() {
    // PUSH1 <value>, PUSH1 0, SSTORE, STOP
    let write_to_slot_zero = |value: u8| -> Vec<u8> { vec![0x60, value, 0x60, 0x00, 0x55, 0x00] };

    let mut host = MockHost::new();
    let tx1 = run_frame(&write_to_slot_zero(100), SpecId::Istanbul, 100_000, &mut host);
    assert_eq!(tx1.halt, Some(HaltReason::Success));
    assert_eq!(tx1.gas.used(), 20_006);

    host.clear_transaction_state();

    let tx2 = run_frame(&write_to_slot_zero(200), SpecId::Istanbul, 100_000, &mut host);
    assert_eq!(tx2.halt, Some(HaltReason::Success));
    assert_eq!(tx2.gas.used(), 5_006);
}

/// S6: the EIP-3529 refund cap divides by 5 from London on, versus by
/// 2 pre-London (Berlin here).
#[test]
fn s6_refund_cap_tightens_at_london() {
    let mut gas = evm_core::gas::GasTracker::new(100_000);
    gas.consume(5000).unwrap();
    gas.adjust_refund(4800);

    let london = Spec::resolve(SpecId::London);
    assert_eq!(gas.final_refund(&london), 1000);

    let berlin = Spec::resolve(SpecId::Berlin);
    assert_eq!(gas.final_refund(&berlin), 2500);
}

/// S7: EIP-2929 cold/warm BALANCE. The first touch of an address this
/// transaction is charged `cold_account_access_cost`; every later
/// touch is charged the flat `warm_storage_read_cost`. Pre-Berlin,
/// BALANCE is flat-priced and there is no cold/warm split.
#[test]
fn s7_balance_is_cold_once_then_warm() {
    // PUSH20 <addr>, BALANCE, PUSH20 <addr>, BALANCE, STOP
    let target = Address::from([0x42; 20]);
    let mut code = vec![0x73];
    code.extend_from_slice(target.as_slice());
    code.push(0x31); // BALANCE
    code.push(0x73);
    code.extend_from_slice(target.as_slice());
    code.push(0x31);
    code.push(0x00);

    let mut host = MockHost::new();
    let berlin = run_frame(&code, SpecId::Berlin, 1_000_000, &mut host);
    assert_eq!(berlin.halt, Some(HaltReason::Success));
    // 2 * PUSH20 (3 each) + one cold (2600) + one warm (100) access.
    assert_eq!(berlin.gas.used(), 3 + 2600 + 3 + 100);

    let mut host = MockHost::new();
    let istanbul = run_frame(&code, SpecId::Istanbul, 1_000_000, &mut host);
    assert_eq!(istanbul.halt, Some(HaltReason::Success));
    // Flat-priced, no cold/warm distinction pre-Berlin.
    assert_eq!(istanbul.gas.used(), 3 + 700 + 3 + 700);
}

/// Universal invariant: `gas.remaining + gas.used == gas.limit` holds
/// after a frame runs to completion, success or not.
#[test]
fn gas_counters_stay_consistent_after_a_run() {
    let code = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00]; // PUSH1 1, PUSH1 2, ADD, STOP
    let mut host = MockHost::new();
    let frame = run_frame(&code, SpecId::Prague, 1000, &mut host);
    assert_eq!(frame.gas.remaining() + frame.gas.used(), frame.gas.limit());
}

/// Universal invariant: the empty program halts successfully, charges
/// no gas, and produces no output.
#[test]
fn empty_bytecode_halts_successfully_with_no_output() {
    let mut host = MockHost::new();
    let frame = run_frame(&[], SpecId::Prague, 1000, &mut host);
    assert_eq!(frame.halt, Some(HaltReason::Success));
    assert_eq!(frame.gas.used(), 0);
    assert!(frame.output.is_empty());
}

/// Universal invariant: a non-success halt in a child frame leaves the
/// host's state bit-identical to what it was at the child's entry
/// snapshot (exercised through the static-call write rejection, which
/// must roll back even a partially-applied SSTORE attempt).
#[test]
fn reverted_sstore_leaves_storage_untouched() {
    let slot = U256::ZERO;
    let addr = Address::ZERO;
    let mut host = MockHost::new();
    host.set_storage(addr, slot, U256::from(7u8));
    let before = host.sload(addr, slot);

    // PUSH1 1, PUSH1 0, SSTORE, STOP, run under is_static.
    let code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x00];
    let bytecode = Rc::new(evm_core::analysis::AnalyzedBytecode::analyze(&code));
    let spec = Spec::resolve(SpecId::Prague);
    let env = Rc::new(Env::default());
    let selfdestructed = Rc::new(RefCell::new(HashSet::<Address>::new()));
    let mut frame = Frame::new(
        bytecode,
        100_000,
        spec,
        env,
        true,
        0,
        addr,
        Address::ZERO,
        U256::ZERO,
        Vec::new(),
        selfdestructed,
    );
    let result = evm_core::interpreter::run(&mut frame, &mut host);
    assert_eq!(result.status, CallStatus::StateChangeDuringStaticCall);
    assert_eq!(host.sload(addr, slot), before);
}
