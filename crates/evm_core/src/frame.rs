//! One call frame's mutable execution state: bytecode, analyzed
//! jumpdests, program counter, stack, memory, gas, and the halt flag
//! the interpreter loop watches.

use std::rc::Rc;

use alloy::primitives::{Address, B256};
use primitives::{Memory, Stack};

use crate::analysis::AnalyzedBytecode;
use crate::gas::GasTracker;
use crate::host::{CallInputs, Env};
use crate::spec::Spec;

/// A `CALL`-family or `CREATE`-family request a handler could not
/// finish synchronously: it has already popped its operands and
/// charged what it can charge up front, and is handing the rest off
/// to the interpreter loop, which drives the nested frame and resumes
/// this one with the result.
pub struct PendingCall {
    pub inputs: CallInputs,
    /// Where in this frame's memory to write the child's return data
    /// (`CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL` only).
    pub ret_offset: usize,
    pub ret_size: usize,
}

/// One `LOGn` emission: the emitting account, its (0..=4) topics, and
/// the raw data slice copied from memory at the time of the opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
}

/// Terminal states a frame can halt in. `Running` is not a halt state;
/// once a frame reaches any of these it never executes another
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Success,
    Revert,
    OutOfGas,
    InvalidOpcode,
    InvalidJump,
    InvalidPc,
    StackOverflow,
    StackUnderflow,
    StateChangeDuringStaticCall,
    /// `RETURNDATACOPY` requested a range past the end of the last
    /// child call's return data.
    ReturnDataOutOfBounds,
}

impl HaltReason {
    pub fn is_success(self) -> bool {
        matches!(self, HaltReason::Success)
    }
}

/// `{bytecode, analyzed_jumpdests, pc, stack, memory, gas, spec,
/// is_static, depth, return_data_buffer, is_halted, halt_reason}` from
/// spec §3, plus the call frame's own address/caller/value (needed by
/// the environment-opcode family) and a handle to the host snapshot
/// taken at frame entry, used on a non-success exit.
pub struct Frame {
    pub bytecode: Rc<AnalyzedBytecode>,
    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    pub gas: GasTracker,
    pub spec: Spec,
    pub env: Rc<Env>,
    pub is_static: bool,
    pub depth: u32,
    pub address: alloy::primitives::Address,
    pub caller: alloy::primitives::Address,
    pub call_value: alloy::primitives::U256,
    pub input: Vec<u8>,
    pub return_data: Vec<u8>,
    pub output: Vec<u8>,
    pub halt: Option<HaltReason>,
    /// Set by `JUMP`/`JUMPI` when they move `pc` themselves; the
    /// interpreter loop checks this instead of always advancing by
    /// `1 + immediate_bytes` and clears it before the next fetch.
    pub jumped: bool,
    /// Logs emitted by `LOGn` so far in this frame, surfaced to the
    /// caller via `CallResult` on a successful exit and discarded on
    /// revert.
    pub logs: Vec<Log>,
    /// Set by a `CALL`-family or `CREATE`-family handler; consumed and
    /// cleared by the interpreter loop immediately after the handler
    /// returns.
    pub pending_call: Option<PendingCall>,
    /// Addresses this transaction has already scheduled for
    /// self-destruction; a second `SELFDESTRUCT` on the same address
    /// within the same transaction does not re-earn the refund.
    pub selfdestructed_this_tx: Rc<std::cell::RefCell<std::collections::HashSet<alloy::primitives::Address>>>,
}

impl Frame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bytecode: Rc<AnalyzedBytecode>,
        gas_limit: u64,
        spec: Spec,
        env: Rc<Env>,
        is_static: bool,
        depth: u32,
        address: alloy::primitives::Address,
        caller: alloy::primitives::Address,
        call_value: alloy::primitives::U256,
        input: Vec<u8>,
        selfdestructed_this_tx: Rc<std::cell::RefCell<std::collections::HashSet<alloy::primitives::Address>>>,
    ) -> Self {
        Frame {
            bytecode,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas: GasTracker::new(gas_limit),
            spec,
            env,
            is_static,
            depth,
            address,
            caller,
            call_value,
            input,
            return_data: Vec::new(),
            output: Vec::new(),
            halt: None,
            jumped: false,
            logs: Vec::new(),
            pending_call: None,
            selfdestructed_this_tx,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub fn halt(&mut self, reason: HaltReason) {
        if self.halt.is_none() {
            self.halt = Some(reason);
        }
    }
}
