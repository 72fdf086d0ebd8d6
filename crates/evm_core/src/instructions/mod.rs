//! One module per opcode family, grouped the way `evm.codes` groups
//! them. Every handler has the shape `fn(&mut Frame, &mut dyn Host) ->
//! Result<(), HaltReason>`: it owns its own stack/memory/gas bookwork
//! and reports failure by halt reason rather than panicking.
//!
//! `table::build_table` is what actually wires opcode bytes to these
//! functions per fork; this module tree only supplies the functions.

pub mod arithmetic;
pub mod bitwise;
pub mod block_info;
pub mod comparison;
pub mod control;
pub mod environment;
pub mod log;
pub mod memory_ops;
pub mod stack_ops;
pub mod storage_ops;
pub mod system;

use alloy::primitives::U256;

use crate::frame::{Frame, HaltReason};

pub(crate) type R = Result<(), HaltReason>;

pub(crate) fn pop1(frame: &mut Frame) -> Result<U256, HaltReason> {
    frame.stack.pop().map_err(|_| HaltReason::StackUnderflow)
}

pub(crate) fn pop2(frame: &mut Frame) -> Result<(U256, U256), HaltReason> {
    let a = pop1(frame)?;
    let b = pop1(frame)?;
    Ok((a, b))
}

pub(crate) fn pop3(frame: &mut Frame) -> Result<(U256, U256, U256), HaltReason> {
    let a = pop1(frame)?;
    let b = pop1(frame)?;
    let c = pop1(frame)?;
    Ok((a, b, c))
}

pub(crate) fn push(frame: &mut Frame, v: U256) -> R {
    frame.stack.push(v).map_err(|_| HaltReason::StackOverflow)
}

/// Charge the quadratic memory-expansion surcharge for growing to
/// cover `[offset, offset+size)`, then actually grow the buffer.
/// Every memory-touching opcode goes through this single path so the
/// gas charge and the growth can never drift apart.
pub(crate) fn charge_and_grow_memory(frame: &mut Frame, offset: usize, size: usize) -> R {
    if size == 0 {
        return Ok(());
    }
    let old_words = frame.memory.len_words() as u64;
    let new_words = primitives::Memory::words_required(offset, size)
        .map_err(|_| HaltReason::OutOfGas)?;
    let cost = crate::gas::memory_expansion_cost(old_words, new_words as u64);
    frame.gas.consume(cost).map_err(|_| HaltReason::OutOfGas)?;
    frame
        .memory
        .ensure_capacity(offset, size)
        .map_err(|_| HaltReason::OutOfGas)
}

/// `usize` offset/size operands: `evm.codes` treats any value that
/// doesn't fit `usize` as an implicit out-of-gas (the memory it would
/// address is far beyond what any achievable gas limit could pay for).
pub(crate) fn as_usize(v: U256) -> Result<usize, HaltReason> {
    use primitives::U256Ext;
    v.try_to_usize().ok_or(HaltReason::OutOfGas)
}
