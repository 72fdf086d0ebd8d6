//! MLOAD, MSTORE, MSTORE8, MSIZE, MCOPY, SHA3 (a.k.a. KECCAK256).

use alloy::primitives::{keccak256, U256};

use super::{as_usize, charge_and_grow_memory, pop1, pop2, pop3, push, R};
use crate::frame::{Frame, HaltReason};
use crate::gas;
use crate::host::Host;

pub fn mload(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let offset = as_usize(pop1(frame)?)?;
    charge_and_grow_memory(frame, offset, 32)?;
    let value = frame.memory.mload(offset).map_err(|_| HaltReason::OutOfGas)?;
    push(frame, value)
}

pub fn mstore(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (offset, value) = pop2(frame)?;
    let offset = as_usize(offset)?;
    charge_and_grow_memory(frame, offset, 32)?;
    frame
        .memory
        .mstore(offset, value)
        .map_err(|_| HaltReason::OutOfGas)
}

pub fn mstore8(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (offset, value) = pop2(frame)?;
    let offset = as_usize(offset)?;
    charge_and_grow_memory(frame, offset, 1)?;
    frame
        .memory
        .mstore8(offset, value)
        .map_err(|_| HaltReason::OutOfGas)
}

pub fn msize(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.memory.len() as u64))
}

/// `MCOPY` (EIP-5656, Cancun+): stack order `dest, src, size`.
pub fn mcopy(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (dest, src, size) = pop3(frame)?;
    let dest = as_usize(dest)?;
    let src = as_usize(src)?;
    let size = as_usize(size)?;
    let touched = dest.max(src);
    charge_and_grow_memory(frame, touched, size)?;
    if size > 0 {
        let word_cost = 3 * (size as u64).div_ceil(32);
        frame.gas.consume(word_cost).map_err(|_| HaltReason::OutOfGas)?;
    }
    frame
        .memory
        .mcopy(dest, src, size)
        .map_err(|_| HaltReason::OutOfGas)
}

/// `SHA3`/`KECCAK256`: stack order `offset, size`.
pub fn sha3(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (offset, size) = pop2(frame)?;
    let offset = as_usize(offset)?;
    let size = as_usize(size)?;
    charge_and_grow_memory(frame, offset, size)?;
    frame
        .gas
        .consume(gas::keccak256_dynamic_cost(size))
        .map_err(|_| HaltReason::OutOfGas)?;
    let bytes = frame.memory.copy(offset, size).map_err(|_| HaltReason::OutOfGas)?;
    push(frame, U256::from_be_bytes(*keccak256(&bytes)))
}
