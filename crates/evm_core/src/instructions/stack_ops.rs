//! POP, PUSH0..PUSH32, DUP1..DUP16, SWAP1..SWAP16.
//!
//! PUSH/DUP/SWAP come in 32/16/16 near-identical variants that differ
//! only by a compile-time depth, so each is a const-generic function
//! monomorphized once per depth by `table::build_table` — the same
//! shape every handler uses (`fn(&mut Frame, &mut dyn Host) -> R`),
//! with `N` baked in at the call site instead of threaded as a runtime
//! argument.

use primitives::U256Ext;

use super::{pop1, push, R};
use crate::frame::Frame;
use crate::host::Host;

pub fn pop(frame: &mut Frame, _host: &mut dyn Host) -> R {
    pop1(frame)?;
    Ok(())
}

pub fn push0(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, primitives::U256::ZERO)
}

/// `PUSH1..PUSH32`. The interpreter loop has already validated that
/// `N` immediate bytes remain in the code; reads past the end of code
/// (the final truncated PUSH at the tail of a contract) are
/// zero-padded per spec.
pub fn push_n<const N: usize>(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let start = frame.pc + 1;
    let code = frame.bytecode.code();
    let end = (start + N).min(code.len());
    let slice = if start < code.len() {
        &code[start..end]
    } else {
        &[]
    };
    let mut buf = [0u8; 32];
    let buf_start = 32 - N;
    buf[buf_start..buf_start + slice.len()].copy_from_slice(slice);
    push(frame, primitives::U256::from_be_bytes(buf))
}

pub fn dup_n<const N: usize>(frame: &mut Frame, _host: &mut dyn Host) -> R {
    frame.stack.dup(N).map_err(|_| HaltErr::overflow_or_underflow(&frame.stack, N))
}

pub fn swap_n<const N: usize>(frame: &mut Frame, _host: &mut dyn Host) -> R {
    frame
        .stack
        .swap(N)
        .map_err(|_| crate::frame::HaltReason::StackUnderflow)
}

/// `Stack::dup`/`Stack::swap` only ever fail with `Underflow` (too
/// shallow) unless the push that follows would overflow; distinguish
/// the two so the halt reason is accurate.
struct HaltErr;
impl HaltErr {
    fn overflow_or_underflow(stack: &primitives::Stack, n: usize) -> crate::frame::HaltReason {
        if stack.len() < n {
            crate::frame::HaltReason::StackUnderflow
        } else {
            crate::frame::HaltReason::StackOverflow
        }
    }
}
