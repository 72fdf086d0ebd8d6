//! AND, OR, XOR, NOT, BYTE, SHL, SHR, SAR.

use alloy::primitives::U256;
use primitives::U256Ext;

use super::{pop1, pop2, push, R};
use crate::frame::Frame;
use crate::host::Host;

pub fn and(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a & b)
}

pub fn or(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a | b)
}

pub fn xor(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a ^ b)
}

pub fn not(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let a = pop1(frame)?;
    push(frame, !a)
}

/// Stack order: `byte` pops `i` then `x`, pushing the `i`-th
/// most-significant byte of `x`.
pub fn byte(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (i, x) = pop2(frame)?;
    push(frame, x.evm_byte(i))
}

/// Stack order: `shl`/`shr`/`sar` pop `shift` then `value`.
pub fn shl(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (shift, value) = pop2(frame)?;
    push(frame, value.evm_shl(shift))
}

pub fn shr(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (shift, value) = pop2(frame)?;
    push(frame, value.evm_shr(shift))
}

pub fn sar(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (shift, value) = pop2(frame)?;
    push(frame, value.evm_sar(shift))
}
