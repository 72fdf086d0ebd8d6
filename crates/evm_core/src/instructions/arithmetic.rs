//! ADD, SUB, MUL, DIV, SDIV, MOD, SMOD, ADDMOD, MULMOD, EXP,
//! SIGNEXTEND. Stack order follows evm.codes: for a binary op the
//! item popped first (`a`, top of stack) is the left operand.

use primitives::U256Ext;

use super::{pop2, pop3, push, R};
use crate::frame::{Frame, HaltReason};
use crate::gas;
use crate::host::Host;

pub fn add(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.wrapping_add(b))
}

pub fn sub(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.wrapping_sub(b))
}

pub fn mul(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.wrapping_mul(b))
}

pub fn div(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.evm_div(b))
}

pub fn sdiv(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.evm_sdiv(b))
}

pub fn rem(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.evm_rem(b))
}

pub fn smod(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, a.evm_srem(b))
}

pub fn addmod(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b, n) = pop3(frame)?;
    push(frame, a.evm_addmod(b, n))
}

pub fn mulmod(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b, n) = pop3(frame)?;
    push(frame, a.evm_mulmod(b, n))
}

pub fn exp(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (base, exponent) = pop2(frame)?;
    let dyn_cost = gas::exp_dynamic_cost(exponent.byte_len(), &frame.spec);
    frame
        .gas
        .consume(dyn_cost)
        .map_err(|_| HaltReason::OutOfGas)?;
    push(frame, base.evm_exp(exponent))
}

pub fn signextend(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (byte_index, value) = pop2(frame)?;
    push(frame, value.evm_signextend(byte_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_stack;
    use alloy::primitives::U256;

    #[test]
    fn add_wraps_at_2_256() {
        let mut host = MockHost::new();
        let mut frame = frame_with_stack(vec![U256::from(1u8), U256::MAX]);
        add(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn div_by_zero_pushes_zero() {
        let mut host = MockHost::new();
        let mut frame = frame_with_stack(vec![U256::ZERO, U256::from(10u8)]);
        div(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn addmod_full_precision() {
        let mut host = MockHost::new();
        let mut frame = frame_with_stack(vec![U256::from(5u8), U256::from(3u8), U256::from(2u8)]);
        addmod(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    }
}
