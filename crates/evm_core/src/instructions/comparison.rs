//! LT, GT, SLT, SGT, EQ, ISZERO.

use alloy::primitives::{I256, U256};

use super::{pop1, pop2, push, R};
use crate::frame::Frame;
use crate::host::Host;

fn bool_word(b: bool) -> U256 {
    if b {
        U256::from(1u8)
    } else {
        U256::ZERO
    }
}

pub fn lt(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, bool_word(a < b))
}

pub fn gt(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, bool_word(a > b))
}

pub fn slt(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    let result = I256::from_raw(a) < I256::from_raw(b);
    push(frame, bool_word(result))
}

pub fn sgt(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    let result = I256::from_raw(a) > I256::from_raw(b);
    push(frame, bool_word(result))
}

pub fn eq(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (a, b) = pop2(frame)?;
    push(frame, bool_word(a == b))
}

pub fn iszero(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let a = pop1(frame)?;
    push(frame, bool_word(a.is_zero()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_stack;

    #[test]
    fn slt_treats_high_bit_as_negative() {
        let mut host = MockHost::new();
        // -1 < 1
        let mut frame = frame_with_stack(vec![U256::from(1u8), U256::MAX]);
        slt(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::from(1u8));
    }

    #[test]
    fn lt_is_unsigned_so_max_is_never_less() {
        let mut host = MockHost::new();
        let mut frame = frame_with_stack(vec![U256::from(1u8), U256::MAX]);
        lt(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn iszero_of_zero_is_one() {
        let mut host = MockHost::new();
        let mut frame = frame_with_stack(vec![U256::ZERO]);
        iszero(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::from(1u8));
    }
}
