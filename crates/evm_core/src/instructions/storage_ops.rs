//! SLOAD, SSTORE, TLOAD, TSTORE.

use super::{pop1, pop2, push, R};
use crate::frame::{Frame, HaltReason};
use crate::gas;
use crate::host::Host;

pub fn sload(frame: &mut Frame, host: &mut dyn Host) -> R {
    let key = pop1(frame)?;
    let cold = host.access_slot(frame.address, key);
    let cost = if cold {
        frame.spec.cold_sload_cost
    } else if frame.spec.id >= crate::spec::SpecId::Berlin {
        frame.spec.warm_storage_read_cost
    } else {
        0
    };
    frame.gas.consume(cost).map_err(|_| HaltReason::OutOfGas)?;
    push(frame, host.sload(frame.address, key))
}

/// `SSTORE` is rejected outright in a static context (spec §4.H): no
/// gas is charged, the frame halts immediately.
pub fn sstore(frame: &mut Frame, host: &mut dyn Host) -> R {
    if frame.is_static {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    let (key, new_value) = pop2(frame)?;
    let cold = host.access_slot(frame.address, key);
    if frame.spec.has_net_metered_sstore {
        let current = host.sload(frame.address, key);
        // `sstore_net_metered` wants the original/current pair before this
        // write; the host supplies `original` lazily on first touch.
        let write = host.sstore(frame.address, key, new_value);
        debug_assert_eq!(write.current, current);
        let outcome = gas::sstore_net_metered(write.original, write.current, new_value, cold, &frame.spec);
        frame
            .gas
            .consume(outcome.gas_cost)
            .map_err(|_| HaltReason::OutOfGas)?;
        frame.gas.adjust_refund(outcome.refund_delta);
    } else {
        let write = host.sstore(frame.address, key, new_value);
        let cost = if write.current.is_zero() && !new_value.is_zero() {
            frame.spec.sstore_set_gas
        } else {
            frame.spec.sstore_reset_gas
        };
        frame.gas.consume(cost).map_err(|_| HaltReason::OutOfGas)?;
        if !write.current.is_zero() && new_value.is_zero() {
            frame.gas.adjust_refund(frame.spec.sstore_clears_schedule as i64);
        }
    }
    Ok(())
}

pub fn tload(frame: &mut Frame, host: &mut dyn Host) -> R {
    let key = pop1(frame)?;
    frame
        .gas
        .consume(100)
        .map_err(|_| HaltReason::OutOfGas)?;
    push(frame, host.tload(frame.address, key))
}

pub fn tstore(frame: &mut Frame, host: &mut dyn Host) -> R {
    if frame.is_static {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    let (key, value) = pop2(frame)?;
    frame
        .gas
        .consume(100)
        .map_err(|_| HaltReason::OutOfGas)?;
    host.tstore(frame.address, key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_code;
    use crate::spec::{Spec, SpecId};
    use alloy::primitives::U256;

    #[test]
    fn sstore_in_static_call_halts_without_touching_storage() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.is_static = true;
        frame.stack.push(U256::from(1u8)).unwrap();
        frame.stack.push(U256::ZERO).unwrap();
        let err = sstore(&mut frame, &mut host).unwrap_err();
        assert_eq!(err, HaltReason::StateChangeDuringStaticCall);
        assert_eq!(host.sload(frame.address, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn sstore_set_then_sload_round_trips() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.spec = Spec::resolve(SpecId::Prague);
        frame.stack.push(U256::from(42u8)).unwrap();
        frame.stack.push(U256::from(1u8)).unwrap();
        sstore(&mut frame, &mut host).unwrap();
        frame.stack.push(U256::from(1u8)).unwrap();
        sload(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::from(42u8));
    }

    #[test]
    fn tstore_then_tload_round_trips_and_is_not_persistent_storage() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.stack.push(U256::from(7u8)).unwrap();
        frame.stack.push(U256::from(1u8)).unwrap();
        tstore(&mut frame, &mut host).unwrap();
        frame.stack.push(U256::from(1u8)).unwrap();
        tload(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::from(7u8));
        assert_eq!(host.sload(frame.address, U256::from(1u8)), U256::ZERO);
    }
}
