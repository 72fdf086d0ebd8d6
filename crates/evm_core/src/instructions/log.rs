//! LOG0..LOG4. Rejected outright in a static context; each topic adds
//! a flat surcharge on top of the data-dependent base cost.

use alloy::primitives::B256;

use super::{as_usize, charge_and_grow_memory, pop2, R};
use crate::frame::{Frame, HaltReason, Log};
use crate::host::Host;

const LOG_DATA_GAS_PER_BYTE: u64 = 8;
const LOG_TOPIC_GAS: u64 = 375;

/// One family function parameterized by topic count, matching the
/// const-generic pattern used for PUSH/DUP/SWAP.
pub fn log_n<const N: usize>(frame: &mut Frame, _host: &mut dyn Host) -> R {
    if frame.is_static {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    let (offset, size) = pop2(frame)?;
    let offset = as_usize(offset)?;
    let size = as_usize(size)?;
    let mut topics = [B256::ZERO; 4];
    for slot in topics.iter_mut().take(N) {
        let word = frame.stack.pop().map_err(|_| HaltReason::StackUnderflow)?;
        *slot = B256::from(word.to_be_bytes::<32>());
    }
    charge_and_grow_memory(frame, offset, size)?;
    frame
        .gas
        .consume(LOG_DATA_GAS_PER_BYTE * size as u64)
        .map_err(|_| HaltReason::OutOfGas)?;
    frame
        .gas
        .consume(LOG_TOPIC_GAS * N as u64)
        .map_err(|_| HaltReason::OutOfGas)?;
    let data = frame.memory.copy(offset, size).map_err(|_| HaltReason::OutOfGas)?;
    frame.logs.push(Log {
        address: frame.address,
        topics: topics[..N].to_vec(),
        data,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_code;
    use alloy::primitives::U256;

    #[test]
    fn log_in_static_call_is_rejected() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.is_static = true;
        frame.stack.push(U256::ZERO).unwrap();
        frame.stack.push(U256::ZERO).unwrap();
        assert_eq!(
            log_n::<0>(&mut frame, &mut host).unwrap_err(),
            HaltReason::StateChangeDuringStaticCall
        );
    }

    #[test]
    fn log2_consumes_two_topics_and_charges_per_topic() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.stack.push(U256::from(2u8)).unwrap(); // topic2
        frame.stack.push(U256::from(1u8)).unwrap(); // topic1
        frame.stack.push(U256::ZERO).unwrap(); // size
        frame.stack.push(U256::ZERO).unwrap(); // offset
        let before = frame.gas.remaining();
        log_n::<2>(&mut frame, &mut host).unwrap();
        assert!(frame.stack.is_empty());
        assert_eq!(before - frame.gas.remaining(), LOG_TOPIC_GAS * 2);
    }
}
