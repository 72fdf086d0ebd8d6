//! BLOCKHASH, COINBASE, TIMESTAMP, NUMBER, DIFFICULTY/PREVRANDAO,
//! GASLIMIT, CHAINID, SELFBALANCE, BASEFEE, BLOBHASH, BLOBBASEFEE.

use alloy::primitives::U256;
use primitives::U256Ext;

use super::{pop1, push, R};
use crate::frame::Frame;
use crate::host::Host;

fn address_word(addr: alloy::primitives::Address) -> U256 {
    U256::from_be_slice_padded(addr.as_slice())
}

pub fn blockhash(frame: &mut Frame, host: &mut dyn Host) -> R {
    let number = pop1(frame)?;
    let current = frame.env.block.number;
    let window = frame.spec.block_hash_window;
    let in_window = current
        .checked_sub(number)
        .map(|delta| !delta.is_zero() && delta <= U256::from(window))
        .unwrap_or(false);
    if !in_window || number >= current {
        return push(frame, U256::ZERO);
    }
    push(frame, U256::from_be_bytes(*host.block_hash(number)))
}

pub fn coinbase(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, address_word(frame.env.block.coinbase))
}

pub fn timestamp(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.block.timestamp)
}

pub fn number(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.block.number)
}

/// `DIFFICULTY` pre-Merge, `PREVRANDAO` from the Merge on (same
/// opcode byte, different semantics per spec §4.E).
pub fn difficulty(frame: &mut Frame, _host: &mut dyn Host) -> R {
    if frame.spec.has_prevrandao {
        let value = frame
            .env
            .block
            .prevrandao
            .map(|r| U256::from_be_bytes(*r))
            .unwrap_or_default();
        push(frame, value)
    } else {
        push(frame, frame.env.block.difficulty)
    }
}

pub fn gaslimit(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.block.gas_limit)
}

pub fn chainid(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.env.tx.chain_id))
}

pub fn selfbalance(frame: &mut Frame, host: &mut dyn Host) -> R {
    let balance = host.balance(frame.address);
    push(frame, balance)
}

pub fn basefee(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.block.basefee)
}

/// `BLOBHASH` (EIP-4844): index into the transaction's blob hash list,
/// 0 if out of range.
pub fn blobhash(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let index = pop1(frame)?;
    let value = index
        .try_to_usize()
        .and_then(|i| frame.env.tx.blob_hashes.get(i))
        .map(|h| U256::from_be_bytes(**h))
        .unwrap_or_default();
    push(frame, value)
}

pub fn blobbasefee(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.block.blob_base_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_code;
    use std::rc::Rc;

    #[test]
    fn blockhash_outside_window_is_zero() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        let mut env = (*frame.env).clone();
        env.block.number = U256::from(1_000_000u64);
        frame.env = Rc::new(env);
        frame.stack.push(U256::from(1u8)).unwrap();
        blockhash(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn difficulty_reads_prevrandao_post_merge() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        let mut env = (*frame.env).clone();
        env.block.prevrandao = Some(alloy::primitives::B256::from([7u8; 32]));
        frame.env = Rc::new(env);
        frame.spec.has_prevrandao = true;
        difficulty(&mut frame, &mut host).unwrap();
        assert_eq!(
            frame.stack.pop().unwrap(),
            U256::from_be_bytes([7u8; 32])
        );
    }
}
