//! ADDRESS, BALANCE, ORIGIN, CALLER, CALLVALUE, CALLDATA*, CODE*,
//! GASPRICE, EXTCODE*, RETURNDATA*.

use alloy::primitives::{Address, U256};
use primitives::U256Ext;

use super::{as_usize, charge_and_grow_memory, pop1, pop3, push, R};
use crate::frame::{Frame, HaltReason};
use crate::host::Host;

fn address_word(addr: Address) -> U256 {
    U256::from_be_slice_padded(addr.as_slice())
}

pub fn address(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, address_word(frame.address))
}

pub fn balance(frame: &mut Frame, host: &mut dyn Host) -> R {
    let addr_word = pop1(frame)?;
    let addr = word_to_address(addr_word);
    charge_access(frame, host, addr)?;
    push(frame, host.balance(addr))
}

pub fn origin(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, address_word(frame.env.tx.caller))
}

pub fn caller(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, address_word(frame.caller))
}

pub fn callvalue(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.call_value)
}

pub fn calldataload(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let offset = pop1(frame)?;
    let offset = offset.try_to_usize().unwrap_or(usize::MAX);
    let mut buf = [0u8; 32];
    if offset < frame.input.len() {
        let end = (offset + 32).min(frame.input.len());
        let slice = &frame.input[offset..end];
        buf[..slice.len()].copy_from_slice(slice);
    }
    push(frame, U256::from_be_bytes(buf))
}

pub fn calldatasize(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.input.len() as u64))
}

pub fn calldatacopy(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (dest, offset, size) = pop3(frame)?;
    copy_into_memory(frame, dest, offset, size, |f| f.input.clone())
}

pub fn codesize(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.bytecode.len() as u64))
}

pub fn codecopy(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (dest, offset, size) = pop3(frame)?;
    copy_into_memory(frame, dest, offset, size, |f| f.bytecode.code().to_vec())
}

pub fn gasprice(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, frame.env.tx.gas_price)
}

pub fn extcodesize(frame: &mut Frame, host: &mut dyn Host) -> R {
    let addr = word_to_address(pop1(frame)?);
    charge_access(frame, host, addr)?;
    push(frame, U256::from(host.code_size(addr) as u64))
}

pub fn extcodecopy(frame: &mut Frame, host: &mut dyn Host) -> R {
    let addr_word = pop1(frame)?;
    let (dest, offset, size) = pop3(frame)?;
    let addr = word_to_address(addr_word);
    charge_access(frame, host, addr)?;
    let code = host.code(addr);
    copy_slice_into_memory(frame, dest, offset, size, &code)
}

pub fn extcodehash(frame: &mut Frame, host: &mut dyn Host) -> R {
    let addr = word_to_address(pop1(frame)?);
    charge_access(frame, host, addr)?;
    if !host.account_exists(addr) {
        return push(frame, U256::ZERO);
    }
    push(frame, U256::from_be_bytes(*host.code_hash(addr)))
}

pub fn returndatasize(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.return_data.len() as u64))
}

pub fn returndatacopy(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (dest, offset, size) = pop3(frame)?;
    let offset_usize = as_usize(offset)?;
    let size_usize = as_usize(size)?;
    if offset_usize
        .checked_add(size_usize)
        .map(|end| end > frame.return_data.len())
        .unwrap_or(true)
    {
        return Err(HaltReason::ReturnDataOutOfBounds);
    }
    copy_slice_into_memory(frame, dest, offset, size, &frame.return_data.clone())
}

fn word_to_address(word: U256) -> Address {
    let bytes = word.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..32])
}

/// EIP-2929 cold/warm surcharge for BALANCE/EXTCODE* account access.
/// Pre-Berlin there is no warm/cold split — the flat legacy fee is
/// already charged as this opcode's `base_cost`, so this contributes
/// nothing pre-Berlin (charging `extcode_cost` again here would
/// double it on every first touch).
fn charge_access(frame: &mut Frame, host: &mut dyn Host, addr: Address) -> R {
    let cold = host.access_address(addr);
    let cost = if frame.spec.id < crate::spec::SpecId::Berlin {
        0
    } else if cold {
        frame.spec.cold_account_access_cost
    } else {
        frame.spec.warm_storage_read_cost
    };
    frame.gas.consume(cost).map_err(|_| HaltReason::OutOfGas)
}

fn copy_into_memory(
    frame: &mut Frame,
    dest: U256,
    offset: U256,
    size: U256,
    source: impl FnOnce(&Frame) -> Vec<u8>,
) -> R {
    let data = source(frame);
    copy_slice_into_memory(frame, dest, offset, size, &data)
}

fn copy_slice_into_memory(frame: &mut Frame, dest: U256, offset: U256, size: U256, data: &[u8]) -> R {
    let dest = as_usize(dest)?;
    let offset = offset.try_to_usize().unwrap_or(usize::MAX);
    let size = as_usize(size)?;
    charge_and_grow_memory(frame, dest, size)?;
    if size > 0 {
        let word_cost = 3 * (size as u64).div_ceil(32);
        frame.gas.consume(word_cost).map_err(|_| HaltReason::OutOfGas)?;
    }
    let mut buf = vec![0u8; size];
    if offset < data.len() {
        let end = (offset + size).min(data.len());
        let available = &data[offset..end];
        buf[..available.len()].copy_from_slice(available);
    }
    frame
        .memory
        .set(dest, &buf)
        .map_err(|_| HaltReason::OutOfGas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_code;

    #[test]
    fn calldataload_zero_pads_past_input_end() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.input = vec![0xFF, 0xEE];
        frame.stack.push(U256::ZERO).unwrap();
        calldataload(&mut frame, &mut host).unwrap();
        let mut expected = [0u8; 32];
        expected[0] = 0xFF;
        expected[1] = 0xEE;
        assert_eq!(frame.stack.pop().unwrap(), U256::from_be_bytes(expected));
    }

    #[test]
    fn codesize_matches_deployed_bytecode_length() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[0x00, 0x01, 0x02]);
        codesize(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::from(3u8));
    }

    #[test]
    fn extcodesize_of_untouched_account_is_zero_and_warms_it() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        let target = Address::from([9u8; 20]);
        frame.stack.push(address_word(target)).unwrap();
        extcodesize(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
        assert!(host.is_address_warm(target));
    }

    #[test]
    fn returndatacopy_past_bounds_is_rejected() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.return_data = vec![1, 2, 3];
        frame.stack.push(U256::from(10u8)).unwrap(); // size
        frame.stack.push(U256::ZERO).unwrap(); // offset
        frame.stack.push(U256::ZERO).unwrap(); // dest
        assert_eq!(
            returndatacopy(&mut frame, &mut host).unwrap_err(),
            HaltReason::ReturnDataOutOfBounds
        );
    }
}
