//! CREATE, CREATE2, CALL, CALLCODE, DELEGATECALL, STATICCALL,
//! SELFDESTRUCT.
//!
//! The CALL/CREATE family can't finish inside a single handler call:
//! running the child contract means recursing into the interpreter
//! loop, which lives one layer up (`interpreter.rs`, to avoid a cyclic
//! dependency between this module and the loop that dispatches into
//! it). Handlers here do everything that doesn't require running the
//! child — pop operands, charge what's chargeable up front, apply the
//! depth/static-mode invariants — then stash a `PendingCall` on the
//! frame for the loop to execute and resolve.

use alloy::primitives::{keccak256, Address, U256};
use primitives::U256Ext;

use super::{as_usize, charge_and_grow_memory, pop1, pop2, push, R};
use crate::frame::{Frame, HaltReason, PendingCall};
use crate::host::{CallInputs, CallKind, Host};

const MAX_CALL_DEPTH: u32 = 1024;
const CREATE_BASE_COST: u64 = 32000;

fn address_word(addr: Address) -> U256 {
    U256::from_be_slice_padded(addr.as_slice())
}

fn word_to_address(word: U256) -> Address {
    let bytes = word.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..32])
}

/// RLP-encodes a byte string: single bytes below `0x80` encode as
/// themselves, everything else gets a length-prefixed wrapper. Nonces
/// in a `CREATE` address derivation are always short enough that the
/// long-form (`0xb8..`) length prefix never applies.
fn rlp_encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        out.push(bytes[0]);
    } else {
        out.push(0x80 + bytes.len() as u8);
        out.extend_from_slice(bytes);
    }
}

/// `CREATE`'s target address: the low 20 bytes of
/// `keccak256(rlp([sender, nonce]))`, per the Yellow Paper's contract
/// address formula.
fn create_address(sender: Address, nonce: u64) -> Address {
    let nonce_bytes = nonce.to_be_bytes();
    let trimmed = match nonce_bytes.iter().position(|&b| b != 0) {
        Some(i) => &nonce_bytes[i..],
        None => &[][..],
    };
    let mut sender_rlp = Vec::with_capacity(21);
    rlp_encode_bytes(sender.as_slice(), &mut sender_rlp);
    let mut nonce_rlp = Vec::with_capacity(9);
    rlp_encode_bytes(trimmed, &mut nonce_rlp);

    let payload_len = sender_rlp.len() + nonce_rlp.len();
    let mut encoded = Vec::with_capacity(1 + payload_len);
    encoded.push(0xc0 + payload_len as u8);
    encoded.extend_from_slice(&sender_rlp);
    encoded.extend_from_slice(&nonce_rlp);

    let hash = keccak256(&encoded);
    Address::from_slice(&hash[12..32])
}

/// `CREATE2`'s target address: EIP-1014,
/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12:]`.
fn create2_address(sender: Address, salt: [u8; 32], init_code_hash: alloy::primitives::B256) -> Address {
    let mut buf = [0u8; 85];
    buf[0] = 0xff;
    buf[1..21].copy_from_slice(sender.as_slice());
    buf[21..53].copy_from_slice(&salt);
    buf[53..85].copy_from_slice(init_code_hash.as_slice());
    let hash = keccak256(buf);
    Address::from_slice(&hash[12..32])
}

/// `available - available/64`, the EIP-150 forwarding cap.
fn capped_forward(available: u64, requested: Option<u64>) -> u64 {
    let cap = available - available / 64;
    match requested {
        Some(r) => r.min(cap),
        None => cap,
    }
}

fn charge_target_access(frame: &mut Frame, host: &mut dyn Host, target: Address) -> Result<(), HaltReason> {
    let cold = host.access_address(target);
    let cost = if cold {
        frame.spec.cold_account_access_cost
    } else if frame.spec.id >= crate::spec::SpecId::Berlin {
        frame.spec.warm_storage_read_cost
    } else {
        0
    };
    frame.gas.consume(cost).map_err(|_| HaltReason::OutOfGas)
}

fn create_common(
    frame: &mut Frame,
    host: &mut dyn Host,
    kind: CallKind,
    value: U256,
    offset: U256,
    size: U256,
    target: Address,
) -> R {
    if frame.is_static {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    let offset = as_usize(offset)?;
    let size = as_usize(size)?;
    if size > frame.spec.max_initcode_size {
        return Err(HaltReason::OutOfGas);
    }
    charge_and_grow_memory(frame, offset, size)?;
    let word_cost = 2 * (size as u64).div_ceil(32);
    frame
        .gas
        .consume(CREATE_BASE_COST + word_cost)
        .map_err(|_| HaltReason::OutOfGas)?;

    if frame.depth + 1 >= MAX_CALL_DEPTH || host.balance(frame.address) < value {
        return push(frame, U256::ZERO);
    }

    let init_code = frame.memory.copy(offset, size).map_err(|_| HaltReason::OutOfGas)?;
    let forwarded = capped_forward(frame.gas.remaining(), None);
    frame.gas.consume(forwarded).map_err(|_| HaltReason::OutOfGas)?;

    frame.pending_call = Some(PendingCall {
        inputs: CallInputs {
            kind,
            target,
            caller: frame.address,
            value,
            input: init_code,
            gas_limit: forwarded,
            transfer_value: true,
        },
        ret_offset: 0,
        ret_size: 0,
    });
    Ok(())
}

pub fn create(frame: &mut Frame, host: &mut dyn Host) -> R {
    let (value, offset, size) = super::pop3(frame)?;
    let nonce = host.nonce(frame.address);
    let target = create_address(frame.address, nonce);
    create_common(frame, host, CallKind::Create, value, offset, size, target)
}

pub fn create2(frame: &mut Frame, host: &mut dyn Host) -> R {
    let value = pop1(frame)?;
    let offset = pop1(frame)?;
    let size = pop1(frame)?;
    let salt = pop1(frame)?;
    let offset_usize = as_usize(offset)?;
    let size_usize = as_usize(size)?;
    charge_and_grow_memory(frame, offset_usize, size_usize)?;
    let init_code = frame
        .memory
        .copy(offset_usize, size_usize)
        .map_err(|_| HaltReason::OutOfGas)?;
    let init_code_hash = keccak256(&init_code);
    let target = create2_address(frame.address, salt.to_be_bytes::<32>(), init_code_hash);
    create_common(frame, host, CallKind::Create2, value, offset, size, target)
}

fn call_common(
    frame: &mut Frame,
    host: &mut dyn Host,
    kind: CallKind,
    gas_arg: U256,
    target: Address,
    value: U256,
    args_offset: U256,
    args_size: U256,
    ret_offset: U256,
    ret_size: U256,
) -> R {
    let transfer_value = matches!(kind, CallKind::Call | CallKind::CallCode) && !value.is_zero();
    if frame.is_static && matches!(kind, CallKind::Call) && transfer_value {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    charge_target_access(frame, host, target)?;

    let args_offset = as_usize(args_offset)?;
    let args_size = as_usize(args_size)?;
    let ret_offset = as_usize(ret_offset)?;
    let ret_size = as_usize(ret_size)?;
    charge_and_grow_memory(frame, args_offset, args_size)?;
    charge_and_grow_memory(frame, ret_offset, ret_size)?;

    if frame.depth + 1 >= MAX_CALL_DEPTH
        || (transfer_value && host.balance(frame.address) < value)
    {
        return push(frame, U256::ZERO);
    }

    let input = frame
        .memory
        .copy(args_offset, args_size)
        .map_err(|_| HaltReason::OutOfGas)?;
    let requested = gas_arg.try_to_u64();
    let forwarded = capped_forward(frame.gas.remaining(), requested);
    frame.gas.consume(forwarded).map_err(|_| HaltReason::OutOfGas)?;
    // Historical stipend: a non-zero value transfer hands the callee
    // 2300 extra gas on top of what was explicitly forwarded.
    let forwarded = if transfer_value { forwarded + 2300 } else { forwarded };

    let caller = match kind {
        CallKind::DelegateCall => frame.caller,
        _ => frame.address,
    };
    let effective_value = match kind {
        CallKind::DelegateCall => frame.call_value,
        _ => value,
    };

    frame.pending_call = Some(PendingCall {
        inputs: CallInputs {
            kind,
            target,
            caller,
            value: effective_value,
            input,
            gas_limit: forwarded,
            transfer_value,
        },
        ret_offset,
        ret_size,
    });
    Ok(())
}

pub fn call(frame: &mut Frame, host: &mut dyn Host) -> R {
    let gas_arg = pop1(frame)?;
    let target = word_to_address(pop1(frame)?);
    let value = pop1(frame)?;
    let (args_offset, args_size) = pop2(frame)?;
    let (ret_offset, ret_size) = pop2(frame)?;
    call_common(
        frame,
        host,
        CallKind::Call,
        gas_arg,
        target,
        value,
        args_offset,
        args_size,
        ret_offset,
        ret_size,
    )
}

pub fn callcode(frame: &mut Frame, host: &mut dyn Host) -> R {
    let gas_arg = pop1(frame)?;
    let target = word_to_address(pop1(frame)?);
    let value = pop1(frame)?;
    let (args_offset, args_size) = pop2(frame)?;
    let (ret_offset, ret_size) = pop2(frame)?;
    call_common(
        frame,
        host,
        CallKind::CallCode,
        gas_arg,
        target,
        value,
        args_offset,
        args_size,
        ret_offset,
        ret_size,
    )
}

pub fn delegatecall(frame: &mut Frame, host: &mut dyn Host) -> R {
    let gas_arg = pop1(frame)?;
    let target = word_to_address(pop1(frame)?);
    let (args_offset, args_size) = pop2(frame)?;
    let (ret_offset, ret_size) = pop2(frame)?;
    call_common(
        frame,
        host,
        CallKind::DelegateCall,
        gas_arg,
        target,
        U256::ZERO,
        args_offset,
        args_size,
        ret_offset,
        ret_size,
    )
}

pub fn staticcall(frame: &mut Frame, host: &mut dyn Host) -> R {
    let gas_arg = pop1(frame)?;
    let target = word_to_address(pop1(frame)?);
    let (args_offset, args_size) = pop2(frame)?;
    let (ret_offset, ret_size) = pop2(frame)?;
    call_common(
        frame,
        host,
        CallKind::StaticCall,
        gas_arg,
        target,
        U256::ZERO,
        args_offset,
        args_size,
        ret_offset,
        ret_size,
    )
}

/// `SELFDESTRUCT`: disallowed in static mode. Refund is granted only
/// on forks where `selfdestruct_refund != 0` and this is the first
/// time this address is scheduled for destruction in this
/// transaction (spec §4.H).
pub fn selfdestruct(frame: &mut Frame, host: &mut dyn Host) -> R {
    if frame.is_static {
        return Err(HaltReason::StateChangeDuringStaticCall);
    }
    let beneficiary = word_to_address(pop1(frame)?);
    let cold = host.access_address(beneficiary);
    if cold {
        frame
            .gas
            .consume(frame.spec.cold_account_access_cost)
            .map_err(|_| HaltReason::OutOfGas)?;
    }
    frame
        .gas
        .consume(frame.spec.selfdestruct_cost)
        .map_err(|_| HaltReason::OutOfGas)?;

    let balance = host.balance(frame.address);
    if !balance.is_zero() {
        let _ = host.transfer(frame.address, beneficiary, balance);
    }

    let first_time = frame
        .selfdestructed_this_tx
        .borrow_mut()
        .insert(frame.address);
    if first_time && frame.spec.selfdestruct_refund != 0 {
        frame.gas.adjust_refund(frame.spec.selfdestruct_refund as i64);
    }
    Err(HaltReason::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::testutil::frame_with_code;

    #[test]
    fn call_at_max_depth_fails_softly_without_pending_call() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.depth = MAX_CALL_DEPTH - 1;
        frame.stack.push(U256::ZERO).unwrap(); // ret size
        frame.stack.push(U256::ZERO).unwrap(); // ret offset
        frame.stack.push(U256::ZERO).unwrap(); // args size
        frame.stack.push(U256::ZERO).unwrap(); // args offset
        frame.stack.push(U256::ZERO).unwrap(); // value
        frame.stack.push(address_word(Address::from([1u8; 20]))).unwrap();
        frame.stack.push(U256::from(1000u64)).unwrap(); // gas
        call(&mut frame, &mut host).unwrap();
        assert_eq!(frame.stack.pop().unwrap(), U256::ZERO);
        assert!(frame.pending_call.is_none());
    }

    #[test]
    fn selfdestruct_halts_and_transfers_full_balance() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        host.set_balance(frame.address, U256::from(100u8));
        let beneficiary = Address::from([2u8; 20]);
        frame.stack.push(address_word(beneficiary)).unwrap();
        let err = selfdestruct(&mut frame, &mut host).unwrap_err();
        assert_eq!(err, HaltReason::Success);
        assert_eq!(host.balance(beneficiary), U256::from(100u8));
        assert_eq!(host.balance(frame.address), U256::ZERO);
    }

    #[test]
    fn selfdestruct_in_static_call_is_rejected() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.is_static = true;
        frame.stack.push(U256::ZERO).unwrap();
        assert_eq!(
            selfdestruct(&mut frame, &mut host).unwrap_err(),
            HaltReason::StateChangeDuringStaticCall
        );
    }
}
