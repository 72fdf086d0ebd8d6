//! JUMP, JUMPI, PC, JUMPDEST, STOP, RETURN, REVERT, INVALID, GAS.
//!
//! Unlike every other family, these handlers are allowed to set
//! `frame.pc` directly (JUMP/JUMPI) or halt the frame (STOP/RETURN/
//! REVERT/INVALID): the interpreter loop's default "advance by
//! `1 + immediate_bytes`" only applies when the handler didn't already
//! move the program counter itself, which it detects by checking
//! `frame.halt` and a `jumped` flag threaded through `Frame`.

use alloy::primitives::U256;
use primitives::U256Ext;

use super::{as_usize, charge_and_grow_memory, pop1, pop2, push, R};
use crate::frame::{Frame, HaltReason};
use crate::host::Host;

pub fn stop(frame: &mut Frame, _host: &mut dyn Host) -> R {
    Err(HaltReason::Success)
}

pub fn jump(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let dest = pop1(frame)?;
    do_jump(frame, dest)
}

pub fn jumpi(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (dest, cond) = pop2(frame)?;
    if cond.is_zero() {
        return Ok(());
    }
    do_jump(frame, dest)
}

fn do_jump(frame: &mut Frame, dest: U256) -> R {
    let pc = dest.try_to_usize().ok_or(HaltReason::InvalidJump)?;
    if !frame.bytecode.is_valid_jump(pc) {
        return Err(HaltReason::InvalidJump);
    }
    frame.pc = pc;
    frame.jumped = true;
    Ok(())
}

pub fn pc(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.pc as u64))
}

pub fn jumpdest(_frame: &mut Frame, _host: &mut dyn Host) -> R {
    Ok(())
}

pub fn ret(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (offset, size) = pop2(frame)?;
    let offset = as_usize(offset)?;
    let size = as_usize(size)?;
    charge_and_grow_memory(frame, offset, size)?;
    frame.output = frame.memory.copy(offset, size).map_err(|_| HaltReason::OutOfGas)?;
    Err(HaltReason::Success)
}

pub fn revert(frame: &mut Frame, _host: &mut dyn Host) -> R {
    let (offset, size) = pop2(frame)?;
    let offset = as_usize(offset)?;
    let size = as_usize(size)?;
    charge_and_grow_memory(frame, offset, size)?;
    frame.output = frame.memory.copy(offset, size).map_err(|_| HaltReason::OutOfGas)?;
    Err(HaltReason::Revert)
}

pub fn invalid(_frame: &mut Frame, _host: &mut dyn Host) -> R {
    Err(HaltReason::InvalidOpcode)
}

pub fn gas(frame: &mut Frame, _host: &mut dyn Host) -> R {
    push(frame, U256::from(frame.gas.remaining()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::opcodes::opcode::{JUMPDEST, PUSH1};
    use crate::testutil::frame_with_code;

    #[test]
    fn jump_to_valid_jumpdest_moves_pc() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[PUSH1, 0x00, JUMPDEST]);
        frame.stack.push(U256::from(2u8)).unwrap();
        jump(&mut frame, &mut host).unwrap();
        assert_eq!(frame.pc, 2);
        assert!(frame.jumped);
    }

    #[test]
    fn jump_into_push_immediate_is_rejected() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[PUSH1, 0x5B]);
        frame.stack.push(U256::from(1u8)).unwrap();
        assert_eq!(jump(&mut frame, &mut host).unwrap_err(), HaltReason::InvalidJump);
    }

    #[test]
    fn jumpi_with_zero_condition_does_not_jump() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[PUSH1, 0x00, JUMPDEST]);
        frame.stack.push(U256::ZERO).unwrap();
        frame.stack.push(U256::from(2u8)).unwrap();
        jumpi(&mut frame, &mut host).unwrap();
        assert!(!frame.jumped);
    }

    #[test]
    fn stop_halts_with_success() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        assert_eq!(stop(&mut frame, &mut host).unwrap_err(), HaltReason::Success);
    }

    #[test]
    fn return_copies_memory_into_output() {
        let mut host = MockHost::new();
        let mut frame = frame_with_code(&[]);
        frame.memory.set(0, &[1, 2, 3, 4]).unwrap();
        frame.stack.push(U256::from(4u8)).unwrap();
        frame.stack.push(U256::ZERO).unwrap();
        let err = ret(&mut frame, &mut host).unwrap_err();
        assert_eq!(err, HaltReason::Success);
        assert_eq!(frame.output, vec![1, 2, 3, 4]);
    }
}
