//! Helpers shared by the `#[cfg(test)]` modules scattered across
//! `instructions/*`. Not part of the public API.

#![cfg(test)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use alloy::primitives::{Address, U256};

use crate::analysis::AnalyzedBytecode;
use crate::frame::Frame;
use crate::host::Env;
use crate::spec::{Spec, SpecId};

/// A frame over empty bytecode with `values` pushed onto the stack,
/// first element pushed first (so the last element ends up on top).
/// Gas limit is generous; individual tests charge whatever gas they
/// care to assert on top of the frame's starting balance.
pub fn frame_with_stack(values: Vec<U256>) -> Frame {
    let mut frame = frame_with_code(&[]);
    for v in values {
        frame.stack.push(v).expect("test stack does not overflow");
    }
    frame
}

/// A frame over the given bytecode, empty stack, default `SpecId::Prague`
/// ruleset, depth 0, non-static, 10_000_000 gas.
pub fn frame_with_code(code: &[u8]) -> Frame {
    let bytecode = Rc::new(AnalyzedBytecode::analyze(code));
    let spec = Spec::resolve(SpecId::Prague);
    let env = Rc::new(Env::default());
    let selfdestructed = Rc::new(RefCell::new(HashSet::<Address>::new()));
    Frame::new(
        bytecode,
        10_000_000,
        spec,
        env,
        false,
        0,
        Address::ZERO,
        Address::ZERO,
        U256::ZERO,
        Vec::new(),
        selfdestructed,
    )
}
