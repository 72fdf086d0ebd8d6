//! Error types raised by the leaf data structures (stack, memory, fixed
//! bytes). These map 1:1 onto halt reasons further up in `evm_core`, but
//! stay dependency-free of anything EVM-opcode-specific.

use thiserror::Error;

/// Stack depth violations. The EVM stack is fixed at 1024 entries; both
/// directions are reported, never panicked.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("stack overflow: depth would exceed {0}")]
    Overflow(usize),
    #[error("stack underflow")]
    Underflow,
}

/// Errors raised by `Memory`. `offset + size` overflowing `usize` is
/// distinguished from merely exceeding the hard cap so callers can halt
/// with the right reason.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("offset + size overflowed")]
    IntegerOverflow,
    #[error("access would grow memory past the {0} byte cap")]
    InvalidOffset(usize),
    #[error("out of bounds access: offset {offset} size {size} len {len}")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

/// Errors raised when parsing hex or fixed-length byte containers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixedBytesError {
    #[error("expected {expected} hex digits, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("invalid hex digit in input")]
    InvalidHex,
}
