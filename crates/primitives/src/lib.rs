//! Leaf data structures shared by the interpreter core: the 256-bit
//! arithmetic extension trait, fixed-byte address/hash codecs, the
//! operand stack, and call-frame memory.
//!
//! Nothing in this crate knows about opcodes, gas, or hardforks — those
//! live in `evm_core`, which depends on this crate the way the rest of
//! the workspace's binaries depend on both.

pub mod errors;
pub mod fixed;
pub mod memory;
pub mod stack;
pub mod uint;

pub use alloy::primitives::{Address, B256, U256};
pub use errors::{FixedBytesError, MemoryError, StackError};
pub use fixed::{is_valid_checksum, parse_address, parse_hex_exact, to_checksum, B160};
pub use memory::{Memory, MEMORY_LIMIT};
pub use stack::{Stack, STACK_LIMIT};
pub use uint::U256Ext;
