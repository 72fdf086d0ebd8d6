//! The narrow seam through which the interpreter talks to the outside
//! world: account/storage reads and writes, snapshotting, and the
//! plain block/transaction context data it needs but does not
//! populate itself (`spec.md` places environment population out of
//! scope for the core; `Env` is the data the embedder hands in).

use alloy::primitives::{Address, B256, U256};

pub mod mock;

/// Opaque handle returned by [`Host::snapshot`]; restores host state
/// via [`Host::revert_to_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub u64);

/// Failure of a value transfer at frame entry (insufficient balance).
/// Reported to the parent frame as a soft failure, never a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient balance to transfer value")]
pub struct InsufficientBalance;

/// Everything the core needs from the persistent account/storage
/// database and the transaction-scoped transient store. Implemented
/// by the embedding system; a simple in-memory mock (see
/// `evm_core::mock_host`) is the recommended test vehicle.
pub trait Host {
    fn balance(&self, addr: Address) -> U256;
    fn code(&self, addr: Address) -> Vec<u8>;
    fn code_hash(&self, addr: Address) -> B256;
    fn code_size(&self, addr: Address) -> usize;
    /// Zero outside the accessible window (last 256 blocks pre-Prague,
    /// last 8192 from Prague on).
    fn block_hash(&self, number: U256) -> B256;
    fn nonce(&self, addr: Address) -> u64;
    /// True iff balance, code, or nonce is nonzero.
    fn account_exists(&self, addr: Address) -> bool;
    fn sload(&self, addr: Address, key: U256) -> U256;
    fn tload(&self, addr: Address, key: U256) -> U256;

    /// EIP-2929 bookkeeping: first touch of `addr` this transaction
    /// flips cold->warm and returns `true` (cold); later touches
    /// return `false`.
    fn access_address(&mut self, addr: Address) -> bool;
    fn is_address_warm(&self, addr: Address) -> bool;
    /// First touch of `(addr, key)` this transaction flips cold->warm
    /// and returns `true` (cold).
    fn access_slot(&mut self, addr: Address, key: U256) -> bool;
    fn is_slot_warm(&self, addr: Address, key: U256) -> bool;

    /// Write `new` to `(addr, key)`. Returns the value originally
    /// present at the start of the transaction (captured lazily, on
    /// first touch of the slot) and the value present immediately
    /// before this write.
    fn sstore(&mut self, addr: Address, key: U256, new: U256) -> SstoreWrite;
    fn tstore(&mut self, addr: Address, key: U256, value: U256);
    /// Zero-value transfers always succeed as a no-op.
    fn transfer(&mut self, from: Address, to: Address, value: U256)
        -> Result<(), InsufficientBalance>;

    fn snapshot(&mut self) -> SnapshotId;
    /// Discards any snapshot taken after `id`, restoring state as of
    /// `id`.
    fn revert_to_snapshot(&mut self, id: SnapshotId);
    /// Resets original-value tracking and any per-transaction
    /// bookkeeping between transactions.
    fn clear_transaction_state(&mut self);
}

/// Result of an `sstore` write, as returned by [`Host::sstore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreWrite {
    pub original: U256,
    pub current: U256,
}

/// One call frame's inputs, built by the caller (or the interpreter
/// itself, for a nested `CALL`-family opcode) and consumed at frame
/// entry.
#[derive(Debug, Clone)]
pub struct CallInputs {
    pub kind: CallKind,
    pub target: Address,
    pub caller: Address,
    pub value: U256,
    pub input: Vec<u8>,
    pub gas_limit: u64,
    pub transfer_value: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

/// Halt reasons, surfaced in [`CallResult::status`] at frame exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Revert,
    OutOfGas,
    InvalidOpcode,
    InvalidJump,
    InvalidPc,
    StackOverflow,
    StackUnderflow,
    StateChangeDuringStaticCall,
    ReturnDataOutOfBounds,
}

/// Produced at frame exit and consumed by the parent. Everything the
/// parent observes about a child call: no partial/mutable access to
/// the child's stack or memory crosses this boundary.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub status: CallStatus,
    pub gas_used: u64,
    pub gas_refund: u64,
    pub output: Vec<u8>,
    /// Empty on every non-success status: a reverted or halted frame's
    /// logs are discarded, never surfaced to the parent.
    pub logs: Vec<crate::frame::Log>,
}

/// Plain block context data, supplied by the embedder at the outermost
/// call and threaded unchanged through every nested frame. The core
/// never populates or validates this — see `SPEC_FULL.md` §4.
#[derive(Debug, Clone, Default)]
pub struct BlockEnv {
    pub number: U256,
    pub coinbase: Address,
    pub timestamp: U256,
    pub gas_limit: U256,
    pub difficulty: U256,
    pub prevrandao: Option<B256>,
    pub basefee: U256,
    pub blob_base_fee: U256,
}

/// Plain transaction context data.
#[derive(Debug, Clone, Default)]
pub struct TxEnv {
    pub caller: Address,
    pub gas_price: U256,
    pub chain_id: u64,
    pub blob_hashes: Vec<B256>,
    pub access_list: Vec<(Address, Vec<U256>)>,
}

#[derive(Debug, Clone, Default)]
pub struct Env {
    pub block: BlockEnv,
    pub tx: TxEnv,
}
