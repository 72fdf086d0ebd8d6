//! Single-threaded interpreter core for EVM bytecode: opcode dispatch,
//! gas accounting, and hardfork-parameterized semantics, talking to the
//! outside world only through the narrow [`host::Host`] seam.
//!
//! `table::build_table` resolves the per-fork dispatch table once per
//! [`spec::Spec`]; `interpreter::run` drives the fetch/decode/charge/
//! execute loop for a single [`frame::Frame`] to completion.

pub mod analysis;
pub mod frame;
pub mod gas;
pub mod host;
pub mod instructions;
pub mod opcodes;
pub mod spec;
pub mod table;
pub mod interpreter;

mod testutil;

pub use frame::{Frame, HaltReason};
pub use host::{BlockEnv, CallInputs, CallKind, CallResult, CallStatus, Env, Host, TxEnv};
pub use interpreter::run_transaction;
pub use spec::{Spec, SpecId};
