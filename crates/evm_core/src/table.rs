//! Fork-gated instruction dispatch: one `[Instruction; 256]` array per
//! `SpecId`, built once and cached, matching the `evm.codes`/`revm`
//! convention of compiling a jump table instead of `match`-ing the
//! opcode byte on every step.
//!
//! An opcode not defined on a given fork (e.g. `PUSH0` pre-Shanghai,
//! `TLOAD` pre-Cancun) gets the `unknown` handler, which halts with
//! `HaltReason::InvalidOpcode` — structurally identical to a byte the
//! fork has simply never heard of.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::frame::{Frame, HaltReason};
use crate::host::Host;
use crate::instructions::*;
use crate::opcodes::opcode;
use crate::spec::SpecId;

pub type Instruction = fn(&mut Frame, &mut dyn Host) -> Result<(), HaltReason>;

fn unknown(_frame: &mut Frame, _host: &mut dyn Host) -> Result<(), HaltReason> {
    Err(HaltReason::InvalidOpcode)
}

fn base_table() -> [Instruction; 256] {
    use opcode::*;
    let mut t: [Instruction; 256] = [unknown; 256];

    t[STOP as usize] = control::stop;
    t[ADD as usize] = arithmetic::add;
    t[MUL as usize] = arithmetic::mul;
    t[SUB as usize] = arithmetic::sub;
    t[DIV as usize] = arithmetic::div;
    t[SDIV as usize] = arithmetic::sdiv;
    t[MOD as usize] = arithmetic::rem;
    t[SMOD as usize] = arithmetic::smod;
    t[ADDMOD as usize] = arithmetic::addmod;
    t[MULMOD as usize] = arithmetic::mulmod;
    t[EXP as usize] = arithmetic::exp;
    t[SIGNEXTEND as usize] = arithmetic::signextend;

    t[LT as usize] = comparison::lt;
    t[GT as usize] = comparison::gt;
    t[SLT as usize] = comparison::slt;
    t[SGT as usize] = comparison::sgt;
    t[EQ as usize] = comparison::eq;
    t[ISZERO as usize] = comparison::iszero;
    t[AND as usize] = bitwise::and;
    t[OR as usize] = bitwise::or;
    t[XOR as usize] = bitwise::xor;
    t[NOT as usize] = bitwise::not;
    t[BYTE as usize] = bitwise::byte;
    t[SHL as usize] = bitwise::shl;
    t[SHR as usize] = bitwise::shr;
    t[SAR as usize] = bitwise::sar;

    t[SHA3 as usize] = memory_ops::sha3;

    t[ADDRESS as usize] = environment::address;
    t[BALANCE as usize] = environment::balance;
    t[ORIGIN as usize] = environment::origin;
    t[CALLER as usize] = environment::caller;
    t[CALLVALUE as usize] = environment::callvalue;
    t[CALLDATALOAD as usize] = environment::calldataload;
    t[CALLDATASIZE as usize] = environment::calldatasize;
    t[CALLDATACOPY as usize] = environment::calldatacopy;
    t[CODESIZE as usize] = environment::codesize;
    t[CODECOPY as usize] = environment::codecopy;
    t[GASPRICE as usize] = environment::gasprice;
    t[EXTCODESIZE as usize] = environment::extcodesize;
    t[EXTCODECOPY as usize] = environment::extcodecopy;
    t[RETURNDATASIZE as usize] = environment::returndatasize;
    t[RETURNDATACOPY as usize] = environment::returndatacopy;
    t[EXTCODEHASH as usize] = environment::extcodehash;

    t[BLOCKHASH as usize] = block_info::blockhash;
    t[COINBASE as usize] = block_info::coinbase;
    t[TIMESTAMP as usize] = block_info::timestamp;
    t[NUMBER as usize] = block_info::number;
    t[DIFFICULTY as usize] = block_info::difficulty;
    t[GASLIMIT as usize] = block_info::gaslimit;
    t[CHAINID as usize] = block_info::chainid;
    t[SELFBALANCE as usize] = block_info::selfbalance;
    t[BASEFEE as usize] = block_info::basefee;
    t[BLOBHASH as usize] = block_info::blobhash;
    t[BLOBBASEFEE as usize] = block_info::blobbasefee;

    t[POP as usize] = stack_ops::pop;
    t[MLOAD as usize] = memory_ops::mload;
    t[MSTORE as usize] = memory_ops::mstore;
    t[MSTORE8 as usize] = memory_ops::mstore8;
    t[SLOAD as usize] = storage_ops::sload;
    t[SSTORE as usize] = storage_ops::sstore;
    t[JUMP as usize] = control::jump;
    t[JUMPI as usize] = control::jumpi;
    t[PC as usize] = control::pc;
    t[MSIZE as usize] = memory_ops::msize;
    t[GAS as usize] = control::gas;
    t[JUMPDEST as usize] = control::jumpdest;
    t[TLOAD as usize] = storage_ops::tload;
    t[TSTORE as usize] = storage_ops::tstore;
    t[MCOPY as usize] = memory_ops::mcopy;
    t[PUSH0 as usize] = stack_ops::push0;

    t[PUSH1 as usize] = stack_ops::push_n::<1>;
    t[PUSH1 as usize + 1] = stack_ops::push_n::<2>;
    t[PUSH1 as usize + 2] = stack_ops::push_n::<3>;
    t[PUSH1 as usize + 3] = stack_ops::push_n::<4>;
    t[PUSH1 as usize + 4] = stack_ops::push_n::<5>;
    t[PUSH1 as usize + 5] = stack_ops::push_n::<6>;
    t[PUSH1 as usize + 6] = stack_ops::push_n::<7>;
    t[PUSH1 as usize + 7] = stack_ops::push_n::<8>;
    t[PUSH1 as usize + 8] = stack_ops::push_n::<9>;
    t[PUSH1 as usize + 9] = stack_ops::push_n::<10>;
    t[PUSH1 as usize + 10] = stack_ops::push_n::<11>;
    t[PUSH1 as usize + 11] = stack_ops::push_n::<12>;
    t[PUSH1 as usize + 12] = stack_ops::push_n::<13>;
    t[PUSH1 as usize + 13] = stack_ops::push_n::<14>;
    t[PUSH1 as usize + 14] = stack_ops::push_n::<15>;
    t[PUSH1 as usize + 15] = stack_ops::push_n::<16>;
    t[PUSH1 as usize + 16] = stack_ops::push_n::<17>;
    t[PUSH1 as usize + 17] = stack_ops::push_n::<18>;
    t[PUSH1 as usize + 18] = stack_ops::push_n::<19>;
    t[PUSH1 as usize + 19] = stack_ops::push_n::<20>;
    t[PUSH1 as usize + 20] = stack_ops::push_n::<21>;
    t[PUSH1 as usize + 21] = stack_ops::push_n::<22>;
    t[PUSH1 as usize + 22] = stack_ops::push_n::<23>;
    t[PUSH1 as usize + 23] = stack_ops::push_n::<24>;
    t[PUSH1 as usize + 24] = stack_ops::push_n::<25>;
    t[PUSH1 as usize + 25] = stack_ops::push_n::<26>;
    t[PUSH1 as usize + 26] = stack_ops::push_n::<27>;
    t[PUSH1 as usize + 27] = stack_ops::push_n::<28>;
    t[PUSH1 as usize + 28] = stack_ops::push_n::<29>;
    t[PUSH1 as usize + 29] = stack_ops::push_n::<30>;
    t[PUSH1 as usize + 30] = stack_ops::push_n::<31>;
    t[PUSH1 as usize + 31] = stack_ops::push_n::<32>;

    t[DUP1 as usize] = stack_ops::dup_n::<1>;
    t[DUP1 as usize + 1] = stack_ops::dup_n::<2>;
    t[DUP1 as usize + 2] = stack_ops::dup_n::<3>;
    t[DUP1 as usize + 3] = stack_ops::dup_n::<4>;
    t[DUP1 as usize + 4] = stack_ops::dup_n::<5>;
    t[DUP1 as usize + 5] = stack_ops::dup_n::<6>;
    t[DUP1 as usize + 6] = stack_ops::dup_n::<7>;
    t[DUP1 as usize + 7] = stack_ops::dup_n::<8>;
    t[DUP1 as usize + 8] = stack_ops::dup_n::<9>;
    t[DUP1 as usize + 9] = stack_ops::dup_n::<10>;
    t[DUP1 as usize + 10] = stack_ops::dup_n::<11>;
    t[DUP1 as usize + 11] = stack_ops::dup_n::<12>;
    t[DUP1 as usize + 12] = stack_ops::dup_n::<13>;
    t[DUP1 as usize + 13] = stack_ops::dup_n::<14>;
    t[DUP1 as usize + 14] = stack_ops::dup_n::<15>;
    t[DUP1 as usize + 15] = stack_ops::dup_n::<16>;

    t[SWAP1 as usize] = stack_ops::swap_n::<1>;
    t[SWAP1 as usize + 1] = stack_ops::swap_n::<2>;
    t[SWAP1 as usize + 2] = stack_ops::swap_n::<3>;
    t[SWAP1 as usize + 3] = stack_ops::swap_n::<4>;
    t[SWAP1 as usize + 4] = stack_ops::swap_n::<5>;
    t[SWAP1 as usize + 5] = stack_ops::swap_n::<6>;
    t[SWAP1 as usize + 6] = stack_ops::swap_n::<7>;
    t[SWAP1 as usize + 7] = stack_ops::swap_n::<8>;
    t[SWAP1 as usize + 8] = stack_ops::swap_n::<9>;
    t[SWAP1 as usize + 9] = stack_ops::swap_n::<10>;
    t[SWAP1 as usize + 10] = stack_ops::swap_n::<11>;
    t[SWAP1 as usize + 11] = stack_ops::swap_n::<12>;
    t[SWAP1 as usize + 12] = stack_ops::swap_n::<13>;
    t[SWAP1 as usize + 13] = stack_ops::swap_n::<14>;
    t[SWAP1 as usize + 14] = stack_ops::swap_n::<15>;
    t[SWAP1 as usize + 15] = stack_ops::swap_n::<16>;

    t[LOG0 as usize] = log::log_n::<0>;
    t[LOG0 as usize + 1] = log::log_n::<1>;
    t[LOG0 as usize + 2] = log::log_n::<2>;
    t[LOG0 as usize + 3] = log::log_n::<3>;
    t[LOG0 as usize + 4] = log::log_n::<4>;

    t[CREATE as usize] = system::create;
    t[CALL as usize] = system::call;
    t[CALLCODE as usize] = system::callcode;
    t[RETURN as usize] = control::ret;
    t[DELEGATECALL as usize] = system::delegatecall;
    t[CREATE2 as usize] = system::create2;
    t[STATICCALL as usize] = system::staticcall;
    t[REVERT as usize] = control::revert;
    t[INVALID as usize] = control::invalid;
    t[SELFDESTRUCT as usize] = system::selfdestruct;

    t
}

/// Opcodes gated to a minimum fork, undefined (→ `unknown`) before it.
/// Everything not listed here is either always defined (Frontier) or
/// was never removed once introduced.
fn gated_opcodes() -> &'static [(u8, SpecId)] {
    use opcode::*;
    &[
        (DELEGATECALL, SpecId::Homestead),
        (REVERT, SpecId::Byzantium),
        (RETURNDATASIZE, SpecId::Byzantium),
        (RETURNDATACOPY, SpecId::Byzantium),
        (STATICCALL, SpecId::Byzantium),
        (EXTCODEHASH, SpecId::Byzantium),
        (CREATE2, SpecId::Constantinople),
        (SHL, SpecId::Constantinople),
        (SHR, SpecId::Constantinople),
        (SAR, SpecId::Constantinople),
        (CHAINID, SpecId::Istanbul),
        (SELFBALANCE, SpecId::Istanbul),
        (BASEFEE, SpecId::London),
        (PUSH0, SpecId::Shanghai),
        (TLOAD, SpecId::Cancun),
        (TSTORE, SpecId::Cancun),
        (MCOPY, SpecId::Cancun),
        (BLOBHASH, SpecId::Cancun),
        (BLOBBASEFEE, SpecId::Cancun),
    ]
}

fn build_for(id: SpecId) -> [Instruction; 256] {
    let mut t = base_table();
    for &(byte, since) in gated_opcodes() {
        if id < since {
            t[byte as usize] = unknown;
        }
    }
    t
}

static TABLES: OnceLock<Mutex<HashMap<SpecId, &'static [Instruction; 256]>>> = OnceLock::new();

/// The dispatch table for `id`, built on first use and cached for the
/// lifetime of the process (one table per distinct fork actually run,
/// not all nineteen up front).
pub fn table_for(id: SpecId) -> &'static [Instruction; 256] {
    let cache = TABLES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().expect("table cache mutex poisoned");
    if let Some(table) = guard.get(&id) {
        return table;
    }
    let table: &'static [Instruction; 256] = Box::leak(Box::new(build_for(id)));
    guard.insert(id, table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::opcode;

    #[test]
    fn push0_is_unknown_before_shanghai() {
        let berlin = table_for(SpecId::Berlin);
        let frame_fn = berlin[opcode::PUSH0 as usize];
        assert_eq!(frame_fn as usize, unknown as usize);
    }

    #[test]
    fn push0_is_defined_from_shanghai() {
        let shanghai = table_for(SpecId::Shanghai);
        let frame_fn = shanghai[opcode::PUSH0 as usize];
        assert_ne!(frame_fn as usize, unknown as usize);
    }

    #[test]
    fn tload_is_unknown_before_cancun() {
        let shanghai = table_for(SpecId::Shanghai);
        assert_eq!(
            shanghai[opcode::TLOAD as usize] as usize,
            unknown as usize
        );
    }

    #[test]
    fn arithmetic_opcodes_are_defined_on_every_fork() {
        let frontier = table_for(SpecId::Frontier);
        assert_ne!(frontier[opcode::ADD as usize] as usize, unknown as usize);
    }
}
