//! Opcode byte constants and the structural metadata table the
//! interpreter loop uses to decode each instruction: stack effect,
//! immediate length, control-flow flag, and whether the opcode needs a
//! memory-expansion gas charge before it runs.
//!
//! Constants rather than an enum, matching how the rest of the
//! ecosystem (see e.g. `revm`'s `bytecode::opcode` module) exposes the
//! opcode space: a flat `u8` namespace is what bytecode actually is,
//! and table lookups stay O(1) array indexing either way.

use std::sync::OnceLock;

pub mod opcode {
    pub const STOP: u8 = 0x00;
    pub const ADD: u8 = 0x01;
    pub const MUL: u8 = 0x02;
    pub const SUB: u8 = 0x03;
    pub const DIV: u8 = 0x04;
    pub const SDIV: u8 = 0x05;
    pub const MOD: u8 = 0x06;
    pub const SMOD: u8 = 0x07;
    pub const ADDMOD: u8 = 0x08;
    pub const MULMOD: u8 = 0x09;
    pub const EXP: u8 = 0x0A;
    pub const SIGNEXTEND: u8 = 0x0B;

    pub const LT: u8 = 0x10;
    pub const GT: u8 = 0x11;
    pub const SLT: u8 = 0x12;
    pub const SGT: u8 = 0x13;
    pub const EQ: u8 = 0x14;
    pub const ISZERO: u8 = 0x15;
    pub const AND: u8 = 0x16;
    pub const OR: u8 = 0x17;
    pub const XOR: u8 = 0x18;
    pub const NOT: u8 = 0x19;
    pub const BYTE: u8 = 0x1A;
    pub const SHL: u8 = 0x1B;
    pub const SHR: u8 = 0x1C;
    pub const SAR: u8 = 0x1D;

    pub const SHA3: u8 = 0x20;

    pub const ADDRESS: u8 = 0x30;
    pub const BALANCE: u8 = 0x31;
    pub const ORIGIN: u8 = 0x32;
    pub const CALLER: u8 = 0x33;
    pub const CALLVALUE: u8 = 0x34;
    pub const CALLDATALOAD: u8 = 0x35;
    pub const CALLDATASIZE: u8 = 0x36;
    pub const CALLDATACOPY: u8 = 0x37;
    pub const CODESIZE: u8 = 0x38;
    pub const CODECOPY: u8 = 0x39;
    pub const GASPRICE: u8 = 0x3A;
    pub const EXTCODESIZE: u8 = 0x3B;
    pub const EXTCODECOPY: u8 = 0x3C;
    pub const RETURNDATASIZE: u8 = 0x3D;
    pub const RETURNDATACOPY: u8 = 0x3E;
    pub const EXTCODEHASH: u8 = 0x3F;

    pub const BLOCKHASH: u8 = 0x40;
    pub const COINBASE: u8 = 0x41;
    pub const TIMESTAMP: u8 = 0x42;
    pub const NUMBER: u8 = 0x43;
    pub const DIFFICULTY: u8 = 0x44; // aka PREVRANDAO post-Merge
    pub const GASLIMIT: u8 = 0x45;
    pub const CHAINID: u8 = 0x46;
    pub const SELFBALANCE: u8 = 0x47;
    pub const BASEFEE: u8 = 0x48;
    pub const BLOBHASH: u8 = 0x49;
    pub const BLOBBASEFEE: u8 = 0x4A;

    pub const POP: u8 = 0x50;
    pub const MLOAD: u8 = 0x51;
    pub const MSTORE: u8 = 0x52;
    pub const MSTORE8: u8 = 0x53;
    pub const SLOAD: u8 = 0x54;
    pub const SSTORE: u8 = 0x55;
    pub const JUMP: u8 = 0x56;
    pub const JUMPI: u8 = 0x57;
    pub const PC: u8 = 0x58;
    pub const MSIZE: u8 = 0x59;
    pub const GAS: u8 = 0x5A;
    pub const JUMPDEST: u8 = 0x5B;
    pub const TLOAD: u8 = 0x5C;
    pub const TSTORE: u8 = 0x5D;
    pub const MCOPY: u8 = 0x5E;
    pub const PUSH0: u8 = 0x5F;

    pub const PUSH1: u8 = 0x60;
    // PUSH1..PUSH32 occupy 0x60..=0x7F contiguously.
    pub const PUSH32: u8 = 0x7F;

    pub const DUP1: u8 = 0x80;
    // DUP1..DUP16 occupy 0x80..=0x8F.
    pub const DUP16: u8 = 0x8F;

    pub const SWAP1: u8 = 0x90;
    // SWAP1..SWAP16 occupy 0x90..=0x9F.
    pub const SWAP16: u8 = 0x9F;

    pub const LOG0: u8 = 0xA0;
    pub const LOG1: u8 = 0xA1;
    pub const LOG2: u8 = 0xA2;
    pub const LOG3: u8 = 0xA3;
    pub const LOG4: u8 = 0xA4;

    pub const CREATE: u8 = 0xF0;
    pub const CALL: u8 = 0xF1;
    pub const CALLCODE: u8 = 0xF2;
    pub const RETURN: u8 = 0xF3;
    pub const DELEGATECALL: u8 = 0xF4;
    pub const CREATE2: u8 = 0xF5;
    pub const STATICCALL: u8 = 0xFA;
    pub const REVERT: u8 = 0xFD;
    pub const INVALID: u8 = 0xFE;
    pub const SELFDESTRUCT: u8 = 0xFF;
}

/// Structural metadata for one opcode byte, independent of gas cost
/// (gas is fork-dependent and lives in `gas::base_cost`).
#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    pub name: &'static str,
    pub pops: u8,
    pub pushes: u8,
    pub immediate_bytes: u8,
    pub is_push: bool,
    pub is_control_flow: bool,
    pub needs_memory_cost_update: bool,
    pub defined: bool,
}

const UNDEFINED: OpInfo = OpInfo {
    name: "UNDEFINED",
    pops: 0,
    pushes: 0,
    immediate_bytes: 0,
    is_push: false,
    is_control_flow: false,
    needs_memory_cost_update: false,
    defined: false,
};

fn op(
    name: &'static str,
    pops: u8,
    pushes: u8,
) -> OpInfo {
    OpInfo {
        name,
        pops,
        pushes,
        immediate_bytes: 0,
        is_push: false,
        is_control_flow: false,
        needs_memory_cost_update: false,
        defined: true,
    }
}

fn control(name: &'static str, pops: u8, pushes: u8) -> OpInfo {
    OpInfo {
        is_control_flow: true,
        ..op(name, pops, pushes)
    }
}

fn mem_op(name: &'static str, pops: u8, pushes: u8) -> OpInfo {
    OpInfo {
        needs_memory_cost_update: true,
        ..op(name, pops, pushes)
    }
}

fn build_table() -> [OpInfo; 256] {
    use opcode::*;
    let mut t = [UNDEFINED; 256];

    t[STOP as usize] = control("STOP", 0, 0);
    t[ADD as usize] = op("ADD", 2, 1);
    t[MUL as usize] = op("MUL", 2, 1);
    t[SUB as usize] = op("SUB", 2, 1);
    t[DIV as usize] = op("DIV", 2, 1);
    t[SDIV as usize] = op("SDIV", 2, 1);
    t[MOD as usize] = op("MOD", 2, 1);
    t[SMOD as usize] = op("SMOD", 2, 1);
    t[ADDMOD as usize] = op("ADDMOD", 3, 1);
    t[MULMOD as usize] = op("MULMOD", 3, 1);
    t[EXP as usize] = op("EXP", 2, 1);
    t[SIGNEXTEND as usize] = op("SIGNEXTEND", 2, 1);

    t[LT as usize] = op("LT", 2, 1);
    t[GT as usize] = op("GT", 2, 1);
    t[SLT as usize] = op("SLT", 2, 1);
    t[SGT as usize] = op("SGT", 2, 1);
    t[EQ as usize] = op("EQ", 2, 1);
    t[ISZERO as usize] = op("ISZERO", 1, 1);
    t[AND as usize] = op("AND", 2, 1);
    t[OR as usize] = op("OR", 2, 1);
    t[XOR as usize] = op("XOR", 2, 1);
    t[NOT as usize] = op("NOT", 1, 1);
    t[BYTE as usize] = op("BYTE", 2, 1);
    t[SHL as usize] = op("SHL", 2, 1);
    t[SHR as usize] = op("SHR", 2, 1);
    t[SAR as usize] = op("SAR", 2, 1);

    t[SHA3 as usize] = mem_op("SHA3", 2, 1);

    t[ADDRESS as usize] = op("ADDRESS", 0, 1);
    t[BALANCE as usize] = op("BALANCE", 1, 1);
    t[ORIGIN as usize] = op("ORIGIN", 0, 1);
    t[CALLER as usize] = op("CALLER", 0, 1);
    t[CALLVALUE as usize] = op("CALLVALUE", 0, 1);
    t[CALLDATALOAD as usize] = op("CALLDATALOAD", 1, 1);
    t[CALLDATASIZE as usize] = op("CALLDATASIZE", 0, 1);
    t[CALLDATACOPY as usize] = mem_op("CALLDATACOPY", 3, 0);
    t[CODESIZE as usize] = op("CODESIZE", 0, 1);
    t[CODECOPY as usize] = mem_op("CODECOPY", 3, 0);
    t[GASPRICE as usize] = op("GASPRICE", 0, 1);
    t[EXTCODESIZE as usize] = op("EXTCODESIZE", 1, 1);
    t[EXTCODECOPY as usize] = mem_op("EXTCODECOPY", 4, 0);
    t[RETURNDATASIZE as usize] = op("RETURNDATASIZE", 0, 1);
    t[RETURNDATACOPY as usize] = mem_op("RETURNDATACOPY", 3, 0);
    t[EXTCODEHASH as usize] = op("EXTCODEHASH", 1, 1);

    t[BLOCKHASH as usize] = op("BLOCKHASH", 1, 1);
    t[COINBASE as usize] = op("COINBASE", 0, 1);
    t[TIMESTAMP as usize] = op("TIMESTAMP", 0, 1);
    t[NUMBER as usize] = op("NUMBER", 0, 1);
    t[DIFFICULTY as usize] = op("DIFFICULTY", 0, 1);
    t[GASLIMIT as usize] = op("GASLIMIT", 0, 1);
    t[CHAINID as usize] = op("CHAINID", 0, 1);
    t[SELFBALANCE as usize] = op("SELFBALANCE", 0, 1);
    t[BASEFEE as usize] = op("BASEFEE", 0, 1);
    t[BLOBHASH as usize] = op("BLOBHASH", 1, 1);
    t[BLOBBASEFEE as usize] = op("BLOBBASEFEE", 0, 1);

    t[POP as usize] = op("POP", 1, 0);
    t[MLOAD as usize] = mem_op("MLOAD", 1, 1);
    t[MSTORE as usize] = mem_op("MSTORE", 2, 0);
    t[MSTORE8 as usize] = mem_op("MSTORE8", 2, 0);
    t[SLOAD as usize] = op("SLOAD", 1, 1);
    t[SSTORE as usize] = op("SSTORE", 2, 0);
    t[JUMP as usize] = control("JUMP", 1, 0);
    t[JUMPI as usize] = control("JUMPI", 2, 0);
    t[PC as usize] = op("PC", 0, 1);
    t[MSIZE as usize] = op("MSIZE", 0, 1);
    t[GAS as usize] = op("GAS", 0, 1);
    t[JUMPDEST as usize] = op("JUMPDEST", 0, 0);
    t[TLOAD as usize] = op("TLOAD", 1, 1);
    t[TSTORE as usize] = op("TSTORE", 2, 0);
    t[MCOPY as usize] = mem_op("MCOPY", 3, 0);
    t[PUSH0 as usize] = op("PUSH0", 0, 1);

    for n in 1..=32u8 {
        let byte = PUSH1 + (n - 1);
        t[byte as usize] = OpInfo {
            immediate_bytes: n,
            is_push: true,
            ..op("PUSHn", 0, 1)
        };
    }
    for n in 1..=16u8 {
        let byte = DUP1 + (n - 1);
        t[byte as usize] = op("DUPn", n, n + 1);
    }
    for n in 1..=16u8 {
        let byte = SWAP1 + (n - 1);
        t[byte as usize] = op("SWAPn", n + 1, n + 1);
    }

    for n in 0..=4u8 {
        let byte = LOG0 + n;
        t[byte as usize] = mem_op("LOGn", 2 + n, 0);
    }

    t[CREATE as usize] = mem_op("CREATE", 3, 1);
    t[CALL as usize] = mem_op("CALL", 7, 1);
    t[CALLCODE as usize] = mem_op("CALLCODE", 7, 1);
    t[RETURN as usize] = control(
        "RETURN",
        2,
        0,
    );
    t[RETURN as usize].needs_memory_cost_update = true;
    t[DELEGATECALL as usize] = mem_op("DELEGATECALL", 6, 1);
    t[CREATE2 as usize] = mem_op("CREATE2", 4, 1);
    t[STATICCALL as usize] = mem_op("STATICCALL", 6, 1);
    t[REVERT as usize] = control("REVERT", 2, 0);
    t[REVERT as usize].needs_memory_cost_update = true;
    t[INVALID as usize] = control("INVALID", 0, 0);
    t[SELFDESTRUCT as usize] = control("SELFDESTRUCT", 1, 0);

    t
}

static TABLE: OnceLock<[OpInfo; 256]> = OnceLock::new();

/// Structural metadata for `byte`. O(1) lookup into a table built once
/// per process (it does not vary by fork; fork gating happens at the
/// instruction-table/dispatch level in `table.rs`).
pub fn info(byte: u8) -> OpInfo {
    TABLE.get_or_init(build_table)[byte as usize]
}

/// True for PUSH1..PUSH32.
pub fn is_push(byte: u8) -> bool {
    info(byte).is_push
}

/// Immediate byte count: 1..=32 for PUSH1..PUSH32, else 0.
pub fn immediate_bytes(byte: u8) -> usize {
    info(byte).immediate_bytes as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcode::*;

    #[test]
    fn push_opcodes_carry_correct_immediate_length() {
        assert_eq!(immediate_bytes(PUSH1), 1);
        assert_eq!(immediate_bytes(PUSH32), 32);
        assert!(is_push(PUSH1));
        assert!(!is_push(ADD));
    }

    #[test]
    fn dup_and_swap_depths_are_correct() {
        assert_eq!(info(DUP1).pops, 1);
        assert_eq!(info(DUP16).pops, 16);
        assert_eq!(info(SWAP1).pops, 2);
        assert_eq!(info(SWAP16).pops, 17);
    }

    #[test]
    fn control_flow_opcodes_are_flagged() {
        for byte in [STOP, JUMP, JUMPI, RETURN, REVERT, INVALID, SELFDESTRUCT] {
            assert!(info(byte).is_control_flow, "{byte:#x} should be control flow");
        }
        assert!(!info(ADD).is_control_flow);
    }

    #[test]
    fn undefined_byte_has_no_metadata() {
        assert!(!info(0x0C).defined);
        assert!(!info(0xEF).defined);
    }
}
