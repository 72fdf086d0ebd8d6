//! Bytecode analysis: the one-time scan that produces a JUMPDEST
//! bitmap for a piece of code, plus EIP-7702 delegation-header
//! detection for accounts whose "code" is actually a pointer to
//! another account's code.

use alloy::primitives::Address;

use crate::opcodes;

/// Exactly 23 bytes: `0xEF 0x01 || version(1) || address(20)`.
const DELEGATION_LEN: usize = 23;
const DELEGATION_MAGIC: [u8; 2] = [0xEF, 0x01];
const DELEGATION_VERSION: u8 = 0x00;

/// Raw bytecode plus the JUMPDEST bitmap computed for it. Cheap to
/// clone (an `Rc`/`Arc` wrapper at the call site is recommended when
/// caching by code hash); this type itself holds owned buffers so it
/// can be built once and shared by reference.
#[derive(Debug, Clone)]
pub struct AnalyzedBytecode {
    code: Vec<u8>,
    jumpdests: Vec<bool>,
}

impl AnalyzedBytecode {
    /// Scan `code` left to right: a PUSH opcode advances the cursor by
    /// `1 + immediate_bytes` without inspecting the skipped bytes;
    /// any other byte advances the cursor by 1 and sets the JUMPDEST
    /// bit if it is `0x5B`. O(n) in code length.
    pub fn analyze(code: &[u8]) -> AnalyzedBytecode {
        let mut jumpdests = vec![false; code.len()];
        let mut pc = 0usize;
        while pc < code.len() {
            let byte = code[pc];
            if opcodes::is_push(byte) {
                pc += 1 + opcodes::immediate_bytes(byte);
            } else {
                if byte == opcodes::opcode::JUMPDEST {
                    jumpdests[pc] = true;
                }
                pc += 1;
            }
        }
        AnalyzedBytecode {
            code: code.to_vec(),
            jumpdests,
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn byte_at(&self, pc: usize) -> Option<u8> {
        self.code.get(pc).copied()
    }

    /// True iff `pc` holds a `JUMPDEST` byte reachable by the
    /// sequential scanner, i.e. not embedded inside a PUSH immediate.
    pub fn is_valid_jump(&self, pc: usize) -> bool {
        self.jumpdests.get(pc).copied().unwrap_or(false)
    }
}

/// An EIP-7702 delegation: the 23-byte code form that redirects
/// execution to another account's code for the duration of the
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delegation {
    pub target: Address,
}

/// Bytecode as seen by an account: either ordinary code to analyze, or
/// a parsed EIP-7702 delegation pointing elsewhere.
#[derive(Debug, Clone)]
pub enum AccountCode {
    Analyzed(AnalyzedBytecode),
    Delegated(Delegation),
}

/// Classify raw account code: if it begins with the 2-byte
/// `0xEF 0x01` magic, parse strictly as a delegation (any other
/// length or version is a parse failure, represented here as `None`
/// falling back to ordinary analysis — callers that must distinguish
/// "malformed delegation" from "ordinary code starting with EF01"
/// should use `parse_delegation` directly). Otherwise, analyze as
/// regular bytecode.
pub fn classify(code: &[u8]) -> AccountCode {
    if code.len() >= 2 && code[0] == DELEGATION_MAGIC[0] && code[1] == DELEGATION_MAGIC[1] {
        if let Some(delegation) = parse_delegation(code) {
            return AccountCode::Delegated(delegation);
        }
    }
    AccountCode::Analyzed(AnalyzedBytecode::analyze(code))
}

/// Strict EIP-7702 delegation parse: length must be exactly 23,
/// magic `0xEF 0x01`, version byte `0x00`. Any deviation fails.
pub fn parse_delegation(code: &[u8]) -> Option<Delegation> {
    if code.len() != DELEGATION_LEN {
        return None;
    }
    if code[0] != DELEGATION_MAGIC[0] || code[1] != DELEGATION_MAGIC[1] {
        return None;
    }
    if code[2] != DELEGATION_VERSION {
        return None;
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&code[3..23]);
    Some(Delegation {
        target: Address::from(addr),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::opcode::*;

    #[test]
    fn jumpdest_inside_push_immediate_is_not_valid() {
        // PUSH2 0x5B5B, JUMPDEST
        let code = [PUSH1 + 1, 0x5B, 0x5B, JUMPDEST];
        let analyzed = AnalyzedBytecode::analyze(&code);
        assert!(!analyzed.is_valid_jump(1));
        assert!(!analyzed.is_valid_jump(2));
        assert!(analyzed.is_valid_jump(3));
    }

    #[test]
    fn empty_bytecode_has_no_jumpdests() {
        let analyzed = AnalyzedBytecode::analyze(&[]);
        assert!(!analyzed.is_valid_jump(0));
        assert_eq!(analyzed.len(), 0);
    }

    #[test]
    fn delegation_requires_exact_length_and_version() {
        let mut good = vec![0xEF, 0x01, 0x00];
        good.extend_from_slice(&[0x11; 20]);
        assert!(parse_delegation(&good).is_some());

        let mut wrong_version = good.clone();
        wrong_version[2] = 0x01;
        assert!(parse_delegation(&wrong_version).is_none());

        let mut wrong_len = good.clone();
        wrong_len.push(0x00);
        assert!(parse_delegation(&wrong_len).is_none());
    }

    #[test]
    fn classify_falls_back_to_analysis_for_non_delegation_code() {
        let code = [ADD, STOP];
        match classify(&code) {
            AccountCode::Analyzed(a) => assert_eq!(a.len(), 2),
            AccountCode::Delegated(_) => panic!("should not be a delegation"),
        }
    }
}
