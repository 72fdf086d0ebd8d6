//! An in-memory [`Host`] implementation. This is the recommended test
//! vehicle per the design notes: every read/write goes through plain
//! `HashMap`s, snapshots are full copies of that state, and original
//! SSTORE values are tracked lazily per the spec's open design note.

use std::collections::HashMap;

use alloy::primitives::{keccak256, Address, B256, U256};

use super::{CallStatus, Host, InsufficientBalance, SnapshotId, SstoreWrite};
use crate::gas::AccessList;

#[derive(Debug, Clone, Default)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Vec<u8>,
    pub storage: HashMap<U256, U256>,
}

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<Address, Account>,
    transient: HashMap<(Address, U256), U256>,
    block_hashes: HashMap<U256, B256>,
    /// Value a slot held at the *start of the current transaction*,
    /// captured on first touch within that transaction (not eagerly).
    original_values: HashMap<(Address, U256), U256>,
}

pub struct MockHost {
    state: State,
    history: Vec<State>,
    access_list: AccessList,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        MockHost {
            state: State::default(),
            history: Vec::new(),
            access_list: AccessList::new(),
        }
    }

    pub fn set_balance(&mut self, addr: Address, balance: U256) {
        self.state.accounts.entry(addr).or_default().balance = balance;
    }

    pub fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.state.accounts.entry(addr).or_default().code = code;
    }

    pub fn set_storage(&mut self, addr: Address, key: U256, value: U256) {
        self.state
            .accounts
            .entry(addr)
            .or_default()
            .storage
            .insert(key, value);
    }

    pub fn set_block_hash(&mut self, number: U256, hash: B256) {
        self.state.block_hashes.insert(number, hash);
    }

    pub fn access_list_mut(&mut self) -> &mut AccessList {
        &mut self.access_list
    }
}

impl Host for MockHost {
    fn balance(&self, addr: Address) -> U256 {
        self.state.accounts.get(&addr).map(|a| a.balance).unwrap_or_default()
    }

    fn code(&self, addr: Address) -> Vec<u8> {
        self.state
            .accounts
            .get(&addr)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    fn code_hash(&self, addr: Address) -> B256 {
        match self.state.accounts.get(&addr) {
            Some(a) if !a.code.is_empty() => keccak256(&a.code),
            _ => keccak256([]),
        }
    }

    fn code_size(&self, addr: Address) -> usize {
        self.state.accounts.get(&addr).map(|a| a.code.len()).unwrap_or(0)
    }

    fn block_hash(&self, number: U256) -> B256 {
        self.state.block_hashes.get(&number).copied().unwrap_or_default()
    }

    fn nonce(&self, addr: Address) -> u64 {
        self.state.accounts.get(&addr).map(|a| a.nonce).unwrap_or(0)
    }

    fn account_exists(&self, addr: Address) -> bool {
        match self.state.accounts.get(&addr) {
            Some(a) => !a.balance.is_zero() || !a.code.is_empty() || a.nonce != 0,
            None => false,
        }
    }

    fn sload(&self, addr: Address, key: U256) -> U256 {
        self.state
            .accounts
            .get(&addr)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or_default()
    }

    fn tload(&self, addr: Address, key: U256) -> U256 {
        self.state.transient.get(&(addr, key)).copied().unwrap_or_default()
    }

    fn access_address(&mut self, addr: Address) -> bool {
        self.access_list.access_address(addr)
    }

    fn is_address_warm(&self, addr: Address) -> bool {
        self.access_list.is_address_warm(addr)
    }

    fn access_slot(&mut self, addr: Address, key: U256) -> bool {
        self.access_list.access_slot(addr, key)
    }

    fn is_slot_warm(&self, addr: Address, key: U256) -> bool {
        self.access_list.is_slot_warm(addr, key)
    }

    fn sstore(&mut self, addr: Address, key: U256, new: U256) -> SstoreWrite {
        let current = self.sload(addr, key);
        let original = *self
            .state
            .original_values
            .entry((addr, key))
            .or_insert(current);
        self.state
            .accounts
            .entry(addr)
            .or_default()
            .storage
            .insert(key, new);
        SstoreWrite { original, current }
    }

    fn tstore(&mut self, addr: Address, key: U256, value: U256) {
        self.state.transient.insert((addr, key), value);
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), InsufficientBalance> {
        if value.is_zero() {
            return Ok(());
        }
        let from_balance = self.balance(from);
        if from_balance < value {
            return Err(InsufficientBalance);
        }
        self.state.accounts.entry(from).or_default().balance = from_balance - value;
        let to_balance = self.balance(to);
        self.state.accounts.entry(to).or_default().balance = to_balance + value;
        Ok(())
    }

    fn snapshot(&mut self) -> SnapshotId {
        self.history.push(self.state.clone());
        SnapshotId((self.history.len() - 1) as u64)
    }

    fn revert_to_snapshot(&mut self, id: SnapshotId) {
        let idx = id.0 as usize;
        if idx < self.history.len() {
            self.state = self.history[idx].clone();
            self.history.truncate(idx);
        }
    }

    fn clear_transaction_state(&mut self) {
        self.state.original_values.clear();
        self.access_list.clear();
        self.history.clear();
    }
}

/// Convenience used only by integration tests / `bins/evm`: did the
/// call succeed.
pub fn succeeded(status: CallStatus) -> bool {
    matches!(status, CallStatus::Success)
}
