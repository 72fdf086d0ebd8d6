//! Hardfork-parameterized configuration: feature gates and gas schedule
//! parameters. Forks form a chain (a degenerate DAG) terminating at
//! `Frontier`; each fork's `Spec` is derived from its base fork's by
//! cloning and applying that fork's deltas, per the design notes in
//! §9 of the spec this crate implements.

/// A named consensus-rule version. Ordinal order is activation order;
/// `SpecId` is `Ord` so `spec_id >= SpecId::Berlin` reads naturally as
/// "Berlin or later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SpecId {
    Frontier = 0,
    FrontierThawing = 1,
    Homestead = 2,
    DaoFork = 3,
    Tangerine = 4,
    SpuriousDragon = 5,
    Byzantium = 6,
    Constantinople = 7,
    Petersburg = 8,
    Istanbul = 9,
    MuirGlacier = 10,
    Berlin = 11,
    London = 12,
    ArrowGlacier = 13,
    GrayGlacier = 14,
    Merge = 15,
    Shanghai = 16,
    Cancun = 17,
    Prague = 18,
}

impl SpecId {
    /// The fork this one inherits from, or `None` for `Frontier`
    /// itself. `FrontierThawing` and `DaoFork` are aliases that inherit
    /// from `Frontier`/`Homestead` respectively without changing any
    /// parameter.
    pub const fn base_fork(self) -> Option<SpecId> {
        use SpecId::*;
        match self {
            Frontier => None,
            FrontierThawing => Some(Frontier),
            Homestead => Some(Frontier),
            DaoFork => Some(Homestead),
            Tangerine => Some(Homestead),
            SpuriousDragon => Some(Tangerine),
            Byzantium => Some(SpuriousDragon),
            Constantinople => Some(Byzantium),
            Petersburg => Some(Constantinople),
            Istanbul => Some(Petersburg),
            MuirGlacier => Some(Istanbul),
            Berlin => Some(MuirGlacier),
            London => Some(Berlin),
            ArrowGlacier => Some(London),
            GrayGlacier => Some(ArrowGlacier),
            Merge => Some(GrayGlacier),
            Shanghai => Some(Merge),
            Cancun => Some(Shanghai),
            Prague => Some(Cancun),
        }
    }

    pub fn is_enabled_in(self, since: SpecId) -> bool {
        self >= since
    }
}

/// Parse error for [`SpecId`]'s `FromStr` impl, used by `bins/evm` to
/// turn a scenario file's `"fork"` field into a `SpecId`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown hardfork name: {0}")]
pub struct UnknownSpecId(pub String);

impl std::str::FromStr for SpecId {
    type Err = UnknownSpecId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SpecId::*;
        Ok(match s.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "frontier" => Frontier,
            "frontierthawing" => FrontierThawing,
            "homestead" => Homestead,
            "daofork" => DaoFork,
            "tangerine" | "tangerinewhistle" => Tangerine,
            "spuriousdragon" => SpuriousDragon,
            "byzantium" => Byzantium,
            "constantinople" => Constantinople,
            "petersburg" => Petersburg,
            "istanbul" => Istanbul,
            "muirglacier" => MuirGlacier,
            "berlin" => Berlin,
            "london" => London,
            "arrowglacier" => ArrowGlacier,
            "grayglacier" => GrayGlacier,
            "merge" | "paris" => Merge,
            "shanghai" => Shanghai,
            "cancun" => Cancun,
            "prague" => Prague,
            other => return Err(UnknownSpecId(other.to_string())),
        })
    }
}

/// Immutable, fully-resolved set of feature flags and gas schedule
/// parameters for one hardfork. Built once (see [`Spec::resolve`]) and
/// shared behind a reference for the lifetime of a call tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spec {
    pub id: SpecId,

    // Feature gates.
    pub has_delegatecall: bool,
    pub has_revert: bool,
    pub has_returndata: bool,
    pub has_staticcall: bool,
    pub has_extcodehash: bool,
    pub has_create2: bool,
    pub has_bitshift_opcodes: bool,
    pub has_net_metered_sstore: bool,
    pub has_selfbalance: bool,
    pub has_chainid: bool,
    pub has_access_list: bool,
    pub has_basefee: bool,
    pub has_prevrandao: bool,
    pub has_push0: bool,
    pub has_tstore: bool,
    pub has_mcopy: bool,
    pub has_blob_opcodes: bool,
    pub has_eip7702: bool,

    // Gas schedule.
    pub sload_cost: u64,
    pub balance_cost: u64,
    pub extcode_cost: u64,
    pub call_cost: u64,
    pub selfdestruct_cost: u64,
    pub exp_byte_cost: u64,
    pub cold_sload_cost: u64,
    pub warm_storage_read_cost: u64,
    pub cold_account_access_cost: u64,
    pub sstore_set_gas: u64,
    pub sstore_reset_gas: u64,
    pub sstore_clears_schedule: u64,
    pub max_refund_quotient: u64,
    pub selfdestruct_refund: u64,
    pub max_code_size: usize,
    pub max_initcode_size: usize,
    pub target_blobs_per_block: u64,
    pub max_blobs_per_block: u64,
    pub block_hash_window: u64,
}

impl Spec {
    const FRONTIER: Spec = Spec {
        id: SpecId::Frontier,
        has_delegatecall: false,
        has_revert: false,
        has_returndata: false,
        has_staticcall: false,
        has_extcodehash: false,
        has_create2: false,
        has_bitshift_opcodes: false,
        has_net_metered_sstore: false,
        has_selfbalance: false,
        has_chainid: false,
        has_access_list: false,
        has_basefee: false,
        has_prevrandao: false,
        has_push0: false,
        has_tstore: false,
        has_mcopy: false,
        has_blob_opcodes: false,
        has_eip7702: false,
        sload_cost: 50,
        balance_cost: 20,
        extcode_cost: 20,
        call_cost: 40,
        selfdestruct_cost: 0,
        exp_byte_cost: 10,
        cold_sload_cost: 0,
        warm_storage_read_cost: 0,
        cold_account_access_cost: 0,
        sstore_set_gas: 20000,
        sstore_reset_gas: 5000,
        sstore_clears_schedule: 15000,
        max_refund_quotient: 2,
        selfdestruct_refund: 24000,
        max_code_size: usize::MAX,
        max_initcode_size: usize::MAX,
        target_blobs_per_block: 0,
        max_blobs_per_block: 0,
        block_hash_window: 256,
    };

    /// Resolve the full parameter set for `id` by walking the fork
    /// chain from `Frontier` forward and applying each fork's deltas in
    /// turn. `SpecId`'s repr order matches activation order, so this is
    /// a straight fold rather than actual recursion per call.
    pub fn resolve(id: SpecId) -> Spec {
        let mut spec = Spec::FRONTIER;
        spec.id = SpecId::Frontier;
        // Deltas are applied in hardfork order up to and including `id`.
        let chain = [
            SpecId::FrontierThawing,
            SpecId::Homestead,
            SpecId::DaoFork,
            SpecId::Tangerine,
            SpecId::SpuriousDragon,
            SpecId::Byzantium,
            SpecId::Constantinople,
            SpecId::Petersburg,
            SpecId::Istanbul,
            SpecId::MuirGlacier,
            SpecId::Berlin,
            SpecId::London,
            SpecId::ArrowGlacier,
            SpecId::GrayGlacier,
            SpecId::Merge,
            SpecId::Shanghai,
            SpecId::Cancun,
            SpecId::Prague,
        ];
        for fork in chain {
            if fork > id {
                break;
            }
            spec.apply_delta(fork);
        }
        spec
    }

    fn apply_delta(&mut self, fork: SpecId) {
        use SpecId::*;
        self.id = fork;
        match fork {
            Frontier | FrontierThawing | DaoFork => {}
            Homestead => {
                self.has_delegatecall = true;
            }
            Tangerine => {
                // EIP-150: a block of intrinsic costs rises.
                self.balance_cost = 400;
                self.extcode_cost = 700;
                self.call_cost = 700;
                self.selfdestruct_cost = 5000;
                self.sload_cost = 200;
            }
            SpuriousDragon => {
                self.max_code_size = 24576;
            }
            Byzantium => {
                self.has_revert = true;
                self.has_returndata = true;
                self.has_staticcall = true;
                self.has_extcodehash = true;
            }
            Constantinople => {
                self.has_create2 = true;
                self.has_bitshift_opcodes = true;
                self.extcode_cost = self.extcode_cost.max(400);
            }
            Petersburg => {}
            Istanbul => {
                // EIP-1884.
                self.sload_cost = 800;
                self.balance_cost = 700;
                self.has_selfbalance = true;
                self.has_chainid = true;
                self.has_net_metered_sstore = true;
                self.sstore_reset_gas = 5000;
            }
            MuirGlacier => {}
            Berlin => {
                // EIP-2929.
                self.has_access_list = true;
                self.cold_sload_cost = 2100;
                self.warm_storage_read_cost = 100;
                self.cold_account_access_cost = 2600;
                self.sstore_reset_gas = 2900;
            }
            London => {
                // EIP-3198, EIP-3529.
                self.has_basefee = true;
                self.max_refund_quotient = 5;
                self.sstore_clears_schedule = 4800;
                self.selfdestruct_refund = 0;
            }
            ArrowGlacier | GrayGlacier => {}
            Merge => {
                self.has_prevrandao = true;
            }
            Shanghai => {
                // EIP-3855, EIP-3860.
                self.has_push0 = true;
                self.max_initcode_size = 49152;
            }
            Cancun => {
                // EIP-1153, 4844, 5656, 7516.
                self.has_tstore = true;
                self.has_mcopy = true;
                self.has_blob_opcodes = true;
                self.target_blobs_per_block = 3;
                self.max_blobs_per_block = 6;
            }
            Prague => {
                // EIP-2537, 2935, 7691, 7702.
                self.has_eip7702 = true;
                self.block_hash_window = 8192;
                self.target_blobs_per_block = 6;
                self.max_blobs_per_block = 9;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_is_base_of_chain() {
        assert_eq!(SpecId::Frontier.base_fork(), None);
    }

    #[test]
    fn chain_terminates_at_frontier_for_every_fork() {
        let all = [
            SpecId::Prague,
            SpecId::Cancun,
            SpecId::Shanghai,
            SpecId::Merge,
            SpecId::London,
            SpecId::Berlin,
            SpecId::Istanbul,
            SpecId::Byzantium,
            SpecId::Homestead,
        ];
        for mut fork in all {
            let mut steps = 0;
            while let Some(base) = fork.base_fork() {
                fork = base;
                steps += 1;
                assert!(steps < 32, "fork chain did not terminate");
            }
            assert_eq!(fork, SpecId::Frontier);
        }
    }

    #[test]
    fn berlin_sload_cold_warm_split() {
        let spec = Spec::resolve(SpecId::Berlin);
        assert_eq!(spec.cold_sload_cost, 2100);
        assert_eq!(spec.warm_storage_read_cost, 100);
        assert_eq!(spec.cold_account_access_cost, 2600);
    }

    #[test]
    fn london_refund_cap_and_clears_schedule() {
        let spec = Spec::resolve(SpecId::London);
        assert_eq!(spec.max_refund_quotient, 5);
        assert_eq!(spec.sstore_clears_schedule, 4800);
        assert_eq!(spec.selfdestruct_refund, 0);
    }

    #[test]
    fn shanghai_enables_push0_and_initcode_cap() {
        let pre = Spec::resolve(SpecId::Berlin);
        let post = Spec::resolve(SpecId::Shanghai);
        assert!(!pre.has_push0);
        assert!(post.has_push0);
        assert_eq!(post.max_initcode_size, 49152);
    }

    #[test]
    fn prague_extends_block_hash_window() {
        let spec = Spec::resolve(SpecId::Prague);
        assert_eq!(spec.block_hash_window, 8192);
        assert!(spec.has_eip7702);
    }
}
