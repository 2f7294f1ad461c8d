pub mod allocation;
pub mod config;
pub mod error;
pub mod merkle_tree;
pub mod vesting;
pub mod whitelist;

pub use allocation::{
    compare_export,
    Allocation,
    AllocationExport,
    AllocationIndex,
    AllocationProof,
    ComparisonReport
};
pub use error::{AllocationError, AllocationResult};
pub use merkle_tree::{
    AllocationTree,
    encode_leaf_data,
    hash_pair,
    keccak256,
    leaf_hash,
    parse_hash,
    verify_proof
};
pub use vesting::{evaluate, evaluate_at, VestingState};
pub use whitelist::{parse_address, VestingSchedule, Whitelist, WhitelistEntry};
