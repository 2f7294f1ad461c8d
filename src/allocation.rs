use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::error::AllocationResult;
use crate::merkle_tree::{verify_proof, AllocationTree};
use crate::vesting::{evaluate_amount, VestingState};
use crate::whitelist::{parse_address, VestingSchedule, Whitelist};

/// Eligibility answer for one address: amount plus the proof a claim needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub address: Address,
    pub amount: U256,
    pub tier: String,
    pub reason: String,
    pub vesting: Option<VestingSchedule>,
    pub leaf: B256,
    pub proof: Vec<B256>,
}

impl Allocation {
    pub fn verify(&self, root: &B256) -> bool {
        verify_proof(root, &self.leaf, &self.proof)
    }

    pub fn vesting_state(&self, now: u64) -> VestingState {
        evaluate_amount(self.amount, self.vesting, now)
    }

    pub fn proof_hex(&self) -> Vec<String> {
        self.proof.iter().map(|hash| bytes_to_hex(hash.as_slice())).collect()
    }
}

/// Whitelist together with the Merkle tree committed over it.
#[derive(Debug, Clone)]
pub struct AllocationIndex {
    whitelist: Whitelist,
    tree: AllocationTree,
}

impl AllocationIndex {
    pub fn build(whitelist: Whitelist) -> Self {
        let tree = AllocationTree::from_leaves(whitelist.iter().map(|entry| entry.leaf()));

        info!(
            "Allocation tree ready: {} entries, root {}",
            whitelist.len(),
            tree.root()
        );

        AllocationIndex { whitelist, tree }
    }

    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn tree(&self) -> &AllocationTree {
        &self.tree
    }

    /// `None` means the address is not eligible.
    pub fn get_allocation(&self, address: &Address) -> Option<Allocation> {
        let entry = self.whitelist.get(address)?;
        let leaf = entry.leaf();
        let proof = self.tree.proof_for(&leaf)?;

        Some(Allocation {
            address: entry.address,
            amount: entry.amount,
            tier: entry.tier.clone(),
            reason: entry.reason.clone(),
            vesting: entry.vesting,
            leaf,
            proof,
        })
    }

    /// Like [`get_allocation`](Self::get_allocation) for address text in any casing.
    pub fn lookup(&self, address: &str) -> AllocationResult<Option<Allocation>> {
        let address = parse_address(address)?;
        Ok(self.get_allocation(&address))
    }

    /// Proof bundle for every whitelisted address.
    pub fn export(&self) -> AllocationExport {
        let allocations = self
            .whitelist
            .iter()
            .filter_map(|entry| self.get_allocation(&entry.address))
            .map(|allocation| {
                let proof = AllocationProof {
                    allocation: allocation.amount.to_string(),
                    proof: allocation.proof_hex(),
                };
                (allocation.address.to_checksum(None), proof)
            })
            .collect();

        AllocationExport {
            root_hash: bytes_to_hex(self.root().as_slice()),
            allocations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationProof {
    pub allocation: String,
    pub proof: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationExport {
    pub root_hash: String,
    pub allocations: BTreeMap<String, AllocationProof>,
}

#[derive(Debug, Default)]
pub struct ComparisonReport {
    pub root_hash_match: bool,
    pub missing_addresses: Vec<String>,
    pub extra_addresses: Vec<String>,
    pub mismatched_allocations: Vec<String>,
    pub mismatched_proofs: Vec<String>,
}

impl ComparisonReport {
    pub fn proofs_match(&self) -> bool {
        self.missing_addresses.is_empty()
            && self.extra_addresses.is_empty()
            && self.mismatched_allocations.is_empty()
            && self.mismatched_proofs.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.root_hash_match && self.proofs_match()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Comparison Report ===")?;

        if self.root_hash_match {
            writeln!(f, "✓ Root hash matches")?;
        } else {
            writeln!(f, "✗ Root hash DOES NOT match")?;
        }

        if self.proofs_match() {
            writeln!(f, "✓ All proofs match")?;
        } else {
            writeln!(f, "✗ Proofs have differences")?;

            let sections = [
                ("Missing addresses (in reference but not in output)", &self.missing_addresses),
                ("Extra addresses (in output but not in reference)", &self.extra_addresses),
                ("Mismatched allocations", &self.mismatched_allocations),
                ("Mismatched proofs", &self.mismatched_proofs),
            ];

            for (title, addresses) in sections {
                if addresses.is_empty() {
                    continue;
                }
                writeln!(f, "  {}:", title)?;
                for address in addresses {
                    writeln!(f, "    - {}", address)?;
                }
            }
        }

        write!(f, "=========================")
    }
}

/// Compare two proof bundles. Addresses and hashes compare case-insensitively.
pub fn compare_export(actual: &AllocationExport, reference: &AllocationExport) -> ComparisonReport {
    let actual_allocations = normalize_keys(&actual.allocations);
    let reference_allocations = normalize_keys(&reference.allocations);

    let mut report = ComparisonReport {
        root_hash_match: actual.root_hash.eq_ignore_ascii_case(&reference.root_hash),
        ..ComparisonReport::default()
    };

    for address in reference_allocations.keys() {
        if !actual_allocations.contains_key(address) {
            report.missing_addresses.push(address.clone());
        }
    }

    for (address, actual_proof) in &actual_allocations {
        let Some(reference_proof) = reference_allocations.get(address) else {
            report.extra_addresses.push(address.clone());
            continue;
        };

        if actual_proof.allocation.trim() != reference_proof.allocation.trim() {
            report.mismatched_allocations.push(address.clone());
        }

        let proofs_equal = actual_proof.proof.len() == reference_proof.proof.len()
            && actual_proof
                .proof
                .iter()
                .zip(&reference_proof.proof)
                .all(|(left, right)| left.eq_ignore_ascii_case(right));

        if !proofs_equal {
            report.mismatched_proofs.push(address.clone());
        }
    }

    report
}

fn normalize_keys(allocations: &BTreeMap<String, AllocationProof>) -> BTreeMap<String, &AllocationProof> {
    allocations
        .iter()
        .map(|(address, proof)| (address.to_lowercase(), proof))
        .collect()
}

/// Convert bytes to hex string with 0x prefix
pub fn bytes_to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
