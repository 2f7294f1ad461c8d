use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use airdrop_allocation::{
    hash_pair, leaf_hash, verify_proof, AllocationIndex, AllocationTree, Whitelist, WhitelistEntry,
};

const FIXTURE_ROOT: &str = "0xc10abf034d6b86efdff9cf9961d2fe2119672a0a1c1c338556c4ae262915f790";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn b256(hex_str: &str) -> B256 {
    B256::from_str(hex_str).unwrap()
}

fn fixture_entries() -> Vec<WhitelistEntry> {
    Whitelist::load(fixture("whitelist.json"))
        .unwrap()
        .iter()
        .cloned()
        .collect()
}

#[test]
fn test_fixture_root_matches_reference() {
    let index = AllocationIndex::build(Whitelist::load(fixture("whitelist.json")).unwrap());

    assert_eq!(index.root(), b256(FIXTURE_ROOT));
    assert_eq!(index.tree().leaf_count(), 5);
    assert_eq!(index.tree().depth(), 3);
}

#[test]
fn test_json_and_csv_produce_same_root() {
    let from_json = AllocationIndex::build(Whitelist::load(fixture("whitelist.json")).unwrap());
    let from_csv = AllocationIndex::build(Whitelist::load(fixture("whitelist.csv")).unwrap());

    assert_eq!(from_json.root(), from_csv.root());
    assert_eq!(from_json.export(), from_csv.export());
}

#[test]
fn test_build_is_deterministic() {
    let first = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());
    let second = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());

    assert_eq!(first.root(), second.root());
}

#[test]
fn test_root_independent_of_entry_order() {
    let entries = fixture_entries();
    let expected = b256(FIXTURE_ROOT);

    for rotation in 0..entries.len() {
        let mut reordered = entries.clone();
        reordered.rotate_left(rotation);
        let root = AllocationIndex::build(Whitelist::from_entries(reordered.clone()).unwrap()).root();
        assert_eq!(root, expected, "rotation {}", rotation);

        reordered.reverse();
        let root = AllocationIndex::build(Whitelist::from_entries(reordered).unwrap()).root();
        assert_eq!(root, expected, "reversed rotation {}", rotation);
    }
}

#[test]
fn test_every_entry_has_valid_proof() {
    let index = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());
    let root = index.root();

    for entry in index.whitelist().iter() {
        let allocation = index.get_allocation(&entry.address).unwrap();

        assert_eq!(allocation.leaf, leaf_hash(&entry.address, &entry.amount));
        assert_eq!(allocation.amount, entry.amount);
        assert!(verify_proof(&root, &allocation.leaf, &allocation.proof));
        assert!(allocation.verify(&root));
    }
}

#[test]
fn test_known_proofs() {
    let index = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());

    // the 750 leaf is the odd one out and gets promoted to the top level
    let promoted = index
        .lookup("0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb")
        .unwrap()
        .unwrap();
    assert_eq!(
        promoted.proof,
        vec![b256("0x705e065303201acf407d5d4a7fddf1a15f36b7f9ce694f23eeb2997baf5d06c9")]
    );

    let diamond = index
        .lookup("0x742C4d97C86bCF0176776C16e073b8c6f9Db4021")
        .unwrap()
        .unwrap();
    assert_eq!(
        diamond.proof,
        vec![
            b256("0x312537e830cd9ffcb18229d2815e64671de86ced03274a08b57fcd0e1d506f1d"),
            b256("0xf33f823db4d823f18edbb4d79efe1ef67b5c7cc7cba8d59b33fb7eb01b12d380"),
            b256("0xf6882c072c7c2f5926893288cef6dcc61fb7ac9f5df6f88f10f4b77d5dcd683e"),
        ]
    );
    assert_eq!(diamond.tier, "Diamond Hands");
}

#[test]
fn test_outsider_is_not_eligible() {
    let index = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());
    let outsider = Address::repeat_byte(0x99);

    assert!(index.get_allocation(&outsider).is_none());

    // no sibling path from any real proof lifts an outsider leaf to the root
    let outsider_leaf = leaf_hash(&outsider, &U256::from(750u64));
    for entry in index.whitelist().iter() {
        let proof = index.get_allocation(&entry.address).unwrap().proof;
        assert!(!verify_proof(&index.root(), &outsider_leaf, &proof));
    }
}

#[test]
fn test_forged_proofs_rejected() {
    let index = AllocationIndex::build(Whitelist::from_entries(fixture_entries()).unwrap());
    let root = index.root();
    let allocation = index
        .lookup("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        .unwrap()
        .unwrap();

    // inflated amount
    let inflated = leaf_hash(&allocation.address, &(allocation.amount + U256::from(1u64)));
    assert!(!verify_proof(&root, &inflated, &allocation.proof));

    // empty proof
    assert!(!verify_proof(&root, &allocation.leaf, &[]));

    // tampered sibling
    let mut tampered = allocation.proof.clone();
    tampered[0] = B256::repeat_byte(0xee);
    assert!(!verify_proof(&root, &allocation.leaf, &tampered));

    // truncated proof
    let truncated = &allocation.proof[..allocation.proof.len() - 1];
    assert!(!verify_proof(&root, &allocation.leaf, truncated));
}

#[test]
fn test_stale_root_rejects_new_proofs() {
    let mut entries = fixture_entries();
    let old_root = AllocationIndex::build(Whitelist::from_entries(entries.clone()).unwrap()).root();

    entries.push(WhitelistEntry::new(Address::repeat_byte(0x77), U256::from(1u64)));
    let rebuilt = AllocationIndex::build(Whitelist::from_entries(entries).unwrap());

    assert_ne!(rebuilt.root(), old_root);

    let newcomer = rebuilt.get_allocation(&Address::repeat_byte(0x77)).unwrap();
    assert!(newcomer.verify(&rebuilt.root()));
    assert!(!newcomer.verify(&old_root));
}

#[test]
fn test_proof_order_does_not_depend_on_left_right() {
    let leaves: Vec<B256> = (1u8..=8).map(B256::repeat_byte).collect();
    let tree = AllocationTree::from_leaves(leaves.clone());

    for leaf in &leaves {
        let proof = tree.proof_for(leaf).unwrap();
        assert_eq!(proof.len(), 3);

        let recomputed = proof.iter().fold(*leaf, |current, sibling| hash_pair(sibling, &current));
        assert_eq!(recomputed, tree.root());
    }
}
