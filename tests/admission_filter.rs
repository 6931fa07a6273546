//! End-to-end admission tests
//!
//! Drives the topic manager with real encoded locking scripts instead of a
//! stubbed decoder: build the tagged-data script, wrap it in a transaction
//! output, and check the admission decision.

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

use kvstore_topic_manager::decoder::build_locking_script;
use kvstore_topic_manager::{KvstoreTopicManager, PreviousUtxo};

const PUBKEY_HEX: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pubkey() -> Vec<u8> {
    hex::decode(PUBKEY_HEX).unwrap()
}

fn kvstore_script(fields: Vec<Vec<u8>>) -> ScriptBuf {
    build_locking_script(&pubkey(), &fields, &[0x30; 71])
}

fn transaction(output_scripts: Vec<ScriptBuf>) -> Transaction {
    Transaction {
        version: Version(2),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: output_scripts
            .into_iter()
            .map(|script_pubkey| TxOut {
                value: Amount::from_sat(1),
                script_pubkey,
            })
            .collect(),
    }
}

fn tracked() -> Vec<PreviousUtxo> {
    vec![
        PreviousUtxo::new("e3b0c442.0"),
        PreviousUtxo::new("e3b0c442.1"),
    ]
}

#[test]
fn admits_valid_token_and_skips_undecodable_neighbour() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    // Output 0: two fields, 32-byte protected key. Output 1: plain P2PKH.
    let valid = kvstore_script(vec![vec![0xaa; 32], b"published value".to_vec()]);
    let p2pkh =
        ScriptBuf::from_bytes(hex::decode("76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac").unwrap());

    let result =
        manager.identify_admissible_outputs(&tracked(), &transaction(vec![valid, p2pkh]));
    assert_eq!(result.outputs_to_admit, vec![0]);
    assert_eq!(result.outputs_to_retain, vec!["e3b0c442.0", "e3b0c442.1"]);
}

#[test]
fn three_field_token_yields_empty_admission() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    let script = kvstore_script(vec![vec![0xaa; 32], vec![0x01], vec![0x02]]);
    let result = manager.identify_admissible_outputs(&tracked(), &transaction(vec![script]));

    // NoValidAdvertisement internally - surfaced as a fully empty result,
    // retention list included
    assert!(result.is_empty());
}

#[test]
fn short_protected_key_yields_empty_admission() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    let script = kvstore_script(vec![vec![0xaa; 31], b"value".to_vec()]);
    let result = manager.identify_admissible_outputs(&tracked(), &transaction(vec![script]));
    assert!(result.is_empty());
}

#[test]
fn value_field_length_is_unconstrained() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    let empty_value = kvstore_script(vec![vec![0xaa; 32], Vec::new()]);
    let large_value = kvstore_script(vec![vec![0xbb; 32], vec![0xcc; 5000]]);

    let result = manager
        .identify_admissible_outputs(&tracked(), &transaction(vec![empty_value, large_value]));
    assert_eq!(result.outputs_to_admit, vec![0, 1]);
}

#[test]
fn inputless_transaction_yields_empty_admission() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    let mut tx = transaction(vec![kvstore_script(vec![vec![0xaa; 32], vec![0x01]])]);
    tx.input.clear();

    let result = manager.identify_admissible_outputs(&tracked(), &tx);
    assert!(result.is_empty());
}

#[test]
fn admission_result_round_trips_as_overlay_json() {
    init_tracing();
    let manager = KvstoreTopicManager::new();

    let script = kvstore_script(vec![vec![0xaa; 32], b"v".to_vec()]);
    let result = manager.identify_admissible_outputs(&tracked(), &transaction(vec![script]));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["outputsToAdmit"], serde_json::json!([0]));
    assert_eq!(
        json["outputsToRetain"],
        serde_json::json!(["e3b0c442.0", "e3b0c442.1"])
    );
}
