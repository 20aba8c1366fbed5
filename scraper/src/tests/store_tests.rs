use std::fs;

use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

use crate::identity::{fallback_id, DatasetId};
use crate::reaction::{parse_reaction, ReactionRecord};
use crate::store::{load_document, MergeOutcome, ReactionStore, StoreError};

fn records(raw: &[&str]) -> Vec<ReactionRecord> {
    raw.iter()
        .enumerate()
        .map(|(index, r)| parse_reaction(r, index))
        .collect()
}

#[test]
fn test_create_fresh_writes_empty_document() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("scraped_data.json");
    fs::write(&path, r#"{"DOI 10.1": {"": {}}}"#)?;

    let store = ReactionStore::create_fresh(&path)?;
    assert!(store.snapshot().is_empty());
    assert_eq!(fs::read_to_string(&path)?, "{}");
    Ok(())
}

#[test]
fn test_merge_writes_nested_layout() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;

    let id = DatasetId::new("10.1021/jacsau.4c01276");
    let outcome = store.merge_and_persist(&id, &records(&["CC(C)=O.O=[Se]=O>O1CCOCC1>CC(=O)C=O"]))?;
    assert_eq!(
        outcome,
        MergeOutcome::Written {
            doi_key: "DOI 10.1021".to_string(),
            suffix_key: "/jacsau.4c01276".to_string(),
            reactions: 1,
        }
    );

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(
        on_disk,
        json!({
            "DOI 10.1021": {
                "/jacsau.4c01276": {
                    "reaction_1": {
                        "reaction_smiles": "CC(C)=O.O=[Se]=O>O1CCOCC1>CC(=O)C=O",
                        "components": {
                            "reactant_smiles": "CC(C)=O.O=[Se]=O",
                            "solvent_smiles": "O1CCOCC1",
                            "product_smiles": "CC(=O)C=O"
                        }
                    }
                }
            }
        })
    );
    Ok(())
}

#[test]
fn test_same_reaction_id_written_once() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;
    let id = DatasetId::new("10.1039/d3sc01234a");

    store.merge_and_persist(&id, &records(&["A>>B"]))?;
    store.merge_and_persist(&id, &records(&["A>>C", "D>>E"]))?;

    let reactions = &store.snapshot()["DOI 10.1039"]["/d3sc01234a"];
    let reactions = reactions.as_object().expect("reactions object");
    assert_eq!(reactions.len(), 2);
    assert_eq!(reactions["reaction_1"]["reaction_smiles"], "A>>C");
    assert_eq!(reactions["reaction_2"]["reaction_smiles"], "D>>E");
    Ok(())
}

#[test]
fn test_datasets_do_not_disturb_each_other() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;

    let a = DatasetId::new("10.1021/aaa");
    let b = DatasetId::new("10.1021/bbb");
    store.merge_and_persist(&a, &records(&["A>>A"]))?;
    store.merge_and_persist(&b, &records(&["B>>B"]))?;
    store.merge_and_persist(&a, &records(&["A>>A", "A2>>A2"]))?;

    let document = load_document(&path)?;
    let doi = document["DOI 10.1021"].as_object().expect("doi object");
    assert_eq!(doi.len(), 2);
    assert_eq!(doi["/aaa"].as_object().map(|m| m.len()), Some(2));
    assert_eq!(doi["/bbb"]["reaction_1"]["reaction_smiles"], "B>>B");
    Ok(())
}

#[test]
fn test_unresolved_dataset_is_skipped() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;
    store.merge_and_persist(&DatasetId::new("10.1/x"), &records(&["A>>B"]))?;
    let before = fs::read_to_string(&path)?;

    let id = fallback_id("https://kmt.vander-lingen.nl/data/reaction/list/77");
    let outcome = store.merge_and_persist(&id, &records(&["C>>D"]))?;

    assert_eq!(outcome, MergeOutcome::Skipped);
    assert_eq!(fs::read_to_string(&path)?, before);
    assert!(!store.snapshot().keys().any(|k| k.contains("dataset_")));
    Ok(())
}

#[test]
fn test_doi_without_suffix_uses_empty_key() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;

    store.merge_and_persist(&DatasetId::new("10.1002"), &records(&["A>>B"]))?;
    assert_eq!(store.snapshot()["DOI 10.1002"][""]["reaction_1"]["reaction_smiles"], "A>>B");
    Ok(())
}

#[test]
fn test_empty_batch_creates_levels() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;

    let outcome = store.merge_and_persist(&DatasetId::new("10.1002/anie.202200001"), &[])?;
    assert!(matches!(outcome, MergeOutcome::Written { reactions: 0, .. }));
    assert_eq!(load_document(&path)?["DOI 10.1002"], json!({ "/anie.202200001": {} }));
    Ok(())
}

#[test]
fn test_failed_write_is_retried_by_next_merge() -> Result<()> {
    let dir = tempdir()?;
    let sub = dir.path().join("out");
    fs::create_dir(&sub)?;
    let path = sub.join("data.json");
    let mut store = ReactionStore::create_fresh(&path)?;
    let id = DatasetId::new("10.1021/jacsau.4c01276");

    fs::remove_dir_all(&sub)?;
    let err = store
        .merge_and_persist(&id, &records(&["A>>B"]))
        .expect_err("directory is gone");
    assert!(matches!(err, StoreError::Write { .. }));
    assert!(store.has_unflushed());
    assert!(store.snapshot().is_empty());

    fs::create_dir(&sub)?;
    let second = vec![parse_reaction("C>>D", 1)];
    store.merge_and_persist(&id, &second)?;
    assert!(!store.has_unflushed());

    let reactions = &load_document(&path)?["DOI 10.1021"]["/jacsau.4c01276"];
    assert_eq!(reactions["reaction_1"]["reaction_smiles"], "A>>B");
    assert_eq!(reactions["reaction_2"]["reaction_smiles"], "C>>D");
    Ok(())
}

#[test]
fn test_failed_write_leaves_last_good_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;
    let id = DatasetId::new("10.1021/jacsau.4c01276");
    store.merge_and_persist(&id, &records(&["A>>B"]))?;
    let last_good = fs::read_to_string(&path)?;

    // a non-empty directory in place of the file makes only the final rename fail
    fs::remove_file(&path)?;
    fs::create_dir(&path)?;
    fs::write(path.join("marker"), "untouched")?;

    let second = vec![parse_reaction("C>>D", 1)];
    let err = store.merge_and_persist(&id, &second).expect_err("target is a directory");
    assert!(matches!(err, StoreError::Write { .. }));
    assert!(store.has_unflushed());

    // nothing was written at the target and no temporary file was left behind
    assert!(path.is_dir());
    assert_eq!(fs::read_to_string(path.join("marker"))?, "untouched");
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);

    // the committed snapshot is still exactly the last good write
    assert_eq!(serde_json::to_string_pretty(store.snapshot())?, last_good);

    fs::remove_dir_all(&path)?;
    store.merge_and_persist(&id, &[])?;
    let reactions = &load_document(&path)?["DOI 10.1021"]["/jacsau.4c01276"];
    assert_eq!(reactions["reaction_1"]["reaction_smiles"], "A>>B");
    assert_eq!(reactions["reaction_2"]["reaction_smiles"], "C>>D");
    Ok(())
}

#[test]
fn test_open_keeps_existing_document() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    {
        let mut store = ReactionStore::create_fresh(&path)?;
        store.merge_and_persist(&DatasetId::new("10.1/old"), &records(&["A>>B"]))?;
    }

    let mut store = ReactionStore::open(&path)?;
    store.merge_and_persist(&DatasetId::new("10.1/new"), &records(&["C>>D"]))?;

    let document = load_document(&path)?;
    assert_eq!(document["DOI 10.1"]["/old"]["reaction_1"]["reaction_smiles"], "A>>B");
    assert_eq!(document["DOI 10.1"]["/new"]["reaction_1"]["reaction_smiles"], "C>>D");
    Ok(())
}

#[test]
fn test_load_document_edge_cases() -> Result<()> {
    let dir = tempdir()?;

    assert!(load_document(&dir.path().join("missing.json"))?.is_empty());

    let blank = dir.path().join("blank.json");
    fs::write(&blank, "  \n")?;
    assert!(load_document(&blank)?.is_empty());

    let array = dir.path().join("array.json");
    fs::write(&array, "[]")?;
    assert!(matches!(load_document(&array), Err(StoreError::NotAnObject { .. })));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{")?;
    assert!(matches!(load_document(&broken), Err(StoreError::Parse { .. })));
    Ok(())
}

#[test]
fn test_names_are_persisted() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.json");
    let mut store = ReactionStore::create_fresh(&path)?;

    let named = vec![parse_reaction("A>>B", 0).with_name(Some("Riley oxidation".to_string()))];
    store.merge_and_persist(&DatasetId::new("10.1/x"), &named)?;
    assert_eq!(
        load_document(&path)?["DOI 10.1"]["/x"]["reaction_1"]["name"],
        "Riley oxidation"
    );
    Ok(())
}
