//! DOI-keyed reaction document, persisted after every merge.
//!
//! Layout: `"DOI <prefix>"` → `"/<suffix>"` (or `""`) → `reaction_<n>` → payload.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::identity::DatasetId;
use crate::reaction::ReactionRecord;

pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} does not hold a JSON object", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Components {
    pub reactant_smiles: String,
    pub solvent_smiles: String,
    pub product_smiles: String,
}

/// What the document stores for one reaction.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReactionPayload {
    pub reaction_smiles: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub components: Components,
}

impl From<&ReactionRecord> for ReactionPayload {
    fn from(record: &ReactionRecord) -> Self {
        ReactionPayload {
            reaction_smiles: record.reaction_smiles.clone(),
            name: record.name.clone(),
            components: Components {
                reactant_smiles: record.reactant_smiles.clone(),
                solvent_smiles: record.solvent_smiles.clone(),
                product_smiles: record.product_smiles.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The dataset has no stable identifier; nothing was written.
    Skipped,
    Written {
        doi_key: String,
        suffix_key: String,
        reactions: usize,
    },
}

/// `("DOI 10.1021", "/jacsau.4c01276")` for `10.1021/jacsau.4c01276`.
pub fn store_keys(id: &DatasetId) -> (String, String) {
    let (prefix, suffix) = id.doi_parts();
    (
        format!("DOI {}", prefix),
        suffix.map(|s| format!("/{}", s)).unwrap_or_default(),
    )
}

pub struct ReactionStore {
    path: PathBuf,
    /// Matches what is on disk.
    committed: Document,
    /// Result of a merge whose write failed; the next merge builds on it.
    pending: Option<Document>,
}

impl ReactionStore {
    /// Starts a run from an empty document, overwriting whatever was there.
    pub fn create_fresh(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = ReactionStore {
            path: path.into(),
            committed: Map::new(),
            pending: None,
        };
        store.write(&store.committed)?;
        Ok(store)
    }

    /// Continues from the document already at `path` (empty if missing).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let committed = load_document(&path)?;
        Ok(ReactionStore {
            path,
            committed,
            pending: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last successfully written document.
    pub fn snapshot(&self) -> &Document {
        &self.committed
    }

    /// Whether a failed write is still waiting to be flushed.
    pub fn has_unflushed(&self) -> bool {
        self.pending.is_some()
    }

    /// Merges `records` under `id` and rewrites the whole document.
    ///
    /// Existing reactions with the same id are overwritten; other datasets are
    /// never touched. On a write error the committed snapshot is left as is
    /// and the merged document is retried by the next call.
    pub fn merge_and_persist(
        &mut self,
        id: &DatasetId,
        records: &[ReactionRecord],
    ) -> Result<MergeOutcome, StoreError> {
        if !id.is_resolved() {
            debug!("Not persisting {} reaction(s) under unresolved id {}", records.len(), id);
            return Ok(MergeOutcome::Skipped);
        }

        let mut document = self.pending.as_ref().unwrap_or(&self.committed).clone();
        let (doi_key, suffix_key) = store_keys(id);

        let dataset = as_object(
            document
                .entry(doi_key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
        );
        let reactions = as_object(
            dataset
                .entry(suffix_key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
        );

        let mut written = 0;
        for record in records.iter().filter(|r| !r.reaction_id.is_empty()) {
            let payload = serde_json::to_value(ReactionPayload::from(record))?;
            reactions.insert(record.reaction_id.clone(), payload);
            written += 1;
        }

        match self.write(&document) {
            Ok(()) => {
                self.committed = document;
                self.pending = None;
                Ok(MergeOutcome::Written {
                    doi_key,
                    suffix_key,
                    reactions: written,
                })
            }
            Err(e) => {
                self.pending = Some(document);
                Err(e)
            }
        }
    }

    /// Writes to a temporary sibling file, then renames it over the target.
    fn write(&self, document: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// Reads a persisted document; a missing or blank file is an empty document.
pub fn load_document(path: &Path) -> Result<Document, StoreError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(&text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(StoreError::NotAnObject {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(StoreError::Parse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn as_object(value: &mut Value) -> &mut Document {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}
