//! Named interest-rate presets persisted in a small keyed store.
//!
//! Presets live as one JSON array under [`PRESETS_KEY`]. Reading never
//! fails: an absent, empty or unparseable entry falls back to the shipped
//! defaults.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::AmortizationResult;

pub const PRESETS_KEY: &str = "financing-simulator:bank-presets";

/// A named annual rate offered by a lender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPreset {
    pub id: String,
    pub name: String,
    /// Annual rate in percent (10.49 = 10.49% a year).
    pub annual_rate_pct: Decimal,
    pub reference_date: NaiveDate,
    pub is_default: bool,
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// String key-value storage backing the preset list.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> AmortizationResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> AmortizationResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AmortizationResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> AmortizationResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FileStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AmortizationResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> AmortizationResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

fn reference_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

fn preset(id: &str, name: &str, annual_rate_pct: Decimal) -> BankPreset {
    BankPreset {
        id: id.into(),
        name: name.into(),
        annual_rate_pct,
        reference_date: reference_month(2026, 2),
        is_default: true,
    }
}

/// Presets used whenever the store holds nothing usable.
pub fn shipped_defaults() -> Vec<BankPreset> {
    vec![
        preset("caixa", "Caixa", dec!(10.49)),
        preset("bb", "Banco do Brasil", dec!(12.0)),
        preset("itau", "Itaú", dec!(11.6)),
        preset("santander", "Santander", dec!(11.79)),
        preset("pro-cotista", "Pro-Cotista (Caixa)", dec!(9.01)),
    ]
}

pub fn load_presets(store: &impl KeyValueStore) -> Vec<BankPreset> {
    let stored = match store.get(PRESETS_KEY) {
        Ok(Some(s)) if !s.trim().is_empty() => s,
        Ok(_) => return shipped_defaults(),
        Err(e) => {
            warn!(error = %e, "preset store unreadable, using shipped defaults");
            return shipped_defaults();
        }
    };

    match serde_json::from_str::<Vec<BankPreset>>(&stored) {
        Ok(presets) if !presets.is_empty() => presets,
        Ok(_) => shipped_defaults(),
        Err(e) => {
            warn!(error = %e, "stored presets unparseable, using shipped defaults");
            shipped_defaults()
        }
    }
}

pub fn save_presets(store: &mut impl KeyValueStore, presets: &[BankPreset]) -> AmortizationResult<()> {
    let json = serde_json::to_string(presets)?;
    store.set(PRESETS_KEY, &json)?;
    debug!(count = presets.len(), "presets saved");
    Ok(())
}

/// Overwrite the stored list with the shipped defaults and return them.
pub fn reset_presets(store: &mut impl KeyValueStore) -> AmortizationResult<Vec<BankPreset>> {
    let defaults = shipped_defaults();
    save_presets(store, &defaults)?;
    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_falls_back() {
        let store = MemoryStore::new();
        assert_eq!(load_presets(&store), shipped_defaults());
    }

    #[test]
    fn test_round_trip_through_memory_store() {
        let mut store = MemoryStore::new();
        let custom = vec![BankPreset {
            id: "local".into(),
            name: "Local Credit Union".into(),
            annual_rate_pct: dec!(9.5),
            reference_date: reference_month(2026, 5),
            is_default: false,
        }];
        save_presets(&mut store, &custom).unwrap();
        assert_eq!(load_presets(&store), custom);
    }

    #[test]
    fn test_garbage_and_empty_array_fall_back() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, "{not json").unwrap();
        assert_eq!(load_presets(&store).len(), 5);
        store.set(PRESETS_KEY, "[]").unwrap();
        assert_eq!(load_presets(&store).len(), 5);
        store.set(PRESETS_KEY, "{\"id\": \"x\"}").unwrap();
        assert_eq!(load_presets(&store).len(), 5);
    }

    #[test]
    fn test_file_store_persists_under_namespaced_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.get(PRESETS_KEY).unwrap().is_none());

        let mut presets = shipped_defaults();
        presets.truncate(2);
        save_presets(&mut store, &presets).unwrap();

        assert!(dir.path().join("financing-simulator_bank-presets.json").exists());
        let reopened = FileStore::new(dir.path());
        assert_eq!(load_presets(&reopened), presets);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, "[]").unwrap();
        let reset = reset_presets(&mut store).unwrap();
        assert_eq!(reset, shipped_defaults());
        assert!(store.get(PRESETS_KEY).unwrap().unwrap().contains("caixa"));
    }
}
