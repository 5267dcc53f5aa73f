//! Raw weapon database: a JSON document of family blocks listed in an `INDEX`.
//!
//! ```text
//! { "COMMENTS": ..., "INDEX": { "6": "Auto Rifle", ... },
//!   "Auto Rifle": { "<hash>": { "cat", "subFam", "magProf", "pve"?, "name" },
//!                   "cat": {..}, "subFam": {..}, "magProf": {..} } }
//! ```

use crate::util::{is_weapon_key, parse_weapon_hash};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const COMMENTS_KEY: &str = "COMMENTS";
pub const INDEX_KEY: &str = "INDEX";
pub const CATEGORY_TABLE: &str = "cat";
pub const SUBFAMILY_TABLE: &str = "subFam";
pub const MAG_PROFILE_TABLE: &str = "magProf";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("database is {size} bytes (max {max})")]
    TooLarge { size: u64, max: usize },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database root must be an object")]
    RootNotObject,
    #[error("database has no INDEX object")]
    MissingIndex,
    #[error("INDEX entry {id:?} must name a family block")]
    IndexEntryNotString { id: String },
    #[error("family id {0:?} is not an integer in 0..=255")]
    InvalidFamilyId(String),
    #[error("family {id} refers to missing block {block:?}")]
    MissingFamilyBlock { id: u8, block: String },
    #[error("family block {block:?} must be an object")]
    FamilyNotObject { block: String },
    #[error("family block {block:?}: {table} must be an object")]
    SideTableNotObject { block: String, table: &'static str },
    #[error("family block {block:?}: weapon hash {key:?} does not fit in 32 bits")]
    InvalidWeaponHash { block: String, key: String },
}

/// One `INDEX` entry: family id and the block holding its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: u8,
    pub block: String,
}

/// The parsed document with `COMMENTS` discarded. Blocks are inspected lazily
/// so excluded families are never looked at.
#[derive(Debug, Clone)]
pub struct RawDatabase {
    index: Vec<IndexEntry>,
    blocks: Map<String, Value>,
}

/// A weapon entry keyed by its numeric hash.
#[derive(Debug, Clone, Copy)]
pub struct RawWeapon<'a> {
    pub hash: u32,
    pub entry: &'a Value,
}

/// One family block split into weapon entries and its three side tables.
#[derive(Debug, Clone)]
pub struct FamilyBlock<'a> {
    pub id: u8,
    pub name: &'a str,
    pub weapons: Vec<RawWeapon<'a>>,
    pub categories: Option<&'a Map<String, Value>>,
    pub subfamilies: Option<&'a Map<String, Value>>,
    pub mag_profiles: Option<&'a Map<String, Value>>,
}

impl RawDatabase {
    /// Read and parse a database file, refusing files over `max_bytes`.
    pub fn load(path: &Path, max_bytes: usize) -> Result<Self, LoadError> {
        let io = |source| LoadError::Io {
            path: path.display().to_string(),
            source,
        };
        let size = fs::metadata(path).map_err(io)?.len();
        if size > max_bytes as u64 {
            return Err(LoadError::TooLarge {
                size,
                max: max_bytes,
            });
        }
        let content = fs::read_to_string(path).map_err(io)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, LoadError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn from_value(root: Value) -> Result<Self, LoadError> {
        let Value::Object(mut blocks) = root else {
            return Err(LoadError::RootNotObject);
        };
        blocks.remove(COMMENTS_KEY);
        let index = match blocks.remove(INDEX_KEY) {
            Some(Value::Object(m)) => m,
            _ => return Err(LoadError::MissingIndex),
        };
        let mut entries = Vec::with_capacity(index.len());
        for (id, block) in index {
            let block = match block {
                Value::String(s) => s,
                _ => return Err(LoadError::IndexEntryNotString { id }),
            };
            let id = id
                .trim()
                .parse::<u8>()
                .map_err(|_| LoadError::InvalidFamilyId(id.clone()))?;
            entries.push(IndexEntry { id, block });
        }
        Ok(Self {
            index: entries,
            blocks,
        })
    }

    /// Families in `INDEX` order.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// Split a family's block. Weapon `name` fields are dropped here by never
    /// being read; non-numeric keys other than the side tables are ignored.
    pub fn family(&self, entry: &IndexEntry) -> Result<FamilyBlock<'_>, LoadError> {
        let (name, value) = self
            .blocks
            .get_key_value(&entry.block)
            .ok_or_else(|| LoadError::MissingFamilyBlock {
                id: entry.id,
                block: entry.block.clone(),
            })?;
        let Value::Object(block) = value else {
            return Err(LoadError::FamilyNotObject {
                block: entry.block.clone(),
            });
        };
        let mut family = FamilyBlock {
            id: entry.id,
            name: name.as_str(),
            weapons: Vec::new(),
            categories: None,
            subfamilies: None,
            mag_profiles: None,
        };
        for (key, v) in block {
            if is_weapon_key(key) {
                let hash = parse_weapon_hash(key).ok_or_else(|| LoadError::InvalidWeaponHash {
                    block: entry.block.clone(),
                    key: key.clone(),
                })?;
                family.weapons.push(RawWeapon { hash, entry: v });
                continue;
            }
            let slot = match key.as_str() {
                CATEGORY_TABLE => &mut family.categories,
                SUBFAMILY_TABLE => &mut family.subfamilies,
                MAG_PROFILE_TABLE => &mut family.mag_profiles,
                _ => {
                    tracing::debug!("family {}: ignoring key {:?}", entry.block, key);
                    continue;
                }
            };
            let map = v.as_object().ok_or_else(|| LoadError::SideTableNotObject {
                block: entry.block.clone(),
                table: side_table_name(key),
            })?;
            *slot = Some(map);
        }
        Ok(family)
    }
}

fn side_table_name(key: &str) -> &'static str {
    match key {
        CATEGORY_TABLE => CATEGORY_TABLE,
        SUBFAMILY_TABLE => SUBFAMILY_TABLE,
        _ => MAG_PROFILE_TABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "COMMENTS": {"note": "ignored"},
            "INDEX": {"9": "Hand Cannon", "6": "Auto Rifle"},
            "Hand Cannon": {
                "123": {"cat": "adaptive", "subFam": "140", "magProf": "base", "name": "Ace"},
                "cat": {}, "subFam": {}, "magProf": {},
                "notes": "free text"
            },
            "Auto Rifle": {}
        })
    }

    #[test]
    fn index_keeps_encounter_order() {
        let db = RawDatabase::from_value(sample()).unwrap();
        let ids: Vec<u8> = db.index().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 6]);
    }

    #[test]
    fn family_splits_weapons_and_tables() {
        let db = RawDatabase::from_value(sample()).unwrap();
        let fam = db.family(&db.index()[0]).unwrap();
        assert_eq!(fam.name, "Hand Cannon");
        assert_eq!(fam.weapons.len(), 1);
        assert_eq!(fam.weapons[0].hash, 123);
        assert!(fam.categories.is_some() && fam.subfamilies.is_some() && fam.mag_profiles.is_some());
    }

    #[test]
    fn family_block_borrows_only_the_database() {
        let db = RawDatabase::from_value(sample()).unwrap();
        let fam = {
            let entry = IndexEntry {
                id: 9,
                block: "Hand Cannon".to_string(),
            };
            db.family(&entry).unwrap()
        };
        assert_eq!(fam.name, "Hand Cannon");
        assert_eq!(fam.id, 9);
    }

    #[test]
    fn missing_block_is_fatal() {
        let db = RawDatabase::from_value(json!({"INDEX": {"7": "Shotgun"}})).unwrap();
        assert!(matches!(
            db.family(&db.index()[0]),
            Err(LoadError::MissingFamilyBlock { id: 7, .. })
        ));
    }

    #[test]
    fn non_numeric_family_id_rejected() {
        let err = RawDatabase::from_value(json!({"INDEX": {"x": "Shotgun"}}));
        assert!(matches!(err, Err(LoadError::InvalidFamilyId(_))));
    }

    #[test]
    fn missing_index_rejected() {
        assert!(matches!(
            RawDatabase::from_value(json!({"COMMENTS": {}})),
            Err(LoadError::MissingIndex)
        ));
    }

    #[test]
    fn oversized_hash_rejected() {
        let db = RawDatabase::from_value(json!({
            "INDEX": {"6": "AR"},
            "AR": {"99999999999": {}}
        }))
        .unwrap();
        assert!(matches!(
            db.family(&db.index()[0]),
            Err(LoadError::InvalidWeaponHash { .. })
        ));
    }
}
