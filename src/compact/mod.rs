//! Path/meta compaction and the end-to-end `build` pipeline.
//!
//! The path table holds one flat `(hash, pointers)` list per surviving family;
//! the meta table maps a family id to its row, so the id is stored once per
//! family instead of once per weapon.

use crate::database::{LoadError, RawDatabase};
use crate::diagnostic::Diagnostic;
use crate::model::DataPointers;
use crate::pool::Pools;
use crate::schema::SchemaError;
use crate::walker::{self, FamilyPaths};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal build errors. Per-weapon problems are diagnostics, not errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("family {family}: {definition}: {source}")]
    Schema {
        family: u8,
        definition: String,
        #[source]
        source: SchemaError,
    },
}

/// `(family id, row in the path table)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub family: u8,
    pub position: usize,
}

pub type PathRow = Vec<(u32, DataPointers)>;

/// Pools plus the two-level lookup tables: everything the emitter renders.
#[derive(Debug, Clone)]
pub struct CompactedDatabase {
    pub pools: Pools,
    pub meta: Vec<MetaEntry>,
    pub paths: Vec<PathRow>,
}

impl CompactedDatabase {
    /// Resolve a weapon the way the runtime does: meta row first, then the path row.
    pub fn pointers(&self, family: u8, hash: u32) -> Option<DataPointers> {
        let meta = self.meta.iter().find(|m| m.family == family)?;
        self.paths
            .get(meta.position)?
            .iter()
            .find(|(h, _)| *h == hash)
            .map(|(_, p)| *p)
    }

    pub fn weapon_count(&self) -> usize {
        self.paths.iter().map(Vec::len).sum()
    }
}

/// Assign dense positions to surviving families in encounter order.
pub fn compact_paths(families: Vec<FamilyPaths>, excluded: &[u8]) -> (Vec<MetaEntry>, Vec<PathRow>) {
    let mut meta = Vec::with_capacity(families.len());
    let mut paths = Vec::with_capacity(families.len());
    for family in families {
        if excluded.contains(&family.id) {
            continue;
        }
        meta.push(MetaEntry {
            family: family.id,
            position: paths.len(),
        });
        paths.push(family.weapons);
    }
    (meta, paths)
}

/// Build the compacted database from a parsed document. No state outlives the call.
pub fn build(
    db: &RawDatabase,
    excluded: &[u8],
) -> Result<(CompactedDatabase, Vec<Diagnostic>), BuildError> {
    let out = walker::walk(db, excluded)?;
    let (meta, paths) = compact_paths(out.families, excluded);
    let compacted = CompactedDatabase {
        pools: out.pools,
        meta,
        paths,
    };
    tracing::info!(
        "compacted {} weapon(s) in {} famil{}",
        compacted.weapon_count(),
        compacted.meta.len(),
        if compacted.meta.len() == 1 { "y" } else { "ies" }
    );
    for (kind, len) in compacted.pools.sizes() {
        tracing::debug!("{} pool: {} record(s)", kind, len);
    }
    Ok((compacted, out.diagnostics))
}

/// Parse and build in one step.
pub fn build_from_str(
    content: &str,
    excluded: &[u8],
) -> Result<(CompactedDatabase, Vec<Diagnostic>), BuildError> {
    build(&RawDatabase::parse(content)?, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> String {
        json!({
            "COMMENTS": {"how": "edit me"},
            "INDEX": {"6": "Auto Rifle", "18": "Sword", "9": "Hand Cannon"},
            "Auto Rifle": {
                "500": {"cat": "rapid", "subFam": "720", "magProf": "ar", "name": "X"},
                "cat": {"rapid": {
                    "range": {"vpp_end": 0.05},
                    "handling": {},
                    "reload": {"offset": 2.0},
                    "combatant_scalars": {}
                }},
                "subFam": {"720": {"damage": 10.0}},
                "magProf": {"ar": {}}
            },
            "Sword": {"1": {"cat": "a", "subFam": "b", "magProf": "c"}},
            "Hand Cannon": {
                "600": {"cat": "rapid", "subFam": "720", "magProf": "ar"},
                "601": {"cat": "gone", "subFam": "720", "magProf": "ar"},
                "cat": {"rapid": {
                    "range": {"vpp_end": 0.05},
                    "handling": {},
                    "reload": {"offset": 2.0},
                    "combatant_scalars": {}
                }},
                "subFam": {"720": {"damage": 10.0}},
                "magProf": {"ar": {}}
            }
        })
        .to_string()
    }

    #[test]
    fn meta_positions_are_dense_in_encounter_order() {
        let (db, _) = build_from_str(&document(), &[18, 31]).unwrap();
        assert_eq!(
            db.meta,
            vec![
                MetaEntry { family: 6, position: 0 },
                MetaEntry { family: 9, position: 1 }
            ]
        );
        assert_eq!(db.paths.len(), 2);
        assert_eq!(db.paths[1].len(), 2);
    }

    #[test]
    fn excluded_families_never_emitted() {
        let (db, _) = build_from_str(&document(), &[18, 31]).unwrap();
        assert!(db.meta.iter().all(|m| m.family != 18 && m.family != 31));
        assert!(db.pointers(18, 1).is_none());
        assert!(db.paths.iter().flatten().all(|(h, _)| *h != 1));
    }

    #[test]
    fn compactor_filters_even_if_walker_did_not() {
        let families = vec![
            FamilyPaths { id: 18, name: "Sword".into(), weapons: vec![(1, DataPointers::default())] },
            FamilyPaths { id: 7, name: "Shotgun".into(), weapons: vec![] },
        ];
        let (meta, paths) = compact_paths(families, &[18]);
        assert_eq!(meta, vec![MetaEntry { family: 7, position: 0 }]);
        assert_eq!(paths, vec![Vec::<(u32, DataPointers)>::new()]);
    }

    #[test]
    fn shared_definitions_dedup_across_families() {
        let (db, diags) = build_from_str(&document(), &[18]).unwrap();
        let ar = db.pointers(6, 500).unwrap();
        let hc = db.pointers(9, 600).unwrap();
        assert_eq!(ar, hc);
        assert_eq!(db.pointers(9, 601), Some(DataPointers::default()));
        assert_eq!(diags.iter().filter(|d| d.is_warning()).count(), 1);
    }

    #[test]
    fn every_pointer_indexes_its_pool() {
        let (db, _) = build_from_str(&document(), &[18]).unwrap();
        for (_, p) in db.paths.iter().flatten() {
            assert!(db.pools.lookup(p).is_some());
        }
    }

    #[test]
    fn invalid_json_is_a_load_error() {
        assert!(matches!(
            build_from_str("{", &[]),
            Err(BuildError::Load(LoadError::Json(_)))
        ));
    }
}
