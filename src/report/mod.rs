//! Debug JSON dump of a compaction run, and diffs between two dumps.

use crate::compact::CompactedDatabase;
use crate::model::{
    AmmoFormula, DamageMods, DataPointers, FiringData, HandlingFormula, RangeFormula,
    RecordKind, ReloadFormula,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Every pool plus the complete family -> hash -> pointers map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugDump {
    pub handling_data: Vec<HandlingFormula>,
    pub range_data: Vec<RangeFormula>,
    pub reload_data: Vec<ReloadFormula>,
    pub scalar_data: Vec<DamageMods>,
    pub firing_data: Vec<FiringData>,
    pub ammo_data: Vec<AmmoFormula>,
    pub weapon_paths: BTreeMap<u8, BTreeMap<u32, DataPointers>>,
}

impl DebugDump {
    pub fn from_compacted(db: &CompactedDatabase) -> Self {
        let weapon_paths = db
            .meta
            .iter()
            .filter_map(|m| {
                let row = db.paths.get(m.position)?;
                Some((m.family, row.iter().copied().collect()))
            })
            .collect();
        Self {
            handling_data: db.pools.handling.entries().to_vec(),
            range_data: db.pools.range.entries().to_vec(),
            reload_data: db.pools.reload.entries().to_vec(),
            scalar_data: db.pools.scalar.entries().to_vec(),
            firing_data: db.pools.firing.entries().to_vec(),
            ammo_data: db.pools.ammo.entries().to_vec(),
            weapon_paths,
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let s = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        serde_json::from_str(&s).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn pool_len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Handling => self.handling_data.len(),
            RecordKind::Range => self.range_data.len(),
            RecordKind::Reload => self.reload_data.len(),
            RecordKind::Scalar => self.scalar_data.len(),
            RecordKind::Firing => self.firing_data.len(),
            RecordKind::Ammo => self.ammo_data.len(),
        }
    }

    /// Kinds whose pooled record differs between the two pointer tuples.
    /// Indices may shift between runs, so records are compared, not pointers.
    fn changed_kinds(&self, p: &DataPointers, other: &DebugDump, q: &DataPointers) -> Vec<RecordKind> {
        let mut out = Vec::new();
        if self.handling_data.get(p.h) != other.handling_data.get(q.h) {
            out.push(RecordKind::Handling);
        }
        if self.range_data.get(p.r) != other.range_data.get(q.r) {
            out.push(RecordKind::Range);
        }
        if self.reload_data.get(p.rl) != other.reload_data.get(q.rl) {
            out.push(RecordKind::Reload);
        }
        if self.scalar_data.get(p.s) != other.scalar_data.get(q.s) {
            out.push(RecordKind::Scalar);
        }
        if self.firing_data.get(p.f) != other.firing_data.get(q.f) {
            out.push(RecordKind::Firing);
        }
        if self.ammo_data.get(p.a) != other.ammo_data.get(q.a) {
            out.push(RecordKind::Ammo);
        }
        out
    }
}

pub fn write_debug_json(db: &CompactedDatabase, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string(&DebugDump::from_compacted(db)).map_err(|e| e.to_string())?;
    crate::util::write_output(path, &json).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSizeChange {
    pub kind: RecordKind,
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponChange {
    pub family: u8,
    pub hash: u32,
    pub kinds: Vec<RecordKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DumpDiff {
    pub pool_sizes: Vec<PoolSizeChange>,
    pub added: Vec<(u8, u32)>,
    pub removed: Vec<(u8, u32)>,
    pub changed: Vec<WeaponChange>,
}

impl DumpDiff {
    pub fn is_empty(&self) -> bool {
        self.pool_sizes.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
    }
}

fn flatten(dump: &DebugDump) -> BTreeMap<(u8, u32), DataPointers> {
    dump.weapon_paths
        .iter()
        .flat_map(|(fam, row)| row.iter().map(move |(hash, p)| ((*fam, *hash), *p)))
        .collect()
}

/// Compare dump `a` (before) with dump `b` (after).
pub fn diff_dumps(a: &DebugDump, b: &DebugDump) -> DumpDiff {
    let pool_sizes = RecordKind::ALL
        .iter()
        .filter_map(|&kind| {
            let (before, after) = (a.pool_len(kind), b.pool_len(kind));
            (before != after).then_some(PoolSizeChange {
                kind,
                before,
                after,
            })
        })
        .collect();
    let wa = flatten(a);
    let wb = flatten(b);
    let added = wb.keys().filter(|k| !wa.contains_key(k)).copied().collect();
    let removed = wa.keys().filter(|k| !wb.contains_key(k)).copied().collect();
    let changed = wa
        .iter()
        .filter_map(|(key, p)| {
            let q = wb.get(key)?;
            let kinds = a.changed_kinds(p, b, q);
            (!kinds.is_empty()).then_some(WeaponChange {
                family: key.0,
                hash: key.1,
                kinds,
            })
        })
        .collect();
    DumpDiff {
        pool_sizes,
        added,
        removed,
        changed,
    }
}

pub fn write_diff_json(diff: &DumpDiff, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(diff).map_err(|e| e.to_string())?;
    crate::util::write_output(path, &json).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::build_from_str;
    use serde_json::json;

    fn doc(offset: f64, extra_weapon: bool) -> String {
        let mut v = json!({
            "INDEX": {"6": "AR"},
            "AR": {
                "1": {"cat": "c", "subFam": "s", "magProf": "m"},
                "cat": {"c": {"range": {}, "handling": {}, "reload": {"offset": offset}, "combatant_scalars": {}}},
                "subFam": {"s": {}},
                "magProf": {"m": {}}
            }
        });
        if extra_weapon {
            v["AR"]["2"] = json!({"cat": "c", "subFam": "s", "magProf": "m"});
        }
        v.to_string()
    }

    #[test]
    fn dump_round_trips_through_json() {
        let (db, _) = build_from_str(&doc(2.0, true), &[]).unwrap();
        let dump = DebugDump::from_compacted(&db);
        let text = serde_json::to_string(&dump).unwrap();
        let back: DebugDump = serde_json::from_str(&text).unwrap();
        assert_eq!(back, dump);
        assert_eq!(back.weapon_paths[&6].len(), 2);
    }

    #[test]
    fn identical_dumps_have_empty_diff() {
        let (db, _) = build_from_str(&doc(2.0, false), &[]).unwrap();
        let dump = DebugDump::from_compacted(&db);
        assert!(diff_dumps(&dump, &dump).is_empty());
    }

    #[test]
    fn diff_reports_added_and_changed() {
        let (a, _) = build_from_str(&doc(2.0, false), &[]).unwrap();
        let (b, _) = build_from_str(&doc(3.0, true), &[]).unwrap();
        let d = diff_dumps(&DebugDump::from_compacted(&a), &DebugDump::from_compacted(&b));
        assert_eq!(d.added, vec![(6, 2)]);
        assert!(d.removed.is_empty());
        assert_eq!(d.changed.len(), 1);
        assert_eq!(d.changed[0].kinds, vec![RecordKind::Reload]);
        assert!(d.pool_sizes.is_empty());
    }

    #[test]
    fn write_debug_json_creates_file() {
        let (db, _) = build_from_str(&doc(2.0, false), &[]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");
        write_debug_json(&db, &path).unwrap();
        let dump = DebugDump::load(&path).unwrap();
        assert_eq!(dump.handling_data.len(), 1);
    }
}
