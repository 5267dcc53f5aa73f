//! Deduplicating pools: one insertion-ordered, index-stable collection per record kind.

mod key;

pub use key::{CanonicalFields, CanonicalKey, KeyAtom};

use crate::model::{
    AmmoFormula, DamageMods, DataPointers, FiringData, HandlingFormula, RangeFormula,
    RecordKind, ReloadFormula,
};
use crate::schema::{Normalize, SchemaError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A record that can live in a pool: normalizable, keyed, with a neutral entry for index 0.
pub trait Pooled: Normalize + CanonicalFields + Clone + Default + PartialEq + Serialize {}

impl<T> Pooled for T where T: Normalize + CanonicalFields + Clone + Default + PartialEq + Serialize {}

/// Ordered, deduplicated records of one kind. Entries are never reordered or removed.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    entries: Vec<T>,
    index: HashMap<CanonicalKey, usize>,
}

impl<T: Pooled> Pool<T> {
    /// A pool holding only the neutral record at index 0.
    pub fn new() -> Self {
        let mut pool = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        pool.intern(T::default());
        pool
    }

    /// Index of the structurally equal canonical record, appending it when new.
    pub fn intern(&mut self, record: T) -> usize {
        let key = record.canonical_key();
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(record);
        self.index.insert(key, i);
        i
    }

    /// Normalize a raw definition, then intern it.
    pub fn intern_raw(&mut self, raw: &Value) -> Result<usize, SchemaError> {
        Ok(self.intern(T::normalize(raw)?))
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        self.entries.get(i)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: index 0 is always occupied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Pooled> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The six resolved records of one weapon variant, pre-interning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponRecords {
    pub range: RangeFormula,
    pub handling: HandlingFormula,
    pub reload: ReloadFormula,
    pub scalar: DamageMods,
    pub firing: FiringData,
    pub ammo: AmmoFormula,
}

/// One pool per record kind.
#[derive(Debug, Clone, Default)]
pub struct Pools {
    pub handling: Pool<HandlingFormula>,
    pub range: Pool<RangeFormula>,
    pub reload: Pool<ReloadFormula>,
    pub scalar: Pool<DamageMods>,
    pub firing: Pool<FiringData>,
    pub ammo: Pool<AmmoFormula>,
}

impl Pools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern all six records and collect their indices.
    pub fn intern_weapon(&mut self, records: WeaponRecords) -> DataPointers {
        DataPointers {
            r: self.range.intern(records.range),
            h: self.handling.intern(records.handling),
            rl: self.reload.intern(records.reload),
            s: self.scalar.intern(records.scalar),
            f: self.firing.intern(records.firing),
            a: self.ammo.intern(records.ammo),
        }
    }

    /// The records a pointer tuple refers to, if every index is in range.
    pub fn lookup(&self, p: &DataPointers) -> Option<WeaponRecords> {
        Some(WeaponRecords {
            range: self.range.get(p.r)?.clone(),
            handling: self.handling.get(p.h)?.clone(),
            reload: self.reload.get(p.rl)?.clone(),
            scalar: self.scalar.get(p.s)?.clone(),
            firing: self.firing.get(p.f)?.clone(),
            ammo: self.ammo.get(p.a)?.clone(),
        })
    }

    /// `(kind, len)` for every pool, in emission order.
    pub fn sizes(&self) -> [(RecordKind, usize); 6] {
        [
            (RecordKind::Handling, self.handling.len()),
            (RecordKind::Range, self.range.len()),
            (RecordKind::Reload, self.reload.len()),
            (RecordKind::Scalar, self.scalar.len()),
            (RecordKind::Firing, self.firing.len()),
            (RecordKind::Ammo, self.ammo.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_zero_is_neutral_for_every_pool() {
        let p = Pools::new();
        assert_eq!(p.handling.get(0), Some(&HandlingFormula::default()));
        assert_eq!(p.range.get(0), Some(&RangeFormula::default()));
        assert_eq!(p.reload.get(0), Some(&ReloadFormula::default()));
        assert_eq!(p.scalar.get(0), Some(&DamageMods::default()));
        assert_eq!(p.firing.get(0), Some(&FiringData::default()));
        assert_eq!(p.ammo.get(0), Some(&AmmoFormula::default()));
        assert!(p.sizes().iter().all(|(_, n)| *n == 1));
    }

    #[test]
    fn interning_twice_returns_same_index() {
        let mut pool: Pool<HandlingFormula> = Pool::new();
        let raw = json!({"ready": {"vpp": -1.2, "offset": 300.0}});
        let a = pool.intern_raw(&raw).unwrap();
        let b = pool.intern_raw(&raw).unwrap();
        assert_eq!(a, 1);
        assert_eq!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn field_order_does_not_split_entries() {
        let mut pool: Pool<RangeFormula> = Pool::new();
        let a = pool
            .intern_raw(&json!({"vpp_start": 0.1, "offset_start": 10.0, "fusion": true}))
            .unwrap();
        let b = pool
            .intern_raw(&json!({"fusion": true, "offset_start": 10.0, "vpp_start": 0.1}))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn empty_definition_maps_to_neutral_index() {
        let mut pool: Pool<AmmoFormula> = Pool::new();
        assert_eq!(pool.intern_raw(&json!({})).unwrap(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn indices_are_stable_across_appends() {
        let mut pool: Pool<ReloadFormula> = Pool::new();
        let first = pool.intern_raw(&json!({"offset": 1.0})).unwrap();
        let second = pool.intern_raw(&json!({"offset": 2.0})).unwrap();
        let third = pool.intern_raw(&json!({"offset": 3.0})).unwrap();
        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(pool.intern_raw(&json!({"offset": 1.0})).unwrap(), 1);
        assert_eq!(pool.get(2).unwrap().reload_data.offset, 2.0);
    }

    #[test]
    fn pointers_round_trip_through_lookup() {
        let mut pools = Pools::new();
        let records = WeaponRecords {
            range: RangeFormula::default(),
            handling: HandlingFormula::normalize(&json!({"ads": {"offset": 0.4}})).unwrap(),
            reload: ReloadFormula::default(),
            scalar: DamageMods { pve: 0.9, ..DamageMods::default() },
            firing: FiringData::normalize(&json!({"damage": 2.0})).unwrap(),
            ammo: AmmoFormula::default(),
        };
        let ptrs = pools.intern_weapon(records.clone());
        assert_eq!(ptrs, DataPointers { r: 0, h: 1, rl: 0, s: 1, f: 1, a: 0 });
        assert_eq!(pools.lookup(&ptrs), Some(records));
    }
}
