//! Hashable canonical keys for pooled records.

use crate::model::{
    AmmoFormula, DamageMods, FiringData, HandlingFormula, RangeFormula, ReloadFormula,
    StatFormula,
};
use ordered_float::OrderedFloat;

/// One field of a canonical record, in canonical field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAtom {
    Float(OrderedFloat<f64>),
    Int(i64),
    Flag(bool),
}

pub type CanonicalKey = Vec<KeyAtom>;

/// Flattens a record into its canonical key. Two records are the same pool
/// entry exactly when their keys are equal.
pub trait CanonicalFields {
    fn push_key(&self, out: &mut CanonicalKey);

    fn canonical_key(&self) -> CanonicalKey {
        let mut out = Vec::new();
        self.push_key(&mut out);
        out
    }
}

fn float(out: &mut CanonicalKey, x: f64) {
    out.push(KeyAtom::Float(OrderedFloat(x)));
}

impl CanonicalFields for StatFormula {
    fn push_key(&self, out: &mut CanonicalKey) {
        float(out, self.evpp);
        float(out, self.vpp);
        float(out, self.offset);
    }
}

impl CanonicalFields for HandlingFormula {
    fn push_key(&self, out: &mut CanonicalKey) {
        self.ready.push_key(out);
        self.stow.push_key(out);
        self.ads.push_key(out);
    }
}

impl CanonicalFields for RangeFormula {
    fn push_key(&self, out: &mut CanonicalKey) {
        self.start.push_key(out);
        self.end.push_key(out);
        float(out, self.floor_percent);
        out.push(KeyAtom::Flag(self.fusion));
    }
}

impl CanonicalFields for ReloadFormula {
    fn push_key(&self, out: &mut CanonicalKey) {
        self.reload_data.push_key(out);
        float(out, self.ammo_percent);
    }
}

impl CanonicalFields for DamageMods {
    fn push_key(&self, out: &mut CanonicalKey) {
        for x in [
            self.pve,
            self.vehicle,
            self.miniboss,
            self.champion,
            self.boss,
            self.elite,
            self.minor,
        ] {
            float(out, x);
        }
    }
}

impl CanonicalFields for FiringData {
    fn push_key(&self, out: &mut CanonicalKey) {
        float(out, self.damage);
        float(out, self.crit_mult);
        float(out, self.burst_delay);
        out.push(KeyAtom::Int(i64::from(self.burst_size)));
        float(out, self.inner_burst_delay);
        out.push(KeyAtom::Flag(self.charge));
        out.push(KeyAtom::Flag(self.one_ammo));
    }
}

impl CanonicalFields for AmmoFormula {
    fn push_key(&self, out: &mut CanonicalKey) {
        self.mag.push_key(out);
        out.push(KeyAtom::Int(i64::from(self.reserve_id)));
        out.push(KeyAtom::Int(i64::from(self.round_to)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_zero_shares_a_key() {
        let a = StatFormula { evpp: 0.0, vpp: -0.0, offset: 1.0 };
        let b = StatFormula { evpp: -0.0, vpp: 0.0, offset: 1.0 };
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn key_distinguishes_nested_position() {
        let mut a = HandlingFormula::default();
        let mut b = HandlingFormula::default();
        a.ready.offset = 1.0;
        b.stow.offset = 1.0;
        assert_ne!(a.canonical_key(), b.canonical_key());
    }
}
