//! Canonical weapon formula records and the pointer tuple tying a weapon to them.
//!
//! Field declaration order is the canonical serialization order; the emitter
//! and the debug dump both rely on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places every stat formula coefficient is rounded to.
pub const ROUND_DECIMALS: i32 = 8;

/// Round a coefficient to [`ROUND_DECIMALS`] places. Negative zero collapses to zero.
pub fn round_coefficient(x: f64) -> f64 {
    let scale = 10f64.powi(ROUND_DECIMALS);
    let r = (x * scale).round() / scale;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// The six record kinds, one pool each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Handling,
    Range,
    Reload,
    Scalar,
    Firing,
    Ammo,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Handling,
        RecordKind::Range,
        RecordKind::Reload,
        RecordKind::Scalar,
        RecordKind::Firing,
        RecordKind::Ammo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Handling => "handling",
            RecordKind::Range => "range",
            RecordKind::Reload => "reload",
            RecordKind::Scalar => "scalar",
            RecordKind::Firing => "firing",
            RecordKind::Ammo => "ammo",
        }
    }

    /// Runtime struct the emitted literals construct.
    pub fn struct_name(&self) -> &'static str {
        match self {
            RecordKind::Handling => "HandlingFormula",
            RecordKind::Range => "RangeFormula",
            RecordKind::Reload => "ReloadFormula",
            RecordKind::Scalar => "DamageMods",
            RecordKind::Firing => "FiringData",
            RecordKind::Ammo => "AmmoFormula",
        }
    }

    /// Upper-case stem shared by the template placeholder and the const name.
    pub fn table_stem(&self) -> &'static str {
        match self {
            RecordKind::Handling => "HANDLING",
            RecordKind::Range => "RANGE",
            RecordKind::Reload => "RELOAD",
            RecordKind::Scalar => "SCALAR",
            RecordKind::Firing => "FIRING",
            RecordKind::Ammo => "AMMO",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quadratic in the stat value: `evpp * x^2 + vpp * x + offset`. Even linear stats use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatFormula {
    pub evpp: f64,
    pub vpp: f64,
    pub offset: f64,
}

impl StatFormula {
    /// Build a formula with every coefficient rounded.
    pub fn new(evpp: f64, vpp: f64, offset: f64) -> Self {
        Self {
            evpp: round_coefficient(evpp),
            vpp: round_coefficient(vpp),
            offset: round_coefficient(offset),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlingFormula {
    pub ready: StatFormula,
    pub stow: StatFormula,
    pub ads: StatFormula,
}

impl Default for HandlingFormula {
    fn default() -> Self {
        Self {
            ready: StatFormula::zero(),
            stow: StatFormula::zero(),
            ads: StatFormula::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFormula {
    pub start: StatFormula,
    pub end: StatFormula,
    pub floor_percent: f64,
    pub fusion: bool,
}

impl Default for RangeFormula {
    fn default() -> Self {
        Self {
            start: StatFormula::zero(),
            end: StatFormula::zero(),
            floor_percent: 0.0,
            fusion: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadFormula {
    pub reload_data: StatFormula,
    pub ammo_percent: f64,
}

impl Default for ReloadFormula {
    fn default() -> Self {
        Self {
            reload_data: StatFormula::zero(),
            ammo_percent: 0.0,
        }
    }
}

/// Combatant damage multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageMods {
    pub pve: f64,
    pub vehicle: f64,
    pub miniboss: f64,
    pub champion: f64,
    pub boss: f64,
    pub elite: f64,
    pub minor: f64,
}

impl Default for DamageMods {
    fn default() -> Self {
        Self {
            pve: 1.0,
            vehicle: 1.0,
            miniboss: 1.0,
            champion: 1.0,
            boss: 1.0,
            elite: 1.0,
            minor: 1.0,
        }
    }
}

/// Firing cadence. Delays are in seconds once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringData {
    pub damage: f64,
    pub crit_mult: f64,
    pub burst_delay: f64,
    pub burst_size: i32,
    pub inner_burst_delay: f64,
    pub charge: bool,
    pub one_ammo: bool,
}

impl Default for FiringData {
    fn default() -> Self {
        Self {
            damage: 1.0,
            crit_mult: 0.0,
            burst_delay: 0.0,
            burst_size: 0,
            inner_burst_delay: 0.0,
            charge: false,
            one_ammo: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoFormula {
    pub mag: StatFormula,
    pub reserve_id: u32,
    pub round_to: i32,
}

impl Default for AmmoFormula {
    fn default() -> Self {
        Self {
            mag: StatFormula::new(0.0, 0.0, 1.0),
            reserve_id: 0,
            round_to: 0,
        }
    }
}

/// Pool indices for one weapon variant. All-zero means "neutral records".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataPointers {
    pub r: usize,
    pub h: usize,
    pub rl: usize,
    pub s: usize,
    pub f: usize,
    pub a: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_to_eight_places() {
        assert_eq!(round_coefficient(0.123456789), 0.12345679);
        assert_eq!(round_coefficient(-0.000000001), 0.0);
        assert!(round_coefficient(-0.0).is_sign_positive());
    }

    #[test]
    fn rounding_is_idempotent() {
        for x in [1.0 / 3.0, 2.0 / 51.0 + 1.5, -7.123456785, 1e-9, 12345.678901234] {
            let once = round_coefficient(x);
            assert_eq!(round_coefficient(once), once);
        }
    }

    #[test]
    fn neutral_ammo_has_unit_mag_offset() {
        let a = AmmoFormula::default();
        assert_eq!(a.mag, StatFormula::new(0.0, 0.0, 1.0));
        assert_eq!(a.reserve_id, 0);
    }
}
