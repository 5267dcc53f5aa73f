//! Schema normalization: default-filling, legacy-shape reconciliation, and
//! type coercion for the six shared record kinds.
//!
//! Raw JSON is parsed once into an input shape (`RangeInput`, `ReloadInput`,
//! `FiringInput`) that names which vintage the data came in; normalization
//! then works on the shape, never on key presence.

mod fields;
mod formula;

pub use formula::canonicalize_formula;

use crate::model::{
    AmmoFormula, DamageMods, FiringData, HandlingFormula, RangeFormula, RecordKind,
    ReloadFormula, StatFormula,
};
use fields::Fields;
use formula::formula_or;
use serde_json::Value;
use thiserror::Error;

/// Crit tier that marks a frame-tier entry even though it is not an integer.
pub const CRIT_TIER_SENTINEL: f64 = -25.5;

/// Frames per second of the source timing data.
pub const FRAMES_PER_SECOND: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{context}: expected an object")]
    NotAnObject { context: String },
    #[error("{context}: more fields than the record allows (unexpected: {})", .unexpected.join(", "))]
    TooManyFields {
        context: String,
        unexpected: Vec<String>,
    },
    #[error("{context}: {first} and {second} cannot both be present")]
    ConflictingFields {
        context: String,
        first: String,
        second: String,
    },
    #[error("{context}.{field}: expected {expected}")]
    InvalidType {
        context: String,
        field: String,
        expected: &'static str,
    },
    #[error("{context}: unknown units tag {value:?} (expected \"frames\" or \"seconds\")")]
    UnknownUnits { context: String, value: String },
}

/// A record kind that can be normalized from its raw JSON form.
pub trait Normalize: Sized {
    const KIND: RecordKind;

    fn normalize(value: &Value) -> Result<Self, SchemaError>;
}

impl Normalize for HandlingFormula {
    const KIND: RecordKind = RecordKind::Handling;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new("handling", value, &["ready", "stow", "ads"])?;
        Ok(HandlingFormula {
            ready: formula_or(&f, "ready", StatFormula::zero())?,
            stow: formula_or(&f, "stow", StatFormula::zero())?,
            ads: formula_or(&f, "ads", StatFormula::zero())?,
        })
    }
}

const RANGE_SCALAR_FIELDS: [&str; 4] = ["vpp_start", "vpp_end", "offset_start", "offset_end"];

/// Range data arrives either as the authored start/end scalars or already in
/// canonical start/end formula form.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeInput {
    Scalars {
        vpp_start: f64,
        vpp_end: f64,
        offset_start: f64,
        offset_end: f64,
        floor_percent: f64,
        fusion: bool,
    },
    Formulas {
        start: StatFormula,
        end: StatFormula,
        floor_percent: f64,
        fusion: bool,
    },
}

impl RangeInput {
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new(
            "range",
            value,
            &[
                "vpp_start",
                "vpp_end",
                "offset_start",
                "offset_end",
                "floor_percent",
                "fusion",
                "start",
                "end",
            ],
        )?;
        let floor_percent = f.f64_or("floor_percent", 0.0)?;
        let fusion = f.bool_or("fusion", false)?;
        let formula_key = ["start", "end"].into_iter().find(|k| f.has(k));
        if let Some(formula_key) = formula_key {
            if let Some(scalar) = RANGE_SCALAR_FIELDS.iter().find(|k| f.has(k)) {
                return Err(SchemaError::ConflictingFields {
                    context: f.context().to_string(),
                    first: formula_key.to_string(),
                    second: scalar.to_string(),
                });
            }
            return Ok(RangeInput::Formulas {
                start: formula_or(&f, "start", StatFormula::zero())?,
                end: formula_or(&f, "end", StatFormula::zero())?,
                floor_percent,
                fusion,
            });
        }
        Ok(RangeInput::Scalars {
            vpp_start: f.f64_or("vpp_start", 0.0)?,
            vpp_end: f.f64_or("vpp_end", 0.0)?,
            offset_start: f.f64_or("offset_start", 0.0)?,
            offset_end: f.f64_or("offset_end", 0.0)?,
            floor_percent,
            fusion,
        })
    }

    pub fn into_formula(self) -> RangeFormula {
        match self {
            RangeInput::Scalars {
                vpp_start,
                vpp_end,
                offset_start,
                offset_end,
                floor_percent,
                fusion,
            } => RangeFormula {
                start: StatFormula::new(0.0, vpp_start, offset_start),
                end: StatFormula::new(0.0, vpp_end, offset_end),
                floor_percent,
                fusion,
            },
            RangeInput::Formulas {
                start,
                end,
                floor_percent,
                fusion,
            } => RangeFormula {
                start,
                end,
                floor_percent,
                fusion,
            },
        }
    }
}

impl Normalize for RangeFormula {
    const KIND: RecordKind = RecordKind::Range;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        Ok(RangeInput::parse(value)?.into_formula())
    }
}

/// Reload data: a bare coefficient trio, or a nested `reload_data` formula.
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadInput {
    Scalars {
        evpp: f64,
        vpp: f64,
        offset: f64,
        ammo_percent: f64,
    },
    Prebuilt {
        reload_data: StatFormula,
        ammo_percent: f64,
    },
}

impl ReloadInput {
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new(
            "reload",
            value,
            &["evpp", "vpp", "offset", "ammo_percent", "reload_data"],
        )?;
        let ammo_percent = f.f64_or("ammo_percent", 0.0)?;
        if let Some(prebuilt) = f.get("reload_data") {
            if let Some(scalar) = ["evpp", "vpp", "offset"].into_iter().find(|k| f.has(k)) {
                return Err(SchemaError::ConflictingFields {
                    context: f.context().to_string(),
                    first: "reload_data".to_string(),
                    second: scalar.to_string(),
                });
            }
            return Ok(ReloadInput::Prebuilt {
                reload_data: canonicalize_formula(f.child_context("reload_data"), prebuilt)?,
                ammo_percent,
            });
        }
        Ok(ReloadInput::Scalars {
            evpp: f.f64_or("evpp", 0.0)?,
            vpp: f.f64_or("vpp", 0.0)?,
            offset: f.f64_or("offset", 0.0)?,
            ammo_percent,
        })
    }

    pub fn into_formula(self) -> ReloadFormula {
        match self {
            ReloadInput::Scalars {
                evpp,
                vpp,
                offset,
                ammo_percent,
            } => ReloadFormula {
                reload_data: StatFormula::new(evpp, vpp, offset),
                ammo_percent,
            },
            ReloadInput::Prebuilt {
                reload_data,
                ammo_percent,
            } => ReloadFormula {
                reload_data,
                ammo_percent,
            },
        }
    }
}

impl Normalize for ReloadFormula {
    const KIND: RecordKind = RecordKind::Reload;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        Ok(ReloadInput::parse(value)?.into_formula())
    }
}

impl Normalize for DamageMods {
    const KIND: RecordKind = RecordKind::Scalar;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new(
            "combatant_scalars",
            value,
            &["pve", "vehicle", "miniboss", "champion", "boss", "elite", "minor"],
        )?;
        let miniboss = f.f64_or("miniboss", 1.0)?;
        Ok(DamageMods {
            pve: f.f64_or("pve", 1.0)?,
            vehicle: f.f64_or("vehicle", 1.0)?,
            miniboss,
            champion: f.f64_or("champion", miniboss)?,
            boss: f.f64_or("boss", 1.0)?,
            elite: f.f64_or("elite", 1.0)?,
            minor: f.f64_or("minor", 1.0)?,
        })
    }
}

/// Which spelling a boolean firing flag was authored with. Each flag is
/// resolved on its own, so one entry may mix vintages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagNaming {
    /// `is_charge` / `is_explosive`.
    Prefixed,
    /// `charge` / `explosive`.
    Plain,
}

impl FlagNaming {
    /// Read one flag under whichever of its two names is present; both at once conflict.
    fn resolve(f: &Fields<'_>, plain: &str, prefixed: &str) -> Result<(Self, bool), SchemaError> {
        f.exclusive(prefixed, plain)?;
        if f.has(prefixed) {
            Ok((FlagNaming::Prefixed, f.bool_or(prefixed, false)?))
        } else {
            Ok((FlagNaming::Plain, f.bool_or(plain, false)?))
        }
    }
}

/// Crit multiplier as authored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CritInput {
    /// Frame-based tier; delays in the same entry are in frames.
    FrameTier(f64),
    /// Already a multiplier; delays are in seconds.
    Multiplier(f64),
}

impl CritInput {
    /// An explicit `units` tag decides; without one, a JSON integer crit value
    /// or the sentinel marks a frame tier.
    fn resolve(f: &Fields<'_>) -> Result<Self, SchemaError> {
        let crit = f.opt_f64("crit_mult")?;
        match f.opt_str("units")? {
            Some("frames") => return Ok(CritInput::FrameTier(crit.unwrap_or(0.0))),
            Some("seconds") => return Ok(CritInput::Multiplier(crit.unwrap_or(0.0))),
            Some(other) => {
                return Err(SchemaError::UnknownUnits {
                    context: f.context().to_string(),
                    value: other.to_string(),
                })
            }
            None => {}
        }
        let Some(crit) = crit else {
            return Ok(CritInput::Multiplier(0.0));
        };
        let integral = f
            .get("crit_mult")
            .and_then(Value::as_number)
            .map(|n| n.is_i64() || n.is_u64())
            .unwrap_or(false);
        if integral || crit == CRIT_TIER_SENTINEL {
            Ok(CritInput::FrameTier(crit))
        } else {
            Ok(CritInput::Multiplier(crit))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiringInput {
    pub charge_naming: FlagNaming,
    pub explosive_naming: FlagNaming,
    pub crit: CritInput,
    pub damage: f64,
    pub burst_delay: f64,
    pub burst_size: i32,
    pub inner_burst_delay: f64,
    pub charge: bool,
    /// Validated but not carried: the runtime record has no explosive slot.
    pub explosive: bool,
    pub one_ammo: bool,
}

impl FiringInput {
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new(
            "firing",
            value,
            &[
                "damage",
                "crit_mult",
                "burst_delay",
                "burst_size",
                "inner_burst_delay",
                "charge",
                "is_charge",
                "explosive",
                "is_explosive",
                "one_ammo",
                "one_ammo_burst",
                "units",
            ],
        )?;
        f.exclusive("one_ammo", "one_ammo_burst")?;
        let (charge_naming, charge) = FlagNaming::resolve(&f, "charge", "is_charge")?;
        let (explosive_naming, explosive) = FlagNaming::resolve(&f, "explosive", "is_explosive")?;
        let burst_size = f.int_or("burst_size", 0)?;
        Ok(FiringInput {
            charge_naming,
            explosive_naming,
            crit: CritInput::resolve(&f)?,
            damage: f.f64_or("damage", 1.0)?,
            burst_delay: f.f64_or("burst_delay", 0.0)?,
            burst_size: i32::try_from(burst_size)
                .map_err(|_| f.invalid("burst_size", "a 32-bit integer"))?,
            inner_burst_delay: f.f64_or("inner_burst_delay", 0.0)?,
            charge,
            explosive,
            one_ammo: match f.opt_bool("one_ammo")? {
                Some(v) => v,
                None => f.bool_or("one_ammo_burst", false)?,
            },
        })
    }

    /// Frame tiers become multipliers (`1.5 + tier / 51`) and frame delays become seconds.
    pub fn into_firing(self) -> FiringData {
        let (crit_mult, burst_delay, inner_burst_delay) = match self.crit {
            CritInput::FrameTier(tier) => (
                1.5 + tier / 51.0,
                self.burst_delay / FRAMES_PER_SECOND,
                self.inner_burst_delay / FRAMES_PER_SECOND,
            ),
            CritInput::Multiplier(m) => (m, self.burst_delay, self.inner_burst_delay),
        };
        FiringData {
            damage: self.damage,
            crit_mult,
            burst_delay,
            burst_size: self.burst_size,
            inner_burst_delay,
            charge: self.charge,
            one_ammo: self.one_ammo,
        }
    }
}

impl Normalize for FiringData {
    const KIND: RecordKind = RecordKind::Firing;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        Ok(FiringInput::parse(value)?.into_firing())
    }
}

impl Normalize for AmmoFormula {
    const KIND: RecordKind = RecordKind::Ammo;

    fn normalize(value: &Value) -> Result<Self, SchemaError> {
        let f = Fields::new("ammo", value, &["mag", "reserve_id", "round_to"])?;
        let reserve_id = f.int_or("reserve_id", 0)?;
        let round_to = f.int_or("round_to", 0)?;
        Ok(AmmoFormula {
            mag: formula_or(&f, "mag", StatFormula::new(0.0, 0.0, 1.0))?,
            reserve_id: u32::try_from(reserve_id)
                .map_err(|_| f.invalid("reserve_id", "a non-negative integer"))?,
            round_to: i32::try_from(round_to)
                .map_err(|_| f.invalid("round_to", "a 32-bit integer"))?,
        })
    }
}
