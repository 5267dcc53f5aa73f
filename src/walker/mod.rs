//! Weapon graph walker: resolves each weapon's shared definitions, interns
//! them, and builds its pointer tuple. Weapons that fail to resolve get
//! default pointers and a diagnostic; the walk continues.

use crate::compact::BuildError;
use crate::database::{
    FamilyBlock, RawDatabase, RawWeapon, CATEGORY_TABLE, MAG_PROFILE_TABLE, SUBFAMILY_TABLE,
};
use crate::diagnostic::Diagnostic;
use crate::model::{
    AmmoFormula, DamageMods, DataPointers, FiringData, HandlingFormula, RangeFormula,
    ReloadFormula,
};
use crate::pool::{Pools, WeaponRecords};
use crate::schema::{Normalize, SchemaError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

pub const RANGE_PART: &str = "range";
pub const HANDLING_PART: &str = "handling";
pub const RELOAD_PART: &str = "reload";
pub const SCALAR_PART: &str = "combatant_scalars";

/// Default per-weapon pve multiplier.
pub const DEFAULT_PVE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("weapon entry is not an object")]
    NotAnObject,
    #[error("weapon has no {field} reference")]
    NullReference { field: &'static str },
    #[error("{table} {name:?} not found")]
    MissingReference { table: &'static str, name: String },
    #[error("family has no {table} table")]
    MissingSideTable { table: &'static str },
    #[error("category {category:?} has no {part} definition")]
    MissingDefinition {
        category: String,
        part: &'static str,
    },
    #[error("pve override must be a single number")]
    InvalidOverride,
}

/// A category's four shared definitions, normalized. Absent parts stay `None`
/// and only fail the weapons that need them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDefs {
    pub range: Option<RangeFormula>,
    pub handling: Option<HandlingFormula>,
    pub reload: Option<ReloadFormula>,
    pub scalar: Option<DamageMods>,
}

/// Every shared definition of one family, normalized up front so corrupt
/// definitions abort the run whether or not a weapon uses them.
#[derive(Debug, Clone, Default)]
pub struct FamilyDefs {
    categories: Option<HashMap<String, CategoryDefs>>,
    subfamilies: Option<HashMap<String, FiringData>>,
    mag_profiles: Option<HashMap<String, AmmoFormula>>,
}

fn normalize_part<T: Normalize>(
    category: &Map<String, Value>,
    part: &str,
) -> Result<Option<T>, SchemaError> {
    category.get(part).map(T::normalize).transpose()
}

fn normalize_table<T: Normalize>(
    family: &FamilyBlock<'_>,
    table: Option<&Map<String, Value>>,
    table_name: &str,
) -> Result<Option<HashMap<String, T>>, BuildError> {
    let Some(table) = table else {
        return Ok(None);
    };
    let mut out = HashMap::with_capacity(table.len());
    for (name, raw) in table {
        let record = T::normalize(raw).map_err(|source| BuildError::Schema {
            family: family.id,
            definition: format!("{}.{}", table_name, name),
            source,
        })?;
        out.insert(name.clone(), record);
    }
    Ok(Some(out))
}

impl FamilyDefs {
    pub fn normalize(family: &FamilyBlock<'_>) -> Result<Self, BuildError> {
        let categories = match family.categories {
            None => None,
            Some(table) => {
                let mut out = HashMap::with_capacity(table.len());
                for (name, raw) in table {
                    let defs = normalize_category(raw).map_err(|source| BuildError::Schema {
                        family: family.id,
                        definition: format!("{}.{}", CATEGORY_TABLE, name),
                        source,
                    })?;
                    out.insert(name.clone(), defs);
                }
                Some(out)
            }
        };
        Ok(Self {
            categories,
            subfamilies: normalize_table(family, family.subfamilies, SUBFAMILY_TABLE)?,
            mag_profiles: normalize_table(family, family.mag_profiles, MAG_PROFILE_TABLE)?,
        })
    }

    /// Resolve the six records one weapon uses, with its pve override applied.
    pub fn resolve(&self, weapon: &WeaponRef) -> Result<WeaponRecords, ResolutionError> {
        let categories = self
            .categories
            .as_ref()
            .ok_or(ResolutionError::MissingSideTable {
                table: CATEGORY_TABLE,
            })?;
        let category = lookup(categories, CATEGORY_TABLE, &weapon.category)?;
        let part = |p: &'static str| ResolutionError::MissingDefinition {
            category: weapon.category.clone(),
            part: p,
        };
        let mut scalar = category.scalar.clone().ok_or_else(|| part(SCALAR_PART))?;
        scalar.pve = weapon.pve;

        let subfamilies = self
            .subfamilies
            .as_ref()
            .ok_or(ResolutionError::MissingSideTable {
                table: SUBFAMILY_TABLE,
            })?;
        let mag_profiles = self
            .mag_profiles
            .as_ref()
            .ok_or(ResolutionError::MissingSideTable {
                table: MAG_PROFILE_TABLE,
            })?;
        Ok(WeaponRecords {
            range: category.range.clone().ok_or_else(|| part(RANGE_PART))?,
            handling: category.handling.clone().ok_or_else(|| part(HANDLING_PART))?,
            reload: category.reload.clone().ok_or_else(|| part(RELOAD_PART))?,
            scalar,
            firing: lookup(subfamilies, SUBFAMILY_TABLE, &weapon.subfamily)?.clone(),
            ammo: lookup(mag_profiles, MAG_PROFILE_TABLE, &weapon.mag_profile)?.clone(),
        })
    }
}

fn lookup<'a, T>(
    table: &'a HashMap<String, T>,
    table_name: &'static str,
    name: &str,
) -> Result<&'a T, ResolutionError> {
    table
        .get(name)
        .ok_or_else(|| ResolutionError::MissingReference {
            table: table_name,
            name: name.to_string(),
        })
}

/// Other category keys are free-form and ignored.
fn normalize_category(raw: &Value) -> Result<CategoryDefs, SchemaError> {
    let map = raw.as_object().ok_or_else(|| SchemaError::NotAnObject {
        context: CATEGORY_TABLE.to_string(),
    })?;
    Ok(CategoryDefs {
        range: normalize_part(map, RANGE_PART)?,
        handling: normalize_part(map, HANDLING_PART)?,
        reload: normalize_part(map, RELOAD_PART)?,
        scalar: normalize_part(map, SCALAR_PART)?,
    })
}

/// A weapon entry's references into its family's side tables.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponRef {
    pub category: String,
    pub subfamily: String,
    pub mag_profile: String,
    pub pve: f64,
}

impl WeaponRef {
    /// `pve_mult` is the older spelling of `pve`.
    pub fn parse(entry: &Value) -> Result<Self, ResolutionError> {
        let map = entry.as_object().ok_or(ResolutionError::NotAnObject)?;
        let reference = |field: &'static str| {
            map.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ResolutionError::NullReference { field })
        };
        let pve = match (map.get("pve"), map.get("pve_mult")) {
            (Some(_), Some(_)) => return Err(ResolutionError::InvalidOverride),
            (Some(v), None) | (None, Some(v)) if !v.is_null() => {
                v.as_f64().ok_or(ResolutionError::InvalidOverride)?
            }
            _ => DEFAULT_PVE,
        };
        Ok(Self {
            category: reference(CATEGORY_TABLE)?,
            subfamily: reference(SUBFAMILY_TABLE)?,
            mag_profile: reference(MAG_PROFILE_TABLE)?,
            pve,
        })
    }
}

/// One surviving family's weapons, in block order.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyPaths {
    pub id: u8,
    pub name: String,
    pub weapons: Vec<(u32, DataPointers)>,
}

#[derive(Debug, Clone)]
pub struct WalkOutput {
    pub pools: Pools,
    pub families: Vec<FamilyPaths>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve one weapon without touching any pool.
pub fn resolve_weapon(
    defs: &FamilyDefs,
    weapon: &RawWeapon<'_>,
) -> Result<WeaponRecords, ResolutionError> {
    defs.resolve(&WeaponRef::parse(weapon.entry)?)
}

/// Walk every non-excluded family in `INDEX` order. A weapon's records are
/// interned only when all six resolve.
pub fn walk(db: &RawDatabase, excluded: &[u8]) -> Result<WalkOutput, BuildError> {
    let mut pools = Pools::new();
    let mut families = Vec::new();
    let mut diagnostics = Vec::new();

    for entry in db.index() {
        if excluded.contains(&entry.id) {
            tracing::info!("skipping excluded family {} ({})", entry.block, entry.id);
            diagnostics.push(Diagnostic::excluded_family(entry.id, &entry.block));
            continue;
        }
        let family = db.family(entry)?;
        let defs = FamilyDefs::normalize(&family)?;
        let mut weapons = Vec::with_capacity(family.weapons.len());
        for weapon in &family.weapons {
            let pointers = match resolve_weapon(&defs, weapon) {
                Ok(records) => pools.intern_weapon(records),
                Err(e) => {
                    let d = Diagnostic::unresolved_weapon(family.id, family.name, weapon.hash, &e);
                    tracing::warn!("{}", d.summary);
                    diagnostics.push(d);
                    DataPointers::default()
                }
            };
            weapons.push((weapon.hash, pointers));
        }
        tracing::debug!(
            "family {} ({}): {} weapon(s)",
            family.name,
            family.id,
            weapons.len()
        );
        families.push(FamilyPaths {
            id: family.id,
            name: family.name.to_string(),
            weapons,
        });
    }

    Ok(WalkOutput {
        pools,
        families,
        diagnostics,
    })
}
