//! Diagnostics: recoverable per-weapon problems found while walking the database.

use crate::walker::ResolutionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub family: u8,
    pub family_name: String,
    pub weapon_hash: Option<u32>,
    /// One-line message for the run log.
    pub summary: String,
}

impl Diagnostic {
    /// A weapon whose references did not resolve; it was emitted with default pointers.
    pub fn unresolved_weapon(
        family: u8,
        family_name: &str,
        weapon_hash: u32,
        error: &ResolutionError,
    ) -> Self {
        Self {
            code: "UNRESOLVED_WEAPON".to_string(),
            severity: Severity::Warn,
            family,
            family_name: family_name.to_string(),
            weapon_hash: Some(weapon_hash),
            summary: format!(
                "{} ({}) :> {}: {}; using default pointers",
                family_name, family, weapon_hash, error
            ),
        }
    }

    pub fn excluded_family(family: u8, family_name: &str) -> Self {
        Self {
            code: "EXCLUDED_FAMILY".to_string(),
            severity: Severity::Info,
            family,
            family_name: family_name.to_string(),
            weapon_hash: None,
            summary: format!("{} ({}) is excluded from the path tables", family_name, family),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_summary_names_family_and_hash() {
        let err = ResolutionError::MissingReference {
            table: "subFam",
            name: "150".to_string(),
        };
        let d = Diagnostic::unresolved_weapon(9, "Hand Cannon", 1234, &err);
        assert!(d.is_warning());
        assert!(d.summary.contains("Hand Cannon"));
        assert!(d.summary.contains("1234"));
        assert!(d.summary.contains("150"));
    }
}
