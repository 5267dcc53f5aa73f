//! Stat formula canonicalization.

use super::fields::Fields;
use super::SchemaError;
use crate::model::StatFormula;
use serde_json::Value;

const FORMULA_FIELDS: [&str; 3] = ["evpp", "vpp", "offset"];

/// Missing coefficients become 0.0; each one is rounded. More than the three
/// coefficient fields is a schema error.
pub fn canonicalize_formula(
    context: impl Into<String>,
    value: &Value,
) -> Result<StatFormula, SchemaError> {
    let fields = Fields::new(context, value, &FORMULA_FIELDS)?;
    Ok(StatFormula::new(
        fields.f64_or("evpp", 0.0)?,
        fields.f64_or("vpp", 0.0)?,
        fields.f64_or("offset", 0.0)?,
    ))
}

/// Nested formula field, or `default` when absent.
pub(crate) fn formula_or(
    fields: &Fields<'_>,
    key: &str,
    default: StatFormula,
) -> Result<StatFormula, SchemaError> {
    match fields.get(key) {
        None => Ok(default),
        Some(v) => canonicalize_formula(fields.child_context(key), v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fills_missing_coefficients() {
        let f = canonicalize_formula("f", &json!({"vpp": 2.5})).unwrap();
        assert_eq!(f, StatFormula { evpp: 0.0, vpp: 2.5, offset: 0.0 });
    }

    #[test]
    fn rounds_coefficients() {
        let f = canonicalize_formula("f", &json!({"offset": 1.000000004})).unwrap();
        assert_eq!(f.offset, 1.0);
    }

    #[test]
    fn field_order_is_canonical() {
        let f = canonicalize_formula("f", &json!({"offset": 3, "evpp": 1, "vpp": 2})).unwrap();
        assert_eq!(
            serde_json::to_string(&f).unwrap(),
            r#"{"evpp":1.0,"vpp":2.0,"offset":3.0}"#
        );
    }

    #[test]
    fn fourth_field_fails() {
        let err = canonicalize_formula("f", &json!({"evpp": 0, "vpp": 0, "offset": 0, "x": 1}));
        assert!(matches!(err, Err(SchemaError::TooManyFields { .. })));
    }
}
