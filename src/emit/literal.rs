//! Rewrite of the generic key-value (JSON) encoding into named-struct literal syntax.

use super::TemplateError;
use crate::model::{DataPointers, RecordKind};
use serde::Serialize;
use serde_json::Value;

pub const FORMULA_STRUCT: &str = "StatQuadraticFormula";
pub const POINTERS_STRUCT: &str = "DataPointers";

/// Struct name for a nested object field of `kind`, per the runtime types.
fn nested_struct(kind: RecordKind, field: &str) -> Option<&'static str> {
    match (kind, field) {
        (RecordKind::Handling, "ready" | "stow" | "ads")
        | (RecordKind::Range, "start" | "end")
        | (RecordKind::Reload, "reload_data")
        | (RecordKind::Ammo, "mag") => Some(FORMULA_STRUCT),
        _ => None,
    }
}

fn scalar(out: &mut String, context: &str, v: &Value) -> Result<(), TemplateError> {
    match v {
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        other => {
            return Err(TemplateError::Unrenderable {
                context: context.to_string(),
                value: other.to_string(),
            })
        }
    }
    Ok(())
}

/// `Name{field:value,...}` with no whitespace. Nested objects are only
/// allowed where the kind's rewrite table names a struct for them.
fn object(
    out: &mut String,
    kind: Option<RecordKind>,
    name: &str,
    v: &Value,
) -> Result<(), TemplateError> {
    let Value::Object(map) = v else {
        return Err(TemplateError::Unrenderable {
            context: name.to_string(),
            value: v.to_string(),
        });
    };
    out.push_str(name);
    out.push('{');
    for (i, (field, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(field);
        out.push(':');
        match kind.and_then(|k| nested_struct(k, field)) {
            Some(nested) => object(out, None, nested, value)?,
            None => scalar(out, field, value)?,
        }
    }
    out.push('}');
    Ok(())
}

fn to_value<T: Serialize>(record: &T) -> Result<Value, TemplateError> {
    serde_json::to_value(record).map_err(|e| TemplateError::Unrenderable {
        context: "record".to_string(),
        value: e.to_string(),
    })
}

/// One pooled record as a struct literal of its kind.
pub fn record_literal<T: Serialize>(kind: RecordKind, record: &T) -> Result<String, TemplateError> {
    let mut out = String::new();
    object(&mut out, Some(kind), kind.struct_name(), &to_value(record)?)?;
    Ok(out)
}

/// `[A{..},B{..}]` for a whole pool.
pub fn pool_literal<T: Serialize>(kind: RecordKind, records: &[T]) -> Result<String, TemplateError> {
    let items = records
        .iter()
        .map(|r| record_literal(kind, r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", items.join(",")))
}

pub fn pointers_literal(p: &DataPointers) -> Result<String, TemplateError> {
    let mut out = String::new();
    object(&mut out, None, POINTERS_STRUCT, &to_value(p)?)?;
    Ok(out)
}

/// One path row as `(hash,DataPointers{..})` pairs joined by commas, unwrapped.
pub fn path_row_items(row: &[(u32, DataPointers)]) -> Result<String, TemplateError> {
    let items = row
        .iter()
        .map(|(hash, p)| -> Result<String, TemplateError> {
            Ok(format!("({},{})", hash, pointers_literal(p)?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AmmoFormula, FiringData, HandlingFormula, RangeFormula, StatFormula};

    #[test]
    fn handling_literal_names_nested_formulas() {
        let s = record_literal(RecordKind::Handling, &HandlingFormula::default()).unwrap();
        assert_eq!(
            s,
            "HandlingFormula{ready:StatQuadraticFormula{evpp:0.0,vpp:0.0,offset:0.0},\
             stow:StatQuadraticFormula{evpp:0.0,vpp:0.0,offset:0.0},\
             ads:StatQuadraticFormula{evpp:0.0,vpp:0.0,offset:0.0}}"
        );
    }

    #[test]
    fn floats_keep_decimal_point_and_ints_do_not() {
        let a = AmmoFormula {
            mag: StatFormula::new(0.0, 0.25, 4.0),
            reserve_id: 12,
            round_to: -1,
        };
        let s = record_literal(RecordKind::Ammo, &a).unwrap();
        assert_eq!(
            s,
            "AmmoFormula{mag:StatQuadraticFormula{evpp:0.0,vpp:0.25,offset:4.0},reserve_id:12,round_to:-1}"
        );
        let f = record_literal(RecordKind::Firing, &FiringData::default()).unwrap();
        assert!(f.contains("burst_size:0,"));
        assert!(f.contains("damage:1.0,"));
        assert!(f.contains("charge:false"));
    }

    #[test]
    fn literals_carry_no_whitespace() {
        let s = pool_literal(RecordKind::Range, &[RangeFormula::default(), RangeFormula::default()])
            .unwrap();
        assert!(!s.chars().any(char::is_whitespace));
        assert!(s.starts_with("[RangeFormula{start:StatQuadraticFormula{"));
    }

    #[test]
    fn path_row_pairs() {
        let row = vec![(7u32, DataPointers { r: 1, h: 2, rl: 3, s: 4, f: 5, a: 6 })];
        assert_eq!(
            path_row_items(&row).unwrap(),
            "(7,DataPointers{r:1,h:2,rl:3,s:4,f:5,a:6})"
        );
    }
}
