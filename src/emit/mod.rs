//! Code emission: renders pools and path/meta tables as literal Rust and
//! substitutes them into a template.
//!
//! Placeholders are `{STEM_REPLACE_POINT}` and `{STEM_REPLACE_POINT_len}`. The
//! set the template uses must match the manifest exactly; everything else in
//! the template is copied verbatim.

mod literal;

pub use literal::{pool_literal, record_literal, FORMULA_STRUCT, POINTERS_STRUCT};

use crate::compact::CompactedDatabase;
use crate::model::RecordKind;
use literal::path_row_items;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub const PLACEHOLDER_SUFFIX: &str = "_REPLACE_POINT";
pub const LEN_SUFFIX: &str = "_len";
pub const PATH_STEM: &str = "PATH";
pub const META_STEM: &str = "META";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template is missing placeholder(s): {}", .names.join(", "))]
    MissingPlaceholders { names: Vec<String> },
    #[error("template has placeholder(s) with no substitution: {}", .names.join(", "))]
    UnknownPlaceholders { names: Vec<String> },
    #[error("{context}: cannot render {value} as a literal")]
    Unrenderable { context: String, value: String },
}

pub fn placeholder(stem: &str) -> String {
    format!("{}{}", stem, PLACEHOLDER_SUFFIX)
}

pub fn len_placeholder(stem: &str) -> String {
    format!("{}{}{}", stem, PLACEHOLDER_SUFFIX, LEN_SUFFIX)
}

/// Every placeholder a template must contain: data and length for each pool,
/// then the path and meta tables.
pub fn manifest() -> Vec<String> {
    RecordKind::ALL
        .iter()
        .map(RecordKind::table_stem)
        .chain([PATH_STEM, META_STEM])
        .flat_map(|stem| [placeholder(stem), len_placeholder(stem)])
        .collect()
}

/// A `{NAME}` occurrence: byte range includes the braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    pub start: usize,
    pub end: usize,
}

fn is_placeholder_name(name: &str) -> bool {
    let base = name.strip_suffix(LEN_SUFFIX).unwrap_or(name);
    let Some(stem) = base.strip_suffix(PLACEHOLDER_SUFFIX) else {
        return false;
    };
    stem.starts_with(|c: char| c.is_ascii_uppercase())
        && stem
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// All placeholder occurrences in template order. Braces that do not wrap a
/// placeholder name (Rust blocks, struct bodies) are ordinary text.
pub fn find_placeholders(template: &str) -> Vec<Placeholder<'_>> {
    let bytes = template.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }
        let name_start = i + 1;
        let mut j = name_start;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'}' && is_placeholder_name(&template[name_start..j]) {
            found.push(Placeholder {
                name: &template[name_start..j],
                start: i,
                end: j + 1,
            });
            i = j + 1;
        } else {
            i = name_start;
        }
    }
    found
}

fn pool_text(db: &CompactedDatabase, kind: RecordKind) -> Result<(String, usize), TemplateError> {
    let p = &db.pools;
    Ok(match kind {
        RecordKind::Handling => (pool_literal(kind, p.handling.entries())?, p.handling.len()),
        RecordKind::Range => (pool_literal(kind, p.range.entries())?, p.range.len()),
        RecordKind::Reload => (pool_literal(kind, p.reload.entries())?, p.reload.len()),
        RecordKind::Scalar => (pool_literal(kind, p.scalar.entries())?, p.scalar.len()),
        RecordKind::Firing => (pool_literal(kind, p.firing.entries())?, p.firing.len()),
        RecordKind::Ammo => (pool_literal(kind, p.ammo.entries())?, p.ammo.len()),
    })
}

fn path_rows(db: &CompactedDatabase, row_prefix: &str, row_suffix: &str) -> Result<String, TemplateError> {
    let rows = db
        .paths
        .iter()
        .map(|row| -> Result<String, TemplateError> {
            Ok(format!("{}{}{}", row_prefix, path_row_items(row)?, row_suffix))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", rows.join(",")))
}

fn meta_text(db: &CompactedDatabase) -> String {
    let items: Vec<String> = db
        .meta
        .iter()
        .map(|m| format!("({},{})", m.family, m.position))
        .collect();
    format!("[{}]", items.join(","))
}

/// Text for every manifest placeholder.
pub fn substitutions(db: &CompactedDatabase) -> Result<HashMap<String, String>, TemplateError> {
    let mut subs = HashMap::new();
    for kind in RecordKind::ALL {
        let (text, len) = pool_text(db, kind)?;
        subs.insert(placeholder(kind.table_stem()), text);
        subs.insert(len_placeholder(kind.table_stem()), len.to_string());
    }
    subs.insert(placeholder(PATH_STEM), path_rows(db, "vec![", "]")?);
    subs.insert(len_placeholder(PATH_STEM), db.paths.len().to_string());
    subs.insert(placeholder(META_STEM), meta_text(db));
    subs.insert(len_placeholder(META_STEM), db.meta.len().to_string());
    Ok(subs)
}

/// Substitute every placeholder. The template's placeholder set is checked
/// against the manifest in both directions before anything is replaced.
pub fn render_template(template: &str, db: &CompactedDatabase) -> Result<String, TemplateError> {
    let found = find_placeholders(template);
    let manifest = manifest();

    let mut seen = HashSet::new();
    let unknown: Vec<String> = found
        .iter()
        .filter(|p| !manifest.iter().any(|m| m == p.name) && seen.insert(p.name))
        .map(|p| p.name.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(TemplateError::UnknownPlaceholders { names: unknown });
    }
    let missing: Vec<String> = manifest
        .into_iter()
        .filter(|m| !found.iter().any(|p| p.name == m))
        .collect();
    if !missing.is_empty() {
        return Err(TemplateError::MissingPlaceholders { names: missing });
    }

    let subs = substitutions(db)?;
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for p in &found {
        out.push_str(&template[last..p.start]);
        if let Some(text) = subs.get(p.name) {
            out.push_str(text);
        }
        last = p.end;
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn const_item(doc: &str, name: &str, ty: &str, value: &str) -> String {
    format!(
        "#[doc=r#\"{}\"#]\n#[allow(dead_code)]\npub const {}: {} = {};\n",
        doc, name, ty, value
    )
}

/// A standalone module of `pub const` tables, for builds that include the
/// output directly instead of going through a template. Path rows are
/// emitted as slices so the whole table stays const.
pub fn render_module(db: &CompactedDatabase) -> Result<String, TemplateError> {
    let mut out = String::from("// Generated by weapon-compactor. Do not edit.\n\n");
    for kind in RecordKind::ALL {
        let (text, len) = pool_text(db, kind)?;
        out.push_str(&const_item(
            &format!("Array of {} formulas", kind.name()),
            &format!("{}_DATA", kind.table_stem()),
            &format!("[{}; {}]", kind.struct_name(), len),
            &text,
        ));
    }
    out.push_str(&const_item(
        "Family id to row in WEAPON_PATHS",
        "META_POINTERS",
        &format!("[(u8, usize); {}]", db.meta.len()),
        &meta_text(db),
    ));
    out.push_str(&const_item(
        "Per-family (weapon hash, data pointers) rows",
        "WEAPON_PATHS",
        &format!("[&[(u32, {})]; {}]", POINTERS_STRUCT, db.paths.len()),
        &path_rows(db, "&[", "]")?,
    ));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::{build_from_str, MetaEntry};
    use crate::model::DataPointers;
    use crate::pool::Pools;

    fn full_template() -> String {
        manifest()
            .iter()
            .map(|n| format!("const X_{}: () = {{{}}};\n", n.to_lowercase(), n))
            .collect()
    }

    fn small_db() -> CompactedDatabase {
        CompactedDatabase {
            pools: Pools::new(),
            meta: vec![MetaEntry { family: 6, position: 0 }],
            paths: vec![vec![(42, DataPointers::default())]],
        }
    }

    #[test]
    fn manifest_has_sixteen_names() {
        let m = manifest();
        assert_eq!(m.len(), 16);
        assert_eq!(m[0], "HANDLING_REPLACE_POINT");
        assert_eq!(m[1], "HANDLING_REPLACE_POINT_len");
        assert!(m.contains(&"META_REPLACE_POINT_len".to_string()));
    }

    #[test]
    fn rust_braces_are_not_placeholders() {
        let t = "fn f() { let x = Foo{a:1}; format!(\"{}\", x); {HANDLING_REPLACE_POINT_len} }";
        let found = find_placeholders(t);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "HANDLING_REPLACE_POINT_len");
        assert_eq!(&t[found[0].start..found[0].end], "{HANDLING_REPLACE_POINT_len}");
    }

    #[test]
    fn render_substitutes_and_preserves_text() {
        let out = render_template(&full_template(), &small_db()).unwrap();
        assert!(find_placeholders(&out).is_empty());
        assert!(out.contains("const X_meta_replace_point: () = [(6,0)];"));
        assert!(out.contains("= [vec![(42,DataPointers{r:0,h:0,rl:0,s:0,f:0,a:0})]];"));
        assert!(out.contains("const X_ammo_replace_point_len: () = 1;"));
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let t = full_template().replace("{AMMO_REPLACE_POINT_len}", "1");
        let err = render_template(&t, &small_db()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholders {
                names: vec!["AMMO_REPLACE_POINT_len".to_string()]
            }
        );
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let t = format!("{}{{PERK_REPLACE_POINT}}", full_template());
        let err = render_template(&t, &small_db()).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholders { names } if names == ["PERK_REPLACE_POINT"]));
    }

    #[test]
    fn unknown_placeholders_listed_once_in_order() {
        let t = format!(
            "{}{{X_REPLACE_POINT}}{{Y_REPLACE_POINT}}{{X_REPLACE_POINT}}",
            full_template()
        );
        let err = render_template(&t, &small_db()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholders {
                names: vec!["X_REPLACE_POINT".to_string(), "Y_REPLACE_POINT".to_string()]
            }
        );
    }

    #[test]
    fn repeated_placeholder_replaced_everywhere() {
        let t = format!("{}{{META_REPLACE_POINT_len}}", full_template());
        let out = render_template(&t, &small_db()).unwrap();
        assert!(out.ends_with("1"));
    }

    #[test]
    fn module_declares_every_table() {
        let (db, _) = build_from_str(r#"{"INDEX": {"6": "AR"}, "AR": {}}"#, &[]).unwrap();
        let m = render_module(&db).unwrap();
        for name in [
            "HANDLING_DATA: [HandlingFormula; 1]",
            "RANGE_DATA: [RangeFormula; 1]",
            "RELOAD_DATA: [ReloadFormula; 1]",
            "SCALAR_DATA: [DamageMods; 1]",
            "FIRING_DATA: [FiringData; 1]",
            "AMMO_DATA: [AmmoFormula; 1]",
            "META_POINTERS: [(u8, usize); 1] = [(6,0)];",
            "WEAPON_PATHS: [&[(u32, DataPointers)]; 1] = [&[]];",
        ] {
            assert!(m.contains(name), "missing {}", name);
        }
    }
}
