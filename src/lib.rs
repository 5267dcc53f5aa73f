//! Weapon formula compactor: library entry point.
//!
//! Normalizes a legacy weapon-formula database into canonical records,
//! deduplicates them into pools, compacts the family/weapon lookup into
//! path and meta tables and emits the result as static Rust source.

pub mod compact;
pub mod config;
pub mod database;
pub mod diagnostic;
pub mod emit;
pub mod model;
pub mod pool;
pub mod report;
pub mod schema;
pub mod util;
pub mod walker;
