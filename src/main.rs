//! Weapon formula compactor: CLI.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use weapon_compactor::compact::{build, CompactedDatabase};
use weapon_compactor::config::{CompactConfig, CompactRun, DiffConfig};
use weapon_compactor::database::RawDatabase;
use weapon_compactor::diagnostic::{Diagnostic, Severity};
use weapon_compactor::emit::{render_module, render_template};
use weapon_compactor::report::{diff_dumps, write_debug_json, write_diff_json, DebugDump};
use weapon_compactor::util::{init_logging, write_output};
use weapon_compactor::walker::{resolve_weapon, FamilyDefs};

#[derive(Parser)]
#[command(name = "weapon-compactor")]
#[command(about = "Weapon formula compactor (Deduplicating Pools + Static Table Emitter)")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compact the database and substitute the tables into a source template.
    Compact {
        #[arg(long, value_name = "JSON")]
        database: PathBuf,
        #[arg(long, value_name = "PATH")]
        template: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "weapon_formulas.rs")]
        out: PathBuf,
        #[arg(long, value_name = "PATH", help = "Also write pools and paths as JSON")]
        debug_json: Option<PathBuf>,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "ID", help = "Extra family id to exclude (repeatable)")]
        exclude: Vec<u8>,
    },
    /// Compact the database into a standalone module of const tables.
    Module {
        #[arg(long, value_name = "JSON")]
        database: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "weapon_formulas.rs")]
        out: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "ID")]
        exclude: Vec<u8>,
    },
    /// Print the resolved records of one weapon.
    Weapon {
        #[arg(long, value_name = "JSON")]
        database: PathBuf,
        #[arg(long)]
        family: u8,
        hash: u32,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
    },
    /// Compare two debug JSON dumps (e.g. before/after a database edit).
    Diff {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compact {
            database,
            template,
            out,
            debug_json,
            config,
            exclude,
        } => run_compact(CompactRun {
            database,
            template,
            out,
            debug_json,
            config: CompactConfig::resolve(config.as_deref(), &exclude)
                .map_err(|e| e.to_string())?,
        }),
        Commands::Module {
            database,
            out,
            config,
            exclude,
        } => {
            let config =
                CompactConfig::resolve(config.as_deref(), &exclude).map_err(|e| e.to_string())?;
            run_module(&database, &out, &config)
        }
        Commands::Weapon {
            database,
            family,
            hash,
            config,
        } => {
            let config = CompactConfig::resolve(config.as_deref(), &[]).map_err(|e| e.to_string())?;
            run_weapon(&database, family, hash, &config)
        }
        Commands::Diff { a, b, out } => run_diff(DiffConfig {
            dump_a: a,
            dump_b: b,
            out,
        }),
    }
}

fn compact_database(path: &Path, config: &CompactConfig) -> Result<CompactedDatabase, String> {
    let raw = RawDatabase::load(path, config.max_database_bytes).map_err(|e| e.to_string())?;
    let (db, diagnostics) = build(&raw, &config.excluded_families).map_err(|e| e.to_string())?;
    log_summary(&db, &diagnostics);
    Ok(db)
}

fn log_summary(db: &CompactedDatabase, diagnostics: &[Diagnostic]) {
    let skipped = diagnostics.iter().filter(|d| d.is_warning()).count();
    let sizes: Vec<String> = db
        .pools
        .sizes()
        .iter()
        .map(|(kind, len)| format!("{}={}", kind, len))
        .collect();
    tracing::info!(
        "{} weapon(s), {} with default pointers; pools: {}",
        db.weapon_count(),
        skipped,
        sizes.join(" ")
    );
}

fn run_compact(run: CompactRun) -> Result<(), String> {
    let template = fs::read_to_string(&run.template)
        .map_err(|e| format!("{}: {}", run.template.display(), e))?;
    let db = compact_database(&run.database, &run.config)?;
    // Render fully before touching the output path.
    let source = render_template(&template, &db).map_err(|e| e.to_string())?;
    write_output(&run.out, &source).map_err(|e| e.to_string())?;
    tracing::info!("wrote {}", run.out.display());
    if let Some(path) = run.debug_json {
        write_debug_json(&db, &path)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}

fn run_module(database: &Path, out: &Path, config: &CompactConfig) -> Result<(), String> {
    let db = compact_database(database, config)?;
    let source = render_module(&db).map_err(|e| e.to_string())?;
    write_output(out, &source).map_err(|e| e.to_string())?;
    tracing::info!("wrote {}", out.display());
    Ok(())
}

fn run_weapon(
    database: &Path,
    family: u8,
    hash: u32,
    config: &CompactConfig,
) -> Result<(), String> {
    let raw = RawDatabase::load(database, config.max_database_bytes).map_err(|e| e.to_string())?;
    let entry = raw
        .index()
        .iter()
        .find(|e| e.id == family)
        .ok_or_else(|| format!("family {} not in INDEX", family))?;
    let block = raw.family(entry).map_err(|e| e.to_string())?;
    let defs = FamilyDefs::normalize(&block).map_err(|e| e.to_string())?;
    let weapon = block
        .weapons
        .iter()
        .find(|w| w.hash == hash)
        .ok_or_else(|| format!("weapon {} not found in {}", hash, block.name))?;

    println!("Weapon: {} in {} ({})", hash, block.name, family);
    if config.excluded_families.contains(&family) {
        println!("Note: family {} is excluded from emitted tables", family);
    }
    match resolve_weapon(&defs, weapon) {
        Ok(records) => {
            let json = serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        Err(e) => {
            let d = Diagnostic::unresolved_weapon(family, block.name, hash, &e);
            let sev = match d.severity {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
            };
            println!("[{}] {} :: {}", d.code, sev, d.summary);
        }
    }
    Ok(())
}

fn run_diff(cfg: DiffConfig) -> Result<(), String> {
    let a = DebugDump::load(&cfg.dump_a)?;
    let b = DebugDump::load(&cfg.dump_b)?;
    let diff = diff_dumps(&a, &b);

    println!("Diff: {} vs {}", cfg.dump_a.display(), cfg.dump_b.display());
    for change in &diff.pool_sizes {
        println!("  {} pool: {} -> {}", change.kind, change.before, change.after);
    }
    println!("Weapons added: {}", diff.added.len());
    for (family, hash) in &diff.added {
        println!("  + {}:{}", family, hash);
    }
    println!("Weapons removed: {}", diff.removed.len());
    for (family, hash) in &diff.removed {
        println!("  - {}:{}", family, hash);
    }
    println!("Weapons changed: {}", diff.changed.len());
    for c in &diff.changed {
        let kinds: Vec<&str> = c.kinds.iter().map(|k| k.name()).collect();
        println!("  ~ {}:{}  {}", c.family, c.hash, kinds.join(", "));
    }

    if let Some(dir) = cfg.out {
        let path = dir.join("diff.json");
        write_diff_json(&diff, &path)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}
