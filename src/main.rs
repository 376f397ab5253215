use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use ehf_analyzer::config::Settings;
use ehf_analyzer::{db, pages, parser, query, DocumentBundle, Summary};

#[derive(Parser)]
#[command(name = "ehf-analyzer", about = "Land-registry filing analyzer (owners, charges)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one page dump and store the result
    Process {
        /// Page dump produced by the PDF extractor (JSON)
        dump: PathBuf,
        /// Document name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,
        /// Also write <output_dir>/<name>/<name>_complete.json
        #[arg(long)]
        export: bool,
    },
    /// Analyze every dump in a directory, in parallel
    Batch {
        dir: PathBuf,
        /// Only file names starting with this prefix
        #[arg(long, default_value = "EHF")]
        prefix: String,
        #[arg(long)]
        export: bool,
    },
    /// Current owners of a stored document
    Owners { name: String },
    /// Active and expired charges of a stored document
    Charges { name: String },
    /// Stored documents with summary counts
    List,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Process { dump, name, export } => {
            let name = name.unwrap_or_else(|| document_name(&dump));
            let bundle = analyze(&dump, &name, &settings)?;
            db::save_bundle(&conn, &bundle)?;
            if export {
                let path = query::write_bundle_json(&settings.output_dir, &bundle)?;
                println!("Exported {}", path.display());
            }
            print_summary(&bundle.name, &bundle.summary);
            Ok(())
        }
        Commands::Batch { dir, prefix, export } => {
            let dumps = find_dumps(&dir, &prefix)?;
            if dumps.is_empty() {
                println!("No dumps matching '{}*.json' in {}", prefix, dir.display());
                return Ok(());
            }
            println!("Processing {} documents...", dumps.len());
            let counts = process_batch(&conn, &dumps, &settings, export)?;
            println!("Saved {} documents ({} failed).", counts.ok, counts.failed);
            Ok(())
        }
        Commands::Owners { name } => {
            let rows = db::fetch_owners(&conn, &name)?;
            let view = query::owners_view(&rows);
            if view.is_empty() {
                println!("No owners resolved for {}.", name);
                return Ok(());
            }

            println!(
                "{:<28} | {:<16} | {:<28} | {:<12} | {:<6}",
                "Owner", "Commune", "Address", "Lot", "Volume"
            );
            println!("{}", "-".repeat(100));
            for owner in &view {
                for (i, p) in owner.properties.iter().enumerate() {
                    let label = if i == 0 { truncate(&owner.owner, 28) } else { String::new() };
                    println!(
                        "{:<28} | {:<16} | {:<28} | {:<12} | {:<6}",
                        label,
                        truncate(p.commune.as_deref().unwrap_or("-"), 16),
                        truncate(p.address.as_deref().unwrap_or("-"), 28),
                        truncate(&p.lot, 12),
                        p.volume.as_deref().unwrap_or("-"),
                    );
                }
            }
            println!("\n{} owners", view.len());
            Ok(())
        }
        Commands::Charges { name } => {
            let charges = db::fetch_charges(&conn, &name)?;
            let view = query::charges_view(&charges, chrono::Local::now().naive_local());

            println!("--- Active ({}) ---", view.active_count);
            for c in &view.active {
                println!("  [{:>7}] {}", c.pages, truncate(&c.title, 80));
            }
            println!("--- Expired ({}) ---", view.expired_count);
            for c in &view.expired {
                println!("  [{:>7}] {}", c.pages, truncate(&c.title, 80));
            }
            Ok(())
        }
        Commands::List => {
            let docs = db::list_documents(&conn)?;
            if docs.is_empty() {
                println!("No documents stored. Run 'process' first.");
                return Ok(());
            }
            println!(
                "{:<32} | {:>5} | {:>5} | {:>6} | {:>7} | {:>9} | {:<19}",
                "Document", "Form.", "Lots", "Owners", "Charges", "Radiated", "Processed"
            );
            println!("{}", "-".repeat(100));
            for d in &docs {
                let s = &d.summary;
                println!(
                    "{:<32} | {:>5} | {:>5} | {:>6} | {:>7} | {:>9} | {:<19}",
                    truncate(&d.name, 32),
                    s.formality_count,
                    s.lot_count,
                    s.owner_count,
                    s.charge_count,
                    s.radiated_charge_count,
                    d.processed_at
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn analyze(dump: &Path, name: &str, settings: &Settings) -> anyhow::Result<DocumentBundle> {
    let pages = pages::load_pages(dump)?;
    Ok(parser::process_document_with(name, &pages, settings.flux_scan_pages))
}

fn document_name(dump: &Path) -> String {
    dump.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| dump.display().to_string())
}

fn find_dumps(dir: &Path, prefix: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut dumps = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let matches = path.extension().is_some_and(|e| e == "json")
            && path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(prefix));
        if matches {
            dumps.push(path);
        }
    }
    dumps.sort();
    Ok(dumps)
}

struct BatchCounts {
    ok: usize,
    failed: usize,
}

/// One pipeline per document across the rayon pool; storing stays on this thread.
fn process_batch(
    conn: &rusqlite::Connection,
    dumps: &[PathBuf],
    settings: &Settings,
    export: bool,
) -> anyhow::Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(dumps.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = BatchCounts { ok: 0, failed: 0 };

    for chunk in dumps.chunks(32) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|dump| (dump, analyze(dump, &document_name(dump), settings)))
            .collect();

        for (dump, result) in results {
            let stored = result.and_then(|bundle| {
                db::save_bundle(conn, &bundle)?;
                if export {
                    query::write_bundle_json(&settings.output_dir, &bundle)?;
                }
                Ok(())
            });
            match stored {
                Ok(()) => counts.ok += 1,
                Err(e) => {
                    warn!(dump = %dump.display(), error = %e, "skipping document");
                    counts.failed += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn print_summary(name: &str, s: &Summary) {
    println!("{}", name);
    println!("Formalities:      {}", s.formality_count);
    println!("Tables:           {} ({} flux)", s.table_count, s.flux_table_count);
    println!("Lots:             {}", s.lot_count);
    println!("Owners:           {}", s.owner_count);
    println!(
        "Charges:          {} ({} active, {} radiated)",
        s.charge_count, s.active_charge_count, s.radiated_charge_count
    );
}

/// Cut `s` to at most `width` characters, ending in `…` when shortened, so table
/// columns keep their width.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// `4.2s` under a minute, `h:mm:ss` above (`0:03:07`, `1:00:00`).
fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        return format!("{:.1}s", d.as_secs_f64());
    }
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
