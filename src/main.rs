use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use tracklist_match::catalog::load_catalog;
use tracklist_match::models::{ImportRequest, ImportStats, Track, Tracklist};
use tracklist_match::orchestrator::ImportOrchestrator;
use tracklist_match::parse::ParserOptions;
use tracklist_match::progress::{create_progress_bar, format_duration, init_tracing, log_progress, set_log_only};
use tracklist_match::ranking::MatchOptions;
use tracklist_match::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "tracklist-match")]
#[command(about = "Parse DJ tracklists and match entries against a track catalog")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Hide progress bars (tail-friendly output)
    #[arg(long, global = true)]
    log_only: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import raw tracklist text files and predict a track for every entry
    Import {
        /// Raw tracklist files, one set per file
        #[arg(required = true)]
        tracklists: Vec<PathBuf>,

        /// Catalog: JSON array of tracks or SQLite database
        #[arg(long)]
        catalog: PathBuf,

        /// Output JSON (array of tracklists)
        #[arg(long)]
        output: PathBuf,

        /// Set name (single tracklist only; defaults to the file stem)
        #[arg(long)]
        set_name: Option<String>,

        /// DJ / performer of the set
        #[arg(long)]
        artist: Option<String>,

        /// Entries are written "Title - Artist"
        #[arg(long)]
        title_first: bool,

        #[arg(long, default_value = "5")]
        top_n: usize,

        #[arg(long, default_value = "0")]
        workers: usize,

        /// Write import stats as JSON to this file
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Re-score imported tracklists against a (possibly updated) catalog
    Refresh {
        /// JSON written by `import`
        tracklists: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        title_first: bool,
    },

    /// Confirm the track for one entry (sticky across refreshes)
    Confirm {
        /// JSON written by `import`
        tracklists: PathBuf,

        /// Set name, required when the file holds more than one tracklist
        #[arg(long)]
        set: Option<String>,

        /// Entry order index
        #[arg(long)]
        entry: usize,

        /// Catalog track id
        #[arg(long)]
        track: i64,

        #[arg(long)]
        output: PathBuf,
    },

    /// Rank the catalog for a single free-form entry
    Search {
        entry: String,

        #[arg(long)]
        catalog: PathBuf,

        #[arg(long, default_value = "5")]
        top_n: usize,

        #[arg(long)]
        title_first: bool,

        /// Print the feature breakdown of each candidate
        #[arg(long)]
        explain: bool,
    },
}

fn parser_options(title_first: bool) -> ParserOptions {
    if title_first {
        ParserOptions::title_first()
    } else {
        ParserOptions::default()
    }
}

fn read_tracklists(path: &Path) -> Result<Vec<Tracklist>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracklists {:?}", path))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{:?} is not a tracklist JSON array", path))
}

fn write_tracklists(path: &Path, tracklists: &[Tracklist]) -> Result<()> {
    let json = serde_json::to_string_pretty(tracklists)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write output {:?}", path))?;
    info!(path = %path.display(), tracklists = tracklists.len(), "wrote output");
    Ok(())
}

fn import_file(
    orchestrator: &ImportOrchestrator,
    path: &Path,
    set_name: Option<&str>,
    artist: Option<&str>,
    catalog: &[Track],
) -> Result<(Tracklist, ImportStats)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracklist {:?}", path))?;
    let set_name = match set_name {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let request = ImportRequest {
        set_name,
        tracklist_string: text,
        artist: artist.map(str::to_string),
        ..Default::default()
    };
    Ok(orchestrator.import(request, catalog))
}

#[allow(clippy::too_many_arguments)]
fn run_import(
    tracklists: Vec<PathBuf>,
    catalog_path: PathBuf,
    output: PathBuf,
    set_name: Option<String>,
    artist: Option<String>,
    title_first: bool,
    top_n: usize,
    stats_path: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();

    let mut sources: Vec<&Path> = tracklists.iter().map(PathBuf::as_path).collect();
    sources.push(&catalog_path);
    validate_output_path(&output, &sources)?;
    if set_name.is_some() && tracklists.len() > 1 {
        bail!("--set-name only applies to a single tracklist");
    }

    let catalog = load_catalog(&catalog_path)?;
    let orchestrator = ImportOrchestrator::new(
        parser_options(title_first),
        MatchOptions {
            top_n,
            ..Default::default()
        },
    );

    let total = tracklists.len() as u64;
    let pb = create_progress_bar(total, "Importing tracklists");
    let done = AtomicU64::new(0);

    let results: Vec<(Tracklist, ImportStats)> = tracklists
        .par_iter()
        .map(|path| {
            let result = import_file(&orchestrator, path, set_name.as_deref(), artist.as_deref(), &catalog);
            pb.inc(1);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            log_progress("import", current, total, 10);
            result
        })
        .collect::<Result<_>>()?;
    pb.finish_with_message(format!("Imported {} tracklists", results.len()));

    let mut stats = ImportStats::default();
    let mut imported = Vec::with_capacity(results.len());
    for (tracklist, tracklist_stats) in results {
        stats.merge(&tracklist_stats);
        imported.push(tracklist);
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    write_tracklists(&output, &imported)?;

    stats.log_phase("import");
    if let Some(path) = stats_path {
        stats
            .write_to_file(&path)
            .with_context(|| format!("Failed to write stats {:?}", path))?;
    }

    info!(
        entries = stats.entries,
        predicted = stats.predicted,
        match_rate = stats.match_rate(),
        elapsed = %format_duration(start.elapsed()),
        "import complete"
    );
    Ok(())
}

fn run_refresh(tracklists_path: PathBuf, catalog_path: PathBuf, output: PathBuf, title_first: bool) -> Result<()> {
    validate_output_path(&output, &[&tracklists_path, &catalog_path])?;

    let mut tracklists = read_tracklists(&tracklists_path)?;
    let catalog = load_catalog(&catalog_path)?;
    let orchestrator = ImportOrchestrator::new(parser_options(title_first), MatchOptions::default());

    let pb = create_progress_bar(tracklists.len() as u64, "Refreshing tracklists");
    let mut fell_back = 0;
    for tracklist in &mut tracklists {
        if orchestrator.refresh(tracklist, &catalog).fell_back {
            fell_back += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Refreshed {} tracklists", tracklists.len()));
    let confirmed: usize = tracklists.iter().map(Tracklist::confirmed_count).sum();
    info!(tracklists = tracklists.len(), confirmed, "refresh complete");
    if fell_back > 0 {
        eprintln!("{} tracklist(s) no longer re-parse to their stored entries; stored fields were re-scored", fell_back);
    }

    write_tracklists(&output, &tracklists)
}

fn run_confirm(
    tracklists_path: PathBuf,
    set: Option<String>,
    entry: usize,
    track: i64,
    output: PathBuf,
) -> Result<()> {
    validate_output_path(&output, &[&tracklists_path])?;

    let mut tracklists = read_tracklists(&tracklists_path)?;
    let tracklist = match set {
        Some(name) => tracklists
            .iter_mut()
            .find(|t| t.set_name == name)
            .with_context(|| format!("No tracklist named '{}'", name))?,
        None if tracklists.len() == 1 => &mut tracklists[0],
        None => bail!("File holds {} tracklists, pass --set", tracklists.len()),
    };

    if !tracklist.confirm_entry(entry, track) {
        bail!("Tracklist '{}' has no entry {}", tracklist.set_name, entry);
    }
    info!(
        set_name = %tracklist.set_name,
        entry,
        track,
        confirmed = tracklist.confirmed_count(),
        "confirmed entry"
    );

    write_tracklists(&output, &tracklists)
}

fn run_search(entry: String, catalog_path: PathBuf, top_n: usize, title_first: bool, explain: bool) -> Result<()> {
    let catalog = load_catalog(&catalog_path)?;
    let orchestrator = ImportOrchestrator::new(
        parser_options(title_first),
        MatchOptions {
            top_n,
            ..Default::default()
        },
    );

    let (parsed, ranked) = orchestrator.search_entry(&entry, &catalog);
    println!("Entry: {}", parsed.prefix_cleaned_entry);
    println!(
        "  artist={:?} title={:?} version={:?} remixer={:?} vip={}",
        parsed.artist, parsed.short_title, parsed.version, parsed.version_artist, parsed.is_vip
    );
    if parsed.is_unidentified {
        println!("  (unidentified: would be dropped on import)");
    }

    if ranked.is_empty() {
        println!("No candidates (empty catalog)");
        return Ok(());
    }

    for (i, candidate) in ranked.iter().enumerate() {
        println!(
            "{:>2}. [{}] {}  {:.4}",
            i + 1,
            candidate.track_id(),
            candidate.track.display_string(),
            candidate.confidence
        );
        if explain {
            for (name, value) in candidate.features.named() {
                println!("      {:<18} {:>8.3}", name, value);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    set_log_only(args.log_only);

    match args.command {
        Command::Import {
            tracklists,
            catalog,
            output,
            set_name,
            artist,
            title_first,
            top_n,
            workers,
            stats,
        } => {
            if workers > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build_global()
                    .context("Failed to set thread pool size")?;
            }
            run_import(tracklists, catalog, output, set_name, artist, title_first, top_n, stats)
        }
        Command::Refresh {
            tracklists,
            catalog,
            output,
            title_first,
        } => run_refresh(tracklists, catalog, output, title_first),
        Command::Confirm {
            tracklists,
            set,
            entry,
            track,
            output,
        } => run_confirm(tracklists, set, entry, track, output),
        Command::Search {
            entry,
            catalog,
            top_n,
            title_first,
            explain,
        } => run_search(entry, catalog, top_n, title_first, explain),
    }
}
