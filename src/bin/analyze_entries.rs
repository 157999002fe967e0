//! Show how a raw tracklist is cleaned and parsed, line by line.
//! Usage: cargo run --release --bin analyze-entries -- <tracklist.txt> [--title-first]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tracklist_match::catalog::load_catalog;
use tracklist_match::parse::{parse_entry, ParserOptions};
use tracklist_match::progress::init_tracing;
use tracklist_match::ranking::rank_candidates;
use tracklist_match::segment::segment_entries;

#[derive(Parser)]
#[command(name = "analyze-entries")]
#[command(about = "Print cleaning and parsing intermediates for a raw tracklist")]
struct Args {
    tracklist: PathBuf,

    #[arg(long)]
    title_first: bool,

    /// Also print the best catalog match and its features
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.tracklist)
        .with_context(|| format!("Failed to read {:?}", args.tracklist))?;
    let options = if args.title_first {
        ParserOptions::title_first()
    } else {
        ParserOptions::default()
    };
    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => Vec::new(),
    };

    let lines = segment_entries(&raw);
    let mut kept = 0;
    let mut unidentified = Vec::new();
    let mut no_separator = 0;

    println!("{:=<70}", "");
    for (i, line) in lines.iter().enumerate() {
        let entry = parse_entry(line, &options);

        println!("[{}] {}", i, entry.full_tracklist_entry);
        if entry.unicode_cleaned_entry != entry.full_tracklist_entry {
            println!("    unicode_cleaned: {}", entry.unicode_cleaned_entry);
        }
        println!("    prefix_cleaned:  {}", entry.prefix_cleaned_entry);
        println!("    artist:          {:?}", entry.artist);
        println!("    short_title:     {:?}", entry.short_title);
        if !entry.version.is_empty() {
            println!("    version:         {:?} (remixer {:?})", entry.version, entry.version_artist);
        }
        if entry.is_vip {
            println!("    vip");
        }

        if entry.artist.is_empty() {
            no_separator += 1;
        }
        if entry.is_unidentified {
            println!("    -> UNIDENTIFIED (dropped)");
            unidentified.push(line.clone());
            continue;
        }
        kept += 1;

        if let Some(best) = rank_candidates(&entry, &catalog, 1, 0.0).first() {
            println!(
                "    best match:      [{}] {} ({:.4})",
                best.track_id(),
                best.track.display_string(),
                best.confidence
            );
            let features: Vec<String> = best
                .features
                .named()
                .iter()
                .map(|(name, value)| format!("{}={:.2}", name, value))
                .collect();
            println!("                     {}", features.join(" "));
        }
    }

    println!("{:=<70}", "");
    println!("Segmented lines:   {}", lines.len());
    println!("Kept entries:      {}", kept);
    println!("Unidentified:      {}", unidentified.len());
    println!("No separator:      {}", no_separator);
    for line in &unidentified {
        println!("  {}", line);
    }

    Ok(())
}
