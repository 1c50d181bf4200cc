use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use emotion_playlist::catalog::Catalog;
use emotion_playlist::classify::{Classifier, KeywordPolicy};
use emotion_playlist::engine::{Engine, Response, DEFAULT_TOP_N};
use emotion_playlist::models::{BatchStats, EmotionLabel};
use emotion_playlist::progress::{
    create_progress_bar, format_duration, is_log_only, log_progress, set_log_only,
};
use emotion_playlist::tables::Tables;

#[derive(Parser)]
#[command(name = "emotion-playlist")]
#[command(about = "Recommend songs from a catalog based on a free-text mood description")]
struct Args {
    /// Catalog CSV with song, artist, emotion and popularity columns
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Classification policy: first-match or frequency
    #[arg(long, global = true, default_value = "first-match")]
    policy: KeywordPolicy,

    /// Number of songs to return
    #[arg(long, global = true, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Only recommend songs tagged with the exact emotion
    #[arg(long, global = true)]
    no_fallback: bool,

    /// JSON file overriding the keyword and/or similarity tables
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Hide progress bars and log periodic progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    #[arg(long, global = true, default_value = "0")]
    workers: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one mood description and recommend songs
    Ask { text: String },
    /// Answer every line of a file (one mood description per line)
    Batch { queries: PathBuf },
    /// Show catalog statistics and per-emotion pool sizes
    Inspect,
}

const BATCH_LOG_INTERVAL: u64 = 1_000;

#[derive(Serialize)]
struct BatchLine<'a> {
    line: usize,
    query: &'a str,
    #[serde(flatten)]
    response: &'a Response,
}

fn render(query: &str, response: &Response) {
    println!("\nMood: \"{}\"", query);
    match response {
        Response::BlankInput => println!("Please describe how you feel first."),
        Response::Unrecognized => {
            println!("Detected emotion: {}", EmotionLabel::Unknown);
            println!("Could not recognize an emotion. Try a more descriptive sentence.");
        }
        Response::NoMatches { label } => {
            println!("Detected emotion: {}", label);
            println!(
                "No songs available for '{}'. The catalog may have few songs with this emotion.",
                label
            );
        }
        Response::Playlist {
            label,
            entries,
            expanded_with,
        } => {
            println!("Detected emotion: {}", label);
            if !expanded_with.is_empty() {
                let similar: Vec<&str> = expanded_with.iter().map(|l| l.as_str()).collect();
                println!("(also drawing from similar emotions: {})", similar.join(", "));
            }
            println!("{:-<80}", "");
            for (i, e) in entries.iter().enumerate() {
                println!(
                    "{:>2}. {} - {} ({}) popularity={}",
                    i + 1,
                    e.artist,
                    e.song,
                    e.emotion,
                    e.popularity
                );
            }
        }
    }
}

fn run_ask(engine: &Engine, text: &str, json: bool) -> Result<()> {
    let response = engine.respond(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        render(text, &response);
    }
    Ok(())
}

fn run_batch(engine: &Engine, path: &Path, json: bool) -> Result<()> {
    let start = Instant::now();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries file {}", path.display()))?;
    let queries: Vec<&str> = content.lines().collect();
    let total = queries.len() as u64;

    let pb = create_progress_bar(total, "Answering queries");
    let responses: Vec<Response> = queries
        .par_iter()
        .map(|q| {
            let response = engine.respond(q);
            pb.inc(1);
            log_progress("batch", pb.position(), total, BATCH_LOG_INTERVAL);
            response
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = BatchStats {
        queries: queries.len(),
        ..Default::default()
    };
    for response in &responses {
        match response {
            Response::BlankInput => stats.blank += 1,
            Response::Unrecognized => stats.unrecognized += 1,
            Response::NoMatches { .. } => stats.no_matches += 1,
            Response::Playlist { .. } => stats.playlists += 1,
        }
        if let Some(label) = response.label() {
            *stats.per_label.entry(label).or_insert(0) += 1;
        }
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    if json {
        let lines: Vec<BatchLine> = queries
            .iter()
            .copied()
            .zip(&responses)
            .enumerate()
            .map(|(i, (query, response))| BatchLine {
                line: i + 1,
                query,
                response,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for (query, response) in queries.iter().zip(&responses) {
            render(query, response);
        }
    }

    stats.log_phase("batch");
    eprintln!(
        "[batch] {} queries in {} ({:.1}% recognized)",
        stats.queries,
        format_duration(start.elapsed()),
        stats.recognition_rate()
    );
    Ok(())
}

fn run_inspect(engine: &Engine, json: bool) -> Result<()> {
    let catalog = engine.catalog();
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.stats())?);
        return Ok(());
    }

    println!("\n{:=<60}", "");
    println!("Catalog");
    println!("  Songs: {}", catalog.len());
    println!("  Rows skipped: {}", catalog.stats().total_skipped());
    println!("  Policy: {}", engine.classifier().policy_name());
    println!("  Top N: {}", engine.top_n());
    println!(
        "  Fallback: {}",
        if engine.fallback_enabled() { "on" } else { "off" }
    );
    println!("{:-<60}", "");
    for label in EmotionLabel::CATEGORIES {
        println!("  {:<8} {}", label, catalog.pool_size(label));
    }
    println!("{:=<60}", "");

    if is_log_only() {
        catalog.stats().log_phase("catalog");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.top_n == 0 {
        bail!("--top-n must be greater than 0");
    }

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let tables = match &args.tables {
        Some(path) => {
            eprintln!("[tables] loading {}", path.display());
            Tables::load(path)?
        }
        None => Tables::default(),
    };

    let start = Instant::now();
    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    eprintln!(
        "[catalog] {} songs from {} in {}",
        catalog.len(),
        args.catalog.display(),
        format_duration(start.elapsed())
    );
    if catalog.is_empty() {
        eprintln!("[catalog] warning: no usable rows, every query will come back empty");
    }

    let similarity = if args.no_fallback {
        None
    } else {
        Some(tables.similarity)
    };
    let engine = Engine::new(
        Arc::new(catalog),
        Classifier::keyword(args.policy, tables.keywords),
        similarity,
        args.top_n,
    );

    match &args.command {
        Command::Ask { text } => run_ask(&engine, text, args.json),
        Command::Batch { queries } => run_batch(&engine, queries, args.json),
        Command::Inspect => run_inspect(&engine, args.json),
    }
}
