use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use post_inspector::analyzer::normalize;
use post_inspector::settings::Settings;
use post_inspector::{db, HttpClassifier, Post, PostAnalyzer, PostProblem};

#[derive(Parser)]
#[command(name = "post_inspector", about = "Find forum posts with code pasted without code formatting")]
struct Cli {
    /// Classifier endpoint (overrides INSPECTOR_CLASSIFIER__URL)
    #[arg(long, global = true)]
    classifier_url: Option<String>,
    /// SQLite database path (overrides INSPECTOR_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one post body (HTML file, or - for stdin)
    Check { input: String },
    /// Print the cleaned paragraphs that would be sent to the classifier
    Paragraphs { input: String },
    /// Analyze a JSON array of posts (file, or - for stdin)
    Analyze {
        input: String,
        /// Store results and skip posts already analyzed
        #[arg(long)]
        save: bool,
        /// Print one JSON object per post instead of text
        #[arg(long)]
        json: bool,
        /// Max posts to analyze (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// List stored problems, most recent first
    Flagged {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show analysis statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(url) = cli.classifier_url {
        settings.classifier.url = url;
    }
    if let Some(path) = cli.db {
        settings.db_path = path;
    }

    let result = match cli.command {
        Commands::Check { input } => {
            let markup = read_input(&input)?;
            let classifier = HttpClassifier::new(&settings.classifier)?;
            let analyzer = PostAnalyzer::new(classifier);
            let problems = analyzer
                .analyze(&Post::from_text(markup))
                .context("Analysis failed")?;
            if problems.is_empty() {
                println!("No problems found.");
            }
            for p in &problems {
                println!("{}", p);
            }
            Ok(())
        }
        Commands::Paragraphs { input } => {
            let markup = read_input(&input)?;
            let mut count = 0;
            for (i, para) in normalize::paragraphs(&markup).enumerate() {
                println!("{:>3} | {}", i + 1, para);
                count += 1;
            }
            if count == 0 {
                println!("No paragraphs.");
            }
            Ok(())
        }
        Commands::Analyze { input, save, json, limit } => {
            let raw = read_input(&input)?;
            let mut posts: Vec<Post> = serde_json::from_str(&raw).context("Input is not a JSON array of posts")?;

            let conn = if save {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                let done = db::fetch_analyzed_ids(&conn)?;
                let before = posts.len();
                posts.retain(|p| match db::post_key(p) {
                    Some(id) => !done.contains(&id),
                    None => {
                        warn!("Skipping post with unusable id {} (cannot be saved)", p.id);
                        false
                    }
                });
                if posts.len() < before {
                    info!("Skipping {} posts already analyzed or without a usable id", before - posts.len());
                }
                Some(conn)
            } else {
                None
            };
            if let Some(n) = limit {
                posts.truncate(n);
            }
            if posts.is_empty() {
                println!("No posts to analyze.");
                return Ok(());
            }

            info!("Analyzing {} posts with {}", posts.len(), settings.classifier.url);
            let outcomes = analyze_posts(&settings, posts);
            let counts = report(&outcomes, json)?;

            if let Some(conn) = conn {
                let rows: Vec<db::AnalysisRow> = outcomes
                    .into_iter()
                    .filter_map(|o| db::AnalysisRow::new(o.post, o.problems.ok()?))
                    .collect();
                let saved = db::save_results(&conn, &rows)?;
                info!("Saved {} results to {}", saved, settings.db_path);
            }
            counts.print();
            Ok(())
        }
        Commands::Flagged { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_flagged(&conn, limit)?;
            if rows.is_empty() {
                println!("No flagged posts.");
                return Ok(());
            }
            println!("{:>10} | {:<20} | {:>6} | {:<19} | {}", "Post", "Problem", "Prob", "Analyzed", "URL");
            println!("{}", "-".repeat(90));
            for r in &rows {
                println!(
                    "{:>10} | {:<20} | {:>6.4} | {:<19} | {}",
                    r.post_id, r.kind, r.probability, r.analyzed_at, r.url
                );
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Analyzed: {}", s.analyzed);
            println!("Flagged:  {}", s.flagged);
            println!("Clean:    {}", s.clean);
            println!("Problems: {}", s.problems);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

struct Outcome {
    post: Post,
    problems: post_inspector::Result<Vec<PostProblem>>,
    analyzed_at: DateTime<Utc>,
}

/// Analyze posts in parallel. Each rayon worker builds its own classifier
/// handle, so none is shared between threads.
fn analyze_posts(settings: &Settings, posts: Vec<Post>) -> Vec<Outcome> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(posts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcomes: Vec<Outcome> = posts
        .into_par_iter()
        .map_init(
            || HttpClassifier::new(&settings.classifier).map(PostAnalyzer::new),
            |analyzer, post| {
                let problems = match analyzer {
                    Ok(a) => a.analyze(&post),
                    Err(e) => Err(e.clone().into()),
                };
                pb.inc(1);
                Outcome {
                    post,
                    problems,
                    analyzed_at: Utc::now(),
                }
            },
        )
        .collect();

    pb.finish_and_clear();
    outcomes
}

#[derive(Serialize)]
struct PostReport<'a> {
    post_id: u64,
    url: Option<&'a str>,
    analyzed_at: DateTime<Utc>,
    problems: &'a [PostProblem],
}

struct AnalyzeCounts {
    total: usize,
    flagged: usize,
    errors: usize,
}

impl AnalyzeCounts {
    fn print(&self) {
        println!(
            "Analyzed {} posts: {} flagged, {} clean, {} errors.",
            self.total,
            self.flagged,
            self.total - self.flagged - self.errors,
            self.errors,
        );
    }
}

fn report(outcomes: &[Outcome], json: bool) -> Result<AnalyzeCounts> {
    let mut counts = AnalyzeCounts {
        total: outcomes.len(),
        flagged: 0,
        errors: 0,
    };

    for o in outcomes {
        let problems = match &o.problems {
            Ok(p) => p,
            Err(e) => {
                warn!("Analysis failed for post {}: {}", o.post.id, e);
                counts.errors += 1;
                continue;
            }
        };
        if !problems.is_empty() {
            counts.flagged += 1;
        }

        if json {
            let line = serde_json::to_string(&PostReport {
                post_id: o.post.id,
                url: o.post.url.as_deref(),
                analyzed_at: o.analyzed_at,
                problems,
            })?;
            println!("{}", line);
        } else {
            for p in problems {
                println!("post {} {}: {}", o.post.id, o.post.url.as_deref().unwrap_or("-"), p);
            }
        }
    }

    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
