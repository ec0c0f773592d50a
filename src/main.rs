use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use patternpeek::catalog::{self, CATALOG, Category, PatternId};
use patternpeek::config::{self, CliOverrides, Config};
use patternpeek::content::{CatalogLoader, DocumentSource, FsLoader, generate_previews};
use patternpeek::loader::ResourceLoader;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PATTERNPEEK_BUILD_GIT_HASH"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "patternpeek",
    version = VERSION,
    about = "Browse the classic design patterns with hover previews"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Content directory (one subdirectory per pattern id)
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Delay before a hovered pattern is prefetched, in milliseconds
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Log output file path (enables logging when specified)
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the pattern catalog
    List {
        /// Only show one category (creational, structural, behavioral)
        #[arg(long)]
        category: Option<Category>,
    },

    /// Write preview.toml for every pattern under a content directory
    Previews {
        /// Content directory (defaults to --content / config)
        dir: Option<PathBuf>,

        /// Number of code lines kept in each preview
        #[arg(long)]
        lines: Option<usize>,
    },

    /// Print the hover preview for one pattern
    Preview {
        /// Pattern id, e.g. `abstract-factory`
        id: PatternId,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        let file = match std::fs::File::create(log_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    } else if cli.command.is_some() {
        env_logger::init();
    }
    // viewer mode + no --log → logger not initialized (no log output)
    info!("patternpeek {VERSION}");

    // Load config file and merge CLI overrides
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let excerpt_lines = match &cli.command {
        Some(Command::Previews { lines, .. }) => *lines,
        _ => None,
    };
    cfg.merge_cli(CliOverrides {
        content_dir: cli.content,
        debounce_ms: cli.debounce_ms,
        excerpt_lines,
    });
    let config = match cfg.resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Command::List { category }) => cmd_list(category),
        Some(Command::Previews { dir, .. }) => cmd_previews(dir, &config),
        Some(Command::Preview { id }) => cmd_preview(&id, &config),
        None => {
            let source = document_source(&config);
            patternpeek::viewer::run(config, source)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Files under the content directory when one is configured, otherwise the
/// built-in catalog text.
fn document_source(config: &Config) -> Arc<dyn DocumentSource> {
    match &config.content_dir {
        Some(dir) => {
            info!("using content directory {}", dir.display());
            Arc::new(FsLoader::new(dir))
        }
        None => {
            info!("no content directory, serving catalog text only");
            Arc::new(CatalogLoader)
        }
    }
}

fn cmd_list(category: Option<Category>) -> Result<()> {
    let categories: Vec<Category> = match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };
    for c in categories {
        println!("{c}");
        for e in catalog::by_category(c) {
            println!("  {:<24} {}", e.id, e.name);
        }
    }
    Ok(())
}

fn cmd_previews(dir: Option<PathBuf>, config: &Config) -> Result<()> {
    let root = dir
        .or_else(|| config.content_dir.clone())
        .context("no content directory (pass DIR or --content)")?;
    let start = Instant::now();
    let report = generate_previews(&root, config.excerpt_lines)?;
    info!(
        "cmd_previews: completed in {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    eprintln!(
        "wrote {} of {} preview(s) under {}",
        report.written.len(),
        CATALOG.len(),
        root.display()
    );
    for (id, reason) in &report.skipped {
        eprintln!("  skipped {id}: {reason}");
    }
    Ok(())
}

fn cmd_preview(id: &PatternId, config: &Config) -> Result<()> {
    let source = document_source(config);
    let data = source
        .load_preview(id)
        .with_context(|| format!("no preview for '{id}'"))?;
    let text = toml::to_string(&data).context("failed to encode preview")?;
    print!("{text}");
    Ok(())
}
