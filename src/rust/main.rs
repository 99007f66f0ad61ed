use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use model_composer::{ComposedModel, ComposerConfig, ModelManager};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose an updatable classifier pipeline around a linked embedding model
    Compose {
        /// Embedding model descriptor to read the interface from
        #[arg(long)]
        embedding: Option<PathBuf>,
        /// Where to write the composed descriptor
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// File name the host runtime looks up for the embedding model
        #[arg(long)]
        link_name: Option<String>,
        /// Colon-delimited list of locations to search for the embedding model
        #[arg(long)]
        search_path: Option<String>,
        /// Number of neighbors consulted per prediction
        #[arg(short = 'k', long)]
        neighbors: Option<i64>,
        /// Label returned while the example store is empty
        #[arg(long)]
        default_label: Option<String>,
        /// Abort unless the embedding file has this SHA-256 digest
        #[arg(long)]
        expect_sha256: Option<String>,
    },
    /// Print a JSON summary of a composed descriptor
    Inspect {
        path: PathBuf,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<ComposerConfig> {
    match path {
        Some(path) => ComposerConfig::from_file(&path).with_context(|| format!("loading {}", path.display())),
        None => ComposerConfig::load_default().context("loading default configuration"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = load_config(args.config)?;
    let manager = ModelManager::new_default().context("opening models directory")?;

    match args.command {
        Command::Compose {
            embedding,
            output,
            link_name,
            search_path,
            neighbors,
            default_label,
            expect_sha256,
        } => {
            if let Some(embedding) = embedding {
                config.embedding_path = embedding;
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            if link_name.is_some() {
                config.link.file_name = link_name;
            }
            if let Some(search_path) = search_path {
                config.link.search_path = search_path;
            }
            if let Some(neighbors) = neighbors {
                config.classifier.neighbors = neighbors;
            }
            if let Some(default_label) = default_label {
                config.classifier.default_label = default_label;
            }

            let start_time = Instant::now();
            info!("=== Composing {:?} ===", config.output_path);

            let composed = config
                .compose(&manager, expect_sha256.as_deref())
                .with_context(|| format!("composing pipeline from {}", config.embedding_path.display()))?;
            for finding in composed.chain_mismatches() {
                warn!("{}", finding);
            }

            let written = composed
                .save(&manager, &config.output_path)
                .with_context(|| format!("writing {}", config.output_path.display()))?;

            info!("=== Composition complete (took {:.2?}) ===", start_time.elapsed());
            println!("Wrote {}", written.display());
        }
        Command::Inspect { path } => {
            let composed =
                ComposedModel::load(&manager, &path).with_context(|| format!("reading {}", path.display()))?;
            let summary = serde_json::to_string_pretty(&composed.info())?;
            println!("{}", summary);
        }
    }

    Ok(())
}
