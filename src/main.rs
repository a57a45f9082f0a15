use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use cbir_core::{
    evaluation::evaluate_store,
    store::{FsRepository, VectorRepository},
    FeatureStore, Metric, Query, SearchConfig, SearchRequest, Searcher,
};

#[derive(Parser, Debug)]
#[command(name = "cbir", about = "Image retrieval over precomputed feature indexes")]
struct Cli {
    /// JSON config file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Index root, overriding the config
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the database against one query image and print JSON.
    Search {
        /// Feature-extraction model (InceptionV3, MobileNet, ResNet50, VGG16, Xception)
        #[arg(long)]
        model: String,
        /// Euclidean, Cosine, Bhattacharyya, Correlation or Intersection
        #[arg(long, default_value = "Euclidean")]
        metric: String,
        /// Number of neighbors to return
        #[arg(long, default_value_t = 20)]
        k: usize,
        /// Query image file name; must be part of the database
        #[arg(long)]
        query: String,
    },

    /// List the models present in the index with their record counts.
    Models,

    /// Query with every image of a model and print mAP and the mean curve.
    Evaluate {
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "Euclidean")]
        metric: String,
    },
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise.
fn init_subscriber() {
    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_json_file(path)?,
        None => SearchConfig::default(),
    };
    if let Some(index) = &cli.index {
        config.index_root = index.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let repo = FsRepository::new(&config.index_root);

    match cli.command {
        Commands::Search {
            model,
            metric,
            k,
            query,
        } => {
            let searcher = Searcher::new(repo, config)?;
            let request = SearchRequest {
                model,
                metric,
                k,
                query: Query::Image(query),
            };
            let response = searcher.search(&request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Models => {
            let models = repo
                .models()
                .with_context(|| format!("listing {}", repo.root().display()))?;
            for model in models {
                let count = repo.list_records(&model)?.len();
                println!("{model}\t{count}");
            }
        }
        Commands::Evaluate { model, metric } => {
            let metric: Metric = metric.parse()?;
            let store = FeatureStore::load_with(&repo, &model, config.keys.clone())?;
            let summary = evaluate_store(&store, metric, config.eval_window, config.class_size)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
