use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use geosearch::{
    build_descriptor, build_descriptors, DescriptorIndex, DescriptorOptions, Mesh, ModelId,
    RankOptions, Ranker, SamplerOptions, SimilarResponse, WeightTable,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Geometric fingerprinting and similarity search for 3D models
#[derive(Parser, Debug)]
#[command(name = "geosearch")]
#[command(about = "Content-based 3D shape retrieval", long_about = None)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the descriptor of one mesh as JSON
    Describe {
        /// Mesh JSON: {"vertices": [[x, y, z], ...], "faces": [[a, b, c], ...]}
        mesh: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build descriptors for many meshes and save them as a library
    Index {
        /// Library file to write
        #[arg(long)]
        out: PathBuf,

        /// Mesh JSON files; each model is named after its file stem
        #[arg(required = true)]
        meshes: Vec<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Rank a library against a query mesh or a stored model
    Search {
        /// Library file written by `index`
        #[arg(long)]
        library: PathBuf,

        /// Query mesh JSON
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        query: Option<PathBuf>,

        /// Id of a model already in the library
        #[arg(long)]
        id: Option<String>,

        /// Minimum overall similarity
        #[arg(long, default_value_t = geosearch_similarity::DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Maximum number of results
        #[arg(long, default_value_t = geosearch_similarity::DEFAULT_LIMIT)]
        limit: usize,

        /// Weight table JSON replacing the default weights
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Score only the N candidates nearest in comparison-vector space
        #[arg(long)]
        prefilter: Option<usize>,

        #[command(flatten)]
        build: BuildArgs,
    },
}

/// Descriptor construction flags
#[derive(Args, Debug)]
struct BuildArgs {
    /// Sampling seed
    #[arg(long, default_value_t = geosearch_core::sampler::DEFAULT_SEED)]
    seed: u64,

    /// Number of D2 point pairs
    #[arg(long, default_value_t = geosearch_core::sampler::DEFAULT_SAMPLE_COUNT)]
    samples: usize,

    /// Number of D2 histogram bins
    #[arg(long, default_value_t = geosearch_core::sampler::DEFAULT_BIN_COUNT)]
    bins: usize,

    /// Center and scale meshes into the unit sphere first
    #[arg(long)]
    normalize: bool,
}

impl BuildArgs {
    fn options(&self) -> DescriptorOptions {
        DescriptorOptions {
            sampler: SamplerOptions {
                sample_count: self.samples,
                bin_count: self.bins,
                seed: self.seed,
                ..Default::default()
            },
            normalize: self.normalize,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Describe { mesh, build } => {
            let mesh = read_mesh(&mesh)?;
            let descriptor = build_descriptor(&mesh, &build.options())?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Command::Index { out, meshes, build } => {
            let mut models = Vec::with_capacity(meshes.len());
            for path in &meshes {
                models.push((model_id(path)?, read_mesh(path)?));
            }

            let index = DescriptorIndex::new();
            for (id, result) in build_descriptors(&models, &build.options()) {
                match result {
                    Ok(descriptor) => {
                        index.upsert(id, descriptor);
                    }
                    Err(e) => warn!(model_id = %id, error = %e, "skipping model"),
                }
            }

            index.save(&out).with_context(|| format!("saving library to {}", out.display()))?;
            info!(models = index.len(), "library written to {}", out.display());
        }
        Command::Search { library, query, id, threshold, limit, weights, prefilter, build } => {
            let index = DescriptorIndex::load(&library)
                .with_context(|| format!("loading library {}", library.display()))?;
            let ranker = match weights {
                Some(path) => Ranker::new(read_json::<WeightTable>(&path)?)
                    .with_context(|| format!("invalid weight table {}", path.display()))?,
                None => Ranker::default(),
            };
            let options = RankOptions { threshold, limit, prefilter };

            let (results, candidates) = match (query, id) {
                (Some(path), _) => {
                    let descriptor = build_descriptor(&read_mesh(&path)?, &build.options())?;
                    (index.rank(&descriptor, &ranker, &options), index.len())
                }
                (None, Some(id)) => {
                    let id = ModelId::parse(&id);
                    if !index.contains(&id) {
                        warn!(model_id = %id, "model not in library");
                    }
                    (index.similar_to(&id, &ranker, &options), index.len().saturating_sub(1))
                }
                (None, None) => bail!("either --query or --id is required"),
            };

            let response = SimilarResponse::new(results, candidates, ranker.weights());
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn read_mesh(path: &Path) -> anyhow::Result<Mesh> {
    read_json(path)
}

fn model_id(path: &Path) -> anyhow::Result<ModelId> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => Ok(ModelId::parse(stem)),
        None => bail!("cannot derive a model id from {}", path.display()),
    }
}
