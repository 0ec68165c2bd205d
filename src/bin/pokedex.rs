use std::process::ExitCode;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pokedex_finder::app::App;
use pokedex_finder::cache::CatalogCache;
use pokedex_finder::catalog::CatalogHttpClient;
use pokedex_finder::classifier::{Classifier, GeminiClassifier, ImagePayload};
use pokedex_finder::config::{ConfigLoader, ResolvedConfig};
use pokedex_finder::domain::GenerationId;
use pokedex_finder::error::DexError;
use pokedex_finder::output::{JsonOutput, OutputMode, TextOutput};
use pokedex_finder::query::QueryRequest;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Find Pokémon by name, type, generation or photo")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search the catalog by name substring, type and generation")]
    Search(SearchArgs),
    #[command(about = "List the type vocabulary")]
    Types,
    #[command(about = "List generations")]
    Generations,
    #[command(about = "Show the cleaned-up description of an entry")]
    Describe(NameArgs),
    #[command(about = "List the regions an entry is native to")]
    Regions(NameArgs),
    #[command(about = "Identify the Pokémon in a photo")]
    Identify(IdentifyArgs),
}

#[derive(Args)]
struct SearchArgs {
    name: Option<String>,

    #[arg(long = "type")]
    type_filter: Option<String>,

    #[arg(long)]
    generation: Option<GenerationId>,
}

#[derive(Args)]
struct NameArgs {
    name: String,
}

#[derive(Args)]
struct IdentifyArgs {
    image: Utf8PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        if let Some(dex) = report.downcast_ref::<DexError>() {
            return ExitCode::from(map_exit_code(dex));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DexError) -> u8 {
    match error {
        DexError::NoMatches(_)
        | DexError::InvalidGeneration(_)
        | DexError::InvalidImage(_)
        | DexError::MissingApiKey(_) => 2,
        DexError::RemoteFetchFailed { .. }
        | DexError::CatalogLoadFailed { .. }
        | DexError::GenerationLoadFailed { .. }
        | DexError::ClassificationFailed(_) => 3,
        _ => 1,
    }
}

async fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = CatalogHttpClient::new(&config.catalog.base_url, config.catalog.timeout)?;
    let cache = CatalogCache::with_concurrency(client, config.catalog.fetch_concurrency);

    match cli.command {
        Commands::Identify(args) => {
            let classifier = GeminiClassifier::new(
                &config.classifier.endpoint,
                &config.classifier.model,
                config.classifier.require_api_key()?,
                config.catalog.timeout,
            )?;
            let app = App::with_cache(cache, classifier);
            run_identify(args, &app, output_mode).await
        }
        command => {
            let app = App::with_cache(cache, NopClassifier);
            run_catalog_command(command, &app, &config, output_mode).await
        }
    }
}

async fn run_catalog_command<K: Classifier>(
    command: Commands,
    app: &App<CatalogHttpClient, K>,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    tracing::debug!(source = ?config.source, "config.resolved");
    match command {
        Commands::Search(args) => run_search(args, app, output_mode).await,
        Commands::Types => {
            let types = app.types().await?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&*types).into_diagnostic(),
                OutputMode::Text => {
                    TextOutput::print_types(&types);
                    Ok(())
                }
            }
        }
        Commands::Generations => {
            let generations = app.generations().await?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&generations).into_diagnostic(),
                OutputMode::Text => {
                    TextOutput::print_generations(&generations);
                    Ok(())
                }
            }
        }
        Commands::Describe(args) => {
            let description = app.describe(&args.name).await?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&description).into_diagnostic(),
                OutputMode::Text => {
                    println!("{description}");
                    Ok(())
                }
            }
        }
        Commands::Regions(args) => {
            let map = app.region_map().await?;
            let regions = map.regions_for(&args.name);
            match output_mode {
                OutputMode::Json => JsonOutput::print(&regions).into_diagnostic(),
                OutputMode::Text => {
                    if regions.is_empty() {
                        println!("{} is not listed in any regional directory", args.name);
                    }
                    for region in regions {
                        println!("{region}");
                    }
                    Ok(())
                }
            }
        }
        Commands::Identify(_) => Err(miette::Report::msg(
            "identify needs a configured classifier",
        )),
    }
}

async fn run_search<K: Classifier>(
    args: SearchArgs,
    app: &App<CatalogHttpClient, K>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let request = QueryRequest {
        name: args.name.unwrap_or_default(),
        type_filter: args.type_filter,
        generation: args.generation,
    };
    if request.is_blank() {
        println!("Search for a Pokémon by name, or filter by --type / --generation.");
        return Ok(());
    }

    // Generation filtering refuses to run against an unloaded catalog, so the
    // CLI loads it up front.
    app.ensure_loaded().await?;
    let resolution = app.resolve(&request).await?;

    if resolution.is_no_results(&request) {
        return Err(DexError::NoMatches(request.to_string()).into());
    }

    match resolution.promoted.clone() {
        Some(entry) => {
            let card = app.card(entry).await?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&card).into_diagnostic(),
                OutputMode::Text => {
                    TextOutput::print_card(&card);
                    Ok(())
                }
            }
        }
        None => match output_mode {
            OutputMode::Json => JsonOutput::print(&resolution).into_diagnostic(),
            OutputMode::Text => {
                TextOutput::print_matches(&resolution);
                Ok(())
            }
        },
    }
}

async fn run_identify<K: Classifier>(
    args: IdentifyArgs,
    app: &App<CatalogHttpClient, K>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let image = ImagePayload::from_path(&args.image)?;
    let identification = app.load_and_identify(&image).await?;
    match output_mode {
        OutputMode::Json => JsonOutput::print(&identification).into_diagnostic(),
        OutputMode::Text => {
            TextOutput::print_identification(&identification);
            if let Some(entry) = identification.entry {
                let card = app.card(entry).await?;
                TextOutput::print_card(&card);
            }
            Ok(())
        }
    }
}

struct NopClassifier;

#[async_trait]
impl Classifier for NopClassifier {
    async fn classify(&self, _image: &ImagePayload) -> Result<String, DexError> {
        Err(DexError::ClassificationFailed(
            "classifier not configured".to_string(),
        ))
    }
}
