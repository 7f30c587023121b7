use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use neta_client::client::{
    DEFAULT_DATASET_SEARCH_LIMIT, DEFAULT_GENE_SEARCH_LIMIT, DEFAULT_PAGE_SIZE, NetaClient,
};
use neta_client::config::ConfigLoader;
use neta_client::domain::{
    ClusteringMethod, DatasetFilter, DifferentialExpressionRequest, EnrichmentDatabase,
    EnrichmentRequest, HeatmapRequest, PcaRequest,
};
use neta_client::error::NetaError;
use neta_client::output::{JsonOutput, OutputMode, TextOutput};
use neta_client::transport::HttpTransport;

#[derive(Parser)]
#[command(name = "neta")]
#[command(about = "Query the NETA expression atlas, with offline snapshot fallback")]
#[command(version, author)]
struct Cli {
    /// Path to a neta.json configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check backend health")]
    Health,
    #[command(about = "List datasets, one page at a time")]
    Datasets(PageArgs),
    #[command(about = "Show a single dataset")]
    Dataset { id: u64 },
    #[command(about = "Search datasets by title or GEO accession")]
    Search(SearchArgs),
    #[command(about = "Filter datasets by tissue, tumor or assay type")]
    Filter(FilterArgs),
    #[command(about = "Show dataset statistics")]
    Stats {
        /// Use the live overview route, which has no snapshot fallback.
        #[arg(long)]
        overview: bool,
    },
    #[command(about = "Search genes by symbol or name")]
    Genes(GeneArgs),
    #[command(about = "Run principal component analysis")]
    Pca(PcaArgs),
    #[command(about = "Run differential expression and summarize the volcano plot")]
    Volcano(VolcanoArgs),
    #[command(about = "Render an expression heatmap")]
    Heatmap(HeatmapArgs),
    #[command(about = "Run GO or KEGG enrichment")]
    Enrichment(EnrichmentArgs),
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    per_page: usize,
}

#[derive(Args)]
struct SearchArgs {
    query: String,

    #[arg(long, default_value_t = DEFAULT_DATASET_SEARCH_LIMIT)]
    limit: usize,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    tissue: Option<String>,

    #[arg(long)]
    tumor: Option<String>,

    #[arg(long)]
    assay: Option<String>,
}

#[derive(Args)]
struct GeneArgs {
    #[arg(default_value = "")]
    query: String,

    #[arg(long, default_value_t = DEFAULT_GENE_SEARCH_LIMIT)]
    limit: usize,
}

#[derive(Args)]
struct PcaArgs {
    #[arg(long)]
    dataset: u64,

    #[arg(long, default_value_t = 2)]
    components: u8,

    #[arg(long, default_value = "tumor_type")]
    color_by: String,
}

#[derive(Args)]
struct VolcanoArgs {
    #[arg(long)]
    dataset: u64,

    #[arg(long)]
    group1: String,

    #[arg(long)]
    group2: String,

    #[arg(long, default_value_t = 0.05)]
    pvalue: f64,

    #[arg(long, default_value_t = 1.0)]
    logfc: f64,
}

#[derive(Args)]
struct HeatmapArgs {
    #[arg(long)]
    dataset: u64,

    /// Comma separated gene symbols; empty lets the backend pick the most variable genes.
    #[arg(long, value_delimiter = ',')]
    genes: Vec<String>,

    #[arg(long, default_value_t = 50)]
    num_genes: u32,

    #[arg(long, value_enum, default_value_t = ClusteringMethod::Hierarchical)]
    clustering: ClusteringMethod,
}

#[derive(Args)]
struct EnrichmentArgs {
    #[arg(long)]
    dataset: u64,

    #[arg(long, value_delimiter = ',', required = true)]
    genes: Vec<String>,

    #[arg(long, value_enum, default_value_t = EnrichmentDatabase::Go)]
    database: EnrichmentDatabase,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(neta) = report.downcast_ref::<NetaError>() {
            return ExitCode::from(map_exit_code(neta));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &NetaError) -> u8 {
    match error {
        NetaError::DatasetNotFound(_) | NetaError::InvalidRequest(_) => 2,
        NetaError::HttpStatus { status: 404, .. } => 2,
        NetaError::Network(_) | NetaError::HttpStatus { .. } | NetaError::AnalysisFailed(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
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
    tracing::debug!(
        api = config.api_base_url(),
        fallback = config.fallback_base_url(),
        "resolved configuration"
    );
    let client = NetaClient::from_config(config)?;

    run_command(cli.command, &client, output_mode)
}

fn run_command(
    command: Commands,
    client: &NetaClient<HttpTransport>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        Commands::Health => {
            let health = client.health()?;
            emit(output_mode, &health, || TextOutput::render_health(&health))
        }
        Commands::Datasets(args) => {
            let page = client.list_datasets(args.page, args.per_page)?;
            emit(output_mode, &page, || TextOutput::render_dataset_page(&page))
        }
        Commands::Dataset { id } => {
            let dataset = client.dataset(id)?;
            emit(output_mode, &dataset, || TextOutput::render_dataset(&dataset))
        }
        Commands::Search(args) => {
            let found = client.search_datasets(&args.query, args.limit)?;
            emit(output_mode, &found, || {
                TextOutput::render_datasets(&found.body, found.provenance)
            })
        }
        Commands::Filter(args) => {
            let filter = DatasetFilter {
                tissue_type: args.tissue,
                tumor_type: args.tumor,
                assay_type: args.assay,
            };
            let found = client.filter_datasets(&filter)?;
            emit(output_mode, &found, || {
                TextOutput::render_datasets(&found.body, found.provenance)
            })
        }
        Commands::Stats { overview: true } => {
            let stats = client.statistics_overview()?;
            emit(output_mode, &stats, || {
                TextOutput::render_statistics(&stats, None)
            })
        }
        Commands::Stats { overview: false } => {
            let stats = client.dataset_statistics()?;
            emit(output_mode, &stats, || {
                TextOutput::render_statistics(&stats.body, Some(stats.provenance))
            })
        }
        Commands::Genes(args) => {
            let genes = client.search_genes(&args.query, args.limit)?;
            emit(output_mode, &genes, || TextOutput::render_genes(&genes))
        }
        Commands::Pca(args) => {
            let view = client.run_pca(&PcaRequest {
                dataset_id: args.dataset,
                num_components: args.components,
                color_by: args.color_by,
            })?;
            emit(output_mode, &view, || TextOutput::render_pca(&view))
        }
        Commands::Volcano(args) => {
            let view = client.run_differential_expression(&DifferentialExpressionRequest {
                dataset_id: args.dataset,
                group1: args.group1,
                group2: args.group2,
                pvalue_cutoff: args.pvalue,
                log2_fc_cutoff: args.logfc,
            })?;
            emit(output_mode, &view, || TextOutput::render_volcano(&view))
        }
        Commands::Heatmap(args) => {
            let view = client.run_heatmap(&HeatmapRequest {
                dataset_id: args.dataset,
                gene_list: args.genes,
                num_genes: args.num_genes,
                clustering_method: args.clustering,
            })?;
            emit(output_mode, &view, || TextOutput::render_heatmap(&view))
        }
        Commands::Enrichment(args) => {
            let results = client.run_enrichment(&EnrichmentRequest {
                dataset_id: args.dataset,
                gene_list: args.genes,
                database: args.database,
            })?;
            // Enrichment results have no table layout; both modes print JSON.
            JsonOutput::print(&results).into_diagnostic()
        }
    }
}

fn emit<T, F>(output_mode: OutputMode, value: &T, render: F) -> miette::Result<()>
where
    T: serde::Serialize,
    F: FnOnce() -> String,
{
    match output_mode {
        OutputMode::Json => JsonOutput::print(value).into_diagnostic(),
        OutputMode::Text => TextOutput::print(&render()).into_diagnostic(),
    }
}
