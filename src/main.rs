use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kube::ResourceExt;
use revision_operator::{
    cache::{ServingCache, SnapshotCache},
    controller::{
        self, by_node_id, by_version, revisions, ApiVersionFilter, KubeRevisionStore,
        KubeSecretSource, PublishPipeline, RevisionFilter,
    },
    crd::{EnvoyApiVersion, EnvoyConfigRevision},
    envoy::{EnvoyGenerator, SerdeDecoder},
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the operator
    Run(RunArgs),
    /// Show version and build information
    Version,
    /// List EnvoyConfigRevisions for a node
    Revisions(RevisionsArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Namespace to watch, all namespaces when unset
    #[arg(long, env = "WATCH_NAMESPACE")]
    namespace: Option<String>,

    /// Envoy API version served by this instance
    #[arg(long, env = "ENVOY_API_VERSION", default_value = "v2")]
    envoy_api: EnvoyApiVersion,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Port of the health and cache inspection API
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    http_port: u16,
}

#[derive(Parser, Debug)]
struct RevisionsArgs {
    /// Namespace holding the revisions
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Envoy node ID
    #[arg(long)]
    node_id: String,

    /// Resolve the single revision with this config version
    #[arg(long)]
    version: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Version => {
            println!("revision-operator v{}", env!("CARGO_PKG_VERSION"));
            println!("Build Date: {}", env!("BUILD_DATE"));
            println!("Git SHA: {}", env!("GIT_SHA"));
            println!("Rust Version: {}", env!("RUST_VERSION"));
            Ok(())
        }
        Commands::Revisions(revisions_args) => run_revisions(revisions_args).await,
        Commands::Run(run_args) => run_operator(run_args).await,
    }
}

async fn run_revisions(args: RevisionsArgs) -> anyhow::Result<()> {
    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let store = KubeRevisionStore::new(client);

    let node = by_node_id(args.node_id.as_str());
    let found: Vec<EnvoyConfigRevision> = match &args.version {
        Some(version) => {
            let version = by_version(version.as_str());
            let filters: [&dyn RevisionFilter; 2] = [&node, &version];
            vec![revisions::get(&store, &args.namespace, &filters).await?]
        }
        None => revisions::list(&store, &args.namespace, &[&node]).await?,
    };

    println!("{:<40} {:<20} {:<10} {:<10}", "NAME", "VERSION", "PUBLISHED", "TAINTED");
    for rev in &found {
        let status = rev.status.clone().unwrap_or_default();
        println!(
            "{:<40} {:<20} {:<10} {:<10}",
            rev.name_any(),
            rev.spec.version,
            status.published,
            status.tainted
        );
    }
    Ok(())
}

async fn run_operator(args: RunArgs) -> anyhow::Result<()> {
    // Initialize tracing with OpenTelemetry
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json_layer = args.log_json.then(|| fmt::layer().json().with_target(true));
    let text_layer = (!args.log_json).then(|| fmt::layer().with_target(true));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer);

    // Only enable OTEL if an endpoint is provided
    let otel_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok();

    if otel_enabled {
        let otel_layer = revision_operator::telemetry::init_telemetry(&registry);
        registry.with(otel_layer).init();
        info!("OpenTelemetry tracing initialized");
    } else {
        registry.init();
        info!("OpenTelemetry tracing disabled (OTEL_EXPORTER_OTLP_ENDPOINT not set)");
    }

    info!(
        "Starting revision-operator v{} for envoy API {}",
        env!("CARGO_PKG_VERSION"),
        args.envoy_api
    );

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let cache: Arc<dyn ServingCache> = Arc::new(SnapshotCache::new());
    let pipeline = PublishPipeline::new(
        Arc::new(SerdeDecoder),
        Arc::new(EnvoyGenerator::new(args.envoy_api)),
        Arc::new(KubeSecretSource::new(client.clone())),
        cache.clone(),
    );

    let state = Arc::new(controller::ControllerState {
        store: Arc::new(KubeRevisionStore::new(client.clone())),
        cache: cache.clone(),
        pipeline,
        filter: ApiVersionFilter::new(args.envoy_api),
    });

    let ready = Arc::new(AtomicBool::new(false));

    #[cfg(feature = "rest-api")]
    {
        let api_state = revision_operator::rest_api::ApiState {
            cache: cache.clone(),
            ready: Arc::clone(&ready),
        };
        let port = args.http_port;
        tokio::spawn(async move {
            if let Err(e) = revision_operator::rest_api::run_server(api_state, port).await {
                tracing::error!("REST API server error: {:?}", e);
            }
        });
    }

    ready.store(true, Ordering::SeqCst);

    // Run the main controller loop
    let result = controller::run_controller(client, args.namespace, state).await;

    // Flush any remaining traces
    revision_operator::telemetry::shutdown_telemetry();

    Ok(result?)
}
