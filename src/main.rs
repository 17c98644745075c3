use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pdf_ingest::{
    api, collections,
    config::{self, Config, ConnectionParams},
    handler::{self, HandlerContext},
    logging,
    milvus::CollectionDescription,
    processing::{IngestionService, TextSplitter},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "pdf-ingest",
    version,
    about = "Ingest PDF documents into a Milvus / Zilliz Cloud collection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Connection overrides; each falls back to its environment variable.
#[derive(Args)]
struct ConnectionArgs {
    /// Collection name [env: COLLECTION_NAME]
    #[arg(long)]
    collection: Option<String>,
    /// Milvus / Zilliz Cloud endpoint [env: ZILLIZ_CLOUD_URI]
    #[arg(long)]
    uri: Option<String>,
    /// Access token [env: ZILLIZ_TOKEN]
    #[arg(long)]
    token: Option<String>,
}

impl ConnectionArgs {
    fn resolve(self, config: &Config) -> Result<ConnectionParams> {
        ConnectionParams::resolve(self.collection, self.uri, self.token, config)
            .context("failed to resolve connection parameters")
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the document collection and its vector index.
    CreateCollection {
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Vector dimension [default: EMBEDDING_DIMENSION]
        #[arg(long)]
        dimension: Option<usize>,
    },
    /// Drop the collection and all of its records.
    DropCollection {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Show the collection's fields, indexes and load state.
    DescribeCollection {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List collections visible to the credentials.
    ListCollections {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Chunk, embed and insert a local PDF.
    Insert {
        /// PDF file to ingest.
        path: PathBuf,
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Characters per chunk [default: TEXT_SPLITTER_CHUNK_SIZE]
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared by adjacent chunks [default: TEXT_SPLITTER_CHUNK_OVERLAP]
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Run one handler invocation on an event stored in a JSON file.
    HandleEvent {
        /// Object-created notification JSON.
        event: PathBuf,
    },
    /// Serve the webhook (`POST /events`, `GET /metrics`).
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing();

    match cli.command {
        Command::CreateCollection {
            connection,
            dimension,
        } => {
            let params = connection.resolve(config)?;
            let dimension = dimension.unwrap_or(config.embedding_dimension);
            collections::create_collection(&params, dimension)
                .await
                .with_context(|| {
                    format!("failed to create collection {}", params.collection_name)
                })?;
            println!(
                "Created collection {} (dimension {dimension})",
                params.collection_name
            );
        }
        Command::DropCollection { connection } => {
            let params = connection.resolve(config)?;
            collections::drop_collection(&params)
                .await
                .with_context(|| format!("failed to drop collection {}", params.collection_name))?;
            println!("Dropped collection {}", params.collection_name);
        }
        Command::DescribeCollection { connection } => {
            let params = connection.resolve(config)?;
            let description = collections::describe_collection(&params)
                .await
                .with_context(|| {
                    format!("failed to describe collection {}", params.collection_name)
                })?;
            print_description(&description);
        }
        Command::ListCollections { connection } => {
            let params = connection.resolve(config)?;
            let names = collections::list_collections(&params)
                .await
                .context("failed to list collections")?;
            for name in names {
                println!("{name}");
            }
        }
        Command::Insert {
            path,
            connection,
            chunk_size,
            chunk_overlap,
        } => {
            let params = connection.resolve(config)?;
            let splitter = TextSplitter::new(
                chunk_size.unwrap_or(config.chunk_size),
                chunk_overlap.unwrap_or(config.chunk_overlap),
            )
            .context("invalid chunking parameters")?;
            insert_document(config, &params, &path, &splitter).await?;
        }
        Command::HandleEvent { event } => handle_event(config, &event).await?,
        Command::Serve => serve(config).await?,
    }
    Ok(())
}

async fn insert_document(
    config: &Config,
    params: &ConnectionParams,
    path: &Path,
    splitter: &TextSplitter,
) -> Result<()> {
    let service = IngestionService::from_config(config, params)
        .context("failed to initialize ingestion service")?;
    let outcome = service
        .insert_document(path, &params.collection_name, splitter)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))?;
    let load_state = outcome
        .load_state
        .map_or_else(|| "unknown".to_string(), |state| state.to_string());
    println!(
        "Inserted {} of {} chunks from {} into {} (load state: {load_state})",
        outcome.inserted,
        outcome.chunk_count,
        path.display(),
        params.collection_name
    );
    Ok(())
}

async fn handle_event(config: &Config, event_path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(event_path)
        .await
        .with_context(|| format!("failed to read event at {}", event_path.display()))?;
    let event: serde_json::Value =
        serde_json::from_str(&raw).context("failed to parse event json")?;
    let context =
        HandlerContext::from_config(config).context("failed to initialize handler context")?;

    let response = handler::handle(&context, event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.status_code != 200 {
        bail!("handler returned status {}", response.status_code);
    }
    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let context =
        HandlerContext::from_config(config).context("failed to initialize handler context")?;
    let app = api::create_router(Arc::new(context));

    let (listener, port) = bind_listener(config)
        .await
        .context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn print_description(description: &CollectionDescription) {
    println!("Collection: {}", description.name);
    println!("Dynamic fields: {}", description.enable_dynamic_field);
    if let Some(state) = description.load_state {
        println!("Load state: {state}");
    }
    println!("Fields:");
    for field in &description.fields {
        let mut line = format!("  {} {}", field.name, field.data_type);
        if let Some(dimension) = field.dimension {
            line.push_str(&format!(" dim={dimension}"));
        }
        if let Some(max_length) = field.max_length {
            line.push_str(&format!(" max_length={max_length}"));
        }
        if field.primary_key {
            line.push_str(" primary");
        }
        if field.auto_id {
            line.push_str(" auto_id");
        }
        println!("{line}");
    }
    println!("Indexes:");
    for index in &description.indexes {
        println!(
            "  {} on {} ({})",
            index.index_name, index.field_name, index.metric_type
        );
    }
}

async fn bind_listener(config: &Config) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}
