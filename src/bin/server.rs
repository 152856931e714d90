use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header::CONTENT_TYPE},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerkeep::{AppState, FilesystemAttachmentStore, build_router, graceful_shutdown};

/// The REST API server for ledgerkeep.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Directory where attachment blobs are stored.
    #[arg(long, default_value = "attachments")]
    blob_dir: PathBuf,

    /// URL path the blob directory is served under.
    #[arg(long, default_value = "/attachments")]
    attachment_base_url: String,

    /// Directory with a built frontend to serve at the root, if any.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Origin allowed to make cross-origin requests, for a separately
    /// hosted frontend.
    #[arg(long)]
    allowed_origin: Option<String>,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3001)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let connection =
        Connection::open(&args.db_path).expect("Could not open the application database");

    let attachment_store =
        FilesystemAttachmentStore::new(&args.blob_dir, &args.attachment_base_url)
            .expect("Could not create the attachment blob directory");

    let state = AppState::new(connection, Arc::new(attachment_store))
        .expect("Could not initialize the application database");
    tracing::info!("Connected to the database at {}", args.db_path);

    let router = add_tracing_layer(build_router(state)).nest_service(
        args.attachment_base_url.trim_end_matches('/'),
        ServeDir::new(&args.blob_dir),
    );

    let router = match &args.static_dir {
        Some(static_dir) => router.fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        ),
        None => router,
    };

    let router = match &args.allowed_origin {
        Some(origin) => {
            let origin: HeaderValue = origin.parse().expect("Could not parse the allowed origin");
            router.layer(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([CONTENT_TYPE]),
            )
        }
        None => router,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
