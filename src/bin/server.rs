use std::{
    env,
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration as StdDuration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use stockroom_rs::{AppState, CustomerPolicy, build_router, graceful_shutdown, logging_middleware};

/// The REST API server for stockroom_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The address to serve the API from.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The front end origin allowed to call the API from a browser.
    #[arg(long, default_value = "http://localhost:5173")]
    allowed_origin: String,

    /// Reject stock movements for customers that have not been registered.
    #[arg(long)]
    require_registered_customer: bool,

    /// How many days a token issued on log in stays valid.
    #[arg(long, default_value_t = 30)]
    token_days: i64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let secret = env::var("JWT_SECRET_KEY")
        .expect("The environment variable 'JWT_SECRET_KEY' must be set");

    let conn = Connection::open(&args.db_path)
        .unwrap_or_else(|error| panic!("Could not open the database at {}: {error}", args.db_path));
    conn.busy_timeout(StdDuration::from_secs(5))
        .expect("Could not set the database busy timeout");

    let customer_policy = if args.require_registered_customer {
        CustomerPolicy::MustExist
    } else {
        CustomerPolicy::Unchecked
    };

    let state = AppState::new(conn, &secret, &args.timezone)
        .expect("Could not initialize the app state")
        .with_customer_policy(customer_policy)
        .with_token_duration(Duration::days(args.token_days));

    let cors_layer = build_cors_layer(&args.allowed_origin);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state)
            .layer(middleware::from_fn(logging_middleware))
            .layer(cors_layer),
    );

    let addr = SocketAddr::new(args.host, args.port);
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn build_cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin: HeaderValue = allowed_origin
        .parse()
        .unwrap_or_else(|_| panic!("Invalid allowed origin {allowed_origin:?}"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
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
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
