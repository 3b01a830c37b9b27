//! Stockroom: desktop administration client for a product catalog
//!
//! Usage:
//!   stockroom           - Open at the dashboard
//!   stockroom <route>   - Open at a client route (e.g. "/products?search=shoe")
//!   stockroom logout    - Forget the stored credential
//!   stockroom help      - Show help

use std::env;

use iced::Size;
use stockroom::app::Stockroom;
use stockroom::backend::{ApiClient, Session};
use stockroom::config::Config;
use stockroom::routes::Route;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> iced::Result {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(String::as_str);

    if matches!(cmd, Some("help" | "--help" | "-h")) {
        print_help();
        return Ok(());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cmd {
        None => start(config, Route::Dashboard),
        Some("logout") => {
            Session::persistent(config.session_file.clone()).clear();
            println!("Logged out");
            Ok(())
        }
        Some(route) if route.starts_with('/') => start(config, Route::parse(route)),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'stockroom help' for usage");
            std::process::exit(2);
        }
    }
}

fn print_help() {
    println!("Stockroom - product catalog administration\n");
    println!("Usage: stockroom [command | route]\n");
    println!("Commands:");
    println!("  (none)        Open at the dashboard");
    println!("  <route>       Open at a route, e.g. \"/products?offset=10&limit=10&search=shoe\"");
    println!("  logout        Forget the stored credential");
    println!("  help          Show this help message");
    println!("\nConfiguration: <config dir>/stockroom/config.toml");
    println!("Environment: STOCKROOM_API_URL, STOCKROOM_SESSION_FILE,");
    println!("             CLOUDINARY_CLOUD_NAME, CLOUDINARY_UPLOAD_PRESET, RUST_LOG");
}

fn start(config: Config, route: Route) -> iced::Result {
    let session = Session::persistent(config.session_file.clone());
    let api = match ApiClient::new(&config.api_url, session) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!("Cannot use api_url {}: {}", config.api_url, e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Stockroom against {}", config.api_url);

    iced::application(Stockroom::title, Stockroom::update, Stockroom::view)
        .subscription(Stockroom::subscription)
        .theme(Stockroom::theme)
        .window_size(Size::new(1280.0, 820.0))
        .antialiasing(true)
        .run_with(move || Stockroom::new(config, api, route))
}
