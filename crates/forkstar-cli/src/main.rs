use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use forkstar_client::{HttpRestaurantClient, RestaurantApi, StatusMonitor, DEFAULT_SEARCH_LIMIT};
use forkstar_core::{AppConfig, ManualSurface, ScrollTracker};
use forkstar_schema::{DiscoveryQuery, RecommendedRestaurant, Restaurant, ScrollSnapshot};
use forkstar_server::state::AppState;
use tokio::time::{sleep, Duration};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const CONFIG_FILE: &str = "forkstar.yaml";

#[derive(Parser)]
#[command(name = "forkstar", version, about = "Fork & Star restaurant discovery client")]
struct Cli {
    #[arg(
        long,
        default_value = ".",
        help = "Project root (contains forkstar.yaml and logs/)"
    )]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Serve static assets and the restaurant API pass-through")]
    Serve {
        #[arg(long, help = "Listen port (overrides PORT and config)")]
        port: Option<u16>,
    },
    #[command(about = "Fetch and print the restaurant listing")]
    Restaurants {
        #[arg(long, short = 'q', help = "Search instead of listing everything")]
        query: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT, help = "Result limit for search")]
        limit: usize,
        #[arg(long, help = "Print raw JSON")]
        json: bool,
    },
    #[command(about = "Show trending restaurants")]
    Trending {
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT, help = "Number of restaurants")]
        limit: usize,
    },
    #[command(about = "Pick random restaurants to discover")]
    Discover {
        #[arg(long, default_value_t = 5, help = "Number of restaurants")]
        count: usize,
        #[arg(long, help = "Minimum star rating")]
        min_stars: Option<f64>,
        #[arg(long, help = "Restrict to one cuisine")]
        cuisine: Option<String>,
        #[arg(long, help = "Restrict to one country")]
        country: Option<String>,
    },
    #[command(about = "Check whether the restaurant API is reachable")]
    Status,
    #[command(about = "Validate config and print the effective values")]
    Validate,
    #[command(about = "Replay scroll offsets through the scroll tracker")]
    Scroll {
        #[arg(long, default_value_t = 3000.0, help = "Document height in px")]
        document_height: f64,
        #[arg(long, default_value_t = 1000.0, help = "Viewport height in px")]
        viewport_height: f64,
        #[arg(help = "Offsets to scroll to, one per frame", required = true)]
        offsets: Vec<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    if cli.root.starts_with("~") {
        if let Some(home) = std::env::var_os("HOME") {
            cli.root = PathBuf::from(home).join(cli.root.strip_prefix("~").unwrap_or(&cli.root));
        }
    }

    let log_dir = cli.root.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "forkstar.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(&cli.root)?;

    match command {
        Commands::Serve { port } => serve(config, port).await?,
        Commands::Restaurants { query, limit, json } => {
            let client = HttpRestaurantClient::new(&config.api.base_url);
            let list = match query {
                Some(q) => client.search_restaurants(&q, limit).await?,
                None => client.fetch_restaurants().await?,
            };
            print_restaurants(&list, json)?;
        }
        Commands::Trending { limit } => {
            let client = HttpRestaurantClient::new(&config.api.base_url);
            let trending = client.fetch_trending(limit).await?;
            if !trending.message.is_empty() {
                println!("{}", trending.message);
            }
            print_recommendations(&trending.restaurants);
        }
        Commands::Discover {
            count,
            min_stars,
            cuisine,
            country,
        } => {
            let client = HttpRestaurantClient::new(&config.api.base_url);
            let query = DiscoveryQuery {
                count,
                min_stars,
                cuisine,
                country,
            };
            print_recommendations(&client.discover_random(&query).await?);
        }
        Commands::Status => {
            let client = HttpRestaurantClient::new(&config.api.base_url);
            let status = client.check_connection().await;
            println!("{} ({})", status.message(), config.api.base_url);
            if !status.is_connected() {
                anyhow::bail!("restaurant API is not reachable");
            }
        }
        Commands::Validate => {
            println!(
                "Config valid. mode={:?} listen={} api={} image domains={}",
                config.mode,
                config.server.bind_addr(),
                config.api.base_url,
                config.images.domains.len()
            );
        }
        Commands::Scroll {
            document_height,
            viewport_height,
            offsets,
        } => replay_scroll(&config, document_height, viewport_height, &offsets).await,
    }

    Ok(())
}

fn load_config(root: &Path) -> Result<AppConfig> {
    let path = root.join(CONFIG_FILE);
    AppConfig::load_with_env(&path).with_context(|| format!("loading {}", path.display()))
}

async fn serve(mut config: AppConfig, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    let api: Arc<dyn RestaurantApi> = Arc::new(HttpRestaurantClient::new(&config.api.base_url));
    let monitor = StatusMonitor::start(
        Arc::clone(&api),
        Duration::from_secs(config.status.interval_secs),
    );
    let state = AppState::new(config, api, monitor.reader())?;

    let result = forkstar_server::serve(state).await;
    monitor.shutdown().await;
    result
}

fn print_restaurants(list: &[Restaurant], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(list)?);
        return Ok(());
    }
    if list.is_empty() {
        println!("No restaurants found.");
        return Ok(());
    }
    for r in list {
        let location = r.location_label().unwrap_or_else(|| "-".to_string());
        let cuisine = r.cuisine.as_deref().unwrap_or("-");
        println!("{:>5}  {:<40} {:<30} {}", r.id, r.name, location, cuisine);
    }
    println!("{} restaurant(s)", list.len());
    Ok(())
}

fn format_recommendation(r: &RecommendedRestaurant) -> String {
    let stars = r
        .stars
        .map(|s| format!("{s:.1}*"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<40} {:<20} {:<20} {}",
        r.name,
        r.cuisine.as_deref().unwrap_or("-"),
        r.country.as_deref().unwrap_or("-"),
        stars
    )
}

fn print_recommendations(list: &[RecommendedRestaurant]) {
    if list.is_empty() {
        println!("No restaurants found.");
        return;
    }
    for r in list {
        println!("{}", format_recommendation(r));
    }
}

fn format_snapshot(label: &str, snap: &ScrollSnapshot) -> String {
    format!(
        "{label:>8}  offset={:>8.1}  progress={:.3}  direction={:?}  active={}",
        snap.vertical_offset, snap.progress, snap.direction, snap.is_active
    )
}

async fn replay_scroll(
    config: &AppConfig,
    document_height: f64,
    viewport_height: f64,
    offsets: &[f64],
) {
    let surface = Arc::new(ManualSurface::new(document_height, viewport_height));
    let tracker = ScrollTracker::mount(surface.clone(), &config.scroll);
    println!("{}", format_snapshot("mount", &tracker.snapshot()));

    let frame = config.scroll.frame_interval() + Duration::from_millis(1);
    for offset in offsets {
        surface.scroll_to(*offset);
        tracker.notify_scroll();
        sleep(frame).await;
        println!("{}", format_snapshot(&format!("{offset}"), &tracker.snapshot()));
    }

    sleep(tracker.idle_interval() + frame).await;
    println!("{}", format_snapshot("idle", &tracker.snapshot()));
    tracker.unmount();
}
