use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use adres_gazetteer::{GazetteerTree, LoadMode, LoadOptions, default_cache_path};
use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use adres_resolver::{AppState, StaticParser, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_GAZETTEER: &str = "data/gazetteer.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using gazetteer at {} (mode: {:?})",
        config.gazetteer_path.display(),
        config.load.mode
    );
    if config.load.use_cache {
        let cache_path = config
            .load
            .cache_path
            .clone()
            .unwrap_or_else(|| default_cache_path(&config.gazetteer_path));
        info!("gazetteer snapshot at {}", cache_path.display());
    } else {
        info!("gazetteer snapshot disabled");
    }

    let start = Instant::now();
    let (mut tree, origin) = GazetteerTree::load_with(&config.gazetteer_path, &config.load)
        .with_context(|| format!("loading gazetteer {}", config.gazetteer_path.display()))?;
    info!(
        "gazetteer ready in {} ms ({origin:?})",
        start.elapsed().as_millis()
    );

    if let Some(subset) = &config.subset {
        let view = tree.subset_view(subset);
        for missing in view.missing() {
            warn!("subset province {missing} not found in gazetteer");
        }
        tree = view.into_inner();
        info!("serving subset of {} provinces", tree.province_count());
    }

    let dups = tree.duplicate_districts_across_provinces();
    if !dups.is_empty() {
        info!(
            "{} district names occur under several provinces; province inference picks the first",
            dups.len()
        );
    }

    let parser = StaticParser::new(Arc::new(tree));
    let (provinces, districts, neighbourhoods) = parser.index_sizes();
    info!("indexed {provinces} provinces, {districts} districts, {neighbourhoods} neighbourhoods");

    let state = AppState {
        parser: Arc::new(parser),
    };
    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    gazetteer_path: PathBuf,
    subset: Option<Vec<String>>,
    load: LoadOptions,
}

fn load_config() -> Config {
    let mut use_cache = true;
    let mut cli_path: Option<PathBuf> = None;
    let mut cli_mode: Option<LoadMode> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => use_cache = false,
            "--gazetteer" => {
                if let Some(path) = args.next() {
                    cli_path = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--gazetteer=") {
                    cli_path = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--load-mode=") {
                    cli_mode = LoadMode::from_name(mode);
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let gazetteer_path = cli_path
        .or_else(|| env::var("GAZETTEER_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GAZETTEER));
    let cache_path = env::var("GAZETTEER_CACHE_PATH").ok().map(PathBuf::from);
    let mode = cli_mode
        .or_else(|| {
            env::var("GAZETTEER_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(LoadMode::from_name)
        })
        .unwrap_or(LoadMode::Mmap);
    let delimiter = env::var("GAZETTEER_DELIMITER")
        .ok()
        .as_deref()
        .and_then(parse_delimiter);
    let subset = env::var("GAZETTEER_SUBSET").ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    });

    Config {
        host,
        port,
        gazetteer_path,
        subset,
        load: LoadOptions {
            use_cache,
            cache_path,
            mode,
            delimiter,
        },
    }
}

fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Some(b'\t'),
        _ if raw.len() == 1 => raw.bytes().next(),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
