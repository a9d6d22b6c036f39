use std::{env, fs, path::Path, process, sync::Arc};

use chrono::Local;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rec_schedule::{
    cache::{self, Cache},
    cli::{self, Args},
    extract,
    fetch::Fetcher,
    server::{self, AppState},
    ExtractOptions,
};

const CACHE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "rec_schedule=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse(env::args().skip(1).collect());

    let result = match args.input.clone() {
        Some(input) => run_once(&input, &args),
        None => run_server(args).await,
    };

    if let Err(err) = result {
        error!("{err}");
        process::exit(1);
    }
}

fn run_once(input: &Path, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let html = fs::read_to_string(input)?;
    let base_origin = match &args.upstream {
        Some(upstream) => Some(url::Url::parse(upstream)?.origin().ascii_serialization()),
        None => None,
    };

    let options = ExtractOptions {
        base_origin,
        week_anchor: args.week.unwrap_or_else(|| Local::now().date_naive()),
        timezone: args.timezone,
    };

    let extraction = extract(&html, &options);
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let upstream = args.upstream.as_deref().unwrap_or_default();
    let fetcher = Fetcher::new(upstream, args.start_param, args.end_param)?;

    let state = Arc::new(AppState {
        fetcher,
        cache: Cache::new(cache::Config {
            enabled: args.enable_cache,
            ttl: args.cache_ttl,
            capacity: CACHE_CAPACITY,
        }),
        timezone: args.timezone,
    });

    server::serve(args.address, state).await?;
    Ok(())
}
