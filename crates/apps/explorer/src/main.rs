use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use datasets::error::DataError;
use datasets::fetch::{FetchRequest, ResourceKey};
use datasets::model::ScoreMetric;
use datasets::scores::{DEFAULT_TOP_N, filter_by_state, top_n};
use engine::recording::{RecordedCommand, RecordingEngine};
use engine::signal::EngineSignal;
use mapstate::lifecycle::Theme;
use mapstate::symbology::FILL_LAYER_ID;
use mapstate::sync::MapSync;

/// Headless explorer for the county opportunity map.
///
/// Exercises the full data-sync and map-state stack against a recording
/// engine double, using the same JSON snapshots the web frontend consumes.
#[derive(Debug, Parser)]
#[command(name = "explorer", version, about)]
struct Cli {
    /// Data root: a local directory or an http(s) base URL.
    #[arg(long, global = true, default_value = "public/data")]
    data: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an industry and print its derived map state.
    Inspect {
        /// Industry id from the catalog (e.g. coffee-shops).
        #[arg(long)]
        industry: String,
        /// Optional state filter abbreviation (e.g. TX).
        #[arg(long)]
        state: Option<String>,
        /// Fill metric: score | establishment-count | population-per-biz.
        #[arg(long, default_value = "score")]
        metric: String,
        /// How many top counties to list.
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
    /// Print the demographics record for one county.
    County {
        /// Five-digit county FIPS code.
        #[arg(long)]
        fips: String,
    },
    /// List the industry catalog.
    Catalog,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explorer=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = DataRoot::parse(&cli.data);
    let started = Instant::now();

    let mut sync: MapSync<RecordingEngine> = MapSync::new();
    sync.initialize(Theme::Light, RecordingEngine::new);
    // A real host forwards this from the engine; headless, the double is
    // "loaded" as soon as it exists.
    sync.handle_signal(EngineSignal::Loaded);
    pump(&mut sync, &root).await;

    match cli.command {
        Command::Catalog => {
            let Some(catalog) = sync.scores().catalog() else {
                return Err(describe_failure(&sync).into());
            };
            for industry in catalog {
                println!("{:24} {}", industry.id, industry.label);
            }
        }
        Command::Inspect {
            industry,
            state,
            metric,
            top,
        } => {
            let metric = ScoreMetric::parse(&metric)
                .ok_or_else(|| format!("unknown metric: {metric}"))?;

            if let Some(err) = sync.scores().catalog_error() {
                return Err(err.to_string().into());
            }
            sync.select_industry(&industry)?;
            sync.set_metric(metric);
            pump(&mut sync, &root).await;

            let fit = sync.set_state_filter(state.clone())?;
            info!("viewport: {fit:?}");

            let Some(id) = sync.current_industry().cloned() else {
                return Err("no industry selected".into());
            };
            if let Some(err) = sync.scores().scores_error(&id) {
                return Err(err.to_string().into());
            }
            let Some(scores) = sync.scores().scores(&id) else {
                return Err(describe_failure(&sync).into());
            };

            let filtered = filter_by_state(scores, state.as_deref());
            println!(
                "{} counties scored ({} after filter)",
                scores.len(),
                filtered.len()
            );
            println!("{:<6} {:<28} {:<5} {:>6}", "FIPS", "COUNTY", "STATE", "SCORE");
            for entry in top_n(&filtered, top) {
                println!(
                    "{:<6} {:<28} {:<5} {:>6.0}",
                    entry.fips, entry.name, entry.state, entry.score
                );
            }

            summarize_engine(&sync);
        }
        Command::County { fips } => {
            sync.select_county(Some(fips.clone()));
            pump(&mut sync, &root).await;

            if let Some(err) = sync.demographics().error() {
                return Err(err.to_string().into());
            }
            let Some(county) = sync.demographics().lookup(&fips) else {
                return Err(format!("no demographics record for fips {fips}").into());
            };
            println!("{} ({}), fips {}", county.name, county.state, county.fips);
            println!("  population:        {}", county.population);
            println!("  median income:     {:.0}", county.median_income);
            println!("  median age:        {:.1}", county.median_age);
            println!("  population growth: {:+.1}%", county.population_growth * 100.0);
            println!(
                "  state averages:    income {:.0}, age {:.1}",
                county.state_averages.median_income, county.state_averages.median_age
            );
        }
    }

    sync.teardown();
    debug!("done in {:?}", started.elapsed());
    Ok(())
}

/// Drains queued fetches, performs them, and feeds completions back until
/// the stores go quiet. This is the entire I/O driver: the core never
/// touches the network itself.
async fn pump(sync: &mut MapSync<RecordingEngine>, root: &DataRoot) {
    loop {
        let requests = sync.drain_requests();
        if requests.is_empty() {
            return;
        }
        for FetchRequest { key, epoch } in requests {
            debug!("fetching {} ({})", key.path(), key.kind());
            let result = root.fetch(&key).await;
            if let Err(err) = &result {
                warn!("{err}");
            }
            sync.complete(&key, epoch, result.as_deref().map_err(|e| e.clone()));
        }
    }
}

fn describe_failure(sync: &MapSync<RecordingEngine>) -> String {
    if let Some(err) = sync.scores().catalog_error() {
        return err.to_string();
    }
    if let Some(err) = sync.renderer().load_error() {
        return err.to_string();
    }
    "data not available".to_string()
}

fn summarize_engine(sync: &MapSync<RecordingEngine>) {
    let Some(engine) = sync.lifecycle().engine() else {
        return;
    };
    match engine.paint_property(FILL_LAYER_ID, "fill-color") {
        Some(expr) if expr.is_array() => {
            // ["interpolate", ["linear"], ["match", ...], stops...]
            let table_len = expr
                .get(2)
                .and_then(|m| m.as_array())
                .map(|m| m.len().saturating_sub(3) / 2)
                .unwrap_or(0);
            info!("fill: interpolated expression over {table_len} counties");
        }
        Some(flat) => info!("fill: flat {flat}"),
        None => info!("fill: not attached"),
    }
    if let Some(RecordedCommand::FitBounds { bounds, .. }) = engine
        .commands()
        .iter()
        .rev()
        .find(|c| matches!(c, RecordedCommand::FitBounds { .. }))
    {
        info!(
            "fitted bounds: [{:.3}, {:.3}] .. [{:.3}, {:.3}]",
            bounds.min[0], bounds.min[1], bounds.max[0], bounds.max[1]
        );
    }
}

/// Where the JSON snapshots live.
#[derive(Debug)]
enum DataRoot {
    Dir(PathBuf),
    Http(String),
}

impl DataRoot {
    fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataRoot::Http(raw.trim_end_matches('/').to_string())
        } else {
            DataRoot::Dir(PathBuf::from(raw))
        }
    }

    async fn fetch(&self, key: &ResourceKey) -> Result<String, DataError> {
        let kind = key.kind();
        match self {
            DataRoot::Dir(dir) => {
                let path = dir.join(key.path());
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| DataError::network(kind, format!("{}: {e}", path.display())))
            }
            DataRoot::Http(base) => {
                let url = format!("{base}/{}", key.path());
                let response = reqwest::get(&url)
                    .await
                    .map_err(|e| DataError::network(kind, e.to_string()))?;
                if !response.status().is_success() {
                    return Err(DataError::network(
                        kind,
                        format!("{url}: status {}", response.status()),
                    ));
                }
                response
                    .text()
                    .await
                    .map_err(|e| DataError::network(kind, e.to_string()))
            }
        }
    }
}
