//! Headless driver for the EcoLens engine.
//!
//! Runs the same pipeline the in-page engine runs, against a URL given on
//! the command line, printing widget transitions instead of painting them.

use el_cache::CacheStore;
use el_cache::FileCacheStore;
use el_core::EngineError;
use el_core::EngineResult;
use el_engine::Engine;
use el_engine::EngineConfig;
use el_engine::ListingIndicator;
use el_engine::PageDom;
use el_engine::SearchListing;
use el_engine::WidgetState;
use el_page::PageKind;
use el_score::HttpScoringClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
const ANALYZE_DEADLINE: Duration = Duration::from_secs(30);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(error) = run() {
        eprintln!("ecolens error: {error}");
        std::process::exit(1);
    }
}

#[derive(Debug)]
struct CliOptions {
    command: String,
    url: Option<String>,
    service_url: String,
    cache_root: PathBuf,
}

fn run() -> EngineResult<()> {
    let options = parse_args()?;

    match options.command.as_str() {
        "classify" => classify(&options),
        "analyze" => analyze(&options),
        "cached" => cached(&options),
        "ping" => ping(&options),
        other => Err(EngineError::new(
            "cli.command_unknown",
            format!("unknown command `{other}`; expected classify, analyze, cached, or ping"),
        )),
    }
}

fn parse_args() -> EngineResult<CliOptions> {
    let mut command = None;
    let mut url = None;
    let mut service_url = std::env::var("ECOLENS_SERVICE_URL")
        .unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_owned());
    let mut cache_root = default_cache_root();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--service" => {
                service_url = args.next().ok_or_else(|| {
                    EngineError::new("cli.flag_value_missing", "--service requires a URL")
                })?;
            }
            "--cache-dir" => {
                let dir = args.next().ok_or_else(|| {
                    EngineError::new("cli.flag_value_missing", "--cache-dir requires a path")
                })?;
                cache_root = PathBuf::from(dir);
            }
            value if command.is_none() => command = Some(value.to_owned()),
            value if url.is_none() => url = Some(value.to_owned()),
            value => {
                return Err(EngineError::new(
                    "cli.argument_unexpected",
                    format!("unexpected argument `{value}`"),
                ));
            }
        }
    }

    let command = command.ok_or_else(|| {
        EngineError::new(
            "cli.command_missing",
            "usage: ecolens-cli <classify|analyze|cached|ping> [url] [--service URL] [--cache-dir DIR]",
        )
    })?;

    Ok(CliOptions {
        command,
        url,
        service_url,
        cache_root,
    })
}

fn default_cache_root() -> PathBuf {
    if let Some(override_root) = std::env::var_os("ECOLENS_CACHE_DIR") {
        return PathBuf::from(override_root);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".ecolens")
}

fn require_url(options: &CliOptions) -> EngineResult<String> {
    options.url.clone().ok_or_else(|| {
        EngineError::new(
            "cli.url_missing",
            format!("the `{}` command requires a page URL", options.command),
        )
    })
}

fn classify(options: &CliOptions) -> EngineResult<()> {
    let url = require_url(options)?;
    println!("{}", PageKind::classify_str(&url).as_str());
    Ok(())
}

fn ping(options: &CliOptions) -> EngineResult<()> {
    let client = HttpScoringClient::new(&options.service_url)?;
    client.health_check()?;
    println!("service at {} is healthy", client.base_url());
    Ok(())
}

fn cached(options: &CliOptions) -> EngineResult<()> {
    let url = require_url(options)?;
    let cache = FileCacheStore::new(options.cache_root.clone());
    match cache.get(&url)? {
        Some(raw_body) => println!("{raw_body}"),
        None => println!("no cached analysis for {url}"),
    }
    Ok(())
}

fn analyze(options: &CliOptions) -> EngineResult<()> {
    let url = require_url(options)?;
    let client = Arc::new(HttpScoringClient::new(&options.service_url)?);
    let cache = Arc::new(FileCacheStore::new(options.cache_root.clone()));
    let mut engine = Engine::new(EngineConfig::default(), client, cache)?;
    let mut dom = HeadlessDom::new(&url);

    engine.startup(&mut dom);
    if !engine.is_loading() && !dom.widget.is_present() {
        println!("nothing to analyze: {url} is not a product page");
        return Ok(());
    }

    let deadline = Instant::now() + ANALYZE_DEADLINE;
    while engine.is_loading() {
        engine.poll(&mut dom, Instant::now());
        if Instant::now() > deadline {
            return Err(EngineError::new(
                "cli.analysis_timeout",
                "analysis did not complete before the deadline",
            ));
        }
        std::thread::sleep(Duration::from_millis(25));
    }

    if let Some(analysis) = engine.active_analysis() {
        tracing::debug!(url = analysis.url.as_str(), "analysis cached");
    }

    Ok(())
}

/// Terminal stand-in for a live document: always offers an insertion point
/// and prints widget transitions instead of rendering them.
struct HeadlessDom {
    url: String,
    widget: WidgetState,
}

impl HeadlessDom {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            widget: WidgetState::Absent,
        }
    }
}

impl PageDom for HeadlessDom {
    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn anchor_exists(&self, _selector: &str) -> bool {
        true
    }

    fn replace_widget(&mut self, widget: WidgetState) {
        match &widget {
            WidgetState::Absent => println!("widget removed"),
            WidgetState::Loading => println!("widget: loading"),
            WidgetState::Success(model) => {
                println!(
                    "widget: eco score {}/100 ({} tier, {} color)",
                    model.overall_eco_score,
                    model.tier.as_str(),
                    model.tier.color()
                );
                println!(
                    "  co2 {} kg ({}), water {} L, recyclability {}/100, confidence {}%",
                    model.co2_total_kg,
                    model.co2_equivalent,
                    model.water_usage_liters,
                    model.recyclability_score,
                    model.confidence_level
                );
                for recommendation in &model.recommendations {
                    println!("  - {recommendation}");
                }
            }
            WidgetState::Error(message) => println!("widget: error: {message}"),
        }
        self.widget = widget;
    }

    fn widget_present(&self) -> bool {
        self.widget.is_present()
    }

    fn search_listings(&self) -> Vec<SearchListing> {
        Vec::new()
    }

    fn annotate_listing(&mut self, element_id: &str, indicator: ListingIndicator) {
        println!("listing {element_id}: {}", indicator.label());
    }
}
