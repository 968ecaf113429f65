//! Fetch command - load image data for a batch of locators.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use feed_loader_adapters::{
    default_cache_dir, DiskImageDataStore, FileFeedImageDataLoader, LocalFeedImageDataLoader,
    RemoteFeedImageDataLoader, SchemeRoutingLoader,
};
use feed_loader_core::presentation::decode_image;
use feed_loader_core::{
    CachingFeedImageDataLoaderDecorator, FallbackFeedImageDataLoader, FeedImageDataLoader,
    FetchResult, ImageDimensions, LoadOutcome, ProgressEvent, ProgressSink, ResultOutput,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use url::Url;

use super::ExitCode;
use crate::config::{AppConfig, MAX_CONCURRENCY};
use crate::output::{JsonOutput, ProgressBar};

/// Output format for outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line, in completion order)
    #[default]
    Jsonl,
    /// Single JSON array (in input order)
    Json,
}

/// Hardcoded default values.
mod defaults {
    pub const CONCURRENCY: usize = 4;
    pub const TIMEOUT_SECS: u64 = 30;
}

/// Parse and validate a concurrency value (1-64).
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (1..=MAX_CONCURRENCY).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 1..={MAX_CONCURRENCY}"))
    }
}

/// Parse and validate a timeout in seconds.
fn parse_timeout(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        Err("timeout must be greater than 0".to_string())
    } else {
        Ok(value)
    }
}

/// Shared arguments for fetching image data.
#[derive(Args, Clone, Debug, Default)]
pub struct FetchArgs {
    /// Image URLs (http, https, file) or local file paths
    pub urls: Vec<String>,

    /// Bypass the disk cache entirely
    #[arg(long)]
    pub no_cache: bool,

    /// Custom cache directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Maximum loads in flight at once (1-64)
    #[arg(short = 'j', long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// User-Agent header for HTTP requests
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,
}

impl FetchArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        // CLI --no-cache always wins; otherwise config may disable the cache
        if !args.no_cache {
            if let Some(enabled) = config.cache.enabled {
                args.no_cache = !enabled;
            }
        }
        if args.cache_dir.is_none() {
            args.cache_dir.clone_from(&config.cache.dir);
        }

        args.timeout = args.timeout.or(config.remote.timeout_secs);
        args.concurrency = args.concurrency.or(config.general.concurrency);
        if args.user_agent.is_none() {
            args.user_agent.clone_from(&config.remote.user_agent);
        }

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args
    }

    fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(defaults::CONCURRENCY)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(defaults::TIMEOUT_SECS))
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Result of running the fetch command.
pub struct FetchSummary {
    /// Loads that delivered a payload.
    pub succeeded: usize,
    /// Loads that delivered an error.
    pub failed: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Outcomes of a finished batch.
#[derive(Debug)]
pub struct BatchReport {
    /// One outcome per requested locator, in input order.
    pub outcomes: Vec<LoadOutcome>,
    /// Loads that delivered a payload.
    pub succeeded: usize,
    /// Loads that delivered an error.
    pub failed: usize,
}

/// Run the fetch command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &FetchArgs) -> Result<FetchSummary> {
    info!("Running fetch command on {} locators", args.urls.len());

    if args.urls.is_empty() {
        anyhow::bail!("No URLs specified");
    }

    let urls = args
        .urls
        .iter()
        .map(|s| parse_locator(s))
        .collect::<Result<Vec<_>>>()?;

    let loader = build_loader(args)?;

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(Some(urls.len() as u64), args.quiet, show_progress);
    let output = JsonOutput::stdout();

    let format = args.format();
    let stream: Option<&dyn ResultOutput> = match format {
        OutputFormat::Jsonl => Some(&output),
        OutputFormat::Json => None,
    };

    let report = load_all(
        loader.as_ref(),
        &urls,
        args.concurrency(),
        stream,
        &progress_bar,
    )?;

    if format == OutputFormat::Json {
        output.write_array(&report.outcomes, args.pretty)?;
    }
    output.flush()?;

    let exit_code = if report.failed > 0 {
        ExitCode::FailuresFound
    } else {
        ExitCode::Success
    };

    Ok(FetchSummary {
        succeeded: report.succeeded,
        failed: report.failed,
        exit_code,
    })
}

/// Parse a command-line locator into a URL.
///
/// Anything that is not an absolute URL is treated as a local path and
/// turned into a `file://` URL.
fn parse_locator(s: &str) -> Result<Url> {
    match Url::parse(s) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let absolute = std::path::absolute(Path::new(s))
                .with_context(|| format!("Failed to resolve path {s}"))?;
            Url::from_file_path(&absolute)
                .map_err(|()| anyhow::anyhow!("Invalid file path: {}", absolute.display()))
        }
        Err(e) => Err(e).with_context(|| format!("Invalid URL: {s}")),
    }
}

/// Build the loader stack from merged args (CLI + config).
///
/// `file://` requests go straight to the filesystem. Everything else is
/// served from the disk cache first, falling back to HTTP and caching what
/// it downloads; `--no-cache` leaves only HTTP.
fn build_loader(args: &FetchArgs) -> Result<Arc<dyn FeedImageDataLoader>> {
    let defaults = feed_loader_adapters::RemoteConfig::default();
    let remote_config = feed_loader_adapters::RemoteConfig {
        timeout: args.timeout(),
        user_agent: args.user_agent.clone().unwrap_or(defaults.user_agent),
    };
    let remote: Arc<dyn FeedImageDataLoader> =
        Arc::new(RemoteFeedImageDataLoader::new(&remote_config)?);

    let network: Arc<dyn FeedImageDataLoader> = if args.no_cache {
        debug!("Disk cache disabled");
        remote
    } else {
        let dir = args.cache_dir();
        debug!("Using cache directory: {}", dir.display());
        let local = Arc::new(LocalFeedImageDataLoader::new(Arc::new(
            DiskImageDataStore::new(dir),
        )));
        let caching = Arc::new(CachingFeedImageDataLoaderDecorator::new(
            remote,
            Arc::clone(&local) as _,
        ));
        Arc::new(FallbackFeedImageDataLoader::new(local, caching))
    };

    Ok(Arc::new(
        SchemeRoutingLoader::new(network).route("file", Arc::new(FileFeedImageDataLoader::new())),
    ))
}

/// Message a request sends back to [`load_all`].
type Delivery = (usize, FetchResult);

/// Reports one request's result to the batch.
///
/// If the loader drops the completion without calling it, the request is
/// reported as failed instead, so the batch never waits on it.
struct ResultSlot {
    index: usize,
    tx: Option<mpsc::Sender<Delivery>>,
}

impl ResultSlot {
    fn deliver(mut self, result: FetchResult) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((self.index, result));
        }
    }
}

impl Drop for ResultSlot {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((
                self.index,
                Err(anyhow::anyhow!("load ended without delivering a result")),
            ));
        }
    }
}

/// Load every URL through `loader`, keeping at most `concurrency` requests
/// in flight.
///
/// Outcomes are streamed to `stream` as they complete. The returned report
/// lists them in input order. A request whose completion is dropped uncalled
/// counts as failed.
///
/// # Errors
///
/// Returns an error if writing to `stream` fails.
pub fn load_all(
    loader: &dyn FeedImageDataLoader,
    urls: &[Url],
    concurrency: usize,
    stream: Option<&dyn ResultOutput>,
    progress: &dyn ProgressSink,
) -> Result<BatchReport> {
    let total = urls.len();
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel::<Delivery>();

    let mut tasks = Vec::with_capacity(total);
    let mut slots: Vec<Option<LoadOutcome>> = vec![None; total];
    let mut next = 0usize;
    let mut in_flight = 0usize;
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    while next < total || in_flight > 0 {
        while in_flight < concurrency && next < total {
            let index = next;
            progress.on_event(ProgressEvent::Started {
                url: urls[index].to_string(),
                index,
                total: Some(total),
            });
            let slot = ResultSlot {
                index,
                tx: Some(tx.clone()),
            };
            tasks.push(loader.load_image_data(
                &urls[index],
                Box::new(move |result| slot.deliver(result)),
            ));
            next += 1;
            in_flight += 1;
        }

        let (index, result) = rx
            .recv()
            .context("Batch result channel closed unexpectedly")?;
        in_flight -= 1;

        let outcome = make_outcome(&urls[index], result);
        if outcome.is_success() {
            succeeded += 1;
        } else {
            failed += 1;
        }
        if let Some(stream) = stream {
            stream.write(&outcome)?;
        }
        progress.on_event(ProgressEvent::Completed {
            outcome: outcome.clone(),
        });
        slots[index] = Some(outcome);
    }

    progress.on_event(ProgressEvent::Finished { succeeded, failed });

    Ok(BatchReport {
        outcomes: slots.into_iter().flatten().collect(),
        succeeded,
        failed,
    })
}

/// Turn a delivered result into a reportable outcome.
fn make_outcome(url: &Url, result: FetchResult) -> LoadOutcome {
    match result {
        Ok(data) => {
            let dimensions =
                decode_image(&data).map(|img| ImageDimensions::new(img.width(), img.height()));
            LoadOutcome::success(
                url.as_str(),
                data.len(),
                sha256_hex(&data),
                dimensions,
                iso_timestamp(),
            )
        }
        Err(e) => {
            debug!("Load failed for {url}: {e:#}");
            LoadOutcome::failure(url.as_str(), format!("{e:#}"), iso_timestamp())
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use feed_loader_core::{spawn_load, Completion, FeedImageDataLoaderTask, TaskRegistry};
    use feed_loader_test_support::{
        FeedImageBuilder, MockProgressSink, MockResultOutput, StubImageDataLoader,
        SyntheticImageBuilder,
    };
    use std::thread;

    /// Loader that gives up on every request without completing it.
    struct AbandoningLoader {
        registry: Arc<TaskRegistry>,
        panic_in_worker: bool,
    }

    impl FeedImageDataLoader for AbandoningLoader {
        fn load_image_data(
            &self,
            _url: &Url,
            completion: Completion,
        ) -> Box<dyn FeedImageDataLoaderTask> {
            if self.panic_in_worker {
                return Box::new(spawn_load(
                    &self.registry,
                    "feed-image-test",
                    completion,
                    |_| panic!("worker crashed"),
                ));
            }
            let (handle, completer) = self.registry.register(completion);
            drop(completer);
            Box::new(handle)
        }
    }

    /// Runs `load_all` on a helper thread, failing the test if it does not
    /// finish in time.
    fn load_all_within_timeout(loader: AbandoningLoader, urls: Vec<Url>) -> BatchReport {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let progress = MockProgressSink::new();
            let _ = tx.send(load_all(&loader, &urls, 1, None, &progress).unwrap());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .unwrap_or_else(|_| panic!("load_all did not finish"))
    }

    fn urls(n: usize) -> Vec<Url> {
        (0..n)
            .map(|i| FeedImageBuilder::url(&format!("https://example.com/{i}.png")))
            .collect()
    }

    #[test]
    fn test_parse_concurrency_bounds() {
        assert_eq!(parse_concurrency("1"), Ok(1));
        assert_eq!(parse_concurrency("64"), Ok(64));
        assert!(parse_concurrency("0").is_err());
        assert!(parse_concurrency("65").is_err());
        assert!(parse_concurrency("many").is_err());
    }

    #[test]
    fn test_parse_timeout_rejects_zero() {
        assert_eq!(parse_timeout("5"), Ok(5));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("-1").is_err());
    }

    #[test]
    fn test_parse_locator_keeps_absolute_urls() {
        let url = parse_locator("https://example.com/a.png").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), "/a.png");
    }

    #[test]
    fn test_parse_locator_turns_paths_into_file_urls() {
        let url = parse_locator("photos/a.png").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/photos/a.png"));

        let absolute = parse_locator("/tmp/b.png").unwrap();
        assert_eq!(absolute.as_str(), "file:///tmp/b.png");
    }

    #[test]
    fn test_parse_locator_rejects_malformed_urls() {
        assert!(parse_locator("http://[::1").is_err());
    }

    #[test]
    fn test_with_config_cli_wins() {
        let mut config = AppConfig::default();
        config.general.concurrency = Some(8);
        config.remote.timeout_secs = Some(10);
        config.output.format = Some("json".to_string());

        let args = FetchArgs {
            concurrency: Some(2),
            format: Some(OutputFormat::Jsonl),
            ..FetchArgs::default()
        };
        let merged = FetchArgs::with_config(args, &config);

        assert_eq!(merged.concurrency(), 2);
        assert_eq!(merged.timeout(), Duration::from_secs(10));
        assert_eq!(merged.format(), OutputFormat::Jsonl);
    }

    #[test]
    fn test_with_config_fills_defaults() {
        let merged = FetchArgs::with_config(FetchArgs::default(), &AppConfig::default());

        assert_eq!(merged.concurrency(), defaults::CONCURRENCY);
        assert_eq!(merged.timeout(), Duration::from_secs(defaults::TIMEOUT_SECS));
        assert_eq!(merged.format(), OutputFormat::Jsonl);
        assert!(!merged.no_cache);
        assert_eq!(merged.cache_dir(), default_cache_dir());
    }

    #[test]
    fn test_with_config_can_disable_cache() {
        let mut config = AppConfig::default();
        config.cache.enabled = Some(false);
        config.cache.dir = Some(PathBuf::from("/tmp/feed-cache"));

        let merged = FetchArgs::with_config(FetchArgs::default(), &config);
        assert!(merged.no_cache);
        assert_eq!(merged.cache_dir(), PathBuf::from("/tmp/feed-cache"));
    }

    #[test]
    fn test_with_config_cannot_reenable_cache() {
        let mut config = AppConfig::default();
        config.cache.enabled = Some(true);

        let args = FetchArgs {
            no_cache: true,
            ..FetchArgs::default()
        };
        assert!(FetchArgs::with_config(args, &config).no_cache);
    }

    #[test]
    fn test_load_all_reports_successes_in_input_order() {
        let loader = StubImageDataLoader::succeeding_with(SyntheticImageBuilder::red_png());
        let urls = urls(3);
        let progress = MockProgressSink::new();

        let report = load_all(&loader, &urls, 2, None, &progress).unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 0);
        let reported: Vec<_> = report.outcomes.iter().map(|o| o.url.clone()).collect();
        let expected: Vec<_> = urls.iter().map(ToString::to_string).collect();
        assert_eq!(reported, expected);

        let first = &report.outcomes[0];
        assert_eq!(first.dimensions, Some(ImageDimensions::new(1, 1)));
        assert_eq!(first.sha256.as_deref().map(str::len), Some(64));
        assert_eq!(
            first.bytes,
            Some(SyntheticImageBuilder::red_png().len())
        );
    }

    #[test]
    fn test_load_all_reports_failures() {
        let urls = urls(2);
        let loader = StubImageDataLoader::succeeding_with(SyntheticImageBuilder::invalid_data())
            .with_failure(urls[1].clone(), "connectivity error: refused");
        let progress = MockProgressSink::new();

        let report = load_all(&loader, &urls, 4, None, &progress).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.outcomes[0].is_success());
        assert!(report.outcomes[0].dimensions.is_none());
        assert_eq!(
            report.outcomes[1].error.as_deref(),
            Some("connectivity error: refused")
        );
    }

    #[test]
    fn test_load_all_streams_every_outcome() {
        let loader = StubImageDataLoader::succeeding_with(SyntheticImageBuilder::green_png())
            .with_delay(Duration::from_millis(20));
        let urls = urls(5);
        let output = MockResultOutput::new();
        let progress = MockProgressSink::new();

        let report = load_all(&loader, &urls, 2, Some(&output), &progress).unwrap();

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(output.outcomes().len(), 5);
        assert_eq!(loader.requested_urls().len(), 5);
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn test_load_all_emits_progress_events() {
        let urls = urls(3);
        let loader = StubImageDataLoader::succeeding_with(SyntheticImageBuilder::red_png())
            .with_failure(urls[0].clone(), "invalid data (HTTP 404)");
        let progress = MockProgressSink::new();

        load_all(&loader, &urls, 1, None, &progress).unwrap();

        assert_eq!(progress.started_count(), 3);
        assert_eq!(progress.completed_count(), 3);
        assert_eq!(progress.failed_count(), 1);
        assert!(progress.has_finished());
        assert_eq!(progress.finished_counts(), Some((2, 1)));
    }

    #[test]
    fn test_load_all_empty_batch() {
        let loader = StubImageDataLoader::succeeding_with(Vec::new());
        let progress = MockProgressSink::new();

        let report = load_all(&loader, &[], 4, None, &progress).unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(progress.finished_counts(), Some((0, 0)));
    }

    #[test]
    fn test_load_all_reports_dropped_completions_as_failures() {
        let loader = AbandoningLoader {
            registry: TaskRegistry::new(),
            panic_in_worker: false,
        };

        let report = load_all_within_timeout(loader, urls(2));

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert!(report.outcomes[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("without delivering a result")));
    }

    #[test]
    fn test_load_all_survives_panicking_worker() {
        let loader = AbandoningLoader {
            registry: TaskRegistry::new(),
            panic_in_worker: true,
        };

        let report = load_all_within_timeout(loader, urls(2));

        assert_eq!(report.failed, 2);
        assert_eq!(report.outcomes.len(), 2);
    }
}
