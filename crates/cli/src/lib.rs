use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use remap_matcher::{BatchConfig, BatchRunner, DecisionEngine};
use remap_oracle::ChatOracle;
use remap_protocol::{ResultRecord, RunMode};
use remap_search::{CandidatePool, CandidateRanker, RankPolicy, RankerConfig};
use remap_sources::{collect_sitemaps, read_old_urls, write_results, SitemapFetcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod backend;
mod config;
mod progress;
mod wizard;

pub use backend::{Backend, ORACLE_ENV};
pub use config::{AppConfig, MatchingConfig};

#[derive(Parser, Debug)]
#[command(name = "url-remap")]
#[command(
    about = "Map old site URLs onto the URLs of a new sitemap with an AI oracle",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// CSV or Excel table with the old URLs (`url` column, otherwise the first column)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Local sitemap file; repeatable
    #[arg(long = "sitemap")]
    sitemaps: Vec<PathBuf>,

    /// Remote sitemap to download into --sitemaps-dir; repeatable
    #[arg(long = "sitemap-url")]
    sitemap_urls: Vec<String>,

    /// Prompt for sitemap URLs until 'finishsitemaps'
    #[arg(long)]
    interactive_sitemaps: bool,

    /// Run the full interactive wizard (input file and sitemaps)
    #[arg(long)]
    interactive: bool,

    /// Directory for downloaded sitemaps
    #[arg(long, default_value = "sitemaps")]
    sitemaps_dir: PathBuf,

    /// TOML config with the [ai] table and an optional [matching] table
    #[arg(long)]
    config: PathBuf,

    /// Output table; `.xlsx` writes Excel with highlighted rows, `.json` JSON, anything else CSV
    #[arg(long, default_value = "matched_urls.xlsx")]
    out: PathBuf,

    /// test processes only the first rows, full processes all of them
    #[arg(long, value_enum, default_value_t = ModeArg::Test)]
    mode: ModeArg,

    /// Confidence below which a row is flagged
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Shortlist size sent to the oracle
    #[arg(long)]
    top_k: Option<usize>,

    /// Candidate ranking policy: segment_aware | slug_only
    #[arg(long)]
    policy: Option<RankPolicy>,

    /// Skip the oracle round-trip check before matching
    #[arg(long)]
    skip_connection_test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors and hide the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Test,
    Full,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Test => RunMode::Test,
            ModeArg::Full => RunMode::Full,
        }
    }
}

/// Matching parameters after merging flags over the `[matching]` table.
#[derive(Debug, Clone)]
struct RunSettings {
    ranker: RankerConfig,
    batch: BatchConfig,
    max_output_tokens: u32,
}

impl RunSettings {
    fn resolve(cli: &Cli, matching: &MatchingConfig) -> Result<Self> {
        let mut ranker = RankerConfig::for_policy(cli.policy.unwrap_or(matching.policy));
        if let Some(k) = cli.top_k.or(matching.top_k) {
            anyhow::ensure!(k > 0, "--top-k must be at least 1");
            ranker = ranker.with_k(k);
        }

        let min_confidence = cli.min_confidence.unwrap_or(matching.min_confidence);
        anyhow::ensure!(
            (0.0..=1.0).contains(&min_confidence),
            "--min-confidence must be within [0, 1], got {min_confidence}"
        );

        Ok(Self {
            ranker,
            batch: BatchConfig {
                mode: cli.mode.into(),
                test_limit: matching.test_limit,
                min_confidence,
                throttle: Duration::from_millis(matching.throttle_ms),
            },
            max_output_tokens: matching.max_output_tokens,
        })
    }
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::load(&cli.config)?;
    let settings = RunSettings::resolve(&cli, &config.matching)?;

    if cli.interactive {
        run_interactive(&cli, &config, &settings).await
    } else {
        run_batch(&cli, &config, &settings).await
    }
}

async fn run_batch(cli: &Cli, config: &AppConfig, settings: &RunSettings) -> Result<()> {
    let input = cli
        .input
        .as_deref()
        .context("--input is required unless --interactive is used")?;

    let backend = Backend::from_config(&config.ai)?;
    for (label, value) in backend.describe(&config.ai) {
        log::info!("{label}: {value}");
    }
    if cli.skip_connection_test {
        log::info!("Skipping connection test");
    } else {
        backend
            .test_connection()
            .await
            .context("Oracle connection test failed; check the [ai] settings")?;
        log::info!("Connection test successful");
    }

    let mut sitemap_paths = cli.sitemaps.clone();
    let mut remote = cli.sitemap_urls.clone();
    if cli.interactive_sitemaps {
        remote.extend(wizard::ask_sitemap_urls()?);
    }
    if !remote.is_empty() {
        log::info!("Fetching {} sitemap URLs", remote.len());
        let fetcher = SitemapFetcher::new().context("Failed to build HTTP client")?;
        sitemap_paths.extend(fetcher.fetch_all(&remote, &cli.sitemaps_dir).await);
    }
    anyhow::ensure!(
        !sitemap_paths.is_empty(),
        "No sitemaps provided. Use --sitemap, --sitemap-url, --interactive-sitemaps or --interactive"
    );

    match_and_export(
        backend.into_oracle(),
        input,
        &sitemap_paths,
        settings,
        &cli.out,
        cli.quiet,
    )
    .await
}

async fn run_interactive(cli: &Cli, config: &AppConfig, settings: &RunSettings) -> Result<()> {
    let fetcher = SitemapFetcher::new().context("Failed to build HTTP client")?;
    let Some(inputs) = wizard::run(&cli.sitemaps_dir, &fetcher).await? else {
        return Ok(());
    };

    let rule = "=".repeat(60);
    println!("\n{rule}\nInitializing AI client...\n{rule}");
    let backend = Backend::from_config(&config.ai)?;
    for (label, value) in backend.describe(&config.ai) {
        println!("{label}: {value}");
    }

    if !cli.skip_connection_test {
        println!("\nTesting connection...");
        match backend.test_connection().await {
            Ok(()) => println!("{}\n", style("Connection test successful!").green()),
            Err(err) => {
                println!("\n{} {err:#}", style("Connection test failed:").red().bold());
                println!("   - Verify the provider is set correctly");
                println!("   - Verify the API key is correct");
                println!("   - Verify the base URL is correct\n");
                let proceed = dialoguer::Confirm::new()
                    .with_prompt("Continue anyway?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !proceed {
                    println!("Exiting.");
                    return Ok(());
                }
            }
        }
    }

    match_and_export(
        backend.into_oracle(),
        &inputs.input,
        &inputs.sitemaps,
        settings,
        &cli.out,
        cli.quiet,
    )
    .await
}

async fn match_and_export(
    oracle: Box<dyn ChatOracle>,
    input: &Path,
    sitemap_paths: &[PathBuf],
    settings: &RunSettings,
    out: &Path,
    quiet: bool,
) -> Result<()> {
    let old_urls = read_old_urls(input)
        .with_context(|| format!("Failed to read old URLs from {}", input.display()))?;
    log::info!("Parsing {} sitemap file(s)", sitemap_paths.len());
    let pool = CandidatePool::from_urls(collect_sitemaps(sitemap_paths));
    log::info!(
        "Old URLs: {}, new URLs (unique): {}",
        old_urls.len(),
        pool.len()
    );
    if pool.is_empty() {
        log::warn!("No candidate URLs found in the sitemaps; every row will fall back");
    }

    let runner = BatchRunner::new(
        CandidateRanker::new(settings.ranker),
        DecisionEngine::new(oracle).with_max_output_tokens(settings.max_output_tokens),
        settings.batch.clone(),
    );
    let total = runner.select_rows(&old_urls).len();
    let bar = progress::row_progress(total as u64, quiet);
    let records = runner
        .run_with(&old_urls, &pool, |_, record| {
            if record.low_confidence {
                bar.set_message("Matching (low confidence seen)");
            }
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();

    write_results(out, &records)
        .with_context(|| format!("Failed to write results to {}", out.display()))?;
    print_summary(&records, out);
    Ok(())
}

fn print_summary(records: &[ResultRecord], out: &Path) {
    let low = records.iter().filter(|r| r.low_confidence).count();
    let source_dups = records.iter().filter(|r| r.source_dup_of.is_some()).count();
    let dest_dups = records.iter().filter(|r| r.dest_dup_of.is_some()).count();
    println!(
        "Matched {} rows -> {} (low confidence: {low}, repeated old URLs: {source_dups}, repeated destinations: {dest_dups})",
        records.len(),
        out.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["url-remap", "--config", "cfg.toml"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.out, PathBuf::from("matched_urls.xlsx"));
        assert_eq!(cli.sitemaps_dir, PathBuf::from("sitemaps"));
        assert!(matches!(cli.mode, ModeArg::Test));
        assert!(cli.sitemaps.is_empty());
    }

    #[test]
    fn repeatable_sources() {
        let cli = parse(&[
            "--sitemap",
            "a.xml",
            "--sitemap",
            "b.xml",
            "--sitemap-url",
            "https://example.com/sitemap.xml",
        ]);
        assert_eq!(cli.sitemaps, vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]);
        assert_eq!(cli.sitemap_urls.len(), 1);
    }

    #[test]
    fn config_flag_is_required() {
        assert!(Cli::try_parse_from(["url-remap", "--input", "old.csv"]).is_err());
    }

    #[test]
    fn flags_override_matching_table() {
        let matching = MatchingConfig {
            policy: RankPolicy::SegmentAware,
            top_k: Some(12),
            min_confidence: 0.4,
            test_limit: 7,
            throttle_ms: 0,
            ..MatchingConfig::default()
        };

        let settings = RunSettings::resolve(&parse(&[]), &matching).unwrap();
        assert_eq!(settings.ranker.k, 12);
        assert_eq!(settings.batch.min_confidence, 0.4);
        assert_eq!(settings.batch.test_limit, 7);
        assert_eq!(settings.batch.throttle, Duration::ZERO);

        let cli = parse(&[
            "--policy",
            "slug_only",
            "--top-k",
            "3",
            "--min-confidence",
            "0.9",
            "--mode",
            "full",
        ]);
        let settings = RunSettings::resolve(&cli, &matching).unwrap();
        assert_eq!(settings.ranker.policy, RankPolicy::SlugOnly);
        assert_eq!(settings.ranker.k, 3);
        assert_eq!(settings.batch.min_confidence, 0.9);
        assert_eq!(settings.batch.mode, RunMode::Full);
    }

    #[test]
    fn policy_default_k_applies_without_override() {
        let cli = parse(&["--policy", "slug_only"]);
        let settings = RunSettings::resolve(&cli, &MatchingConfig::default()).unwrap();
        assert_eq!(settings.ranker, RankerConfig::for_policy(RankPolicy::SlugOnly));
    }

    #[test]
    fn rejects_out_of_range_overrides() {
        let defaults = MatchingConfig::default();
        assert!(RunSettings::resolve(&parse(&["--top-k", "0"]), &defaults).is_err());
        assert!(RunSettings::resolve(&parse(&["--min-confidence", "2"]), &defaults).is_err());
    }
}
