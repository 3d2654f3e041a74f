// ASTRA - GPL-3.0-or-later
// This file is part of ASTRA.
//
// Copyright (C) 2025 ASTRA Collaboration
//
// ASTRA is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ASTRA is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ASTRA.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use astra::anomaly::create_scorer;
use astra::anomaly::scorer::RuleSet;
use astra::config::AstraConfig;
use astra::crossmatch::GaiaTapClient;
use astra::package::{
    create_discovery_package, package_top_discoveries, prepare_output_dir, write_results,
    DiscoveryRequest,
};
use astra::pipeline::{self_check, Pipeline, PipelineOutcome};
use astra::report::render_summary;
use astra::source::{PageFetcher, RochesterCoordinateSource, RochesterTableSource};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("ASTRA_GIT_REVISION"), ")");

#[derive(Parser, Debug)]
#[command(name = "astra")]
#[command(author = "ASTRA Collaboration")]
#[command(version = VERSION)]
#[command(about = "Find scientifically interesting transients in public alert lists", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the latest transients, score them and write a report
    Run(RunArgs),
    /// Write a publication package for a single object
    Package(PackageArgs),
    /// Package the top objects of an existing report
    PackageTop(PackageTopArgs),
    /// Offline self-test of scoring and reporting
    Check,
    /// Write the effective configuration to the user config file
    InitConfig,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Rule set: baseline or extended
    #[arg(long, default_value_t = RuleSet::Baseline)]
    rules: RuleSet,

    /// Minimum score to report (overrides the config)
    #[arg(long)]
    threshold: Option<f64>,

    /// Output directory, or "auto" for a timestamped run directory
    #[arg(short, long, default_value = "auto")]
    output: String,

    /// Skip the Gaia cross-match
    #[arg(long)]
    no_crossmatch: bool,

    /// Run cross-match lookups in parallel
    #[arg(long)]
    parallel: bool,

    /// Also write discovery packages for the N best anomalies
    #[arg(long, value_name = "N")]
    package_top: Option<usize>,
}

#[derive(Args, Debug)]
struct PackageArgs {
    /// Object ID (e.g. AT2025abao)
    #[arg(long)]
    object: String,

    /// Anomaly score
    #[arg(long)]
    score: f64,

    /// Discovery magnitude
    #[arg(long)]
    mag: Option<f64>,

    /// Object type (e.g. LRN, CV, unknown)
    #[arg(long = "type")]
    type_tag: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    ra: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    dec: Option<String>,

    /// Directory that receives the package
    #[arg(long, default_value = "discoveries")]
    root: PathBuf,
}

#[derive(Args, Debug)]
struct PackageTopArgs {
    /// Rendered ASTRA report
    report: PathBuf,

    /// Output directory for the packages
    #[arg(short, long, default_value = "packaged_discoveries")]
    output: PathBuf,

    /// Maximum number of discoveries to package
    #[arg(short, long, default_value_t = 3)]
    max: usize,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AstraConfig> {
    match path {
        Some(path) => AstraConfig::load_from(path).context("Failed to load configuration"),
        None => Ok(AstraConfig::load()),
    }
}

fn run(args: &RunArgs, config: &AstraConfig) -> Result<ExitCode> {
    let fetcher = PageFetcher::new(config.http_timeout()).context("Failed to set up HTTP client")?;
    let primary = RochesterCoordinateSource::new(fetcher.clone(), &config.primary_url, config.max_entries);
    let fallback = RochesterTableSource::new(fetcher, &config.fallback_url);

    let mut pipeline = Pipeline::new(Box::new(primary), create_scorer(args.rules))
        .with_fallback(Box::new(fallback))
        .with_threshold(args.threshold.unwrap_or(config.threshold))
        .with_parallel_enrichment(args.parallel || config.parallel_enrichment)
        .with_follow_up_count(config.follow_up_count);

    if args.no_crossmatch {
        tracing::info!("Gaia cross-match disabled on the command line");
    } else {
        match GaiaTapClient::new(&config.gaia_tap_url, config.search_radius_arcsec, config.http_timeout()) {
            Ok(client) => pipeline = pipeline.with_cross_matcher(Box::new(client)),
            Err(e) => tracing::info!("Gaia cross-match unavailable: {e}"),
        }
    }

    println!("ASTRA {} discovery run", args.rules.title());
    let now = Local::now();
    let generated_at = now.format("%Y-%m-%d %H:%M:%S").to_string();

    let bundle = match pipeline.run(&generated_at).context("Transient fetch failed")? {
        PipelineOutcome::Completed(bundle) => bundle,
        PipelineOutcome::NoData => {
            println!("No transients found in primary or fallback source");
            return Ok(ExitCode::FAILURE);
        }
    };

    let base = std::env::current_dir().context("Failed to determine working directory")?;
    let dir = prepare_output_dir(&args.output, &base, args.rules, now)?;
    let artifacts = write_results(&bundle, &dir)?;

    println!();
    print!("{}", render_summary(bundle.transients.len(), &bundle.anomalies, bundle.rule_set));
    println!();
    println!("Report:    {}", artifacts.report.display());
    println!("Catalog:   {}", artifacts.catalog.display());
    println!("Anomalies: {}", artifacts.anomalies.display());
    println!("Summary:   {}", artifacts.summary.display());

    if let Some(count) = args.package_top {
        let root = dir.join("discoveries");
        for anomaly in bundle.anomalies.iter().take(count) {
            let package =
                create_discovery_package(&DiscoveryRequest::from_anomaly(anomaly), &root, Utc::now())?;
            println!("Packaged {} at {}", anomaly.id, package.dir.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn package(args: &PackageArgs) -> Result<ExitCode> {
    let request = DiscoveryRequest {
        id: args.object.clone(),
        score: args.score,
        magnitude: args.mag,
        type_tag: args.type_tag.clone(),
        ra: args.ra.clone(),
        dec: args.dec.clone(),
    };
    let package = create_discovery_package(&request, &args.root, Utc::now())?;

    println!("Packaged discovery at {}", package.dir.display());
    println!();
    println!("Files created:");
    for file in &package.files {
        if let Some(name) = file.file_name() {
            println!("  • {}", name.to_string_lossy());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn package_top(args: &PackageTopArgs) -> Result<ExitCode> {
    let report = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Report file not found: {}", args.report.display()))?;

    println!("Packaging Top Discoveries");
    println!("Reading report: {}", args.report.display());
    println!("Output directory: {}", args.output.display());
    println!();

    let Some(summary) = package_top_discoveries(
        &report,
        &args.report.display().to_string(),
        &args.output,
        args.max,
        Local::now(),
    )?
    else {
        println!("No high-priority discoveries found in report");
        return Ok(ExitCode::FAILURE);
    };

    println!("Packages:");
    for (rank, id) in summary.packages.iter().enumerate() {
        println!("  {}. {id}", rank + 1);
    }

    println!();
    println!("Successfully packaged {} discoveries", summary.total_discoveries);
    println!("Location: {}", args.output.display());
    Ok(ExitCode::SUCCESS)
}

/// Score the reference candidates with both rule sets and render a report, no network
fn check() -> ExitCode {
    println!("ASTRA {VERSION}");
    println!();

    let mut ready = true;
    for rule_set in [RuleSet::Baseline, RuleSet::Extended] {
        let result = self_check(rule_set);
        ready &= result.passed;
        println!(
            "{} {} rule set: {} anomalies",
            if result.passed { "✓" } else { "✗" },
            rule_set.title(),
            result.anomalies
        );
    }

    match AstraConfig::config_path() {
        Some(path) => println!("✓ Config path: {}", path.display()),
        None => println!("- No user config directory on this system"),
    }

    println!();
    if ready {
        println!("ASTRA IS READY");
        ExitCode::SUCCESS
    } else {
        println!("ASTRA SELF-TEST FAILED");
        ExitCode::FAILURE
    }
}

fn init_config(config: &AstraConfig) -> Result<ExitCode> {
    let path = config.save().context("Failed to save configuration")?;
    println!("Configuration written to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn dispatch(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Run(args) => run(args, &config),
        Command::Package(args) => package(args),
        Command::PackageTop(args) => package_top(args),
        Command::Check => Ok(check()),
        Command::InitConfig => init_config(&config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::debug!("ASTRA starting up (version {VERSION})");

    match dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
