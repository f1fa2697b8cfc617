// src/main.rs

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use fabric_governance::constants::{HEARTBEAT_INTERVAL, REPORT_DATE_FORMAT};
use fabric_governance::{
    refresh_sql_endpoints, CommandLineInput, DirectorySink, ExtractionConfig, ExtractionContext,
    ExtractionSummary, FabricHttpClient, HeartbeatGuard, Orchestrator, PbirLegacyInspector,
    TmslModelInspector,
};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::time::Instant;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("fabric_governance.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {T} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn log_banner(config: &ExtractionConfig) {
    log::info!("{}", "=".repeat(80));
    log::info!("Power BI / Fabric Governance Metadata Extraction");
    log::info!("{}", "=".repeat(80));
    log::info!("Schema: {}", config.schema);
    log::info!("Workspaces: {}", config.workspaces);
    log::info!("Parallel workers: {}", config.workers);
    log::info!(
        "Stages: {}",
        config
            .stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!("Output: {}", config.output_dir.display());
}

/// Runs the selected stages, then the optional SQL endpoint refresh.
fn execute_extraction(config: &ExtractionConfig) -> anyhow::Result<ExtractionSummary> {
    let started = Instant::now();
    log_banner(config);
    let _heartbeat = HeartbeatGuard::start(started, HEARTBEAT_INTERVAL);

    let client = FabricHttpClient::new(
        &config.access_token,
        &config.powerbi_base_url,
        &config.fabric_base_url,
    )
    .context("Failed to create the API client")?;
    let models = TmslModelInspector::new(&client);
    let reports = PbirLegacyInspector::new(&client);
    let sink = DirectorySink::new(&config.output_dir, &config.schema);

    let context = ExtractionContext {
        api: &client,
        workers: config.workers,
        report_date: Local::now().format(REPORT_DATE_FORMAT).to_string(),
        started,
    };
    let summary = Orchestrator::new(context, &models, &reports, &sink)
        .run(&config.workspaces, &config.stages)
        .context("Extraction aborted")?;

    if let Some(workspace_id) = &config.refresh_sql_endpoints {
        log::info!("Refreshing SQL endpoint metadata for workspace {}", workspace_id);
        let refresh = refresh_sql_endpoints(&client, workspace_id);
        log::info!(
            "SQL endpoints refreshed: {}/{}",
            refresh.refreshed,
            refresh.found
        );
    }

    Ok(summary)
}

fn report_summary(summary: &ExtractionSummary) {
    log::info!("{}", "=".repeat(80));
    log::info!("EXTRACTION SUMMARY");
    log::info!("{}", "=".repeat(80));
    log::info!("Workspaces processed: {}", summary.workspaces);
    for (table, rows) in &summary.rows_per_table {
        log::info!("  {:<28} {:>8} rows", table, rows);
    }
    log::info!(
        "Tables written: {} ({} rows total)",
        summary.tables_written(),
        summary.total_rows()
    );
    log::info!(
        "Detail tasks: {} submitted, {} failed; {} soft errors; {} failed listings",
        summary.stats.dispatch.submitted,
        summary.stats.dispatch.failed,
        summary.stats.soft_errors,
        summary.stats.listing_failures
    );
    for failed in &summary.sink.failed {
        log::error!("  ✗ {}: {}", failed.table, failed.error);
    }
    log::info!(
        "Total runtime: {:.2} minutes",
        summary.elapsed.as_secs_f64() / 60.0
    );
}

fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = ExtractionConfig::resolve(cli).context("Invalid configuration")?;

    let summary = execute_extraction(&config)?;
    report_summary(&summary);

    if !summary.sink.is_success() {
        bail!("{} table(s) could not be written", summary.sink.failed.len());
    }

    Ok(())
}
