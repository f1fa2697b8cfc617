// tests/unit/configuration.rs
//! Configuration validation happens before any remote call.

use clap::Parser;
use fabric_governance::{
    AppError, CommandLineInput, ConfigError, ExtractionConfig, SchemaName, WorkerCount,
    WorkspaceFilter,
};
use pretty_assertions::assert_eq;

fn cli(args: &[&str]) -> CommandLineInput {
    let argv = std::iter::once("fabric-governance").chain(args.iter().copied());
    CommandLineInput::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn worker_count_bounds() {
    assert!(WorkerCount::new(1).is_ok());
    assert!(WorkerCount::new(10).is_ok());
    assert_eq!(
        WorkerCount::new(0),
        Err(ConfigError::WorkerCountOutOfRange { actual: 0, min: 1, max: 10 })
    );
    assert_eq!(
        WorkerCount::new(11),
        Err(ConfigError::WorkerCountOutOfRange { actual: 11, min: 1, max: 10 })
    );
}

#[test]
fn workspace_filter_rules() {
    assert_eq!(WorkspaceFilter::from_names(vec![]), Err(ConfigError::EmptyWorkspaceFilter));
    assert_eq!(
        WorkspaceFilter::from_names(vec!["all".to_string()]),
        Ok(WorkspaceFilter::All)
    );

    let eleven: Vec<String> = (0..11).map(|i| format!("ws{}", i)).collect();
    assert_eq!(
        WorkspaceFilter::from_names(eleven),
        Err(ConfigError::TooManyWorkspaces { actual: 11, max: 10 })
    );

    let named = WorkspaceFilter::from_names(vec!["Finance".to_string()]).expect("valid filter");
    assert!(named.admits("Finance"));
    assert!(!named.admits("finance"));
}

#[test]
fn schema_name_rules() {
    assert!(SchemaName::new("gov_meta_01").is_ok());
    assert_eq!(SchemaName::new(""), Err(ConfigError::EmptySchemaName));
    assert_eq!(
        SchemaName::new("gov meta"),
        Err(ConfigError::InvalidSchemaName("gov meta".to_string()))
    );
}

#[test]
fn zero_workers_fail_resolution() {
    let result = ExtractionConfig::resolve_with_token(cli(&["--parallel-workers", "0"]), "token");
    assert!(matches!(
        result,
        Err(AppError::Configuration(ConfigError::WorkerCountOutOfRange { actual: 0, .. }))
    ));
}

#[test]
fn sql_endpoint_refresh_is_opt_in() {
    let off = ExtractionConfig::resolve_with_token(cli(&[]), "token").expect("valid");
    assert_eq!(off.refresh_sql_endpoints, None);

    let on = ExtractionConfig::resolve_with_token(
        cli(&["--refresh-sql-endpoints", "ws-lakehouse"]),
        "token",
    )
    .expect("valid");
    assert_eq!(on.refresh_sql_endpoints.as_deref(), Some("ws-lakehouse"));
}
