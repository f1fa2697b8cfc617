// src/config.rs
use crate::constants::{
    ACCESS_TOKEN_ENV, ALL_WORKSPACES, DEFAULT_PARALLEL_WORKERS, DEFAULT_SCHEMA_NAME,
    FABRIC_API_BASE_URL, POWERBI_API_BASE_URL,
};
use crate::error::{AppError, ConfigError};
use crate::extract::Stage;
use crate::types::{AccessToken, SchemaName, WorkerCount, WorkspaceFilter};
use clap::Parser;
use std::path::PathBuf;

/// Parsed command-line input.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Extracts Power BI and Fabric governance metadata into tables", long_about = None)]
pub struct CommandLineInput {
    /// Destination schema for every table (letters, digits and underscores)
    #[arg(long, default_value = DEFAULT_SCHEMA_NAME)]
    pub schema: String,

    /// Workspace name to include (repeatable, at most 10); "All" scans every workspace
    #[arg(short = 'w', long = "workspace", default_value = ALL_WORKSPACES)]
    pub workspaces: Vec<String>,

    /// Number of concurrent detail fetches (1-10)
    #[arg(short = 'j', long, default_value_t = DEFAULT_PARALLEL_WORKERS)]
    pub parallel_workers: usize,

    /// Root directory the tables are written under
    #[arg(short = 'o', long, default_value = "./lakehouse")]
    pub output_dir: PathBuf,

    /// Stage to run (repeatable); all stages when omitted
    #[arg(long = "stage", value_enum)]
    pub stages: Vec<Stage>,

    /// Refresh the SQL endpoint metadata of this workspace after writing
    #[arg(long, value_name = "WORKSPACE_ID")]
    pub refresh_sql_endpoints: Option<String>,

    /// Base URL of the Power BI REST API
    #[arg(long, default_value = POWERBI_API_BASE_URL)]
    pub powerbi_base_url: String,

    /// Base URL of the Fabric REST API
    #[arg(long, default_value = FABRIC_API_BASE_URL)]
    pub fabric_base_url: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved run configuration, validated before any network call.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub schema: SchemaName,
    pub workspaces: WorkspaceFilter,
    pub workers: WorkerCount,
    pub output_dir: PathBuf,
    pub stages: Vec<Stage>,
    pub refresh_sql_endpoints: Option<String>,
    pub powerbi_base_url: String,
    pub fabric_base_url: String,
    pub access_token: AccessToken,
    pub verbose: bool,
}

impl ExtractionConfig {
    /// Resolves a complete configuration from CLI input and the environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let token = std::env::var(ACCESS_TOKEN_ENV).map_err(|_| {
            ConfigError::Missing(format!("{} environment variable not set", ACCESS_TOKEN_ENV))
        })?;
        Self::resolve_with_token(cli, &token)
    }

    /// Resolves with an explicitly supplied access token.
    pub fn resolve_with_token(cli: CommandLineInput, token: &str) -> Result<Self, AppError> {
        let schema = SchemaName::new(cli.schema)?;
        let workspaces = WorkspaceFilter::from_names(cli.workspaces)?;
        let workers = WorkerCount::new(cli.parallel_workers)?;
        let access_token = AccessToken::new(token)?;

        let stages = if cli.stages.is_empty() {
            Stage::ALL.to_vec()
        } else {
            Stage::ALL
                .into_iter()
                .filter(|stage| cli.stages.contains(stage))
                .collect()
        };

        let refresh_sql_endpoints = cli
            .refresh_sql_endpoints
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(ExtractionConfig {
            schema,
            workspaces,
            workers,
            output_dir: cli.output_dir,
            stages,
            refresh_sql_endpoints,
            powerbi_base_url: cli.powerbi_base_url,
            fabric_base_url: cli.fabric_base_url,
            access_token,
            verbose: cli.verbose,
        })
    }
}
