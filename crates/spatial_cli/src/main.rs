//! Command-line entry point for the spatial engine.
//!
//! # Responsibility
//! - Resolve configuration from the environment and flag overrides.
//! - Open the store, run one resource operation, print its JSON outcome.
//!
//! # Invariants
//! - stdout carries exactly one JSON document per successful run.
//! - Failures print `{status, error}` to stderr and exit non-zero.

mod cli;
mod error;

use clap::Parser;
use cli::{Cli, Commands, ResourceCommand};
use error::CliError;
use log::info;
use serde_json::{json, Value};
use spatial_core::config::parse_pool_size;
use spatial_core::{
    health_check, init_logging, open_pool, open_pool_in_memory, CreateResource, ListQuery,
    NearestQuery, PatchResource, ResourceKind, ResourceService, ServiceError, SpatialConfig,
    SqliteGateway,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Successful result: status plus optional body.
struct Outcome {
    status: u16,
    body: Option<Value>,
}

impl Outcome {
    fn ok(body: impl serde::Serialize) -> Result<Self, CliError> {
        Ok(Self {
            status: 200,
            body: Some(serde_json::to_value(body)?),
        })
    }

    fn created(body: impl serde::Serialize) -> Result<Self, CliError> {
        Ok(Self {
            status: 201,
            ..Self::ok(body)?
        })
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => {
            println!("{}", json!({"status": outcome.status, "body": outcome.body}));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", json!({"status": err.status_code(), "error": err.to_string()}));
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let pool = match config.db_path.as_deref() {
        Some(path) => open_pool(path, config.pool_size)?,
        None => open_pool_in_memory()?,
    };
    let gateway = SqliteGateway::new(Arc::new(pool));

    match cli.command {
        Commands::Health => {
            health_check(&gateway).map_err(ServiceError::from)?;
            info!("event=health module=cli status=ok");
            Outcome::ok(json!({"ok": true, "ping": spatial_core::ping()}))
        }
        Commands::Points(command) => {
            run_resource(ResourceService::new(gateway, ResourceKind::Point), command)
        }
        Commands::Polygons(command) => {
            run_resource(ResourceService::new(gateway, ResourceKind::Polygon), command)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<SpatialConfig, CliError> {
    let mut config = SpatialConfig::from_env()?;
    if let Some(db_path) = cli.db_path.clone() {
        config.db_path = Some(db_path);
    }
    if let Some(raw) = cli.pool_size.as_deref() {
        config.pool_size = parse_pool_size(raw)?;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(log_dir) = cli.log_dir.clone() {
        config.log_dir = Some(log_dir);
    }
    Ok(config)
}

fn run_resource(
    service: ResourceService<SqliteGateway>,
    command: ResourceCommand,
) -> Result<Outcome, CliError> {
    match command {
        ResourceCommand::Create { payload } => {
            let payload: CreateResource = serde_json::from_str(&payload)?;
            Outcome::created(service.create(&payload)?)
        }
        ResourceCommand::List {
            limit,
            offset,
            bbox,
            within,
            intersects,
        } => Outcome::ok(service.list(&ListQuery {
            limit,
            offset,
            bbox,
            within,
            intersects,
        })?),
        ResourceCommand::Get { id } => Outcome::ok(service.get(id)?),
        ResourceCommand::Patch { id, payload } => {
            let payload: PatchResource = serde_json::from_str(&payload)?;
            Outcome::ok(service.patch(id, &payload)?)
        }
        ResourceCommand::Delete { id } => {
            service.delete(id)?;
            Ok(Outcome::no_content())
        }
        ResourceCommand::Nearest { lon, lat, limit } => {
            Outcome::ok(service.nearest(&NearestQuery { lon, lat, limit })?)
        }
        ResourceCommand::Contains { id } => Outcome::ok(service.contained_points(id)?),
    }
}
