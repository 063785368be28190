//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use ags_admin::{
    BatchSummary, LifecycleOperation, OperationOutcome, ServerReport, ServiceDescriptor,
    ServiceStatus,
};
use anyhow::anyhow;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Divider printed around the menu and before reports.
pub(crate) const DIVIDER: &str = "\n*-----------------------------------------------*\n";

pub(crate) fn render_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    writeln!(out, "{text}")?;
    Ok(())
}

#[derive(Serialize)]
struct ServiceListing<'a> {
    directory: &'a str,
    services: &'a [ServiceDescriptor],
}

pub(crate) fn render_services<W: Write>(
    out: &mut W,
    services: &[ServiceDescriptor],
    directory: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(
            out,
            &ServiceListing {
                directory,
                services,
            },
        ),
        OutputFormat::Table => {
            for service in services {
                writeln!(out, "{}", service_row(service))?;
            }
            writeln!(out, "{} services listed ({directory})", services.len())?;
            Ok(())
        }
    }
}

pub(crate) fn service_row(service: &ServiceDescriptor) -> String {
    format!(
        "{} | {} | {}",
        service.service_name, service.service_type, service.folder_name
    )
}

/// Lines printed for one outcome; `url` is the endpoint the operation hit.
pub(crate) fn outcome_lines(outcome: &OperationOutcome, url: &str) -> Vec<String> {
    match outcome.server_message() {
        None => vec![format!(
            "{} successfully performed on {}",
            outcome.operation, outcome.service.service_name
        )],
        Some(message) => vec![
            "Failed to perform operation. Returned message from the server:".to_string(),
            message.to_string(),
            url.to_string(),
        ],
    }
}

pub(crate) fn summary_line(operation: LifecycleOperation, summary: &BatchSummary) -> String {
    format!(
        "{operation}: {} of {} services succeeded, {} failed",
        summary.succeeded, summary.total, summary.failed
    )
}

#[derive(Serialize)]
struct BatchReport<'a> {
    operation: LifecycleOperation,
    summary: BatchSummary,
    outcomes: &'a [OperationOutcome],
}

pub(crate) fn render_batch<W: Write>(
    out: &mut W,
    operation: LifecycleOperation,
    outcomes: &[OperationOutcome],
    format: OutputFormat,
) -> CliResult<()> {
    let summary = BatchSummary::from_outcomes(outcomes);
    match format {
        OutputFormat::Json => render_json(
            out,
            &BatchReport {
                operation,
                summary,
                outcomes,
            },
        ),
        OutputFormat::Table => {
            writeln!(out, "{}", summary_line(operation, &summary))?;
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct StatusView<'a> {
    service: &'a ServiceDescriptor,
    #[serde(flatten)]
    status: &'a ServiceStatus,
}

pub(crate) fn render_status<W: Write>(
    out: &mut W,
    service: &ServiceDescriptor,
    status: &ServiceStatus,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(out, &StatusView { service, status }),
        OutputFormat::Table => {
            writeln!(out, "service: {service}")?;
            writeln!(out, "configured: {}", status.configured_state)?;
            writeln!(out, "running: {}", status.real_time_state)?;
            Ok(())
        }
    }
}

pub(crate) fn render_report<W: Write>(
    out: &mut W,
    report: &ServerReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(out, report),
        OutputFormat::Table => {
            writeln!(out, "{DIVIDER}")?;
            write!(out, "{report}")?;
            Ok(())
        }
    }
}
