use std::io::{self, Write};

use ags_admin::{
    AdminClient, CredentialSource, LifecycleOperation, OperationOutcome, ServiceTarget, apply,
};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliResult};
use crate::output::{outcome_lines, render_batch};

/// Apply `operation` and print each outcome as it arrives, then the summary.
///
/// Per-service failures are printed, not returned; the command still
/// succeeds once every service has been attempted.
pub(crate) async fn handle_lifecycle<S: CredentialSource, W: Write>(
    ctx: &mut AppContext<S>,
    operation: LifecycleOperation,
    target: ServiceTarget,
    out: &mut W,
) -> CliResult<()> {
    let token = ctx.token().await?;
    let client = ctx.client();
    let format = ctx.output;
    let mut write_error: Option<io::Error> = None;

    let outcomes = apply(client, &token, operation, target, |outcome| {
        if format != OutputFormat::Table || write_error.is_some() {
            return;
        }
        let url = operation_url(client, outcome);
        for line in outcome_lines(outcome, &url) {
            if let Err(err) = writeln!(out, "{line}") {
                write_error = Some(err);
                return;
            }
        }
    })
    .await?;

    if let Some(err) = write_error {
        return Err(err.into());
    }
    render_batch(out, operation, &outcomes, format)
}

fn operation_url(client: &AdminClient, outcome: &OperationOutcome) -> String {
    let path = outcome.service.operation_path(outcome.operation);
    match client.endpoint(&path) {
        Ok(url) => url.to_string(),
        Err(_) => path,
    }
}
