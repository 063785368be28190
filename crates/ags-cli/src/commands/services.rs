use std::io::Write;

use ags_admin::{CredentialSource, ServiceDescriptor, list_services, service_status};

use crate::client::{AppContext, CliResult};
use crate::output::{render_services, render_status};

pub(crate) async fn handle_services<S: CredentialSource, W: Write>(
    ctx: &mut AppContext<S>,
    out: &mut W,
) -> CliResult<()> {
    let token = ctx.token().await?;
    let services = list_services(ctx.client(), &token).await?;
    let directory = ctx.client().config().services_directory_url();
    render_services(out, &services, &directory, ctx.output)
}

pub(crate) async fn handle_status<S: CredentialSource, W: Write>(
    ctx: &mut AppContext<S>,
    service: &ServiceDescriptor,
    out: &mut W,
) -> CliResult<()> {
    let token = ctx.token().await?;
    let status = service_status(ctx.client(), &token, service).await?;
    render_status(out, service, &status, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ags_test_support::fixtures::{AdminSite, EXPECTED_SERVICES};
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::cli::OutputFormat;
    use crate::commands::test_support::{context_for, text};

    #[tokio::test]
    async fn services_lists_catalog_rows() {
        let site = AdminSite::start().await;
        let token = site.mount_token();
        let catalog = site.mount_catalog();

        let mut ctx = context_for(&site, OutputFormat::Table);
        let mut out = Vec::new();
        handle_services(&mut ctx, &mut out)
            .await
            .expect("services listed");

        let text = text(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), EXPECTED_SERVICES.len() + 1);
        assert_eq!(lines[0], "SampleWorldCities | MapServer | /");
        assert_eq!(lines[2], "Roads | MapServer | Maps");
        assert_eq!(lines[4], "Rivers | MapServer | Hydro");
        assert!(lines[5].starts_with("5 services listed (http://127.0.0.1:6080/"));
        token.assert();
        for reserved in &catalog.reserved {
            assert_eq!(reserved.calls(), 0);
        }
    }

    #[tokio::test]
    async fn status_renders_json() {
        let site = AdminSite::start().await;
        site.mount_token();
        let status = site.server().mock(|when, then| {
            when.method(POST)
                .path("/arcgis/admin/services/Maps/Roads.MapServer/status");
            then.status(200).json_body(json!({
                "configuredState": "STARTED",
                "realTimeState": "STOPPED"
            }));
        });

        let mut ctx = context_for(&site, OutputFormat::Json);
        let mut out = Vec::new();
        let service = ServiceDescriptor::new("Maps", "Roads", "MapServer");
        handle_status(&mut ctx, &service, &mut out)
            .await
            .expect("status fetched");

        let value: serde_json::Value = serde_json::from_str(&text(out)).expect("valid JSON");
        assert_eq!(value["service"]["serviceName"], "Roads");
        assert_eq!(value["configuredState"], "STARTED");
        assert_eq!(value["realTimeState"], "STOPPED");
        status.assert();
    }
}
