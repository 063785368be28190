use std::io::Write;

use ags_admin::{CredentialSource, build_report};

use crate::client::{AppContext, CliResult};
use crate::output::render_report;

pub(crate) async fn handle_report<S: CredentialSource, W: Write>(
    ctx: &mut AppContext<S>,
    out: &mut W,
) -> CliResult<()> {
    let token = ctx.token().await?;
    let report = build_report(ctx.client(), &token).await?;
    render_report(out, &report, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ags_test_support::fixtures::AdminSite;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::cli::OutputFormat;
    use crate::commands::test_support::{context_for, text};

    #[tokio::test]
    async fn report_prints_every_section() {
        let site = AdminSite::start().await;
        site.mount_token();
        site.mount_report();

        let mut ctx = context_for(&site, OutputFormat::Table);
        let mut out = Vec::new();
        handle_report(&mut ctx, &mut out).await.expect("report built");

        let text = text(out);
        assert!(text.starts_with("\n*-----------------------------------------------*\n"));
        assert!(text.contains("Cluster: default is STARTED\n"));
        assert!(text.contains("    Machine: GIS01.EXAMPLE.COM is STARTED. (Platform: Windows)\n"));
        assert!(text.contains("Log level: WARNING\n"));
        assert!(text.contains("License set to expire: 2023-11-14\n"));
        assert!(text.contains("Available Extensions........\n"));
    }

    #[tokio::test]
    async fn report_json_marks_failed_sections() {
        let site = AdminSite::start().await;
        site.mount_token();
        site.server().mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200).json_body(json!({"clusters": []}));
        });
        site.server().mock(|when, then| {
            when.method(POST).path("/arcgis/admin/info");
            then.status(200)
                .json_body(json!({"currentversion": "11.1", "currentbuild": "41833"}));
        });
        site.server().mock(|when, then| {
            when.method(POST).path("/arcgis/admin/logs/settings");
            then.status(200)
                .json_body(json!({"status": "error", "messages": ["Access denied"]}));
        });
        site.server().mock(|when, then| {
            when.method(POST).path("/arcgis/admin/system/licenses");
            then.status(200).json_body(json!({
                "edition": {"name": "Standard", "canExpire": false},
                "level": {"name": "Standard"},
                "extensions": []
            }));
        });

        let mut ctx = context_for(&site, OutputFormat::Json);
        let mut out = Vec::new();
        handle_report(&mut ctx, &mut out).await.expect("report built");

        let value: serde_json::Value = serde_json::from_str(&text(out)).expect("valid JSON");
        assert_eq!(value["clusters"]["available"], json!([]));
        assert_eq!(value["version"]["available"]["version"], "11.1");
        assert!(
            value["log_level"]["unavailable"]
                .as_str()
                .is_some_and(|message| message.contains("Access denied"))
        );
        assert_eq!(value["license"]["available"]["expires_on"], json!(null));
    }
}
