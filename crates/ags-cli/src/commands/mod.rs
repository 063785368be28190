//! Command handlers grouped by concern.

pub(crate) mod lifecycle;
pub(crate) mod menu;
pub(crate) mod report;
pub(crate) mod services;

pub(crate) use lifecycle::handle_lifecycle;
pub(crate) use menu::run_menu;
pub(crate) use report::handle_report;
pub(crate) use services::{handle_services, handle_status};

#[cfg(test)]
pub(crate) mod test_support {
    use ags_admin::{AdminClient, AdminConfig, Session, StaticCredentials};
    use ags_test_support::fixtures::AdminSite;

    use crate::cli::OutputFormat;
    use crate::client::AppContext;

    pub(crate) fn context_for(
        site: &AdminSite,
        output: OutputFormat,
    ) -> AppContext<StaticCredentials> {
        let config = AdminConfig::for_host("127.0.0.1")
            .expect("valid host")
            .with_admin_url(site.admin_url());
        let client = AdminClient::new(config).expect("client builds");
        AppContext::new(
            Session::new(client, StaticCredentials::new("operator", "s3cret")),
            output,
        )
    }

    pub(crate) fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf8 output")
    }
}
