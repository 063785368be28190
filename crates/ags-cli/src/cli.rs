//! Command-line surface and dispatch for the operator console.

use std::io;
use std::time::Duration;

use ags_admin::config::{DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT, DEFAULT_TOKEN_EXPIRATION_MINUTES};
use ags_admin::{AdminClient, AdminConfig, LifecycleOperation, ServiceDescriptor, ServiceTarget, Session};
use ags_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_version, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use url::Url;

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{handle_lifecycle, handle_report, handle_services, handle_status, run_menu};
use crate::prompt::{PromptCredentials, resolve_host};

/// Parses CLI arguments, executes the requested command and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let format = cli
        .log_format
        .as_deref()
        .map_or_else(LogFormat::infer, LogFormat::from_name);
    let logging = LoggingConfig {
        level: &cli.log_level,
        format,
        build_version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }
    debug!(version = build_version(), "console starting");

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    // Validate arguments before prompting for anything.
    let action = cli.command.as_ref().map_or(Ok(Action::Menu), Command::action)?;

    let config = build_config(&cli)?;
    debug!(admin_url = %config.admin_url, "admin endpoint resolved");
    let client = AdminClient::new(config)?;
    let source = PromptCredentials::new(cli.username, cli.password);
    let mut ctx = AppContext::new(Session::new(client, source), cli.output);
    let mut out = io::stdout();

    match action {
        Action::Services => handle_services(&mut ctx, &mut out).await,
        Action::Lifecycle(operation, target) => {
            handle_lifecycle(&mut ctx, operation, target, &mut out).await
        }
        Action::Status(service) => handle_status(&mut ctx, &service, &mut out).await,
        Action::Report => handle_report(&mut ctx, &mut out).await,
        Action::Menu => {
            // Credentials are collected before stdin is handed to the menu.
            ctx.token().await?;
            run_menu(&mut ctx, io::stdin().lock(), &mut out).await
        }
    }
}

/// A parsed command with its arguments validated.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Services,
    Lifecycle(LifecycleOperation, ServiceTarget),
    Status(ServiceDescriptor),
    Report,
    Menu,
}

/// Build the admin configuration, prompting for the host when needed.
pub(crate) fn build_config(cli: &Cli) -> CliResult<AdminConfig> {
    let supplied_host = cli
        .server
        .clone()
        .or_else(|| cli.admin_url.as_ref().and_then(|url| url.host_str().map(str::to_string)));
    let host = resolve_host(supplied_host.as_deref())?;

    let mut config = AdminConfig::for_host_with_port(&host, cli.https_port)?
        .with_http_port(cli.http_port)?
        .with_accept_invalid_certs(cli.accept_invalid_certs)
        .with_token_expiration(cli.token_minutes)?
        .with_request_timeout(cli.timeout.map(Duration::from_secs));
    if let Some(url) = &cli.admin_url {
        config = config.with_admin_url(url.clone());
    }
    Ok(config)
}

pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[derive(Parser)]
#[command(
    name = "ags-console",
    version,
    about = "Operator console for an ArcGIS Server site"
)]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "AGS_SERVER", help = "Server host name")]
    server: Option<String>,
    #[arg(long, global = true, env = "AGS_HTTPS_PORT", default_value_t = DEFAULT_HTTPS_PORT)]
    https_port: u16,
    #[arg(long, global = true, env = "AGS_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    http_port: u16,
    #[arg(
        long,
        global = true,
        env = "AGS_ADMIN_URL",
        value_parser = parse_url,
        help = "Override the admin root (defaults to https://{server}:{https-port}/arcgis/admin/)"
    )]
    admin_url: Option<Url>,
    #[arg(long, global = true, env = "AGS_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "AGS_PASSWORD", hide = true, hide_env_values = true)]
    password: Option<String>,
    #[arg(
        long,
        global = true,
        env = "AGS_TOKEN_MINUTES",
        default_value_t = DEFAULT_TOKEN_EXPIRATION_MINUTES
    )]
    token_minutes: u32,
    #[arg(
        long,
        global = true,
        env = "AGS_HTTP_TIMEOUT_SECS",
        help = "Per-request timeout in seconds (none by default)"
    )]
    timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        env = "AGS_ACCEPT_INVALID_CERTS",
        help = "Accept self-signed or otherwise invalid TLS certificates"
    )]
    accept_invalid_certs: bool,
    #[arg(long, global = true, env = "AGS_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    #[arg(long, global = true, env = "AGS_LOG_FORMAT", help = "json or pretty")]
    log_format: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List every operable service.
    Services,
    /// Start one service or all of them.
    Start(TargetArgs),
    /// Stop one service or all of them.
    Stop(TargetArgs),
    /// Delete one service, or all of them with --yes.
    Delete(DeleteArgs),
    /// Show one service's configured and running state.
    Status(StatusArgs),
    /// Print the cluster, version, log level and license report.
    Report,
    /// Interactive menu (default).
    Menu,
}

impl Command {
    fn action(&self) -> CliResult<Action> {
        Ok(match self {
            Self::Services => Action::Services,
            Self::Start(args) => Action::Lifecycle(LifecycleOperation::Start, args.target()?),
            Self::Stop(args) => Action::Lifecycle(LifecycleOperation::Stop, args.target()?),
            Self::Delete(args) => {
                Action::Lifecycle(LifecycleOperation::Delete, args.delete_target()?)
            }
            Self::Status(args) => Action::Status(ServiceDescriptor::parse(&args.service)?),
            Self::Report => Action::Report,
            Self::Menu => Action::Menu,
        })
    }
}

#[derive(Args)]
pub(crate) struct TargetArgs {
    #[arg(long, help = "Apply to every service outside the reserved folders")]
    all: bool,
    #[arg(long, help = "Service as folder/name.Type or name.Type")]
    service: Option<String>,
}

impl TargetArgs {
    pub(crate) fn target(&self) -> CliResult<ServiceTarget> {
        match (self.all, self.service.as_deref()) {
            (true, None) => Ok(ServiceTarget::All),
            (false, Some(path)) => Ok(ServiceTarget::Service(ServiceDescriptor::parse(path)?)),
            (true, Some(_)) => Err(CliError::validation(
                "--all and --service cannot be combined",
            )),
            (false, None) => Err(CliError::validation("pass --all or --service")),
        }
    }

}

#[derive(Args)]
pub(crate) struct DeleteArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long, help = "Confirm deleting every service")]
    yes: bool,
}

impl DeleteArgs {
    pub(crate) fn delete_target(&self) -> CliResult<ServiceTarget> {
        let target = self.target.target()?;
        if target == ServiceTarget::All && !self.yes {
            return Err(CliError::validation(
                "refusing to delete every service without --yes",
            ));
        }
        Ok(target)
    }
}

#[derive(Args)]
pub(crate) struct StatusArgs {
    #[arg(long, help = "Service as folder/name.Type or name.Type")]
    service: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
