//! Numbered interactive menu over the console's commands.
//!
//! The catalog shown by "View ALL Services" is the snapshot taken when the
//! menu opens; bulk start and stop always rediscover the live catalog.

use std::io::{BufRead, Write};

use ags_admin::{CredentialSource, LifecycleOperation, ServiceTarget, list_services};
use tracing::warn;

use crate::client::{AppContext, CliResult};
use crate::commands::{handle_lifecycle, handle_report};
use crate::output::{DIVIDER, render_services};

const MENU: [(u32, &str); 5] = [
    (1, "View ALL Services"),
    (2, "START ALL Services"),
    (3, "STOP ALL Services"),
    (4, "Server Report"),
    (10, "Exit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    ViewServices,
    StartAll,
    StopAll,
    Report,
    Exit,
}

fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim().parse::<u32>().ok()? {
        1 => Some(MenuChoice::ViewServices),
        2 => Some(MenuChoice::StartAll),
        3 => Some(MenuChoice::StopAll),
        4 => Some(MenuChoice::Report),
        10 => Some(MenuChoice::Exit),
        _ => None,
    }
}

fn print_menu<W: Write>(out: &mut W) -> CliResult<()> {
    writeln!(out, "{DIVIDER}")?;
    for (key, label) in MENU {
        writeln!(out, "{key} {label}")?;
    }
    writeln!(out, "{DIVIDER}")?;
    write!(out, "\nPlease Select:")?;
    out.flush()?;
    Ok(())
}

/// Run the menu until the operator selects Exit or input ends.
///
/// A failing action is printed and the menu is shown again; a rejected token
/// is dropped so the next action authenticates afresh.
pub(crate) async fn run_menu<S, R, W>(
    ctx: &mut AppContext<S>,
    mut input: R,
    out: &mut W,
) -> CliResult<()>
where
    S: CredentialSource,
    R: BufRead,
    W: Write,
{
    let token = ctx.token().await?;
    let catalog = list_services(ctx.client(), &token).await?;
    let directory = ctx.client().config().services_directory_url();

    loop {
        print_menu(out)?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let result = match parse_choice(&line) {
            Some(MenuChoice::ViewServices) => {
                render_services(out, &catalog, &directory, ctx.output)
            }
            Some(MenuChoice::StartAll) => {
                handle_lifecycle(ctx, LifecycleOperation::Start, ServiceTarget::All, out).await
            }
            Some(MenuChoice::StopAll) => {
                handle_lifecycle(ctx, LifecycleOperation::Stop, ServiceTarget::All, out).await
            }
            Some(MenuChoice::Report) => handle_report(ctx, out).await,
            Some(MenuChoice::Exit) => break,
            None => {
                writeln!(out, "Unknown Option Selected!")?;
                Ok(())
            }
        };
        if let Err(err) = result {
            writeln!(out, "error: {}", err.display_message())?;
            if err.is_auth() {
                warn!("admin token rejected; the next action will re-authenticate");
                ctx.session.invalidate();
            }
        }
    }
    Ok(())
}
