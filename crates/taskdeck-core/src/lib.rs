pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

pub use error::{NotFoundError, ValidationError};
pub use store::{Counts, TaskStore};
pub use task::{Priority, Status, Task, TaskId};
pub use view::{Filter, SortKey};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting taskdeck session"
    );
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.rcfile.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value))),
    );

    let color = cfg.color() && !cli.no_color && io::stdout().is_terminal();
    let mut session = session::Session::from_config(cfg, render::Renderer::new(color))
        .context("invalid configuration")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in &cli.script {
        if session.execute(line, &mut out)? == session::Flow::Quit {
            info!("done");
            return Ok(());
        }
    }

    if !cli.batch {
        let stdin = io::stdin();
        let prompt = stdin.is_terminal();
        session.run(stdin.lock(), &mut out, prompt)?;
    }

    info!("done");
    Ok(())
}
