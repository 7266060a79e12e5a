//! Terminal presentation shell over [`TaskStore`].
//!
//! The session owns the store together with the transient selection state
//! a page would keep (current filter, sort, default priority, last inline
//! error) and passes that state explicitly into the store's queries.

use std::io::{BufRead, Write};

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::commands::{self, Command};
use crate::config::Config;
use crate::error::ValidationError;
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Priority;
use crate::view::{Filter, SortKey};

const HELP: &str = "\
commands:
  add [-p low|medium|high] [--] TITLE
                                   create a task
  toggle ID                        flip a task between pending and completed
  delete ID                        remove a task
  filter all|pending|completed     choose which tasks are listed
  sort created|priority|alphabetical
                                   choose the listing order
  list                             show the current view
  counts                           show total and completed counts
  export                           print the current view as JSON
  show                             print the active settings
  help                             show this text
  quit                             end the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct Session {
    store: TaskStore,
    filter: Filter,
    sort: SortKey,
    default_priority: Priority,
    last_error: Option<String>,
    renderer: Renderer,
    cfg: Config,
}

impl Session {
    pub fn from_config(cfg: Config, renderer: Renderer) -> anyhow::Result<Self> {
        let policy = cfg.title_policy()?;
        let filter = cfg.default_filter()?;
        let sort = cfg.default_sort()?;
        let default_priority = cfg.default_priority()?;
        debug!(?policy, %filter, %sort, %default_priority, "session settings");

        Ok(Self {
            store: TaskStore::with_policy(policy),
            filter,
            sort,
            default_priority,
            last_error: None,
            renderer,
            cfg,
        })
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reads command lines from `input` until it is exhausted or `quit`.
    #[instrument(skip_all)]
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W, prompt: bool) -> anyhow::Result<()> {
        if prompt {
            self.write_prompt(out)?;
        }

        for line in input.lines() {
            let line = line.context("failed to read command input")?;
            if self.execute(&line, out)? == Flow::Quit {
                return Ok(());
            }
            if prompt {
                self.write_prompt(out)?;
            }
        }

        info!("input closed, ending session");
        Ok(())
    }

    /// Runs one command line. Bad input is reported inline; only output
    /// failures are returned as errors.
    #[instrument(skip(self, out))]
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Flow> {
        let command = match commands::parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(err) => {
                warn!(error = %err, "rejected command line");
                self.report(out, err.to_string())?;
                return Ok(Flow::Continue);
            }
        };

        debug!(?command, "dispatching command");
        self.dispatch(command, out)
    }

    fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> anyhow::Result<Flow> {
        match command {
            Command::Add { title, priority } => {
                let priority = priority.unwrap_or(self.default_priority);
                match self.store.add(&title, Some(priority)) {
                    Ok(_) => self.refresh(out)?,
                    Err(ValidationError::BlankTitle) => {
                        debug!("ignoring blank title");
                    }
                    Err(err) => self.report(out, err.to_string())?,
                }
            }
            Command::Toggle(id) => match self.store.toggle(id) {
                Ok(_) => self.refresh(out)?,
                Err(err) => self.report(out, err.to_string())?,
            },
            Command::Delete(id) => match self.store.delete(id) {
                Ok(()) => self.refresh(out)?,
                Err(err) => self.report(out, err.to_string())?,
            },
            Command::Filter(filter) => {
                self.filter = filter;
                self.refresh(out)?;
            }
            Command::Sort(sort) => {
                self.sort = sort;
                self.refresh(out)?;
            }
            Command::List => self.render_view(out)?,
            Command::Counts => self.renderer.print_counts(out, self.store.counts())?,
            Command::Export => {
                let view = self.store.view(self.filter, self.sort);
                let json = serde_json::to_string_pretty(&view).context("failed to serialize view")?;
                writeln!(out, "{json}")?;
            }
            Command::Show => self.print_settings(out)?,
            Command::Help => self.renderer.print_notice(out, HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn refresh<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        self.last_error = None;
        self.render_view(out)
    }

    fn render_view<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let view = self.store.view(self.filter, self.sort);
        self.renderer
            .print_view(out, &view, self.filter, self.sort, self.store.counts())
    }

    fn report<W: Write>(&mut self, out: &mut W, message: String) -> anyhow::Result<()> {
        self.renderer.print_error(out, &message)?;
        self.last_error = Some(message);
        Ok(())
    }

    fn print_settings<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let mut entries: Vec<(&String, &String)> = self.cfg.iter().collect();
        entries.sort();
        for (key, value) in entries {
            writeln!(out, "{key} = {value}")?;
        }
        for path in &self.cfg.loaded_files {
            writeln!(out, "# loaded {}", path.display())?;
        }
        Ok(())
    }

    fn write_prompt<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        write!(out, "> ")?;
        out.flush()?;
        Ok(())
    }
}
