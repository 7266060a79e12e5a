use anyhow::anyhow;
use tracing::debug;

use crate::task::{Priority, TaskId};
use crate::view::{Filter, SortKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        title: String,
        priority: Option<Priority>,
    },
    Toggle(TaskId),
    Delete(TaskId),
    Filter(Filter),
    Sort(SortKey),
    List,
    Counts,
    Export,
    Show,
    Help,
    Quit,
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "toggle", "delete", "filter", "sort", "list", "counts", "export", "show", "help",
        "quit", "exit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Parses one session input line. Blank lines and `#` comments yield `None`.
#[tracing::instrument]
pub fn parse_line(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = split_token(line);
    let args: Vec<&str> = rest.split_whitespace().collect();

    let lowered = word.to_ascii_lowercase();
    let known = known_command_names();
    let command = expand_command_abbrev(&lowered, &known)
        .ok_or_else(|| anyhow!("unknown command: {word}"))?;
    debug!(token = %word, expanded = %command, "resolved command token");

    let parsed = match command {
        "add" => parse_add(rest)?,
        "toggle" => Command::Toggle(single_arg(command, &args)?.parse()?),
        "delete" => Command::Delete(single_arg(command, &args)?.parse()?),
        "filter" => Command::Filter(single_arg(command, &args)?.parse()?),
        "sort" => Command::Sort(single_arg(command, &args)?.parse()?),
        "list" => no_args(command, &args, Command::List)?,
        "counts" => no_args(command, &args, Command::Counts)?,
        "export" => no_args(command, &args, Command::Export)?,
        "show" => no_args(command, &args, Command::Show)?,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command: {other}")),
    };

    Ok(Some(parsed))
}

/// Options are only read before the first title word; `--` ends them
/// early. The rest of the line is the title, with its inner spacing kept.
fn parse_add(rest: &str) -> anyhow::Result<Command> {
    let mut priority = None;
    let mut remaining = rest.trim_start();

    loop {
        let (token, after) = split_token(remaining);
        if token == "--" {
            remaining = after;
            break;
        } else if token == "-p" || token == "--priority" {
            let (value, after_value) = split_token(after);
            if value.is_empty() {
                return Err(anyhow!("{token} requires a value"));
            }
            priority = Some(value.parse::<Priority>()?);
            remaining = after_value;
        } else if let Some(value) = token.strip_prefix("--priority=") {
            priority = Some(value.parse::<Priority>()?);
            remaining = after;
        } else {
            break;
        }
    }

    Ok(Command::Add {
        title: remaining.trim().to_string(),
        priority,
    })
}

/// Splits off the first whitespace-delimited token, returning it and the
/// remainder with leading whitespace removed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (s, ""),
    }
}

fn single_arg<'a>(command: &str, args: &[&'a str]) -> anyhow::Result<&'a str> {
    match args {
        [one] => Ok(*one),
        [] => Err(anyhow!("{command} requires an argument")),
        _ => Err(anyhow!("{command} takes exactly one argument")),
    }
}

fn no_args(command: &str, args: &[&str], parsed: Command) -> anyhow::Result<Command> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(anyhow!("{command} takes no arguments"))
    }
}
