use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::store::Counts;
use crate::task::{Priority, Status, Task};
use crate::view::{Filter, SortKey};

const HEADER: &str = "Task Manager";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn print_view<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        filter: Filter,
        sort: SortKey,
        counts: Counts,
    ) -> anyhow::Result<()> {
        writeln!(out, "{HEADER} [filter: {filter}, sort: {sort}]")?;

        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
        } else {
            let headers = ["ID", "Pri", "Status", "Title", "Action"]
                .into_iter()
                .map(ToString::to_string)
                .collect();

            let rows = tasks
                .iter()
                .map(|task| {
                    let priority = match task.priority {
                        Priority::High => self.paint(task.priority.as_str(), "31"),
                        _ => task.priority.to_string(),
                    };
                    let title = match task.status {
                        Status::Completed => self.paint(&task.title, "9;90"),
                        Status::Pending => task.title.clone(),
                    };

                    vec![
                        self.paint(&task.id.to_string(), "33"),
                        priority,
                        task.status.to_string(),
                        title,
                        toggle_label(task).to_string(),
                    ]
                })
                .collect();

            write_table(&mut *out, headers, rows)?;
        }

        self.print_counts(out, counts)
    }

    pub fn print_counts<W: Write>(&self, out: &mut W, counts: Counts) -> anyhow::Result<()> {
        writeln!(out, "{counts}")?;
        Ok(())
    }

    pub fn print_error<W: Write>(&self, out: &mut W, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&format!("error: {message}"), "31"))?;
        Ok(())
    }

    pub fn print_notice<W: Write>(&self, out: &mut W, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{message}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Label of the action a toggle would perform on `task`.
pub fn toggle_label(task: &Task) -> &'static str {
    match task.status {
        Status::Pending => "mark completed",
        Status::Completed => "mark pending",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

    write_row(&mut writer, &headers, &widths)?;
    write_row(&mut writer, &separator, &widths)?;
    for row in &rows {
        write_row(&mut writer, row, &widths)?;
    }

    Ok(())
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    let last = cells.len().saturating_sub(1);
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx == last {
            write!(writer, "{cell}")?;
        } else {
            let padding = width.saturating_sub(visible_width(cell));
            write!(writer, "{cell}{} ", " ".repeat(padding))?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(cell).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
