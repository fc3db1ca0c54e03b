//! Trigger records and the textual reproduction format.
//!
//! The report is every settled task in settlement order followed by every
//! still-pending task in pending order. Its textual form is a Rust literal:
//!
//! ```text
//! scheduler_for!(r#"
//! -> [task${1}] promise::fetch resolved with value 42
//! -> [task${3}] sequence::commit rejected with value "conflict"
//! -> [task${2}] function::retry(1) pending
//! "#)
//! ```
//!
//! Pasting it into a test rebuilds a scheduler that releases the same task
//! ids in the same order (see [`scheduler_for!`](crate::scheduler_for)).

use core::fmt;
use serde::Serialize;
use serde_json::Value;

use crate::types::{TaskId, TaskKind, TaskStatus};

/// One line of the report: a settled trigger record or a pending task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Task identity.
    pub id: TaskId,
    /// How the task was registered.
    pub kind: TaskKind,
    /// Display label (possibly empty).
    pub label: String,
    /// Caller-supplied payload, never inspected by the scheduler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Settlement status, or pending.
    pub status: TaskStatus,
    /// Rendered value or error; absent when there was nothing meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[task${{{}}}] {}", self.id.as_u32(), self.kind)?;
        if !self.label.is_empty() {
            write!(f, "::{}", OneLine(&self.label))?;
        }
        write!(f, " {}", self.status)?;
        if let Some(output) = &self.output {
            write!(f, " with value {}", OneLine(output))?;
        }
        Ok(())
    }
}

/// Writes text with control characters escaped, so an entry never spans
/// more than one line of the report.
struct OneLine<'a>(&'a str);

impl fmt::Display for OneLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c.is_control() {
                write!(f, "{}", c.escape_debug())?;
            } else {
                fmt::Write::write_char(f, c)?;
            }
        }
        Ok(())
    }
}

/// Renders a value for labels and trigger records.
///
/// Uses the `Debug` representation on a single line. The unit value carries no
/// information and renders as `None`.
pub fn render_value<T: fmt::Debug + ?Sized>(value: &T) -> Option<String> {
    let rendered = format!("{value:?}");
    (rendered != "()").then_some(rendered)
}

/// Renders `entries` as a `scheduler_for!` literal.
#[must_use]
pub fn render_report(entries: &[ReportEntry]) -> String {
    let lines: Vec<String> = entries.iter().map(|entry| format!("-> {entry}")).collect();
    let hashes = "#".repeat(raw_string_hashes(&lines));

    let mut out = format!("scheduler_for!(r{hashes}\"\n");
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push('"');
    out.push_str(&hashes);
    out.push(')');
    out
}

/// Smallest hash count that keeps every line inside a valid raw string.
fn raw_string_hashes(lines: &[String]) -> usize {
    let mut longest = 0;
    for line in lines {
        let bytes = line.as_bytes();
        for (pos, _) in line.match_indices('"') {
            let run = bytes[pos + 1..].iter().take_while(|&&b| b == b'#').count();
            longest = longest.max(run);
        }
    }
    longest + 1
}
