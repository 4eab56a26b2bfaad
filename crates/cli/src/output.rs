// Output format auto-detection and terminal rendering.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use kette_client::View;
use kette_common::types::{Habit, HabitDetail, Snapshot, Task};

const ANSI_CLEAR: &str = "\x1b[2J\x1b[H";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Human => writeln!(out, "{}", human_fn(value)),
        OutputFormat::Json => {
            serde_json::to_writer(&mut out, value).map_err(io::Error::other)?;
            writeln!(out)
        }
    }
}

// ── Live view ───────────────────────────────────────────────────────

/// Renders each accepted snapshot to the terminal. In watch mode the screen
/// is cleared first so the display behaves like a live dashboard.
pub struct TerminalView {
    clear_screen: bool,
}

impl TerminalView {
    pub fn live() -> Self {
        Self { clear_screen: true }
    }
}

impl View for TerminalView {
    fn render(&mut self, snapshot: &Snapshot) {
        let mut out = io::stdout().lock();
        if self.clear_screen {
            let _ = write!(out, "{ANSI_CLEAR}");
        }
        let _ = writeln!(out, "{}", format_snapshot(snapshot));
    }

    fn show_detail(&mut self, detail: &HabitDetail) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", format_detail(detail));
    }
}

/// Discards renders. One-shot commands print the final state themselves
/// instead of streaming intermediate renders.
pub struct QuietView;

impl View for QuietView {
    fn render(&mut self, _snapshot: &Snapshot) {}
    fn show_detail(&mut self, _detail: &HabitDetail) {}
}

// ── Formatting ──────────────────────────────────────────────────────

pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let total = snapshot.habits.len();
    let done = snapshot.completed_habits();
    let pct = if total > 0 { done * 100 / total } else { 0 };

    let mut lines = vec![format!("{done} of {total} habits done ({pct}%) · streak {}", snapshot.streak)];

    if !snapshot.habits.is_empty() {
        lines.push(String::new());
        lines.push("Habits".to_string());
        for habit in &snapshot.habits {
            lines.push(format_habit_row(habit));
        }
    }

    if !snapshot.tasks.is_empty() {
        lines.push(String::new());
        lines.push("Tasks".to_string());
        for task in &snapshot.tasks {
            lines.push(format_task_row(task));
        }
    }

    lines.join("\n")
}

fn format_habit_row(habit: &Habit) -> String {
    let mark = if habit.completed { "x" } else { " " };
    let progress =
        if habit.target > 1 { format!(" {}/{}", habit.current, habit.target) } else { String::new() };
    let shared = if habit.shared { " ·shared" } else { "" };
    format!(
        "  [{mark}] #{:<4} {}{progress} ({}{shared})",
        habit.id,
        habit.text,
        habit.frequency.as_str()
    )
}

fn format_task_row(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let tag = task.age_tag().map(|t| format!(" [{t}]")).unwrap_or_default();
    format!("  [{mark}] #{:<4} {}{tag}", task.id, task.text)
}

pub fn format_detail(detail: &HabitDetail) -> String {
    let mut lines = vec![
        format!("{} · target {} ({})", detail.text, detail.target, detail.frequency.as_str()),
        format!("streak {}", detail.streak),
    ];
    if !detail.history.is_empty() {
        let bars: String =
            detail.history.iter().map(|e| if e.completed { '▇' } else { '·' }).collect();
        lines.push(format!("history {bars}"));
    }
    for entry in &detail.recent {
        lines.push(format!("  {}", entry.text));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kette_common::types::Frequency;

    #[test]
    fn detects_json_when_not_a_tty() {
        assert_eq!(OutputFormat::detect_from_terminal(false), OutputFormat::Json);
        assert_eq!(OutputFormat::detect_from_terminal(true), OutputFormat::Human);
    }

    #[test]
    fn snapshot_formatting_includes_hero_line_and_rows() {
        let snapshot = Snapshot {
            habits: vec![Habit {
                id: 1,
                text: "Laufen".into(),
                target: 3,
                current: 2,
                completed: false,
                frequency: Frequency::WeeklyFlex,
                shared: true,
                shared_info: "(Gruppe)".into(),
            }],
            tasks: vec![Task {
                id: 7,
                text: "Einkaufen".into(),
                completed: false,
                tag: Some("Gestern".into()),
            }],
            streak: 4,
        };

        let text = format_snapshot(&snapshot);
        assert!(text.contains("0 of 1 habits done (0%) · streak 4"));
        assert!(text.contains("Laufen 2/3 (weekly_flex ·shared)"));
        assert!(text.contains("Einkaufen [Gestern]"));
    }

    #[test]
    fn single_target_habits_show_no_progress_fraction() {
        let habit = Habit {
            id: 2,
            text: "Lesen".into(),
            target: 1,
            current: 1,
            completed: true,
            frequency: Frequency::Daily,
            shared: false,
            shared_info: String::new(),
        };
        let row = format_habit_row(&habit);
        assert!(row.contains("[x]"));
        assert!(!row.contains("1/1"));
    }
}
