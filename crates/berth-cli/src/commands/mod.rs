pub mod completions;
pub mod doctor;
pub mod install;
pub mod lifecycle;
pub mod list;
pub mod man_pages;
pub mod monitor;
pub mod root;
pub mod uninstall;
pub mod update;

use berth_core::{CoreError, Engine, Prompter, TransitionReport};
use berth_schema::Environment;
use console::Style;
use dialoguer::Confirm;
use std::io::{stderr, stdin, IsTerminal};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_EXCEPTION: u8 = 2;
/// Same code a shell reports for a process killed by SIGINT.
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Render a core error; `main` maps the `invalid environment:` prefix to
/// [`EXIT_INVALID`].
pub fn core_err(e: CoreError) -> String {
    e.to_string()
}

pub fn is_tty() -> bool {
    stdin().is_terminal() && stderr().is_terminal()
}

pub fn colorize_active(active: bool) -> String {
    if active {
        Style::new().green().bold().apply_to("running").to_string()
    } else {
        Style::new().dim().apply_to("stopped").to_string()
    }
}

/// Resolve the environment a command targets from an optional name.
pub fn resolve_environment(engine: &Engine, name: Option<&str>) -> Result<Environment, String> {
    let cwd = std::env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?;
    engine.resolve(name, &cwd).map_err(core_err)
}

/// Print the outcome of a transition; degraded steps become warnings.
pub fn print_report(report: &TransitionReport, success: &str, json: bool) -> Result<(), String> {
    if json {
        println!("{}", json_pretty(report)?);
        return Ok(());
    }
    let warn = Style::new().yellow();
    for step in &report.degraded {
        eprintln!("{} {}", warn.apply_to("warning:"), step.message);
    }
    println!("{} {success}", Style::new().green().apply_to("✓"));
    Ok(())
}

/// Confirmation for destructive commands: `--yes` skips the question, and a
/// missing terminal answers with the default.
pub fn confirm(question: &str, default: bool, assume_yes: bool) -> Result<bool, String> {
    if assume_yes {
        return Ok(true);
    }
    if !is_tty() {
        return Ok(default);
    }
    Confirm::new()
        .with_prompt(question)
        .default(default)
        .interact()
        .map_err(|e| format!("prompt failed: {e}"))
}

/// [`Prompter`] backed by the operator's terminal.
pub struct TerminalPrompter {
    assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> bool {
        confirm(question, default, self.assume_yes).unwrap_or(default)
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {message}", Style::new().yellow().bold().apply_to("[WARNING]"));
    }

    fn error(&self, message: &str) {
        eprintln!("{} {message}", Style::new().red().bold().apply_to("[ERROR]"));
    }
}
