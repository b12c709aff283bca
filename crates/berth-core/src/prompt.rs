use tracing::{error, warn};

/// Operator interaction available to lifecycle handlers.
pub trait Prompter {
    /// Ask a yes/no question; `default` is returned when the operator just
    /// presses enter or no terminal is attached.
    fn confirm(&self, question: &str, default: bool) -> bool;
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Non-interactive prompter: every question gets its default answer and
/// messages go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unattended;

impl Unattended {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for Unattended {
    fn confirm(&self, _question: &str, default: bool) -> bool {
        default
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}
