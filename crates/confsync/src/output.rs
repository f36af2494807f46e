//! Colored terminal output on stderr.

use confsync_sync::{DocumentResult, Outcome, SyncReport};
use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.red, msg);
    }

    /// Print a heading (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        self.styled(&self.cyan_bold, msg);
    }

    /// Print one document line, colored by outcome.
    pub(crate) fn document(&self, result: &DocumentResult) {
        let label = result.outcome.label();
        let identity = &result.identity;
        let line = match &result.outcome {
            Outcome::Failed(message) => format!("  {label:<9} {identity}: {message}"),
            _ => format!("  {label:<9} {identity}"),
        };
        self.styled(self.outcome_style(&result.outcome), &line);
    }

    /// Print the per-outcome counts of a run.
    ///
    /// Green when every document succeeded, yellow otherwise.
    pub(crate) fn summary(&self, report: &SyncReport) {
        let (created, updated) = if report.results.iter().any(|r| {
            matches!(r.outcome, Outcome::WouldCreate | Outcome::WouldUpdate)
        }) {
            ("new", "changed")
        } else {
            ("created", "updated")
        };
        let msg = format!(
            "\n{} {created}, {} {updated}, {} unchanged, {} failed",
            report.created(),
            report.updated(),
            report.unchanged(),
            report.failed()
        );
        let style = if report.has_failures() {
            &self.yellow
        } else {
            &self.green
        };
        self.styled(style, &msg);
    }

    fn outcome_style(&self, outcome: &Outcome) -> &Style {
        match outcome {
            Outcome::Created | Outcome::Updated => &self.green,
            Outcome::WouldCreate | Outcome::WouldUpdate => &self.yellow,
            Outcome::Failed(_) => &self.red,
            Outcome::Unchanged => &self.dim,
        }
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
