//! Terminal output — spinner and colored job reporting.
//!
//! Uses `indicatif` for the progress spinner and `console` for styled
//! output while a job moves through its workflow steps.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::job::{JobReport, JobStatus};
use crate::worker::Worker;

/// Visual progress indicator for a job running in the terminal.
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    /// Start the spinner with the request text.
    pub fn start(request: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("dispatching: {request}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finish the spinner and print the settlement line.
    pub fn complete(&self, report: &JobReport) {
        self.pb.finish_and_clear();
        match report.status {
            JobStatus::Completed => {
                println!(
                    "  {} Job completed by guild '{}' ({}): {:+} to treasury",
                    self.green.apply_to("✓"),
                    report.guild,
                    report.difficulty,
                    report.settled
                );
            }
            _ => {
                println!(
                    "  {} Job failed in guild '{}' ({}): {:+} to treasury",
                    self.red.apply_to("✗"),
                    report.guild,
                    report.difficulty,
                    report.settled
                );
            }
        }
    }

    /// Print the report as pretty JSON with a colored header.
    pub fn print_report(&self, report: &JobReport) {
        let status_style = match report.status {
            JobStatus::Completed => &self.green,
            JobStatus::Failed => &self.red,
            _ => &self.yellow,
        };
        println!();
        println!("{}", status_style.apply_to("─── Job Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

/// One roster line for `monarch status`.
pub fn roster_line(worker: &Worker) -> String {
    format!(
        "{:<10} {:>4}  {:<12} {:>6} xp",
        worker.id, worker.rank, worker.specialty, worker.experience
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Specialty;

    #[test]
    fn roster_line_formats_fields() {
        let worker = Worker::from_stored("WRI-001".into(), Specialty::Writer, 180);
        let line = roster_line(&worker);
        assert!(line.contains("WRI-001"));
        assert!(line.contains("D"));
        assert!(line.contains("writer"));
        assert!(line.contains("180"));
    }
}
