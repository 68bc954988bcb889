use std::io::{self, Write};

use colored::Colorize;

use super::{ReportError, Reporter};
use crate::stats::{RoundStatistics, SignificanceTransition, TestOutcome};

/// A reporter that prints progress lines and the final summary to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Format a throughput with thousands separators, truncated to an integer.
    fn format_throughput(value: f64) -> String {
        let digits = (value.max(0.0) as u64).to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }

    /// Format the confidence level as a whole percentage.
    fn format_confidence(confidence_level: f64) -> String {
        format!("{}%", (confidence_level * 100.0).round() as u32)
    }

    /// Format the outcome verdict with appropriate coloring.
    fn format_outcome(&self, outcome: &TestOutcome) -> String {
        let text = outcome.to_string();
        if !self.use_colors {
            return text;
        }
        match outcome {
            TestOutcome::CandidateBetter => text.green().bold().to_string(),
            TestOutcome::BaselineBetter => text.red().bold().to_string(),
            TestOutcome::Inconclusive | TestOutcome::Cancelled => text.yellow().to_string(),
            TestOutcome::DataError(_) => text.red().to_string(),
        }
    }

    /// Print a single progress line.
    fn print_round(&self, writer: &mut impl Write, stats: &RoundStatistics) -> io::Result<()> {
        let marker = if stats.significant { "*" } else { " " };
        let interval = format!("CI=[{:6.2}, {:6.2}] {}", stats.lo, stats.hi, marker);
        let interval = if self.use_colors && stats.significant {
            interval.bold().to_string()
        } else {
            interval
        };

        writeln!(
            writer,
            "N={:5} | A={:7.2} B={:7.2} | Δ={:+6.2} {} | throughput A={} B={}",
            stats.n,
            stats.mean_a,
            stats.mean_b,
            stats.delta,
            interval,
            Self::format_throughput(stats.throughput_a),
            Self::format_throughput(stats.throughput_b),
        )
    }

    /// Print the banner for a change in significance.
    fn print_transition(
        &self,
        writer: &mut impl Write,
        stats: &RoundStatistics,
        transition: SignificanceTransition,
    ) -> io::Result<()> {
        let text = match transition {
            SignificanceTransition::None => return Ok(()),
            SignificanceTransition::NewlySignificant => format!(
                ">>> STATISTICALLY SIGNIFICANT RESULT REACHED AT N={} <<<",
                stats.n
            ),
            SignificanceTransition::NoLongerSignificant => {
                format!(">>> significance lost at N={} <<<", stats.n)
            }
        };

        writeln!(writer)?;
        if self.use_colors {
            let colored = match transition {
                SignificanceTransition::NewlySignificant => text.green().bold(),
                _ => text.yellow(),
            };
            writeln!(writer, "{}", colored)?;
        } else {
            writeln!(writer, "{}", text)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Print the final summary block.
    fn print_summary(
        &self,
        writer: &mut impl Write,
        outcome: &TestOutcome,
        final_stats: Option<&RoundStatistics>,
    ) -> io::Result<()> {
        writeln!(writer)?;

        let heading = "Score comparison (B -> A):";
        if self.use_colors {
            writeln!(writer, "{}", heading.bold())?;
        } else {
            writeln!(writer, "{}", heading)?;
        }

        match final_stats {
            Some(stats) => {
                writeln!(
                    writer,
                    "Score: {:.2} -> {:.2} (Δ = {:+.2})",
                    stats.mean_b, stats.mean_a, stats.delta
                )?;
                writeln!(
                    writer,
                    "{} CI: [{:.2}, {:.2}]",
                    Self::format_confidence(stats.confidence_level),
                    stats.lo,
                    stats.hi
                )?;
                writeln!(writer, "Games: {}", stats.n)?;
                writeln!(
                    writer,
                    "Throughput: {} -> {}",
                    Self::format_throughput(stats.throughput_b),
                    Self::format_throughput(stats.throughput_a)
                )?;
            }
            None => {
                writeln!(
                    writer,
                    "No summary available (fewer than 2 samples per engine)."
                )?;
            }
        }

        writeln!(writer, "Result: {}", self.format_outcome(outcome))?;
        writeln!(writer)?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn on_round(
        &self,
        stats: &RoundStatistics,
        transition: SignificanceTransition,
    ) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();

        self.print_round(&mut writer, stats)?;
        self.print_transition(&mut writer, stats, transition)?;
        writer.flush()?;

        Ok(())
    }

    fn on_terminate(
        &self,
        outcome: &TestOutcome,
        final_stats: Option<&RoundStatistics>,
    ) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();

        self.print_summary(&mut writer, outcome, final_stats)?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{BatchError, DataError, Side};

    fn make_stats(n: usize, delta: f64, lo: f64, hi: f64) -> RoundStatistics {
        RoundStatistics {
            round: 1,
            n,
            mean_a: 230.0 + delta,
            mean_b: 230.0,
            std_dev_a: 12.0,
            std_dev_b: 11.0,
            throughput_a: 18_345.7,
            throughput_b: 1_200_000.0,
            delta,
            standard_error: 1.5,
            degrees_of_freedom: 97.3,
            t_critical: 1.98,
            confidence_level: 0.95,
            lo,
            hi,
            significant: lo > 0.0 || hi < 0.0,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(TerminalReporter::format_throughput(0.0), "0");
        assert_eq!(TerminalReporter::format_throughput(999.9), "999");
        assert_eq!(TerminalReporter::format_throughput(1000.0), "1,000");
        assert_eq!(TerminalReporter::format_throughput(18_345.7), "18,345");
        assert_eq!(TerminalReporter::format_throughput(1_234_567.0), "1,234,567");
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(TerminalReporter::format_confidence(0.95), "95%");
        assert_eq!(TerminalReporter::format_confidence(0.999), "100%");
        assert_eq!(TerminalReporter::format_confidence(0.9), "90%");
    }

    #[test]
    fn test_round_line() {
        let reporter = TerminalReporter::without_colors();
        let stats = make_stats(50, 3.1, 0.2, 6.0);

        let output = render(|w| reporter.print_round(w, &stats));

        assert!(output.starts_with("N=   50 |"));
        assert!(output.contains("Δ= +3.10"));
        assert!(output.contains("CI=[  0.20,   6.00] *"));
        assert!(output.contains("throughput A=18,345 B=1,200,000"));
    }

    #[test]
    fn test_round_line_not_significant() {
        let reporter = TerminalReporter::without_colors();
        let stats = make_stats(10, -1.0, -4.0, 2.0);

        let output = render(|w| reporter.print_round(w, &stats));

        assert!(output.contains("CI=[ -4.00,   2.00] "));
        assert!(!output.contains('*'));
    }

    #[test]
    fn test_transition_banners() {
        let reporter = TerminalReporter::without_colors();
        let stats = make_stats(150, 3.1, 0.2, 6.0);

        let output = render(|w| {
            reporter.print_transition(w, &stats, SignificanceTransition::NewlySignificant)
        });
        assert!(output.contains(">>> STATISTICALLY SIGNIFICANT RESULT REACHED AT N=150 <<<"));

        let output = render(|w| {
            reporter.print_transition(w, &stats, SignificanceTransition::NoLongerSignificant)
        });
        assert!(output.contains("significance lost at N=150"));

        let output =
            render(|w| reporter.print_transition(w, &stats, SignificanceTransition::None));
        assert!(output.is_empty());
    }

    #[test]
    fn test_summary_with_statistics() {
        let reporter = TerminalReporter::without_colors();
        let stats = make_stats(200, 3.1, 0.2, 6.0);

        let output = render(|w| {
            reporter.print_summary(w, &TestOutcome::CandidateBetter, Some(&stats))
        });

        assert!(output.contains("Score: 230.00 -> 233.10 (Δ = +3.10)"));
        assert!(output.contains("95% CI: [0.20, 6.00]"));
        assert!(output.contains("Games: 200"));
        assert!(output.contains("Throughput: 1,200,000 -> 18,345"));
        assert!(output.contains("Result: candidate is significantly better"));
    }

    #[test]
    fn test_summary_without_statistics() {
        let reporter = TerminalReporter::without_colors();
        let outcome = TestOutcome::DataError(DataError::Source {
            side: Side::Candidate,
            error: BatchError::Exhausted("process exited".to_string()),
        });

        let output = render(|w| reporter.print_summary(w, &outcome, None));

        assert!(output.contains("No summary available"));
        assert!(output.contains("Result: data error: candidate engine failed"));
    }
}
