use std::io::{self, Write};

use serde::Serialize;

use super::{ReportError, Reporter};
use crate::stats::{RoundStatistics, SignificanceTransition, TestOutcome};

/// One line of JSON output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Round {
        #[serde(flatten)]
        stats: &'a RoundStatistics,
        transition: SignificanceTransition,
    },
    Terminate {
        outcome: &'static str,
        message: String,
        final_stats: Option<&'a RoundStatistics>,
    },
}

/// A reporter that writes one JSON object per event to stdout (JSON lines).
#[derive(Debug, Clone, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    fn write_event(writer: &mut impl Write, event: &Event<'_>) -> Result<(), ReportError> {
        serde_json::to_writer(&mut *writer, event)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn on_round(
        &self,
        stats: &RoundStatistics,
        transition: SignificanceTransition,
    ) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        Self::write_event(&mut writer, &Event::Round { stats, transition })
    }

    fn on_terminate(
        &self,
        outcome: &TestOutcome,
        final_stats: Option<&RoundStatistics>,
    ) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        let event = Event::Terminate {
            outcome: outcome.label(),
            message: outcome.to_string(),
            final_stats,
        };
        Self::write_event(&mut writer, &event)
    }
}
