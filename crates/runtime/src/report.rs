//! Diagnostics report
//!
//! A point-in-time snapshot of the evaluator for hosts and debuggers: the
//! call stack newest-first with labels and classes, plus the counters a
//! stuck-interpreter report needs. Renders as text; as JSON behind the
//! `report-json` feature.

use crate::eval::Evaluator;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub label: String,
    pub class: &'static str,
    /// Expression count when the call was entered.
    pub tick: u64,
    pub gathering: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tick: u64,
    pub data_stack_depth: usize,
    pub live_chunks: usize,
    /// Newest call first.
    pub frames: Vec<FrameSnapshot>,
}

impl Evaluator {
    /// Snapshot the current state.
    pub fn report(&self) -> Report {
        Report {
            tick: self.tick,
            data_stack_depth: self.ds.depth(),
            live_chunks: self.chunks.live(),
            frames: self
                .frames
                .iter()
                .rev()
                .map(|f| FrameSnapshot {
                    label: f.label.to_string(),
                    class: f.class_name(),
                    tick: f.tick,
                    gathering: matches!(f.mode, crate::frame::FrameMode::Gathering),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "evaluator: tick {} / data stack {} / chunks {}",
            self.tick, self.data_stack_depth, self.live_chunks
        )?;
        if self.frames.is_empty() {
            return writeln!(f, "  (no calls in flight)");
        }
        for (n, frame) in self.frames.iter().enumerate() {
            writeln!(
                f,
                "  #{} {} [{}{}] since tick {}",
                n,
                frame.label,
                frame.class,
                if frame.gathering { ", gathering" } else { "" },
                frame.tick
            )?;
        }
        Ok(())
    }
}

#[cfg(feature = "report-json")]
impl Report {
    /// JSON rendering for machine consumers.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_report() {
        let ev = Evaluator::new();
        let report = ev.report();
        assert_eq!(report.frames.len(), 0);
        assert_eq!(report.live_chunks, 0);
        let text = report.to_string();
        assert!(text.contains("no calls in flight"));
    }

    #[cfg(feature = "report-json")]
    #[test]
    fn test_json_report() {
        let ev = Evaluator::new();
        let json = ev.report().to_json();
        assert!(json.contains("\"frames\""));
        assert!(json.contains("\"data_stack_depth\""));
    }
}
