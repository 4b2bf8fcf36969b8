//! Progress reporting: where evaluation lines go and how they are formatted.
//!
//! Reporting is best-effort. A sink that fails to write is logged and skipped,
//! evaluation carries on.

use std::io::Write;
use std::time::Duration;

use crate::eval::results::MetricSummary;

/// Destination for formatted progress lines.
pub trait ReportSink {
    fn emit(&mut self, line: &str) -> std::io::Result<()>;
}

/// Forwards lines to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&mut self, line: &str) -> std::io::Result<()> {
        log::info!("{}", line);
        Ok(())
    }
}

/// Writes one line per report to any writer (stdout, a file, a buffer).
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl ReportSink for MemorySink {
    fn emit(&mut self, line: &str) -> std::io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Emit a line, logging (not propagating) sink failures.
pub fn report(sink: &mut dyn ReportSink, line: &str) {
    if let Err(e) = sink.emit(line) {
        log::warn!("Failed to write progress line: {}", e);
    }
}

/// Human-readable elapsed time: `850ms`, `12.34s`, `3m 05s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if elapsed.as_secs() < 60 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Progress line for one training iteration.
pub fn progress_line(
    iter: usize,
    build_elapsed: Duration,
    loss: f64,
    summary: &MetricSummary,
    eval_elapsed: Duration,
) -> String {
    format!(
        "Iter={}[{}] <loss, hr, ndcg, prec>:\t {:.4}\t {:.4}\t {:.4}\t {:.4}\t [{}]",
        iter,
        format_elapsed(build_elapsed),
        loss,
        summary.hit_ratio,
        summary.ndcg,
        summary.precision,
        format_elapsed(eval_elapsed)
    )
}

/// Running-average line emitted every `interval` online instances.
pub fn running_line(seen: usize, summary: &MetricSummary) -> String {
    format!(
        "{}: <hr, ndcg, prec> =\t {:.4}\t {:.4}\t {:.4}",
        seen, summary.hit_ratio, summary.ndcg, summary.precision
    )
}
