//! `flowlog filter` command handler

use std::borrow::Cow;
use std::io::Write;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use flowlog_core::config::FlowLogConfig;
use flowlog_core::error::FlowLogError;
use flowlog_core::pipeline::RecordSink;
use flowlog_core::types::{ConnectionKey, ParsedRecord};
use flowlog_pipeline::{LineProcessor, ProcessingStats, ProcessingSummary, ProcessorConfig};

use crate::cli::{FilterArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Header printed before the connection count lines in text mode.
pub const CONNECTION_COUNTS_HEADER: &str = "--- Connection Counts ---";

/// Execute the `filter` command.
///
/// In text mode matched lines are streamed to stdout as they are accepted and
/// the connection counts follow once the input is exhausted. In JSON mode a
/// single report is written at the end.
///
/// # Errors
///
/// - `CliError::Config` / `CliError::Core` for invalid configuration (nothing is read)
/// - `CliError::Io` if the input file cannot be opened or read, or stdout fails
pub async fn execute(
    args: FilterArgs,
    loaded: Result<FlowLogConfig, FlowLogError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = loaded?;
    args.apply_to(&mut config);
    config.validate()?;
    let processor_config = ProcessorConfig::from_core(&config)?;

    info!(
        path = %args.file.display(),
        layout = %processor_config.layout,
        count_connections = processor_config.count_connections,
        "filtering flow log"
    );

    let file = tokio::fs::File::open(&args.file).await?;
    let reader = BufReader::new(file);
    let processor = LineProcessor::new(processor_config);

    let (summary, matched) = match writer.format() {
        OutputFormat::Text => {
            let mut sink = WriteSink::new(std::io::BufWriter::new(std::io::stdout()));
            let summary = filter_lines(reader, processor, &mut sink).await?;
            sink.into_inner().flush()?;
            (summary, None)
        }
        OutputFormat::Json => {
            let mut lines: Vec<String> = Vec::new();
            let summary = filter_lines(reader, processor, &mut lines).await?;
            (summary, Some(lines))
        }
    };

    info!(
        lines_read = summary.stats.lines_read,
        matched = summary.stats.matched,
        malformed = summary.stats.malformed,
        invalid_address = summary.stats.invalid_address,
        filtered_out = summary.stats.filtered_out,
        "filter complete"
    );

    let report = FilterReport::new(args.file.display().to_string(), &summary, matched);
    if writer.format() == OutputFormat::Json || report.connections.is_some() {
        writer.render(&report)?;
    }

    Ok(())
}

/// Feed every line of `reader` through the processor, one line at a time.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD and the line is
/// still processed.
pub async fn filter_lines<R, S>(
    mut reader: R,
    mut processor: LineProcessor,
    sink: &mut S,
) -> Result<ProcessingSummary, CliError>
where
    R: AsyncBufRead + Unpin,
    S: RecordSink + ?Sized,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = decode_line(&buf);
        if let Cow::Owned(_) = line {
            warn!(
                line_no = processor.stats().lines_read + 1,
                "line is not valid UTF-8, invalid bytes replaced"
            );
        }
        processor.process_line(&line, sink)?;
    }
    debug!(lines_read = processor.stats().lines_read, "input exhausted");
    Ok(processor.finish())
}

/// Strip the `\n` or `\r\n` terminator and decode the rest lossily.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

/// Sink that writes each accepted raw line followed by a newline.
pub struct WriteSink<W: Write> {
    out: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for WriteSink<W> {
    fn accept(&mut self, record: &ParsedRecord) -> Result<(), FlowLogError> {
        writeln!(self.out, "{}", record.raw())?;
        Ok(())
    }
}

/// One aggregated connection and how often it was seen.
#[derive(Debug, Serialize)]
pub struct ConnectionCount {
    #[serde(flatten)]
    pub key: ConnectionKey,
    pub count: u64,
}

/// Result of a filter run.
///
/// `matched` is only populated in JSON mode; text mode streams the lines instead.
/// `connections` is `None` when counting is off or nothing matched.
#[derive(Debug, Serialize)]
pub struct FilterReport {
    /// Input file path
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<Vec<String>>,
    pub stats: ProcessingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<ConnectionCount>>,
}

impl FilterReport {
    pub fn new(source: String, summary: &ProcessingSummary, matched: Option<Vec<String>>) -> Self {
        let connections = summary.connection_report().map(|entries| {
            entries
                .into_iter()
                .map(|(key, count)| ConnectionCount { key, count })
                .collect()
        });
        Self {
            source,
            matched,
            stats: summary.stats,
            connections,
        }
    }
}

impl Render for FilterReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if let Some(lines) = &self.matched {
            for line in lines {
                writeln!(w, "{}", line)?;
            }
        }

        if let Some(connections) = &self.connections {
            writeln!(w)?;
            writeln!(w, "{}", CONNECTION_COUNTS_HEADER)?;
            for entry in connections {
                writeln!(w, "{} : {}", entry.key, entry.count)?;
            }
        }

        Ok(())
    }
}
