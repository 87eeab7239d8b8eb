//! Log file setup and line format.
//!
//! Every event becomes one line, `<timestamp> - <LEVEL> - <message>`, in an
//! append-mode file. Fatal errors are emitted at ERROR on [`CRITICAL_TARGET`]
//! and rendered as `CRITICAL`.
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Target for events that end the run.
pub const CRITICAL_TARGET: &str = "critical";

/// Install the global subscriber writing to `log_path`.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .event_format(LogLineFormat)
        .try_init()
        .map_err(|err| anyhow!("install log subscriber: {err}"))?;
    Ok(())
}

/// `<timestamp> - <LEVEL> - <message>` line format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "{} - {} - ",
            timestamp(),
            level_label(metadata.level(), metadata.target())
        )?;
        let mut fields = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut fields), event)?;
        writeln!(writer, "{}", one_line(&fields))
    }
}

/// Escape line breaks so one event never spans two log lines.
fn one_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

fn level_label(level: &Level, target: &str) -> &'static str {
    if *level == Level::ERROR {
        if target == CRITICAL_TARGET {
            "CRITICAL"
        } else {
            "ERROR"
        }
    } else if *level == Level::WARN {
        "WARNING"
    } else if *level == Level::INFO {
        "INFO"
    } else if *level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

/// Local wall-clock time to the second; UTC when the offset is unknown.
fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
