//! Output formatting module
//!
//! Reporter modes, result formatting and the event-driven reporter.

mod formatter;
mod reporter;

pub use formatter::{write_summary_to_file, ReporterMode, ResultFormatter};
pub use reporter::{ReportSink, Reporter};
