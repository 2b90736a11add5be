//! How `roster` writes results and errors.
//!
//! Each command builds one serializable report and hands it to [`render_mode`]
//! with a text renderer and a pretty renderer; JSON comes from serde.
//!
//! The mode is picked in this order: `--format`, then the hidden `--json`,
//! then `FORMAT` or the user config `output` key, and finally pretty on a
//! terminal and text everywhere else.

use clap::ValueEnum;
use roster_core::error::{ErrorCode, LoadError};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Width of the rule under pretty headings.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// A full-width dashed line.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Heading line plus rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Cut `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Output format selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned tables and headings for a terminal.
    Pretty,
    /// Plain lines that are easy to grep.
    Text,
    /// The report struct as pretty-printed JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// `configured` is the `FORMAT` env value or the user config preference,
/// already merged by the config layer.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    configured: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = configured {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {}
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Pick the output mode, checking whether stdout is a terminal.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    configured: Option<&str>,
) -> OutputMode {
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, configured, is_tty)
}

/// Write `value` to stdout in `mode`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// What the user sees when a command fails.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    /// How to fix it, when there is a known remedy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Snake-case name of the code, e.g. `data_file_missing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CliError {
    pub fn with_details(
        message: impl Into<String>,
        suggestion: Option<&str>,
        code: ErrorCode,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
            error_code: Some(code.code().to_string()),
            kind: Some(code.slug().to_string()),
        }
    }
}

impl From<&LoadError> for CliError {
    fn from(err: &LoadError) -> Self {
        Self::with_details(err.to_string(), err.code().hint(), err.code())
    }
}

/// Attach a machine-readable code to an error.
///
/// The code travels as anyhow context so [`CliError::from`] can recover it.
pub fn coded(code: ErrorCode, err: impl Into<anyhow::Error>) -> anyhow::Error {
    err.into().context(code)
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        if let Some(load) = err.downcast_ref::<LoadError>() {
            return Self::from(load);
        }
        if let Some(code) = err.downcast_ref::<ErrorCode>() {
            let detail = err
                .chain()
                .skip(1)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(": ");
            let message = if detail.is_empty() {
                code.message().to_string()
            } else {
                format!("{}: {detail}", code.message())
            };
            return Self::with_details(message, code.hint(), *code);
        }
        let code = ErrorCode::InternalUnexpected;
        Self::with_details(format!("{err:#}"), code.hint(), code)
    }
}

/// Write `error` to stderr: `{"error": ...}` in JSON mode, `error[E....]` lines otherwise.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::path::PathBuf;

    #[test]
    fn resolve_format_flag_wins_over_json_and_config() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_config() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_configured_values() {
        assert_eq!(resolve_output_mode_inner(None, false, Some("json"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode_inner(None, false, Some("TEXT"), true), OutputMode::Text);
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("pretty"), false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn resolve_unknown_falls_through_to_tty() {
        assert_eq!(resolve_output_mode_inner(None, false, Some("fancy"), true), OutputMode::Pretty);
        assert_eq!(resolve_output_mode_inner(None, false, None, false), OutputMode::Text);
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Émile Zola", 6), "Émile…");
    }

    #[test]
    fn load_error_keeps_its_code() {
        let err: anyhow::Error = LoadError::Missing {
            path: PathBuf::from("data/users.json"),
        }
        .into();
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.message.contains("data/users.json"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn coded_error_surfaces_code_and_detail() {
        let err = coded(ErrorCode::InvalidArgument, anyhow!("invalid plan filter: 'Gold'"));
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E4001"));
        assert_eq!(cli.message, "Invalid argument: invalid plan filter: 'Gold'");
    }

    #[test]
    fn uncoded_error_is_internal() {
        let cli = CliError::from(&anyhow!("boom"));
        assert_eq!(cli.error_code.as_deref(), Some("E9001"));
        assert_eq!(cli.message, "boom");
    }

    #[test]
    fn cli_error_json_shape() {
        let cli = CliError::with_details("nope", None, ErrorCode::StateWriteFailed);
        let json = serde_json::to_value(&cli).expect("serialize");
        assert_eq!(json["error_code"], "E3001");
        assert_eq!(json["kind"], "state_write_failed");
        assert!(json.get("suggestion").is_none());
    }
}
