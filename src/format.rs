//! Output formatting for resolved settings and operator reports.

use crate::config::{EnvDiagnostic, Settings};
use crate::error::SettingsError;

/// Output format for printing a settings tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render the settings tree in this format.
    pub fn render(self, settings: &Settings) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(settings)?,
            OutputFormat::Yaml => serde_yaml::to_string(settings)?,
        })
    }
}

/// How operator-facing reports are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Plain lines for terminals and logs
    #[default]
    Plain,
    /// HTML fragment for a browser
    Html,
}

/// Render a fatal settings error.
pub fn format_error(err: &SettingsError, presentation: Presentation) -> String {
    let title = err.title();
    let message = err.message();
    match presentation {
        Presentation::Plain => format!("{}\n{}\n", title, message),
        Presentation::Html => format!(
            "<div style='width:600px; background-color:#eee; padding:20px; font-family:arial;'>\
             <h3>{}</h3><p>{}</p></div>",
            escape_html(title),
            escape_html(&message)
        ),
    }
}

/// Render environment diagnostics, one per line or paragraph.
pub fn format_diagnostics(diagnostics: &[EnvDiagnostic], presentation: Presentation) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        match presentation {
            Presentation::Plain => {
                out.push_str(&format!("Error: {}\n", diagnostic));
            }
            Presentation::Html => {
                out.push_str(&format!(
                    "<p>Error: {}</p>",
                    escape_html(&diagnostic.to_string())
                ));
            }
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
