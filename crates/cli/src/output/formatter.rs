//! Output formatter for human-readable and JSON output
//!
//! Styling only wraps text in ANSI markup; it never changes the characters
//! that are printed.

use std::sync::{Arc, Mutex};

use bls_core::{Entry, EntryKind};
use console::Style;
use humansize::{BINARY, FormatSizeOptions};
use jiff::tz::TimeZone;
use serde::Serialize;

use super::OutputConfig;

const PRINT_DATE: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Color theme for styled output
#[derive(Debug, Clone)]
pub struct Theme {
    /// Directory names - blue + bold
    pub dir: Style,
    /// File names - default
    pub file: Style,
    /// File sizes - green
    pub size: Style,
    /// Timestamps - dim
    pub date: Style,
    /// Property keys - cyan
    pub key: Style,
    /// URLs/endpoints - cyan + underline
    pub url: Style,
    /// Alias names - bold
    pub name: Style,
    pub success: Style,
    pub error: Style,
    /// Warnings and retry notices - yellow
    pub warning: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            dir: Style::new().blue().bold(),
            file: Style::new(),
            size: Style::new().green(),
            date: Style::new().dim(),
            key: Style::new().cyan(),
            url: Style::new().cyan().underlined(),
            name: Style::new().bold(),
            success: Style::new().green(),
            error: Style::new().red(),
            warning: Style::new().yellow(),
        }
    }
}

impl Theme {
    /// Returns a theme with no styling (for no-color mode)
    pub fn plain() -> Self {
        Self {
            dir: Style::new(),
            file: Style::new(),
            size: Style::new(),
            date: Style::new(),
            key: Style::new(),
            url: Style::new(),
            name: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warning: Style::new(),
        }
    }
}

/// Lines written while capturing, instead of going to the terminal
#[derive(Debug, Default)]
pub struct Captured {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// JSON form of one listed entry
#[derive(Debug, Serialize)]
struct EntryOutput<'a> {
    name: &'a str,
    size_bytes: u64,
    size_human: String,
    last_modified: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
    time_zone: TimeZone,
    capture: Option<Arc<Mutex<Captured>>>,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        let theme = if config.no_color || config.json {
            Theme::plain()
        } else {
            Theme::default()
        };
        Self {
            config,
            theme,
            time_zone: TimeZone::system(),
            capture: None,
        }
    }

    /// Formatter that records output lines and renders times in UTC
    #[cfg(test)]
    pub fn capturing(config: OutputConfig) -> (Self, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let mut formatter = Self::new(config);
        formatter.time_zone = TimeZone::UTC;
        formatter.capture = Some(captured.clone());
        (formatter, captured)
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    // ========== Style helper methods ==========

    pub fn style_dir(&self, text: &str) -> String {
        self.theme.dir.apply_to(text).to_string()
    }

    pub fn style_file(&self, text: &str) -> String {
        self.theme.file.apply_to(text).to_string()
    }

    pub fn style_size(&self, text: &str) -> String {
        self.theme.size.apply_to(text).to_string()
    }

    pub fn style_date(&self, text: &str) -> String {
        self.theme.date.apply_to(text).to_string()
    }

    pub fn style_key(&self, text: &str) -> String {
        self.theme.key.apply_to(text).to_string()
    }

    pub fn style_url(&self, text: &str) -> String {
        self.theme.url.apply_to(text).to_string()
    }

    pub fn style_name(&self, text: &str) -> String {
        self.theme.name.apply_to(text).to_string()
    }

    // ========== Entry rendering ==========

    /// Render one entry as `[<local time>] <size> <name>`.
    ///
    /// Directories get exactly one trailing `/`.
    pub fn format_item(&self, entry: &Entry) -> String {
        let date = entry
            .mod_time
            .to_zoned(self.time_zone.clone())
            .strftime(PRINT_DATE)
            .to_string();
        let size = format!("{:>6}", human_size(entry.size));

        let name = match entry.kind {
            EntryKind::Directory if !entry.name.ends_with('/') => {
                self.style_dir(&format!("{}/", entry.name))
            }
            EntryKind::Directory => self.style_dir(&entry.name),
            EntryKind::Regular | EntryKind::Other => self.style_file(&entry.name),
        };

        format!(
            "{} {} {}",
            self.style_date(&format!("[{date}]")),
            self.style_size(&size),
            name
        )
    }

    /// Print one listed entry
    pub fn print_item(&self, entry: &Entry) {
        if self.config.quiet {
            return;
        }

        if self.config.json {
            let output = EntryOutput {
                name: &entry.name,
                size_bytes: entry.size,
                size_human: human_size(entry.size),
                last_modified: entry.mod_time.to_string(),
                kind: entry.kind.as_str(),
            };
            match serde_json::to_string(&output) {
                Ok(json) => self.write_out(&json),
                Err(e) => self.write_err(&format!("Error serializing output: {e}")),
            }
        } else {
            self.write_out(&self.format_item(entry));
        }
    }

    /// Announce that a failed listing is being retried
    pub fn print_retry(&self, attempt: u32) {
        if self.config.quiet || self.config.json {
            return;
        }
        let notice = self.theme.warning.apply_to(format!("Retrying ... {attempt}"));
        self.write_out(&notice.to_string());
    }

    // ========== Output methods ==========

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        let checkmark = self.theme.success.apply_to("✓");
        self.write_out(&format!("{checkmark} {message}"));
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({
                "error": message
            });
            self.write_err(
                &serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string()),
            );
        } else {
            let cross = self.theme.error.apply_to("✗");
            self.write_err(&format!("{cross} {message}"));
        }
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write_out(&json),
            Err(e) => self.write_err(&format!("Error serializing output: {e}")),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        self.write_out(message);
    }

    fn write_out(&self, line: &str) {
        match &self.capture {
            Some(captured) => {
                if let Ok(mut captured) = captured.lock() {
                    captured.stdout.push(line.to_string());
                }
            }
            None => println!("{line}"),
        }
    }

    fn write_err(&self, line: &str) {
        match &self.capture {
            Some(captured) => {
                if let Ok(mut captured) = captured.lock() {
                    captured.stderr.push(line.to_string());
                }
            }
            None => eprintln!("{line}"),
        }
    }
}

/// IEC size string: `0 B` .. `1023 B`, then one decimal (`1.0 KiB`)
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let options = FormatSizeOptions::from(BINARY)
        .decimal_places(1)
        .decimal_zeroes(1);
    humansize::format_size(bytes, options)
}
