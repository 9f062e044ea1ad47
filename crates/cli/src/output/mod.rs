//! Output formatting
//!
//! Human-readable lines by default, JSON with `--json`.

mod formatter;

pub use formatter::Formatter;

/// Output configuration shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit JSON instead of human-readable lines
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
