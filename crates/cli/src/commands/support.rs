//! support command - Support and diagnostic operations
//!
//! Sub-operations are looked up by name in a table; unknown names are
//! reported together with the list of known ones.

use std::path::PathBuf;

use bls_core::{Config, ConfigManager, Target};
use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Support and diagnostic operations
#[derive(Args, Debug)]
pub struct SupportArgs {
    /// Sub-operation to run (diag, inspect)
    pub operation: Option<String>,

    /// Arguments passed to the sub-operation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// A named sub-operation
pub struct SubOperation<C> {
    pub name: &'static str,
    pub run: fn(&C, &[String]) -> ExitCode,
}

/// State shared by the support sub-operations
pub struct SupportContext<'a> {
    formatter: &'a Formatter,
    config_path: PathBuf,
    config: bls_core::Result<Config>,
    max_retry: Option<u32>,
}

/// Registered support sub-operations
pub fn sub_operations<'a>() -> Vec<SubOperation<SupportContext<'a>>> {
    vec![
        SubOperation {
            name: "diag",
            run: diag,
        },
        SubOperation {
            name: "inspect",
            run: inspect,
        },
    ]
}

/// Run the sub-operation called `name`, or report that it does not exist
pub fn dispatch<C>(
    name: Option<&str>,
    table: &[SubOperation<C>],
    ctx: &C,
    args: &[String],
    formatter: &Formatter,
) -> ExitCode {
    if let Some(op) = name.and_then(|n| table.iter().find(|op| op.name == n)) {
        return (op.run)(ctx, args);
    }

    let known = table
        .iter()
        .map(|op| op.name)
        .collect::<Vec<_>>()
        .join(", ");
    match name {
        Some(name) => formatter.error(&format!(
            "Command '{name}' not found. Available sub-commands: {known}"
        )),
        None => formatter.error(&format!(
            "Missing sub-command. Available sub-commands: {known}"
        )),
    }
    ExitCode::UsageError
}

/// Execute the support command
pub fn execute(args: SupportArgs, output_config: OutputConfig, max_retry: Option<u32>) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Unable to locate config file. Reason: [{e}]"));
            return ExitCode::GeneralError;
        }
    };
    let ctx = SupportContext {
        formatter: &formatter,
        config_path: manager.config_path().to_path_buf(),
        config: manager.load(),
        max_retry,
    };

    dispatch(
        args.operation.as_deref(),
        &sub_operations(),
        &ctx,
        &args.args,
        &formatter,
    )
}

impl SupportContext<'_> {
    fn config(&self) -> Result<&Config, ExitCode> {
        self.config.as_ref().map_err(|e| {
            self.formatter.error(&format!(
                "Unable to read config file [{}]. Reason: [{e}]",
                self.config_path.display()
            ));
            ExitCode::GeneralError
        })
    }
}

#[derive(Serialize)]
struct DiagOutput {
    version: &'static str,
    config_file: String,
    max_attempts: u32,
    aliases: Vec<DiagAlias>,
}

#[derive(Serialize)]
struct DiagAlias {
    name: String,
    endpoint: String,
}

/// Print client diagnostics
fn diag(ctx: &SupportContext<'_>, _args: &[String]) -> ExitCode {
    let config = match ctx.config() {
        Ok(c) => c,
        Err(code) => return code,
    };
    let formatter = ctx.formatter;

    let output = DiagOutput {
        version: env!("CARGO_PKG_VERSION"),
        config_file: ctx.config_path.display().to_string(),
        max_attempts: ctx.max_retry.unwrap_or(config.defaults.max_retry),
        aliases: config
            .aliases
            .iter()
            .map(|a| DiagAlias {
                name: a.name.clone(),
                endpoint: a.endpoint.clone(),
            })
            .collect(),
    };

    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    let row = |key: &str, value: &str| {
        formatter.println(&format!("{} {value}", formatter.style_key(&format!("{key:<13}"))));
    };
    row("Version:", output.version);
    row("Config file:", &output.config_file);
    row("Max attempts:", &output.max_attempts.to_string());
    row("Aliases:", &output.aliases.len().to_string());
    for alias in &output.aliases {
        formatter.println(&format!(
            "  {} {}",
            formatter.style_name(&format!("{:<12}", alias.name)),
            formatter.style_url(&alias.endpoint)
        ));
    }
    ExitCode::Success
}

#[derive(Serialize)]
struct InspectOutput {
    argument: String,
    url: String,
    recursive: bool,
    alias: String,
    endpoint: String,
}

/// Resolve locations without connecting and show where they point
fn inspect(ctx: &SupportContext<'_>, args: &[String]) -> ExitCode {
    let formatter = ctx.formatter;
    if args.is_empty() {
        formatter.error("inspect requires at least one location");
        return ExitCode::UsageError;
    }
    let config = match ctx.config() {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut resolved = Vec::with_capacity(args.len());
    for raw in args {
        match Target::resolve(raw, config) {
            Ok(target) => resolved.push(InspectOutput {
                argument: target.raw_argument,
                url: target.canonical_url,
                recursive: target.recursive,
                alias: target.host_config.alias_name,
                endpoint: target.host_config.endpoint,
            }),
            Err(e) => {
                formatter.error(&format!(
                    "Failed to inspect [{raw}]. Reason: [{}: {e}]",
                    e.kind()
                ));
                return ExitCode::from_error(&e);
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&resolved);
        return ExitCode::Success;
    }

    for target in &resolved {
        let mode = if target.recursive {
            "recursive"
        } else {
            "single-level"
        };
        formatter.println(&format!(
            "{} -> {} ({mode}, alias: {})",
            target.argument,
            formatter.style_url(&target.url),
            formatter.style_name(&target.alias)
        ));
    }
    ExitCode::Success
}
