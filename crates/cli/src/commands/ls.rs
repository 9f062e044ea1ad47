//! ls command - List directories, buckets and objects
//!
//! Each location is resolved, matched to its host settings, connected, and
//! listed in the order given. The first fatal error aborts the command.

use bls_core::{
    ClientFactory, Config, ConfigManager, Error, RetryConfig, Sleeper, Target, TokioSleeper,
    drive, run_with_retry,
};
use clap::{Args, CommandFactory};

use super::Cli;
use crate::backend::BackendFactory;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List directories, buckets and objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Locations to list: alias/bucket[/prefix], http(s) URL, or local path.
    /// Append "..." to list recursively.
    pub targets: Vec<String>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig, max_retry: Option<u32>) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if args.targets.first().is_none_or(|first| first == "help") {
        show_help();
        return ExitCode::UsageError;
    }

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Unable to locate config file. Reason: [{e}]"));
            return ExitCode::GeneralError;
        }
    };
    let config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!(
                "Unable to read config file [{}]. Reason: [{e}]",
                manager.config_path().display()
            ));
            return ExitCode::GeneralError;
        }
    };

    let lister = Lister {
        config: &config,
        factory: &BackendFactory,
        sleeper: &TokioSleeper,
        retry: RetryConfig::new(max_retry.unwrap_or(config.defaults.max_retry)),
        formatter: &formatter,
    };
    lister.run(&args.targets).await
}

fn show_help() {
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(ls) = cmd.find_subcommand_mut("ls") {
        // Nothing useful to do if stdout is gone
        let _ = ls.print_help();
    }
}

/// Lists targets one after another, stopping at the first fatal error
pub struct Lister<'a> {
    pub config: &'a Config,
    pub factory: &'a dyn ClientFactory,
    pub sleeper: &'a dyn Sleeper,
    pub retry: RetryConfig,
    pub formatter: &'a Formatter,
}

impl Lister<'_> {
    /// List every raw target in order
    pub async fn run(&self, raw_targets: &[String]) -> ExitCode {
        for raw in raw_targets {
            if let Err(e) = self.list_target(raw).await {
                self.formatter.error(&format!(
                    "Failed to list [{raw}]. Reason: [{}: {e}]",
                    e.kind()
                ));
                return ExitCode::from_error(&e);
            }
        }
        ExitCode::Success
    }

    async fn list_target(&self, raw: &str) -> Result<(), Error> {
        let target = Target::resolve(raw, self.config)?;
        tracing::debug!(
            raw,
            url = %target.canonical_url,
            recursive = target.recursive,
            alias = %target.host_config.alias_name,
            "Listing target"
        );

        let client = self
            .factory
            .connect(&target.canonical_url, &target.host_config)
            .await?;
        let client = &*client;
        let formatter = self.formatter;
        let recursive = target.recursive;

        run_with_retry(
            &self.retry,
            self.sleeper,
            |attempt, _, _| formatter.print_retry(attempt),
            move || drive(client, recursive, move |entry| formatter.print_item(entry)),
        )
        .await
    }
}
