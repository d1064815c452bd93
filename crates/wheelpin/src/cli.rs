//! Command-line interface.

use crate::config::{UpgradeConfig, Verbosity};
use crate::error::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use wheelpin_pypi::{ArtifactErrorPolicy, OperatingSystem, PythonFamily, PythonVersion};

#[derive(Parser, Debug)]
#[command(
    name = "wheelpin",
    author,
    version,
    about = "Upgrade pinned Python requirements to the lowest release with a compatible wheel"
)]
pub struct Cli {
    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors"
    )]
    pub quiet: bool,
    #[arg(long, global = true, value_name = "PATH", help = "Read settings from a JSON config file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite each pin to the lowest compatible release at or above it
    Upgrade(ResolveArgs),
    /// List every release at or above each pin with per-artifact verdicts
    Inspect(ResolveArgs),
}

impl Command {
    pub fn args(&self) -> &ResolveArgs {
        match self {
            Self::Upgrade(args) | Self::Inspect(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Requirements file of `package==version` lines
    #[arg(value_name = "REQUIREMENTS")]
    pub requirements: PathBuf,
    #[arg(short = 'o', long, value_name = "OS", help = "Target OS (linux-x86_64, linux-x86_32, macos, windows-x64, windows-x86)")]
    pub target_os: Option<OperatingSystem>,
    #[arg(
        short = 'p',
        long,
        value_name = "X.Y",
        value_parser = parse_released_version,
        help = "Target interpreter version"
    )]
    pub python_version: Option<PythonVersion>,
    #[arg(short = 't', long, value_name = "TYPE", help = "Target interpreter family (cp, pp)")]
    pub python_type: Option<PythonFamily>,
    #[arg(long, value_name = "URL", help = "Base URL of the PyPI JSON API")]
    pub index_url: Option<String>,
    #[arg(long, value_name = "N", help = "Retries for transient index failures")]
    pub retries: Option<u32>,
    #[arg(long, help = "Stop at the first requirement that cannot be resolved")]
    pub fail_fast: bool,
    #[arg(long, help = "Fail a package on malformed artifact metadata instead of skipping the file")]
    pub strict: bool,
    #[arg(long, help = "Skip pre-releases unless the pin is itself a pre-release")]
    pub no_pre: bool,
}

fn parse_released_version(s: &str) -> std::result::Result<PythonVersion, String> {
    let version: PythonVersion = s.parse().map_err(|e| format!("{e}"))?;
    if !version.is_released() {
        let released: Vec<String> = wheelpin_pypi::RELEASED_PYTHON_VERSIONS
            .iter()
            .map(ToString::to_string)
            .collect();
        return Err(format!(
            "{} is not a released interpreter, expected one of: {}",
            version,
            released.join(", ")
        ));
    }
    Ok(version)
}

impl Cli {
    /// Builds the effective configuration: file first, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the merged
    /// configuration is invalid.
    pub fn load_config(&self) -> Result<UpgradeConfig> {
        let mut config = match &self.config {
            Some(path) => UpgradeConfig::load(path)?,
            None => UpgradeConfig::default(),
        };

        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut UpgradeConfig) {
        let args = self.command.args();

        if let Some(os) = args.target_os {
            config.target.os = os;
        }
        if let Some(version) = args.python_version {
            config.target.python_version = version;
        }
        if let Some(family) = args.python_type {
            config.target.python_family = family;
        }
        if let Some(url) = &args.index_url {
            config.index.url.clone_from(url);
        }
        if let Some(retries) = args.retries {
            config.index.retries = retries;
        }
        if args.fail_fast {
            config.policy.fail_fast = true;
        }
        if args.strict {
            config.policy.artifact_errors = ArtifactErrorPolicy::Abort;
        }
        if args.no_pre {
            config.policy.include_prereleases = false;
        }

        if self.quiet {
            config.verbosity = Verbosity::Quiet;
        } else if self.verbose == 1 {
            config.verbosity = Verbosity::Verbose;
        } else if self.verbose > 1 {
            config.verbosity = Verbosity::Trace;
        }
    }
}
