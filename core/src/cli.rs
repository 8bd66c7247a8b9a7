use crate::config::{Config, EngineConfig};
use crate::executor::Val;
use crate::loader::{Engine, LoadError, RunOutcome, StdioConsole, SyncLoader};
use crate::parser::parse_module;
use crate::parser::semantic_validator::check_module;
use crate::session::Session;
use crate::vfs::DiskFs;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - run module scripts with pausable nested imports", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an entry module and everything it imports
    Run {
        /// Entry module, as a virtual path under the project root
        entry: String,

        /// Project directory mounted as the virtual root
        #[arg(long)]
        root: Option<PathBuf>,

        /// Use the synchronous loader instead of the pausable engine
        #[arg(long)]
        sync: bool,

        /// Interpreter steps per engine slice
        #[arg(long)]
        slice: Option<usize>,
    },

    /// Parse and validate a module without running it
    Check {
        /// Module file on the host filesystem
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Resolve configuration for this invocation, command flags included
    pub fn load_config(&self) -> Result<Config> {
        let (root, slice) = match &self.command {
            Commands::Run { root, slice, .. } => (root.clone(), *slice),
            _ => (None, None),
        };
        Config::builder()
            .config_path(self.config.as_ref().map(PathBuf::from))
            .root_dir(root)
            .slice_steps(slice)
            .build()
            .context("Failed to load configuration")
    }
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    execute(cli, config).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    let config = cli.load_config()?;
    execute(cli, config).await
}

/// Dispatch a parsed command
pub async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run { entry, sync, .. } => {
            let fs = DiskFs::new(&config.project.root_dir);
            let value = if sync {
                run_sync(fs, &config.engine, &entry)?
            } else {
                run_session(fs, config.engine.clone(), &entry).await?
            };
            if value != Val::Null {
                println!("{}", value);
            }
        }

        Commands::Check { file } => check_file(&file)?,

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn run_sync(fs: DiskFs, config: &EngineConfig, entry: &str) -> Result<Val> {
    info!(entry, root = %fs.root().display(), "running with the synchronous loader");
    let mut loader = SyncLoader::new(fs, StdioConsole).with_config(config);
    loader
        .load_sync(entry)
        .with_context(|| format!("Running '{}' failed", entry))
}

async fn run_session(fs: DiskFs, config: EngineConfig, entry: &str) -> Result<Val> {
    info!(entry, root = %fs.root().display(), "running with the pausable engine");
    let engine = Engine::with_config(fs, StdioConsole, config);
    let session = Session::spawn(engine, entry)
        .with_context(|| format!("Could not start '{}'", entry))?;

    let stop = session.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    let (outcome, _) = session.wait().await?;
    match outcome {
        RunOutcome::Completed(value) => Ok(value),
        RunOutcome::Failed(error) => Err(LoadError::from_thrown(error))
            .with_context(|| format!("Running '{}' failed", entry)),
        RunOutcome::Aborted => bail!("Run of '{}' was stopped", entry),
    }
}

fn check_file(file: &Path) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let module = parse_module(&source)
        .map_err(|e| anyhow::anyhow!("{}: {}", file.display(), e))?;

    let report = check_module(&module);
    for finding in &report.errors {
        eprintln!("{}: error at {}", file.display(), finding);
    }
    for finding in &report.warnings {
        eprintln!("{}: warning at {}", file.display(), finding);
    }
    if !report.is_loadable() {
        bail!("{} has {} error(s)", file.display(), report.errors.len());
    }

    println!("{}: ok", file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from(["cadence", "run", "/main", "--root", "proj", "--sync", "--slice", "50"]);
        match &cli.command {
            Commands::Run {
                entry,
                root,
                sync,
                slice,
            } => {
                assert_eq!(entry, "/main");
                assert_eq!(root.as_deref(), Some(Path::new("proj")));
                assert!(sync);
                assert_eq!(*slice, Some(50));
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["cadence", "config", "--config", "custom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_run_on_disk_project() {
        let dir = std::env::temp_dir().join(format!("cadence-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("lib")).unwrap();
        std::fs::write(dir.join("main"), "module.exports = require('./lib/value') + 1").unwrap();
        std::fs::write(dir.join("lib").join("value"), "41").unwrap();

        let value = run_sync(DiskFs::new(&dir), &EngineConfig::default(), "/main").unwrap();
        assert_eq!(value, Val::Num(42.0));

        let value = tokio_test::block_on(run_session(DiskFs::new(&dir), EngineConfig::default(), "/main"));
        assert_eq!(value.unwrap(), Val::Num(42.0));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_session_on_disk_project() {
        let dir = std::env::temp_dir().join(format!("cadence-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("main"), "throw Error('nope')").unwrap();

        let err = run_session(DiskFs::new(&dir), EngineConfig::default(), "/main")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("nope"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_check_reports_errors() {
        let path = std::env::temp_dir().join(format!("cadence-check-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "while (true) { break }\ncontinue").unwrap();
        assert!(check_file(&path).is_err());

        std::fs::write(&path, "let x = require('./y')").unwrap();
        assert!(check_file(&path).is_ok());

        // A computed specifier only warns
        std::fs::write(&path, "let name = './y'\nlet x = require(name)").unwrap();
        assert!(check_file(&path).is_ok());

        std::fs::remove_file(&path).unwrap();
    }
}
