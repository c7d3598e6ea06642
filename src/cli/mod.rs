//! CLI module for prisma-typegen

mod args;

pub use args::{Args, Command};

use crate::analysis::Generator;
use crate::config::{CliOverrides, Config, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::source::DirectorySource;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(matches!(args.command, Command::Generate { verbose: true, .. }));

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            root,
            output,
            provider,
            exclude,
            no_preserve,
            no_docs,
            watch,
            config,
            verbose,
        } => {
            let mut cfg = load_config(config.as_deref())?;

            // CLI takes precedence
            cfg.merge_cli(CliOverrides {
                root,
                output,
                provider,
                exclude,
                no_preserve,
                no_docs,
                watch,
            });
            cfg.validate()?;

            if verbose {
                println!("Source: {}", cfg.source.root.display());
                println!("Output: {}", cfg.output.path.display());
                println!("Extensions: {:?}", cfg.source.extensions);
                println!("Exclude: {:?}", cfg.source.exclude);
                println!("Classifier: {:?}", cfg.models.classifier);
                println!("Preserve preamble: {}", cfg.output.preserve_preamble);
            }

            let watching = cfg.watch.enabled;
            let mut generator = Generator::new(cfg)?.with_verbose(verbose && !watching);

            if watching {
                return crate::watch::watch(&mut generator);
            }

            let report = generator.run()?;
            println!("{}", report.summary());

            if !report.failures.is_empty() {
                println!("\nSkipped files ({}):", report.failures.len());
                for (path, err) in report.failures.iter().take(5) {
                    println!("  {}: {}", path.display(), err);
                }
                if report.failures.len() > 5 {
                    println!("  ... and {} more", report.failures.len() - 5);
                }
            }

            Ok(())
        }

        Command::Inspect { root, config } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(CliOverrides {
                root,
                ..CliOverrides::default()
            });
            cfg.validate()?;

            if !cfg.source.root.exists() {
                return Err(Error::PathNotFound(cfg.source.root));
            }

            let sources = DirectorySource::from_config(&cfg.source)?;
            let mut generator = Generator::new(cfg)?;
            let analysis = generator.analyze(&sources);

            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }

        Command::Version => {
            println!("prisma-typegen {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// An explicit config file must load; the default one is optional
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE))),
    }
}
