//! CLI entry point for the bibliography generator.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bibgen_core::config::load_settings_file;
use bibgen_core::{
    BibgenError, Config, OutputError, Session, get_bibliography, get_last_modified_version,
};
use clap::{CommandFactory, Parser};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            let code = match error.downcast_ref::<BibgenError>() {
                Some(bibgen_error) => {
                    if matches!(bibgen_error, BibgenError::Config(_)) {
                        eprintln!("\n{}", Args::command().render_help());
                    }
                    bibgen_error.exit_code()
                }
                None => 1,
            };
            ExitCode::from(code)
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let settings = load_settings_file(args.config.as_deref()).map_err(BibgenError::from)?;
    let overrides = settings.unwrap_or_default().merge(args.overrides());
    debug!(?overrides, "configuration layers merged");

    let config = Config::from_overrides(overrides).map_err(BibgenError::from)?;
    let session = Session::new(&config);

    if args.version_only {
        let version = get_last_modified_version(&session).await?;
        println!("{version}");
        return Ok(());
    }

    info!(
        library_id = config.library_id,
        library_type = config.library_type.path_segment(),
        "Bibliography generator starting"
    );
    let document = get_bibliography(&config, &session, args.template.as_deref()).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &document).map_err(|source| {
                BibgenError::from(OutputError::Write {
                    path: path.clone(),
                    source,
                })
            })?;
            info!(path = %path.display(), bytes = document.len(), "document written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .context("cannot write document to stdout")?;
        }
    }
    Ok(())
}
