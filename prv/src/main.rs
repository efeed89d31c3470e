use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prv::batch::verify_batch;
use prv::cli::{Args, OutputFormat};
use prv::config::VerifyConfig;
use prv::logging;
use prv::parsers::RequirementsParser;
use prv::pypi::PyPiClient;
use prv::registry::RegistryLookup;
use req_verify_core::ReportRenderer;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: &Args) -> Result<ExitCode> {
    logging::init(args.verbose)?;
    let config = VerifyConfig::from_args(args)?;

    if !config.show_colors {
        colored::control::set_override(false);
    }

    // 1. Parse all requirements files
    let parser = RequirementsParser::new();
    let mut declarations = Vec::new();
    let mut errors = Vec::new();

    for path in &config.paths {
        let parsed = parser.collect(path, config.follow_refs)?;
        declarations.extend(parsed.declarations);
        errors.extend(parsed.errors);
    }

    info!(
        declarations = declarations.len(),
        errors = errors.len(),
        "parsed requirements"
    );

    // 2. Verify against the registry
    let registry: Arc<dyn RegistryLookup> = Arc::new(
        PyPiClient::new(config.lookup_timeout).with_index_url(config.index_url.as_str()),
    );

    let progress_bar = ProgressBar::new(declarations.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let pb = progress_bar.clone();
    let outcome = verify_batch(
        declarations,
        registry,
        &config.batch_options(),
        move |current, _total| pb.set_position(current as u64),
    )
    .await;

    progress_bar.finish_and_clear();

    // 3. Report
    let report = outcome.into_report(errors);

    match config.format {
        OutputFormat::Pretty => {
            ReportRenderer::new(config.show_colors)
                .with_details(config.verbosity > 0)
                .render(&report);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
