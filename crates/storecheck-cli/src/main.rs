//! storecheck: end-to-end checks for an OpenCart storefront
//!
//! ## Usage
//!
//! ```bash
//! storecheck scrape laptop --currency EUR      # List names and prices
//! storecheck verify desktop --currency USD     # Check against the fixture
//! storecheck record phone                      # Record phoneList.json
//! storecheck fixtures                          # Summarize fixture files
//! ```

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use storecheck::{default_launcher, init_tracing, FixtureStore, LogFormat, SessionManager};
use storecheck_cli::{
    handlers, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ProgressReporter,
    Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity.tracing_level(), LogFormat::Compact);

    match cli.command {
        Commands::Config => {
            println!("{}", handlers::render_config(&config)?);
            Ok(())
        }
        Commands::Fixtures(args) => {
            let store = FixtureStore::new(config.run.fixture_dir());
            for line in handlers::execute_fixtures(&store, args.category)? {
                println!("{line}");
            }
            Ok(())
        }
        command => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_browser(&config, command))
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_run(cli.run.clone())
}

async fn run_browser(config: &CliConfig, command: Commands) -> CliResult<()> {
    let session = SessionManager::new(config.run.clone(), default_launcher());
    let mut reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    let result = dispatch(&session, command, &mut reporter).await;
    reporter.finish();
    session.release().await;
    result
}

async fn dispatch(
    session: &SessionManager,
    command: Commands,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    match command {
        Commands::Scrape(args) => {
            reporter.start_spinner(&format!("Scraping {} listing", args.category));
            let output = handlers::execute_scrape(session, &args).await?;
            reporter.finish();
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Commands::Verify(args) => {
            let started = Instant::now();
            reporter.start_spinner(&format!("Verifying {} listing", args.category));
            let report = handlers::execute_verify(session, &args, reporter).await?;
            reporter.finish();
            reporter.summary(report.passed_count(), report.failed_count(), started.elapsed());
            if report.all_passed() {
                Ok(())
            } else {
                Err(CliError::verification(format!(
                    "{} of {} check(s) failed",
                    report.failed_count(),
                    report.total_count()
                )))
            }
        }
        Commands::Record(args) => {
            reporter.start_spinner(&format!("Recording {} fixture", args.category));
            let (path, records) = handlers::execute_record(session, args.category).await?;
            reporter.finish();
            reporter.success(&format!(
                "Recorded {} products to {}",
                records.len(),
                path.display()
            ));
            Ok(())
        }
        Commands::Config | Commands::Fixtures(_) => Err(CliError::config(
            "command does not need a browser session",
        )),
    }
}
