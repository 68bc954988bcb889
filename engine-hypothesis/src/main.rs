use anyhow::{Context, Result};
use clap::Parser;
use engine_hypothesis::{
    CancellationToken, Cli, Config, EngineCommand, EngineProcess, JsonReporter, OutputFormat,
    Reporter, SequentialTester, TerminalReporter,
};
use tracing_subscriber::EnvFilter;

/// Exit status when an engine produced unusable data.
const DATA_ERROR_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    tracing::debug!(?config, "resolved configuration");

    let tester = SequentialTester::new(config.tester_config()).context("Invalid configuration")?;

    let reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Terminal if cli.no_color => Box::new(TerminalReporter::without_colors()),
        OutputFormat::Terminal => Box::new(TerminalReporter::new()),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };

    // 1. Start both engines
    eprintln!("Starting engines...");
    let format = config.engine.request_format();
    let timeout = config.engine.batch_timeout();
    let show_stderr = config.engine.show_stderr;

    let baseline_command =
        EngineCommand::parse(&cli.baseline).context("Invalid baseline engine command")?;
    let candidate_command =
        EngineCommand::parse(&cli.candidate).context("Invalid candidate engine command")?;

    let mut baseline = EngineProcess::spawn(
        "baseline",
        &baseline_command,
        format.clone(),
        timeout,
        show_stderr,
    )
    .context("Failed to start baseline engine")?;
    let mut candidate = EngineProcess::spawn(
        "candidate",
        &candidate_command,
        format,
        timeout,
        show_stderr,
    )
    .context("Failed to start candidate engine")?;

    // 2. Stop collecting on Ctrl-C
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, finishing up...");
                cancel.cancel();
            }
        });
    }

    // 3. Run the sequential test
    eprintln!("Playing games...");
    let report = tester
        .run(&mut candidate, &mut baseline, &*reporter, &cancel)
        .await;

    // 4. Cleanup
    eprintln!("Stopping engines...");
    candidate.shutdown().await;
    baseline.shutdown().await;

    if report.outcome.is_data_error() {
        std::process::exit(DATA_ERROR_EXIT_CODE);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
