use anyhow::{Context, Result};
use rehost::cli::output::{format_failure, format_summary, format_trace_event};
use rehost::cli::Cli;
use rehost::core::{RunContext, RunError, RunSummary, Settings, Targets};
use rehost::execution::{ExecutionEngine, PreconditionGate, Reporter, SystemShell};
use rehost::runbook;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to set logging subscriber")?;

    if cli.man {
        println!("{}", Cli::manual());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    debug!(?settings, "settings loaded");

    if cli.list {
        let pipeline = runbook::build(&settings, &Targets::placeholder())?;
        for name in pipeline.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let result = match targets(&cli) {
        Ok(targets) => run(&cli, &settings, &targets).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(summary) => {
            println!("{}", format_summary(&summary));
            Ok(())
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", format_failure(&err));
            std::process::exit(1);
        }
    }
}

fn targets(cli: &Cli) -> Result<Targets, RunError> {
    // clap enforces presence unless --list or --man
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    Targets::new(
        field(&cli.old_host),
        field(&cli.new_host),
        field(&cli.old_id),
        field(&cli.new_id),
    )
}

async fn run(cli: &Cli, settings: &Settings, targets: &Targets) -> Result<RunSummary, RunError> {
    let pipeline = runbook::build(settings, targets)?;
    let resume_from = cli.skip.as_deref();

    // An unknown --skip is a usage error; report it before touching the host
    pipeline.start_index(resume_from)?;

    let reporter = Reporter::new().with_handler(|event| {
        if let Some(line) = format_trace_event(event) {
            eprintln!("{}", line);
        }
    });
    let mut ctx = RunContext::new(Box::new(SystemShell::new()), reporter);
    runbook::prepare(&mut ctx, settings, targets);

    PreconditionGate::new(settings, targets, cli.no_root)
        .check(&ctx)
        .await?;

    ExecutionEngine::new()
        .execute(&pipeline, resume_from, &mut ctx)
        .await
}
