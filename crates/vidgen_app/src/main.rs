mod cli;
mod config;
mod effects;
mod persistence;
mod render;
mod session;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use vidgen_core::{describe, enhance_topic, Enhancement, JobState, Phase, StageTable};
use vidgen_engine::{
    CompletionEnhancer, EngineEvent, EngineHandle, FallbackEnhancer, PromptEnhancer,
    RuleBasedEnhancer,
};
use vidgen_logging::{vg_info, LogDestination};

use crate::cli::{Cli, Command, GenerateArgs};
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::persistence::LedgerStore;
use crate::render::{format_stage, TerminalRenderer};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Command::Generate(args) = &cli.command {
        args.apply_overrides(&mut config);
        config.validate().context("checking configuration")?;
    }

    let destination = if cli.verbose {
        LogDestination::Both(config.log_file.clone())
    } else {
        LogDestination::File(config.log_file.clone())
    };
    vidgen_logging::initialize(destination, config.level()?);
    vg_info!("vidgen starting with backend {}", config.backend.base_url);

    match cli.command {
        Command::Generate(args) => generate(&config, &args),
        Command::Status { job_id } => status(&config, job_id),
        Command::Ledger { clear } => ledger(&config, clear),
    }
}

fn generate(config: &AppConfig, args: &GenerateArgs) -> Result<ExitCode> {
    let mut renderer = TerminalRenderer::new();
    let prompt = match prepare_prompt(config, args)? {
        Some(enhancement) => {
            for note in &enhancement.notes {
                renderer.note(note);
            }
            enhancement.prompt
        }
        None => args.prompt.clone(),
    };

    let request = args.build_request(prompt);
    if !request.is_submittable() {
        bail!("nothing to submit: the prompt is empty or the duration is zero");
    }

    let engine = EngineHandle::new(config.client_settings(), config.poll_settings())
        .context("starting engine")?;
    let runner = EffectRunner::new(engine, LedgerStore::new(&config.ledger_path));
    let interrupt = session::watch_interrupts();
    let view = session::run_generation(&runner, &mut renderer, request, &interrupt);

    println!(
        "Session used {} API calls (cost {})",
        view.api_calls, view.session_cost
    );
    match view.phase {
        Phase::Completed => match &view.video_url {
            Some(url) => println!("Video ready: {url}"),
            None => println!("Video ready (the backend did not return a URL)"),
        },
        Phase::Cancelled => eprintln!("Generation cancelled"),
        Phase::TimedOut => eprintln!("{}", view.error.as_deref().unwrap_or("Timed out")),
        _ => eprintln!("{}", view.error.as_deref().unwrap_or("Generation did not complete")),
    }
    Ok(ExitCode::from(session::exit_status(&view.phase)))
}

fn prepare_prompt(config: &AppConfig, args: &GenerateArgs) -> Result<Option<Enhancement>> {
    if args.enhance_topic {
        return Ok(Some(enhance_topic(&args.prompt)));
    }
    let Some(options) = args.enhance_options() else {
        return Ok(None);
    };

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let enhancement = match config.completion_settings() {
        Some(settings) => {
            let completion = CompletionEnhancer::new(settings)?;
            let enhancer = FallbackEnhancer::new(Box::new(completion));
            runtime.block_on(enhancer.enhance_or_fallback(&args.prompt, &options))
        }
        None => runtime.block_on(RuleBasedEnhancer.enhance(&args.prompt, &options))?,
    };
    Ok(Some(enhancement))
}

fn status(config: &AppConfig, job_id: String) -> Result<ExitCode> {
    let client = config.client_settings();
    let deadline = Instant::now() + client.request_timeout + Duration::from_secs(5);
    let engine = EngineHandle::new(client, config.poll_settings()).context("starting engine")?;
    engine.fetch_once(job_id);

    while Instant::now() < deadline {
        let Some(EngineEvent::StatusFetched { job_id, result }) =
            engine.recv_timeout(Duration::from_millis(250))
        else {
            continue;
        };
        let report = result.with_context(|| format!("fetching status of job {job_id}"))?;
        let position = StageTable::generation().position(report.progress.unwrap_or(0.0));

        println!("Job:      {job_id}");
        println!("Status:   {}", report.state);
        if let Some(progress) = report.progress {
            println!("Progress: {progress:.0}% ({})", format_stage(&position));
        }
        if let Some(text) = describe(&report) {
            println!("Message:  {text}");
        } else if report.state == JobState::Failed {
            println!("Error:    {}", report.failure_message());
        }
        if let Some(url) = &report.video_url {
            println!("Video:    {url}");
        }
        return Ok(ExitCode::SUCCESS);
    }
    bail!("no status response before the deadline")
}

fn ledger(config: &AppConfig, clear: bool) -> Result<ExitCode> {
    let store = LedgerStore::new(&config.ledger_path);
    let mut ledger = store.load();

    if clear {
        ledger.clear();
        if !store.save(&ledger) {
            bail!("failed to write {}", store.path().display());
        }
        println!("Cleared cost ledger at {}", store.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    if ledger.entries().is_empty() {
        println!("No recorded sessions.");
        return Ok(ExitCode::SUCCESS);
    }
    for entry in ledger.entries() {
        let when = DateTime::from_timestamp_millis(entry.timestamp_ms as i64)
            .map(|stamp| {
                stamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| entry.timestamp_ms.to_string());
        println!("{when}  {:>6}  {}", entry.amount, entry.description);
    }
    println!(
        "Total: {} across {} sessions ({} API calls)",
        ledger.total(),
        ledger.entries().len(),
        ledger.total_calls()
    );
    Ok(ExitCode::SUCCESS)
}
