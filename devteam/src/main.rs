//! Simulated software team.
//!
//! `devteam run` asks a language model to design, implement, review and
//! document a product, then executes the assembled program in a sandbox and
//! reports whether it ran cleanly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use devteam::agents::architect::SoftwareArchitect;
use devteam::agents::manager::ProductManager;
use devteam::core::types::ExecutionOutcome;
use devteam::exit_codes;
use devteam::io::config::{DEFAULT_CONFIG_FILE, TeamConfig, load_config, write_config};
use devteam::io::generator::{GenerationError, generator_from_config};
use devteam::io::sandbox::Sandbox;
use devteam::logging;
use devteam::pipeline::{
    DEFAULT_PRODUCT_DESCRIPTION, PipelineEvent, PipelineOptions, run_pipeline,
};

#[derive(Parser)]
#[command(
    name = "devteam",
    version,
    about = "Simulated software team: design, implement, review, run"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config file with default settings.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the whole team on a product description.
    Run {
        /// What to build.
        #[arg(default_value = DEFAULT_PRODUCT_DESCRIPTION)]
        description: String,
        /// Skip the review and documentation stage.
        #[arg(long)]
        skip_review: bool,
        /// Print the final report as JSON instead of prose.
        #[arg(long)]
        json: bool,
    },
    /// Print the architect's module breakdown, one `name: description` per line.
    Design {
        /// What to build.
        description: String,
    },
    /// Execute a local source file in the sandbox and report the outcome.
    Exec {
        /// Source file to execute.
        file: PathBuf,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err
        .chain()
        .any(|cause| cause.downcast_ref::<GenerationError>().is_some())
    {
        exit_codes::GENERATION_FAILED
    } else {
        exit_codes::INVALID
    }
}

fn run() -> Result<i32> {
    let Cli { config, command } = Cli::parse();
    match command {
        Command::Init { force } => cmd_init(&config, force),
        Command::Run {
            description,
            skip_review,
            json,
        } => cmd_run(&prepare(&config)?, &description, skip_review, json),
        Command::Design { description } => cmd_design(&prepare(&config)?, &description),
        Command::Exec { file, json } => cmd_exec(&prepare(&config)?, &file, json),
    }
}

/// Load config and install logging for commands that do real work.
fn prepare(config_path: &Path) -> Result<TeamConfig> {
    let cfg = load_config(config_path)?;
    logging::init(cfg.log_dir.as_deref())?;
    Ok(cfg)
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &TeamConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(cfg: &TeamConfig, description: &str, skip_review: bool, json: bool) -> Result<i32> {
    let generator = generator_from_config(&cfg.generator)?;
    let mut manager = ProductManager::new(Sandbox::new(cfg.sandbox.clone()));
    let options = PipelineOptions {
        review: !skip_review,
    };

    let report = run_pipeline(&generator, &mut manager, description, &options, |event| {
        if !json {
            print_event(event);
        }
    })?;

    if json {
        print_json(&report)?;
    }
    Ok(outcome_exit_code(&report.outcome))
}

fn cmd_design(cfg: &TeamConfig, description: &str) -> Result<i32> {
    let generator = generator_from_config(&cfg.generator)?;
    let modules = SoftwareArchitect::new(&generator).design_modules(description)?;
    for module in &modules {
        println!("{}: {}", module.name, module.description);
    }
    Ok(exit_codes::OK)
}

fn cmd_exec(cfg: &TeamConfig, file: &Path, json: bool) -> Result<i32> {
    let source =
        fs::read_to_string(file).with_context(|| format!("read source {}", file.display()))?;
    let mut manager = ProductManager::new(Sandbox::new(cfg.sandbox.clone()));
    let outcome = manager.run_and_review(&source)?;
    if json {
        print_json(&outcome)?;
    } else {
        print_outcome(&outcome);
    }
    Ok(outcome_exit_code(&outcome))
}

fn outcome_exit_code(outcome: &ExecutionOutcome) -> i32 {
    if outcome.succeeded() {
        exit_codes::OK
    } else {
        exit_codes::EXECUTION_FAILED
    }
}

fn print_event(event: PipelineEvent<'_>) {
    match event {
        PipelineEvent::Designed { modules } => {
            println!("Modules designed: {}", modules.len());
            for module in modules {
                println!("- {}: {}", module.name, module.description);
            }
            println!();
        }
        PipelineEvent::Implemented { module, source } => {
            println!("Code for module {}:\n{}\n", module.name, source);
        }
        PipelineEvent::Reviewed {
            module,
            review,
            documentation,
        } => {
            println!("Review for module {}:\n{}", module.name, review);
            println!("Documentation for module {}:\n{}\n", module.name, documentation);
        }
        PipelineEvent::Executed { outcome } => print_outcome(outcome),
    }
}

fn print_outcome(outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Succeeded {
            captured_output,
            result_value,
        } => {
            println!("Code executed successfully. Output:\n{captured_output}");
            if let Some(value) = result_value {
                println!("result = {value}");
            }
        }
        ExecutionOutcome::Failed { error_message } => {
            println!("Code execution failed. Error:\n{error_message}");
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
