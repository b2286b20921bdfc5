// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod render;
mod runtime;
mod shell;

use anyhow::{Context, Result};
use config::Config;
use datadash_app::{AppController, AppState, Session};
use datadash_ingest::decode_file;
use datadash_llm::{Analyst, Client, Credential};
use datadash_testkit::CatalogFaker;
use runtime::{DisabledAnalyst, Runtime};
use shell::Shell;
use std::env;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV: &str = "DATADASH_LOG";
const DEMO_SEED: u64 = 42;
const DEMO_ROWS: usize = 120;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `datadash --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_tracing(config.log_level());

    let client = if config.llm_enabled() {
        Some(
            Client::new(
                config.llm_base_url(),
                config.llm_model(),
                config.llm_timeout()?,
                Credential::from_env(config.llm_api_key_env()),
            )
            .with_context(|| {
                format!(
                    "invalid [llm] config in {}; fix base_url/model/timeout values",
                    options.config_path.display()
                )
            })?
            .with_sample_rows(config.sample_rows())
            .with_extra_context(config.llm_extra_context().map(str::to_owned)),
        )
    } else {
        None
    };

    let dataset = match (&options.file, options.demo) {
        (Some(path), _) => Some(decode_file(path, config.decode_options()).with_context(|| {
            format!("load {}", path.display())
        })?),
        (None, true) => Some(CatalogFaker::new(DEMO_SEED).catalog(DEMO_ROWS)),
        (None, false) => None,
    };

    if options.check_only {
        if let Some(client) = &client {
            client.ping()?;
        }
        if let Some(dataset) = &dataset {
            println!(
                "ok: {} ({} rows, {} columns)",
                dataset.file_name,
                dataset.row_count(),
                dataset.headers.len()
            );
        } else {
            println!("ok");
        }
        return Ok(());
    }

    let analyst: Arc<dyn Analyst> = match client {
        Some(client) => {
            info!(
                base_url = client.base_url(),
                model = client.model(),
                timeout = ?client.timeout(),
                "model client ready"
            );
            Arc::new(client)
        }
        None => Arc::new(DisabledAnalyst),
    };

    let mut session = Session::new(config.page_sizes(), config.default_view());
    if let Some(dataset) = dataset {
        session.load_dataset(dataset);
    }

    let runtime = Runtime::new(analyst);
    runtime.spawn_input_reader(BufReader::new(io::stdin()));

    let mut shell = Shell::new(
        session,
        AppController::new(AppState::with_theme(config.theme())),
        runtime,
        config.decode_options(),
        io::stdout(),
    );
    shell.run()
}

/// `DATADASH_LOG` wins over `[log] level`. Logs go to stderr so they never
/// interleave with rendered tables on stdout.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    file: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        file: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow::anyhow!(
                    "unknown argument {flag:?}; run with --help to see supported options"
                ));
            }
            path => {
                if let Some(previous) = &options.file {
                    return Err(anyhow::anyhow!(
                        "only one data file can be opened at a time; got {} and {path}",
                        previous.display()
                    ));
                }
                options.file = Some(PathBuf::from(path));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("datadash [options] [file.csv|file.xlsx]");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Start with a generated product catalog");
    println!("  --check                  Validate config, decode the file and reach the model");
    println!("  --help                   Show this help");
    println!();
    println!("Set {LOG_ENV} (for example {LOG_ENV}=debug) to override [log] level.");
}
