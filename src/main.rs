use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;

use infrasim::cli::{AddArgs, Command, ListArgs, RootArgs};
use infrasim::machine::MachineRequest;
use infrasim::provision::{self, ProvisionOutcome, Session, Submission};
use infrasim::settings::{self, Settings};
use infrasim::{init, logging, runner};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    let overrides = args.paths.overrides();
    let resolved = Settings::resolve(&args.paths.base_dir, &overrides);
    let log_path = match &resolved {
        Ok(settings) => settings.log_path.clone(),
        Err(_) => Settings::startup_log_path(&args.paths.base_dir, &overrides),
    };
    settings::create_parent_dir(&log_path)?;
    logging::init(&log_path)?;
    tracing::info!("Application started");

    let result = resolved.and_then(|settings| {
        settings.ensure_dirs()?;
        dispatch(&args.command, &settings)
    });
    match &result {
        Ok(_) => tracing::info!("Application run has been completed"),
        Err(err) => tracing::error!(
            target: logging::CRITICAL_TARGET,
            "Application run aborted: {err:#}"
        ),
    }
    result
}

fn dispatch(command: &Command, settings: &Settings) -> Result<ExitCode> {
    match command {
        Command::Init(args) => {
            init::run_init(settings, args.force)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Provision => {
            cmd_provision(settings)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Install => cmd_install(settings),
        Command::Run => match cmd_provision(settings)? {
            ProvisionOutcome::Declined => Ok(ExitCode::SUCCESS),
            ProvisionOutcome::Completed(_) => cmd_install(settings),
        },
        Command::Add(args) => cmd_add(settings, args),
        Command::List(args) => cmd_list(settings, args),
    }
}

fn cmd_provision(settings: &Settings) -> Result<ProvisionOutcome> {
    println!(
        "\nSee '{}' for execution information, errors, and results.",
        settings.log_path.display()
    );
    let store = settings.open_store();
    let mut session = Session::new(io::stdin().lock(), io::stdout());
    session.run(store.as_ref())
}

fn cmd_install(settings: &Settings) -> Result<ExitCode> {
    let summary = runner::run_install(settings, &mut io::stdout())?;
    println!(
        "\nInstall finished: {} succeeded, {} failed.",
        summary.succeeded, summary.failed
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_add(settings: &Settings, args: &AddArgs) -> Result<ExitCode> {
    let request = MachineRequest {
        name: args.name.clone(),
        os: args.os.clone(),
        cpu: args.cpu.clone(),
        ram: args.ram.clone(),
    };
    let store = settings.open_store();
    match provision::submit(store.as_ref(), &request)? {
        Submission::Accepted(record) => {
            println!(
                "Recorded '{}' in {}",
                record.name,
                store.path().display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Submission::Rejected(rejections) => {
            eprintln!(
                "VM name '{}' validation test failed. The VM won't be provisioned",
                request.name
            );
            for rejection in &rejections {
                eprintln!("  - {rejection}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_list(settings: &Settings, args: &ListArgs) -> Result<ExitCode> {
    let records = settings.open_store().load()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No provisioned machines found.");
    } else {
        for record in &records {
            println!(
                "{}\t{}\tcpu={}\tram={}GB",
                record.name, record.os, record.cpu, record.ram
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
