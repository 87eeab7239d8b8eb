//! CLI argument parsing for the provisioning simulator.
//!
//! The CLI only wires settings and commands together; validation and
//! persistence rules live in their own modules.
use crate::settings::Overrides;
use crate::store::StoreFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "infrasim",
    version,
    about = "Collect, validate, and record simulated VM provisioning requests",
    after_help = "Commands:\n  init                       Create configs/, logs/, scripts/ and a sample install script\n  provision                  Prompt for machines and record the valid ones\n  install                    Run the install script for every recorded machine\n  run                        provision, then install\n  add --name --os --cpu --ram  Record a single machine without prompting\n  list                       Show recorded machines\n\nExamples:\n  infrasim --base-dir /tmp/sim init\n  infrasim --base-dir /tmp/sim run\n  infrasim --base-dir /tmp/sim add --name web01 --os ubuntu --cpu 4 --ram 16\n  infrasim --base-dir /tmp/sim list --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Location overrides shared by every command.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Base directory holding configs/, logs/ and scripts/
    #[arg(long, value_name = "DIR", global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// Machine store file (default: <base-dir>/configs/instances.json)
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Log file (default: <base-dir>/logs/provisioning.log)
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Install script run once per machine (default: <base-dir>/scripts/install_services.sh)
    #[arg(long, value_name = "PATH", global = true)]
    pub script: Option<PathBuf>,

    /// Store layout on disk
    #[arg(long, value_enum, value_name = "FORMAT", global = true)]
    pub store_format: Option<StoreFormat>,
}

impl PathArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            store: self.store.clone(),
            log_file: self.log_file.clone(),
            script: self.script.clone(),
            store_format: self.store_format,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    /// Prompt for machines and record the valid ones
    Provision,
    /// Run the install script for every recorded machine
    Install,
    /// Prompt for machines, then run the install script
    Run,
    Add(AddArgs),
    List(ListArgs),
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Create the base directory layout and sample install script")]
pub struct InitArgs {
    /// Overwrite an existing install script and settings.json
    #[arg(long)]
    pub force: bool,
}

/// Non-interactive single machine request; values are validated like prompt answers.
#[derive(Parser, Debug)]
#[command(about = "Validate and record a single machine without prompting")]
pub struct AddArgs {
    /// VM name (letter first, then letters, digits, '-' or '_')
    #[arg(long)]
    pub name: String,

    /// Operating system: ubuntu, centos or windows
    #[arg(long)]
    pub os: String,

    /// CPU cores
    #[arg(long, allow_hyphen_values = true)]
    pub cpu: String,

    /// RAM in GB
    #[arg(long, allow_hyphen_values = true)]
    pub ram: String,
}

#[derive(Parser, Debug)]
#[command(about = "Show recorded machines")]
pub struct ListArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
