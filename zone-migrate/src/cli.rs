use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "zone-migrate")]
#[command(about = "Migrate firewall security rules to intrazone and east-west zone designs")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Collapse legacy trusted zones into the intrazone zone.
    Intrazone(IntrazoneArgs),
    /// Clone trust-zone rules into the east-west zone.
    Eastwest(EastwestArgs),
    /// Plan gratuitous ARP commands for a cutover.
    Garp(GarpArgs),
    /// Validate a settings file and print derived values.
    CheckConfig(CheckConfigArgs),
}

#[derive(Parser, Debug)]
pub struct IntrazoneArgs {
    /// Security rules (XML or JSON).
    pub rules: PathBuf,
    /// Settings TOML file.
    #[arg(long)]
    pub config: PathBuf,
    /// Where to write the migrated rules.
    #[arg(long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Parser, Debug)]
pub struct EastwestArgs {
    /// Security rules (XML or JSON).
    pub rules: PathBuf,
    /// Settings TOML file.
    #[arg(long)]
    pub config: PathBuf,
    /// Address object/group exports; earlier files win on name clashes.
    #[arg(long, required = true)]
    pub objects: Vec<PathBuf>,
    /// Where to write the rules with clones.
    #[arg(long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Show a per-rule change preview.
    #[arg(long)]
    pub changes: bool,
    /// Also write review entries as JSON to this file.
    #[arg(long)]
    pub review_out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct GarpArgs {
    /// Device configuration with interfaces and NAT rules.
    pub config: PathBuf,
    /// Extra address object exports (for example Panorama shared objects).
    #[arg(long)]
    pub objects: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Settings TOML file.
    pub file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
