use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::Level;
use zone_migrate::batch::{BatchOutcome, RuleBatchProcessor};
use zone_migrate::changes::compare;
use zone_migrate::config::{load_config, MigrationPath, ZoneMigrationConfig};
use zone_migrate::export::write_rules;
use zone_migrate::garp;
use zone_migrate::ingest::{directory_from_document, load_document, rules_from_document};
use zone_migrate::model::{AddressDirectory, RuleRecord};
use zone_migrate::report::{
    render_change_summary, render_changes, render_garp, render_reviews, MigrationReport,
};

mod cli;
mod path_guard;

use cli::{
    CheckConfigArgs, Cli, Command, EastwestArgs, GarpArgs, IntrazoneArgs, OutputFormat, ReportArgs,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Intrazone(args) => run_intrazone(args),
        Command::Eastwest(args) => run_eastwest(args),
        Command::Garp(args) => run_garp(args),
        Command::CheckConfig(args) => run_check_config(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_intrazone(args: IntrazoneArgs) -> Result<()> {
    guard_outputs(&args.output, &args.report, &[&args.rules, &args.config])?;
    let config = load_config(&args.config)?;
    let document = load_document(&args.rules)
        .with_context(|| format!("failed to load rules {}", args.rules.display()))?;
    let records = rules_from_document(&document)
        .with_context(|| format!("failed to read rules from {}", args.rules.display()))?;

    let outcome =
        RuleBatchProcessor::new(&config, &AddressDirectory::default()).run_intrazone(&records)?;
    finish(&records, &outcome, &args.output, &args.report)
}

fn run_eastwest(args: EastwestArgs) -> Result<()> {
    let mut inputs: Vec<&Path> = vec![args.rules.as_path(), args.config.as_path()];
    inputs.extend(args.objects.iter().map(|p| p.as_path()));
    guard_outputs(&args.output, &args.report, &inputs)?;

    let config = load_config(&args.config)?;
    let document = load_document(&args.rules)
        .with_context(|| format!("failed to load rules {}", args.rules.display()))?;
    let records = rules_from_document(&document)
        .with_context(|| format!("failed to read rules from {}", args.rules.display()))?;

    let mut directory = load_directory(&args.objects)?;
    // Objects defined alongside the rules fill any gaps.
    directory.merge(directory_from_document(&document));
    tracing::info!(
        objects = directory.object_count(),
        groups = directory.group_count(),
        "loaded address directory"
    );

    let outcome = RuleBatchProcessor::new(&config, &directory).run_eastwest(&records)?;
    finish(&records, &outcome, &args.output, &args.report)
}

fn run_garp(args: GarpArgs) -> Result<()> {
    let document = load_document(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    let mut directory = load_directory(&args.objects)?;
    directory.merge(directory_from_document(&document));

    let plan = garp::plan(&document, &directory);
    match args.format {
        OutputFormat::Text => println!("{}", render_garp(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let config = load_config(&args.file)?;

    let intrazone = config.validate(MigrationPath::Intrazone);
    let eastwest = config.validate(MigrationPath::EastWest);

    match &intrazone {
        Ok(()) => println!(
            "intrazone: ok zone={} legacy_zones={}",
            config.intrazone.zone,
            config.intrazone.legacy_zones.len()
        ),
        Err(err) => println!("intrazone: {err}"),
    }
    match &eastwest {
        Ok(()) => println!(
            "eastwest: ok trust_zone={} zone={} trust_subnets={} single_ip_mode={}",
            config.eastwest.trust_zone,
            config.eastwest.zone,
            subnet_list(&config),
            config.single_ip_mode()
        ),
        Err(err) => println!("eastwest: {err}"),
    }
    println!(
        "clone_suffix={} on_malformed={}",
        config.clone_suffix,
        config.on_malformed.as_str()
    );

    if intrazone.is_err() && eastwest.is_err() {
        bail!(
            "{} does not fully configure either migration",
            args.file.display()
        );
    }
    Ok(())
}

fn subnet_list(config: &ZoneMigrationConfig) -> String {
    config
        .eastwest
        .trust_subnets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn guard_outputs(output: &Path, report: &ReportArgs, inputs: &[&Path]) -> Result<()> {
    path_guard::ensure_output_not_same(output, inputs)?;
    if let Some(review_out) = &report.review_out {
        path_guard::ensure_output_not_same(review_out, inputs)?;
        path_guard::ensure_output_not_same(review_out, &[output])?;
    }
    Ok(())
}

fn load_directory(paths: &[PathBuf]) -> Result<AddressDirectory> {
    let mut directory = AddressDirectory::default();
    for path in paths {
        let document = load_document(path)
            .with_context(|| format!("failed to load objects {}", path.display()))?;
        directory.merge(directory_from_document(&document));
    }
    Ok(directory)
}

fn finish(
    records: &[RuleRecord],
    outcome: &BatchOutcome,
    output: &Path,
    report: &ReportArgs,
) -> Result<()> {
    write_rules(&outcome.rules, output)
        .with_context(|| format!("failed to write output XML {}", output.display()))?;

    if let Some(path) = &report.review_out {
        let json = serde_json::to_string_pretty(&outcome.reviews)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write review file {}", path.display()))?;
    }

    let changes = report.changes.then(|| compare(records, &outcome.rules));

    match report.format {
        OutputFormat::Text => {
            println!(
                "wrote {} rules to {}",
                outcome.rules.len(),
                output.display()
            );
            if let Some(changes) = &changes {
                println!();
                println!("{}", render_changes(changes));
                println!("{}", render_change_summary(changes));
            }
            println!();
            println!("{}", render_reviews(&outcome.reviews));
        }
        OutputFormat::Json => {
            let payload = MigrationReport::new(outcome, changes.as_deref());
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}
