use crate::{
    app::{App, ModSnapshot},
    deploy::ApplyReport,
    logging,
};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

enum CliCommand {
    List,
    Activate {
        mod_id: String,
        version: Option<String>,
    },
    Deactivate {
        mod_id: String,
    },
    Update {
        mod_id: String,
        enabled: bool,
    },
    GamePath {
        path: PathBuf,
    },
    Reconcile,
    Paths,
    Help,
    Version,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, format, verbose) = parse_args(&args)?;
    logging::init(verbose);

    match command {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("astrosmith v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let mut app = App::initialize()?;
            run_command(&mut app, command, format)
        }
    }
}

fn parse_args(args: &[String]) -> Result<(CliCommand, OutputFormat, bool)> {
    let mut format = OutputFormat::Text;
    let mut verbose = false;
    let mut positionals: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" | "-f" => {
                let value = iter.next().context("--format requires a value")?;
                format = OutputFormat::parse(value)
                    .with_context(|| format!("unknown format: {value}"))?;
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => return Ok((CliCommand::Help, format, verbose)),
            "--version" | "-V" => return Ok((CliCommand::Version, format, verbose)),
            _ => positionals.push(arg.as_str()),
        }
    }

    let command = match positionals.split_first() {
        None | Some((&"help", _)) => CliCommand::Help,
        Some((&"version", _)) => CliCommand::Version,
        Some((&"list", [])) => CliCommand::List,
        Some((&"activate", [mod_id])) => CliCommand::Activate {
            mod_id: mod_id.to_string(),
            version: None,
        },
        Some((&"activate", [mod_id, version])) => CliCommand::Activate {
            mod_id: mod_id.to_string(),
            version: Some(version.to_string()),
        },
        Some((&"deactivate", [mod_id])) => CliCommand::Deactivate {
            mod_id: mod_id.to_string(),
        },
        Some((&"update", [mod_id, flag])) => CliCommand::Update {
            mod_id: mod_id.to_string(),
            enabled: parse_flag(flag)?,
        },
        Some((&"game-path", [path])) => CliCommand::GamePath {
            path: PathBuf::from(path),
        },
        Some((&"reconcile", [])) => CliCommand::Reconcile,
        Some((&"paths", [])) => CliCommand::Paths,
        Some((command, _)) => {
            bail!("unknown or malformed command: {command} (try `astrosmith help`)")
        }
    };

    Ok((command, format, verbose))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => bail!("expected on/off, got {value}"),
    }
}

fn run_command(app: &mut App, command: CliCommand, format: OutputFormat) -> Result<()> {
    match command {
        CliCommand::List => print_mods(&app.list_mods(), &app.warnings, format),
        CliCommand::Activate { mod_id, version } => {
            app.activate(&mod_id, version.as_deref())?;
            let report = app.reconcile()?;
            print_report(&report, format)
        }
        CliCommand::Deactivate { mod_id } => {
            app.deactivate(&mod_id)?;
            let report = app.reconcile()?;
            print_report(&report, format)
        }
        CliCommand::Update { mod_id, enabled } => {
            app.set_auto_update(&mod_id, enabled)?;
            println!(
                "auto-update {} for {mod_id}",
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        CliCommand::GamePath { path } => {
            app.set_game_path(&path)?;
            println!("game path set to {}", path.display());
            Ok(())
        }
        CliCommand::Reconcile => {
            let report = app.reconcile()?;
            print_report(&report, format)
        }
        CliCommand::Paths => {
            println!("download cache: {}", app.paths.download_dir.display());
            println!("install dir:    {}", app.paths.install_dir.display());
            println!("mod config:     {}", app.paths.config_path.display());
            match app.game_path() {
                Some(path) => println!("game path:      {}", path.display()),
                None => println!("game path:      (not set)"),
            }
            Ok(())
        }
        CliCommand::Help | CliCommand::Version => unreachable!("handled in run"),
    }
}

fn print_mods(mods: &[ModSnapshot], warnings: &[String], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(mods)?);
        return Ok(());
    }

    if mods.is_empty() {
        println!("no mods found");
    } else {
        let name_width = column_width("name", mods.iter().map(|m| m.name.len()));
        let version_width = column_width("version", mods.iter().map(|m| m.version.len()));
        let author_width = column_width("author", mods.iter().map(|m| m.author.len()));
        let id_width = column_width("mod id", mods.iter().map(|m| m.mod_id.len()));

        println!(
            "{:<6}  {:<name_width$}  {:<version_width$}  {:<author_width$}  {:<id_width$}  {:<6}  {}",
            "active", "name", "version", "author", "mod id", "update", "sync"
        );
        for snapshot in mods {
            println!(
                "{:<6}  {:<name_width$}  {:<version_width$}  {:<author_width$}  {:<id_width$}  {:<6}  {}",
                flag(snapshot.active),
                snapshot.name,
                snapshot.version,
                snapshot.author,
                snapshot.mod_id,
                flag(snapshot.auto_update),
                snapshot.sync.label(),
            );
        }
    }

    for warning in warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

fn print_report(report: &ApplyReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.installed.is_empty() {
        println!("install directory is empty");
    } else {
        println!("installed:");
        for filename in &report.installed {
            println!("  {filename}");
        }
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

fn column_width(header: &str, values: impl Iterator<Item = usize>) -> usize {
    values.chain(std::iter::once(header.len())).max().unwrap_or(0)
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_help() {
    println!("astrosmith - mod loader for {}", crate::astro::GAME_NAME);
    println!();
    println!("usage: astrosmith [--format text|json] [--verbose] <command>");
    println!();
    println!("commands:");
    println!("  list                       show every known mod");
    println!("  activate <id> [version]    install a mod (newest version by default)");
    println!("  deactivate <id>            remove a mod from the install directory");
    println!("  update <id> <on|off>       toggle auto-update for a mod");
    println!("  game-path <path>           set the game installation used for integration");
    println!("  reconcile                  re-sync the install directory with the mod list");
    println!("  paths                      print the directories in use");
    println!("  help, version");
}
