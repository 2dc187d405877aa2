/**
 * Angular Compatibility Compiler - ngcc
 *
 * Processes the entry-points of a node_modules folder in dependency order.
 */
use angular_ngcc::main_entry::main_ngcc;
use angular_ngcc::ngcc_options::{NgccOptions, TsConfigSetting};
use angular_ngcc::ngtsc::file_system::NodeJSFileSystem;
use angular_ngcc::ngtsc::logging::{ConsoleLogger, LogLevel, Logger};
use angular_ngcc::packages::EntryPointJsonProperty;
use angular_ngcc::version::version_string;
use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process;

fn command() -> Command {
    Command::new("ngcc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Angular Compatibility Compiler (Rust implementation)")
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .default_value("./node_modules")
                .help("A path to the `node_modules` folder to process."),
        )
        .arg(
            Arg::new("properties")
                .short('p')
                .long("properties")
                .value_name("PROPERTY")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("An array of names of properties in package.json to compile (e.g. `module` or `main`)."),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .value_name("PATH")
                .help("A relative path (from the `source` path) to a single entry-point to process (plus its dependencies)."),
        )
        .arg(
            Arg::new("first-only")
                .long("first-only")
                .action(ArgAction::SetTrue)
                .help("Only compile the first matching format of each entry-point."),
        )
        .arg(
            Arg::new("tsconfig")
                .long("tsconfig")
                .value_name("PATH")
                .help("A path to a tsconfig.json file for path mappings, or `none` to ignore tsconfig files."),
        )
        .arg(
            Arg::new("error-on-failed-entry-point")
                .long("error-on-failed-entry-point")
                .action(ArgAction::SetTrue)
                .help("Exit with an error on the first entry-point that fails to compile."),
        )
        .arg(
            Arg::new("invalidate-entry-point-manifest")
                .long("invalidate-entry-point-manifest")
                .action(ArgAction::SetTrue)
                .help("Walk the directories for entry-points even if a manifest exists."),
        )
        .arg(
            Arg::new("no-async")
                .long("no-async")
                .action(ArgAction::SetTrue)
                .help("Process all entry-points on the main thread."),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LEVEL")
                .default_value("info")
                .help("The lowest severity logging message that should be output (debug, info, warn, error)."),
        )
}

fn options_from(matches: &ArgMatches) -> Result<NgccOptions> {
    let mut options = NgccOptions::default();
    if let Some(source) = matches.get_one::<String>("source") {
        options.base_path = source.clone();
    }
    if let Some(properties) = matches.get_many::<String>("properties") {
        options.properties_to_consider = properties
            .map(|p| p.parse::<EntryPointJsonProperty>().map_err(|e| anyhow!(e)))
            .collect::<Result<Vec<_>>>()?;
    }
    options.target_entry_point_path = matches.get_one::<String>("target").cloned();
    options.compile_all_formats = !matches.get_flag("first-only");
    options.tsconfig = match matches.get_one::<String>("tsconfig").map(String::as_str) {
        None => TsConfigSetting::Inferred,
        Some("none") => TsConfigSetting::Disabled,
        Some(path) => TsConfigSetting::Path(path.to_string()),
    };
    options.error_on_failed_entry_point = matches.get_flag("error-on-failed-entry-point");
    options.invalidate_entry_point_manifest = matches.get_flag("invalidate-entry-point-manifest");
    options.async_mode = !matches.get_flag("no-async");
    Ok(options)
}

fn run(matches: &ArgMatches, logger: &dyn Logger) -> Result<()> {
    let options = options_from(matches)?;
    let fs = NodeJSFileSystem::new();
    let summary = main_ngcc(&fs, logger, options)?;

    logger.debug(&format!(
        "{} tasks processed, {} failed, {} entry-points skipped.",
        summary.processed.len(),
        summary.failed.len(),
        summary.skipped.len()
    ));
    if !summary.failed.is_empty() {
        return Err(anyhow!(
            "{} entry-point format(s) failed to compile.",
            summary.failed.len()
        ));
    }
    Ok(())
}

fn main() {
    let matches = command().get_matches();
    let level = matches
        .get_one::<String>("loglevel")
        .map(|level| level.parse::<LogLevel>())
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        })
        .unwrap_or(LogLevel::Info);
    let logger = ConsoleLogger::new(level);
    logger.debug(&version_string());

    if let Err(e) = run(&matches, &logger) {
        logger.error(&format!("{:#}", e));
        process::exit(1);
    }
}
