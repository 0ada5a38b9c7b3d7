use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kiln_kernel::{init_tracing, install_plan, scope_descriptors, KernelConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("kiln")
        .version(kiln_kernel::VERSION)
        .about("Kiln application kernel install pipeline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Kernel configuration file (TOML)"),
        )
        .subcommand(
            Command::new("scope")
                .about("Scope module descriptors and print them as JSON")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .required(true)
                        .help("Scope name"),
                )
                .arg(
                    Arg::new("allow-duplicates")
                        .long("allow-duplicates")
                        .action(ArgAction::SetTrue)
                        .help("Tolerate duplicate package exports within the scope"),
                )
                .arg(
                    Arg::new("descriptors")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Descriptor files (.toml or .json)"),
                ),
        )
        .subcommand(
            Command::new("install")
                .about("Install a plan and print final states and the audit log")
                .arg(
                    Arg::new("plan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Plan file (.toml or .json)"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<KernelConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => KernelConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(KernelConfig::default()),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let config = load_config(matches)?;
    init_tracing(&config.logging);

    match matches.subcommand() {
        Some(("scope", args)) => {
            let name = args
                .get_one::<String>("name")
                .context("missing scope name")?;
            let descriptors: Vec<PathBuf> = args
                .get_many::<PathBuf>("descriptors")
                .context("missing descriptors")?
                .cloned()
                .collect();
            let config = if args.get_flag("allow-duplicates") {
                config.with_allow_duplicate_exports(true)
            } else {
                config
            };

            let report = scope_descriptors(&descriptors, name, &config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
        Some(("install", args)) => {
            let plan = args.get_one::<PathBuf>("plan").context("missing plan")?;

            let report = install_plan(plan, &config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(report.succeeded)
        }
        _ => Ok(false),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_scope_arguments_parse() {
        let matches = cli()
            .try_get_matches_from(["kiln", "scope", "--name", "app-1", "--allow-duplicates", "a.toml", "b.json"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<String>("name").map(String::as_str), Some("app-1"));
        assert!(args.get_flag("allow-duplicates"));
        assert_eq!(args.get_many::<PathBuf>("descriptors").unwrap().count(), 2);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["kiln", "install", "plan.toml", "--config", "kiln.toml"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("kiln.toml"))
        );
    }
}
