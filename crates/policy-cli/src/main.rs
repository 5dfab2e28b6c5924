use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use policy_cli::{commands, CliConfig};
use policy_tags::TagMessage;
use policy_validator::ResourceSet;
use policy_views::{ViewConverter, ViewKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let input = || {
        Arg::new("input")
            .value_parser(value_parser!(PathBuf))
            .help("Policy file, or - for stdin")
    };
    let format = || {
        Arg::new("format")
            .long("format")
            .value_parser(value_parser!(ViewKind))
            .help("Input format (json or yaml); defaults to the file extension")
    };

    Command::new("policyctl")
        .version(policy_cli::VERSION)
        .about("Convert, validate and inspect policy block trees")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a policy between JSON and YAML")
                .arg(input())
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(value_parser!(ViewKind))
                        .help("Input format; defaults to the file extension"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(value_parser!(ViewKind))
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a policy against a resource set")
                .arg(input())
                .arg(format())
                .arg(
                    Arg::new("resources")
                        .long("resources")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON resource set (schemas, tokens, groups, templates)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the error map as JSON"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the block outline of a policy")
                .arg(input())
                .arg(format())
                .arg(
                    Arg::new("resources")
                        .long("resources")
                        .value_parser(value_parser!(PathBuf))
                        .help("Annotate blocks with findings against this resource set"),
                ),
        )
        .subcommand(
            Command::new("sync-tags")
                .about("Reconcile a document's tags from a dump of topic messages")
                .arg(
                    Arg::new("messages")
                        .long("messages")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of tag messages"),
                )
                .arg(Arg::new("topic").long("topic").required(true).help("Topic id"))
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .help("Remote reference of the document"),
                )
                .arg(
                    Arg::new("local")
                        .long("local")
                        .required(true)
                        .help("Local document id"),
                ),
        )
}

fn input_path(args: &ArgMatches) -> Option<&Path> {
    args.get_one::<PathBuf>("input").map(PathBuf::as_path)
}

fn input_kind(args: &ArgMatches, flag: &str) -> anyhow::Result<ViewKind> {
    if let Some(kind) = args.get_one::<ViewKind>(flag) {
        return Ok(*kind);
    }
    input_path(args)
        .and_then(commands::detect_kind)
        .with_context(|| format!("cannot infer the input format, pass --{flag}"))
}

fn resources(args: &ArgMatches) -> anyhow::Result<ResourceSet> {
    match args.get_one::<PathBuf>("resources") {
        Some(path) => Ok(ResourceSet::from_json(&commands::read_input(Some(path))?)?),
        None => Ok(ResourceSet::new()),
    }
}

async fn run(matches: ArgMatches, config: CliConfig) -> anyhow::Result<ExitCode> {
    let converter = ViewConverter::new(config.editor);

    match matches.subcommand() {
        Some(("convert", args)) => {
            let from = input_kind(args, "from")?;
            let to = *args.get_one::<ViewKind>("to").context("--to is required")?;
            let text = commands::read_input(input_path(args))?;
            println!("{}", commands::convert(&converter, &text, from, to)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("validate", args)) => {
            let kind = input_kind(args, "format")?;
            let text = commands::read_input(input_path(args))?;
            let model = commands::load_model(&converter, &text, kind)?;
            let report = commands::validate(&model, &resources(args)?)?;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report.errors_map())?);
            } else {
                print!("{}", commands::summarize(&report));
            }
            Ok(if report.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Some(("tree", args)) => {
            let kind = input_kind(args, "format")?;
            let text = commands::read_input(input_path(args))?;
            let model = commands::load_model(&converter, &text, kind)?;
            let report = match args.get_one::<PathBuf>("resources") {
                Some(_) => Some(commands::validate(&model, &resources(args)?)?),
                None => None,
            };
            let root = model.root().context("policy has no root block")?;
            print!("{}", commands::outline(root, report.as_ref()));
            Ok(ExitCode::SUCCESS)
        }
        Some(("sync-tags", args)) => {
            let path = args.get_one::<PathBuf>("messages").context("--messages is required")?;
            let messages: Vec<TagMessage> = serde_json::from_str(&commands::read_input(Some(path))?)
                .with_context(|| format!("invalid messages in {}", path.display()))?;
            let required = |name: &str| {
                args.get_one::<String>(name)
                    .cloned()
                    .with_context(|| format!("--{name} is required"))
            };
            let tags = commands::sync_tags(
                messages,
                &required("topic")?,
                &required("target")?,
                &required("local")?,
                config.sync,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
            Ok(ExitCode::SUCCESS)
        }
        _ => unreachable!("subcommand_required"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let config = match CliConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(matches, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "policyctl failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
