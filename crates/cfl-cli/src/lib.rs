//! Command line front end for Config Layers
//!
//! Builds an aggregation tree for one group, either from the management API
//! or from an offline directory, and prints chart data, subtrees, statistics,
//! or firmware defaults as JSON or YAML.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{bail, Context, Result};
use cfl_core::{ChartConfig, LayerService, LayersConfig};
use cfl_fetch::{ConfigSource, DirectorySource, EcmClient, GroupId};
use cfl_tree::{ChildOrder, LabelStyle, ROOT_TOKEN};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CFL_LOG";

/// Group used when reading an offline directory without `--group`
const OFFLINE_GROUP: &str = "offline";

fn group_arg() -> Arg {
    Arg::new("group")
        .long("group")
        .short('g')
        .help("Group id on the management API")
}

fn yaml_arg() -> Arg {
    Arg::new("yaml")
        .long("yaml")
        .action(ArgAction::SetTrue)
        .help("Print YAML instead of JSON")
}

/// Command line definition
#[must_use]
pub fn command() -> Command {
    Command::new("cfl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Aggregate device and group configurations into treemap data")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Read documents from a directory instead of the API"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("chart")
                .about("Print the flattened treemap sequences")
                .arg(group_arg())
                .arg(
                    Arg::new("exclude-group")
                        .long("exclude-group")
                        .action(ArgAction::SetTrue)
                        .help("Leave the group out of counts and labels"),
                )
                .arg(
                    Arg::new("sorted")
                        .long("sorted")
                        .action(ArgAction::SetTrue)
                        .help("Sort siblings instead of keeping first-seen order"),
                )
                .arg(
                    Arg::new("with-sources")
                        .long("with-sources")
                        .action(ArgAction::SetTrue)
                        .help("Append source lists to leaf labels"),
                )
                .arg(yaml_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print the subtree below a chart node")
                .arg(group_arg())
                .arg(
                    Arg::new("node")
                        .long("node")
                        .short('n')
                        .default_value(ROOT_TOKEN)
                        .help("Chart id of the node"),
                )
                .arg(yaml_arg()),
        )
        .subcommand(
            Command::new("stats")
                .about("Print tree statistics")
                .arg(group_arg())
                .arg(yaml_arg()),
        )
        .subcommand(
            Command::new("defaults")
                .about("Print the firmware default configuration of the group")
                .arg(group_arg())
                .arg(yaml_arg()),
        )
}

/// Install the global tracing subscriber writing to stderr
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from `--config` (or defaults) with env keys applied
fn load_config(matches: &ArgMatches) -> Result<LayersConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => LayersConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LayersConfig::default(),
    };
    Ok(config.with_env())
}

fn source(matches: &ArgMatches, config: &LayersConfig) -> Result<Box<dyn ConfigSource>> {
    if let Some(dir) = matches.get_one::<PathBuf>("offline") {
        return Ok(Box::new(DirectorySource::new(dir)));
    }
    if !config.credentials.is_complete() {
        bail!(
            "API keys missing; set X_CP_API_ID, X_CP_API_KEY, X_ECM_API_ID and X_ECM_API_KEY \
             or use --offline <dir>"
        );
    }
    let client = EcmClient::new(config.api.clone(), &config.credentials)
        .context("creating API client")?;
    Ok(Box::new(client))
}

fn group(args: &ArgMatches, offline: bool) -> Result<GroupId> {
    match args.get_one::<String>("group") {
        Some(group) => Ok(GroupId::from(group.as_str())),
        None if offline => Ok(GroupId::from(OFFLINE_GROUP)),
        None => bail!("--group is required when reading from the API"),
    }
}

fn chart_overrides(args: &ArgMatches, base: ChartConfig) -> ChartConfig {
    let mut chart = base;
    if args.get_flag("exclude-group") {
        chart = chart.with_exclude_group(true);
    }
    if args.get_flag("sorted") {
        chart = chart.with_order(ChildOrder::Sorted);
    }
    if args.get_flag("with-sources") {
        chart = chart.with_label_style(LabelStyle::WithSources);
    }
    chart
}

fn print<T: Serialize>(out: &mut impl Write, value: &T, yaml: bool) -> Result<()> {
    let text = if yaml {
        serde_yaml::to_string(value)?
    } else {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        text
    };
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// Execute parsed arguments, writing command output to `out`
///
/// # Errors
/// Returns error if configuration, fetching, building, or lookup fails
pub async fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let (name, args) = matches
        .subcommand()
        .context("a subcommand is required")?;
    let config = load_config(args)?;
    let offline = args.get_one::<PathBuf>("offline").is_some();
    let source = source(args, &config)?;
    let group = group(args, offline)?;
    let yaml = args.get_flag("yaml");
    let service = LayerService::new(config);

    if name == "defaults" {
        let defaults = service
            .default_configuration(source.as_ref(), &group)
            .await
            .with_context(|| format!("fetching firmware defaults of group {group}"))?;
        return print(out, &defaults, yaml);
    }

    service
        .rebuild_from(source.as_ref(), &group)
        .await
        .with_context(|| format!("building aggregation tree for group {group}"))?;

    match name {
        "chart" => {
            let chart = chart_overrides(args, service.config().chart);
            print(out, &service.chart_with(&chart)?, yaml)
        }
        "show" => {
            let node = args
                .get_one::<String>("node")
                .map_or(ROOT_TOKEN, String::as_str);
            let subtree = service
                .subtree(node)
                .with_context(|| format!("looking up {node}"))?;
            print(out, &subtree, yaml)
        }
        "stats" => print(out, &service.stats()?, yaml),
        other => bail!("unknown command {other}"),
    }
}
