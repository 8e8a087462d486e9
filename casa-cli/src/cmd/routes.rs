use anyhow::Result;
use casa_core::{ContentIndexer, FsSource, RouteIndex};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::{CasaConfig, DEFAULT_CONFIG_FILE};

pub fn make_subcommand() -> Command {
    Command::new("routes")
        .about("Print the route index as JSON")
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("Content directory containing markdown files")
                .default_value("./content"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .default_value(DEFAULT_CONFIG_FILE),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Process documents one at a time")
                .action(ArgAction::SetTrue),
        )
}

fn route_index(config: &CasaConfig) -> Result<RouteIndex> {
    let index = ContentIndexer::new(FsSource::new(&config.build.source))
        .parallel(config.build.parallel)
        .build_index()?;
    Ok(index)
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let casa_config = CasaConfig::load(args)?;
    let index = route_index(&casa_config)?;
    println!("{}", serde_json::to_string_pretty(&index)?);

    Ok(())
}
