mod cmd;
mod config;

use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("casa")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Static site builder for kieran.casa")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log build progress")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::routes::make_subcommand())
}

fn main() {
    let matches = cli().get_matches();

    // --verbose forces info, otherwise RUST_LOG decides
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match matches.subcommand() {
        Some(("build", args)) => cmd::build::execute(args),
        Some(("routes", args)) => cmd::routes::execute(args),
        _ => unreachable!("subcommand_required is set"),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn verbose_is_accepted_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["casa", "routes", "--verbose"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }
}
