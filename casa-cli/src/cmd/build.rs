use anyhow::{Context, Result};
use casa_core::SiteBuilder;
use chrono::NaiveDate;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;

use crate::config::{CasaConfig, DEFAULT_CONFIG_FILE};

pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("Content directory containing markdown files")
                .default_value("./content"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site")
                .default_value("./out"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("DIR")
                .help("Theme directory overriding the built-in templates")
                .default_value("./theme"),
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

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("build"))
        .about("Build the static site from markdown files")
        .arg(
            Arg::new("date")
                .long("date")
                .value_name("YYYY-MM-DD")
                .help("Build as if on this date (picks the seasonal picture)"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let casa_config = CasaConfig::load(args)?;
    let build = &casa_config.build;

    let today = match args.get_one::<String>("date") {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid --date {date:?}"))?,
        None => chrono::Local::now().date_naive(),
    };

    let site = SiteBuilder::new()
        .source_dir(&build.source)
        .output_dir(&build.output)
        .theme_dir(&build.theme)
        .site_config(casa_config.site.site.clone())
        .style(casa_config.site.style.clone())
        .today(today)
        .parallel(build.parallel)
        .build()
        .with_context(|| format!("failed to build site from {}", build.source))?;
    let written = site.render_all()?;

    info!(pages = written.len(), "Build finished");
    println!("Site built successfully in {}", build.output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_content_tree_into_output() {
        let content = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(
            content.path().join("hello.md"),
            "+++\ntitle = \"Hello\"\n+++\nHi there.\n",
        )
        .unwrap();

        let source = content.path().to_string_lossy().into_owned();
        let out = output.path().to_string_lossy().into_owned();
        let matches = make_subcommand()
            .try_get_matches_from([
                "build",
                "--source",
                &source,
                "--output",
                &out,
                "--config",
                "/definitely/not/casa.toml",
                "--date",
                "2024-10-01",
            ])
            .unwrap();

        execute(&matches).unwrap();
        assert!(output.path().join("index.html").is_file());
        assert!(output.path().join("hello/index.html").is_file());
    }

    #[test]
    fn rejects_malformed_date() {
        let matches = make_subcommand()
            .try_get_matches_from(["build", "--date", "31/10/2024", "--config", "/nope.toml"])
            .unwrap();
        let err = execute(&matches).unwrap_err();
        assert!(err.to_string().contains("invalid --date"));
    }
}
