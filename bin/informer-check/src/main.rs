//! Checks an informer configuration file and prints it back in normalized form.
//!
//! The disk section is resolved the same way the cluster peer resolves it at startup: values from the file (and,
//! optionally, the environment) are validated, missing sections fall back to defaults, and the result is rendered as
//! the JSON document the peer would persist.

#![deny(warnings)]
#![deny(missing_docs)]

use std::io::Write;

use anyhow::{Context as _, Error};
use clap::Parser as _;
use informer_config::{ConfigurationLoader, ConfigurationManager};
use informer_disk::{MetricConfig, MetricRpcTable};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod cli;
use self::cli::{Cli, FileFormat};

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli, &mut std::io::stdout().lock()) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

/// Resolves the disk informer configuration described by `cli` and writes the rendered document to `out`.
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), Error> {
    let mut loader = ConfigurationLoader::default();
    if !cli.defaults {
        let path = &cli.config;
        loader = match cli.file_format() {
            FileFormat::Yaml => loader.from_yaml(path),
            FileFormat::Json => loader.from_json(path),
        }
        .with_context(|| format!("Failed to load configuration from '{}'.", path.display()))?;
    }
    if let Some(prefix) = cli.env_prefix.as_deref() {
        loader = loader
            .from_environment(prefix)
            .context("Failed to load configuration from the environment.")?;
    }

    let manager = ConfigurationManager::new(loader.into_generic(), cli.section.as_str());

    let mut disk = MetricConfig::default();
    manager
        .load(&mut disk)
        .with_context(|| format!("Invalid disk informer configuration in section '{}'.", manager.section()))?;

    let rpc_table = MetricRpcTable::default();
    let method = rpc_table.resolve(&disk)?;
    info!(
        metric_type = %disk.metric_type(),
        metric_ttl = %disk.metric_ttl(),
        rpc_method = method,
        "Disk informer configuration is valid."
    );

    let rendered = manager.render(&[&disk])?;
    out.write_all(&rendered)?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn run_with_args(args: &[&str]) -> Result<Value, Error> {
        let cli = Cli::parse_from(std::iter::once("informer-check").chain(args.iter().copied()));
        let mut out = Vec::new();
        run(&cli, &mut out)?;

        assert!(out.ends_with(b"\n"));
        Ok(serde_json::from_slice(&out).unwrap())
    }

    #[test]
    fn renders_defaults() {
        let rendered = run_with_args(&["--defaults", "/nonexistent/service.yaml"]).unwrap();
        assert_eq!(
            rendered,
            json!({ "informer": { "disk": { "metric_ttl": "30s", "metric_type": "freespace" } } })
        );
    }

    #[test]
    fn renders_yaml_file() {
        let file = config_file(".yaml", "informer:\n  disk:\n    metric_ttl: 1m\n    metric_type: reposize\n");
        let rendered = run_with_args(&[file.path().to_str().unwrap()]).unwrap();
        assert_eq!(
            rendered,
            json!({ "informer": { "disk": { "metric_ttl": "1m0s", "metric_type": "reposize" } } })
        );
    }

    #[test]
    fn renders_custom_section_from_json() {
        let file = config_file(".json", r#"{"peer": {"disk": {"metric_ttl": "90s", "metric_type": "freespace"}}}"#);
        let rendered = run_with_args(&["--section", "peer", file.path().to_str().unwrap()]).unwrap();
        assert_eq!(
            rendered,
            json!({ "peer": { "disk": { "metric_ttl": "1m30s", "metric_type": "freespace" } } })
        );
    }

    #[test]
    fn environment_overrides_file() {
        std::env::set_var("INFORMER_CHECK_RUN_INFORMER__DISK__METRIC_TYPE", "reposize");

        let file = config_file(".yaml", "informer:\n  disk:\n    metric_ttl: 10s\n    metric_type: freespace\n");
        let rendered = run_with_args(&[
            "--env-prefix",
            "informer_check_run",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(
            rendered,
            json!({ "informer": { "disk": { "metric_ttl": "10s", "metric_type": "reposize" } } })
        );
    }

    #[test]
    fn invalid_configuration_writes_nothing() {
        let file = config_file(".yaml", "informer:\n  disk:\n    metric_ttl: 0s\n    metric_type: freespace\n");
        let cli = Cli::parse_from(["informer-check", file.path().to_str().unwrap()]);
        let mut out = Vec::new();

        assert!(run(&cli, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(run_with_args(&["/nonexistent/service.yaml"]).is_err());
    }
}
