use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Format of the configuration file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FileFormat {
    /// YAML document.
    Yaml,

    /// JSON document.
    Json,
}

#[derive(Parser)]
#[command(about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(default_value = "/etc/cluster/service.yaml")]
    pub config: PathBuf,

    /// Format of the configuration file.
    ///
    /// When not specified, the format is inferred from the file extension: `.json` files are read as JSON, and anything
    /// else as YAML.
    #[arg(long, value_enum)]
    pub format: Option<FileFormat>,

    /// Section of the configuration file holding the informer configurations.
    #[arg(long, default_value = "informer")]
    pub section: String,

    /// Prefix of environment variables that override values from the configuration file.
    ///
    /// Nesting levels in variable names are separated by `__`: with a prefix of `pfx`,
    /// `PFX_INFORMER__DISK__METRIC_TYPE` overrides `informer.disk.metric_type`.
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Ignore the configuration file and use the built-in defaults.
    #[arg(long)]
    pub defaults: bool,
}

impl Cli {
    /// Returns the format of the configuration file.
    pub fn file_format(&self) -> FileFormat {
        self.format.unwrap_or_else(|| {
            let is_json = self
                .config
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                FileFormat::Json
            } else {
                FileFormat::Yaml
            }
        })
    }
}
