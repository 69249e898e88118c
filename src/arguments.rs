use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

use crate::config::{DEFAULT_BACKUP_FILE_NAME, DEFAULT_POM_NAMESPACE};

#[derive(Debug, Parser)]
#[command(author, version, about, bin_name = "psv")]
pub struct Arguments {
    /// artifactId of the project the new version is stamped from
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    pub artifact_id: String,
    /// Version written into the root project and every descendant
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    pub new_version: String,
    #[arg(long, short, default_value = "./")]
    pub path: String,
    /// Comma-separated path expressions updated in every POM when present
    #[arg(long, short, env = "PSV_EXTRA_PATHS")]
    pub extra_paths: Option<String>,
    /// Namespace assumed for POMs that declare none
    #[arg(long, default_value = DEFAULT_POM_NAMESPACE)]
    pub namespace: String,
    /// File name the original POM is renamed to before it is rewritten
    #[arg(long, default_value = DEFAULT_BACKUP_FILE_NAME)]
    pub backup_name: String,
    #[arg(long, short)]
    pub verbose: bool,
}
