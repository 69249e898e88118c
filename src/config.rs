use crate::arguments::Arguments;

pub const DEFAULT_POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";
pub const DEFAULT_BACKUP_FILE_NAME: &str = "pom.xml.bak";

/// How a single POM is read and written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriterOptions {
    pub default_namespace: String,
    /// One slot per directory; a later write in the same run replaces it.
    pub backup_file_name: String,
}

impl Default for RewriterOptions {
    fn default() -> Self {
        RewriterOptions {
            default_namespace: DEFAULT_POM_NAMESPACE.to_string(),
            backup_file_name: DEFAULT_BACKUP_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub artifact_id: String,
    pub new_version: String,
    pub extra_paths: Vec<String>,
    pub rewriter: RewriterOptions,
}

impl Settings {
    pub fn new(artifact_id: impl Into<String>, new_version: impl Into<String>) -> Self {
        Settings {
            artifact_id: artifact_id.into(),
            new_version: new_version.into(),
            extra_paths: vec![],
            rewriter: RewriterOptions::default(),
        }
    }

    pub fn with_extra_paths(mut self, extra_paths: &str) -> Self {
        self.extra_paths = parse_extra_paths(extra_paths);
        self
    }
}

impl From<&Arguments> for Settings {
    fn from(args: &Arguments) -> Self {
        Settings {
            artifact_id: args.artifact_id.clone(),
            new_version: args.new_version.clone(),
            extra_paths: args
                .extra_paths
                .as_deref()
                .map(parse_extra_paths)
                .unwrap_or_default(),
            rewriter: RewriterOptions {
                default_namespace: args.namespace.clone(),
                backup_file_name: args.backup_name.clone(),
            },
        }
    }
}

/// Splits a comma-separated list, dropping blank entries.
pub fn parse_extra_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}
