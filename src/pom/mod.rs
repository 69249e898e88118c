use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SetVersionError;
use crate::rewriter::source::PomSource;

pub mod discovery;

pub use discovery::discover_projects;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Packaging {
    Pom,
    #[default]
    Jar,
    War,
    Ear,
    MavenPlugin,
    Other(String),
}

impl Packaging {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "pom" => Packaging::Pom,
            "jar" | "" => Packaging::Jar,
            "war" => Packaging::War,
            "ear" => Packaging::Ear,
            "maven-plugin" => Packaging::MavenPlugin,
            other => Packaging::Other(other.to_string()),
        }
    }

    /// Aggregate projects build nothing themselves and group child projects.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Packaging::Pom)
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Packaging::Pom => "pom",
            Packaging::Jar => "jar",
            Packaging::War => "war",
            Packaging::Ear => "ear",
            Packaging::MavenPlugin => "maven-plugin",
            Packaging::Other(other) => other.as_str(),
        };
        f.write_str(name)
    }
}

/// The `<parent>` block of a POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: String,
}

impl ParentRef {
    /// Whether this reference names `project`. Group ids only take part
    /// when both sides know theirs.
    pub fn refers_to(&self, project: &ProjectDescriptor) -> bool {
        if self.artifact_id != project.artifact_id || self.version != project.version {
            return false;
        }
        match (&self.group_id, project.group_id()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    group_id: Option<String>,
    pub artifact_id: String,
    pub version: String,
    pub packaging: Packaging,
    pub parent: Option<ParentRef>,
    /// Entries of `<modules>`, relative to the POM's directory.
    pub modules: Vec<String>,
    pub file: PathBuf,
}

impl ProjectDescriptor {
    pub fn new(
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        packaging: Packaging,
        file: impl Into<PathBuf>,
    ) -> Self {
        ProjectDescriptor {
            group_id: None,
            artifact_id: artifact_id.into(),
            version: version.into(),
            packaging,
            parent: None,
            modules: vec![],
            file: file.into(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Own group id, or the parent's when the POM inherits it.
    pub fn group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.group_id.as_deref()))
    }

    /// True when the project carries its parent's version rather than one of its own.
    pub fn inherits_parent_version(&self) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.version == self.version)
    }

    /// `groupId:artifactId:packaging:version`, the way Maven prints project ids.
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id().unwrap_or("unknown"),
            self.artifact_id,
            self.packaging,
            self.version
        )
    }

    /// Reads the coordinates of the POM at `path`. Missing `version` and
    /// `groupId` fall back to the parent's; missing `packaging` means `jar`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = PomSource::read(path)?;
        Self::parse(&source.text, path)
    }

    pub fn parse(text: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document =
            crate::rewriter::parse_document(text).map_err(|source| SetVersionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let root = document.root_element();

        let parent = child_element(root, "parent").and_then(|parent| {
            Some(ParentRef {
                group_id: child_text(parent, "groupId"),
                artifact_id: child_text(parent, "artifactId")?,
                version: child_text(parent, "version")?,
            })
        });

        let missing = |element| SetVersionError::MissingElement {
            path: path.to_path_buf(),
            element,
        };
        let artifact_id = child_text(root, "artifactId").ok_or_else(|| missing("artifactId"))?;
        let version = child_text(root, "version")
            .or_else(|| parent.as_ref().map(|p| p.version.clone()))
            .ok_or_else(|| missing("version"))?;
        let packaging = child_text(root, "packaging")
            .map(|raw| Packaging::parse(&raw))
            .unwrap_or_default();
        let modules = child_element(root, "modules")
            .map(|modules| {
                modules
                    .children()
                    .filter(|child| child.is_element() && child.tag_name().name() == "module")
                    .filter_map(|child| child.text())
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProjectDescriptor {
            group_id: child_text(root, "groupId"),
            artifact_id,
            version,
            packaging,
            parent,
            modules,
            file: path.to_path_buf(),
        })
    }
}

fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn child_text(node: roxmltree::Node, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
