use anyhow::Result;
use log::debug;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use super::ProjectDescriptor;

pub const POM_FILE_NAME: &str = "pom.xml";

/// `path` itself when it names a file, otherwise the `pom.xml` inside it.
fn pom_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(POM_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Build output never holds source POMs.
fn is_build_output(module: &str) -> bool {
    Path::new(module)
        .components()
        .any(|component| component == Component::Normal("target".as_ref()))
}

/// Loads the reactor rooted at `path`: the root POM, then every POM its
/// `<modules>` name, depth first in declaration order. A POM reached twice
/// is only loaded once.
pub fn discover_projects(path: impl AsRef<Path>) -> Result<Vec<ProjectDescriptor>> {
    let mut projects = vec![];
    let mut seen = HashSet::new();
    collect(&pom_file(path.as_ref()), &mut projects, &mut seen)?;
    debug!(
        "Found projects: {:?}",
        projects.iter().map(|p| &p.file).collect::<Vec<_>>()
    );
    Ok(projects)
}

fn collect(
    file: &Path,
    projects: &mut Vec<ProjectDescriptor>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    let key = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    if !seen.insert(key) {
        debug!("Skipping '{}': already in the reactor", file.display());
        return Ok(());
    }

    debug!("Loading POM: '{}'", file.display());
    let project = ProjectDescriptor::load(file)?;
    let directory = file.parent().unwrap_or(Path::new("."));
    let modules = project.modules.clone();
    projects.push(project);

    for module in &modules {
        if is_build_output(module) {
            debug!("Skipping module '{}' in build output", module);
            continue;
        }
        collect(&pom_file(&directory.join(module)), projects, seen)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_build_output() {
        assert!(is_build_output("target"));
        assert!(is_build_output("sub/target/generated"));
        assert!(!is_build_output("targeted"));
        assert!(!is_build_output("core-api"));
    }

    #[test]
    fn test_pom_file_for_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(pom_file(temp_dir.path()), temp_dir.path().join("pom.xml"));
        let custom = temp_dir.path().join("alt.xml");
        fs::write(&custom, "<project/>").unwrap();
        assert_eq!(pom_file(&custom), custom);
    }

    #[test]
    fn test_module_listed_twice_loads_once() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("pom.xml"),
            "<project><artifactId>root</artifactId><version>1</version><packaging>pom</packaging>\
             <modules><module>a</module><module>./a</module></modules></project>",
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("a")).unwrap();
        fs::write(
            temp_dir.path().join("a").join("pom.xml"),
            "<project><artifactId>a</artifactId><version>1</version></project>",
        )
        .unwrap();

        let projects = discover_projects(temp_dir.path()).unwrap();
        let ids: Vec<&str> = projects.iter().map(|p| p.artifact_id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a"]);
    }
}
