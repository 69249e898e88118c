//! Integration tests for version propagation across a POM tree

use pom_set_version::{
    config::Settings,
    error::SetVersionError,
    pom::discover_projects,
    propagator::propagate,
    report::LogReporter,
    rewriter::{PARENT_VERSION_PATH, PROJECT_VERSION_PATH},
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NS: &str = r#"xmlns="http://maven.apache.org/POM/4.0.0""#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn field(path: &Path, expression: &str) -> Option<String> {
    let text = fs::read_to_string(path).unwrap();
    let document = roxmltree::Document::parse(&text).unwrap();
    let mut node = document.root();
    for segment in expression.split('/').filter(|s| !s.is_empty()) {
        let local = segment.trim_start_matches("p:");
        node = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == local)?;
    }
    node.text().map(str::to_string)
}

/// core (pom, 1.0) with core-api inheriting 1.0, core-impl on 0.9-custom,
/// and tools, a module with no parent.
fn create_core_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write(
        &root.join("pom.xml"),
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project {NS}>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.example</groupId>
  <artifactId>core</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <modules>
    <module>core-api</module>
    <module>core-impl</module>
    <module>tools</module>
  </modules>
</project>
"#
        ),
    );
    write(
        &root.join("core-api").join("pom.xml"),
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project {NS}>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>core</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>core-api</artifactId>
  <version>1.0</version>
</project>
"#
        ),
    );
    write(
        &root.join("core-impl").join("pom.xml"),
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project {NS}>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>core</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>core-impl</artifactId>
  <version>0.9-custom</version>
  <properties>
    <core.version>1.0</core.version>
  </properties>
</project>
"#
        ),
    );

    write(
        &root.join("tools").join("pom.xml"),
        &format!(
            "<project {NS}><artifactId>tools</artifactId><version>7</version><properties><core.version>1.0</core.version></properties></project>"
        ),
    );

    temp_dir
}

#[test]
fn test_discover_projects_follows_modules() {
    let temp_dir = create_core_tree();
    write(
        &temp_dir.path().join("target").join("pom.xml"),
        "<project><artifactId>stale</artifactId><version>0</version></project>",
    );

    let projects = discover_projects(temp_dir.path()).unwrap();
    let ids: Vec<&str> = projects.iter().map(|p| p.artifact_id.as_str()).collect();

    assert_eq!(ids, vec!["core", "core-api", "core-impl", "tools"]);
}

#[test]
fn test_fixture_poms_outside_modules_are_left_alone() {
    let temp_dir = create_core_tree();
    let root = temp_dir.path();
    let fixture = root.join("core-impl").join("src").join("it").join("sample").join("pom.xml");
    let fixture_content = "<project><artifactId>sample</artifactId><version>1.0</version><properties><core.version>1.0</core.version></properties></project>";
    write(&fixture, fixture_content);
    write(
        &root.join("src").join("test").join("resources").join("broken").join("pom.xml"),
        "<project><artifactId>broken",
    );

    let projects = discover_projects(root).unwrap();
    assert_eq!(projects.len(), 4);

    let settings = Settings::new("core", "2.0").with_extra_paths("/project/properties/core.version");
    propagate(&projects, &settings, &LogReporter).unwrap();

    assert_eq!(fs::read_to_string(&fixture).unwrap(), fixture_content);
    assert!(!fixture.with_file_name("pom.xml.bak").exists());
    assert_eq!(
        field(&root.join("tools").join("pom.xml"), "/project/properties/core.version").as_deref(),
        Some("2.0")
    );
}

#[test]
fn test_missing_module_fails_discovery() {
    let temp_dir = TempDir::new().unwrap();
    write(
        &temp_dir.path().join("pom.xml"),
        "<project><artifactId>top</artifactId><version>1</version><packaging>pom</packaging><modules><module>gone</module></modules></project>",
    );

    let err = discover_projects(temp_dir.path()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SetVersionError>(),
        Some(SetVersionError::Read { .. })
    ));
}

#[test]
fn test_core_scenario() {
    let temp_dir = create_core_tree();
    let root = temp_dir.path();
    let projects = discover_projects(root).unwrap();

    propagate(&projects, &Settings::new("core", "2.0"), &LogReporter).unwrap();

    let core = root.join("pom.xml");
    let api = root.join("core-api").join("pom.xml");
    let implementation = root.join("core-impl").join("pom.xml");

    assert_eq!(field(&core, PROJECT_VERSION_PATH).as_deref(), Some("2.0"));
    assert_eq!(field(&api, PARENT_VERSION_PATH).as_deref(), Some("2.0"));
    assert_eq!(field(&api, PROJECT_VERSION_PATH).as_deref(), Some("1.0"));
    assert_eq!(field(&implementation, PROJECT_VERSION_PATH).as_deref(), Some("2.0"));
    assert_eq!(field(&implementation, PARENT_VERSION_PATH).as_deref(), Some("1.0"));
}

#[test]
fn test_propagation_is_transitive_through_aggregates() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        &root.join("pom.xml"),
        "<project><artifactId>top</artifactId><version>1</version><packaging>pom</packaging><modules><module>mid</module></modules></project>",
    );
    write(
        &root.join("mid").join("pom.xml"),
        "<project><parent><artifactId>top</artifactId><version>1</version></parent><artifactId>mid</artifactId><packaging>pom</packaging><modules><module>leaf</module></modules></project>",
    );
    write(
        &root.join("mid").join("leaf").join("pom.xml"),
        "<project><parent><artifactId>mid</artifactId><version>1</version></parent><artifactId>leaf</artifactId></project>",
    );

    let projects = discover_projects(root).unwrap();
    propagate(&projects, &Settings::new("top", "5"), &LogReporter).unwrap();

    let leaf = root.join("mid").join("leaf").join("pom.xml");
    assert_eq!(field(&leaf, PARENT_VERSION_PATH).as_deref(), Some("5"));
    assert_eq!(field(&root.join("mid").join("pom.xml"), PARENT_VERSION_PATH).as_deref(), Some("5"));
}

#[test]
fn test_extra_paths_apply_to_whole_set() {
    let temp_dir = create_core_tree();
    let root = temp_dir.path();

    let projects = discover_projects(root).unwrap();
    let settings = Settings::new("core-impl", "2.0")
        .with_extra_paths("/project/properties/core.version, /project/missing");
    propagate(&projects, &settings, &LogReporter).unwrap();

    let tools = root.join("tools").join("pom.xml");
    let implementation = root.join("core-impl").join("pom.xml");
    assert_eq!(field(&tools, "/project/properties/core.version").as_deref(), Some("2.0"));
    assert_eq!(field(&tools, PROJECT_VERSION_PATH).as_deref(), Some("7"));
    assert_eq!(
        field(&implementation, "/project/properties/core.version").as_deref(),
        Some("2.0")
    );
    // core-impl is the root here; core is not reachable from it
    assert_eq!(field(&implementation, PROJECT_VERSION_PATH).as_deref(), Some("2.0"));
    assert_eq!(field(&root.join("pom.xml"), PROJECT_VERSION_PATH).as_deref(), Some("1.0"));
}

#[test]
fn test_unknown_root_fails_without_writing() {
    let temp_dir = create_core_tree();
    let root = temp_dir.path();
    let before = fs::read_to_string(root.join("pom.xml")).unwrap();

    let projects = discover_projects(root).unwrap();
    let err = propagate(&projects, &Settings::new("nope", "2.0"), &LogReporter).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SetVersionError>(),
        Some(SetVersionError::ProjectNotFound(_))
    ));
    assert_eq!(fs::read_to_string(root.join("pom.xml")).unwrap(), before);
    assert!(!root.join("pom.xml.bak").exists());
}
