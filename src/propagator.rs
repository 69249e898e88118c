use anyhow::Result;
use std::collections::{HashMap, HashSet};

use crate::config::Settings;
use crate::error::SetVersionError;
use crate::pom::ProjectDescriptor;
use crate::report::Reporter;
use crate::rewriter::{PARENT_VERSION_PATH, PROJECT_VERSION_PATH, PomRewriter};

/// Stamps a new version on a root project and everything that descends
/// from it, then patches the extra paths in every project of the set.
pub struct Propagator<'a> {
    projects: &'a [ProjectDescriptor],
    settings: &'a Settings,
    rewriter: PomRewriter,
    /// Project index -> indices of the projects whose parent it is, in set order.
    children: HashMap<usize, Vec<usize>>,
}

impl<'a> Propagator<'a> {
    pub fn new(projects: &'a [ProjectDescriptor], settings: &'a Settings) -> Self {
        Propagator {
            projects,
            settings,
            rewriter: PomRewriter::new(settings.rewriter.clone()),
            children: index_children(projects),
        }
    }

    pub fn children_of(&self, index: usize) -> &[usize] {
        self.children.get(&index).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn root_index(&self) -> Result<usize> {
        self.projects
            .iter()
            .position(|project| project.artifact_id == self.settings.artifact_id)
            .ok_or_else(|| SetVersionError::ProjectNotFound(self.settings.artifact_id.clone()).into())
    }

    /// Fails fast: the first failed update ends the run, earlier writes stay.
    pub fn run(&self, reporter: &dyn Reporter) -> Result<()> {
        let root = self.root_index()?;

        let mut visited = HashSet::new();
        self.update_version(root, &mut visited, reporter)?;

        for project in self.projects {
            self.update_extras(project, reporter)?;
        }
        Ok(())
    }

    fn update_version(
        &self,
        index: usize,
        visited: &mut HashSet<usize>,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        let project = &self.projects[index];
        if !visited.insert(index) {
            reporter.warn(&format!(
                "Skipping {}: already updated in this run, its parent chain loops back to it",
                project.id()
            ));
            return Ok(());
        }

        if project.inherits_parent_version() {
            self.update_parent_version(project, reporter)?;
        } else {
            self.update_main_version(project, reporter)?;
        }

        if project.packaging.is_aggregate() {
            for &child in self.children_of(index) {
                self.update_version(child, visited, reporter)?;
            }
        }
        Ok(())
    }

    fn update_parent_version(&self, project: &ProjectDescriptor, reporter: &dyn Reporter) -> Result<()> {
        reporter.info(&format!(
            "Updating parent version for: {} to: {}",
            project.id(),
            self.settings.new_version
        ));
        self.rewriter.apply_update(
            &project.file,
            PARENT_VERSION_PATH,
            &self.settings.new_version,
            true,
            reporter,
        )?;
        Ok(())
    }

    fn update_main_version(&self, project: &ProjectDescriptor, reporter: &dyn Reporter) -> Result<()> {
        reporter.info(&format!(
            "Updating project version for: {} to: {}",
            project.id(),
            self.settings.new_version
        ));
        self.rewriter.apply_update(
            &project.file,
            PROJECT_VERSION_PATH,
            &self.settings.new_version,
            true,
            reporter,
        )?;
        Ok(())
    }

    fn update_extras(&self, project: &ProjectDescriptor, reporter: &dyn Reporter) -> Result<()> {
        for path in &self.settings.extra_paths {
            reporter.info(&format!(
                "Updating version in path: {} of POM: {} to: {}",
                path,
                project.file.display(),
                self.settings.new_version
            ));
            self.rewriter.apply_update(
                &project.file,
                path,
                &self.settings.new_version,
                false,
                reporter,
            )?;
        }
        Ok(())
    }
}

/// Convenience wrapper: one propagation run over `projects`.
pub fn propagate(projects: &[ProjectDescriptor], settings: &Settings, reporter: &dyn Reporter) -> Result<()> {
    Propagator::new(projects, settings).run(reporter)
}

fn index_children(projects: &[ProjectDescriptor]) -> HashMap<usize, Vec<usize>> {
    let mut by_coordinates: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (index, project) in projects.iter().enumerate() {
        by_coordinates
            .entry((project.artifact_id.as_str(), project.version.as_str()))
            .or_default()
            .push(index);
    }

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, project) in projects.iter().enumerate() {
        let Some(parent) = &project.parent else {
            continue;
        };
        let candidates = by_coordinates
            .get(&(parent.artifact_id.as_str(), parent.version.as_str()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        for &candidate in candidates {
            if parent.refers_to(&projects[candidate]) {
                children.entry(candidate).or_default().push(index);
            }
        }
    }
    children
}
