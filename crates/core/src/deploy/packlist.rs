//! Publish filter
//!
//! Approximates the file list `npm pack` would produce for a package folder.
//! A `files` list in package.json selects what is included, and its `!`
//! entries take paths back out. Without one, `.npmignore` (or `.gitignore`
//! when there is no `.npmignore`) decides what is left out. Both use
//! gitignore rules where the last matching pattern wins.

use std::path::{Component, Path};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::configs::manifest::{PackageManifest, MANIFEST_FILE_NAME};
use crate::types::{DeployError, DeployResult};

const ALWAYS_EXCLUDED_NAMES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "CVS",
    ".DS_Store",
    ".npmrc",
    "npm-debug.log",
    ".npmignore",
    ".gitignore",
    "node_modules",
];

const ALWAYS_INCLUDED_PREFIXES: &[&str] = &["readme", "license", "licence"];

#[derive(Debug)]
enum Selection {
    /// Only paths matching the manifest's `files` list
    Files(Rules),
    /// Everything except paths ignored by the rules
    Ignore(Rules),
}

/// Ordered gitignore-style patterns.
///
/// Every rule contributes exactly two globs, so glob `i` belongs to rule `i / 2`.
#[derive(Debug)]
struct Rules {
    set: GlobSet,
    negated: Vec<bool>,
}

impl Rules {
    /// Whether the last rule matching `relative` is a positive one
    fn selects(&self, relative: &Path) -> bool {
        self.set
            .matches(relative)
            .into_iter()
            .max()
            .map(|glob_index| !self.negated[glob_index / 2])
            .unwrap_or(false)
    }
}

#[derive(Debug)]
pub struct PublishFilter {
    selection: Selection,
    /// `main` and `bin` targets, which npm publishes regardless of the selection
    entry_points: Vec<String>,
}

impl PublishFilter {
    /// Build the filter for a package folder
    pub fn load(package_folder: &Path) -> DeployResult<Self> {
        let manifest = PackageManifest::load(&package_folder.join(MANIFEST_FILE_NAME))?;
        let entry_points = manifest
            .main
            .iter()
            .cloned()
            .chain(manifest.bin_paths())
            .map(|path| clean_pattern(&path))
            .filter(|path| !path.is_empty())
            .collect();

        if let Some(files) = &manifest.files {
            return Ok(Self {
                selection: Selection::Files(files_rules(files)?),
                entry_points,
            });
        }

        let ignore_file = [".npmignore", ".gitignore"]
            .iter()
            .map(|name| package_folder.join(name))
            .find(|path| path.is_file());

        let content = match ignore_file {
            Some(path) => std::fs::read_to_string(&path)?,
            None => String::new(),
        };

        Ok(Self {
            selection: Selection::Ignore(ignore_rules(&content)?),
            entry_points,
        })
    }

    /// Whether the walk should descend into a directory
    pub fn allows_dir(&self, relative: &Path) -> bool {
        if is_always_excluded(relative) {
            return false;
        }
        if self
            .entry_points
            .iter()
            .any(|entry| Path::new(entry).starts_with(relative))
        {
            return true;
        }
        match &self.selection {
            // Nested `files` entries may live below any directory
            Selection::Files(_) => true,
            Selection::Ignore(rules) => !rules.selects(relative),
        }
    }

    /// Whether a file (or link) is part of the published package
    pub fn allows_file(&self, relative: &Path) -> bool {
        if is_always_excluded(relative) {
            return false;
        }
        if self.is_always_included(relative) {
            return true;
        }
        match &self.selection {
            Selection::Files(rules) => rules.selects(relative),
            Selection::Ignore(rules) => !rules.selects(relative),
        }
    }

    fn is_always_included(&self, relative: &Path) -> bool {
        if relative.components().count() == 1 {
            let name = relative.to_string_lossy().to_ascii_lowercase();
            if name == MANIFEST_FILE_NAME
                || ALWAYS_INCLUDED_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            {
                return true;
            }
        }

        self.entry_points
            .iter()
            .any(|entry| Path::new(entry) == relative)
    }
}

fn is_always_excluded(relative: &Path) -> bool {
    let top_level = relative.components().count() == 1;
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            let name: &str = &name;
            ALWAYS_EXCLUDED_NAMES.contains(&name)
                || name.ends_with(".orig")
                || (name.starts_with('.') && name.ends_with(".swp"))
                || (top_level && name == "package-lock.json")
        }
        _ => false,
    })
}

fn clean_pattern(pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.trim_matches('/').to_string()
}

/// `*` and `?` stay within one path segment; only `**` crosses directories
fn glob(pattern: &str) -> DeployResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| DeployError::Config(format!("Invalid package file pattern '{}': {}", pattern, e)))
}

fn build_rules(builder: GlobSetBuilder, negated: Vec<bool>, what: &str) -> DeployResult<Rules> {
    let set = builder
        .build()
        .map_err(|e| DeployError::Config(format!("Failed to build {} filter: {}", what, e)))?;
    Ok(Rules { set, negated })
}

/// `files` entries are relative to the package root
fn files_rules(files: &[String]) -> DeployResult<Rules> {
    let mut builder = GlobSetBuilder::new();
    let mut negated = Vec::new();

    for entry in files {
        let (is_negated, body) = match entry.trim().strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, entry.as_str()),
        };
        let pattern = clean_pattern(body);
        if pattern.is_empty() {
            continue;
        }
        builder.add(glob(&pattern)?);
        builder.add(glob(&format!("{}/**", pattern))?);
        negated.push(is_negated);
    }

    build_rules(builder, negated, "files")
}

/// Translate gitignore-style lines into ordered rules
fn ignore_rules(content: &str) -> DeployResult<Rules> {
    let mut builder = GlobSetBuilder::new();
    let mut negated = Vec::new();

    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (is_negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let body = body.trim_end_matches('/');
        let anchored = body.starts_with('/') || body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            continue;
        }

        let base = if anchored {
            body.to_string()
        } else {
            format!("**/{}", body)
        };
        builder.add(glob(&base)?);
        builder.add(glob(&format!("{}/**", base))?);
        negated.push(is_negated);
    }

    build_rules(builder, negated, "ignore")
}
