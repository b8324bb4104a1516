//! Configuration for the watched directory.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// Configuration for the single watched directory.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Path to the directory.
    pub path: PathBuf,

    /// Extensions to notify about, each with its leading dot (e.g. `.txt`).
    /// An empty set allows every extension.
    pub allowed_extensions: BTreeSet<String>,

    /// Whether directory events produce notifications.
    pub include_directories: bool,

    /// Whether subdirectories are watched too.
    pub recursive: bool,
}

impl WatchConfig {
    /// Create a new watch config with no filters, non-recursive.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            allowed_extensions: BTreeSet::new(),
            include_directories: false,
            recursive: false,
        }
    }

    /// Allow an extension. A missing leading dot is added.
    pub fn allow_extension(mut self, extension: impl AsRef<str>) -> Self {
        if let Some(ext) = normalize_extension(extension.as_ref()) {
            self.allowed_extensions.insert(ext);
        }
        self
    }

    /// Allow every extension in a comma-separated list such as `.txt,pdf`.
    pub fn with_extension_list(mut self, list: &str) -> Self {
        self.allowed_extensions
            .extend(list.split(',').filter_map(normalize_extension));
        self
    }

    /// Include directory events.
    pub fn include_directories(mut self, include: bool) -> Self {
        self.include_directories = include;
        self
    }

    /// Watch subdirectories recursively.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Check that the configuration can be watched.
    pub fn validate(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(WatcherError::DirectoryNotFound(
                self.path.display().to_string(),
            ));
        }

        if !self.path.is_dir() {
            return Err(WatcherError::NotADirectory(self.path.display().to_string()));
        }

        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| ext.len() < 2 || ext[1..].contains(['.', '/']))
        {
            return Err(WatcherError::InvalidExtension(bad.clone()));
        }

        Ok(())
    }

    /// Human readable summary of the filters in effect.
    pub fn describe_filters(&self) -> String {
        let extensions = if self.allowed_extensions.is_empty() {
            "all".to_string()
        } else {
            self.allowed_extensions
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "extensions: {extensions}; directories: {}; recursive: {}",
            if self.include_directories { "included" } else { "excluded" },
            if self.recursive { "yes" } else { "no" },
        )
    }
}

/// Trim an extension and make sure it starts with a dot. Blank input yields `None`.
fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('.') {
        Some(trimmed.to_string())
    } else {
        Some(format!(".{trimmed}"))
    }
}
