//! Companion Script Module
//!
//! Hand-written script fragments merged into a generated module, keyed by
//! the class's simple name. A class without a companion is the common case
//! and is never an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const COMPANION_EXTENSION: &str = "js";

/// Resolves the companion script of a class, if it ships one.
pub trait ScriptResolver: Sync {
    fn resolve(&self, class_name: &str) -> Option<String>;
}

/// Strip any namespace or path prefix: `demo.Echo`, `demo/Echo` and
/// `demo::Echo` all resolve as `Echo`.
pub fn simple_name(class_name: &str) -> &str {
    let after_path = class_name.rsplit(['/', '.']).next().unwrap_or(class_name);
    after_path.rsplit("::").next().unwrap_or(after_path)
}

/// No class has a companion script.
pub struct NoCompanion;

impl ScriptResolver for NoCompanion {
    fn resolve(&self, _class_name: &str) -> Option<String> {
        None
    }
}

/// In-memory companion scripts keyed by simple name.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    scripts: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: &str, script: impl Into<String>) {
        self.scripts
            .insert(simple_name(class_name).to_string(), script.into());
    }

    pub fn with(mut self, class_name: &str, script: impl Into<String>) -> Self {
        self.insert(class_name, script);
        self
    }
}

impl ScriptResolver for MapResolver {
    fn resolve(&self, class_name: &str) -> Option<String> {
        self.scripts.get(simple_name(class_name)).cloned()
    }
}

/// Companion scripts found as `<SimpleName>.js` anywhere under a resource root.
///
/// The tree is indexed once, depth first with each directory's entries
/// sorted by file name. When two files share a stem the first one reached in
/// that walk wins, so `a/Echo.js` shadows `a-b/Echo.js` even though the
/// latter sorts first as a full path.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    index: HashMap<String, PathBuf>,
}

impl DirectoryResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let mut index = HashMap::new();

        if !root.exists() {
            return Self { index };
        }

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .flatten()
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(COMPANION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                index
                    .entry(stem.to_string())
                    .or_insert_with(|| path.to_path_buf());
            }
        }

        Self { index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ScriptResolver for DirectoryResolver {
    fn resolve(&self, class_name: &str) -> Option<String> {
        let path = self.index.get(simple_name(class_name))?;
        match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!(
                    "[StubGen] Failed to read companion script {:?}: {}",
                    path, e
                );
                None
            }
        }
    }
}
