//! Library loading extension point.
//!
//! Installers reference library contributions by dotted path,
//! `"<package>.<export.path>"`. A [`ModuleLoader`] makes packages available
//! and resolves such paths to the generator exported under `install`.
//!
//! [`LibraryRegistry`] is the in-process loader: libraries register their
//! export tree ahead of time and `install` only checks they are known.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::LoaderError;
use crate::generator::GeneratorRef;

/// A library path split into package name and export path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPath<'a> {
    /// Package name (everything before the first `.`).
    pub package: &'a str,
    /// Export path segments below the package root. Empty for the root.
    pub export_path: Vec<&'a str>,
}

impl<'a> LibraryPath<'a> {
    /// Split `"<package>.<export.path>"` at the first `.`.
    #[must_use]
    pub fn parse(path: &'a str) -> Self {
        match path.split_once('.') {
            Some((package, rest)) => Self {
                package,
                export_path: rest.split('.').filter(|s| !s.is_empty()).collect(),
            },
            None => Self {
                package: path,
                export_path: Vec::new(),
            },
        }
    }
}

/// Makes library packages available and exposes their install entries.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Make every package available. Already-installed packages are a
    /// no-op.
    async fn install(&self, packages: &[String]) -> Result<(), LoaderError>;

    /// The generator exported at `export_path` of an installed `package`.
    fn entry_point(&self, package: &str, export_path: &[&str]) -> Option<GeneratorRef>;
}

/// One node of a library's export tree.
#[derive(Debug, Clone, Default)]
pub struct ExportNode {
    install: Option<GeneratorRef>,
    children: BTreeMap<String, ExportNode>,
}

impl ExportNode {
    fn insert(&mut self, path: &[&str], generator: GeneratorRef) {
        match path.split_first() {
            None => self.install = Some(generator),
            Some((head, rest)) => self
                .children
                .entry((*head).to_owned())
                .or_default()
                .insert(rest, generator),
        }
    }

    fn find(&self, path: &[&str]) -> Option<&ExportNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(*head)?.find(rest),
        }
    }
}

/// A library's exports, registered ahead of time.
#[derive(Debug, Clone)]
pub struct LibraryModule {
    package: String,
    root: ExportNode,
}

impl LibraryModule {
    /// An empty library for `package`.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            root: ExportNode::default(),
        }
    }

    /// Export `generator` as the `install` entry at dotted `path`
    /// (empty for the package root).
    #[must_use]
    pub fn export(mut self, path: &str, generator: GeneratorRef) -> Self {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        self.root.insert(&segments, generator);
        self
    }

    /// Package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }
}

/// In-process [`ModuleLoader`].
#[derive(Debug, Default)]
pub struct LibraryRegistry {
    libraries: RwLock<HashMap<String, LibraryModule>>,
    installed: RwLock<HashSet<String>>,
}

impl LibraryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a library.
    pub fn register(&self, module: LibraryModule) {
        debug!(package = %module.package, "registering library");
        self.libraries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module.package.clone(), module);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_library(self, module: LibraryModule) -> Self {
        self.register(module);
        self
    }

    /// Whether `package` has been installed.
    #[must_use]
    pub fn is_installed(&self, package: &str) -> bool {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(package)
    }
}

#[async_trait]
impl ModuleLoader for LibraryRegistry {
    async fn install(&self, packages: &[String]) -> Result<(), LoaderError> {
        let libraries = self.libraries.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(unknown) = packages.iter().find(|p| !libraries.contains_key(p.as_str())) {
            return Err(LoaderError::UnknownPackage(unknown.clone()));
        }
        drop(libraries);

        let mut installed = self.installed.write().unwrap_or_else(PoisonError::into_inner);
        for package in packages {
            if installed.insert(package.clone()) {
                info!(package = %package, "library installed");
            }
        }
        Ok(())
    }

    fn entry_point(&self, package: &str, export_path: &[&str]) -> Option<GeneratorRef> {
        if !self.is_installed(package) {
            return None;
        }
        self.libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package)?
            .root
            .find(export_path)?
            .install
            .clone()
    }
}
