//! Installer builder and recursive resolver.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::error::{InstallerError, InstallerResult};
use crate::generator::GeneratorRef;
use crate::loader::{LibraryPath, ModuleLoader};
use crate::manifest::Manifest;

/// Default recursion depth at which resolution fails.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Contribution sources added by [`Installer::with`].
#[derive(Debug, Clone, Default)]
pub struct Contributions {
    /// Library paths, `"<package>.<export.path>"`.
    pub from_libraries: Vec<String>,
    /// Generators.
    pub from_generators: Vec<GeneratorRef>,
    /// Already resolved manifests.
    pub from_manifests: Vec<Arc<Manifest>>,
}

impl Contributions {
    /// No contributions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a library path.
    #[must_use]
    pub fn library(mut self, path: impl Into<String>) -> Self {
        self.from_libraries.push(path.into());
        self
    }

    /// Add library paths.
    #[must_use]
    pub fn libraries<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from_libraries.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add a generator.
    #[must_use]
    pub fn generator(mut self, generator: GeneratorRef) -> Self {
        self.from_generators.push(generator);
        self
    }

    /// Add a resolved manifest.
    #[must_use]
    pub fn manifest(mut self, manifest: impl Into<Arc<Manifest>>) -> Self {
        self.from_manifests.push(manifest.into());
        self
    }
}

/// Immutable set of contribution sources.
///
/// Each of the three sources is an insertion-ordered set: libraries by
/// path, generators and manifests by identity.
#[derive(Debug, Clone, Default)]
pub struct Installer {
    library_manifests: Vec<String>,
    generator_manifests: Vec<GeneratorRef>,
    resolved_manifests: Vec<Arc<Manifest>>,
}

impl Installer {
    /// An installer with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new installer whose sources are this one's plus `contributions`.
    /// The receiver is left untouched.
    #[must_use]
    pub fn with(&self, contributions: Contributions) -> Self {
        let mut next = self.clone();
        for path in contributions.from_libraries {
            if !next.library_manifests.contains(&path) {
                next.library_manifests.push(path);
            }
        }
        for generator in contributions.from_generators {
            if !next.generator_manifests.contains(&generator) {
                next.generator_manifests.push(generator);
            }
        }
        for manifest in contributions.from_manifests {
            if !next
                .resolved_manifests
                .iter()
                .any(|m| Arc::ptr_eq(m, &manifest))
            {
                next.resolved_manifests.push(manifest);
            }
        }
        next
    }

    /// Library paths.
    #[must_use]
    pub fn library_manifests(&self) -> &[String] {
        &self.library_manifests
    }

    /// Generators.
    #[must_use]
    pub fn generator_manifests(&self) -> &[GeneratorRef] {
        &self.generator_manifests
    }

    /// Resolved manifests.
    #[must_use]
    pub fn resolved_manifests(&self) -> &[Arc<Manifest>] {
        &self.resolved_manifests
    }

    /// Whether no source is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.library_manifests.is_empty()
            && self.generator_manifests.is_empty()
            && self.resolved_manifests.is_empty()
    }

    /// Resolve into one merged manifest with the default depth limit.
    ///
    /// # Errors
    ///
    /// See [`resolve_with_depth`](Self::resolve_with_depth).
    pub async fn resolve(&self, loader: &dyn ModuleLoader) -> InstallerResult<Manifest> {
        self.resolve_with_depth(loader, DEFAULT_MAX_DEPTH).await
    }

    /// Resolve into one merged manifest.
    ///
    /// Every generator reachable from this installer, directly or through a
    /// library, runs at most once.
    ///
    /// # Errors
    ///
    /// - [`InstallerError::MaxRecursionDepthExceeded`] if the generator
    ///   graph reaches `max_depth`
    /// - [`InstallerError::Loader`] if a library package cannot be installed
    /// - any error returned by a generator
    pub async fn resolve_with_depth(
        &self,
        loader: &dyn ModuleLoader,
        max_depth: u32,
    ) -> InstallerResult<Manifest> {
        let mut resolution = Resolution {
            loader,
            max_depth,
            visited: Vec::new(),
        };
        let manifests = resolution.resolve_at(self, 0).await?;
        let merged = Manifest::merge(&manifests);
        info!(
            ids = ?merged.id.ids(),
            generators = resolution.visited.len(),
            "installer resolved"
        );
        Ok(merged)
    }
}

struct Resolution<'a> {
    loader: &'a dyn ModuleLoader,
    max_depth: u32,
    visited: Vec<GeneratorRef>,
}

impl<'a> Resolution<'a> {
    fn resolve_at<'s>(
        &'s mut self,
        installer: &'s Installer,
        depth: u32,
    ) -> BoxFuture<'s, InstallerResult<Vec<Arc<Manifest>>>>
    where
        'a: 's,
    {
        async move {
            if depth >= self.max_depth {
                return Err(InstallerError::MaxRecursionDepthExceeded { depth });
            }
            debug!(
                depth,
                libraries = installer.library_manifests.len(),
                generators = installer.generator_manifests.len(),
                manifests = installer.resolved_manifests.len(),
                "resolving installer"
            );

            let packages: Vec<String> = installer
                .library_manifests
                .iter()
                .map(|p| LibraryPath::parse(p).package.to_owned())
                .collect();
            if !packages.is_empty() {
                self.loader.install(&packages).await?;
            }

            let mut candidates: Vec<GeneratorRef> = installer.generator_manifests.clone();
            for raw in &installer.library_manifests {
                let path = LibraryPath::parse(raw);
                match self.loader.entry_point(path.package, &path.export_path) {
                    Some(generator) => candidates.push(generator),
                    None => warn!(library = %raw, "no install entry found for library, skipping"),
                }
            }

            let mut fresh: Vec<GeneratorRef> = Vec::new();
            for generator in candidates {
                if !self.visited.contains(&generator) && !fresh.contains(&generator) {
                    fresh.push(generator);
                }
            }
            self.visited.extend(fresh.iter().cloned());

            let mut resolved: Vec<Arc<Manifest>> = installer.resolved_manifests.clone();
            for generator in fresh {
                debug!(generator = generator.name(), depth, "running generator");
                let produced = generator.generate(Installer::new()).await?;
                let nested = self.resolve_at(&produced, depth.saturating_add(1)).await?;
                resolved.extend(nested);
            }
            Ok(resolved)
        }
        .boxed()
    }
}
