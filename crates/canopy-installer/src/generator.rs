//! Manifest generators.
//!
//! A generator receives a fresh [`Installer`] and returns it extended with
//! its contributions. Generators are compared by identity: the same
//! generator reachable twice in a resolution tree runs once.

use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::InstallerResult;
use crate::installer::Installer;

/// Produces contributions by extending an installer.
#[async_trait]
pub trait ManifestGenerator: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Extend `installer` with this generator's contributions.
    async fn generate(&self, installer: Installer) -> InstallerResult<Installer>;
}

/// Shared handle to a generator, compared by identity.
#[derive(Clone)]
pub struct GeneratorRef(Arc<dyn ManifestGenerator>);

impl GeneratorRef {
    /// Wrap a generator.
    #[must_use]
    pub fn new(generator: Arc<dyn ManifestGenerator>) -> Self {
        Self(generator)
    }

    /// Generator name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Run the generator.
    ///
    /// # Errors
    ///
    /// Propagates the generator's error.
    pub async fn generate(&self, installer: Installer) -> InstallerResult<Installer> {
        self.0.generate(installer).await
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl PartialEq for GeneratorRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for GeneratorRef {}

impl Hash for GeneratorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.addr(), state);
    }
}

impl fmt::Debug for GeneratorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GeneratorRef").field(&self.name()).finish()
    }
}

impl<G: ManifestGenerator + 'static> From<Arc<G>> for GeneratorRef {
    fn from(generator: Arc<G>) -> Self {
        Self(generator)
    }
}

struct FnGenerator<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> ManifestGenerator for FnGenerator<F>
where
    F: Fn(Installer) -> Fut + Send + Sync,
    Fut: Future<Output = InstallerResult<Installer>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, installer: Installer) -> InstallerResult<Installer> {
        (self.f)(installer).await
    }
}

/// Build a generator from an async closure.
///
/// ```rust
/// use canopy_installer::{Contributions, Manifest, generator_fn};
///
/// let generator = generator_fn("stories", |installer| async move {
///     Ok(installer.with(Contributions::new().manifest(Manifest::new("stories"))))
/// });
/// assert_eq!(generator.name(), "stories");
/// ```
pub fn generator_fn<F, Fut>(name: impl Into<String>, f: F) -> GeneratorRef
where
    F: Fn(Installer) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = InstallerResult<Installer>> + Send + 'static,
{
    GeneratorRef(Arc::new(FnGenerator {
        name: name.into(),
        f,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        let a = generator_fn("same", |i| async move { Ok(i) });
        let b = generator_fn("same", |i| async move { Ok(i) });

        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let set: HashSet<GeneratorRef> = [a.clone(), a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_fn_generator_runs_closure() {
        let generator = generator_fn("libs", |installer| async move {
            Ok(installer.with(crate::Contributions::new().library("lib.entry")))
        });
        let installer = generator.generate(Installer::new()).await.unwrap();
        assert_eq!(installer.library_manifests(), ["lib.entry".to_string()]);
    }
}
