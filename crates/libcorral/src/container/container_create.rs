use super::Container;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;
use crate::types::BackendStore;

// Template that unprivileged callers are restricted to.
const DOWNLOAD_TEMPLATE: &str = "download";

impl Container {
    /// Provisions the container's root filesystem with `template` on
    /// `backend`, passing `args` through to the template.
    ///
    /// The engine decides which templates the caller may use; unprivileged
    /// callers only get the download template.
    pub fn create_using(
        &self,
        template: &str,
        backend: BackendStore,
        args: &[String],
    ) -> Result<()> {
        self.make_sure(Precondition::NOT_DEFINED)?;

        let inner = self.write();
        tracing::debug!(
            name = %inner.name(),
            template,
            %backend,
            verbosity = ?inner.verbosity,
            "creating container"
        );
        if !inner
            .engine()
            .create(template, backend, inner.verbosity, args)
        {
            tracing::error!(name = %inner.name(), template, %backend, "engine failed to create container");
            return Err(LibcorralError::CreateFailed { name: inner.name() });
        }
        Ok(())
    }

    /// Creates the container on a plain directory.
    pub fn create(&self, template: &str, args: &[String]) -> Result<()> {
        self.create_using(template, BackendStore::Directory, args)
    }

    /// Creates the container from a prebuilt image, which is what
    /// unprivileged users are allowed to do.
    pub fn create_as_user(
        &self,
        distro: &str,
        release: &str,
        arch: &str,
        args: &[String],
    ) -> Result<()> {
        let mut template_args: Vec<String> = ["-d", distro, "-r", release, "-a", arch]
            .iter()
            .map(|s| s.to_string())
            .collect();
        template_args.extend_from_slice(args);

        self.create_using(DOWNLOAD_TEMPLATE, BackendStore::Directory, &template_args)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};
    use crate::types::Verbosity;

    #[test]
    fn test_create_defines_container() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;

        container.create_using("busybox", BackendStore::Btrfs, &[])?;
        assert!(container.defined());
        assert!(!container.running());
        assert_eq!(
            engine.last_create("rubik"),
            Some(("busybox".to_owned(), BackendStore::Btrfs, Verbosity::Quiet))
        );
        Ok(())
    }

    #[test]
    fn test_create_twice() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.create("busybox", &[])?;

        assert!(matches!(
            container.create("busybox", &[]),
            Err(LibcorralError::AlreadyDefined { .. })
        ));
        assert_eq!(engine.calls("rubik", Primitive::Create), 1);
        Ok(())
    }

    #[test]
    fn test_unprivileged_create_needs_download_template() -> Result<()> {
        let engine = MemoryEngine::unprivileged();
        let container = Container::new(&engine, "rubik", None)?;

        assert!(matches!(
            container.create("busybox", &[]),
            Err(LibcorralError::CreateFailed { .. })
        ));
        assert!(!container.defined());

        container.create_as_user("ubuntu", "noble", "amd64", &[])?;
        assert!(container.defined());
        Ok(())
    }

    #[test]
    fn test_create_passes_verbosity() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = Container::new(&engine, "rubik", None)?;
        container.set_verbosity(Verbosity::Verbose);

        container.create("busybox", &[])?;
        assert_eq!(
            engine.last_create("rubik").map(|(_, _, verbosity)| verbosity),
            Some(Verbosity::Verbose)
        );
        Ok(())
    }
}
