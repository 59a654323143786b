use crate::config::MountConfig;
use crate::error::Error;
use crate::platform;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Exposes an external device as an ordinary directory.
pub trait MountProvider {
    fn ensure_tool_available(&self) -> Result<(), Error>;
    fn mount(&self) -> Result<PathBuf, Error>;
    fn unmount(&self) -> Result<(), Error>;
}

/// Phone volume mounted through `ifuse` and released with `fusermount -u`.
#[derive(Debug, Clone)]
pub struct IfuseMount {
    config: MountConfig,
}

impl IfuseMount {
    pub fn new(config: MountConfig) -> Self {
        Self { config }
    }
}

impl MountProvider for IfuseMount {
    fn ensure_tool_available(&self) -> Result<(), Error> {
        for tool in [&self.config.mount_tool, &self.config.unmount_tool] {
            if platform::find_in_path(tool).is_none() {
                return Err(Error::ToolMissing(tool.clone()));
            }
        }
        Ok(())
    }

    fn mount(&self) -> Result<PathBuf, Error> {
        let mount_point = &self.config.mount_point;
        fs::create_dir_all(mount_point)?;
        let status = Command::new(&self.config.mount_tool)
            .arg(mount_point)
            .status()?;
        if !status.success() {
            return Err(Error::Mount(format!(
                "{} {} exited with {}",
                self.config.mount_tool,
                mount_point.display(),
                status
            )));
        }
        info!("Mounted device at {}", mount_point.display());
        Ok(mount_point.clone())
    }

    fn unmount(&self) -> Result<(), Error> {
        let status = Command::new(&self.config.unmount_tool)
            .args(&self.config.unmount_args)
            .arg(&self.config.mount_point)
            .status()?;
        if !status.success() {
            return Err(Error::Mount(format!(
                "{} exited with {}",
                self.config.unmount_tool, status
            )));
        }
        info!("Unmounted {}", self.config.mount_point.display());
        Ok(())
    }
}

/// Holds a successful mount and unmounts when dropped, whichever way the
/// caller leaves the scope.
pub struct MountGuard<'a> {
    provider: &'a dyn MountProvider,
    root: PathBuf,
}

impl<'a> MountGuard<'a> {
    /// Check the tooling, then mount. Nothing needs undoing if this fails.
    pub fn mount(provider: &'a dyn MountProvider) -> Result<Self, Error> {
        provider.ensure_tool_available()?;
        let root = provider.mount()?;
        Ok(Self { provider, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.provider.unmount() {
            warn!("Failed to unmount {}: {}", self.root.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeMount {
        tool_present: bool,
        mount_fails: bool,
        mounts: Cell<usize>,
        unmounts: Cell<usize>,
    }

    impl MountProvider for FakeMount {
        fn ensure_tool_available(&self) -> Result<(), Error> {
            if self.tool_present {
                Ok(())
            } else {
                Err(Error::ToolMissing("ifuse".to_string()))
            }
        }

        fn mount(&self) -> Result<PathBuf, Error> {
            if self.mount_fails {
                return Err(Error::Mount("device locked".to_string()));
            }
            self.mounts.set(self.mounts.get() + 1);
            Ok(PathBuf::from("/mnt/phone"))
        }

        fn unmount(&self) -> Result<(), Error> {
            self.unmounts.set(self.unmounts.get() + 1);
            Ok(())
        }
    }

    fn use_mount_then_fail(provider: &FakeMount) -> Result<(), Error> {
        let guard = MountGuard::mount(provider)?;
        assert_eq!(guard.root(), Path::new("/mnt/phone"));
        Err(Error::Other("copy aborted".to_string()))
    }

    #[test]
    fn test_guard_unmounts_on_early_return() {
        let provider = FakeMount {
            tool_present: true,
            ..FakeMount::default()
        };
        assert!(use_mount_then_fail(&provider).is_err());
        assert_eq!(provider.mounts.get(), 1);
        assert_eq!(provider.unmounts.get(), 1);
    }

    #[test]
    fn test_missing_tool_never_mounts() {
        let provider = FakeMount::default();
        assert!(matches!(
            MountGuard::mount(&provider),
            Err(Error::ToolMissing(_))
        ));
        assert_eq!(provider.mounts.get(), 0);
        assert_eq!(provider.unmounts.get(), 0);
    }

    #[test]
    fn test_failed_mount_is_not_unmounted() {
        let provider = FakeMount {
            tool_present: true,
            mount_fails: true,
            ..FakeMount::default()
        };
        assert!(MountGuard::mount(&provider).is_err());
        assert_eq!(provider.unmounts.get(), 0);
    }
}
