use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};

/// Capacity of the filesystem holding a directory, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl DiskUsage {
    /// Space a benchmark may use: total minus used, which includes blocks
    /// reserved for root.
    pub fn available(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    #[cfg(unix)]
    pub fn probe(path: &Path) -> Result<Self> {
        use nix::sys::statvfs::statvfs;

        let stat = statvfs(path).map_err(|e| {
            BenchError::io(
                format!("Failed to query capacity of {}", path.display()),
                std::io::Error::from(e),
            )
        })?;

        let fragment = stat.fragment_size() as u64;
        let total = stat.blocks() as u64 * fragment;
        let free = stat.blocks_available() as u64 * fragment;
        let used = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64) * fragment;

        Ok(Self { total, used, free })
    }

    #[cfg(not(unix))]
    pub fn probe(path: &Path) -> Result<Self> {
        use sysinfo::{DiskExt, System, SystemExt};

        let resolved = path.canonicalize().map_err(|e| {
            BenchError::io(format!("Failed to resolve {}", path.display()), e)
        })?;
        // Mount points are listed without the `\\?\` verbatim prefix.
        let resolved = match resolved.to_string_lossy().strip_prefix(r"\\?\") {
            Some(plain) => PathBuf::from(plain),
            None => resolved.clone(),
        };

        let mut sys = System::new();
        sys.refresh_disks_list();
        sys.refresh_disks();
        let mounts: Vec<MountCapacity> = sys
            .disks()
            .iter()
            .map(|d| MountCapacity {
                mount_point: d.mount_point().to_path_buf(),
                total: d.total_space(),
                available: d.available_space(),
            })
            .collect();

        usage_for_path(&resolved, &mounts).ok_or_else(|| {
            BenchError::io(
                format!("Failed to query capacity of {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no disk holds this path"),
            )
        })
    }
}

/// Capacity of one mounted disk as reported by the OS disk list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountCapacity {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

/// Usage of the disk whose mount point is the longest prefix of `path`.
pub fn usage_for_path(path: &Path, mounts: &[MountCapacity]) -> Option<DiskUsage> {
    mounts
        .iter()
        .filter(|m| path.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
        .map(|m| DiskUsage {
            total: m.total,
            used: m.total.saturating_sub(m.available),
            free: m.available,
        })
}

/// Fails unless `requested` bytes fit in the space left at `path`.
pub fn check_capacity(path: &Path, usage: &DiskUsage, requested: u64) -> Result<()> {
    let available = usage.available();
    if requested > available {
        return Err(BenchError::InsufficientSpace {
            path: path.to_path_buf(),
            needed: requested,
            available,
        });
    }
    Ok(())
}
