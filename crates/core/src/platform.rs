//! Platform link creation
//!
//! Deployed links are re-created with a mechanism that depends on the host:
//!
//! | Platform | folder link | file link |
//! |---|---|---|
//! | Windows | directory junction | hard link to the resolved target |
//! | Other | relative symbolic link | relative symbolic link |
//!
//! The implementation is chosen once with [`native_link_creator`].

use std::io;
use std::path::{Path, PathBuf};

/// Creates links inside a deployment tree. Both paths are absolute.
pub trait LinkCreator {
    fn name(&self) -> &'static str;

    fn create_folder_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()>;

    fn create_file_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()>;
}

/// Relative symbolic links for Unix-like hosts
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixLinks;

/// Junctions and hard links, which need no elevated rights on Windows
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsLinks;

/// Select the link mechanism of the current host
pub fn native_link_creator() -> Box<dyn LinkCreator> {
    if cfg!(windows) {
        Box::new(WindowsLinks)
    } else {
        Box::new(PosixLinks)
    }
}

/// Path of `target_path` relative to the folder that will contain `link_path`
pub fn relative_link_target(link_path: &Path, target_path: &Path) -> io::Result<PathBuf> {
    let parent = link_path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Link path {} has no parent folder", link_path.display()),
        )
    })?;
    pathdiff::diff_paths(target_path, parent).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Cannot express {} relative to {}",
                target_path.display(),
                parent.display()
            ),
        )
    })
}

impl LinkCreator for PosixLinks {
    fn name(&self) -> &'static str {
        "symbolic links"
    }

    fn create_folder_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()> {
        let relative = relative_link_target(link_path, target_path)?;
        symlink_folder(&relative, link_path)
    }

    fn create_file_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()> {
        let relative = relative_link_target(link_path, target_path)?;
        symlink_file(&relative, link_path)
    }
}

impl LinkCreator for WindowsLinks {
    fn name(&self) -> &'static str {
        "junctions and hard links"
    }

    fn create_folder_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()> {
        // Junctions store absolute targets; the relative form is resolved
        // against the link's parent before it is written.
        let relative = relative_link_target(link_path, target_path)?;
        let parent = link_path.parent().unwrap_or(link_path);
        create_junction(&crate::deploy::links::normalize(&parent.join(relative)), link_path)
    }

    fn create_file_link(&self, link_path: &Path, target_path: &Path) -> io::Result<()> {
        // Hard links cannot be relative
        let resolved = dunce::canonicalize(target_path)?;
        std::fs::hard_link(resolved, link_path)
    }
}

#[cfg(unix)]
fn symlink_folder(target: &Path, link_path: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link_path)
}

#[cfg(unix)]
fn symlink_file(target: &Path, link_path: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link_path)
}

#[cfg(windows)]
fn symlink_folder(target: &Path, link_path: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link_path)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link_path: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link_path)
}

#[cfg(not(any(unix, windows)))]
fn symlink_folder(_target: &Path, _link_path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_target: &Path, _link_path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(windows)]
fn create_junction(target: &Path, link_path: &Path) -> io::Result<()> {
    junction::create(target, link_path)
}

#[cfg(not(windows))]
fn create_junction(_target: &Path, _link_path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "directory junctions are only available on Windows",
    ))
}
