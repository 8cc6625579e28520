use crate::errors::IoContext;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tempdir::TempDir;

/// A file in a temporary directory beside an image, which the rewritten image is
/// written to. Committing it renames it over the image; dropping it without a commit
/// removes it, and the original image is never touched.
pub(crate) struct Staging {
    dir:      TempDir,
    path:     PathBuf,
    pub file: File,
}

impl Staging {
    pub fn new(target: &Path) -> io::Result<Staging> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let dir = TempDir::new_in(parent, "sider")
            .with_context(|why| format!("failed to create staging directory: {}", why))?;
        let path = dir.path().join("image");
        let file = OpenOptions::new().read(true).write(true).create_new(true).open(&path)?;
        debug!("staging {} at {}", target.display(), path.display());

        Ok(Staging { dir, path, file })
    }

    /// Replaces `target` with the staged file, carrying over its permissions.
    pub fn commit(self, target: &Path) -> io::Result<()> {
        self.file.sync_all()?;
        let permissions = fs::metadata(target)?.permissions();
        fs::set_permissions(&self.path, permissions)?;

        fs::rename(&self.path, target).with_context(|why| {
            format!("failed to replace {} with {}: {}", target.display(), self.path.display(), why)
        })?;

        debug!("committed {}", target.display());
        drop(self.dir);
        Ok(())
    }
}
