use std::path::Path;

/// Read-only filesystem checks.
pub trait FsProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// File contents, or `None` if the file is missing or unreadable.
    fn read_to_string(&self, path: &Path) -> Option<String>;

    /// Whether the directory can be listed by this process.
    fn can_list_dir(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFs;

impl FsProbe for SystemFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "unreadable");
                None
            }
        }
    }

    fn can_list_dir(&self, path: &Path) -> bool {
        std::fs::read_dir(path).is_ok()
    }
}
