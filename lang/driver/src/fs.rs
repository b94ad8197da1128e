use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use file_system::FileSystemSource;

use moonc_lang_ast::HashMap;

use crate::result::DriverError;

pub trait FileSource: Send {
    /// Check if a file with the given path exists
    fn exists(&self, path: &Path) -> bool;
    /// Read the contents of a file with the given path
    fn read_to_string(&mut self, path: &Path) -> Result<String, DriverError>;
    /// Write the contents of a file with the given path
    ///
    /// Depending on the source, this may write to disk or to memory
    fn write_string(&mut self, path: &Path, contents: &str) -> Result<(), DriverError>;
}

mod file_system {
    use super::*;

    /// A file source that reads from and writes to the file system
    pub struct FileSystemSource {
        root: PathBuf,
    }

    impl FileSystemSource {
        pub fn new<P: AsRef<Path>>(root: P) -> Self {
            Self { root: root.as_ref().to_path_buf() }
        }
    }

    impl FileSource for FileSystemSource {
        fn exists(&self, path: &Path) -> bool {
            self.root.join(path).exists()
        }

        fn read_to_string(&mut self, path: &Path) -> Result<String, DriverError> {
            let full = self.root.join(path);
            let source = std::fs::read_to_string(&full).map_err(|err| {
                DriverError::CannotOpenInput { path: path.to_path_buf(), source: Arc::new(err) }
            })?;
            // Line numbers and spans are the same whether or not git checked out CRLF endings.
            Ok(source.replace("\r\n", "\n"))
        }

        fn write_string(&mut self, path: &Path, contents: &str) -> Result<(), DriverError> {
            let full = self.root.join(path);
            if let Some(dir) = full.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|err| DriverError::CannotCreateOutput {
                    path: path.to_path_buf(),
                    source: Arc::new(err),
                })?;
            }
            std::fs::write(&full, contents).map_err(|err| DriverError::CannotCreateOutput {
                path: path.to_path_buf(),
                source: Arc::new(err),
            })
        }
    }
}

/// A file source that keeps files in memory
#[derive(Default)]
pub struct InMemorySource {
    files: HashMap<PathBuf, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

impl FileSource for InMemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&mut self, path: &Path) -> Result<String, DriverError> {
        self.files.get(path).cloned().ok_or_else(|| DriverError::FileNotFound(path.to_path_buf()))
    }

    fn write_string(&mut self, path: &Path, contents: &str) -> Result<(), DriverError> {
        self.files.insert(path.to_path_buf(), contents.to_owned());
        Ok(())
    }
}
