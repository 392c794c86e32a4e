//! The locally persisted session artifact.
//!
//! Bootstrap writes the session token and the deployment URL as two plain
//! text files, `session` and `url`, into the Coder CLI's own configuration
//! directory. Every subsequent `coder` invocation (template push, workspace
//! management) authenticates through them, and `cleanup` deletes the
//! directory wholesale.

mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use snafu::{OptionExt, ResultExt, ensure};

use crate::consts;

pub use self::error::Error;

#[derive(Clone, Debug)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Discovers the platform session directory: `~/.config/coderv2` on
    /// Linux, the application-support equivalent elsewhere.
    pub fn discover() -> Result<Self, Error> {
        let dirs = ProjectDirs::from("", "", consts::SESSION_DIR_NAME)
            .context(error::NoConfigDirectorySnafu)?;
        Ok(Self { root: dirs.config_dir().to_path_buf() })
    }

    /// A store rooted at an explicit directory.
    #[must_use]
    #[allow(dead_code)]
    pub const fn at(root: PathBuf) -> Self { Self { root } }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    #[must_use]
    #[allow(dead_code)]
    pub fn exists(&self) -> bool {
        self.token_path().try_exists().unwrap_or(false)
    }

    /// Persists the session, overwriting any previous one.
    pub fn write(&self, token: &str, url: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.root)
            .with_context(|_| error::CreateDirectorySnafu { path: self.root.clone() })?;
        for (path, contents) in [(self.token_path(), token), (self.url_path(), url)] {
            std::fs::write(&path, contents)
                .with_context(|_| error::WriteFileSnafu { path: path.clone() })?;
        }
        Ok(())
    }

    pub fn token(&self) -> Result<String, Error> { self.read(&self.token_path()) }

    pub fn url(&self) -> Result<String, Error> { self.read(&self.url_path()) }

    /// Removes the session directory and everything in it. A directory that
    /// never existed counts as already removed.
    pub fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|_| error::RemoveDirectorySnafu { path: self.root.clone() })
            }
        }
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        let contents = std::fs::read_to_string(path)
            .with_context(|_| error::ReadFileSnafu { path: path.to_path_buf() })?;
        let contents = contents.trim().to_string();
        ensure!(!contents.is_empty(), error::EmptySessionSnafu { path: path.to_path_buf() });
        Ok(contents)
    }

    fn token_path(&self) -> PathBuf { self.root.join(consts::SESSION_TOKEN_FILE) }

    fn url_path(&self) -> PathBuf { self.root.join(consts::SESSION_URL_FILE) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = SessionStore::at(dir.path().join("coderv2"));

        store.write("tok-abc123", "http://localhost").expect("Should write session");
        assert!(store.exists());
        assert_eq!(store.token().expect("Should read token"), "tok-abc123");
        assert_eq!(store.url().expect("Should read url"), "http://localhost");
    }

    #[test]
    fn test_write_overwrites_previous_session() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = SessionStore::at(dir.path().join("coderv2"));

        store.write("first", "http://one").expect("Should write session");
        store.write("second", "http://two").expect("Should overwrite session");
        assert_eq!(store.token().expect("Should read token"), "second");
        assert_eq!(store.url().expect("Should read url"), "http://two");
    }

    #[test]
    fn test_missing_session_is_an_error() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = SessionStore::at(dir.path().join("coderv2"));

        let result = store.token();
        assert!(matches!(result, Err(Error::ReadFile { .. })));
    }

    #[test]
    fn test_empty_session_is_an_error() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = SessionStore::at(dir.path().to_path_buf());
        std::fs::write(dir.path().join(consts::SESSION_TOKEN_FILE), "\n")
            .expect("Should write file");

        let result = store.token();
        assert!(matches!(result, Err(Error::EmptySession { .. })));
    }

    #[test]
    fn test_clear_removes_everything_and_tolerates_absence() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = SessionStore::at(dir.path().join("coderv2"));

        store.write("tok", "http://localhost").expect("Should write session");
        store.clear().expect("Should remove session directory");
        assert!(!store.exists());

        // Clearing again is benign.
        store.clear().expect("Should tolerate a missing directory");
    }
}
