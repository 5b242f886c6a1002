//! Where a [`Session`] lives between runs.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::session::Session;

/// Storage for exactly one session.
///
/// The client loads it once on connect and saves after the auth key, the salt
/// or the home DC change, and on disconnect.
pub trait SessionBackend: Send + Sync {
    fn save(&self, session: &Session) -> io::Result<()>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> io::Result<Option<Session>>;

    /// Forget the stored session. Succeeds if there was none.
    fn delete(&self) -> io::Result<()>;

    /// Short label for log lines.
    fn name(&self) -> &str;
}

fn corrupt(e: serde_json::Error) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, e)
}

/// A pretty-printed JSON file; the auth key is stored as base64.
///
/// Saves write `<path>.tmp` and rename it over `path`.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionBackend for JsonFileBackend {
    fn save(&self, session: &Session) -> io::Result<()> {
        let staged = self.path.with_extension("tmp");
        fs::write(&staged, serde_json::to_vec_pretty(session).map_err(corrupt)?)?;
        fs::rename(staged, &self.path)
    }

    fn load(&self) -> io::Result<Option<Session>> {
        match fs::read(&self.path) {
            Ok(json) => serde_json::from_slice(&json).map(Some).map_err(corrupt),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

/// Keeps the session in process memory only.
#[derive(Default)]
pub struct InMemoryBackend {
    slot: Mutex<Option<Session>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for InMemoryBackend {
    fn save(&self, session: &Session) -> io::Result<()> {
        self.slot.lock().replace(session.clone());
        Ok(())
    }

    fn load(&self) -> io::Result<Option<Session>> {
        Ok(self.slot.lock().clone())
    }

    fn delete(&self) -> io::Result<()> {
        self.slot.lock().take();
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_keeps_the_latest_save() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.load().unwrap(), None);

        let mut session = Session::new(2, "149.154.167.51:443");
        backend.save(&session).unwrap();
        session.salt = 99;
        backend.save(&session).unwrap();
        assert_eq!(backend.load().unwrap().map(|s| s.salt), Some(99));

        backend.delete().unwrap();
        assert_eq!(backend.load().unwrap(), None);
    }
}
