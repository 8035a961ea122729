//! Durable local copy of the current conversation.
//!
//! The cache is a tiny key/value store with one file per key. The only key in
//! use is [`HISTORY_KEY`], which holds the JSON-serialized transcript so a
//! conversation survives restarts. Failures here are never fatal: the
//! infallible [`LocalCache::load`] and [`LocalCache::store`] log and carry on.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{from_reader, to_writer_pretty};
use tracing::warn;

use crate::error::{Error, Result};
use crate::observability::{CACHE_ERRORS, CACHE_WRITES};
use crate::types::ChatTurn;

/// Key of the stored transcript.
pub const HISTORY_KEY: &str = "chatHistory";

/// File-backed transcript cache.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the platform data directory for the cache.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("techreq"))
            .unwrap_or_else(|| PathBuf::from(".techreq"))
    }

    /// Returns the directory holding the cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file holding the transcript.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{HISTORY_KEY}.json"))
    }

    /// Loads the stored transcript.
    ///
    /// Returns `None` when nothing is stored or the entry cannot be read.
    pub fn load(&self) -> Option<Vec<ChatTurn>> {
        match self.try_load() {
            Ok(transcript) => transcript,
            Err(err) => {
                CACHE_ERRORS.click();
                warn!(path = %self.path().display(), error = %err, "failed to load chat history");
                None
            }
        }
    }

    /// Stores the transcript, or clears the entry when it holds no more than
    /// the greeting. Failures are logged.
    pub fn store(&self, transcript: &[ChatTurn]) {
        if let Err(err) = self.try_store(transcript) {
            CACHE_ERRORS.click();
            warn!(path = %self.path().display(), error = %err, "failed to save chat history");
        }
    }

    /// Loads the stored transcript, reporting read and parse failures.
    ///
    /// A missing entry or an empty stored transcript is `Ok(None)`.
    pub fn try_load(&self) -> Result<Option<Vec<ChatTurn>>> {
        let file = match File::open(self.path()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::storage(
                    "failed to open chat history",
                    Some(Box::new(err)),
                ));
            }
        };
        let transcript: Vec<ChatTurn> = from_reader(BufReader::new(file))?;
        if transcript.is_empty() {
            Ok(None)
        } else {
            Ok(Some(transcript))
        }
    }

    /// Stores the transcript, reporting failures.
    ///
    /// The entry is written to a temporary file and renamed into place so a
    /// crash mid-write never leaves a truncated transcript behind.
    pub fn try_store(&self, transcript: &[ChatTurn]) -> Result<()> {
        if transcript.len() <= 1 {
            return self.try_remove();
        }
        fs::create_dir_all(&self.dir)
            .map_err(|err| Error::storage("failed to create cache directory", Some(Box::new(err))))?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        if let Err(err) = write_and_rename(&tmp, &path, transcript) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        CACHE_WRITES.click();
        Ok(())
    }

    /// Removes the stored transcript, if any.
    pub fn try_remove(&self) -> Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::storage(
                "failed to remove chat history",
                Some(Box::new(err)),
            )),
        }
    }
}

fn write_and_rename(tmp: &Path, path: &Path, transcript: &[ChatTurn]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(tmp)?);
    to_writer_pretty(&mut writer, transcript)?;
    writer.flush()?;
    drop(writer);
    fs::rename(tmp, path)?;
    Ok(())
}
