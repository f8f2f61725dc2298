use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

const FILE_PREFIX: &str = "scribe-";
const FILE_SUFFIX: &str = ".wav";

/// Per-request temporary audio file. Removed on drop, or explicitly through
/// [`ScopedAudioFile::release`] when the caller wants to observe removal errors.
#[derive(Debug)]
pub struct ScopedAudioFile {
    file: NamedTempFile,
}

impl ScopedAudioFile {
    pub fn create(dir: Option<&Path>, bytes: &[u8]) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(FILE_PREFIX).suffix(FILE_SUFFIX);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn release(self) -> io::Result<()> {
        self.file.close()
    }
}
