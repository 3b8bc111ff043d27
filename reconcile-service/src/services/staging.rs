use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory holding uploads and generated reports while a request uses them.
///
/// Every file is a `NamedTempFile`, so it is removed when the guard drops,
/// whichever way the request ends.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve an empty `.xlsx` file, e.g. as a report destination.
    pub fn reserve(&self, prefix: &str) -> io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".xlsx")
            .tempfile_in(&self.dir)
    }

    /// Write uploaded bytes to a fresh staged file.
    pub async fn stage(&self, prefix: &str, bytes: Vec<u8>) -> io::Result<NamedTempFile> {
        let mut file = self.reserve(prefix)?;
        tokio::task::spawn_blocking(move || {
            file.write_all(&bytes)?;
            file.flush()?;
            Ok::<_, io::Error>(file)
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_files_disappear_when_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("public")).unwrap();

        let staged = staging.stage("upload_", b"payload".to_vec()).await.unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.starts_with(staging.dir()));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn reserved_files_use_the_xlsx_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();

        let reserved = staging.reserve("Invoice_Data_").unwrap();
        let name = reserved.path().file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with("Invoice_Data_"));
        assert!(name.ends_with(".xlsx"));
    }
}
