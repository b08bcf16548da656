//! Loading reference images and saved screenshots from disk

use crate::adb::{AdbError, AdbResult, FrameSource};
use crate::template_matching::{MatchError, MatchResult, Reference};
use std::path::{Path, PathBuf};

/// Loads reference images into the raster type the matcher consumes
pub trait ResourceLoader {
    fn load_reference(&self, path: &Path) -> MatchResult<Reference>;
}

/// Reference loader backed by the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl FsLoader {
    /// Load every `*.png` in `directory`, sorted by file name.
    ///
    /// Unreadable files are skipped with a warning; an unreadable directory
    /// fails with `InvalidInput`.
    pub fn load_directory(&self, directory: impl AsRef<Path>) -> MatchResult<Vec<Reference>> {
        let directory = directory.as_ref();
        let dir_name = directory.display().to_string();
        let entries = std::fs::read_dir(directory)
            .map_err(|e| MatchError::invalid_input(&dir_name, e.to_string()))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut references = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_reference(&path) {
                Ok(reference) => references.push(reference),
                Err(e) => log::warn!("⚠️ Skipping reference {}: {}", path.display(), e),
            }
        }
        log::info!("📂 Loaded {} references from {}", references.len(), dir_name);
        Ok(references)
    }
}

impl ResourceLoader for FsLoader {
    fn load_reference(&self, path: &Path) -> MatchResult<Reference> {
        let name = reference_name(path);
        let image = image::open(path)
            .map_err(|e| MatchError::invalid_input(path.display().to_string(), e.to_string()))?;
        let reference = Reference::new(name, image.to_rgb8())?;
        let (w, h) = reference.dimensions();
        log::debug!("Loaded reference '{}' ({}x{})", reference.name(), w, h);
        Ok(reference)
    }
}

/// Reference name derived from the file stem ("ok_button.png" -> "ok_button")
pub fn reference_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Frame source that re-reads a screenshot file on every capture
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| AdbError::ScreenshotFile {
                path: self.path.clone(),
                source,
            })
    }
}
