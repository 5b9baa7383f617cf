use anyhow::{anyhow, Context, Result};
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Find translation catalog files under a directory.
    ///
    /// The `.ts` extension is shared with TypeScript sources, so every hit
    /// is confirmed by content before it is returned.
    pub fn find_catalog_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension() else {
                continue;
            };
            if !ext.to_string_lossy().eq_ignore_ascii_case("ts") {
                continue;
            }

            if Self::is_catalog_file(path) {
                result.push(path.to_path_buf());
            } else {
                debug!("Skipping non-catalog .ts file: {}", path.display());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Whether a file's leading bytes look like a Linguist TS catalog
    pub fn is_catalog_file<P: AsRef<Path>>(path: P) -> bool {
        let Ok(content) = fs::read_to_string(path.as_ref()) else {
            return false;
        };
        let head: String = content.chars().take(512).collect();
        head.contains("<!DOCTYPE TS>") || head.contains("<TS ") || head.contains("<TS>")
    }

    /// Produce a script-variant catalog (e.g. `sr` to `sr@latin`) through
    /// the external `lconvert` binary.
    ///
    /// Black-box invocation: success yields the output path, failure the
    /// tool's stderr. A timeout guards against a hung process.
    pub async fn convert_variant<P: AsRef<Path>>(
        input: P,
        output: P,
        target_locale: &str,
    ) -> Result<PathBuf> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.exists() {
            return Err(anyhow!("Catalog file does not exist: {:?}", input));
        }

        let lconvert_future = Command::new("lconvert")
            .args([
                "-target-language",
                target_locale,
                "-o",
                output.to_str().unwrap_or_default(),
                input.to_str().unwrap_or_default(),
            ])
            .output();

        let timeout_duration = std::time::Duration::from_secs(60);
        let result = tokio::select! {
            result = lconvert_future => {
                result.map_err(|e| anyhow!("Failed to execute lconvert: {}", e))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(anyhow!("lconvert timed out after 60 seconds"));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("lconvert failed: {}", stderr);
            return Err(anyhow!("lconvert failed: {}", stderr));
        }

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isCatalogFile_tsCatalog_shouldBeRecognized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_fr.ts");
        fs::write(
            &path,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\"></TS>\n",
        )
        .unwrap();
        assert!(FileManager::is_catalog_file(&path));
    }

    #[test]
    fn test_isCatalogFile_typescriptSource_shouldBeSkipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.ts");
        fs::write(&path, "export const x: number = 1;\n").unwrap();
        assert!(!FileManager::is_catalog_file(&path));
    }

    #[test]
    fn test_findCatalogFiles_mixedTree_shouldReturnOnlyCatalogs() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("i18n");
        fs::create_dir_all(&sub).unwrap();
        fs::write(
            sub.join("app_de.ts"),
            "<!DOCTYPE TS>\n<TS version=\"2.1\" language=\"de_DE\"></TS>\n",
        )
        .unwrap();
        fs::write(sub.join("index.ts"), "console.log('hi');\n").unwrap();
        fs::write(sub.join("notes.txt"), "nothing").unwrap();

        let found = FileManager::find_catalog_files(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("app_de.ts"));
    }
}
