use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::SaveGame;

/// Directory-backed save game: one gzip-compressed NBT file per key.
pub struct FileSaveGame {
    root: PathBuf,
}

impl FileSaveGame {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create save directory {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            bail!("Invalid save key {:?}", key);
        }
        Ok(self.root.join(format!("{}.dat", key)))
    }
}

impl SaveGame for FileSaveGame {
    fn store_raw(&mut self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).context("Failed to compress save entry")?;
        let compressed = encoder.finish().context("Failed to finish compression")?;

        // Write next to the target and rename, so a crash never leaves half a file
        let tmp = path.with_extension("dat.tmp");
        fs::write(&tmp, &compressed).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {:?}", path))?;

        log::debug!("Stored save entry {} ({} bytes compressed)", key, compressed.len());
        Ok(())
    }

    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let compressed = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let mut data = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to decompress {:?}", path))?;
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SaveGameExt;

    fn temp_root(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("dimensions-save-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&path);
        path
    }

    #[test]
    fn test_file_round_trip() {
        let root = temp_root("round-trip");
        {
            let mut save = FileSaveGame::open(&root).expect("Should open");
            save.store_data("dimensions.freeDimensions", &vec![3i32, 7, 2]).expect("Should store");
        }

        // A fresh handle sees what the first one wrote
        let save = FileSaveGame::open(&root).expect("Should reopen");
        let ids: Option<Vec<i32>> = save.get_data("dimensions.freeDimensions").expect("Should load");
        assert_eq!(ids, Some(vec![3, 7, 2]));
        assert!(root.join("dimensions.freeDimensions.dat").exists());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_file() {
        let root = temp_root("missing");
        let save = FileSaveGame::open(&root).expect("Should open");
        assert_eq!(save.load_raw("nothing").expect("Should load"), None);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_rejects_path_keys() {
        let root = temp_root("keys");
        let mut save = FileSaveGame::open(&root).expect("Should open");
        assert!(save.store_raw("../escape", vec![1]).is_err());
        assert!(save.store_raw("a/b", vec![1]).is_err());
        assert!(save.store_raw("", vec![1]).is_err());
        let _ = fs::remove_dir_all(&root);
    }
}
