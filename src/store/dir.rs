use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use super::{escape_key, unescape_key, RawStore};
use crate::error::StoreError;

const EXTENSION: &str = "html";

/// One `<escaped identifier>.html` file per page inside a single directory.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, identifier: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", escape_key(identifier), EXTENSION))
    }
}

impl RawStore for DirStore {
    fn put(&self, identifier: &str, body: &str) -> Result<(), StoreError> {
        let target = self.path_for(identifier);
        // Hidden, no .html suffix: never picked up by `list`.
        let tmp = self
            .root
            .join(format!(".{}.part", escape_key(identifier)));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(identifier)) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!("Skipping non-UTF-8 entry {:?}", entry.path());
                continue;
            };
            // Temp files; escaped keys never start with '.'
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(&format!(".{}", EXTENSION)) else {
                debug!("Skipping non-page entry {}", name);
                continue;
            };
            match unescape_key(stem) {
                Some(id) => ids.push(id),
                None => debug!("Skipping undecodable entry {}", name),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

// ── Tests ──
