use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use seva_core::store::{SlotError, SlotStore};

/// Slot store keeping one file per key under a base directory.
///
/// Writes go through a sibling temp file and a rename, so a reader never
/// observes a half-written slot even if the process dies mid-write.
pub struct FileSlot {
    base_dir: PathBuf,
}

impl FileSlot {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, SlotError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .map_err(|e| SlotError(format!("create {}: {e}", base_dir.display())))?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers like "seva.complaints"; keep them as
        // file names with a .json suffix.
        self.base_dir.join(format!("{key}.json"))
    }
}

impl SlotStore for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SlotError(format!("read {}: {e}", path.display()))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path_for(key);
        let tmp = tmp_path(&path);
        fs::write(&tmp, value).map_err(|e| SlotError(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| SlotError(format!("rename into {}: {e}", path.display())))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
