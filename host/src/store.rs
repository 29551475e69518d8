//! # Store 模块
//!
//! 存档文件管理。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! └── records.json
//! ```
//!
//! 文件内容是一层信封，`data` 里才是 [`Archive`](panel_runtime::Archive) 的数据：
//!
//! ```json
//! { "version": 1, "saved_at": "2026-01-01T12:00:00+08:00", "data": { ... } }
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use panel_runtime::{ArchiveError, ArchiveStore};

/// 存档文件名
pub const RECORDS_FILE: &str = "records.json";

/// 信封格式版本
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    saved_at: String,
    data: serde_json::Value,
}

/// 文件存档
#[derive(Debug, Clone)]
pub struct FileStore {
    /// 存档目录
    saves_dir: PathBuf,
}

impl FileStore {
    /// 创建文件存档
    ///
    /// # 参数
    ///
    /// - `saves_dir`: 存档目录路径（首次保存时创建）
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        Self {
            saves_dir: saves_dir.as_ref().to_path_buf(),
        }
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), ArchiveError> {
        if !self.saves_dir.exists() {
            fs::create_dir_all(&self.saves_dir)
                .map_err(|e| ArchiveError::Store(format!("无法创建存档目录: {}", e)))?;
        }
        Ok(())
    }

    /// 存档文件路径
    pub fn path(&self) -> PathBuf {
        self.saves_dir.join(RECORDS_FILE)
    }

    /// 检查存档是否存在
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// 最后保存时间
    pub fn saved_at(&self) -> Result<Option<DateTime<Local>>, ArchiveError> {
        let Some(envelope) = self.read_envelope()? else {
            return Ok(None);
        };
        let saved_at = DateTime::parse_from_rfc3339(&envelope.saved_at)
            .map_err(|e| ArchiveError::Store(format!("保存时间无效: {}", e)))?;
        Ok(Some(saved_at.with_timezone(&Local)))
    }

    /// 删除存档
    pub fn delete(&self) -> Result<(), ArchiveError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| ArchiveError::Store(format!("无法删除存档文件: {}", e)))?;
            debug!(?path, "存档已删除");
        }
        Ok(())
    }

    fn read_envelope(&self) -> Result<Option<Envelope>, ArchiveError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| ArchiveError::Store(format!("无法读取存档文件: {}", e)))?;
        let envelope: Envelope =
            serde_json::from_str(&json).map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        if envelope.version > FORMAT_VERSION {
            return Err(ArchiveError::Store(format!(
                "不支持的存档格式版本: {}",
                envelope.version
            )));
        }
        Ok(Some(envelope))
    }
}

impl ArchiveStore for FileStore {
    fn load(&self) -> Result<Option<String>, ArchiveError> {
        let envelope = self.read_envelope()?;
        if envelope.is_some() {
            debug!(path = ?self.path(), "存档读取成功");
        }
        Ok(envelope.map(|e| e.data.to_string()))
    }

    fn save(&mut self, content: &str) -> Result<(), ArchiveError> {
        self.ensure_dir()?;

        let data: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        let envelope = Envelope {
            version: FORMAT_VERSION,
            saved_at: Local::now().to_rfc3339(),
            data,
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;

        let path = self.path();
        fs::write(&path, json)
            .map_err(|e| ArchiveError::Store(format!("无法写入存档文件: {}", e)))?;
        debug!(?path, "存档保存成功");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.saved_at().unwrap(), None);

        store.save(r#"{"records":{"play-times":3}}"#).unwrap();
        assert!(store.exists());
        assert!(store.saved_at().unwrap().is_some());

        let loaded: serde_json::Value =
            serde_json::from_str(&store.load().unwrap().unwrap()).unwrap();
        assert_eq!(loaded["records"]["play-times"], 3);
    }

    #[test]
    fn test_envelope_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.save(r#"{"a":1}"#).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(RECORDS_FILE)).unwrap())
                .unwrap();
        assert_eq!(raw["version"], FORMAT_VERSION);
        assert_eq!(raw["data"]["a"], 1);
        assert!(DateTime::parse_from_rfc3339(raw["saved_at"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_invalid_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(
            store.save("not json"),
            Err(ArchiveError::Serialization(_))
        ));

        fs::write(store.path(), "{ broken").unwrap();
        assert!(matches!(store.load(), Err(ArchiveError::Serialization(_))));
    }

    #[test]
    fn test_newer_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(
            store.path(),
            r#"{"version":99,"saved_at":"2026-01-01T00:00:00Z","data":{}}"#,
        )
        .unwrap();
        assert!(matches!(store.load(), Err(ArchiveError::Store(_))));
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.save("{}").unwrap();
        store.delete().unwrap();
        assert!(!store.exists());
        // 重复删除不报错
        store.delete().unwrap();
    }
}
