//! 已用时间存储 - 基础设施层
//!
//! 以作答 ID 为键保存已用秒数，只在刷新后恢复计时时使用。
//! 内存中的计时状态才是权威值，这里只是直写缓存。
//!
//! 作答结束（提交或放弃）时写入结束标记，之后同一作答不能再次开始。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::models::AttemptId;

static ATTEMPT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("作答 ID 正则有效"));

/// 作答 ID 能否安全地用作文件名
pub fn is_storable_attempt_id(attempt_id: &AttemptId) -> bool {
    ATTEMPT_ID_PATTERN.is_match(attempt_id.as_str())
}

/// 作答的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptEnding {
    Submitted,
    Abandoned,
}

impl fmt::Display for AttemptEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptEnding::Submitted => f.write_str("submitted"),
            AttemptEnding::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// 已用时间存储
pub trait ElapsedStore: Send + Sync {
    /// 读取已用秒数；不存在时返回 `None`
    fn get(&self, attempt_id: &AttemptId) -> Result<Option<u64>, StoreError>;

    /// 写入已用秒数
    fn set(&self, attempt_id: &AttemptId, elapsed_seconds: u64) -> Result<(), StoreError>;

    /// 读取结束标记；作答仍可进行时返回 `None`
    fn ending(&self, attempt_id: &AttemptId) -> Result<Option<AttemptEnding>, StoreError>;

    /// 写入结束标记，保留已用秒数
    fn close(&self, attempt_id: &AttemptId, ending: AttemptEnding) -> Result<(), StoreError>;
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryElapsedStore {
    values: Mutex<HashMap<AttemptId, u64>>,
    endings: Mutex<HashMap<AttemptId, AttemptEnding>>,
}

impl MemoryElapsedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个已用时间（模拟刷新前留下的值）
    pub fn with_value(attempt_id: &AttemptId, elapsed_seconds: u64) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attempt_id.clone(), elapsed_seconds);
        store
    }
}

impl ElapsedStore for MemoryElapsedStore {
    fn get(&self, attempt_id: &AttemptId) -> Result<Option<u64>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(attempt_id).copied())
    }

    fn set(&self, attempt_id: &AttemptId, elapsed_seconds: u64) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attempt_id.clone(), elapsed_seconds);
        Ok(())
    }

    fn ending(&self, attempt_id: &AttemptId) -> Result<Option<AttemptEnding>, StoreError> {
        let endings = self.endings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(endings.get(attempt_id).copied())
    }

    fn close(&self, attempt_id: &AttemptId, ending: AttemptEnding) -> Result<(), StoreError> {
        self.endings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attempt_id.clone(), ending);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ElapsedRecord {
    elapsed_seconds: u64,
    updated_at: chrono::DateTime<chrono::Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ending: Option<AttemptEnding>,
}

/// 文件存储：每个作答一个 JSON 文件
#[derive(Debug, Clone)]
pub struct FileElapsedStore {
    dir: PathBuf,
}

impl FileElapsedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, attempt_id: &AttemptId) -> Result<PathBuf, StoreError> {
        if !is_storable_attempt_id(attempt_id) {
            return Err(StoreError::InvalidAttemptId {
                attempt_id: attempt_id.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.elapsed.json", attempt_id)))
    }
}

impl FileElapsedStore {
    fn read_record(&self, path: &Path) -> Result<Option<ElapsedRecord>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Unavailable {
            path: path.display().to_string(),
            source,
        })?;
        let record = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(record))
    }

    fn write_record(&self, path: &Path, record: &ElapsedRecord) -> Result<(), StoreError> {
        let unavailable = |source: std::io::Error| StoreError::Unavailable {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(unavailable)?;
        let content = serde_json::to_string(record).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, content).map_err(unavailable)
    }
}

impl ElapsedStore for FileElapsedStore {
    fn get(&self, attempt_id: &AttemptId) -> Result<Option<u64>, StoreError> {
        let path = self.path_for(attempt_id)?;
        Ok(self.read_record(&path)?.map(|record| record.elapsed_seconds))
    }

    fn set(&self, attempt_id: &AttemptId, elapsed_seconds: u64) -> Result<(), StoreError> {
        let path = self.path_for(attempt_id)?;
        // 已结束的作答不再被计时覆盖
        if let Some(ending) = self.read_record(&path).ok().flatten().and_then(|r| r.ending) {
            debug!("作答 {} 已 {}，忽略已用时间写入", attempt_id, ending);
            return Ok(());
        }

        let record = ElapsedRecord {
            elapsed_seconds,
            updated_at: chrono::Local::now(),
            ending: None,
        };
        self.write_record(&path, &record)
    }

    fn ending(&self, attempt_id: &AttemptId) -> Result<Option<AttemptEnding>, StoreError> {
        let path = self.path_for(attempt_id)?;
        Ok(self.read_record(&path)?.and_then(|record| record.ending))
    }

    fn close(&self, attempt_id: &AttemptId, ending: AttemptEnding) -> Result<(), StoreError> {
        let path = self.path_for(attempt_id)?;
        let elapsed_seconds = self
            .read_record(&path)
            .ok()
            .flatten()
            .map_or(0, |record| record.elapsed_seconds);

        let record = ElapsedRecord {
            elapsed_seconds,
            updated_at: chrono::Local::now(),
            ending: Some(ending),
        };
        self.write_record(&path, &record)
    }
}
