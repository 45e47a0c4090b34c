//! 草稿存储槽 - 基础设施层
//!
//! 只负责按 key 读写一段字符串，不认识快照结构，也不处理 TTL

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::error::DraftError;

/// 按 key 划分的单槽存储，写入即整体覆盖
pub trait SlotBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, DraftError>;
    fn write(&self, key: &str, value: &str) -> Result<(), DraftError>;
    fn remove(&self, key: &str) -> Result<(), DraftError>;
}

/// 文件存储槽：每个 key 对应目录下的一个 JSON 文件，进程重启后仍然存在
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// key 编码为文件名：字母、数字和 `-` 原样保留，其余每个字节写成 `_XX`。
    /// `_` 自身也被转义，所以不同 key 不会落到同一个文件
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte));
            } else {
                let _ = write!(file_name, "_{:02X}", byte);
            }
        }
        self.dir.join(format!("{}.json", file_name))
    }

    fn slot_error(key: &str, source: std::io::Error) -> DraftError {
        DraftError::Slot {
            key: key.to_string(),
            source,
        }
    }
}

impl SlotBackend for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, DraftError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::slot_error(key, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), DraftError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::slot_error(key, e))?;
        let path = self.path_for(key);
        debug!("写入草稿槽: {}", path.display());
        fs::write(path, value).map_err(|e| Self::slot_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), DraftError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::slot_error(key, e)),
        }
    }
}

/// 内存存储槽
#[derive(Debug, Default)]
pub struct MemorySlot {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入原始内容（用于构造损坏的槽）
    pub fn put_raw(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.contains_key(key))
            .unwrap_or(false)
    }

    fn poisoned(key: &str) -> DraftError {
        DraftError::Slot {
            key: key.to_string(),
            source: std::io::Error::new(ErrorKind::Other, "内存存储槽锁已损坏"),
        }
    }
}

impl SlotBackend for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, DraftError> {
        let slots = self.slots.lock().map_err(|_| Self::poisoned(key))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), DraftError> {
        let mut slots = self.slots.lock().map_err(|_| Self::poisoned(key))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftError> {
        let mut slots = self.slots.lock().map_err(|_| Self::poisoned(key))?;
        slots.remove(key);
        Ok(())
    }
}
