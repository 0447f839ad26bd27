//! 命令历史记录
//! 以 JSON 文件保存最近执行过的输入，记录失败不影响执行结果

use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RsvResult, RsviaError};
use crate::rule::RuleLoader;

/// 历史文件名
const HISTORY_FILE_NAME: &str = "history.json";
/// 最多保留的记录数
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// 单条历史记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub command: String,
    #[serde(default)]
    pub rule_name: String,
}

/// 历史记录能力
pub trait HistoryRecorder {
    fn record_execution(&self, file: &str, rule_name: &str) -> RsvResult<()>;
}

/// 丢弃所有记录
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistory;

impl HistoryRecorder for NoopHistory {
    fn record_execution(&self, _file: &str, _rule_name: &str) -> RsvResult<()> {
        Ok(())
    }
}

/// JSON 文件历史
#[derive(Debug, Clone)]
pub struct JsonHistory {
    path: PathBuf,
}

impl JsonHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// 默认位置：~/.config/via/history.json
    pub fn default_location() -> RsvResult<Self> {
        Ok(Self::new(RuleLoader::config_dir()?.join(HISTORY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载全部记录（文件不存在视为空）
    pub fn load(&self) -> RsvResult<Vec<HistoryEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RsviaError::HistoryError(format!("failed to load history: {}", e))),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| RsviaError::HistoryError(format!("failed to load history: {}", e)))
    }

    /// 追加一条记录，超出上限时丢弃最旧的
    pub fn add_entry(&self, command: &str, rule_name: &str) -> RsvResult<()> {
        let mut entries = self.load()?;
        entries.push(HistoryEntry {
            timestamp: Local::now(),
            command: command.to_string(),
            rule_name: rule_name.to_string(),
        });
        if entries.len() > MAX_HISTORY_ENTRIES {
            let overflow = entries.len() - MAX_HISTORY_ENTRIES;
            entries.drain(..overflow);
        }
        self.save(&entries)
    }

    /// 清空历史
    pub fn clear(&self) -> RsvResult<()> {
        self.save(&[])
    }

    fn save(&self, entries: &[HistoryEntry]) -> RsvResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, data)?;
        debug!("历史记录已保存：{}，共{}条", self.path.display(), entries.len());
        Ok(())
    }
}

impl HistoryRecorder for JsonHistory {
    fn record_execution(&self, file: &str, rule_name: &str) -> RsvResult<()> {
        self.add_entry(file, rule_name)
    }
}
