//! 工具模块：路径处理、历史记录
pub mod path_utils;
pub mod history;

pub use self::path_utils::PathUtils;
pub use self::history::{HistoryEntry, HistoryRecorder, JsonHistory, NoopHistory};
