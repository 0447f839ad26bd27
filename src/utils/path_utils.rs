//! 路径处理工具
//! 扩展名提取、绝对路径解析（词法清理，不访问文件系统）

use std::path::{Path, PathBuf};
use path_clean::PathClean;

use crate::error::{RsvResult, RsviaError};

/// 路径处理工具
pub struct PathUtils;

impl PathUtils {
    /// 提取最后一个路径元素的扩展名（含前导点），无扩展名返回空串
    /// "archive.tar.gz" -> ".gz"，"dir.d/file" -> ""，".bashrc" -> ".bashrc"
    pub fn extension(path: &str) -> &str {
        for (index, ch) in path.char_indices().rev() {
            if Self::is_separator(ch) {
                break;
            }
            if ch == '.' {
                return &path[index..];
            }
        }
        ""
    }

    /// 小写、去掉前导点的扩展名，用于规则匹配
    pub fn match_extension(path: &str) -> String {
        Self::extension(path).trim_start_matches('.').to_lowercase()
    }

    /// 解析绝对路径：相对路径基于当前工作目录，结果做词法清理
    pub fn absolute(path: &str) -> RsvResult<PathBuf> {
        let raw = Path::new(path);
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| RsviaError::PathError(format!("{}：{}", path, e)))?;
            cwd.join(raw)
        };
        Ok(Self::clean(&joined))
    }

    /// 词法清理：去掉 `.`，折叠 `..`（根目录之上的 `..` 丢弃）
    pub fn clean(path: &Path) -> PathBuf {
        path.clean()
    }

    #[cfg(windows)]
    fn is_separator(ch: char) -> bool {
        ch == '/' || ch == '\\'
    }

    #[cfg(not(windows))]
    fn is_separator(ch: char) -> bool {
        ch == '/'
    }
}
