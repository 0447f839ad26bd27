//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;

#[derive(Error, Debug)]
pub enum RsviaError {
    // 匹配相关错误（中止整个匹配过程）
    #[error("正则编译失败：{0}")]
    CompileError(#[from] RegexError),
    #[error("脚本执行失败：{0}")]
    ScriptError(String),

    // 执行相关错误（仅中止当前规则的执行）
    #[error("命令模板错误：{0}")]
    TemplateError(String),
    #[error("无法解析绝对路径：{0}")]
    PathError(String),
    #[error("命令启动失败：{0}")]
    SpawnError(String),
    #[error("命令执行失败：{0}")]
    CommandFailed(String),

    // 分发相关信号/错误
    #[error("无效输入：{0}")]
    InvalidInput(String),
    #[error("文件不存在且没有匹配的规则：{0}")]
    NotFoundNotMatched(String),
    #[error("没有可选的匹配规则：{0}")]
    NoCandidates(String),
    #[error("交互选择失败：{0}")]
    SelectionError(String),

    // 配置相关错误
    #[error("配置加载失败：{0}")]
    ConfigLoadError(String),
    #[error("配置解析失败：{0}")]
    ConfigParseError(String),
    #[error("配置校验失败：{0}")]
    ValidationError(String),

    // 历史记录错误
    #[error("历史记录操作失败：{0}")]
    HistoryError(String),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),
}

impl RsviaError {
    /// 是否为“未找到且未匹配”信号（调用方应转为命令执行）
    pub fn is_not_found_not_matched(&self) -> bool {
        matches!(self, RsviaError::NotFoundNotMatched(_))
    }
}

// 全局Result类型
pub type RsvResult<T> = Result<T, RsviaError>;
