//! 规则加载管理器
//! 负责解析配置路径（含 profile），从本地 YAML 文件加载并校验规则库

use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use tracing::debug;

use super::model::RuleLibrary;
use crate::config::GlobalConfig;
use crate::error::{RsvResult, RsviaError};

/// 配置目录名
const APP_DIR_NAME: &str = "via";
/// 默认配置文件名
const CONFIG_FILE_NAME: &str = "config.yml";

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载规则库（按全局配置解析路径）
    pub fn load(config: &GlobalConfig) -> RsvResult<RuleLibrary> {
        let path = Self::resolve_path(config)?;
        Self::load_from_path(&path)
    }

    /// 从指定文件加载规则库
    pub fn load_from_path(path: &Path) -> RsvResult<RuleLibrary> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RsviaError::ConfigLoadError(format!(
                    "config file not found at {}",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(RsviaError::ConfigLoadError(format!(
                    "读取配置文件 {} 失败：{}",
                    path.display(),
                    e
                )));
            }
        };

        let rule_lib = Self::parse_str(&content)?;
        debug!(
            "配置加载成功：{}，规则数：{}，别名数：{}",
            path.display(),
            rule_lib.rules.len(),
            rule_lib.aliases.len()
        );
        Ok(rule_lib)
    }

    /// 解析 YAML 文本（空文档视为空配置）
    pub fn parse_str(content: &str) -> RsvResult<RuleLibrary> {
        if content.trim().is_empty() {
            return Ok(RuleLibrary::default());
        }

        let mut rule_lib: RuleLibrary = serde_yaml::from_str(content)
            .map_err(|e| RsviaError::ConfigParseError(e.to_string()))?;

        // `default` 仅在 default_command 为空时生效
        if rule_lib.default_command.is_empty() && !rule_lib.default.is_empty() {
            rule_lib.default_command = std::mem::take(&mut rule_lib.default);
        }

        Ok(rule_lib)
    }

    /// 序列化为 YAML（用于 `:config list`）
    pub fn to_yaml(rule_lib: &RuleLibrary) -> RsvResult<String> {
        serde_yaml::to_string(rule_lib).map_err(|e| RsviaError::ConfigParseError(e.to_string()))
    }

    /// 校验规则库：命令必填，regex/mime 必须可编译
    pub fn validate(rule_lib: &RuleLibrary) -> RsvResult<()> {
        for (index, rule) in rule_lib.rules.iter().enumerate() {
            if rule.command.trim().is_empty() {
                return Err(RsviaError::ValidationError(format!(
                    "rules[{}].command is required",
                    index
                )));
            }
            if let Some(pattern) = rule.regex_pattern() {
                Regex::new(pattern).map_err(|e| {
                    RsviaError::ValidationError(format!("rules[{}].regex is invalid: {}", index, e))
                })?;
            }
            if let Some(pattern) = rule.mime_pattern() {
                Regex::new(pattern).map_err(|e| {
                    RsviaError::ValidationError(format!("rules[{}].mime is invalid: {}", index, e))
                })?;
            }
        }
        Ok(())
    }

    /// 解析配置文件路径：显式路径 > profile > 默认路径
    pub fn resolve_path(config: &GlobalConfig) -> RsvResult<PathBuf> {
        if let Some(path) = &config.config_path {
            return Ok(path.clone());
        }

        let dir = Self::config_dir()?;
        let path = match config.profile.as_deref() {
            Some(profile) => dir.join("profiles").join(format!("{}.yml", profile)),
            None => dir.join(CONFIG_FILE_NAME),
        };
        Ok(path)
    }

    /// 应用配置目录（~/.config/via）
    pub fn config_dir() -> RsvResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            RsviaError::ConfigLoadError("无法获取用户主目录".to_string())
        })?;
        Ok(home.join(".config").join(APP_DIR_NAME))
    }
}
