//! 规则数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// 单条匹配/执行规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    // 匹配条件
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    // 执行选项
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub background: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fallthrough: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Rule {
    /// 以命令快速创建规则（其余字段为默认值）
    pub fn from_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// 非空的规则名称
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// 菜单/报告中的展示标签：有名称用名称，否则 "Command: <command>"
    pub fn label(&self) -> String {
        match self.display_name() {
            Some(name) => name.to_string(),
            None => format!("Command: {}", self.command),
        }
    }

    // 空字符串按未配置处理（YAML 中常见 `regex: ""`）
    pub fn regex_pattern(&self) -> Option<&str> {
        non_empty(&self.regex)
    }

    pub fn mime_pattern(&self) -> Option<&str> {
        non_empty(&self.mime)
    }

    pub fn scheme_name(&self) -> Option<&str> {
        non_empty(&self.scheme)
    }

    pub fn script_source(&self) -> Option<&str> {
        non_empty(&self.script)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 完整规则库（配置文件快照）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleLibrary {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_command: String,
    // default_command 的简写，加载时合并
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleLibrary {
    /// 生效的默认命令
    pub fn default_command(&self) -> Option<&str> {
        if !self.default_command.is_empty() {
            Some(&self.default_command)
        } else if !self.default.is_empty() {
            Some(&self.default)
        } else {
            None
        }
    }

    /// 查找别名目标
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn is_false(value: &bool) -> bool {
    !*value
}
