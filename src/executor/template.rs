//! 命令模板渲染
//! 支持 `{{.File}}` `{{.Dir}}` `{{.Base}}` `{{.Name}}` `{{.Ext}}` 五个变量

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RsvResult, RsviaError};
use crate::utils::PathUtils;

/// 模板动作：`{{ .Field }}`
static FIELD_ACTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap()
});

const ACTION_OPEN: &str = "{{";
const ACTION_CLOSE: &str = "}}";

/// 单次执行的模板变量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// 原始输入（不做绝对化）
    pub file: String,
    /// 绝对路径所在目录
    pub dir: String,
    /// 文件名
    pub base: String,
    /// 去掉扩展名的文件名
    pub name: String,
    /// 扩展名（含前导点）
    pub ext: String,
}

impl CommandContext {
    /// 从输入计算模板变量，绝对路径解析失败返回 PathError
    pub fn from_file(file: &str) -> RsvResult<Self> {
        let abs = PathUtils::absolute(file)?;
        let abs_str = abs.to_string_lossy().to_string();

        let dir = match abs.parent() {
            Some(parent) => parent.to_string_lossy().to_string(),
            None => abs_str.clone(),
        };
        let base = match abs.file_name() {
            Some(base) => base.to_string_lossy().to_string(),
            None => abs_str.clone(),
        };
        let ext = PathUtils::extension(&base).to_string();
        let name = base[..base.len() - ext.len()].to_string();

        Ok(Self {
            file: file.to_string(),
            dir,
            base,
            name,
            ext,
        })
    }

    /// 按字段名取值
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "File" => Some(&self.file),
            "Dir" => Some(&self.dir),
            "Base" => Some(&self.base),
            "Name" => Some(&self.name),
            "Ext" => Some(&self.ext),
            _ => None,
        }
    }
}

/// 命令模板渲染器
pub struct CommandTemplate;

impl CommandTemplate {
    /// 渲染命令模板
    pub fn render(template: &str, file: &str) -> RsvResult<String> {
        let context = CommandContext::from_file(file)?;
        Self::render_with(template, &context)
    }

    /// 使用已计算的上下文渲染
    pub fn render_with(template: &str, context: &CommandContext) -> RsvResult<String> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find(ACTION_OPEN) {
            output.push_str(&rest[..open]);
            let after_open = &rest[open + ACTION_OPEN.len()..];

            let Some(close) = after_open.find(ACTION_CLOSE) else {
                return Err(RsviaError::TemplateError(format!(
                    "未闭合的模板动作：{}",
                    &rest[open..]
                )));
            };

            let action = &after_open[..close];
            let field = FIELD_ACTION_REGEX
                .captures(action)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .ok_or_else(|| {
                    RsviaError::TemplateError(format!("不支持的模板动作：{{{{{}}}}}", action))
                })?;

            let value = context.field(field).ok_or_else(|| {
                RsviaError::TemplateError(format!("未知的模板变量：.{}", field))
            })?;
            output.push_str(value);

            rest = &after_open[close + ACTION_CLOSE.len()..];
        }

        output.push_str(rest);
        Ok(output)
    }
}
