//! 规则匹配器核心
//! 按规则顺序评估输入，支持 fallthrough 链式匹配

use std::fmt;
use std::path::Path;
use regex::Regex;
use tracing::debug;

use super::mime::{ContentSniffer, MimeSniffer};
use super::script::{RhaiEvaluator, ScriptEvaluator};
use super::target::MatchTarget;
use crate::error::RsvResult;
use crate::rule::Rule;

/// 规则命中的条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCriterion {
    Scheme,
    Extension,
    Regex,
    Mime,
    Script,
}

impl fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchCriterion::Scheme => "scheme",
            MatchCriterion::Extension => "extension",
            MatchCriterion::Regex => "regex",
            MatchCriterion::Mime => "MIME",
            MatchCriterion::Script => "script",
        };
        f.write_str(name)
    }
}

/// 当前平台标识（与 std::env::consts::OS 一致）
pub fn current_platform() -> &'static str {
    std::env::consts::OS
}

fn normalize_os(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if lower == "darwin" {
        "macos".to_string()
    } else {
        lower
    }
}

/// 规则匹配器
pub struct RuleMatcher {
    platform: String,
    script_evaluator: Box<dyn ScriptEvaluator>,
    mime_sniffer: Box<dyn MimeSniffer>,
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleMatcher {
    /// 使用默认能力（Rhai 脚本、内容嗅探）和当前平台创建
    pub fn new() -> Self {
        Self {
            platform: normalize_os(current_platform()),
            script_evaluator: Box::new(RhaiEvaluator::new()),
            mime_sniffer: Box::new(ContentSniffer),
        }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = normalize_os(platform);
        self
    }

    pub fn with_script_evaluator(mut self, evaluator: Box<dyn ScriptEvaluator>) -> Self {
        self.script_evaluator = evaluator;
        self
    }

    pub fn with_mime_sniffer(mut self, sniffer: Box<dyn MimeSniffer>) -> Self {
        self.mime_sniffer = sniffer;
        self
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// 按顺序匹配，命中非 fallthrough 规则后停止
    pub fn match_rules<'r>(&self, rules: &'r [Rule], input: &str) -> RsvResult<Vec<&'r Rule>> {
        let target = MatchTarget::parse(input);
        let mut matches = Vec::new();

        for rule in rules {
            if self.evaluate_target(rule, &target)?.is_none() {
                continue;
            }
            matches.push(rule);
            if !rule.fallthrough {
                break;
            }
        }

        debug!("匹配完成：input={}，命中{}条规则", input, matches.len());
        Ok(matches)
    }

    /// 返回所有命中的规则（忽略 fallthrough），用于交互选择
    pub fn match_all<'r>(&self, rules: &'r [Rule], input: &str) -> RsvResult<Vec<&'r Rule>> {
        let target = MatchTarget::parse(input);
        let mut matches = Vec::new();

        for rule in rules {
            if self.evaluate_target(rule, &target)?.is_some() {
                matches.push(rule);
            }
        }

        Ok(matches)
    }

    /// 评估单条规则，返回命中的条件
    pub fn evaluate_rule(&self, rule: &Rule, input: &str) -> RsvResult<Option<MatchCriterion>> {
        self.evaluate_target(rule, &MatchTarget::parse(input))
    }

    /// 使用注入的嗅探器检测文件 MIME
    pub fn sniff_mime(&self, path: &Path) -> RsvResult<String> {
        self.mime_sniffer.detect(path)
    }

    /// OS 过滤：未配置 os 时始终可用
    pub fn is_eligible_os(&self, rule: &Rule) -> bool {
        rule.os.is_empty() || rule.os.iter().any(|os| normalize_os(os) == self.platform)
    }

    fn evaluate_target(&self, rule: &Rule, target: &MatchTarget) -> RsvResult<Option<MatchCriterion>> {
        // 1. OS 过滤
        if !self.is_eligible_os(rule) {
            return Ok(None);
        }

        // 2. scheme 排他：配置了 scheme 的规则只能通过 scheme 命中
        if let Some(scheme) = rule.scheme_name() {
            let matched = target
                .scheme()
                .is_some_and(|s| s.eq_ignore_ascii_case(scheme));
            return Ok(matched.then_some(MatchCriterion::Scheme));
        }

        // 3. 扩展名（未命中时继续检查其它条件）
        if !rule.extensions.is_empty() {
            let ext = target.candidate_extension();
            if rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
                return Ok(Some(MatchCriterion::Extension));
            }
        }

        // 4. 正则匹配完整输入，编译失败直接中止
        if let Some(pattern) = rule.regex_pattern() {
            if Regex::new(pattern)?.is_match(target.raw()) {
                return Ok(Some(MatchCriterion::Regex));
            }
        }

        // 5. MIME（仅文件），嗅探失败视为不确定
        if let Some(pattern) = rule.mime_pattern() {
            if !target.is_url() {
                let mime_regex = Regex::new(pattern)?;
                match self.mime_sniffer.detect(Path::new(target.raw())) {
                    Ok(mime) if mime_regex.is_match(&mime) => {
                        return Ok(Some(MatchCriterion::Mime));
                    }
                    Ok(_) => {}
                    Err(e) => debug!("MIME嗅探跳过：{}，原因：{}", target.raw(), e),
                }
            }
        }

        // 6. 脚本谓词
        if let Some(source) = rule.script_source() {
            if self.script_evaluator.evaluate(source, target.raw())? {
                return Ok(Some(MatchCriterion::Script));
            }
        }

        Ok(None)
    }
}
