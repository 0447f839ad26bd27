//! Explain 报告：逐条展示规则评估过程，不执行任何命令

use std::io::Write;
use std::path::Path;

use crate::error::RsvResult;
use crate::matcher::{MatchTarget, RuleMatcher};
use crate::rule::{Rule, RuleLibrary};
use crate::utils::PathUtils;

/// Explain 报告生成器
pub struct ExplainReport<'a> {
    library: &'a RuleLibrary,
    matcher: &'a RuleMatcher,
}

impl<'a> ExplainReport<'a> {
    pub fn new(library: &'a RuleLibrary, matcher: &'a RuleMatcher) -> Self {
        Self { library, matcher }
    }

    /// 写出完整报告；匹配错误（正则/脚本）照常返回
    pub fn write_to(&self, input: &str, out: &mut dyn Write) -> RsvResult<()> {
        let target = MatchTarget::parse(input);
        let exists = !target.is_url() && Path::new(input).exists();

        writeln!(out, "=== EXPLAIN MODE ===")?;
        writeln!(out)?;
        self.write_file_info(&target, exists, out)?;
        writeln!(out)?;
        let matched = self.write_rule_evaluation(input, out)?;
        writeln!(out)?;
        self.write_result(&matched, target.is_url() || exists, out)
    }

    fn write_file_info(&self, target: &MatchTarget, exists: bool, out: &mut dyn Write) -> RsvResult<()> {
        writeln!(out, "FILE INFORMATION")?;
        writeln!(out, "  Input: {}", target.raw())?;

        if let Some(scheme) = target.scheme() {
            writeln!(out, "  Type: URL (scheme: {})", scheme)?;
            return Ok(());
        }

        writeln!(out, "  Type: File")?;
        if exists {
            writeln!(out, "  Exists: yes")?;
        } else {
            writeln!(out, "  Exists: Does not exist")?;
        }
        let ext = PathUtils::extension(target.raw());
        writeln!(out, "  Ext: {}", if ext.is_empty() { "(none)" } else { ext })?;
        if exists {
            match self.matcher.sniff_mime(Path::new(target.raw())) {
                Ok(mime) => writeln!(out, "  MIME: {}", mime)?,
                Err(e) => writeln!(out, "  MIME: unknown ({})", e)?,
            }
        }
        Ok(())
    }

    /// 按 match_rules 的停止规则逐条评估，返回会执行的规则
    fn write_rule_evaluation(&self, input: &str, out: &mut dyn Write) -> RsvResult<Vec<&'a Rule>> {
        writeln!(out, "RULE EVALUATION")?;
        if self.library.rules.is_empty() {
            writeln!(out, "  (no rules configured)")?;
        }

        let mut matched = Vec::new();
        let mut stopped = false;
        for (i, rule) in self.library.rules.iter().enumerate() {
            let prefix = format!("  [{}] {}", i + 1, rule.label());
            if stopped {
                writeln!(out, "{}: (not reached)", prefix)?;
                continue;
            }
            if !self.matcher.is_eligible_os(rule) {
                writeln!(out, "{}: skipped (OS mismatch)", prefix)?;
                continue;
            }
            match self.matcher.evaluate_rule(rule, input)? {
                Some(criterion) if rule.fallthrough => {
                    writeln!(out, "{}: matched by {} → fallthrough, continue", prefix, criterion)?;
                    matched.push(rule);
                }
                Some(criterion) => {
                    writeln!(out, "{}: matched by {}", prefix, criterion)?;
                    matched.push(rule);
                    stopped = true;
                }
                None => writeln!(out, "{}: not matched", prefix)?,
            }
        }
        Ok(matched)
    }

    fn write_result(&self, matched: &[&Rule], openable: bool, out: &mut dyn Write) -> RsvResult<()> {
        writeln!(out, "RESULT")?;
        if !matched.is_empty() {
            writeln!(out, "  Would execute:")?;
            for rule in matched {
                let mode = if rule.background { " (background)" } else { "" };
                writeln!(out, "    - {}: {}{}", rule.label(), rule.command, mode)?;
            }
            return Ok(());
        }

        writeln!(out, "  No rules matched")?;
        match (openable, self.library.default_command()) {
            (true, Some(default_command)) => {
                writeln!(out, "  → would use default command: {}", default_command)?
            }
            (true, None) => writeln!(out, "  → would open with system default")?,
            (false, _) => writeln!(out, "  → would retry as command")?,
        }
        Ok(())
    }
}
