//! 分发器：把命令行参数路由到文件执行、命令执行或交互选择
//! 单文件分发状态：
//!   命中规则 -> 依次执行
//!   未命中 -> URL/已存在文件 -> 默认命令或系统打开
//!   未命中 -> 既非 URL 也不存在 -> NotFoundNotMatched（调用方转为命令执行）

use std::io::{self, BufReader, Stdin, Stdout, Write};
use std::path::Path;
use tracing::{debug, info};

use super::explain::ExplainReport;
use super::selector::{PromptSelector, Selector};
use crate::config::GlobalConfig;
use crate::error::{RsvResult, RsviaError};
use crate::executor::{ExecutionOptions, Executor};
use crate::matcher::{is_url, RuleMatcher};
use crate::rule::{Rule, RuleLibrary};
use crate::utils::HistoryEntry;

/// 交互菜单中的系统默认选项
pub const SYSTEM_DEFAULT_OPTION: &str = "System Default";

/// 分发器
pub struct Dispatcher<'a, W: Write> {
    library: &'a RuleLibrary,
    config: GlobalConfig,
    matcher: RuleMatcher,
    executor: Executor<W>,
    selector: Box<dyn Selector + 'a>,
}

impl<'a, W: Write> Dispatcher<'a, W> {
    /// 默认使用终端编号菜单作为选择器
    pub fn new(library: &'a RuleLibrary, config: GlobalConfig, executor: Executor<W>) -> Self {
        let selector: PromptSelector<BufReader<Stdin>, Stdout> =
            PromptSelector::new(BufReader::new(io::stdin()), io::stdout());
        Self {
            library,
            config,
            matcher: RuleMatcher::new(),
            executor,
            selector: Box::new(selector),
        }
    }

    pub fn with_matcher(mut self, matcher: RuleMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn Selector + 'a>) -> Self {
        self.selector = selector;
        self
    }

    pub fn into_executor(self) -> Executor<W> {
        self.executor
    }

    /// 入口：按参数个数和选项路由
    pub fn run(&mut self, args: &[String]) -> RsvResult<()> {
        match args {
            [] => Err(RsviaError::InvalidInput("no file or command given".to_string())),
            [input] if self.config.explain => {
                ExplainReport::new(self.library, &self.matcher).write_to(input, self.executor.output_mut())
            }
            [input] if self.config.select => self.handle_interactive(input),
            [input] => match self.handle_file(input) {
                Err(e) if e.is_not_found_not_matched() => {
                    debug!("未匹配且文件不存在，按命令执行：{}", input);
                    self.handle_command(args)
                }
                result => result,
            },
            _ => self.handle_command(args),
        }
    }

    /// 文件/URL 执行
    pub fn handle_file(&mut self, input: &str) -> RsvResult<()> {
        let library = self.library;

        // 1. 规则匹配（匹配错误直接返回）
        let matches = self.matcher.match_rules(&library.rules, input)?;
        if !matches.is_empty() {
            for rule in matches {
                self.execute_rule(rule, input)?;
            }
            return Ok(());
        }

        // 2. 未命中：URL 或已存在的文件走默认命令/系统打开
        if Self::is_openable(input) {
            return self.open_default(input);
        }

        // 3. 交给调用方按命令重试
        Err(RsviaError::NotFoundNotMatched(input.to_string()))
    }

    /// 命令执行：别名 -> 默认命令 -> 原样执行
    pub fn handle_command(&mut self, args: &[String]) -> RsvResult<()> {
        let library = self.library;
        let Some((command, rest)) = args.split_first() else {
            return Err(RsviaError::InvalidInput("no command given".to_string()));
        };

        if let Some(target) = library.alias(command) {
            info!("别名展开：{} -> {}", command, target);
            let (program, alias_args) = Self::alias_invocation(command, target, rest)?;
            return self.executor.execute_command(&program, &alias_args);
        }

        if rest.is_empty() && which::which(command).is_err() {
            if let Some(default_command) = library.default_command() {
                debug!("{} 不在 PATH 中，使用默认命令", command);
                return self.executor.execute(default_command, command, &ExecutionOptions::default());
            }
        }

        self.executor.execute_command(command, rest)
    }

    /// 交互选择：列出所有命中规则（及系统默认）供用户挑选
    pub fn handle_interactive(&mut self, input: &str) -> RsvResult<()> {
        let library = self.library;
        let candidates = self.matcher.match_all(&library.rules, input)?;

        let mut options: Vec<String> = candidates.iter().map(|rule| rule.label()).collect();
        let allow_system = Self::is_openable(input);
        if allow_system {
            options.push(SYSTEM_DEFAULT_OPTION.to_string());
        }
        if options.is_empty() {
            return Err(RsviaError::NoCandidates(input.to_string()));
        }

        let title = format!("Select action for {}", input);
        let index = self.selector.select(&title, &options)?;
        match candidates.get(index) {
            Some(rule) => self.execute_rule(rule, input),
            None if allow_system && index == candidates.len() => self.open_default(input),
            None => Err(RsviaError::SelectionError(format!("choice {} out of range", index + 1))),
        }
    }

    /// 历史记录：选择一条（最新在前）并重新分发
    pub fn handle_history(&mut self, entries: &[HistoryEntry]) -> RsvResult<()> {
        if entries.is_empty() {
            writeln!(self.executor.output_mut(), "No history available")?;
            return Ok(());
        }

        let recent: Vec<&HistoryEntry> = entries.iter().rev().collect();
        let options: Vec<String> = recent.iter().map(|entry| Self::history_label(entry)).collect();
        let index = self.selector.select("Select a command to re-run", &options)?;
        let entry = recent
            .get(index)
            .ok_or_else(|| RsviaError::SelectionError(format!("choice {} out of range", index + 1)))?;

        writeln!(self.executor.output_mut(), "Re-running: {}", entry.command)?;
        self.run(&[entry.command.clone()])
    }

    /// 输出匹配详情，不执行任何命令
    pub fn explain(&self, input: &str, out: &mut dyn Write) -> RsvResult<()> {
        ExplainReport::new(self.library, &self.matcher).write_to(input, out)
    }

    fn execute_rule(&mut self, rule: &Rule, input: &str) -> RsvResult<()> {
        info!("执行规则：{}", rule.label());
        self.executor.execute(&rule.command, input, &ExecutionOptions::from_rule(rule))
    }

    fn open_default(&mut self, input: &str) -> RsvResult<()> {
        match self.library.default_command() {
            Some(default_command) => self.executor.execute(default_command, input, &ExecutionOptions::default()),
            None => self.executor.open_system(input),
        }
    }

    /// 别名目标按 shell 规则分词，用户参数追加在后
    fn alias_invocation(alias: &str, target: &str, rest: &[String]) -> RsvResult<(String, Vec<String>)> {
        let words = shlex::split(target).ok_or_else(|| {
            RsviaError::InvalidInput(format!("alias `{}` has unbalanced quotes: {}", alias, target))
        })?;
        let Some((program, leading)) = words.split_first() else {
            return Err(RsviaError::InvalidInput(format!("alias `{}` is empty", alias)));
        };
        let mut args = leading.to_vec();
        args.extend(rest.iter().cloned());
        Ok((program.clone(), args))
    }

    fn history_label(entry: &HistoryEntry) -> String {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
        if entry.rule_name.is_empty() {
            format!("{}  {}", time, entry.command)
        } else {
            format!("{}  {} ({})", time, entry.command, entry.rule_name)
        }
    }

    fn is_openable(input: &str) -> bool {
        is_url(input) || Path::new(input).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::executor::SystemOpener;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// 固定返回某个下标，并记下展示的选项
    struct FixedSelector {
        choice: usize,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Selector for FixedSelector {
        fn select(&mut self, _title: &str, options: &[String]) -> RsvResult<usize> {
            *self.seen.borrow_mut() = options.to_vec();
            Ok(self.choice)
        }
    }

    fn ext_rule(name: &str, exts: &[&str], command: &str) -> Rule {
        Rule {
            name: Some(name.to_string()),
            extensions: exts.iter().map(|e| e.to_string()).collect(),
            ..Rule::from_command(command)
        }
    }

    fn dry_dispatcher(library: &RuleLibrary, config: GlobalConfig) -> Dispatcher<'_, Vec<u8>> {
        Dispatcher::new(library, config, Executor::new(Vec::new(), true))
    }

    fn dry_config() -> GlobalConfig {
        ConfigManager::custom().dry_run(true).build()
    }

    fn output(dispatcher: Dispatcher<'_, Vec<u8>>) -> String {
        String::from_utf8(dispatcher.into_executor().into_output()).unwrap()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn opener_line(path: &str) -> String {
        let (program, opener_args) = SystemOpener::invocation(path);
        format!("{} {}\n", program, opener_args.join(" "))
    }

    #[test]
    fn test_unknown_file_without_default_is_not_found() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Text", &["txt"], "vim {{.File}}")],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        let err = dispatcher.handle_file("via-missing-input.zzz").unwrap_err();
        assert!(err.is_not_found_not_matched());
        assert!(output(dispatcher).is_empty());
    }

    #[test]
    fn test_matched_rule_dry_run() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Text", &["txt"], "vim {{.File}}")],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["test.txt"])).unwrap();
        assert_eq!(output(dispatcher), "vim test.txt\n");
    }

    #[test]
    fn test_fallthrough_rules_execute_in_order() {
        let library = RuleLibrary {
            rules: vec![
                Rule { fallthrough: true, ..ext_rule("Log", &["txt"], "echo 1 {{.File}}") },
                Rule { background: true, ..ext_rule("Open", &["txt"], "echo 2 {{.File}}") },
                ext_rule("Never", &["txt"], "echo 3 {{.File}}"),
            ],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["a.txt"])).unwrap();
        assert_eq!(output(dispatcher), "echo 1 a.txt\necho 2 a.txt (background)\n");
    }

    #[test]
    fn test_url_scheme_rule() {
        let library = RuleLibrary {
            rules: vec![Rule {
                scheme: Some("https".to_string()),
                ..Rule::from_command("open {{.File}}")
            }],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["https://example.com"])).unwrap();
        assert_eq!(output(dispatcher), "open https://example.com\n");
    }

    #[test]
    fn test_unmatched_url_uses_default_command() {
        let library = RuleLibrary {
            default_command: "browser {{.File}}".to_string(),
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.handle_file("https://example.com/x").unwrap();
        assert_eq!(output(dispatcher), "browser https://example.com/x\n");
    }

    #[test]
    fn test_unmatched_existing_file_opens_with_system() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, "%PDF-1.4").unwrap();
        let file = file.to_string_lossy().to_string();

        let library = RuleLibrary::default();
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&[file.clone()]).unwrap();
        assert_eq!(output(dispatcher), opener_line(&file));
    }

    #[test]
    fn test_alias_expands_with_arguments() {
        let mut aliases = BTreeMap::new();
        aliases.insert("ll".to_string(), "ls -la".to_string());
        let library = RuleLibrary { aliases, ..RuleLibrary::default() };

        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["ll", "/tmp"])).unwrap();
        assert_eq!(output(dispatcher), "ls -la /tmp\n");
    }

    #[test]
    fn test_alias_target_is_shell_tokenized() {
        let (program, args) = Dispatcher::<Vec<u8>>::alias_invocation(
            "p",
            "printf '%s|' 'a b'",
            &["c d".to_string()],
        )
        .unwrap();
        assert_eq!(program, "printf");
        assert_eq!(args, vec!["%s|", "a b", "c d"]);
    }

    #[test]
    fn test_alias_with_unbalanced_quotes_is_invalid() {
        let mut aliases = BTreeMap::new();
        aliases.insert("bad".to_string(), "echo 'oops".to_string());
        aliases.insert("blank".to_string(), "  ".to_string());
        let library = RuleLibrary { aliases, ..RuleLibrary::default() };

        let mut dispatcher = dry_dispatcher(&library, dry_config());
        let err = dispatcher.run(&args(&["bad", "x"])).unwrap_err();
        assert!(matches!(err, RsviaError::InvalidInput(ref m) if m.contains("unbalanced quotes")));
        let err = dispatcher.run(&args(&["blank", "x"])).unwrap_err();
        assert!(matches!(err, RsviaError::InvalidInput(_)));
        assert!(output(dispatcher).is_empty());
    }

    #[test]
    fn test_passthrough_command_is_not_split() {
        // 测试场景：带空格的单个参数原样作为程序名
        let library = RuleLibrary::default();
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["via missing file.txt"])).unwrap();
        assert_eq!(output(dispatcher), "via missing file.txt\n");
    }

    #[test]
    fn test_history_rerun_dispatches_selected_entry() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Text", &["txt"], "vim {{.File}}")],
            ..RuleLibrary::default()
        };
        let entry = |command: &str, rule: &str| HistoryEntry {
            timestamp: chrono::Local::now(),
            command: command.to_string(),
            rule_name: rule.to_string(),
        };
        let entries = vec![entry("old.txt", "Text"), entry("new.txt", "")];

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = dry_dispatcher(&library, dry_config())
            .with_selector(Box::new(FixedSelector { choice: 1, seen: seen.clone() }));
        dispatcher.handle_history(&entries).unwrap();

        let options = seen.borrow().clone();
        assert_eq!(options.len(), 2);
        assert!(options[0].ends_with("  new.txt"));
        assert!(options[1].ends_with("  old.txt (Text)"));
        assert_eq!(output(dispatcher), "Re-running: old.txt\nvim old.txt\n");
    }

    #[test]
    fn test_history_empty() {
        let library = RuleLibrary::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = dry_dispatcher(&library, dry_config())
            .with_selector(Box::new(FixedSelector { choice: 0, seen: seen.clone() }));
        dispatcher.handle_history(&[]).unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(output(dispatcher), "No history available\n");
    }

    #[test]
    fn test_unknown_single_argument_uses_default_command() {
        let library = RuleLibrary {
            default_command: "vim {{.File}}".to_string(),
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["via-newfile-test.txt"])).unwrap();
        assert_eq!(output(dispatcher), "vim via-newfile-test.txt\n");
    }

    #[test]
    fn test_default_shorthand_is_honored() {
        let library = RuleLibrary {
            default: "nano {{.File}}".to_string(),
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["via-newfile-test.txt"])).unwrap();
        assert_eq!(output(dispatcher), "nano via-newfile-test.txt\n");
    }

    #[test]
    fn test_command_passthrough() {
        let library = RuleLibrary::default();
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["echo", "hello", "world"])).unwrap();
        assert_eq!(output(dispatcher), "echo hello world\n");
    }

    #[test]
    fn test_unknown_single_argument_without_default_passes_through() {
        let library = RuleLibrary::default();
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        dispatcher.run(&args(&["via-unknown-thing"])).unwrap();
        assert_eq!(output(dispatcher), "via-unknown-thing\n");
    }

    #[test]
    fn test_matcher_error_does_not_retry_as_command() {
        let library = RuleLibrary {
            rules: vec![Rule { regex: Some("[".to_string()), ..Rule::from_command("x") }],
            default_command: "vim {{.File}}".to_string(),
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        let err = dispatcher.run(&args(&["a.txt"])).unwrap_err();
        assert!(matches!(err, RsviaError::CompileError(_)));
        assert!(output(dispatcher).is_empty());
    }

    #[test]
    fn test_execution_error_stops_chain() {
        let library = RuleLibrary {
            rules: vec![
                Rule { fallthrough: true, ..ext_rule("Bad", &["txt"], "vim {{.Bogus}}") },
                ext_rule("Good", &["txt"], "cat {{.File}}"),
            ],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        let err = dispatcher.run(&args(&["a.txt"])).unwrap_err();
        assert!(matches!(err, RsviaError::TemplateError(_)));
        assert!(output(dispatcher).is_empty());
    }

    #[test]
    fn test_interactive_lists_candidates_and_system_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        let file = file.to_string_lossy().to_string();

        let library = RuleLibrary {
            rules: vec![
                ext_rule("Editor", &["txt"], "vim {{.File}}"),
                Rule { extensions: vec!["txt".to_string()], ..Rule::from_command("cat {{.File}}") },
                ext_rule("Images", &["png"], "feh {{.File}}"),
            ],
            ..RuleLibrary::default()
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let config = ConfigManager::custom().dry_run(true).select(true).build();
        let mut dispatcher = dry_dispatcher(&library, config)
            .with_selector(Box::new(FixedSelector { choice: 1, seen: seen.clone() }));

        dispatcher.run(&[file.clone()]).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec!["Editor", "Command: cat {{.File}}", SYSTEM_DEFAULT_OPTION]
        );
        assert_eq!(output(dispatcher), format!("cat {}\n", file));
    }

    #[test]
    fn test_interactive_system_default_prefers_default_command() {
        let library = RuleLibrary {
            default_command: "xdg-open {{.File}}".to_string(),
            ..RuleLibrary::default()
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = dry_dispatcher(&library, dry_config())
            .with_selector(Box::new(FixedSelector { choice: 0, seen: seen.clone() }));

        dispatcher.handle_interactive("https://example.com").unwrap();
        assert_eq!(*seen.borrow(), vec![SYSTEM_DEFAULT_OPTION]);
        assert_eq!(output(dispatcher), "xdg-open https://example.com\n");
    }

    #[test]
    fn test_interactive_without_candidates() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Images", &["png"], "feh {{.File}}")],
            ..RuleLibrary::default()
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = dry_dispatcher(&library, dry_config())
            .with_selector(Box::new(FixedSelector { choice: 0, seen: seen.clone() }));

        let err = dispatcher.handle_interactive("via-missing.txt").unwrap_err();
        assert!(matches!(err, RsviaError::NoCandidates(_)));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_run_explain_does_not_execute() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Text Editor", &["txt"], "vim {{.File}}")],
            ..RuleLibrary::default()
        };
        let config = ConfigManager::custom().dry_run(true).explain(true).build();
        let mut dispatcher = dry_dispatcher(&library, config);
        dispatcher.run(&args(&["test.txt"])).unwrap();

        let report = output(dispatcher);
        assert!(report.contains("=== EXPLAIN MODE ==="));
        assert!(report.contains("Text Editor"));
        assert!(!report.contains("vim test.txt\n"));
    }

    #[test]
    fn test_explain_writes_to_given_writer() {
        let library = RuleLibrary {
            rules: vec![ext_rule("Text Editor", &["txt"], "vim {{.File}}")],
            ..RuleLibrary::default()
        };
        let dispatcher = dry_dispatcher(&library, dry_config());
        let mut report = Vec::new();
        dispatcher.explain("notes.txt", &mut report).unwrap();

        let report = String::from_utf8(report).unwrap();
        assert!(report.contains("[1] Text Editor: matched by extension"));
        assert!(output(dispatcher).is_empty());
    }

    #[test]
    fn test_injected_matcher_platform() {
        let library = RuleLibrary {
            rules: vec![Rule {
                os: vec!["plan9".to_string()],
                ..ext_rule("Plan9", &["txt"], "acme {{.File}}")
            }],
            ..RuleLibrary::default()
        };
        let mut dispatcher = dry_dispatcher(&library, dry_config())
            .with_matcher(RuleMatcher::new().with_platform("plan9"));
        dispatcher.handle_file("a.txt").unwrap();
        assert_eq!(output(dispatcher), "acme a.txt\n");
    }

    #[test]
    fn test_empty_arguments_is_error() {
        let library = RuleLibrary::default();
        let mut dispatcher = dry_dispatcher(&library, dry_config());
        let err = dispatcher.run(&[]).unwrap_err();
        assert!(matches!(err, RsviaError::InvalidInput(_)));
        let err = dispatcher.handle_command(&[]).unwrap_err();
        assert!(matches!(err, RsviaError::InvalidInput(_)));
    }
}
