//! 命令执行器
//! 支持 dry-run（只打印）、后台分离、前台交互三种方式

use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, warn};

use super::opener::SystemOpener;
use super::template::CommandTemplate;
use crate::error::{RsvResult, RsviaError};
use crate::rule::Rule;
use crate::utils::{HistoryRecorder, NoopHistory};

/// 单次执行选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// 分离运行，不等待退出
    pub background: bool,
    /// 提示需要交互终端
    pub terminal: bool,
    /// 附加环境变量
    pub env: BTreeMap<String, String>,
    /// 历史记录中的规则名称
    pub label: String,
}

impl ExecutionOptions {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            background: rule.background,
            terminal: rule.terminal,
            env: rule.env.clone(),
            label: rule.display_name().unwrap_or_default().to_string(),
        }
    }
}

/// 命令执行器
pub struct Executor<W: Write> {
    out: W,
    dry_run: bool,
    history: Box<dyn HistoryRecorder>,
}

impl<W: Write> Executor<W> {
    /// 创建执行器（dry-run 标志在构建时固定）
    pub fn new(out: W, dry_run: bool) -> Self {
        Self {
            out,
            dry_run,
            history: Box::new(NoopHistory),
        }
    }

    pub fn with_history(mut self, history: Box<dyn HistoryRecorder>) -> Self {
        self.history = history;
        self
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// 渲染模板并通过 shell 执行
    pub fn execute(&mut self, template: &str, file: &str, opts: &ExecutionOptions) -> RsvResult<()> {
        let command_line = CommandTemplate::render(template, file)?;

        if self.dry_run {
            let suffix = if opts.background { " (background)" } else { "" };
            writeln!(self.out, "{}{}", command_line, suffix)?;
            return Ok(());
        }

        let mut cmd = Self::shell_command(&command_line);
        cmd.envs(&opts.env);
        if opts.terminal {
            debug!("规则要求交互终端：{}", command_line);
        }

        if opts.background {
            cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
            Self::detach(&mut cmd);
            let child = cmd.spawn().map_err(|e| {
                RsviaError::SpawnError(format!("failed to start background command `{}`: {}", command_line, e))
            })?;
            debug!("后台命令已启动：pid={}，command={}", child.id(), command_line);
            // 释放句柄，不再跟踪退出状态
            drop(child);
            return Ok(());
        }

        self.out.flush()?;
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RsviaError::SpawnError(format!("`{}`: {}", command_line, e)))?;
        Self::check_status(&command_line, status)?;

        if let Err(e) = self.history.record_execution(file, &opts.label) {
            warn!("写入历史记录失败（已忽略）：{}", e);
        }
        Ok(())
    }

    /// 执行已分词的命令（不经模板和 shell），command 原样作为程序名
    pub fn execute_command(&mut self, command: &str, args: &[String]) -> RsvResult<()> {
        if self.dry_run {
            writeln!(self.out, "{}", Self::join_invocation(command, args))?;
            return Ok(());
        }

        self.out.flush()?;
        let status = Command::new(command)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RsviaError::SpawnError(format!("`{}`: {}", command, e)))?;
        Self::check_status(&Self::join_invocation(command, args), status)
    }

    /// 使用系统默认程序打开
    pub fn open_system(&mut self, path: &str) -> RsvResult<()> {
        let (program, args) = SystemOpener::invocation(path);

        if self.dry_run {
            writeln!(self.out, "{}", Self::join_invocation(&program, &args))?;
            return Ok(());
        }

        self.out.flush()?;
        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RsviaError::SpawnError(format!("failed to open system default `{}`: {}", program, e)))?;
        Self::check_status(&Self::join_invocation(&program, &args), status)
    }

    fn join_invocation(command: &str, args: &[String]) -> String {
        if args.is_empty() {
            command.to_string()
        } else {
            format!("{} {}", command, args.join(" "))
        }
    }

    fn check_status(command_line: &str, status: ExitStatus) -> RsvResult<()> {
        if status.success() {
            return Ok(());
        }
        let reason = match status.code() {
            Some(code) => format!("`{}` exited with status {}", command_line, code),
            None => format!("`{}` was terminated by a signal", command_line),
        };
        Err(RsviaError::CommandFailed(reason))
    }

    #[cfg(windows)]
    fn shell_command(command_line: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    }

    #[cfg(not(windows))]
    fn shell_command(command_line: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }

    // 独立进程组，避免终端信号传递到后台进程
    #[cfg(unix)]
    fn detach(cmd: &mut Command) {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    #[cfg(windows)]
    fn detach(cmd: &mut Command) {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(not(any(unix, windows)))]
    fn detach(_cmd: &mut Command) {}
}
