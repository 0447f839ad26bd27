//! 交互选择：多条规则命中时由用户挑选

use std::io::{BufRead, Write};

use crate::error::{RsvResult, RsviaError};

/// 最多允许的无效输入次数
const MAX_ATTEMPTS: usize = 3;

/// 选择能力：返回所选项的下标
pub trait Selector {
    fn select(&mut self, title: &str, options: &[String]) -> RsvResult<usize>;
}

/// 基于编号菜单的终端选择器
pub struct PromptSelector<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn parse_choice(line: &str, count: usize) -> Option<usize> {
        let number: usize = line.trim().parse().ok()?;
        (1..=count).contains(&number).then(|| number - 1)
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn select(&mut self, title: &str, options: &[String]) -> RsvResult<usize> {
        if options.is_empty() {
            return Err(RsviaError::SelectionError("no options to choose from".to_string()));
        }

        writeln!(self.output, "{}", title)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, option)?;
        }

        for _ in 0..MAX_ATTEMPTS {
            write!(self.output, "Select [1-{}]: ", options.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(RsviaError::SelectionError("selection cancelled".to_string()));
            }
            match Self::parse_choice(&line, options.len()) {
                Some(index) => return Ok(index),
                None => writeln!(self.output, "Invalid choice: {}", line.trim())?,
            }
        }

        Err(RsviaError::SelectionError(format!(
            "no valid choice after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}
