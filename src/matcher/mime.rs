//! MIME 类型嗅探（基于文件内容，而非扩展名）

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::RsvResult;

/// 嗅探时读取的文件头长度
const SNIFF_LEN: usize = 8192;

pub const MIME_TEXT_PLAIN: &str = "text/plain";
pub const MIME_TEXT_UTF8: &str = "text/plain; charset=utf-8";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// MIME 嗅探能力
pub trait MimeSniffer {
    fn detect(&self, path: &Path) -> RsvResult<String>;
}

/// 基于魔数的内容嗅探器，无法识别时按文本/二进制兜底
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSniffer;

impl ContentSniffer {
    /// 按文件头字节判断类型
    pub fn detect_bytes(head: &[u8]) -> String {
        if let Some(kind) = infer::get(head) {
            return kind.mime_type().to_string();
        }
        if head.is_empty() {
            return MIME_TEXT_PLAIN.to_string();
        }
        if Self::looks_like_utf8(head) {
            MIME_TEXT_UTF8.to_string()
        } else {
            MIME_OCTET_STREAM.to_string()
        }
    }

    // 截断位置可能落在多字节字符中间，尾部不完整不算非法
    fn looks_like_utf8(head: &[u8]) -> bool {
        if head.contains(&0) {
            return false;
        }
        match std::str::from_utf8(head) {
            Ok(_) => true,
            Err(e) => e.error_len().is_none() && head.len() == SNIFF_LEN,
        }
    }
}

impl MimeSniffer for ContentSniffer {
    fn detect(&self, path: &Path) -> RsvResult<String> {
        let file = File::open(path)?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
        Ok(Self::detect_bytes(&head))
    }
}
