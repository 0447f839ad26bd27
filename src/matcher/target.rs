//! 匹配目标：区分 URL 与文件路径

use url::Url;

use crate::utils::PathUtils;

/// 一次匹配的输入
#[derive(Debug, Clone)]
pub struct MatchTarget<'a> {
    raw: &'a str,
    url: Option<Url>,
}

impl<'a> MatchTarget<'a> {
    /// 能解析出非空 scheme 的输入视为 URL，否则视为路径
    pub fn parse(raw: &'a str) -> Self {
        let url = Url::parse(raw).ok().filter(|u| !u.scheme().is_empty());
        Self { raw, url }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn is_url(&self) -> bool {
        self.url.is_some()
    }

    /// URL 的 scheme（小写）
    pub fn scheme(&self) -> Option<&str> {
        self.url.as_ref().map(Url::scheme)
    }

    /// 参与扩展名匹配的候选扩展名（小写、无前导点）
    /// URL 取路径部分；mailto: 这类不透明 URL 没有路径
    pub fn candidate_extension(&self) -> String {
        match &self.url {
            Some(url) if url.cannot_be_a_base() => String::new(),
            Some(url) => PathUtils::match_extension(url.path()),
            None => PathUtils::match_extension(self.raw),
        }
    }
}

/// 输入是否为带 scheme 的 URL
pub fn is_url(raw: &str) -> bool {
    MatchTarget::parse(raw).is_url()
}
