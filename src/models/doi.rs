//! DOI 标识符
//!
//! 输入可能带有 `doi:` 前缀、解析器 URL 或百分号编码，
//! 统一归一化为小写的 `10.NNNN/suffix` 形式。

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::DoiError;

/// 注册者代码 4-9 位数字，后缀只允许 DOI 安全字符
const DOI_PATTERN: &str = r"10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+";

fn doi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DOI_PATTERN).expect("DOI pattern is a valid regex"))
}

/// 归一化后的 DOI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Doi(String);

impl Doi {
    /// 解析并归一化原始输入
    pub fn parse(raw: &str) -> Result<Self, DoiError> {
        normalize(raw).map(Doi)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 用作附件文件名的形式：路径分隔符替换为下划线
    pub fn file_stem(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 归一化 DOI 字符串
///
/// 1. 百分号解码并去除首尾空白
/// 2. 提取第一个符合 DOI 模式的片段（自然去掉 `doi:`、`https://doi.org/` 等前缀）
/// 3. 转为小写
pub fn normalize(raw: &str) -> Result<String, DoiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DoiError::Empty);
    }

    // 非法的百分号序列按原样保留
    let decoded = urlencoding::decode(trimmed)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| trimmed.to_string());
    let decoded = decoded.trim();

    let found = doi_regex()
        .find(decoded)
        .ok_or_else(|| DoiError::InvalidFormat(decoded.to_string()))?;

    Ok(found.as_str().trim().to_lowercase())
}
