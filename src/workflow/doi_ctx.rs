//! DOI 处理上下文
//!
//! 封装"我正在处理输入文件第几行的哪个 DOI"这一信息

use std::fmt::Display;

use crate::models::{InputRow, Provider};

/// DOI 处理上下文
#[derive(Debug, Clone)]
pub struct DoiCtx {
    /// 输入文件中的数据行号（仅用于日志显示）
    pub row: usize,

    /// 原始输入，未归一化
    pub raw: String,

    /// 该行指定的提供方，优先于运行级配置
    pub provider: Option<Provider>,
}

impl DoiCtx {
    pub fn new(row: usize, raw: impl Into<String>, provider: Option<Provider>) -> Self {
        Self {
            row,
            raw: raw.into(),
            provider,
        }
    }
}

impl From<&InputRow> for DoiCtx {
    fn from(row: &InputRow) -> Self {
        Self::new(row.row, row.doi.clone(), row.provider)
    }
}

impl Display for DoiCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第 {} 行 DOI#{}]", self.row, self.raw.trim())
    }
}
