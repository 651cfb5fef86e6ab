use thiserror::Error;

/// 应用程序错误类型
///
/// 只有启动阶段（配置、输入文件、输出目录）的错误会以 `AppError` 的形式
/// 终止整个运行；单个 DOI 的失败会被转换为报告中的一行。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入文件错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端错误: {0}")]
    Http(#[from] HttpError),
    /// 报告写入失败
    #[error("报告写入失败: {0}")]
    Report(#[from] csv::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("配置文件解析失败 {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置项取值非法
    #[error("配置项 {field} 取值非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// 输入文件错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 无法打开或读取输入文件
    #[error("无法读取输入文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// 缺少必需的列
    #[error("输入文件缺少必需的列 '{column}'")]
    MissingColumn { column: &'static str },
    /// 非法的提供方标识
    #[error("第 {row} 行的提供方 '{value}' 非法，只能是 'datacite' 或 'crossref'")]
    InvalidProvider { row: usize, value: String },
    /// 既没有 provider 列也没有配置提供方
    #[error("未指定提供方：请使用 --provider 参数，或在输入文件中提供 'provider' 列")]
    ProviderMissing,
    /// provider 列存在但没有任何取值
    #[error("输入文件的 'provider' 列没有任何有效取值")]
    ProviderColumnEmpty,
}

/// DOI 校验错误（在任何网络请求之前触发）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DoiError {
    #[error("DOI cannot be empty")]
    Empty,
    #[error("Invalid DOI format: {0}")]
    InvalidFormat(String),
}

/// 网络请求错误
#[derive(Debug, Error)]
pub enum HttpError {
    /// 连接失败、超时、读取响应体失败等传输层错误
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 可重试状态码在重试预算耗尽后仍未恢复
    #[error("request to {url} still returned HTTP {status} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },
    /// 构建 reqwest 客户端失败
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// 附件（JSON/XML）提取错误，不影响存在性结果
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("XML content not found in the JSON data")]
    XmlNotFound,
    #[error("Invalid base64 encoding for XML content")]
    InvalidBase64,
    #[error("Failed to fetch Crossref XML. Status code: {0}")]
    CrossrefXmlStatus(u16),
    #[error("Agency lookup returned status code {0}")]
    AgencyStatus(u16),
    #[error("{0}")]
    Http(#[from] HttpError),
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件操作错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
