use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::InputError;
use crate::models::provider::Provider;

const DOI_COLUMN: &str = "doi";
const PROVIDER_COLUMN: &str = "provider";

/// 输入文件中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// 数据行号（表头之后从 1 开始）
    pub row: usize,
    /// 原始 DOI 字符串，未归一化
    pub doi: String,
    /// 该行指定的提供方
    pub provider: Option<Provider>,
}

/// 加载后的输入列表
#[derive(Debug, Clone, Default)]
pub struct InputSet {
    pub rows: Vec<InputRow>,
    pub has_provider_column: bool,
    /// 因 DOI 为空而跳过的行数
    pub skipped: usize,
}

/// 从 CSV 文件加载待校验的 DOI 列表
///
/// 所有提供方取值都会在发出任何网络请求之前校验。
pub fn load_input_file(
    path: &Path,
    configured_provider: Option<Provider>,
    auto_detect: bool,
) -> Result<InputSet, InputError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| InputError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let set = read_input(reader, configured_provider, auto_detect, &path.display().to_string())?;

    info!(
        "✓ 从 {} 加载 {} 个 DOI（跳过空行 {} 个）",
        path.display(),
        set.rows.len(),
        set.skipped
    );
    Ok(set)
}

/// 从任意 reader 读取输入，便于测试
pub fn read_input<R: Read>(
    mut reader: csv::Reader<R>,
    configured_provider: Option<Provider>,
    auto_detect: bool,
    source_name: &str,
) -> Result<InputSet, InputError> {
    let read_failed = |source| InputError::ReadFailed {
        path: source_name.to_string(),
        source,
    };

    let headers = reader.headers().map_err(read_failed)?.clone();
    let doi_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(DOI_COLUMN))
        .ok_or(InputError::MissingColumn { column: DOI_COLUMN })?;
    let provider_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(PROVIDER_COLUMN));

    let mut set = InputSet {
        has_provider_column: provider_idx.is_some(),
        ..Default::default()
    };
    let mut any_row_provider = false;

    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = record.map_err(read_failed)?;

        let provider = match provider_idx.and_then(|i| record.get(i)) {
            Some(value) if !value.is_empty() => {
                let provider = value.parse::<Provider>().map_err(|_| InputError::InvalidProvider {
                    row,
                    value: value.to_string(),
                })?;
                any_row_provider = true;
                Some(provider)
            }
            _ => None,
        };

        let doi = record.get(doi_idx).unwrap_or_default();
        if doi.is_empty() {
            debug!("跳过第 {} 行：DOI 为空", row);
            set.skipped += 1;
            continue;
        }

        set.rows.push(InputRow {
            row,
            doi: doi.to_string(),
            provider,
        });
    }

    if configured_provider.is_none() && !auto_detect {
        if !set.has_provider_column {
            return Err(InputError::ProviderMissing);
        }
        if !any_row_provider {
            return Err(InputError::ProviderColumnEmpty);
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn reads_rows_with_per_row_provider() {
        let data = "doi,provider\n10.1234/a,datacite\n10.1234/b,Crossref\n";
        let set = read_input(reader(data), None, false, "test").unwrap();
        assert!(set.has_provider_column);
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[1].provider, Some(Provider::Crossref));
        assert_eq!(set.rows[1].row, 2);
    }

    #[test]
    fn skips_empty_doi_values() {
        let data = "doi\n10.1234/a\n\n  \n10.1234/b\n";
        let set = read_input(reader(data), Some(Provider::Datacite), false, "test").unwrap();
        assert_eq!(set.rows.len(), 2);
        assert!(set.rows.iter().all(|r| r.provider.is_none()));
    }

    #[test]
    fn missing_doi_column_is_fatal() {
        let err = read_input(reader("id\n10.1234/a\n"), Some(Provider::Datacite), false, "test")
            .unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { column: "doi" }));
    }

    #[test]
    fn invalid_provider_tag_is_fatal() {
        let data = "doi,provider\n10.1234/a,datacite\n10.1234/b,medra\n";
        let err = read_input(reader(data), None, false, "test").unwrap_err();
        match err {
            InputError::InvalidProvider { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "medra");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn provider_required_when_not_configured() {
        let err = read_input(reader("doi\n10.1234/a\n"), None, false, "test").unwrap_err();
        assert!(matches!(err, InputError::ProviderMissing));

        let err = read_input(reader("doi,provider\n10.1234/a,\n"), None, false, "test").unwrap_err();
        assert!(matches!(err, InputError::ProviderColumnEmpty));
    }

    #[test]
    fn auto_detection_lifts_provider_requirement() {
        let set = read_input(reader("doi\n10.1234/a\n"), None, true, "test").unwrap();
        assert_eq!(set.rows.len(), 1);
    }
}
