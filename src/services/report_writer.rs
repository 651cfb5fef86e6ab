//! 报告写入服务 - 业务能力层
//!
//! 只负责"把一条结果写成 CSV 一行"，多个 worker 共享同一个实例。

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::AppError;
use crate::models::VerificationResult;

const BASE_COLUMNS: [&str; 7] = [
    "doi",
    "provider",
    "exists",
    "http_code",
    "error_message",
    "json_path",
    "xml_path",
];

const RESOLUTION_COLUMNS: [&str; 5] = [
    "resolves",
    "resolution_url",
    "resolution_code",
    "resolution_time",
    "resolution_error",
];

/// 报告表头；启用解析检查时追加解析列
pub fn header(include_resolution: bool) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if include_resolution {
        columns.extend(RESOLUTION_COLUMNS);
    }
    columns
}

/// CSV 报告写入器
///
/// 每行在同一把锁内写入并立即 flush，中途崩溃时已写出的行不会丢失。
pub struct ReportWriter<W: Write = File> {
    writer: Mutex<csv::Writer<W>>,
    include_resolution: bool,
}

impl ReportWriter<File> {
    /// 创建报告文件并写入表头
    pub fn create(path: &Path, include_resolution: bool) -> Result<Self, AppError> {
        let file = File::create(path).map_err(|e| AppError::io(path.display().to_string(), e))?;
        let writer = Self::from_writer(file, include_resolution)?;
        debug!("报告文件: {}", path.display());
        Ok(writer)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn from_writer(inner: W, include_resolution: bool) -> Result<Self, AppError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(header(include_resolution))?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(Self {
            writer: Mutex::new(writer),
            include_resolution,
        })
    }

    /// 写入一行
    pub fn write(&self, result: &VerificationResult) -> Result<(), csv::Error> {
        let record = result.to_record(self.include_resolution);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_record(&record)?;
        writer.flush()?;
        Ok(())
    }

    /// 取回底层 writer（测试用）
    pub fn into_inner(self) -> Option<W> {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_inner()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, ResolutionInfo};
    use std::sync::Arc;

    #[test]
    fn header_depends_on_resolution() {
        assert_eq!(header(false).len(), 7);
        assert_eq!(header(true).len(), 12);
        assert_eq!(header(true)[7], "resolves");
    }

    #[test]
    fn quotes_fields_containing_commas() {
        let writer = ReportWriter::from_writer(Vec::new(), false).unwrap();
        let result = VerificationResult::failed("10.1234/x", Some(Provider::Datacite), "a, b");
        writer.write(&result).unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "doi,provider,exists,http_code,error_message,json_path,xml_path"
        );
        assert_eq!(lines.next().unwrap(), "10.1234/x,datacite,false,-1,\"a, b\",,");
    }

    #[test]
    fn concurrent_writers_never_interleave_rows() {
        let writer = Arc::new(ReportWriter::from_writer(Vec::new(), true).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = writer.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        let result = VerificationResult::checked(
                            format!("10.1234/t{t}-{i}"),
                            Provider::Crossref,
                            200,
                        )
                        .with_resolution(ResolutionInfo {
                            resolves: true,
                            url: Some(format!("https://example.org/{t}/{i}")),
                            http_status: Some(200),
                            elapsed_seconds: Some(0.1),
                            error: None,
                        });
                        writer.write(&result).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let writer = Arc::try_unwrap(writer).ok().unwrap();
        let out = writer.into_inner().unwrap();
        let mut reader = csv::Reader::from_reader(out.as_slice());
        let mut seen = std::collections::HashSet::new();
        for record in reader.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), 12);
            assert!(seen.insert(record[0].to_string()));
        }
        assert_eq!(seen.len(), 2000);
    }
}
