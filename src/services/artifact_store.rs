//! 附件存储 - 业务能力层
//!
//! 每个 DOI 一个 JSON / XML 文件，文件名为把 `/` 替换成 `_` 的 DOI。
//! 先写临时文件再重命名，输入中重复的 DOI 不会写出半截文件。

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tokio::fs;

use crate::config::Config;
use crate::error::{AppError, ExtractionError};
use crate::models::{Doi, Provider};

#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    json_dir: Option<PathBuf>,
    xml_dir: Option<PathBuf>,
}

impl ArtifactStore {
    /// 根据配置创建目录；失败属于致命错误
    pub fn prepare(config: &Config) -> Result<Self, AppError> {
        let store = Self {
            json_dir: config
                .save_json
                .then(|| config.output_dir.join("json_responses")),
            xml_dir: config
                .save_xml
                .then(|| config.output_dir.join("xml_responses")),
        };

        for root in [&store.json_dir, &store.xml_dir].into_iter().flatten() {
            for provider in Provider::ALL {
                let dir = root.join(provider.tag());
                std::fs::create_dir_all(&dir)
                    .map_err(|e| AppError::io(dir.display().to_string(), e))?;
            }
        }

        Ok(store)
    }

    pub fn saves_json(&self) -> bool {
        self.json_dir.is_some()
    }

    pub fn saves_xml(&self) -> bool {
        self.xml_dir.is_some()
    }

    /// 保存格式化后的 JSON，未启用时返回 `Ok(None)`
    pub async fn save_json(
        &self,
        provider: Provider,
        doi: &Doi,
        json: &JsonValue,
    ) -> Result<Option<PathBuf>, ExtractionError> {
        let Some(root) = &self.json_dir else {
            return Ok(None);
        };
        let path = root.join(provider.tag()).join(format!("{}.json", doi.file_stem()));
        let content = serde_json::to_vec_pretty(json)?;
        write_atomic(&path, &content).await?;
        Ok(Some(path))
    }

    pub async fn save_xml(
        &self,
        provider: Provider,
        doi: &Doi,
        xml: &str,
    ) -> Result<Option<PathBuf>, ExtractionError> {
        let Some(root) = &self.xml_dir else {
            return Ok(None);
        };
        let path = root.join(provider.tag()).join(format!("{}.xml", doi.file_stem()));
        write_atomic(&path, xml.as_bytes()).await?;
        Ok(Some(path))
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ExtractionError> {
    let write_failed = |source| ExtractionError::Write {
        path: path.display().to_string(),
        source,
    };
    let tmp = path.with_extension(format!("tmp-{:08x}", rand::random::<u32>()));
    fs::write(&tmp, content).await.map_err(write_failed)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_failed(e));
    }
    Ok(())
}
