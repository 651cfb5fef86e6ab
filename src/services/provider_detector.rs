//! 提供方自动识别（可选功能，默认关闭）
//!
//! 通过 Crossref 的 agency 接口查询 DOI 的注册机构，结果按 DOI 缓存。
//! 查询失败或注册机构不受支持时回退到 DataCite。

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::infrastructure::{RateLimiters, ResilientClient};
use crate::models::{Doi, Provider};
use crate::services::registry::CrossrefRegistry;

pub struct ProviderDetector {
    crossref: CrossrefRegistry,
    fallback: Provider,
    cache: Mutex<HashMap<Doi, Provider>>,
}

impl ProviderDetector {
    pub fn new(crossref_api_base: &str) -> Self {
        Self {
            crossref: CrossrefRegistry::new(crossref_api_base),
            fallback: Provider::Datacite,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn detect(
        &self,
        session: &ResilientClient,
        limiters: &RateLimiters,
        doi: &Doi,
    ) -> Provider {
        if let Some(provider) = self.cached(doi) {
            return provider;
        }

        // 缓存锁不跨网络请求持有
        let provider = match self
            .crossref
            .agency(session, limiters.for_provider(Provider::Crossref), doi)
            .await
        {
            Ok(Some(provider)) => provider,
            Ok(None) => {
                warn!("⚠️ {} 的注册机构不受支持，回退到 {}", doi, self.fallback);
                self.fallback
            }
            Err(e) => {
                warn!("⚠️ 无法识别 {} 的注册机构: {}，回退到 {}", doi, e, self.fallback);
                self.fallback
            }
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(doi.clone(), provider);
        provider
    }

    fn cached(&self, doi: &Doi) -> Option<Provider> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(doi)
            .copied()
    }
}
