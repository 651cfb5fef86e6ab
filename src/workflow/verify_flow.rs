//! DOI 校验流程 - 流程层
//!
//! 核心职责：定义"一个 DOI"的完整处理流程
//!
//! 流程顺序（同一个 DOI 内严格串行）：
//! 1. 归一化（失败则不发出任何请求）
//! 2. 确定提供方：行内 provider → 运行级 provider → 自动识别
//! 3. 限流放行 → 存在性检查 → 附件
//! 4. 解析器跳转检查（可选）
//!
//! 计数由编排层在写入报告时统一完成，每行只计一次。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::{RateLimiters, ResilientClient};
use crate::models::{ArtifactPaths, Doi, Provider, VerificationResult};
use crate::services::{
    ArtifactRequest, ArtifactStore, ProviderDetector, RegistryLookup, RegistryService,
    ResolutionChecker,
};
use crate::workflow::doi_ctx::DoiCtx;

/// DOI 校验流程
///
/// - 不持有 HTTP 会话，由调用方按 worker 传入
/// - 只依赖业务能力（services）
/// - 永远返回一个结果，不向上抛错
pub struct VerifyFlow {
    registry: RegistryService,
    limiters: Arc<RateLimiters>,
    artifacts: ArtifactStore,
    resolution: Option<ResolutionChecker>,
    detector: Option<ProviderDetector>,
    default_provider: Option<Provider>,
    verbose_logging: bool,
}

impl VerifyFlow {
    pub fn new(
        config: &Config,
        limiters: Arc<RateLimiters>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            registry: RegistryService::new(config),
            limiters,
            artifacts,
            resolution: config
                .check_resolution
                .then(|| ResolutionChecker::from_config(config)),
            detector: config
                .auto_detect_provider
                .then(|| ProviderDetector::new(&config.crossref_api_base)),
            default_provider: config.provider,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, session: &ResilientClient, ctx: &DoiCtx) -> VerificationResult {
        // ========== 1. 归一化 ==========
        let doi = match Doi::parse(&ctx.raw) {
            Ok(doi) => doi,
            Err(e) => {
                warn!("{} ⚠️ DOI 格式错误: {}", ctx, e);
                return VerificationResult::failed(
                    ctx.raw.trim(),
                    ctx.provider.or(self.default_provider),
                    format!("Verification error: {}", e),
                );
            }
        };

        // ========== 2. 确定提供方 ==========
        let Some(provider) = self.resolve_provider(session, ctx, &doi).await else {
            warn!("{} ⚠️ 没有可用的提供方", ctx);
            return VerificationResult::failed(
                doi.as_str(),
                None,
                "Verification error: no provider configured for this DOI",
            );
        };

        // ========== 3. 存在性检查 ==========
        let request = ArtifactRequest {
            json: self.artifacts.saves_json(),
            xml: self.artifacts.saves_xml(),
        };
        let lookup = match self
            .registry
            .lookup(session, &self.limiters, &doi, provider, request)
            .await
        {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!("{} ❌ {} 请求失败: {}", ctx, provider, e);
                return VerificationResult::failed(
                    doi.as_str(),
                    Some(provider),
                    format!("Verification error: {}", e),
                );
            }
        };

        let mut result = VerificationResult::checked(doi.as_str(), provider, lookup.status);
        if result.exists() {
            if self.verbose_logging {
                info!("{} ✓ 在 {} 中存在", ctx, provider);
            }
            result = self.persist_artifacts(ctx, provider, &doi, lookup, result).await;
        } else {
            debug!("{} {} 返回 {}", ctx, provider, lookup.status);
        }

        // ========== 4. 解析检查 ==========
        if let Some(checker) = &self.resolution {
            let info = checker.check(session, &doi).await;
            if !info.resolves {
                debug!("{} 解析失败: {:?}", ctx, info.error);
            }
            result = result.with_resolution(info);
        }

        result
    }

    async fn resolve_provider(
        &self,
        session: &ResilientClient,
        ctx: &DoiCtx,
        doi: &Doi,
    ) -> Option<Provider> {
        if let Some(provider) = ctx.provider.or(self.default_provider) {
            return Some(provider);
        }
        match &self.detector {
            Some(detector) => Some(detector.detect(session, &self.limiters, doi).await),
            None => None,
        }
    }

    /// 保存附件；任何提取或写入失败都只记录在结果上
    async fn persist_artifacts(
        &self,
        ctx: &DoiCtx,
        provider: Provider,
        doi: &Doi,
        lookup: RegistryLookup,
        result: VerificationResult,
    ) -> VerificationResult {
        let mut paths = ArtifactPaths::default();
        let mut errors = Vec::new();

        if let Some(e) = lookup.extraction_error {
            errors.push(format!("XML extraction error: {}", e));
        }

        if let Some(json) = &lookup.json {
            match self.artifacts.save_json(provider, doi, json).await {
                Ok(path) => paths.json = path,
                Err(e) => errors.push(format!("Artifact write error: {}", e)),
            }
        }

        if let Some(xml) = &lookup.xml {
            match self.artifacts.save_xml(provider, doi, xml).await {
                Ok(path) => paths.xml = path,
                Err(e) => errors.push(format!("Artifact write error: {}", e)),
            }
        }

        let result = result.with_artifacts(paths);
        if errors.is_empty() {
            result
        } else {
            let message = errors.join("; ");
            warn!("{} ⚠️ {}", ctx, message);
            result.with_error_message(message)
        }
    }
}
