//! 集成测试共用的搭建代码：所有接口地址都指向同一个 wiremock 服务器

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use doi_verify::config::Config;
use doi_verify::infrastructure::{RateLimiters, ResilientClient, SessionSettings};
use doi_verify::services::ArtifactStore;
use doi_verify::workflow::VerifyFlow;
use wiremock::MockServer;

pub const DATACITE: &str = "/datacite";
pub const CROSSREF: &str = "/crossref";
pub const RESOLVER: &str = "/resolver";

/// 指向 mock 服务器的配置；重试不等待，顺序模式不间隔
pub fn test_config(server: &MockServer, output_dir: &Path) -> Config {
    Config {
        output_dir: output_dir.to_path_buf(),
        datacite_api_base: format!("{}{}", server.uri(), DATACITE),
        crossref_api_base: format!("{}{}", server.uri(), CROSSREF),
        resolver_base: format!("{}{}", server.uri(), RESOLVER),
        backoff_factor_seconds: 0.0,
        sequential_delay_ms: 0,
        request_timeout_seconds: 5,
        resolution_timeout_seconds: 5,
        ..Default::default()
    }
}

/// 单个 worker 的流程及其会话
pub struct Harness {
    pub flow: VerifyFlow,
    pub session: ResilientClient,
}

pub fn harness(config: &Config) -> Harness {
    let artifacts = ArtifactStore::prepare(config).expect("创建附件目录失败");
    let flow = VerifyFlow::new(
        config,
        Arc::new(RateLimiters::from_config(config)),
        artifacts,
    );
    let session =
        ResilientClient::new(&SessionSettings::from_config(config)).expect("创建 HTTP 会话失败");

    Harness {
        flow,
        session,
    }
}
