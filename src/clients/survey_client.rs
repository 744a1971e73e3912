/// 问卷端点客户端
///
/// 封装清单读取与结果提交两个请求
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{ConfigError, ManifestLoadError, SubmissionError};
use crate::models::{Manifest, ManifestResponse, SubmissionPayload, SubmitAck};
use crate::utils::logging::mask_token;

/// 端点要求的提交 Content-Type，JSON 内容以纯文本声明发送
pub const SUBMIT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// 清单请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestQuery {
    pub token: String,
    pub scenario: Option<String>,
    pub llm: Option<String>,
}

/// 问卷端点能力
#[async_trait]
pub trait SurveyEndpoint {
    /// 读取一份清单
    async fn fetch_manifest(&self, query: &ManifestQuery) -> Result<Manifest, ManifestLoadError>;

    /// 提交作答结果
    async fn submit(&self, token: &str, payload: &SubmissionPayload)
        -> Result<(), SubmissionError>;
}

/// 拼接清单请求地址
pub fn manifest_url(endpoint: &Url, query: &ManifestQuery) -> Url {
    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("token", &query.token);
        if let Some(scenario) = &query.scenario {
            pairs.append_pair("scenario", scenario);
        }
        if let Some(llm) = &query.llm {
            pairs.append_pair("llm", llm);
        }
    }
    url
}

/// 拼接提交地址（口令同时放在查询参数中）
pub fn submit_url(endpoint: &Url, token: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair("token", token);
    url
}

/// 基于 reqwest 的问卷端点客户端
pub struct HttpSurveyClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpSurveyClient {
    /// 创建新的端点客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let endpoint =
            Url::parse(&config.endpoint_url).map_err(|source| ConfigError::InvalidEndpoint {
                url: config.endpoint_url.clone(),
                source,
            })?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| ConfigError::HttpClientBuildFailed { source })?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SurveyEndpoint for HttpSurveyClient {
    async fn fetch_manifest(&self, query: &ManifestQuery) -> Result<Manifest, ManifestLoadError> {
        let url = manifest_url(&self.endpoint, query);
        debug!(
            "请求清单: token={} scenario={:?} llm={:?}",
            mask_token(&query.token),
            query.scenario,
            query.llm
        );

        let response = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| ManifestLoadError::request_failed(self.endpoint.as_str(), e))?;

        debug!("清单响应状态: {}", response.status());

        let body = response
            .text()
            .await
            .map_err(|e| ManifestLoadError::request_failed(self.endpoint.as_str(), e))?;

        let parsed: ManifestResponse =
            serde_json::from_str(&body).map_err(|e| ManifestLoadError::JsonParseFailed {
                source: Box::new(e),
            })?;

        parsed.into_manifest()
    }

    async fn submit(
        &self,
        token: &str,
        payload: &SubmissionPayload,
    ) -> Result<(), SubmissionError> {
        let body = serde_json::to_string_pretty(payload).map_err(|e| {
            SubmissionError::JsonFailed {
                source: Box::new(e),
            }
        })?;

        debug!(
            "提交结果: {} 题, 请求体 {} 字节",
            payload.selections.len(),
            body.len()
        );

        let response = self
            .http
            .post(submit_url(&self.endpoint, token))
            .header(CONTENT_TYPE, HeaderValue::from_static(SUBMIT_CONTENT_TYPE))
            .body(body)
            .send()
            .await
            .map_err(|e| SubmissionError::request_failed(self.endpoint.as_str(), e))?;

        debug!("提交响应状态: {}", response.status());

        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::request_failed(self.endpoint.as_str(), e))?;

        let ack: SubmitAck =
            serde_json::from_str(&text).map_err(|e| SubmissionError::JsonFailed {
                source: Box::new(e),
            })?;

        if ack.ok {
            Ok(())
        } else {
            Err(SubmissionError::rejected(ack.error))
        }
    }
}
