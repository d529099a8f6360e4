//! 页面抓取（阻塞式 HTTP GET，浏览器化请求画像）
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap as ReqHeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use std::time::Duration;
use thiserror::Error;

use crate::types::HeaderMap;

/// 固定请求画像（单次 GET，不重试；重定向沿用客户端默认策略）
/// Accept-Encoding（gzip, deflate, br）由客户端压缩特性自动协商并解压。
const PROFILE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const PROFILE_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const PROFILE_ACCEPT_LANGUAGE: &str = "de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7";
const PROFILE_CACHE_CONTROL: &str = "no-cache";

/// 抓取阶段的内部错误；绝不越过检测 API 边界
/// （调用方统一降级为“加载失败”形态的检测结果）。
#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response body exceeds limit of {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

/// 抓取到的页面：正文文本 + 响应头
pub(crate) struct FetchedPage {
    pub(crate) body: String,
    pub(crate) headers: HeaderMap,
}

/// 页面抓取器（与打分逻辑隔离，便于离线测试打分管线）
pub(crate) struct PageFetcher {
    client: Client,
    max_body_size: Option<u64>,
}

impl PageFetcher {
    pub(crate) fn new(timeout_secs: u64, max_body_size: Option<u64>) -> Result<Self> {
        let mut profile = ReqHeaderMap::new();
        profile.insert(USER_AGENT, HeaderValue::from_static(PROFILE_USER_AGENT));
        profile.insert(ACCEPT, HeaderValue::from_static(PROFILE_ACCEPT));
        profile.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(PROFILE_ACCEPT_LANGUAGE));
        profile.insert(CACHE_CONTROL, HeaderValue::from_static(PROFILE_CACHE_CONTROL));

        let client = Client::builder()
            .default_headers(profile)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("build http client")?;

        Ok(Self { client, max_body_size })
    }

    /// 单次 GET；任何网络/协议/超时问题都以 FetchError 返回
    pub(crate) fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send()?;

        // 声明长度超限的响应直接放弃，不读正文
        if let (Some(limit), Some(len)) = (self.max_body_size, response.content_length()) {
            if len > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
        }

        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            headers.insert(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        let body = response.text()?;
        if let Some(limit) = self.max_body_size {
            if body.len() as u64 > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
        }

        Ok(FetchedPage { body, headers })
    }
}
