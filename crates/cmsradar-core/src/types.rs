//! 公共类型（对外暴露）
use serde::Serialize;
use std::collections::HashMap;

/// 未命中/加载失败时的占位名称
pub const UNKNOWN_NAME: &str = "Unknown";
/// 判定为反爬拦截页时的占位名称
pub const BLOCKED_NAME: &str = "Blocked";
/// 无任何信号命中时的固定原因
pub const NO_INDICATORS_REASON: &str = "No CMS indicators found";
/// URL 加载失败时的固定原因（单数 reason 形态，见 `Detection::LoadFailure`）
pub const LOAD_FAILURE_REASON: &str = "URL could not be loaded";
/// 拦截判定的两条固定原因
pub const BLOCKED_REASONS: [&str; 2] = [
    "Access appears to be blocked by bot protection",
    "Short challenge page returned instead of regular content",
];

/// 大小写不敏感的响应头映射
/// - 键在写入时统一转为小写
/// - 读取不存在的键返回空字符串，绝不报错
#[derive(Debug, Default, Clone)]
pub struct HeaderMap {
    inner: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.inner.insert(name.to_ascii_lowercase(), value.into());
    }

    /// 读取头部值；缺失按空字符串处理
    pub fn get(&self, name: &str) -> &str {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (n, v) in iter {
            map.insert(&n.into(), v);
        }
        map
    }
}

/// 单次检测结果（序列化后对应两种对外形态）
/// - `Resolved`：正常判定（含 Unknown/Blocked 哨兵），复数 `reasons`
/// - `LoadFailure`：仅用于 URL 加载失败路径，单数 `reason`（对外边界刻意保留的形态差异）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Detection {
    Resolved {
        cms: String,
        confidence: u32,
        reasons: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
    LoadFailure {
        cms: String,
        confidence: u32,
        reason: String,
    },
}

impl Detection {
    /// 无信号命中
    pub fn unknown() -> Self {
        Detection::Resolved {
            cms: UNKNOWN_NAME.to_string(),
            confidence: 0,
            reasons: vec![NO_INDICATORS_REASON.to_string()],
            version: None,
        }
    }

    /// 命中拦截启发式（置信度 0，两条固定原因）
    pub fn blocked() -> Self {
        Detection::Resolved {
            cms: BLOCKED_NAME.to_string(),
            confidence: 0,
            reasons: BLOCKED_REASONS.iter().map(|s| s.to_string()).collect(),
            version: None,
        }
    }

    /// URL 加载失败（网络/协议/超时等一律归入此类）
    pub fn load_failure() -> Self {
        Detection::LoadFailure {
            cms: UNKNOWN_NAME.to_string(),
            confidence: 0,
            reason: LOAD_FAILURE_REASON.to_string(),
        }
    }

    /// 对外展示的平台名称
    pub fn cms(&self) -> &str {
        match self {
            Detection::Resolved { cms, .. } => cms,
            Detection::LoadFailure { cms, .. } => cms,
        }
    }

    /// 置信度（0..=100）
    pub fn confidence(&self) -> u32 {
        match self {
            Detection::Resolved { confidence, .. } => *confidence,
            Detection::LoadFailure { confidence, .. } => *confidence,
        }
    }

    /// 提取到的版本号（仅 `Resolved` 赢家可能携带）
    pub fn version(&self) -> Option<&str> {
        match self {
            Detection::Resolved { version, .. } => version.as_deref(),
            Detection::LoadFailure { .. } => None,
        }
    }

    pub fn is_load_failure(&self) -> bool {
        matches!(self, Detection::LoadFailure { .. })
    }
}

/// 批量检测的单条输出：在检测结果旁附带来源 URL
#[derive(Debug, Clone, Serialize)]
pub struct UrlDetection {
    pub url: String,
    #[serde(flatten)]
    pub detection: Detection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Powered-By", "WordPress");
        assert_eq!(headers.get("x-powered-by"), "WordPress");
        assert_eq!(headers.get("X-POWERED-BY"), "WordPress");
    }

    #[test]
    fn header_map_missing_key_reads_empty() {
        let headers = HeaderMap::new();
        assert_eq!(headers.get("server"), "");
    }

    #[test]
    fn load_failure_serializes_with_singular_reason() {
        let json = serde_json::to_value(Detection::load_failure()).unwrap();
        assert_eq!(json["cms"], "Unknown");
        assert_eq!(json["confidence"], 0);
        assert_eq!(json["reason"], LOAD_FAILURE_REASON);
        assert!(json.get("reasons").is_none());
    }

    #[test]
    fn unknown_serializes_with_plural_reasons() {
        let json = serde_json::to_value(Detection::unknown()).unwrap();
        assert_eq!(json["reasons"][0], NO_INDICATORS_REASON);
        assert!(json.get("reason").is_none());
        assert!(json.get("version").is_none());
    }

    #[test]
    fn blocked_carries_exactly_two_fixed_reasons() {
        let json = serde_json::to_value(Detection::blocked()).unwrap();
        assert_eq!(json["cms"], "Blocked");
        assert_eq!(json["confidence"], 0);
        assert_eq!(json["reasons"].as_array().unwrap().len(), 2);
        assert_eq!(json["reasons"][0], BLOCKED_REASONS[0]);
        assert_eq!(json["reasons"][1], BLOCKED_REASONS[1]);
    }

    #[test]
    fn url_detection_flattens_result_next_to_url() {
        let entry = UrlDetection {
            url: "https://example.com".to_string(),
            detection: Detection::unknown(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["cms"], "Unknown");
    }
}
