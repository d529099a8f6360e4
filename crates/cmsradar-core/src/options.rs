//! 检测选项与统计信息（模块）
use std::path::PathBuf;

/// 拦截启发式的默认正文长度阈值（字节）
pub const DEFAULT_BLOCK_MAX_LEN: usize = 5000;

/// 拦截启发式的默认关键词列表（大小写不敏感匹配）
pub const DEFAULT_BLOCK_MARKERS: &[&str] =
    &["access denied", "blocked", "captcha", "challenge", "protection"];

/// 单次请求的默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// 检测选项
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// 单次 HTTP 请求超时（秒）；超时按“加载失败”处理，不作为独立错误类别
    pub timeout_secs: u64,
    /// 最大响应正文大小（字节）；超过则按加载失败处理
    pub max_body_size: Option<u64>,
    /// 拦截启发式：正文长度阈值（低于该值且命中关键词才判定为拦截页）
    pub block_max_len: usize,
    /// 拦截启发式：关键词列表（可调参数，误报/漏报均在预期内）
    pub block_markers: Vec<String>,
    /// 附加路径规则文件（TOML）；为空则只使用内置目录
    pub rules_path: Option<PathBuf>,
    /// 批量检测线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_size: None,
            block_max_len: DEFAULT_BLOCK_MAX_LEN,
            block_markers: DEFAULT_BLOCK_MARKERS.iter().map(|s| s.to_string()).collect(),
            rules_path: None,
            threads: None,
        }
    }
}

/// 批量检测统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone)]
pub struct DetectStats {
    pub urls_total: usize,
    pub identified: usize,
    pub unknown: usize,
    pub blocked: usize,
    pub fetch_failures: usize,
}
