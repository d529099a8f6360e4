//! CMS 指纹识别核心库
//!
//! 设计要点：
//! - 仅基于页面标记与响应头做启发式判定：不执行 JS、不渲染、不越过单页抓取。
//! - 规则目录（generator 关键词、头部信号、路径模式、版本模式）全部是纯数据表，
//!   匹配逻辑统一迭代执行，便于扩展与单独测试。
//! - 单次调用自建候选集合，无跨调用共享可变状态，并发调用天然安全。
//! - 引擎没有致命错误类别：抓取失败、拦截页、无信号都是普通的类型化结果。

mod block;
mod catalog;
mod detect;
mod extract;
mod fetch;
mod options;
mod prefilter;
mod rules;
mod score;
mod types;
mod version;

pub use catalog::PathRule;
pub use detect::Detector;
pub use options::{DetectOptions, DetectStats, DEFAULT_BLOCK_MARKERS, DEFAULT_BLOCK_MAX_LEN, DEFAULT_TIMEOUT_SECS};
pub use types::{Detection, HeaderMap, UrlDetection};
