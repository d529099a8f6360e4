//! 反爬拦截页判定（信号提取前的短路预筛）
use anyhow::{Context, Result};
use regex::Regex;

/// 拦截判定器：短正文 + 关键词命中即判为拦截页
/// 这是刻意容忍误报的粗粒度开关：实践中包含这些词的短页面
/// 绝大多数是人机验证页而非正常内容。阈值与关键词均来自选项。
pub(crate) struct BlockDetector {
    max_len: usize,
    markers: Option<Regex>,
}

impl BlockDetector {
    pub(crate) fn new(max_len: usize, markers: &[String]) -> Result<Self> {
        // 空关键词列表等于关闭拦截判定
        if markers.is_empty() {
            return Ok(Self { max_len, markers: None });
        }
        // 关键词转义后拼为大小写不敏感的备选分支
        let alternation = markers
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let markers = Regex::new(&format!("(?i){alternation}"))
            .context("compile block marker pattern")?;
        Ok(Self { max_len, markers: Some(markers) })
    }

    /// 正文是否命中拦截启发式
    pub(crate) fn is_blocked(&self, body: &str) -> bool {
        match &self.markers {
            Some(markers) => body.len() < self.max_len && markers.is_match(body),
            None => false,
        }
    }
}
