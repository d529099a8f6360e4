//! 附加规则文件加载（TOML）
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::catalog::PathRule;

/// 单条规则的配置（支持 pattern 或 regex 字段）
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    pub cms: String,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Deserialize)]
struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// 附加规则的默认权重（与内置目录的中档权重一致）
const DEFAULT_EXTRA_WEIGHT: u32 = 70;

/// 从 TOML 规则文件加载并归一化为 PathRule 列表（追加在内置目录之后）
pub(crate) fn load_path_rules(path: &Path) -> Result<Vec<PathRule>> {
    let txt = std::fs::read_to_string(path)?;
    parse_path_rules(&txt)
}

fn parse_path_rules(txt: &str) -> Result<Vec<PathRule>> {
    let parsed: RuleFile = toml::from_str(txt)?;
    let mut out = Vec::new();

    for e in parsed.rules {
        // 兼容两种字段名：pattern 或 regex
        let pattern = match (e.pattern, e.regex) {
            (Some(p), _) => p,
            (None, Some(r)) => r,
            _ => continue,
        };
        let reason = e
            .reason
            .unwrap_or_else(|| format!("{}-path found", e.cms));
        out.push(PathRule {
            cms: e.cms,
            pattern,
            weight: e.weight.unwrap_or(DEFAULT_EXTRA_WEIGHT),
            reason,
        });
    }

    Ok(out)
}
