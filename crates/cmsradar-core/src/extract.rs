//! 信号提取器（四个阶段，全部运行，不短路）
//!
//! 无状态函数：`(html, headers) → Vec<Signal>`。规则目录在构建时
//! 一次性编译为正则集合，检测调用只做匹配。

use anyhow::{Context, Result};
use regex::Regex;

use crate::catalog::{
    self, PathRule, GENERATOR_KEYWORDS, GENERATOR_REASON, GENERATOR_WEIGHT, JS_FALLBACK_RULES,
    JS_FALLBACK_WEIGHT, SERVER_NEEDLES, SERVER_REASON, SERVER_TARGET, SERVER_WEIGHT,
    X_GENERATOR_REASON, X_GENERATOR_SIGNALS, X_GENERATOR_WEIGHT, X_POWERED_BY_REASON,
    X_POWERED_BY_SIGNALS, X_POWERED_BY_WEIGHT,
};
use crate::prefilter::PrefilterPlan;
use crate::types::HeaderMap;

/// 单条观察信号：(平台名, 权重, 原因)
#[derive(Debug, Clone)]
pub(crate) struct Signal {
    pub(crate) name: String,
    pub(crate) weight: u32,
    pub(crate) reason: String,
}

/// 编译后的路径规则
struct CompiledPathRule {
    rule: PathRule,
    regex: Regex,
}

/// 编译后的提取器集合
pub(crate) struct Extractor {
    /// generator meta 标签的两种属性顺序（name 在前 / content 在前）
    generator_name_first: Regex,
    generator_content_first: Regex,
    path_rules: Vec<CompiledPathRule>,
    prefilter: PrefilterPlan,
    js_rules: Vec<(Regex, &'static str, &'static str)>,
}

impl Extractor {
    /// 从内置目录（加可选的附加规则）构建提取器
    pub(crate) fn build(extra_rules: Vec<PathRule>) -> Result<Self> {
        let generator_name_first = Regex::new(
            r#"(?i)<meta[^>]*\bname\s*=\s*["']generator["'][^>]*\bcontent\s*=\s*["']([^"']*)"#,
        )
        .context("compile generator pattern (name first)")?;
        let generator_content_first = Regex::new(
            r#"(?i)<meta[^>]*\bcontent\s*=\s*["']([^"']*)["'][^>]*\bname\s*=\s*["']generator["']"#,
        )
        .context("compile generator pattern (content first)")?;

        // 内置目录在前、附加规则在后：顺序决定 reasons 排列，不影响得分
        let mut path_rules: Vec<CompiledPathRule> = Vec::new();
        for (cms, pattern, weight, reason) in catalog::PATH_RULES {
            path_rules.push(compile_path_rule(PathRule {
                cms: cms.to_string(),
                pattern: pattern.to_string(),
                weight: *weight,
                reason: reason.to_string(),
            })?);
        }
        for rule in extra_rules {
            path_rules.push(compile_path_rule(rule)?);
        }

        let patterns: Vec<&str> = path_rules.iter().map(|r| r.rule.pattern.as_str()).collect();
        let prefilter = PrefilterPlan::build(&patterns)?;

        let mut js_rules = Vec::new();
        for (pattern, name, reason) in JS_FALLBACK_RULES {
            let regex = Regex::new(pattern)
                .with_context(|| format!("compile js fallback pattern `{pattern}`"))?;
            js_rules.push((regex, *name, *reason));
        }

        Ok(Self {
            generator_name_first,
            generator_content_first,
            path_rules,
            prefilter,
            js_rules,
        })
    }

    /// 提取所有信号。四个阶段相互独立、全部执行：
    /// 1. generator meta 标签；2. 响应头；3. 路径/资源目录；4. JS 框架兜底。
    pub(crate) fn extract(&self, html: &str, headers: &HeaderMap) -> Vec<Signal> {
        let mut signals = Vec::new();

        // 1) generator meta 标签（两种属性顺序；content 小写后做包含判断）
        let generator = self
            .generator_name_first
            .captures(html)
            .or_else(|| self.generator_content_first.captures(html))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());
        if let Some(content) = generator {
            for (keyword, name) in GENERATOR_KEYWORDS {
                if content.contains(keyword) {
                    signals.push(Signal {
                        name: name.to_string(),
                        weight: GENERATOR_WEIGHT,
                        reason: GENERATOR_REASON.to_string(),
                    });
                }
            }
        }

        // 2) 响应头（缺失的头按空字符串处理，匹配自然落空）
        let powered_by = headers.get("x-powered-by").to_ascii_lowercase();
        for (needle, name) in X_POWERED_BY_SIGNALS {
            if powered_by.contains(needle) {
                signals.push(Signal {
                    name: name.to_string(),
                    weight: X_POWERED_BY_WEIGHT,
                    reason: X_POWERED_BY_REASON.to_string(),
                });
            }
        }

        let server = headers.get("server").to_ascii_lowercase();
        if SERVER_NEEDLES.iter().any(|n| server.contains(n)) {
            signals.push(Signal {
                name: SERVER_TARGET.to_string(),
                weight: SERVER_WEIGHT,
                reason: SERVER_REASON.to_string(),
            });
        }

        let x_generator = headers.get("x-generator").to_ascii_lowercase();
        for (needle, name) in X_GENERATOR_SIGNALS {
            if x_generator.contains(needle) {
                signals.push(Signal {
                    name: name.to_string(),
                    weight: X_GENERATOR_WEIGHT,
                    reason: X_GENERATOR_REASON.to_string(),
                });
            }
        }

        // 3) 路径/资源目录（预筛选出候选规则；存在性判定，单条规则至多命中一次）
        for idx in self.prefilter.candidate_rules(html) {
            let compiled = &self.path_rules[idx];
            if compiled.regex.is_match(html) {
                signals.push(Signal {
                    name: compiled.rule.cms.clone(),
                    weight: compiled.rule.weight,
                    reason: compiled.rule.reason.clone(),
                });
            }
        }

        // 4) JS 框架兜底（低权重，标注为非传统 CMS）
        for (regex, name, reason) in &self.js_rules {
            if regex.is_match(html) {
                signals.push(Signal {
                    name: name.to_string(),
                    weight: JS_FALLBACK_WEIGHT,
                    reason: reason.to_string(),
                });
            }
        }

        signals
    }
}

fn compile_path_rule(rule: PathRule) -> Result<CompiledPathRule> {
    let regex = Regex::new(&format!("(?i){}", rule.pattern))
        .with_context(|| format!("compile path rule `{}` for {}", rule.pattern, rule.cms))?;
    Ok(CompiledPathRule { rule, regex })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::build(Vec::new()).unwrap()
    }

    fn names(signals: &[Signal]) -> Vec<&str> {
        signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn generator_tag_name_before_content() {
        let html = r#"<meta name="generator" content="WordPress 6.4.2">"#;
        let signals = extractor().extract(html, &HeaderMap::new());
        assert!(names(&signals).contains(&"WordPress"));
    }

    #[test]
    fn generator_tag_content_before_name() {
        let html = r#"<meta content="Ghost 5.0" name="generator">"#;
        let signals = extractor().extract(html, &HeaderMap::new());
        assert!(names(&signals).contains(&"Ghost"));
    }

    #[test]
    fn generator_tag_is_case_insensitive() {
        let html = r#"<META NAME="GENERATOR" CONTENT="Joomla! 4.3">"#;
        let signals = extractor().extract(html, &HeaderMap::new());
        assert!(names(&signals).contains(&"Joomla"));
    }

    #[test]
    fn path_rule_fires_once_regardless_of_occurrences() {
        let html = "/wp-content/a.js /wp-content/b.js /wp-includes/c.js";
        let signals = extractor().extract(html, &HeaderMap::new());
        let wp: Vec<_> = signals.iter().filter(|s| s.name == "WordPress").collect();
        assert_eq!(wp.len(), 1);
        assert_eq!(wp[0].reason, "WordPress-path found");
        assert_eq!(wp[0].weight, 80);
    }

    #[test]
    fn header_signals_are_case_insensitive_on_value() {
        let headers: HeaderMap = [("x-powered-by", "Shopify")].into_iter().collect();
        let signals = extractor().extract("", &headers);
        assert_eq!(names(&signals), vec!["Shopify"]);
        assert_eq!(signals[0].weight, 50);
    }

    #[test]
    fn server_header_emits_single_weak_shopify_hint() {
        let headers: HeaderMap = [("server", "cloudflare; shopify-edge")].into_iter().collect();
        let signals = extractor().extract("", &headers);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].name, "Shopify");
        assert_eq!(signals[0].weight, 20);
    }

    #[test]
    fn x_generator_header_maps_to_drupal() {
        let headers: HeaderMap = [("X-Generator", "Drupal 10 (https://www.drupal.org)")]
            .into_iter()
            .collect();
        let signals = extractor().extract("", &headers);
        assert_eq!(names(&signals), vec!["Drupal"]);
        assert_eq!(signals[0].weight, 70);
    }

    #[test]
    fn js_fallback_detects_hydration_payload() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#;
        let signals = extractor().extract(html, &HeaderMap::new());
        assert_eq!(names(&signals), vec!["Next.js (not a traditional CMS)"]);
        assert_eq!(signals[0].weight, 30);
    }

    #[test]
    fn all_stages_run_without_short_circuit() {
        let html = r#"
            <meta name="generator" content="WordPress 6.0">
            <script src="/wp-content/t.js"></script>
            <script id="__NEXT_DATA__">{}</script>
        "#;
        // "wp" 需要作为子串出现在头部值里才算命中
        let headers: HeaderMap = [("x-powered-by", "PHP/8.1; wp-engine")].into_iter().collect();
        let signals = extractor().extract(html, &headers);
        // generator + header + path + js 兜底，四个阶段都有产出
        let reasons: Vec<&str> = signals.iter().map(|s| s.reason.as_str()).collect();
        assert!(reasons.contains(&"Generator-Tag"));
        assert!(reasons.contains(&"x-powered-by Header"));
        assert!(reasons.contains(&"WordPress-path found"));
        assert!(reasons.contains(&"Next.js JSON Payload"));
    }

    #[test]
    fn garbage_input_yields_no_signals() {
        let signals = extractor().extract("\u{0}\u{1}\u{2} ?? >>>", &HeaderMap::new());
        assert!(signals.is_empty());
    }

    #[test]
    fn extra_rule_with_optional_quantifier_still_fires() {
        // 量词让部分字面量变为可选时，预筛不得吞掉该规则的命中
        let extra = vec![PathRule {
            cms: "Typo".to_string(),
            pattern: "typo3?temp".to_string(),
            weight: 60,
            reason: "Typo-path found".to_string(),
        }];
        let ex = Extractor::build(extra).unwrap();
        let signals = ex.extract("<link href=\"/typotemp/a.css\">", &HeaderMap::new());
        assert_eq!(names(&signals), vec!["Typo"]);
    }

    #[test]
    fn extra_rules_are_appended_after_builtins() {
        let extra = vec![PathRule {
            cms: "Hugo".to_string(),
            pattern: "hugo-generator".to_string(),
            weight: 60,
            reason: "Hugo-path found".to_string(),
        }];
        let ex = Extractor::build(extra).unwrap();
        let html = "/wp-content/x.js hugo-generator";
        let signals = ex.extract(html, &HeaderMap::new());
        assert_eq!(names(&signals), vec!["WordPress", "Hugo"]);
    }
}
