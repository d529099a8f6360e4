//! 版本提取（仅对赢家运行）
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;

use crate::catalog::VERSION_RULES;

/// 版本解析器：按平台名保存有序模式列表，首个命中即胜出
pub(crate) struct VersionResolver {
    rules: HashMap<&'static str, Vec<Regex>>,
}

impl VersionResolver {
    pub(crate) fn build() -> Result<Self> {
        let mut rules = HashMap::new();
        for (cms, patterns) in VERSION_RULES {
            let mut compiled = Vec::with_capacity(patterns.len());
            for pattern in *patterns {
                compiled.push(
                    Regex::new(pattern)
                        .with_context(|| format!("compile version pattern `{pattern}` for {cms}"))?,
                );
            }
            rules.insert(*cms, compiled);
        }
        Ok(Self { rules })
    }

    /// 对赢家平台尝试版本提取；无命中返回 None（缺失不是错误）
    pub(crate) fn resolve(&self, cms: &str, html: &str) -> Option<String> {
        let patterns = self.rules.get(cms)?;
        for regex in patterns {
            if let Some(caps) = regex.captures(html) {
                if let Some(version) = caps.get(1) {
                    return Some(version.as_str().to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> VersionResolver {
        VersionResolver::build().unwrap()
    }

    #[test]
    fn wordpress_version_from_generator_suffix() {
        let html = r#"<meta name="generator" content="WordPress 6.4.2">"#;
        assert_eq!(resolver().resolve("WordPress", html).as_deref(), Some("6.4.2"));
    }

    #[test]
    fn wordpress_version_falls_back_to_asset_query() {
        let html = r#"<link href="/wp-content/themes/a/style.css?ver=6.1.1">"#;
        assert_eq!(resolver().resolve("WordPress", html).as_deref(), Some("6.1.1"));
    }

    #[test]
    fn drupal_version_ignores_trailing_project_url() {
        let html = r#"<meta name="generator" content="Drupal 10 (https://www.drupal.org)">"#;
        assert_eq!(resolver().resolve("Drupal", html).as_deref(), Some("10"));
    }

    #[test]
    fn ghost_version_with_reversed_attribute_order() {
        let html = r#"<meta content="Ghost 5.0" name="generator">"#;
        assert_eq!(resolver().resolve("Ghost", html).as_deref(), Some("5.0"));
    }

    #[test]
    fn shopify_version_from_embedded_json_field() {
        let html = r#"<script>Shopify.theme = {"name":"Dawn","theme_version":"12.0.0"};</script>"#;
        assert_eq!(resolver().resolve("Shopify", html).as_deref(), Some("12.0.0"));
    }

    #[test]
    fn unknown_cms_or_no_match_yields_none() {
        assert_eq!(resolver().resolve("Wix", "anything"), None);
        assert_eq!(resolver().resolve("WordPress", "<html></html>"), None);
    }

    #[test]
    fn first_matching_pattern_wins() {
        // generator 后缀与 ?ver= 同时存在时，取模式列表里靠前的 generator 后缀
        let html = r#"<meta name="generator" content="WordPress 6.4.2">
                      <link href="/style.css?ver=1.0.0">"#;
        assert_eq!(resolver().resolve("WordPress", html).as_deref(), Some("6.4.2"));
    }
}
