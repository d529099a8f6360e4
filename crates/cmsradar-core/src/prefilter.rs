//! 路径规则预筛（Aho-Corasick 锚点）
//!
//! 设计目标：
//! - 从每条路径规则的正则中抽取“锚点”字面量，构建全局 AC 自动机（ASCII 大小写不敏感）。
//! - 检测时先用 AC 在页面上找锚点，只对命中锚点的规则运行精准正则。
//! - 抽不出可靠锚点的规则进入 `unanchored` 列表，始终运行，保证与全量匹配行为等价。

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use anyhow::Result;
use std::collections::HashMap;

/// 预筛计划（线程安全，可跨线程共享）
pub(crate) struct PrefilterPlan {
    /// 全局锚点自动机（按 anchors 的顺序构建）
    ac: AhoCorasick,
    /// 锚点索引 -> 规则索引列表
    anchor_to_rules: Vec<Vec<usize>>,
    /// 无锚点规则索引（每次都运行）
    unanchored: Vec<usize>,
}

impl PrefilterPlan {
    /// 从规则模式列表构建预筛计划
    pub(crate) fn build(patterns: &[&str]) -> Result<Self> {
        let mut anchors: Vec<String> = Vec::new();
        let mut anchor_index: HashMap<String, usize> = HashMap::new();
        let mut anchor_to_rules: Vec<Vec<usize>> = Vec::new();
        let mut unanchored: Vec<usize> = Vec::new();

        for (rule_idx, pat) in patterns.iter().enumerate() {
            // 按顶层分支拆分：任一分支命中即可触发规则，
            // 因此每个分支都必须贡献一个锚点，否则规则整体视为无锚点。
            let mut branch_anchors: Vec<String> = Vec::new();
            let mut all_branches_anchored = true;
            for branch in pat.split('|') {
                match longest_literal(branch) {
                    Some(lit) => branch_anchors.push(lit),
                    None => {
                        all_branches_anchored = false;
                        break;
                    }
                }
            }

            if !all_branches_anchored {
                unanchored.push(rule_idx);
                continue;
            }

            for lit in branch_anchors {
                let id = match anchor_index.get(&lit) {
                    Some(id) => *id,
                    None => {
                        let id = anchors.len();
                        anchors.push(lit.clone());
                        anchor_index.insert(lit, id);
                        anchor_to_rules.push(Vec::new());
                        id
                    }
                };
                if !anchor_to_rules[id].contains(&rule_idx) {
                    anchor_to_rules[id].push(rule_idx);
                }
            }
        }

        let ac = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&anchors)?;

        Ok(Self { ac, anchor_to_rules, unanchored })
    }

    /// 返回需要在该页面上运行的规则索引（升序、去重）
    pub(crate) fn candidate_rules(&self, html: &str) -> Vec<usize> {
        let mut out: Vec<usize> = self.unanchored.clone();
        for m in self.ac.find_iter(html) {
            if let Some(rules) = self.anchor_to_rules.get(m.pattern().as_usize()) {
                out.extend_from_slice(rules);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// 从正则分支中提取最长的连续字面量片段（长度≥3）
/// - 允许的字面量字符：字母数字与 `-` `_` `.` `/` `=`；
/// - `\.`、`\/`、`\?` 还原为对应字符；其他转义与元字符视为断点；
/// - `*`、`?`、`{` 会让前一个字符变为可选，该字符不得留在锚点里。
fn longest_literal(branch: &str) -> Option<String> {
    let is_meta = |ch: char| matches!(ch, '[' | ']' | '{' | '}' | '(' | ')' | '?' | '*' | '+' | '|' | '^' | '$');
    let allow = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | '=');

    let mut best: Option<String> = None;
    let mut cur = String::new();
    let flush = |cur: &mut String, best: &mut Option<String>| {
        if cur.len() >= 3 && best.as_ref().map_or(true, |b| cur.len() > b.len()) {
            *best = Some(cur.clone());
        }
        cur.clear();
    };

    let mut chars = branch.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                // 转义的普通标点还原为字面量
                Some(next) if matches!(next, '.' | '/' | '?' | '!') => cur.push(next),
                // 字符类转义（\d、\w 等）是断点
                _ => flush(&mut cur, &mut best),
            }
            continue;
        }
        if is_meta(ch) {
            // 可选量词作用于前一个字符：匹配文本里未必出现，须从锚点去掉
            if matches!(ch, '*' | '?' | '{') {
                cur.pop();
            }
            flush(&mut cur, &mut best);
            continue;
        }
        if allow(ch) {
            cur.push(ch);
        } else {
            flush(&mut cur, &mut best);
        }
    }
    flush(&mut cur, &mut best);
    best
}
