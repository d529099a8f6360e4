//! 得分聚合与赢家选取
use std::collections::HashMap;

/// 单个平台的累计记录（一次检测调用内有效；对外形态是 `Detection`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub(crate) name: String,
    pub(crate) score: u32,
    pub(crate) reasons: Vec<String>,
    pub(crate) version: Option<String>,
}

/// 最终置信度上限：累计得分只封顶，绝不回绕或取平均
pub(crate) const SCORE_CAP: u32 = 100;

/// 得分板：名称作为键的就地累加容器
/// - 同名信号累加到同一 Candidate（绝不追加重复条目）；
/// - `order` 记录首次注册顺序，用于平分时的确定性裁决；
/// - reasons 按发现顺序追加，允许重复，不做去重。
#[derive(Debug, Default)]
pub(crate) struct ScoreBoard {
    index: HashMap<String, usize>,
    order: Vec<Candidate>,
}

impl ScoreBoard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 记录一个信号：查找或创建对应 Candidate，累加权重并追加原因
    pub(crate) fn add(&mut self, name: &str, weight: u32, reason: &str) {
        match self.index.get(name) {
            Some(&i) => {
                let c = &mut self.order[i];
                c.score = c.score.saturating_add(weight);
                c.reasons.push(reason.to_string());
            }
            None => {
                self.index.insert(name.to_string(), self.order.len());
                self.order.push(Candidate {
                    name: name.to_string(),
                    score: weight,
                    reasons: vec![reason.to_string()],
                    version: None,
                });
            }
        }
    }

    /// 封顶并选出赢家；无任何候选时返回 None。
    /// 平分裁决：先注册者胜（严格大于才替换，按注册顺序扫描）。
    pub(crate) fn finish(mut self) -> Option<Candidate> {
        for c in &mut self.order {
            c.score = c.score.min(SCORE_CAP);
        }

        let mut winner: Option<usize> = None;
        for (i, c) in self.order.iter().enumerate() {
            match winner {
                Some(w) if self.order[w].score >= c.score => {}
                _ => winner = Some(i),
            }
        }
        winner.map(|i| self.order.swap_remove(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_place_per_name() {
        let mut board = ScoreBoard::new();
        board.add("WordPress", 80, "Generator-Tag");
        board.add("WordPress", 50, "x-powered-by Header");
        board.add("Shopify", 20, "Server Header Hinweis");

        let winner = board.finish().unwrap();
        assert_eq!(winner.name, "WordPress");
        assert_eq!(winner.score, 100);
        assert_eq!(winner.reasons, vec!["Generator-Tag", "x-powered-by Header"]);
    }

    #[test]
    fn score_is_capped_never_wrapped() {
        let mut board = ScoreBoard::new();
        for _ in 0..10 {
            board.add("WordPress", 80, "WordPress-path found");
        }
        let winner = board.finish().unwrap();
        assert_eq!(winner.score, 100);
        // 原因不去重：十次命中十条原因
        assert_eq!(winner.reasons.len(), 10);
    }

    #[test]
    fn tie_goes_to_first_registered_name() {
        let mut board = ScoreBoard::new();
        board.add("Joomla", 70, "Joomla-path found");
        board.add("Drupal", 70, "Drupal settings found");
        let winner = board.finish().unwrap();
        assert_eq!(winner.name, "Joomla");
    }

    #[test]
    fn empty_board_yields_no_winner() {
        assert!(ScoreBoard::new().finish().is_none());
    }

    #[test]
    fn duplicate_reasons_are_preserved_in_order() {
        let mut board = ScoreBoard::new();
        board.add("Ghost", 10, "a");
        board.add("Ghost", 10, "b");
        board.add("Ghost", 10, "a");
        let winner = board.finish().unwrap();
        assert_eq!(winner.reasons, vec!["a", "b", "a"]);
    }
}
