//! 检测主流程与批量调度
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, warn};

use crate::block::BlockDetector;
use crate::extract::Extractor;
use crate::fetch::PageFetcher;
use crate::options::{DetectOptions, DetectStats};
use crate::rules::load_path_rules;
use crate::score::ScoreBoard;
use crate::types::{Detection, HeaderMap, UrlDetection, BLOCKED_NAME, UNKNOWN_NAME};
use crate::version::VersionResolver;

/// CMS 检测器：规则目录在构建时编译一次，之后每次调用相互独立、无共享可变状态
pub struct Detector {
    extractor: Extractor,
    block: BlockDetector,
    versions: VersionResolver,
    fetcher: PageFetcher,
    threads: Option<usize>,
}

impl Detector {
    /// 按选项构建检测器（编译内置目录与可选的附加规则文件）
    pub fn new(opts: &DetectOptions) -> Result<Self> {
        let extra_rules = match &opts.rules_path {
            Some(path) => load_path_rules(path)
                .with_context(|| format!("load extra rules from {}", path.display()))?,
            None => Vec::new(),
        };
        Ok(Self {
            extractor: Extractor::build(extra_rules).context("compile rule catalog")?,
            block: BlockDetector::new(opts.block_max_len, &opts.block_markers)?,
            versions: VersionResolver::build().context("compile version catalog")?,
            fetcher: PageFetcher::new(opts.timeout_secs, opts.max_body_size)?,
            threads: opts.threads,
        })
    }

    /// 纯内容检测（无 I/O）：提取信号 → 聚合得分 → 赢家版本提取。
    /// 任何输入（空串、乱码）都会返回一个完整的检测结果。
    pub fn detect_content(&self, html: &str, headers: &HeaderMap) -> Detection {
        let mut board = ScoreBoard::new();
        for signal in self.extractor.extract(html, headers) {
            board.add(&signal.name, signal.weight, &signal.reason);
        }

        match board.finish() {
            Some(mut winner) => {
                // 版本提取只对赢家执行；无命中时 version 保持缺省
                winner.version = self.versions.resolve(&winner.name, html);
                Detection::Resolved {
                    cms: winner.name,
                    confidence: winner.score,
                    reasons: winner.reasons,
                    version: winner.version,
                }
            }
            None => Detection::unknown(),
        }
    }

    /// 抓取并检测单个 URL：抓取 → 拦截判定（可短路）→ 内容检测。
    /// 抓取失败不向上抛错，降级为“加载失败”形态。
    pub fn detect_url(&self, url: &str) -> Detection {
        let page = match self.fetcher.fetch(url) {
            Ok(page) => page,
            Err(err) => {
                warn!(%url, error = %err, "fetch failed");
                return Detection::load_failure();
            }
        };

        if self.block.is_blocked(&page.body) {
            debug!(%url, "block heuristic tripped");
            return Detection::blocked();
        }

        let detection = self.detect_content(&page.body, &page.headers);
        debug!(%url, cms = detection.cms(), confidence = detection.confidence(), "detected");
        detection
    }

    /// 批量检测：输出顺序与输入一致，单条失败只降级该条目
    pub fn detect_batch(&self, urls: &[String]) -> Vec<UrlDetection> {
        self.batch_with(urls, |url| self.detect_url(url))
    }

    /// 批量检测并将结果以 JSON 数组流式写入 `out`
    /// 稳定性保证：无论完成顺序如何，result[i] 对应 input[i]。
    pub fn detect_batch_write(&self, urls: &[String], out: &mut dyn Write) -> Result<DetectStats> {
        let threads = self.threads.unwrap_or_else(num_cpus::get);
        if threads > 1 && urls.len() > 1 {
            return self.detect_batch_write_parallel(urls, out, threads);
        }

        // 串行路径
        let mut stats = DetectStats::default();
        write!(out, "[")?;
        let mut first = true;
        for url in urls {
            let entry = UrlDetection {
                url: url.clone(),
                detection: self.detect_url(url),
            };
            count_entry(&mut stats, &entry.detection);
            if !first {
                write!(out, ",")?;
            } else {
                first = false;
            }
            serde_json::to_writer(&mut *out, &entry)?;
        }
        write!(out, "]")?;
        Ok(stats)
    }

    /// 并行调度：
    /// - 作用域线程里建 Rayon 线程池并行抓取/检测
    /// - 单线程 Writer 按 idx 重排并流式写 JSON，保证输入顺序
    fn detect_batch_write_parallel(
        &self,
        urls: &[String],
        out: &mut dyn Write,
        threads: usize,
    ) -> Result<DetectStats> {
        use crossbeam_channel as channel;
        use rayon::prelude::*;
        use std::collections::BTreeMap;

        let mut stats = DetectStats::default();
        write!(out, "[")?;
        let mut first = true;

        // 通道用于 worker → writer 传递结果
        type Msg = (usize /*idx*/, UrlDetection);
        let (tx, rx) = channel::bounded::<Msg>(256);

        std::thread::scope(|scope| -> Result<()> {
            scope.spawn(move || {
                let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => pool,
                    Err(err) => {
                        warn!(error = %err, "rayon pool build failed, falling back to current thread");
                        // 退化为当前线程顺序执行
                        for (idx, url) in urls.iter().enumerate() {
                            let entry = UrlDetection {
                                url: url.clone(),
                                detection: self.detect_url(url),
                            };
                            let _ = tx.send((idx, entry));
                        }
                        return;
                    }
                };
                pool.install(|| {
                    urls.par_iter().enumerate().for_each(|(idx, url)| {
                        let entry = UrlDetection {
                            url: url.clone(),
                            detection: self.detect_url(url),
                        };
                        let _ = tx.send((idx, entry));
                    });
                });
                // 发送端在此全部丢弃，Writer 随之收到关闭信号
            });

            // Writer：维护 next_idx 与缓存，按序输出
            let mut next_idx: usize = 0;
            let mut buffer: BTreeMap<usize, UrlDetection> = BTreeMap::new();
            while let Ok((idx, entry)) = rx.recv() {
                buffer.insert(idx, entry);
                while let Some(entry) = buffer.remove(&next_idx) {
                    count_entry(&mut stats, &entry.detection);
                    if !first {
                        write!(out, ",")?;
                    } else {
                        first = false;
                    }
                    serde_json::to_writer(&mut *out, &entry)?;
                    next_idx += 1;
                }
            }
            Ok(())
        })?;

        write!(out, "]")?;
        Ok(stats)
    }

    /// 批量执行骨架：线程数>1 时用 Rayon 并行映射（collect 保序），否则串行
    fn batch_with<F>(&self, urls: &[String], run: F) -> Vec<UrlDetection>
    where
        F: Fn(&str) -> Detection + Sync,
    {
        let threads = self.threads.unwrap_or_else(num_cpus::get);
        let detections: Vec<Detection> = if threads > 1 && urls.len() > 1 {
            use rayon::prelude::*;
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| urls.par_iter().map(|u| run(u)).collect()),
                Err(_) => urls.iter().map(|u| run(u)).collect(),
            }
        } else {
            urls.iter().map(|u| run(u)).collect()
        };

        urls.iter()
            .zip(detections)
            .map(|(url, detection)| UrlDetection { url: url.clone(), detection })
            .collect()
    }
}

/// 按结果类别累加统计
fn count_entry(stats: &mut DetectStats, detection: &Detection) {
    stats.urls_total += 1;
    if detection.is_load_failure() {
        stats.fetch_failures += 1;
        return;
    }
    match detection.cms() {
        BLOCKED_NAME => stats.blocked += 1,
        UNKNOWN_NAME => stats.unknown += 1,
        _ => stats.identified += 1,
    }
}
