use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmsradar_core::{DetectOptions, Detector};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "cmsradar", version, about = "CMS 指纹识别（标记 + 响应头启发式）")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检测单个 URL 并将结果 JSON 打印到标准输出
    Url {
        /// 目标 URL
        url: String,

        /// 单次请求超时（秒）
        #[arg(long, default_value_t = cmsradar_core::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// 附加路径规则文件（TOML）
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// 批量检测 URL 列表并生成 result.json
    Batch {
        /// 输入文件：每行一个或逗号分隔的 URL 列表（CSV 亦可）
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组，顺序与输入一致）
        #[arg(long, default_value = "./result.json")]
        output: PathBuf,

        /// 线程数（"auto"=CPU 核心数；1 走串行）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 单次请求超时（秒）
        #[arg(long, default_value_t = cmsradar_core::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// 最大响应正文大小（单位字节，例如 5242880 代表 5MB）
        #[arg(long)]
        max_body_size: Option<u64>,

        /// 附加路径规则文件（TOML）
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Url { url, timeout, rules } => {
            let opts = DetectOptions {
                timeout_secs: timeout,
                rules_path: rules,
                ..DetectOptions::default()
            };
            let detector = Detector::new(&opts).context("build detector")?;
            let result = detector.detect_url(&url);
            serde_json::to_writer_pretty(std::io::stdout().lock(), &result)?;
            println!();
        }
        Commands::Batch { input, output, threads, timeout, max_body_size, rules } => {
            info!(?input, ?output, "starting batch detection");

            let list = std::fs::read_to_string(&input).context("read input file")?;
            let urls = parse_url_list(&list);

            let opts = DetectOptions {
                timeout_secs: timeout,
                max_body_size,
                rules_path: rules,
                threads: parse_threads(&threads),
                ..DetectOptions::default()
            };
            let detector = Detector::new(&opts).context("build detector")?;

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);
            let stats = detector
                .detect_batch_write(&urls, &mut out)
                .context("batch detection failed")?;
            out.flush().ok();

            info!(
                urls_total = stats.urls_total,
                identified = stats.identified,
                unknown = stats.unknown,
                blocked = stats.blocked,
                fetch_failures = stats.fetch_failures,
                "batch finished"
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析 URL 列表：先按换行拆分，再按逗号拆分每行，去除空白并丢弃空项
fn parse_url_list(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for line in text.lines() {
        for url in line.split(',') {
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    urls
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_threads, parse_url_list};

    #[test]
    fn url_list_splits_lines_and_commas() {
        let text = "https://a.example\nhttps://b.example, https://c.example\r\n ,https://d.example\n\n";
        let urls = parse_url_list(text);
        assert_eq!(
            urls,
            vec![
                "https://a.example",
                "https://b.example",
                "https://c.example",
                "https://d.example",
            ]
        );
    }

    #[test]
    fn threads_auto_means_none() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("bogus"), None);
    }
}
