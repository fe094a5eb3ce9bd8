//! 命令行入口

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

use xlsx_translator::env::{core::LogLevel, generate_env_docs, EnvVar};
use xlsx_translator::translation::{
    ConfigManager, PipelineFailure, ProgressReporter, ProgressStatus, TranslationConfig,
    TranslationResult, XlsxTranslationService,
};
use xlsx_translator::utils::{partial_output_path, translated_output_path};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// 配额耗尽时的退出码，与参数错误（2）区分
const EXIT_QUOTA_EXHAUSTED: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "xlsx-translate",
    version,
    about = "Translate Japanese text inside .xlsx workbooks"
)]
struct Args {
    /// Workbook to translate
    #[arg(required_unless_present_any = ["init_config", "env_docs"])]
    input: Option<PathBuf>,

    /// Output path (default: <input>_translated.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code
    #[arg(long)]
    source_lang: Option<String>,

    /// Target language code
    #[arg(short, long)]
    target_lang: Option<String>,

    /// Translation API endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// Translation API key
    #[arg(long)]
    api_key: Option<String>,

    /// Strings per request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seconds to wait between batches
    #[arg(long)]
    batch_delay: Option<u64>,

    /// Config file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write an example config file and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,

    /// Print supported environment variables and exit
    #[arg(long)]
    env_docs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error_message(&e.to_string());
            exit_code_for(e.as_ref())
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = LogLevel::get().unwrap_or_else(|_| "info".to_string());
            EnvFilter::new(format!("xlsx_translator={level},xlsx_translate={level}"))
        }),
        1 => EnvFilter::new("xlsx_translator=debug,xlsx_translate=debug"),
        _ => EnvFilter::new("xlsx_translator=trace,xlsx_translate=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.env_docs {
        print!("{}", generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &args.init_config {
        ConfigManager::generate_example_config(&path.to_string_lossy())?;
        print_info_message(&format!("已生成示例配置: {}", path.display()));
        return Ok(());
    }

    let Some(input_path) = args.input.clone() else {
        return Err("缺少输入文件".into());
    };

    let config = build_config(&args)?;
    let input = fs::read(&input_path)
        .map_err(|e| format!("无法读取 {}: {}", input_path.display(), e))?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| translated_output_path(&input_path));

    let service = XlsxTranslationService::from_config(config)?;

    let (progress, mut updates) = ProgressReporter::channel();
    let printer = tokio::spawn(async move {
        while let Some(state) = updates.recv().await {
            match state.status {
                ProgressStatus::Translating => eprintln!(
                    "[{}/{}] {}",
                    state.current_batch, state.total_batches, state.message
                ),
                ProgressStatus::Error => {}
                _ => eprintln!("{}", state.message),
            }
        }
    });

    let result = service.translate_package(&input, &progress).await;
    drop(progress);
    let _ = printer.await;

    match result {
        Ok(output) => {
            write_atomic(&output_path, &output.bytes)?;
            if output.orchestration.fallback_count > 0 {
                tracing::warn!(
                    "{} 条文本没有可用译文，已保留原文",
                    output.orchestration.fallback_count
                );
            }
            print_info_message(&format!(
                "已翻译 {} 条文本 -> {}",
                output.orchestration.translated_strings,
                output_path.display()
            ));
            Ok(())
        }
        Err(failure) => {
            if let Some(partial) = &failure.partial {
                let partial_path = partial_output_path(&input_path, args.output.as_deref());
                match write_atomic(&partial_path, partial) {
                    Ok(()) => print_info_message(&format!(
                        "已保存部分翻译结果 -> {}",
                        partial_path.display()
                    )),
                    Err(e) => tracing::warn!("部分翻译结果写入失败: {}", e),
                }
            }
            Err(Box::new(failure))
        }
    }
}

/// 配置文件和环境变量之上再叠加命令行参数
fn build_config(args: &Args) -> TranslationResult<TranslationConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(lang) = &args.source_lang {
        config.source_lang = lang.clone();
    }
    if let Some(lang) = &args.target_lang {
        config.target_lang = lang.clone();
    }
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(size) = args.batch_size {
        config.batch_size = size;
    }
    if let Some(delay) = args.batch_delay {
        config.batch_delay_secs = delay;
    }

    config.validate()?;
    Ok(config)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn exit_code_for(error: &(dyn Error + 'static)) -> ExitCode {
    match error.downcast_ref::<PipelineFailure>() {
        Some(failure) if failure.error.is_quota_exhausted() => {
            print_error_message(&failure.error.user_message());
            ExitCode::from(EXIT_QUOTA_EXHAUSTED)
        }
        _ => ExitCode::FAILURE,
    }
}

fn print_error_message(msg: &str) {
    eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
}

fn print_info_message(msg: &str) {
    println!("{msg}");
}
