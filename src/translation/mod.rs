//! 翻译模块
//!
//! - **core**: 翻译服务、重试策略、进度报告和失败恢复
//! - **client**: 翻译服务客户端
//! - **pipeline**: 文本处理管道（提取、过滤、批次、回填）
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use xlsx_translator::translation::{load_translation_config, ProgressReporter, XlsxTranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_translation_config("en", None);
//! let service = XlsxTranslationService::from_config(config)?;
//!
//! let input = std::fs::read("見積書.xlsx")?;
//! let output = service
//!     .translate_package(&input, &ProgressReporter::disabled())
//!     .await?;
//! std::fs::write("見積書_translated.xlsx", output.bytes)?;
//! # Ok(())
//! # }
//! ```

/// 翻译服务客户端
pub mod client;

/// 配置管理模块
pub mod config;

/// 核心翻译服务模块
pub mod core;

/// 错误处理模块
pub mod error;

/// 文本处理管道模块
pub mod pipeline;

pub use client::{HttpTranslator, RetryingTranslator, TranslatedBatch, Translator};
pub use config::{constants, load_translation_config, ConfigManager, TranslationConfig};
pub use core::{
    PipelineFailure, ProgressReporter, ProgressState, ProgressStatus, RetryPolicy,
    TranslationOutput, XlsxTranslationService,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{BatchOrchestrator, OrchestrationReport, TextExtractor, TranslationMap, UniqueStringSet};
