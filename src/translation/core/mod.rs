//! 翻译系统核心模块
//!
//! - **服务层** (`service.rs`): 串联解析、翻译、回填和打包
//! - **重试** (`retry.rs`): 指数退避加随机抖动的重试策略
//! - **进度** (`progress.rs`): 每次运行独立的进度通道
//! - **恢复** (`recovery.rs`): 失败后输出部分翻译结果
//!
//! ```text
//! XlsxTranslationService (service.rs)
//!     ├── ArchivePackage (parsers/package.rs)
//!     ├── TextExtractor (pipeline/collector.rs)
//!     ├── BatchOrchestrator (pipeline/batch.rs)
//!     │       └── RetryingTranslator (client/mod.rs)
//!     │               └── HttpTranslator (client/http.rs)
//!     ├── Rehydrator (pipeline/rehydrator.rs)
//!     └── build_partial_artifact (recovery.rs)
//! ```

pub mod progress;
pub mod recovery;
pub mod retry;
pub mod service;

pub use progress::{ProgressReporter, ProgressState, ProgressStatus};
pub use recovery::build_partial_artifact;
pub use retry::RetryPolicy;
pub use service::{
    PipelineFailure, ServiceStats, ServiceStatsSnapshot, TranslationOutput, XlsxTranslationService,
};
