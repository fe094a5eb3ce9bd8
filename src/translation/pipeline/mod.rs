//! 文本处理管道模块
//!
//! 提取 → 过滤 → 去重 → 分批翻译 → 回填

pub mod batch;
pub mod collector;
pub mod filters;
pub mod map;
pub mod rehydrator;

pub use batch::{partition, total_batches, Batch, BatchConfig, BatchOrchestrator, OrchestrationReport};
pub use collector::{ExtractedStrings, TextExtractor, UniqueStringSet};
pub use filters::{contains_japanese, is_japanese_char, FilterStats, TextFilter};
pub use map::TranslationMap;
pub use rehydrator::{sanitize_sheet_name, RehydrationReport, Rehydrator};
