//! # xlsx-translator
//!
//! 翻译 .xlsx 工作簿中的日文文本，保持工作簿其余部分不变。
//!
//! ## 模块组织
//!
//! - `parsers` - 文档包读写和 XML 文本节点扫描
//! - `translation` - 文本提取、批次翻译、回填和失败恢复
//! - `env` - 类型安全的环境变量
//! - `utils` - 输出文件命名

pub mod env;
pub mod parsers;
pub mod translation;
pub mod utils;

// Re-export commonly used items for convenience
pub use parsers::*;
pub use utils::*;
