//! # 解析器模块
//!
//! 处理 .xlsx 文档包的两层结构：
//!
//! - `package` - ZIP 容器的读取、部件替换和重新打包
//! - `xml` - 带命名空间解析的 SpreadsheetML / DrawingML 文本节点扫描

pub mod package;
pub mod xml;

// Re-export commonly used items for convenience
pub use package::{ArchivePackage, PackageLimits};
pub use xml::{rewrite_sheet_tag, scan_part, ExtractionRule, TextOccurrence};
