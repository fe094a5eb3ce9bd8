//! 文本过滤器模块
//!
//! 判断候选文本是否需要翻译：只要包含至少一个日文书写系统字符即需要翻译。

/// 日文书写系统相关的 Unicode 区间
const JAPANESE_RANGES: &[(char, char)] = &[
    ('\u{3000}', '\u{303F}'), // CJK 符号和标点
    ('\u{3040}', '\u{309F}'), // 平假名
    ('\u{30A0}', '\u{30FF}'), // 片假名
    ('\u{31F0}', '\u{31FF}'), // 片假名语音扩展
    ('\u{3400}', '\u{4DBF}'), // CJK 扩展 A
    ('\u{4E00}', '\u{9FFF}'), // CJK 统一表意文字
    ('\u{F900}', '\u{FAFF}'), // CJK 兼容表意文字
    ('\u{FF00}', '\u{FFEF}'), // 半角及全角形式
];

/// 判断单个字符是否属于日文书写系统
pub fn is_japanese_char(c: char) -> bool {
    JAPANESE_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&c))
}

/// 判断文本是否需要翻译
pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_japanese_char)
}

/// 文本过滤器
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    stats: FilterStats,
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 判断文本是否需要翻译，并记录统计
    pub fn should_translate(&mut self, text: &str) -> bool {
        let accepted = !text.is_empty() && contains_japanese(text);
        self.stats.record(accepted);
        accepted
    }

    /// 获取统计信息
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }
}

/// 过滤统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total_checked: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl FilterStats {
    fn record(&mut self, accepted: bool) {
        self.total_checked += 1;
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }
}
