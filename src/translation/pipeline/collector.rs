//! 文本收集器模块
//!
//! 按固定顺序扫描文档包中的文本部件，提取候选文本，过滤出需要翻译的字符串，
//! 并按首次出现顺序去重。

use std::collections::HashSet;

use rayon::prelude::*;

use crate::parsers::package::ArchivePackage;
use crate::parsers::xml::{scan_part, ExtractionRule, TextOccurrence};
use crate::translation::pipeline::filters::{FilterStats, TextFilter};

/// 有序去重字符串集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueStringSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl UniqueStringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入字符串，已存在时返回 `false`
    pub fn insert(&mut self, text: String) -> bool {
        if self.seen.contains(&text) {
            return false;
        }
        self.seen.insert(text.clone());
        self.items.push(text);
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按首次出现顺序返回
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl FromIterator<String> for UniqueStringSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for text in iter {
            set.insert(text);
        }
        set
    }
}

/// 需要扫描的文本部件，按规则顺序排列，同一规则内按部件名排序
pub fn text_bearing_parts(package: &ArchivePackage) -> Vec<(ExtractionRule, String)> {
    let mut parts = Vec::new();
    for rule in ExtractionRule::ALL {
        let mut names: Vec<String> = package
            .part_names()
            .filter(|name| rule.matches(name))
            .map(str::to_string)
            .collect();
        names.sort();
        parts.extend(names.into_iter().map(|name| (rule, name)));
    }
    parts
}

/// 扫描全部文本部件，结果顺序与 [`text_bearing_parts`] 一致
pub fn scan_package(
    package: &ArchivePackage,
    parts: &[(ExtractionRule, String)],
) -> Vec<Vec<TextOccurrence>> {
    parts
        .par_iter()
        .map(|(rule, name)| match package.part(name) {
            Some(xml) => scan_part(*rule, xml),
            None => {
                tracing::debug!("部件 {} 不是 UTF-8 文本，跳过", name);
                Vec::new()
            }
        })
        .collect()
}

/// 文本提取结果
#[derive(Debug, Clone, Default)]
pub struct ExtractedStrings {
    /// 需要翻译的去重字符串
    pub strings: UniqueStringSet,
    /// 识别到的文本节点总数（过滤前）
    pub occurrences: usize,
    /// 扫描的部件数
    pub parts_scanned: usize,
    /// 过滤统计
    pub filter_stats: FilterStats,
}

/// 文本提取器
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 从文档包提取需要翻译的字符串
    ///
    /// 提取永远不会失败：无法解析的部件只会贡献已经识别的节点。
    pub fn extract(&self, package: &ArchivePackage) -> ExtractedStrings {
        let parts = text_bearing_parts(package);
        let scanned = scan_package(package, &parts);

        let mut filter = TextFilter::new();
        let mut strings = UniqueStringSet::new();
        let mut occurrences = 0;

        for ((_, name), found) in parts.iter().zip(scanned) {
            tracing::debug!("部件 {} 识别到 {} 个文本节点", name, found.len());
            occurrences += found.len();
            for occurrence in found {
                if filter.should_translate(&occurrence.text) {
                    strings.insert(occurrence.text);
                }
            }
        }

        tracing::info!(
            "文本收集完成: 扫描 {} 个部件，识别 {} 个节点，待翻译 {} 条",
            parts.len(),
            occurrences,
            strings.len()
        );

        ExtractedStrings {
            strings,
            occurrences,
            parts_scanned: parts.len(),
            filter_stats: *filter.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    fn package(parts: &[(&str, String)]) -> ArchivePackage {
        let mut package = ArchivePackage::default();
        for (name, xml) in parts {
            package.set_part(name, xml.clone());
        }
        package
    }

    #[test]
    fn test_unique_set_keeps_first_seen_order() {
        let set: UniqueStringSet = ["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(set.as_slice(), &["b", "a", "c"]);
        assert!(set.contains("c"));
        assert!(!set.contains("d"));
    }

    #[test]
    fn test_traversal_order_follows_rules() {
        let package = package(&[
            ("xl/workbook.xml", String::new()),
            ("xl/worksheets/sheet2.xml", String::new()),
            ("xl/sharedStrings.xml", String::new()),
            ("xl/worksheets/sheet1.xml", String::new()),
            ("xl/styles.xml", String::new()),
        ]);

        let names: Vec<String> = text_bearing_parts(&package)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "xl/sharedStrings.xml",
                "xl/worksheets/sheet1.xml",
                "xl/worksheets/sheet2.xml",
                "xl/workbook.xml",
            ]
        );
    }

    #[test]
    fn test_extract_deduplicates_across_parts() {
        let package = package(&[
            (
                "xl/sharedStrings.xml",
                format!(r#"<sst xmlns="{MAIN_NS}"><si><t>売上</t></si><si><t>Sales</t></si></sst>"#),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(r#"<worksheet xmlns="{MAIN_NS}"><c><is><t>売上</t></is></c><c><is><t>経費</t></is></c></worksheet>"#),
            ),
            (
                "xl/workbook.xml",
                format!(r#"<workbook xmlns="{MAIN_NS}"><sheets><sheet name="売上" sheetId="1"/></sheets></workbook>"#),
            ),
        ]);

        let extracted = TextExtractor::new().extract(&package);

        assert_eq!(extracted.strings.as_slice(), &["売上", "経費"]);
        assert_eq!(extracted.occurrences, 5);
        assert!(extracted.strings.len() <= extracted.occurrences);
        assert_eq!(extracted.filter_stats.rejected, 1);
        assert_eq!(extracted.parts_scanned, 3);
    }

    #[test]
    fn test_extract_empty_package() {
        let extracted = TextExtractor::new().extract(&ArchivePackage::default());
        assert!(extracted.strings.is_empty());
        assert_eq!(extracted.occurrences, 0);
    }
}
