//! 译文回填
//!
//! 用与提取相同的扫描规则重新遍历文本部件，把命中映射表的节点替换为译文。
//! 未命中的节点、译文与原文相同的节点以及节点之外的所有字节保持原样。

use std::borrow::Cow;

use quick_xml::escape::escape;
use rayon::prelude::*;

use crate::parsers::package::ArchivePackage;
use crate::parsers::xml::{rewrite_sheet_tag, scan_part, ExtractionRule, TextOccurrence};
use crate::translation::config::constants;
use crate::translation::pipeline::collector::text_bearing_parts;
use crate::translation::pipeline::map::TranslationMap;

/// 把译文清理为合法的工作表名称
///
/// 禁用字符替换为 `_`，再截断到 31 个字符。
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if constants::SHEET_NAME_FORBIDDEN.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .take(constants::MAX_SHEET_NAME_CHARS)
        .collect()
}

/// 回填统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrationReport {
    /// 被改写的部件数
    pub parts_rewritten: usize,
    /// 被替换的节点数
    pub replacements: usize,
}

/// 译文回填器
pub struct Rehydrator<'a> {
    map: &'a TranslationMap,
}

impl<'a> Rehydrator<'a> {
    pub fn new(map: &'a TranslationMap) -> Self {
        Self { map }
    }

    /// 改写文档包中的所有文本部件，只写回实际变化的部件
    pub fn rehydrate(&self, package: &mut ArchivePackage) -> RehydrationReport {
        let parts = text_bearing_parts(package);
        let source: &ArchivePackage = package;

        let rewritten: Vec<(String, String, usize)> = parts
            .par_iter()
            .filter_map(|(rule, name)| {
                let xml = source.part(name)?;
                let occurrences = scan_part(*rule, xml);
                self.rewrite_part(xml, &occurrences)
                    .map(|(content, count)| (name.clone(), content, count))
            })
            .collect();

        let mut report = RehydrationReport::default();
        for (name, content, count) in rewritten {
            tracing::debug!("部件 {} 回填 {} 个节点", name, count);
            package.set_part(&name, content);
            report.parts_rewritten += 1;
            report.replacements += count;
        }

        tracing::info!(
            "回填完成: 改写 {} 个部件，替换 {} 个节点",
            report.parts_rewritten,
            report.replacements
        );
        report
    }

    /// 按区间拼接新内容；没有任何替换时返回 `None`
    fn rewrite_part(&self, xml: &str, occurrences: &[TextOccurrence]) -> Option<(String, usize)> {
        let mut out = String::with_capacity(xml.len());
        let mut cursor = 0;
        let mut count = 0;

        for occurrence in occurrences {
            let Some(translated) = self.map.get(&occurrence.text) else {
                continue;
            };
            if translated == occurrence.text {
                continue;
            }
            let Some(replacement) = self.replacement(xml, occurrence, translated) else {
                continue;
            };

            out.push_str(&xml[cursor..occurrence.span.start]);
            out.push_str(&replacement);
            cursor = occurrence.span.end;
            count += 1;
        }

        if count == 0 {
            return None;
        }
        out.push_str(&xml[cursor..]);
        Some((out, count))
    }

    fn replacement<'x>(
        &self,
        xml: &'x str,
        occurrence: &TextOccurrence,
        translated: &'x str,
    ) -> Option<Cow<'x, str>> {
        match occurrence.rule {
            ExtractionRule::SharedString => {
                // 整个条目收敛为一个文本块，沿用 <si> 的命名空间前缀
                let prefix = element_prefix(xml, occurrence.span.start);
                Some(Cow::Owned(format!(
                    "<{prefix}t xml:space=\"preserve\">{}</{prefix}t>",
                    escape(translated)
                )))
            }
            ExtractionRule::SheetName => {
                let name = sanitize_sheet_name(translated);
                if name.is_empty() {
                    return None;
                }
                rewrite_sheet_tag(&xml[occurrence.span.clone()], &name).map(Cow::Owned)
            }
            ExtractionRule::WorksheetText
            | ExtractionRule::DrawingText
            | ExtractionRule::ChartText => Some(escape(translated)),
        }
    }
}

/// 位于 `pos` 之前的起始标签的命名空间前缀（含冒号），例如 `x:`
fn element_prefix(xml: &str, pos: usize) -> &str {
    let Some(open) = xml[..pos].rfind('<') else {
        return "";
    };
    let tag = &xml[open + 1..pos];
    let name_end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    match tag[..name_end].rfind(':') {
        Some(colon) => &tag[..=colon],
        None => "",
    }
}
