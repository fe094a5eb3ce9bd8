//! 可翻译文本节点扫描
//!
//! 用命名空间感知的 `quick_xml::NsReader` 遍历部件，记录每个可识别文本节点
//! 在原始 XML 中的字节区间与解码后的文本。提取与回填使用同一份扫描结果，
//! 保证两边看到的节点完全一致；区间之外的字节在回填时原样保留。

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::{NsReader, Reader};

/// SpreadsheetML 命名空间（过渡版与严格版）
const SPREADSHEETML_NS: &[&[u8]] = &[
    b"http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    b"http://purl.oclc.org/ooxml/spreadsheetml/main",
];

/// DrawingML 命名空间（过渡版与严格版）
const DRAWINGML_NS: &[&[u8]] = &[
    b"http://schemas.openxmlformats.org/drawingml/2006/main",
    b"http://purl.oclc.org/ooxml/drawingml/main",
];

/// 文本提取规则，每条规则对应一类部件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionRule {
    /// `xl/sharedStrings.xml` 中的 `<si>` 条目
    SharedString,
    /// `xl/worksheets/*.xml` 中的 `<t>` 节点
    WorksheetText,
    /// `xl/drawings/*.xml` 中的 `<a:t>` 节点
    DrawingText,
    /// `xl/charts/*.xml` 中的 `<a:t>` 节点
    ChartText,
    /// `xl/workbook.xml` 中 `<sheet>` 的 `name` 属性
    SheetName,
}

impl ExtractionRule {
    /// 固定的遍历顺序
    pub const ALL: [ExtractionRule; 5] = [
        ExtractionRule::SharedString,
        ExtractionRule::WorksheetText,
        ExtractionRule::DrawingText,
        ExtractionRule::ChartText,
        ExtractionRule::SheetName,
    ];

    /// 判断部件名是否归属于该规则
    pub fn matches(&self, part_name: &str) -> bool {
        match self {
            ExtractionRule::SharedString => part_name == "xl/sharedStrings.xml",
            ExtractionRule::WorksheetText => is_direct_xml_child(part_name, "xl/worksheets/"),
            ExtractionRule::DrawingText => is_direct_xml_child(part_name, "xl/drawings/"),
            ExtractionRule::ChartText => is_direct_xml_child(part_name, "xl/charts/"),
            ExtractionRule::SheetName => part_name == "xl/workbook.xml",
        }
    }

    /// 查找部件名对应的规则
    pub fn for_part(part_name: &str) -> Option<ExtractionRule> {
        Self::ALL.into_iter().find(|rule| rule.matches(part_name))
    }

    fn namespaces(&self) -> &'static [&'static [u8]] {
        match self {
            ExtractionRule::SharedString
            | ExtractionRule::WorksheetText
            | ExtractionRule::SheetName => SPREADSHEETML_NS,
            ExtractionRule::DrawingText | ExtractionRule::ChartText => DRAWINGML_NS,
        }
    }
}

/// `prefix` 目录下的 `.xml` 文件，不含子目录（如 `_rels/`）
fn is_direct_xml_child(part_name: &str, prefix: &str) -> bool {
    part_name
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.ends_with(".xml") && !rest.contains('/'))
}

fn in_namespace(rule: ExtractionRule, ns: &ResolveResult<'_>) -> bool {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => {
            rule.namespaces().iter().any(|candidate| *candidate == *uri)
        }
        ResolveResult::Unbound => true,
        ResolveResult::Unknown(_) => false,
    }
}

/// 一次文本出现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOccurrence {
    pub rule: ExtractionRule,
    /// 被替换的原始字节区间
    ///
    /// 文本节点与 `<si>` 是元素内部内容；工作表名称是整个 `<sheet>` 起始标签。
    pub span: Range<usize>,
    /// 解码后的文本
    pub text: String,
}

/// 扫描一个部件，返回按出现顺序排列的文本节点
///
/// 遇到格式错误时停止扫描该部件，只保留已经完整识别的节点。
pub fn scan_part(rule: ExtractionRule, xml: &str) -> Vec<TextOccurrence> {
    let mut scanner = Scanner::new(rule, xml);
    if let Err(e) = scanner.run() {
        tracing::debug!(
            "扫描 {:?} 部件时遇到格式错误，保留已识别的 {} 个节点: {}",
            rule,
            scanner.found.len(),
            e
        );
    }
    scanner.found
}

/// 正在收集的节点
struct OpenNode {
    inner_start: usize,
    text: String,
    /// 实体解码失败时整个节点跳过
    valid: bool,
}

struct Scanner<'a> {
    rule: ExtractionRule,
    xml: &'a str,
    reader: NsReader<&'a [u8]>,
    found: Vec<TextOccurrence>,
    /// 注音 `<rPh>` 的嵌套深度
    phonetic_depth: usize,
    /// `<si>` 条目
    entry: Option<OpenNode>,
    /// 当前 `<t>` 文本节点
    text_node: Option<OpenNode>,
}

impl<'a> Scanner<'a> {
    fn new(rule: ExtractionRule, xml: &'a str) -> Self {
        Self {
            rule,
            xml,
            reader: NsReader::from_str(xml),
            found: Vec::new(),
            phonetic_depth: 0,
            entry: None,
            text_node: None,
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    fn run(&mut self) -> quick_xml::Result<()> {
        loop {
            let (ns, event) = self.reader.read_resolved_event()?;
            let known = in_namespace(self.rule, &ns);
            match event {
                Event::Start(e) => {
                    let local = e.local_name();
                    let end = self.position();
                    match local.as_ref() {
                        b"rPh" if known => self.phonetic_depth += 1,
                        b"si" if known && self.rule == ExtractionRule::SharedString => {
                            self.entry = Some(OpenNode::new(end));
                        }
                        b"t" if known && self.phonetic_depth == 0 => {
                            self.text_node = Some(OpenNode::new(end));
                        }
                        b"sheet" if known && self.rule == ExtractionRule::SheetName => {
                            self.record_sheet(&e, end);
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    let end = self.position();
                    if known
                        && self.rule == ExtractionRule::SheetName
                        && e.local_name().as_ref() == b"sheet"
                    {
                        self.record_sheet(&e, end);
                    }
                }
                Event::Text(e) => {
                    if let Some(node) = self.text_node.as_mut() {
                        match e.unescape() {
                            Ok(text) => node.text.push_str(&text),
                            Err(_) => node.valid = false,
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(node) = self.text_node.as_mut() {
                        match std::str::from_utf8(&e) {
                            Ok(text) => node.text.push_str(text),
                            Err(_) => node.valid = false,
                        }
                    }
                }
                Event::End(e) => {
                    let end = self.position();
                    match e.local_name().as_ref() {
                        b"rPh" if known => {
                            self.phonetic_depth = self.phonetic_depth.saturating_sub(1)
                        }
                        b"t" if known => self.close_text_node(end),
                        b"si" if known => self.close_entry(end),
                        _ => {}
                    }
                }
                Event::Eof => return Ok(()),
                _ => {}
            }
        }
    }

    /// 结束标签 `</...>` 的起始位置
    fn end_tag_start(&self, end: usize) -> usize {
        self.xml[..end].rfind("</").unwrap_or(end)
    }

    fn close_text_node(&mut self, end: usize) {
        let Some(node) = self.text_node.take() else {
            return;
        };
        let inner = node.inner_start..self.end_tag_start(end);

        // 共享字符串：把各个文本块拼接到所属条目
        if self.rule == ExtractionRule::SharedString {
            if let Some(entry) = self.entry.as_mut() {
                entry.valid &= node.valid;
                entry.text.push_str(&node.text);
            }
            return;
        }

        if node.valid {
            self.found.push(TextOccurrence {
                rule: self.rule,
                span: inner,
                text: node.text,
            });
        }
    }

    fn close_entry(&mut self, end: usize) {
        if self.rule != ExtractionRule::SharedString {
            return;
        }
        let Some(entry) = self.entry.take() else {
            return;
        };
        if entry.valid {
            self.found.push(TextOccurrence {
                rule: self.rule,
                span: entry.inner_start..self.end_tag_start(end),
                text: entry.text,
            });
        }
    }

    fn record_sheet(&mut self, e: &BytesStart<'_>, end: usize) {
        let Some(start) = self.xml[..end].rfind('<') else {
            return;
        };
        if let Some(name) = sheet_name(e) {
            self.found.push(TextOccurrence {
                rule: self.rule,
                span: start..end,
                text: name,
            });
        }
    }
}

impl OpenNode {
    fn new(inner_start: usize) -> Self {
        Self {
            inner_start,
            text: String::new(),
            valid: true,
        }
    }
}

/// 读取 `<sheet>` 的 `name` 属性
fn sheet_name(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"name")
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

/// 重建 `<sheet>` 起始标签，仅替换 `name` 属性
///
/// 其他属性保留原始转义形式；统一使用双引号输出。
pub fn rewrite_sheet_tag(raw_tag: &str, new_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(raw_tag);
    let (element, self_closing) = match reader.read_event().ok()? {
        Event::Empty(e) => (e, true),
        Event::Start(e) => (e, false),
        _ => return None,
    };

    let qname = std::str::from_utf8(element.name().into_inner()).ok()?;
    let mut rebuilt = BytesStart::new(qname);
    for attr in element.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"name" {
            rebuilt.push_attribute(("name", new_name));
        } else {
            // 单引号属性中可能出现未转义的双引号
            let raw_value = std::str::from_utf8(&attr.value).ok()?.replace('"', "&quot;");
            rebuilt.push_attribute((attr.key.as_ref(), raw_value.as_bytes()));
        }
    }

    let body = std::str::from_utf8(&rebuilt).ok()?;
    Some(if self_closing {
        format!("<{}/>", body)
    } else {
        format!("<{}>", body)
    })
}
