// 集成测试公共模块
//
// 提供测试工作簿构建器和可编排的模拟翻译器

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use xlsx_translator::translation::{
    TranslatedBatch, TranslationConfig, TranslationError, TranslationResult, Translator,
};

pub const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const SPREADSHEET_DRAWING_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const CHART_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// 测试用工作簿构建器
#[derive(Debug, Clone, Default)]
pub struct WorkbookBuilder {
    parts: Vec<(String, Vec<u8>)>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带有内容类型、关系和样式部件的最小工作簿骨架
    pub fn minimal() -> Self {
        Self::new()
            .part(
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
            )
            .part(
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
            )
            .part(
                "xl/styles.xml",
                &format!(r#"<styleSheet xmlns="{MAIN_NS}"><fonts count="1"><font><name val="游ゴシック"/></font></fonts></styleSheet>"#),
            )
    }

    pub fn part(mut self, name: &str, content: &str) -> Self {
        self.parts.push((name.to_string(), content.as_bytes().to_vec()));
        self
    }

    pub fn binary_part(mut self, name: &str, content: &[u8]) -> Self {
        self.parts.push((name.to_string(), content.to_vec()));
        self
    }

    pub fn shared_strings(self, items: &[&str]) -> Self {
        let body: String = items.iter().map(|item| format!("<si>{item}</si>")).collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">{body}</sst>"#,
            n = items.len()
        );
        self.part("xl/sharedStrings.xml", &xml)
    }

    /// 工作表，`cells` 为单元格的原始 XML
    pub fn worksheet(self, index: usize, cells: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}"><sheetData><row r="1">{cells}</row></sheetData></worksheet>"#
        );
        self.part(&format!("xl/worksheets/sheet{index}.xml"), &xml)
    }

    pub fn workbook(self, sheet_names: &[&str]) -> Self {
        let sheets: String = sheet_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(
                    r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#,
                    id = i + 1
                )
            })
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheets}</sheets></workbook>"#
        );
        self.part("xl/workbook.xml", &xml)
    }

    pub fn drawing(self, index: usize, runs: &[&str]) -> Self {
        let body: String = runs.iter().map(|run| format!("<a:r><a:t>{run}</a:t></a:r>")).collect();
        let xml = format!(
            r#"<xdr:wsDr xmlns:xdr="{SPREADSHEET_DRAWING_NS}" xmlns:a="{DRAWING_NS}"><xdr:sp><xdr:txBody><a:p>{body}</a:p></xdr:txBody></xdr:sp></xdr:wsDr>"#
        );
        self.part(&format!("xl/drawings/drawing{index}.xml"), &xml)
    }

    pub fn chart(self, index: usize, title: &str) -> Self {
        let xml = format!(
            r#"<c:chartSpace xmlns:c="{CHART_NS}" xmlns:a="{DRAWING_NS}"><c:chart><c:title><c:tx><c:rich><a:p><a:r><a:t>{title}</a:t></a:r></a:p></c:rich></c:tx></c:title></c:chart></c:chartSpace>"#
        );
        self.part(&format!("xl/charts/chart{index}.xml"), &xml)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in &self.parts {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// 解压为 部件名 → 内容
pub fn read_parts(bytes: &[u8]) -> HashMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut parts = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        parts.insert(file.name().to_string(), content);
    }
    parts
}

pub fn read_part(bytes: &[u8], name: &str) -> String {
    let parts = read_parts(bytes);
    let content = parts
        .get(name)
        .unwrap_or_else(|| panic!("part {name} missing from package"));
    String::from_utf8(content.clone()).unwrap()
}

/// 不等待批次间隔的测试配置
pub fn fast_config() -> TranslationConfig {
    TranslationConfig {
        batch_delay_secs: 0,
        ..TranslationConfig::default()
    }
}

/// 按字典翻译的模拟翻译器，字典外的文本加上 `EN:` 前缀
pub struct DictionaryTranslator {
    dictionary: HashMap<String, String>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl DictionaryTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            dictionary: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for DictionaryTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(texts.to_vec());
        Ok(TranslatedBatch::from_texts(texts.iter().map(|t| {
            self.dictionary
                .get(t)
                .cloned()
                .unwrap_or_else(|| format!("EN:{t}"))
        })))
    }
}

/// 原样返回输入
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        Ok(TranslatedBatch::from_texts(texts.iter().cloned()))
    }
}

/// 前 `ok_batches` 个批次正常翻译，之后报告配额耗尽
pub struct QuotaAfterTranslator {
    ok_batches: usize,
    pub calls: AtomicUsize,
}

impl QuotaAfterTranslator {
    pub fn new(ok_batches: usize) -> Self {
        Self {
            ok_batches,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Translator for QuotaAfterTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_batches {
            return Err(TranslationError::QuotaExhausted("HTTP 456: Quota exceeded".into()));
        }
        Ok(TranslatedBatch::from_texts(texts.iter().map(|t| format!("EN:{t}"))))
    }
}

/// 前 `failures` 次调用返回临时错误
pub struct TransientThenOkTranslator {
    failures: usize,
    pub calls: AtomicUsize,
}

impl TransientThenOkTranslator {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Translator for TransientThenOkTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(TranslationError::TransientServiceError("HTTP 503".into()));
        }
        Ok(TranslatedBatch::from_texts(texts.iter().map(|t| format!("EN:{t}"))))
    }
}

/// 模拟返回无法解析的响应：整批回退
pub struct MalformedTranslator;

impl Translator for MalformedTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        Ok(xlsx_translator::translation::client::parse_deepl_response(
            "<html>502 Bad Gateway</html>",
            texts,
        ))
    }
}
