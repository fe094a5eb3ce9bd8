//! 译文映射表
//!
//! 原文到译文的映射，在批次完成时逐步写入，回填阶段只读。

use std::collections::HashMap;

/// 原文 → 译文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    entries: HashMap<String, String>,
}

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一条译文；已有的键不会被覆盖
    pub fn insert(&mut self, original: String, translated: String) {
        self.entries.entry(original).or_insert(translated);
    }

    /// 按位置配对写入一个批次的结果，返回新增条数
    ///
    /// `None` 表示该位置没有可用译文，以原文本身作为译文写入。
    pub fn commit_batch(&mut self, originals: &[String], translated: Vec<Option<String>>) -> usize {
        let before = self.entries.len();
        let mut translated = translated.into_iter();
        for original in originals {
            let value = translated.next().flatten().unwrap_or_else(|| original.clone());
            self.insert(original.clone(), value);
        }
        self.entries.len() - before
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (original, translated) in iter {
            map.insert(original, translated);
        }
        map
    }
}
