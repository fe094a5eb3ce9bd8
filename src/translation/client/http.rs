//! DeepL 兼容的 HTTP 翻译客户端
//!
//! 请求体为 `{"text": [...], "source_lang": "JA", "target_lang": "EN"}`，
//! 响应体为 `{"translations": [{"text": "..."}]}`。

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::translation::client::{TranslatedBatch, Translator};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// DeepL 用于表示配额耗尽的状态码
const QUOTA_EXCEEDED: u16 = 456;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a [String],
    source_lang: String,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    text: String,
}

/// 把非成功状态码映射为错误类型
pub fn classify_status(status: u16, body: &str) -> TranslationError {
    let detail: String = body.trim().chars().take(200).collect();
    let message = if detail.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail)
    };

    match status {
        QUOTA_EXCEEDED => TranslationError::QuotaExhausted(message),
        429 | 502 | 503 | 504 | 529 => TranslationError::TransientServiceError(message),
        _ => TranslationError::UnknownError(message),
    }
}

/// 解析响应体；无法解析时整批回退为原文
pub fn parse_deepl_response(body: &str, inputs: &[String]) -> TranslatedBatch {
    match serde_json::from_str::<TranslateResponse>(body) {
        Ok(response) => {
            if response.translations.len() != inputs.len() {
                tracing::warn!(
                    "译文条数不匹配: 请求 {} 条，返回 {} 条",
                    inputs.len(),
                    response.translations.len()
                );
            }
            TranslatedBatch::from_texts(response.translations.into_iter().map(|t| t.text))
        }
        Err(e) => {
            let error = TranslationError::from(e);
            tracing::warn!("{}，{} 条文本保留原文", error, inputs.len());
            TranslatedBatch::fallback(inputs.len())
        }
    }
}

/// HTTP 翻译客户端
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    source_lang: String,
    target_lang: String,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("HTTP 客户端创建失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            source_lang: config.source_lang.to_uppercase(),
            target_lang: config.target_lang.to_uppercase(),
        })
    }

}

impl Translator for HttpTranslator {
    async fn translate(&self, texts: &[String]) -> TranslationResult<TranslatedBatch> {
        if texts.is_empty() {
            return Ok(TranslatedBatch::default());
        }

        let payload = TranslateRequest {
            text: texts,
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        };

        let mut request = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("DeepL-Auth-Key {}", key));
        }

        tracing::debug!("发送翻译请求: {} 条文本 -> {}", texts.len(), self.api_url);
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_decode() || e.is_body() => {
                tracing::warn!("响应体解码失败，{} 条文本保留原文: {}", texts.len(), e);
                return Ok(TranslatedBatch::fallback(texts.len()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(parse_deepl_response(&body, texts))
    }
}
