//! 重试策略
//!
//! 一个显式的策略对象描述最大尝试次数、指数退避、随机抖动以及哪些错误可重试，
//! 所有重试都经过同一个循环。

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 在退避时间上叠加最多 50% 的随机抖动
pub fn random_jitter(delay: Duration) -> Duration {
    let max_extra = (delay.as_millis() / 2) as u64;
    if max_extra == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=max_extra))
}

/// 不加抖动
pub fn no_jitter(delay: Duration) -> Duration {
    delay
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 包括首次调用在内的最大尝试次数
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: fn(Duration) -> Duration,
    pub retryable: fn(&TranslationError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts.max(1),
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
            jitter: random_jitter,
            retryable: TranslationError::is_retryable,
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = no_jitter;
        self
    }

    /// 第 `attempt` 次失败后的等待时间：`base_delay * 2^(attempt-1)`，不超过 `max_delay`
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        let backoff = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        (self.jitter)(backoff).min(self.max_delay)
    }

    /// 执行操作，可重试错误按退避策略重试，耗尽后返回 [`TranslationError::RetryExhausted`]
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> TranslationResult<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = TranslationResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if (self.retryable)(&e) => {
                    if attempt >= self.max_attempts {
                        tracing::error!("重试次数耗尽 ({}/{}): {}", attempt, self.max_attempts, e);
                        return Err(TranslationError::RetryExhausted {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }

                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "翻译失败，{}ms后重试 (尝试 {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
