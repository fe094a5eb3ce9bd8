//! 进度报告
//!
//! 每次运行拥有自己的进度通道，状态快照通过 `tokio::sync::mpsc` 发送给调用方。
//! 进度只用于展示，接收端关闭不会影响翻译流程。

use serde::Serialize;
use tokio::sync::mpsc;

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Parsing,
    Translating,
    Rebuilding,
    Complete,
    Error,
}

/// 进度快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub status: ProgressStatus,
    pub current_batch: usize,
    pub total_batches: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressState {
    pub fn new(status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            current_batch: 0,
            total_batches: 0,
            message: message.into(),
            error: None,
        }
    }

    pub fn with_batches(mut self, current_batch: usize, total_batches: usize) -> Self {
        self.current_batch = current_batch;
        self.total_batches = total_batches;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ProgressStatus::Complete | ProgressStatus::Error)
    }
}

/// 进度发送端
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::UnboundedSender<ProgressState>>,
}

impl ProgressReporter {
    /// 创建进度通道
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressState>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// 不发送任何进度
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn report(&self, state: ProgressState) {
        tracing::trace!(?state, "进度更新");
        if let Some(sender) = &self.sender {
            // 接收端已关闭时静默丢弃
            let _ = sender.send(state);
        }
    }

    pub fn parsing(&self, message: impl Into<String>) {
        self.report(ProgressState::new(ProgressStatus::Parsing, message));
    }

    pub fn translating(&self, current_batch: usize, total_batches: usize, message: impl Into<String>) {
        self.report(
            ProgressState::new(ProgressStatus::Translating, message)
                .with_batches(current_batch, total_batches),
        );
    }

    pub fn rebuilding(&self, message: impl Into<String>) {
        self.report(ProgressState::new(ProgressStatus::Rebuilding, message));
    }

    pub fn complete(&self, total_batches: usize, message: impl Into<String>) {
        self.report(
            ProgressState::new(ProgressStatus::Complete, message)
                .with_batches(total_batches, total_batches),
        );
    }

    pub fn error(&self, message: impl Into<String>, error: impl Into<String>) {
        self.report(ProgressState::new(ProgressStatus::Error, message).with_error(error));
    }
}
