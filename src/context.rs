use std::collections::BTreeMap;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// 实验动作的调用模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 注入故障 (create)
    Apply,
    /// 回滚/清理 (destroy)
    Rollback,
}

/// 单次调用的执行上下文, 以引用方式传给执行器
#[derive(Debug, Clone)]
pub struct ExecContext {
    token: CancellationToken,
    mode: Mode,
    values: BTreeMap<String, String>,
}

impl ExecContext {
    pub fn new(mode: Mode) -> Self {
        Self::with_token(mode, CancellationToken::new())
    }

    pub fn with_token(mode: Mode, token: CancellationToken) -> Self {
        Self {
            token,
            mode,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_destroy(&self) -> bool {
        self.mode == Mode::Rollback
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
