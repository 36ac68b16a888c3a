use super::ContainerClient;
use crate::context::ExecContext;
use crate::errors::{BlazeError, Result};
use async_trait::async_trait;
use log::{info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct FireState {
    id: String,
    status: String,
    #[serde(default)]
    pid: i32,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

/// 操作本地 fire 运行时的容器, 每个容器的状态保存在 `<state_dir>/<id>/state.json`
#[derive(Debug, Clone)]
pub struct FireClient {
    state_dir: PathBuf,
}

impl FireClient {
    pub fn connect(state_dir: PathBuf) -> Result<Self> {
        if !state_dir.is_dir() {
            return Err(BlazeError::ClientResolution(format!(
                "fire state directory {} does not exist",
                state_dir.display()
            )));
        }
        Ok(Self { state_dir })
    }

    fn container_dir(&self, container_id: &str) -> Result<PathBuf> {
        if container_id.is_empty()
            || container_id.contains('/')
            || container_id == "."
            || container_id == ".."
        {
            return Err(BlazeError::ContainerOperation(format!(
                "invalid container id: {:?}",
                container_id
            )));
        }
        Ok(self.state_dir.join(container_id))
    }

    fn stop(&self, state: &FireState) -> Result<()> {
        if state.pid <= 0 {
            return Ok(());
        }
        info!("强制停止容器 {}, PID: {}", state.id, state.pid);
        match kill(Pid::from_raw(state.pid), Signal::SIGKILL) {
            Err(Errno::ESRCH) => {
                warn!("容器 {} 的进程 {} 已退出", state.id, state.pid);
                Ok(())
            }
            result => Ok(result?),
        }
    }
}

#[async_trait]
impl ContainerClient for FireClient {
    async fn remove_container(&self, ctx: &ExecContext, container_id: &str, force: bool) -> Result<()> {
        let container_dir = self.container_dir(container_id)?;
        let state_file = container_dir.join("state.json");

        if !state_file.exists() {
            return Err(BlazeError::ContainerOperation(format!(
                "container {} not found",
                container_id
            )));
        }

        let content = tokio::fs::read_to_string(&state_file).await?;
        let state: FireState = serde_json::from_str(&content)?;
        if !state.annotations.is_empty() {
            info!("容器 {} 注解: {:?}", container_id, state.annotations);
        }

        if state.status == "running" {
            if !force {
                return Err(BlazeError::ContainerOperation(format!(
                    "container {} is running, stop it first or use --force",
                    container_id
                )));
            }
            self.stop(&state)?;
        }

        if ctx.is_cancelled() {
            warn!("删除容器 {} 被取消", container_id);
            return Err(BlazeError::Cancelled);
        }

        // 检查取消之后不再有 await 点, 删除一旦开始就不会被中途丢弃
        std::fs::remove_dir_all(&container_dir)?;
        info!(
            "[{}] 删除容器目录: {}",
            ctx.value("uid").unwrap_or("-"),
            container_dir.display()
        );
        Ok(())
    }
}
