use super::{ContainerClient, RuntimeKind};
use crate::context::ExecContext;
use crate::errors::{BlazeError, Result};
use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub const DOCKER_ENDPOINT: &str = "/var/run/docker.sock";
pub const CONTAINERD_ENDPOINT: &str = "/run/containerd/containerd.sock";

/// 通过运行时自带的命令行工具操作容器 (docker / crictl)
#[derive(Debug, Clone)]
pub struct CliClient {
    kind: RuntimeKind,
    binary: String,
    endpoint: PathBuf,
}

impl CliClient {
    pub fn docker(endpoint: PathBuf) -> Result<Self> {
        Self::connect(RuntimeKind::Docker, "docker", endpoint)
    }

    pub fn crictl(endpoint: PathBuf) -> Result<Self> {
        Self::connect(RuntimeKind::Containerd, "crictl", endpoint)
    }

    /// 运行时的 socket 不存在时直接失败, 不做重试
    pub fn connect(kind: RuntimeKind, binary: &str, endpoint: PathBuf) -> Result<Self> {
        if !endpoint.exists() {
            return Err(BlazeError::ClientResolution(format!(
                "{} endpoint {} is unreachable",
                kind,
                endpoint.display()
            )));
        }
        Ok(Self {
            kind,
            binary: binary.to_string(),
            endpoint,
        })
    }

    fn remove_args(&self, container_id: &str, force: bool) -> Vec<String> {
        let endpoint = format!("unix://{}", self.endpoint.display());
        let mut args = match self.kind {
            RuntimeKind::Containerd => vec!["--runtime-endpoint".to_string(), endpoint],
            _ => vec!["-H".to_string(), endpoint],
        };
        args.push("rm".to_string());
        if force {
            args.push("-f".to_string());
        }
        args.push(container_id.to_string());
        args
    }
}

#[async_trait]
impl ContainerClient for CliClient {
    async fn remove_container(&self, ctx: &ExecContext, container_id: &str, force: bool) -> Result<()> {
        let args = self.remove_args(container_id, force);
        let uid = ctx.value("uid").unwrap_or("-");
        debug!("[{}] 执行: {} {}", uid, self.binary, args.join(" "));

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BlazeError::ContainerOperation(format!("spawn {}: {}", self.binary, e)))?;

        // 取消时丢弃 future, kill_on_drop 会结束子进程
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = ctx.cancelled() => return Err(BlazeError::Cancelled),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let msg = if stderr.is_empty() {
                format!("{} rm exited with {}", self.binary, output.status)
            } else {
                stderr
            };
            return Err(BlazeError::ContainerOperation(msg));
        }

        info!("[{}] {} 容器 {} 删除成功", uid, self.kind, container_id);
        Ok(())
    }
}
