//! 容器运行时客户端抽象
//!
//! 动作执行器只依赖 [`ContainerClient`], 具体实现在每次调用时由
//! [`ClientResolver`] 根据实验模型里的运行时标识选出。

use crate::config::BlazeConfig;
use crate::context::ExecContext;
use crate::errors::{BlazeError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use model::ExpModel;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub mod cli;
pub mod fire;

pub const CONTAINER_RUNTIME_FLAG: &str = "container-runtime";
pub const ENDPOINT_FLAG: &str = "cri-endpoint";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    Docker,
    Containerd,
    /// 本地状态目录中的 fire 容器
    Fire,
}

lazy_static! {
    static ref RUNTIME_KINDS: HashMap<&'static str, RuntimeKind> = {
        let mut map = HashMap::new();
        map.insert("docker", RuntimeKind::Docker);
        map.insert("containerd", RuntimeKind::Containerd);
        map.insert("fire", RuntimeKind::Fire);
        map
    };
}

impl RuntimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Docker => "docker",
            RuntimeKind::Containerd => "containerd",
            RuntimeKind::Fire => "fire",
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = BlazeError;

    fn from_str(s: &str) -> Result<Self> {
        RUNTIME_KINDS
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| BlazeError::ClientResolution(format!("unsupported container runtime: {}", s)))
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从实验模型中解析出的运行时选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSelector {
    pub kind: RuntimeKind,
    pub endpoint: Option<PathBuf>,
}

impl RuntimeSelector {
    pub fn from_model(model: &ExpModel, default_kind: RuntimeKind) -> Result<Self> {
        let kind = match model.action_flag(CONTAINER_RUNTIME_FLAG) {
            Some(runtime) if !runtime.trim().is_empty() => runtime.parse()?,
            _ => default_kind,
        };
        let endpoint = model
            .action_flag(ENDPOINT_FLAG)
            .filter(|ep| !ep.is_empty())
            .map(PathBuf::from);
        Ok(Self { kind, endpoint })
    }
}

/// 实验动作可以执行的容器操作
///
/// `container_id` 对本 trait 是不透明的。部分运行时 (通过 CRI 访问的
/// containerd) 只接受完整的容器ID, 由调用方保证传入足够完整的ID。
///
/// 实现需要支持并发调用, 并在 `ctx` 被取消后停止工作。执行器会在取消时
/// 丢弃正在进行的 future, 因此实现不能在不可撤销的副作用开始之后再
/// await, 否则副作用已生效却会被报告为取消。
#[async_trait]
pub trait ContainerClient: Send + Sync {
    async fn remove_container(&self, ctx: &ExecContext, container_id: &str, force: bool) -> Result<()>;
}

pub trait ClientResolver: Send + Sync {
    fn resolve(&self, model: &ExpModel) -> Result<Arc<dyn ContainerClient>>;
}

type Constructor = Box<dyn Fn(&RuntimeSelector) -> Result<Arc<dyn ContainerClient>> + Send + Sync>;

/// 运行时类型到客户端构造函数的映射
pub struct ClientRegistry {
    default_kind: RuntimeKind,
    constructors: HashMap<RuntimeKind, Constructor>,
}

impl ClientRegistry {
    pub fn new(default_kind: RuntimeKind) -> Self {
        Self {
            default_kind,
            constructors: HashMap::new(),
        }
    }

    pub fn register<F>(mut self, kind: RuntimeKind, constructor: F) -> Self
    where
        F: Fn(&RuntimeSelector) -> Result<Arc<dyn ContainerClient>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Box::new(constructor));
        self
    }

    pub fn from_config(config: &BlazeConfig) -> Result<Self> {
        let docker_ep = config.endpoint_for(RuntimeKind::Docker);
        let containerd_ep = config.endpoint_for(RuntimeKind::Containerd);
        let state_dir = config.endpoint_for(RuntimeKind::Fire);

        let registry = Self::new(config.default_runtime_kind()?)
            .register(RuntimeKind::Docker, move |sel| {
                let endpoint = sel.endpoint.clone().unwrap_or_else(|| docker_ep.clone());
                Ok(Arc::new(cli::CliClient::docker(endpoint)?) as Arc<dyn ContainerClient>)
            })
            .register(RuntimeKind::Containerd, move |sel| {
                let endpoint = sel.endpoint.clone().unwrap_or_else(|| containerd_ep.clone());
                Ok(Arc::new(cli::CliClient::crictl(endpoint)?) as Arc<dyn ContainerClient>)
            })
            .register(RuntimeKind::Fire, move |sel| {
                let dir = sel.endpoint.clone().unwrap_or_else(|| state_dir.clone());
                Ok(Arc::new(fire::FireClient::connect(dir)?) as Arc<dyn ContainerClient>)
            });
        Ok(registry)
    }

    pub fn kinds(&self) -> Vec<RuntimeKind> {
        self.constructors.keys().copied().collect()
    }
}

impl ClientResolver for ClientRegistry {
    fn resolve(&self, model: &ExpModel) -> Result<Arc<dyn ContainerClient>> {
        let selector = RuntimeSelector::from_model(model, self.default_kind)?;
        debug!("解析容器运行时客户端: {:?}", selector);

        let constructor = self.constructors.get(&selector.kind).ok_or_else(|| {
            BlazeError::ClientResolution(format!("no client registered for runtime {}", selector.kind))
        })?;
        constructor(&selector).map_err(|e| match e {
            BlazeError::ClientResolution(_) => e,
            other => BlazeError::ClientResolution(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopClient;

    #[async_trait]
    impl ContainerClient for NoopClient {
        async fn remove_container(&self, _ctx: &ExecContext, _id: &str, _force: bool) -> Result<()> {
            Ok(())
        }
    }

    fn noop(_sel: &RuntimeSelector) -> Result<Arc<dyn ContainerClient>> {
        Ok(Arc::new(NoopClient))
    }

    #[test]
    fn test_runtime_kind_parse() {
        assert_eq!("docker".parse::<RuntimeKind>().unwrap(), RuntimeKind::Docker);
        assert_eq!(" Containerd ".parse::<RuntimeKind>().unwrap(), RuntimeKind::Containerd);
        assert!(matches!(
            "podman".parse::<RuntimeKind>(),
            Err(BlazeError::ClientResolution(_))
        ));
    }

    #[test]
    fn test_selector_defaults() {
        let model = ExpModel::new("container", "remove");
        let sel = RuntimeSelector::from_model(&model, RuntimeKind::Fire).unwrap();
        assert_eq!(sel.kind, RuntimeKind::Fire);
        assert!(sel.endpoint.is_none());

        let model = model
            .with_flag(CONTAINER_RUNTIME_FLAG, "containerd")
            .with_flag(ENDPOINT_FLAG, "/tmp/cri.sock");
        let sel = RuntimeSelector::from_model(&model, RuntimeKind::Docker).unwrap();
        assert_eq!(sel.kind, RuntimeKind::Containerd);
        assert_eq!(sel.endpoint, Some(PathBuf::from("/tmp/cri.sock")));
    }

    #[test]
    fn test_registry_resolve() {
        let registry = ClientRegistry::new(RuntimeKind::Docker).register(RuntimeKind::Docker, noop);
        assert!(registry.resolve(&ExpModel::new("container", "remove")).is_ok());

        let model = ExpModel::new("container", "remove").with_flag(CONTAINER_RUNTIME_FLAG, "fire");
        assert!(matches!(
            registry.resolve(&model),
            Err(BlazeError::ClientResolution(_))
        ));

        let model = ExpModel::new("container", "remove").with_flag(CONTAINER_RUNTIME_FLAG, "rkt");
        assert!(matches!(
            registry.resolve(&model),
            Err(BlazeError::ClientResolution(_))
        ));
    }

    #[test]
    fn test_constructor_errors_become_resolution_errors() {
        let registry = ClientRegistry::new(RuntimeKind::Docker)
            .register(RuntimeKind::Docker, |_| {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "socket gone").into())
            });
        match registry.resolve(&ExpModel::new("container", "remove")) {
            Err(BlazeError::ClientResolution(msg)) => assert!(msg.contains("socket gone")),
            _ => panic!("expected resolution error"),
        }
    }

    #[test]
    fn test_from_config_with_missing_endpoint() {
        let mut config = BlazeConfig::new();
        config.docker_endpoint = PathBuf::from("/nonexistent/docker.sock");
        let registry = ClientRegistry::from_config(&config).unwrap();
        assert_eq!(registry.kinds().len(), 3);
        assert!(matches!(
            registry.resolve(&ExpModel::new("container", "remove")),
            Err(BlazeError::ClientResolution(_))
        ));
    }
}
