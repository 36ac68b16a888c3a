use crate::commands::container::new_container_command_spec;
use crate::commands::{ActionSpec, CommandSpec};
use crate::errors::{BlazeError, Result};
use crate::runtime::ClientResolver;
use std::collections::HashSet;
use std::sync::Arc;

/// 进程启动时构建, 之后只读
#[derive(Debug, Clone)]
pub struct Registry {
    commands: Vec<Arc<CommandSpec>>,
}

impl Registry {
    pub fn new(commands: Vec<Arc<CommandSpec>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for command in &commands {
            if !seen.insert(command.name().to_string()) {
                return Err(BlazeError::InvalidSpec(format!("命令 {} 重复注册", command.name())));
            }
        }
        Ok(Self { commands })
    }

    pub fn with_defaults(resolver: Arc<dyn ClientResolver>) -> Result<Self> {
        Self::new(vec![Arc::new(new_container_command_spec(resolver)?)])
    }

    pub fn commands(&self) -> &[Arc<CommandSpec>] {
        &self.commands
    }

    pub fn find(&self, target: &str, action: &str) -> Option<(&CommandSpec, &ActionSpec)> {
        let command = self.commands.iter().find(|c| c.name() == target)?;
        let action = command.find_action(action)?;
        Some((command.as_ref(), action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ContainerClient;
    use model::ExpModel;

    struct NoResolver;

    impl ClientResolver for NoResolver {
        fn resolve(&self, _model: &ExpModel) -> Result<Arc<dyn ContainerClient>> {
            Err(BlazeError::ClientResolution("none".to_string()))
        }
    }

    #[test]
    fn test_find_with_alias() {
        let registry = Registry::with_defaults(Arc::new(NoResolver)).unwrap();
        let (command, action) = registry.find("container", "rm").unwrap();
        assert_eq!(command.name(), "container");
        assert_eq!(action.name(), "remove");
        assert!(registry.find("container", "remove").is_some());
        assert!(registry.find("container", "stop").is_none());
        assert!(registry.find("network", "remove").is_none());
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let command = Arc::new(new_container_command_spec(Arc::new(NoResolver)).unwrap());
        assert!(Registry::new(vec![command.clone(), command]).is_err());
    }

    #[tokio::test]
    async fn test_remove_fire_container_end_to_end() {
        use crate::config::BlazeConfig;
        use crate::context::{ExecContext, Mode};
        use crate::parser::parse_action_args;
        use crate::runtime::ClientRegistry;
        use model::Code;

        let dir = tempfile::tempdir().unwrap();
        let container_dir = dir.path().join("a76d53933d3f");
        std::fs::create_dir_all(&container_dir).unwrap();
        std::fs::write(
            container_dir.join("state.json"),
            r#"{"ociVersion":"1.0.0","id":"a76d53933d3f","status":"stopped","pid":0,"bundle":"/tmp/b"}"#,
        )
        .unwrap();

        let mut config = BlazeConfig::new();
        config.default_runtime = "fire".to_string();
        config.fire_state_dir = dir.path().to_path_buf();
        let registry = Registry::with_defaults(Arc::new(ClientRegistry::from_config(&config).unwrap())).unwrap();
        let (_, spec) = registry.find("container", "rm").unwrap();
        let args: Vec<String> = vec!["--container-id".into(), "a76d53933d3f".into()];
        let model = parse_action_args("container", spec, &args).unwrap();

        let ctx = ExecContext::new(Mode::Apply);
        let resp = spec.executor().exec("uid-1", &ctx, &model).await;
        assert!(resp.is_success(), "{}", resp);
        assert!(!container_dir.exists());

        let resp = spec.executor().exec("uid-2", &ctx, &model).await;
        assert_eq!(resp.code(), Some(Code::ContainerOperationFailed));
        assert!(resp.err().unwrap().contains("not found"));

        let rollback = ExecContext::new(Mode::Rollback);
        assert!(spec.executor().exec("uid-3", &rollback, &model).await.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_fire_removal_keeps_container() {
        use crate::config::BlazeConfig;
        use crate::context::{ExecContext, Mode};
        use crate::parser::parse_action_args;
        use crate::runtime::ClientRegistry;
        use model::Code;

        let dir = tempfile::tempdir().unwrap();
        let container_dir = dir.path().join("c1");
        std::fs::create_dir_all(&container_dir).unwrap();
        std::fs::write(
            container_dir.join("state.json"),
            r#"{"ociVersion":"1.0.0","id":"c1","status":"created","pid":0,"bundle":"/tmp/b"}"#,
        )
        .unwrap();

        let mut config = BlazeConfig::new();
        config.default_runtime = "fire".to_string();
        config.fire_state_dir = dir.path().to_path_buf();
        let registry = Registry::with_defaults(Arc::new(ClientRegistry::from_config(&config).unwrap())).unwrap();
        let (_, spec) = registry.find("container", "remove").unwrap();
        let args: Vec<String> = vec!["--container-id".into(), "c1".into()];
        let model = parse_action_args("container", spec, &args).unwrap();

        // 报告取消时容器必须仍然存在
        let cancelled = ExecContext::new(Mode::Apply);
        cancelled.cancel();
        let resp = spec.executor().exec("uid-1", &cancelled, &model).await;
        assert_eq!(resp.code(), Some(Code::ContainerOperationFailed));
        assert!(resp.err().unwrap().contains("canceled"));
        assert!(container_dir.exists());

        let ctx = ExecContext::new(Mode::Apply).with_value("uid", "uid-2");
        assert!(spec.executor().exec("uid-2", &ctx, &model).await.is_success());
        assert!(!container_dir.exists());
    }
}
