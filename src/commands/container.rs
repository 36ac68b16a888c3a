use super::{ActionExecutor, ActionSpec, CommandSpec, CATEGORY_SYSTEM_CONTAINER};
use crate::context::ExecContext;
use crate::errors::{BlazeError, Result};
use crate::runtime::{ClientResolver, CONTAINER_RUNTIME_FLAG, ENDPOINT_FLAG};
use async_trait::async_trait;
use log::{error, info};
use model::{Code, ExpFlag, ExpModel, Response};
use std::sync::Arc;

pub const CONTAINER_ID_FLAG: &str = "container-id";
pub const FORCE_FLAG: &str = "force";

const REMOVE_EXAMPLE: &str = r#"# Delete the container id that is a76d53933d3f
blaze create container remove --container-id a76d53933d3f

# If the container runtime is containerd, the container-id should be the full id
blaze create container remove --container-id a76d53933d3f --container-runtime containerd --force"#;

/// 通用的容器定位参数
pub fn container_flags() -> Vec<ExpFlag> {
    vec![
        ExpFlag::valued(CONTAINER_ID_FLAG, "container id").required(),
        ExpFlag::valued(CONTAINER_RUNTIME_FLAG, "container runtime, support docker, containerd and fire, default value is docker"),
        ExpFlag::valued(ENDPOINT_FLAG, "container runtime endpoint, the unix socket or fire state directory"),
    ]
}

pub fn new_container_command_spec(resolver: Arc<dyn ClientResolver>) -> Result<CommandSpec> {
    CommandSpec::new(
        "container",
        "Execute a container experiment",
        "Execute a container experiment.",
        vec![new_remove_action_spec(resolver)?],
        vec![],
    )
}

pub fn new_remove_action_spec(resolver: Arc<dyn ClientResolver>) -> Result<ActionSpec> {
    let mut flags = container_flags();
    flags.push(ExpFlag::no_args(FORCE_FLAG, "force remove"));

    Ok(ActionSpec::new(
        "remove",
        "remove a container",
        flags,
        vec![],
        Arc::new(RemoveActionExecutor::new(resolver)),
    )?
    .with_aliases(&["rm"])
    .with_example(REMOVE_EXAMPLE)
    .with_categories(&[CATEGORY_SYSTEM_CONTAINER]))
}

/// `remove` 动作参数的强类型视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOptions {
    pub container_id: String,
    pub force: bool,
}

impl RemoveOptions {
    /// 不校验 container-id, 交给运行时报告错误
    pub fn from_model(model: &ExpModel) -> Self {
        Self {
            container_id: model.action_flag(CONTAINER_ID_FLAG).unwrap_or_default().to_string(),
            force: judge_force(model.action_flag(FORCE_FLAG)),
        }
    }
}

/// 非空即视为强制删除
fn judge_force(flag: Option<&str>) -> bool {
    flag.map_or(false, |v| !v.is_empty())
}

pub struct RemoveActionExecutor {
    resolver: Arc<dyn ClientResolver>,
}

impl RemoveActionExecutor {
    pub fn new(resolver: Arc<dyn ClientResolver>) -> Self {
        Self { resolver }
    }

    fn fail(code: Code, stage: &str, err: BlazeError) -> Response {
        error!("{}", code.sprintf(stage, &err));
        Response::fail(code, stage, err)
    }
}

#[async_trait]
impl ActionExecutor for RemoveActionExecutor {
    fn name(&self) -> &str {
        "remove"
    }

    async fn exec(&self, uid: &str, ctx: &ExecContext, model: &ExpModel) -> Response {
        // 删除的容器无法恢复, 回滚直接视为成功
        if ctx.is_destroy() {
            return Response::success(uid);
        }

        let client = match self.resolver.resolve(model) {
            Ok(client) => client,
            Err(e) => return Self::fail(Code::ClientResolutionFailed, "GetClient", e),
        };

        let opts = RemoveOptions::from_model(model);
        info!("[{}] 删除容器: {}, force: {}", uid, opts.container_id, opts.force);

        let result = tokio::select! {
            result = client.remove_container(ctx, &opts.container_id, opts.force) => result,
            _ = ctx.cancelled() => Err(BlazeError::Cancelled),
        };
        if let Err(e) = result {
            return Self::fail(Code::ContainerOperationFailed, "ContainerRemove", e);
        }

        Response::success(uid)
    }
}
