use crate::context::ExecContext;
use crate::errors::{BlazeError, Result};
use async_trait::async_trait;
use model::{ExpFlag, ExpModel, Response};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub mod container;

pub const CATEGORY_SYSTEM_CONTAINER: &str = "system_container";

/// 实验动作执行器的通用trait
///
/// `exec` 不会向外抛出错误, 所有结果 (包括失败) 都以 [`Response`] 返回。
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn exec(&self, uid: &str, ctx: &ExecContext, model: &ExpModel) -> Response;
}

/// 一个可寻址的实验动作: 元数据、参数声明和执行器
#[derive(Clone, Serialize)]
pub struct ActionSpec {
    name: String,
    aliases: Vec<String>,
    short_desc: String,
    long_desc: String,
    flags: Vec<ExpFlag>,
    matchers: Vec<ExpFlag>,
    example: String,
    categories: Vec<String>,
    #[serde(skip)]
    executor: Arc<dyn ActionExecutor>,
}

impl ActionSpec {
    /// 参数名在 flags 与 matchers 之间必须唯一
    pub fn new(
        name: &str,
        short_desc: &str,
        flags: Vec<ExpFlag>,
        matchers: Vec<ExpFlag>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(BlazeError::InvalidSpec("动作名称不能为空".to_string()));
        }
        let mut seen = HashSet::new();
        for flag in flags.iter().chain(matchers.iter()) {
            if flag.name.is_empty() {
                return Err(BlazeError::InvalidSpec(format!("动作 {} 存在空的参数名", name)));
            }
            if !seen.insert(flag.name.as_str()) {
                return Err(BlazeError::InvalidSpec(format!(
                    "动作 {} 的参数 {} 重复声明",
                    name, flag.name
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            aliases: Vec::new(),
            short_desc: short_desc.to_string(),
            long_desc: String::new(),
            flags,
            matchers,
            example: String::new(),
            categories: Vec::new(),
            executor,
        })
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_long_desc(mut self, long_desc: &str) -> Self {
        self.long_desc = long_desc.to_string();
        self
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.example = example.to_string();
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn short_desc(&self) -> &str {
        &self.short_desc
    }

    pub fn long_desc(&self) -> &str {
        if self.long_desc.is_empty() {
            &self.short_desc
        } else {
            &self.long_desc
        }
    }

    pub fn flags(&self) -> &[ExpFlag] {
        &self.flags
    }

    pub fn matchers(&self) -> &[ExpFlag] {
        &self.matchers
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn executor(&self) -> &Arc<dyn ActionExecutor> {
        &self.executor
    }

    pub fn matches(&self, name_or_alias: &str) -> bool {
        self.name == name_or_alias || self.aliases.iter().any(|a| a == name_or_alias)
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("executor", &self.executor.name())
            .finish()
    }
}

/// 一个实验领域 (例如 container) 下的全部动作
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    name: String,
    short_desc: String,
    long_desc: String,
    actions: Vec<ActionSpec>,
    flags: Vec<ExpFlag>,
}

impl CommandSpec {
    /// 动作名与别名在同一命令内必须唯一
    pub fn new(
        name: &str,
        short_desc: &str,
        long_desc: &str,
        actions: Vec<ActionSpec>,
        flags: Vec<ExpFlag>,
    ) -> Result<Self> {
        if actions.is_empty() {
            return Err(BlazeError::InvalidSpec(format!("命令 {} 没有任何动作", name)));
        }
        let mut seen = HashSet::new();
        for action in &actions {
            for key in std::iter::once(&action.name).chain(action.aliases.iter()) {
                if !seen.insert(key.as_str()) {
                    return Err(BlazeError::InvalidSpec(format!(
                        "命令 {} 的动作名 {} 重复",
                        name, key
                    )));
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            short_desc: short_desc.to_string(),
            long_desc: long_desc.to_string(),
            actions,
            flags,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_desc(&self) -> &str {
        &self.short_desc
    }

    pub fn long_desc(&self) -> &str {
        &self.long_desc
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn flags(&self) -> &[ExpFlag] {
        &self.flags
    }

    pub fn find_action(&self, name_or_alias: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.matches(name_or_alias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ActionExecutor for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn exec(&self, uid: &str, _ctx: &ExecContext, _model: &ExpModel) -> Response {
            Response::success(uid)
        }
    }

    fn action(name: &str) -> ActionSpec {
        ActionSpec::new(name, "test action", vec![], vec![], Arc::new(Echo)).unwrap()
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        let flags = vec![ExpFlag::no_args("force", "a"), ExpFlag::no_args("force", "b")];
        assert!(ActionSpec::new("remove", "x", flags, vec![], Arc::new(Echo)).is_err());

        let flags = vec![ExpFlag::valued("container-id", "id")];
        let matchers = vec![ExpFlag::valued("container-id", "id")];
        assert!(ActionSpec::new("remove", "x", flags, matchers, Arc::new(Echo)).is_err());
    }

    #[test]
    fn test_long_desc_falls_back_to_short() {
        let spec = action("remove");
        assert_eq!(spec.long_desc(), "test action");
        let spec = spec.with_long_desc("remove a container forcibly");
        assert_eq!(spec.long_desc(), "remove a container forcibly");
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let result = CommandSpec::new("container", "c", "c", vec![action("remove"), action("remove")], vec![]);
        assert!(result.is_err());

        let a = action("remove").with_aliases(&["rm"]);
        let b = action("rm");
        assert!(CommandSpec::new("container", "c", "c", vec![a, b], vec![]).is_err());

        assert!(CommandSpec::new("container", "c", "c", vec![], vec![]).is_err());
    }

    #[test]
    fn test_find_action_by_alias() {
        let command = CommandSpec::new(
            "container",
            "c",
            "c",
            vec![action("remove").with_aliases(&["rm"]), action("stop")],
            vec![],
        )
        .unwrap();
        assert_eq!(command.find_action("rm").unwrap().name(), "remove");
        assert_eq!(command.find_action("stop").unwrap().name(), "stop");
        assert!(command.find_action("kill").is_none());
    }

    #[test]
    fn test_spec_serializes_without_executor() {
        let spec = action("remove").with_categories(&[CATEGORY_SYSTEM_CONTAINER]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], "remove");
        assert_eq!(json["categories"][0], CATEGORY_SYSTEM_CONTAINER);
        assert!(json.get("executor").is_none());
    }
}
