//! 混沌实验的数据模型: 参数声明、实验模型与结构化的执行结果。

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub mod serialize;

/// 动作可接受的一个参数的声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpFlag {
    pub name: String,
    pub desc: String,
    /// 无参数的标志 (例如 `--force`) 为 `true`
    #[serde(rename = "noArgs")]
    pub no_args: bool,
    pub required: bool,
}

impl ExpFlag {
    pub fn valued(name: &str, desc: &str) -> Self {
        Self {
            name: name.to_string(),
            desc: desc.to_string(),
            no_args: false,
            required: false,
        }
    }

    pub fn no_args(name: &str, desc: &str) -> Self {
        Self {
            name: name.to_string(),
            desc: desc.to_string(),
            no_args: true,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// 一次实验调用解析后的模型
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpModel {
    pub target: String,
    #[serde(rename = "action")]
    pub action_name: String,
    #[serde(rename = "flags", default)]
    pub action_flags: BTreeMap<String, String>,
    #[serde(default)]
    pub matchers: BTreeMap<String, String>,
}

impl ExpModel {
    pub fn new(target: &str, action_name: &str) -> Self {
        Self {
            target: target.to_string(),
            action_name: action_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_flag(mut self, name: &str, value: &str) -> Self {
        self.action_flags.insert(name.to_string(), value.to_string());
        self
    }

    pub fn action_flag(&self, name: &str) -> Option<&str> {
        self.action_flags.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    ClientResolutionFailed,
    ContainerOperationFailed,
}

impl Code {
    pub fn value(&self) -> u32 {
        match self {
            Code::ClientResolutionFailed => 56001,
            Code::ContainerOperationFailed => 56002,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Code::ClientResolutionFailed => "get container client failed",
            Code::ContainerOperationFailed => "container exec failed",
        }
    }

    /// 生成带阶段名的错误信息, 保留原始错误文本。
    pub fn sprintf(&self, stage: &str, cause: impl fmt::Display) -> String {
        format!("`{}`: {}, {}", stage, self.template(), cause)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, self.value())
    }
}

/// 一次动作调用的最终结果
///
/// 只能通过下面的构造函数创建: 成功的结果不带错误, 失败的结果总是
/// 同时带有错误码和错误信息。
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    success: bool,
    code: Option<Code>,
    err: Option<String>,
    result: Option<serde_json::Value>,
}

/// 失败时输出数字错误码 `code` 和错误名 `codeName`, 缺省字段不输出
impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Response", 5)?;
        state.serialize_field("success", &self.success)?;
        match self.code {
            Some(code) => {
                state.serialize_field("code", &code.value())?;
                state.serialize_field("codeName", &code)?;
            }
            None => {
                state.skip_field("code")?;
                state.skip_field("codeName")?;
            }
        }
        match self.err {
            Some(ref err) => state.serialize_field("err", err)?,
            None => state.skip_field("err")?,
        }
        match self.result {
            Some(ref result) => state.serialize_field("result", result)?,
            None => state.skip_field("result")?,
        }
        state.end()
    }
}

impl Response {
    pub fn success(uid: &str) -> Self {
        Self::success_with(serde_json::Value::String(uid.to_string()))
    }

    pub fn success_with(result: serde_json::Value) -> Self {
        Self {
            success: true,
            code: None,
            err: None,
            result: Some(result),
        }
    }

    pub fn fail(code: Code, stage: &str, cause: impl fmt::Display) -> Self {
        Self {
            success: false,
            code: Some(code),
            err: Some(code.sprintf(stage, cause)),
            result: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn code(&self) -> Option<Code> {
        self.code
    }

    pub fn err(&self) -> Option<&str> {
        self.err.as_deref()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serialize::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}
