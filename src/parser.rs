//! 将命令行中的动作参数按照参数声明解析成 [`ExpModel`]。
//!
//! 无参数的标志 (例如 `--force`) 出现即记为 `"true"`。

use crate::commands::ActionSpec;
use crate::errors::{BlazeError, Result};
use model::{ExpFlag, ExpModel};

enum Slot {
    Action,
    Matcher,
}

fn lookup<'a>(spec: &'a ActionSpec, name: &str) -> Option<(&'a ExpFlag, Slot)> {
    spec.flags()
        .iter()
        .find(|f| f.name == name)
        .map(|f| (f, Slot::Action))
        .or_else(|| spec.matchers().iter().find(|f| f.name == name).map(|f| (f, Slot::Matcher)))
}

/// 取出通用的 `--timeout <秒>` 参数, 其余参数原样保留
pub fn take_timeout(args: &mut Vec<String>) -> Result<Option<u64>> {
    let Some(pos) = args
        .iter()
        .position(|a| a == "--timeout" || a.starts_with("--timeout="))
    else {
        return Ok(None);
    };

    let flag = args.remove(pos);
    let value = match flag.strip_prefix("--timeout=") {
        Some(value) => value.to_string(),
        None if pos < args.len() => args.remove(pos),
        None => return Err(BlazeError::InvalidArgs("flag --timeout requires a value".to_string())),
    };
    let secs: u64 = value
        .parse()
        .map_err(|_| BlazeError::InvalidArgs(format!("illegal timeout value {:?}", value)))?;
    if secs == 0 {
        return Err(BlazeError::InvalidArgs("timeout must be greater than 0".to_string()));
    }
    Ok(Some(secs))
}

pub fn parse_action_args(target: &str, spec: &ActionSpec, args: &[String]) -> Result<ExpModel> {
    let mut model = ExpModel::new(target, spec.name());
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        let raw = arg.strip_prefix("--").ok_or_else(|| {
            BlazeError::InvalidArgs(format!("unexpected argument {:?}, flags must start with --", arg))
        })?;
        let (name, inline_value) = match raw.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (raw, None),
        };

        let (flag, slot) = lookup(spec, name).ok_or_else(|| {
            BlazeError::InvalidArgs(format!("unknown flag --{} for action {}", name, spec.name()))
        })?;

        let value = if flag.no_args {
            if inline_value.is_some() {
                return Err(BlazeError::InvalidArgs(format!("flag --{} does not take a value", name)));
            }
            "true".to_string()
        } else {
            match inline_value {
                Some(value) => value,
                None => match iter.next_if(|next| !next.starts_with("--")) {
                    Some(value) => value.clone(),
                    None => {
                        return Err(BlazeError::InvalidArgs(format!("flag --{} requires a value", name)))
                    }
                },
            }
        };

        match slot {
            Slot::Action => model.action_flags.insert(flag.name.clone(), value),
            Slot::Matcher => model.matchers.insert(flag.name.clone(), value),
        };
    }

    for flag in spec.flags().iter().chain(spec.matchers().iter()) {
        if flag.required
            && !model.action_flags.contains_key(&flag.name)
            && !model.matchers.contains_key(&flag.name)
        {
            return Err(BlazeError::InvalidArgs(format!("less --{} flag", flag.name)));
        }
    }

    Ok(model)
}
