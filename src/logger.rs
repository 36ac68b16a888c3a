use log::LevelFilter;
use std::io::Write;

/// 初始化日志系统
///
/// 输出格式为 `LEVEL - message`, 写到 stderr。设置了 `RUST_LOG` 时以其为准。
pub fn init(level: &str) -> Result<(), log::SetLoggerError> {
    let filter = parse_level(level).unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(filter)
        .parse_env("RUST_LOG")
        .format(|buf, record| writeln!(buf, "{} - {}", record.level(), record.args()))
        .target(env_logger::Target::Stderr)
        .try_init()
}

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
