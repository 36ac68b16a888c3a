use anyhow::{anyhow, Context};
use blaze::config::BlazeConfig;
use blaze::runtime::ClientRegistry;
use blaze::{logger, parser, ExecContext, Mode, Registry};
use clap::{Parser, Subcommand};
use log::info;
use model::Response;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "blaze")]
#[command(about = "Blaze 混沌实验工具")]
#[command(version = "1.0.0")]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a chaos experiment
    Create {
        /// Experiment target, e.g. container
        target: String,
        /// Experiment action, e.g. remove
        action: String,
        /// Action flags, e.g. --container-id a76d53933d3f --force [--timeout 30]
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Destroy (roll back) a chaos experiment
    Destroy {
        /// Experiment target, e.g. container
        target: String,
        /// Experiment action, e.g. remove
        action: String,
        /// Action flags
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List the supported experiments
    List,
}

fn load_config(path: Option<&str>) -> anyhow::Result<BlazeConfig> {
    let config = match path {
        Some(path) => BlazeConfig::load_from_file(path)
            .with_context(|| format!("读取配置文件 {} 失败", path))?,
        None => BlazeConfig::default(),
    };
    config.validate().context("配置校验失败")?;
    Ok(config)
}

async fn execute(
    registry: &Registry,
    mode: Mode,
    target: &str,
    action: &str,
    mut args: Vec<String>,
    default_timeout: Option<u64>,
) -> anyhow::Result<Response> {
    let timeout = parser::take_timeout(&mut args)?.or(default_timeout);
    let (_, spec) = registry
        .find(target, action)
        .ok_or_else(|| anyhow!("不支持的实验: {} {}", target, action))?;
    let model = parser::parse_action_args(target, spec, &args)?;

    let uid = uuid::Uuid::new_v4().simple().to_string();
    let ctx = ExecContext::new(mode).with_value("uid", &uid);
    if let Some(secs) = timeout {
        let token = ctx.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            token.cancel();
        });
    }

    info!("[{}] 执行实验 {} {}, 模式: {:?}", uid, target, spec.name(), mode);
    Ok(spec.executor().exec(&uid, &ctx, &model).await)
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(cli.config.as_deref())?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    logger::init(&level).context("初始化日志失败")?;

    let resolver = Arc::new(ClientRegistry::from_config(&config)?);
    let registry = Registry::with_defaults(resolver).context("注册实验命令失败")?;

    let response = match cli.command {
        Commands::List => {
            let commands: Vec<_> = registry.commands().iter().map(|c| c.as_ref()).collect();
            model::serialize::to_writer(&commands, std::io::stdout())?;
            println!();
            return Ok(true);
        }
        Commands::Create { target, action, args } => {
            execute(&registry, Mode::Apply, &target, &action, args, config.timeout_secs).await?
        }
        Commands::Destroy { target, action, args } => {
            execute(&registry, Mode::Rollback, &target, &action, args, None).await?
        }
    };

    println!("{}", model::serialize::to_string(&response)?);
    Ok(response.is_success())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("错误: {:#}", e);
            process::exit(1);
        }
    }
}
