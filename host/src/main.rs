//! Panel Host - 无窗口运行 panel-runtime
//!
//! 读取配置与参数表，按固定步长运行指定帧数，可选回放文件驱动输入。

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info, warn};

use host::{AppConfig, HostApp, ReplayScript, load_params};

/// 面板拼图游戏的无窗口宿主
#[derive(Parser, Debug)]
#[command(name = "panel-host")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 运行的帧数（覆盖配置文件）
    #[arg(short, long)]
    frames: Option<u64>,

    /// 帧率（覆盖配置文件）
    #[arg(long)]
    fps: Option<u32>,

    /// 回放文件（覆盖配置文件）
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// 日志级别：trace/debug/info/warn/error（覆盖配置文件）
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(replay) = &self.replay {
            config.replay = Some(replay.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志级别可能来自配置文件，先读配置，初始化日志后再报告读取结果
    let loaded = AppConfig::read(&cli.config);
    let mut config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => AppConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("无效的日志级别: {}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match loaded {
        Ok(Some(_)) => info!(path = ?cli.config, "配置文件加载成功"),
        Ok(None) => warn!(path = ?cli.config, "配置文件不存在，使用默认配置"),
        Err(e) => warn!(path = ?cli.config, error = %e, "配置文件无效，使用默认配置"),
    }

    let params = load_params(config.params_path.as_deref())?;
    let replay = config
        .replay
        .as_ref()
        .map(ReplayScript::load)
        .transpose()
        .context("无法加载回放文件")?;

    let mut app = HostApp::new(&config, params, replay);
    let summary = app.run(config.frames);

    if summary.replay_remaining > 0 {
        warn!(remaining = summary.replay_remaining, "回放未执行完");
    }
    let archive = app.archive();
    info!(
        startup = archive.record::<u32>("startup-times"),
        plays = archive.record::<u32>("play-times"),
        saved = archive.is_saved(),
        "存档状态"
    );
    Ok(())
}
