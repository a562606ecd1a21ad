mod args;

use args::{Args, Mode};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tft_adb_run::adb::{AdbDevice, FrameSource, FrameStream};
use tft_adb_run::config::{self, BotConfig};
use tft_adb_run::control::BotControl;
use tft_adb_run::engine::{self, Reconnect, Session};
use tft_adb_run::{logging, preflight};
use tft_adb_run::vision::{TemplateLibrary, TemplateProbe};
use tft_adb_run::BotResult;
use tokio::io::{AsyncBufReadExt, BufReader};

const SCREENSHOT_FILE: &str = "cli-screenshot.png";
const LOG_DIR: &str = "logs";

fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };
    // Run logs sit next to the config file; the config itself is read later
    let log_dir = match &args.config_path {
        Some(path) => path.parent().map(|dir| dir.join(LOG_DIR)),
        None => config::default_config_path()
            .ok()
            .and_then(|path| path.parent().map(|dir| dir.join(LOG_DIR))),
    };
    let level_pinned = logging::init(args.debug, log_dir.as_deref());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("❌ Failed to start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args, level_pinned)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, level_pinned: bool) -> BotResult<()> {
    let config_path = match args.config_path {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = config::load(&config_path)?;
    if !level_pinned {
        log::set_max_level(config.log_level);
    }
    log::info!("📄 Using config {}", config_path.display());

    match args.mode {
        Mode::Screenshot => screenshot(&config).await,
        Mode::Bot => run_bot(config).await,
    }
}

async fn screenshot(config: &BotConfig) -> BotResult<()> {
    println!("📸 CLI screenshot...");
    let device = AdbDevice::connect(config.adb_address).await?;
    let png = device.screencap_png().await?;
    tokio::fs::write(SCREENSHOT_FILE, &png).await?;
    println!(
        "✅ Screenshot of {} ({} bytes) saved to {SCREENSHOT_FILE}",
        device.name(),
        png.len()
    );
    Ok(())
}

async fn connect(config: &BotConfig) -> BotResult<Arc<AdbDevice>> {
    let mut device = AdbDevice::connect(config.adb_address).await?;
    preflight::run(&mut device, config).await?;
    Ok(Arc::new(device))
}

/// Fresh connection (preflight included) for the bot loop to resume on
struct DeviceLink<'a> {
    config: &'a BotConfig,
}

impl Reconnect<AdbDevice> for DeviceLink<'_> {
    async fn reconnect(&mut self) -> BotResult<(Arc<AdbDevice>, FrameSource<AdbDevice>)> {
        let device = connect(self.config).await?;
        let frames = frame_source(&device, self.config);
        Ok((device, frames))
    }
}

fn frame_source(device: &Arc<AdbDevice>, config: &BotConfig) -> FrameSource<AdbDevice> {
    if config.use_frame_stream {
        FrameSource::Stream(FrameStream::start(
            device.clone(),
            Duration::from_millis(config.timings.stream_interval),
            config.frame_freshness(),
        ))
    } else {
        FrameSource::Direct(device.clone())
    }
}

/// Feed operator commands typed on stdin into the shared toggles
fn spawn_operator_input(control: BotControl) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if !control.handle_command(&line) {
                log::warn!(
                    "Unknown command '{}', use p (pause) or n (play next game)",
                    line.trim()
                );
            }
        }
    });
}

async fn run_bot(config: BotConfig) -> BotResult<()> {
    let phases = [config.surrender_phase.clone()];
    let library = TemplateLibrary::load_from_directory(
        &config.templates_dir,
        config.game_mode,
        &config.traits,
        &phases,
    )?;
    log::info!(
        "🎮 Mode {}, watching traits {:?}",
        config.game_mode,
        config.traits
    );

    let config = Arc::new(config);
    let control = BotControl::new();
    spawn_operator_input(control.clone());

    let device = connect(&config).await?;
    let frames = frame_source(&device, &config);
    let mut session = Session::new(
        device,
        frames,
        TemplateProbe::new(library),
        config.clone(),
        control,
    );

    let mut link = DeviceLink { config: &config };
    let result = tokio::select! {
        result = engine::run_reconnecting(&mut session, &mut link) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Interrupted, shutting down");
            Ok(())
        }
    };

    session.frames.shutdown().await;
    result
}
