// https://crates.io/crates/adb_client
use super::error::{AdbError, AdbResult};
use super::types::{GAME_ACTIVITY, GAME_PACKAGE, GameDevice};
use crate::vision::Frame;
use adb_client::{ADBDeviceExt, ADBServer, ADBServerDevice};
use rand::Rng;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Attempts after the first one before a shell command is given up
pub const SHELL_RETRIES: u32 = 3;
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// A phone reached through the local adb server
pub struct AdbDevice {
    name: String,
    server_device: Arc<Mutex<ADBServerDevice>>,
    package: String,
    capture_count: AtomicU64,
    command_timeout: Duration,
}

impl AdbDevice {
    /// Connect to `address` (adb connect), or to the first device the server knows about
    pub async fn connect(address: Option<SocketAddrV4>) -> AdbResult<Self> {
        let target = address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "first available device".to_string());
        log::info!("📱 Connecting to {target}...");

        let open = tokio::task::spawn_blocking(move || {
            let mut server = ADBServer::default();
            match address {
                Some(addr) => {
                    server.connect_device(addr)?;
                    server.get_device_by_name(&addr.to_string())
                }
                None => server.get_device(),
            }
        });

        let server_device = match tokio::time::timeout(CONNECT_TIMEOUT, open).await {
            Ok(joined) => joined?.map_err(|source| AdbError::ConnectionFailed {
                target: target.clone(),
                source,
            })?,
            Err(_) => {
                return Err(AdbError::Timeout {
                    duration: CONNECT_TIMEOUT,
                    description: format!("connecting to {target}"),
                });
            }
        };

        let device = Self {
            name: target,
            server_device: Arc::new(Mutex::new(server_device)),
            package: GAME_PACKAGE.to_string(),
            capture_count: AtomicU64::new(0),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        };
        let (width, height) = device.screen_size().await?;
        log::info!("✅ Connected to {} ({width}x{height})", device.name);
        Ok(device)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package launched and watched for focus
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn set_package(&mut self, package: impl Into<String>) {
        self.package = package.into();
    }

    /// Run one shell command without retrying
    async fn shell_once(&self, args: Vec<String>) -> AdbResult<Vec<u8>> {
        let command = args.join(" ");
        let server_device = Arc::clone(&self.server_device);

        // Wrap the blocking shell_command in spawn_blocking so timeout can work
        let task = tokio::task::spawn_blocking({
            let command = command.clone();
            move || -> AdbResult<Vec<u8>> {
                let mut out: Vec<u8> = Vec::new();
                let mut dev = server_device.blocking_lock();
                let refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
                dev.shell_command(&refs, &mut out)
                    .map_err(|e| AdbError::from_shell_failure(command, e))?;
                Ok(out)
            }
        });

        match tokio::time::timeout(self.command_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AdbError::from(e)),
            Err(_) => Err(AdbError::Timeout {
                duration: self.command_timeout,
                description: command,
            }),
        }
    }

    /// Run a shell command, retrying with an increasing pause (1s, 2s, 3s) before giving up
    pub async fn shell_bytes(&self, args: &[&str]) -> AdbResult<Vec<u8>> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut retries = 0;
        loop {
            match self.shell_once(owned.clone()).await {
                Ok(out) => return Ok(out),
                Err(e) if retries < SHELL_RETRIES => {
                    log::debug!(
                        "🔁 '{}' failed ({e}), retrying {} more times",
                        owned.join(" "),
                        SHELL_RETRIES - retries
                    );
                    tokio::time::sleep(Duration::from_secs(1 + u64::from(retries))).await;
                    retries += 1;
                }
                Err(e) => {
                    return Err(AdbError::RetriesExhausted {
                        command: owned.join(" "),
                        attempts: retries + 1,
                        last: e.to_string(),
                    });
                }
            }
        }
    }

    pub async fn shell(&self, args: &[&str]) -> AdbResult<String> {
        let out = self.shell_bytes(args).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub async fn screen_size(&self) -> AdbResult<(u32, u32)> {
        let out = self.shell(&["wm", "size"]).await?;
        parse_screen_size(&out).ok_or(AdbError::ScreenSizeParseFailed)
    }

    pub async fn set_screen_size(&self, width: u32, height: u32) -> AdbResult<()> {
        self.shell(&["wm", "size", &format!("{width}x{height}")])
            .await
            .map(|_| ())
    }

    pub async fn screen_density(&self) -> AdbResult<Option<u32>> {
        let out = self.shell(&["wm", "density"]).await?;
        Ok(parse_density(&out))
    }

    pub async fn set_screen_density(&self, density: u32) -> AdbResult<()> {
        self.shell(&["wm", "density", &density.to_string()])
            .await
            .map(|_| ())
    }

    /// Total memory in kB, `None` when /proc/meminfo can't be read
    pub async fn memory_kb(&self) -> AdbResult<Option<u64>> {
        let out = self.shell(&["cat", "/proc/meminfo"]).await?;
        Ok(parse_mem_total_kb(&out))
    }

    /// Installed packages whose name contains `filter`
    pub async fn installed_packages(&self, filter: &str) -> AdbResult<Vec<String>> {
        let out = self.shell(&["pm", "list", "packages"]).await?;
        Ok(parse_packages(&out, filter))
    }

    pub async fn package_version(&self, package: &str) -> AdbResult<Option<String>> {
        let out = self.shell(&["dumpsys", "package", package]).await?;
        Ok(parse_version_name(&out))
    }

    /// Raw PNG bytes of the screen
    pub async fn screencap_png(&self) -> AdbResult<Vec<u8>> {
        self.shell_bytes(&["screencap", "-p"]).await
    }
}

impl GameDevice for AdbDevice {
    async fn capture_frame(&self) -> AdbResult<Option<Frame>> {
        let start = std::time::Instant::now();
        let bytes = self.screencap_png().await?;
        if bytes.is_empty() {
            log::warn!("⚠️ Screen capture returned no data");
            return Ok(None);
        }
        match image::load_from_memory(&bytes) {
            Ok(decoded) => {
                let index = self.capture_count.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!(
                    "📸 Capture #{index} in {}ms",
                    start.elapsed().as_millis()
                );
                Ok(Some(Frame::new(decoded.to_luma8(), index)))
            }
            Err(e) => {
                let error = AdbError::ImageDecodeFailed {
                    description: e.to_string(),
                };
                log::warn!("⚠️ {error}");
                Ok(None)
            }
        }
    }

    async fn click(&self, x: u32, y: u32) -> AdbResult<()> {
        // Zero-distance swipe with a human-ish press time
        let press_ms: u32 = rand::thread_rng().gen_range(60..=120);
        let (xs, ys) = (x.to_string(), y.to_string());
        log::debug!("👆 Click ({x},{y}) for {press_ms}ms");
        self.shell(&["input", "swipe", &xs, &ys, &xs, &ys, &press_ms.to_string()])
            .await
            .map(|_| ())
    }

    async fn is_app_active(&self) -> AdbResult<bool> {
        let out = self.shell(&["dumpsys", "window"]).await?;
        Ok(focused_package(&out).is_some_and(|focused| focused == self.package))
    }

    async fn launch_app(&self) -> AdbResult<()> {
        let component = format!("{}/{}", self.package, GAME_ACTIVITY);
        log::info!("🚀 Launching {component}");
        self.shell(&["am", "start", "-n", &component]).await.map(|_| ())
    }

    async fn go_back(&self) -> AdbResult<()> {
        self.shell(&["input", "keyevent", "4"]).await.map(|_| ())
    }
}

/// "Physical size: 1080x2400", with an optional "Override size:" line that wins
pub fn parse_screen_size(output: &str) -> Option<(u32, u32)> {
    let mut size = None;
    for line in output.lines() {
        let value = line
            .strip_prefix("Physical size:")
            .or_else(|| line.strip_prefix("Override size:"));
        if let Some(value) = value {
            let parts: Vec<&str> = value.trim().split('x').collect();
            if parts.len() == 2
                && let (Ok(x), Ok(y)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>())
            {
                size = Some((x, y));
            }
        }
    }
    size
}

/// Last density reported by `wm density` (override beats physical)
pub fn parse_density(output: &str) -> Option<u32> {
    output
        .lines()
        .filter_map(|line| line.rsplit(':').next()?.trim().parse::<u32>().ok())
        .last()
}

pub fn parse_mem_total_kb(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// `package:<name>` lines whose name contains `filter`, in listing order
pub fn parse_packages(output: &str, filter: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .filter(|name| name.contains(filter))
        .map(str::to_string)
        .collect()
}

pub fn parse_version_name(dumpsys: &str) -> Option<String> {
    dumpsys
        .lines()
        .find_map(|line| line.trim().strip_prefix("versionName="))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Package of the focused window from `dumpsys window` output:
/// `mCurrentFocus=Window{2c8e1f u0 com.example/com.example.MainActivity}`
pub fn focused_package(dumpsys: &str) -> Option<&str> {
    let line = dumpsys.lines().find(|line| line.contains("mCurrentFocus"))?;
    line.split_whitespace()
        .find(|token| token.contains('/'))
        .and_then(|component| component.split('/').next())
        .map(|package| package.trim_start_matches('{'))
}
