//! Device checks run once after connecting, before the bot loop starts

use crate::adb::{AdbDevice, GAME_PACKAGE};
use crate::catalog::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::config::BotConfig;
use crate::error::{BotError, BotResult};
use std::cmp::Ordering;

pub const TARGET_DENSITY: u32 = 240;
/// Devices below this run the client too slowly for the pacing constants
pub const MIN_MEMORY_KB: u64 = 4_000_000;

/// Prepare the device: screen geometry, game package and client version.
///
/// Fatal when the game is missing or older than `min_client_version`.
pub async fn run(device: &mut AdbDevice, config: &BotConfig) -> BotResult<()> {
    let size = device.screen_size().await?;
    if size != (SCREEN_WIDTH, SCREEN_HEIGHT) {
        log::info!(
            "📐 Screen is {}x{}, switching to {SCREEN_WIDTH}x{SCREEN_HEIGHT}",
            size.0,
            size.1
        );
        device.set_screen_size(SCREEN_WIDTH, SCREEN_HEIGHT).await?;
    }

    if device.screen_density().await? != Some(TARGET_DENSITY) {
        log::info!("📐 Setting screen density to {TARGET_DENSITY}");
        device.set_screen_density(TARGET_DENSITY).await?;
    }

    match device.memory_kb().await? {
        Some(kb) if kb < MIN_MEMORY_KB => log::warn!(
            "⚠️ Device has {} MB of memory, the game may run slowly with less than 4 GB",
            kb / 1024
        ),
        Some(_) => {}
        None => log::debug!("Could not read device memory"),
    }

    let package = resolve_package(device.installed_packages(GAME_PACKAGE).await?)?;
    device.set_package(package);

    let installed = match &config.min_client_version {
        Some(_) => device.package_version(device.package()).await?,
        None => None,
    };
    match check_client_version(config.min_client_version.as_deref(), installed)? {
        ClientVersion::Unchecked => {
            log::info!("🎮 No min_client_version configured, skipping the client version check")
        }
        ClientVersion::Unknown => {
            log::warn!("⚠️ Could not determine the installed game client version")
        }
        ClientVersion::Supported(installed) => log::info!("🎮 Game client version {installed}"),
    }

    Ok(())
}

/// Pick the game package from `pm list packages` matches
pub fn resolve_package(packages: Vec<String>) -> BotResult<String> {
    let Some(first) = packages.first().cloned() else {
        return Err(BotError::AppNotInstalled {
            package: GAME_PACKAGE.to_string(),
        });
    };
    if packages.len() > 1 {
        log::warn!("⚠️ More than one game package is installed ({packages:?}), using '{first}'");
    }
    if first != GAME_PACKAGE {
        log::warn!("⚠️ Expected package '{GAME_PACKAGE}' but found '{first}', using it instead");
    }
    Ok(first)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClientVersion {
    /// No minimum configured
    Unchecked,
    /// Minimum configured but the device did not report a version
    Unknown,
    Supported(String),
}

/// Compare the installed client against the configured minimum
pub fn check_client_version(
    required: Option<&str>,
    installed: Option<String>,
) -> BotResult<ClientVersion> {
    let Some(required) = required else {
        return Ok(ClientVersion::Unchecked);
    };
    match installed {
        Some(installed) if is_version_newer(required, &installed) => {
            Err(BotError::OutdatedClient {
                installed,
                required: required.to_string(),
            })
        }
        Some(installed) => Ok(ClientVersion::Supported(installed)),
        None => Ok(ClientVersion::Unknown),
    }
}

/// True when `candidate` is a later dotted version than `current`.
/// Components compare numerically; missing components count as zero.
pub fn is_version_newer(candidate: &str, current: &str) -> bool {
    fn parts(version: &str) -> Vec<u64> {
        version
            .trim()
            .split(['.', '-'])
            .map(|p| {
                p.chars()
                    .take_while(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .collect()
    }

    let (a, b) = (parts(candidate), parts(current));
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }
    false
}
