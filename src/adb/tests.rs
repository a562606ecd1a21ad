// Tests for the device layer
// Focus: shell output parsing, error classification, frame stream lifecycle

use super::device::{
    focused_package, parse_density, parse_mem_total_kb, parse_packages, parse_screen_size,
    parse_version_name,
};
use super::error::{AdbError, AdbResult};
use super::frame_stream::{FrameSource, FrameStream};
use super::types::GameDevice;
use crate::vision::Frame;
use image::GrayImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

// ============================================================
// SHELL OUTPUT PARSING
// ============================================================

#[test]
fn test_parse_screen_size_prefers_override() {
    assert_eq!(parse_screen_size("Physical size: 1080x2400\n"), Some((1080, 2400)));
    assert_eq!(
        parse_screen_size("Physical size: 1080x2400\nOverride size: 1280x720\n"),
        Some((1280, 720))
    );
    assert_eq!(parse_screen_size("garbage"), None);
}

#[test]
fn test_parse_density() {
    assert_eq!(parse_density("Physical density: 420\n"), Some(420));
    assert_eq!(
        parse_density("Physical density: 420\nOverride density: 240\n"),
        Some(240)
    );
    assert_eq!(parse_density(""), None);
}

#[test]
fn test_parse_mem_total() {
    let meminfo = "MemTotal:        3823412 kB\nMemFree:          123456 kB\n";
    assert_eq!(parse_mem_total_kb(meminfo), Some(3_823_412));
    assert_eq!(parse_mem_total_kb("MemFree: 1 kB"), None);
}

#[test]
fn test_parse_packages_filters_and_keeps_order() {
    let out = "package:com.android.settings\r\npackage:com.riotgames.league.teamfighttactics\npackage:com.riotgames.league.teamfighttacticsbeta\n";
    assert_eq!(
        parse_packages(out, "com.riotgames.league.teamfighttactics"),
        vec![
            "com.riotgames.league.teamfighttactics".to_string(),
            "com.riotgames.league.teamfighttacticsbeta".to_string(),
        ]
    );
    assert!(parse_packages(out, "com.example").is_empty());
}

#[test]
fn test_parse_version_name() {
    let dumpsys = "Packages:\n  Package [x]\n    versionCode=1 minSdk=26\n    versionName=14.12.5939237\n";
    assert_eq!(parse_version_name(dumpsys), Some("14.12.5939237".to_string()));
    assert_eq!(parse_version_name("versionName=\n"), None);
}

#[test]
fn test_focused_package() {
    let dumpsys = "  mFocusedApp=null\n  mCurrentFocus=Window{2c8e1f u0 com.riotgames.league.teamfighttactics/com.riotgames.leagueoflegends.RiotNativeActivity}\n";
    assert_eq!(
        focused_package(dumpsys),
        Some("com.riotgames.league.teamfighttactics")
    );
    assert_eq!(focused_package("  mCurrentFocus=null\n"), None);
}

// ============================================================
// ERROR CLASSIFICATION
// ============================================================

#[test]
fn test_transport_failures() {
    let timeout = AdbError::Timeout {
        duration: Duration::from_secs(10),
        description: "screencap -p".into(),
    };
    assert!(timeout.is_transport_failure());

    let exhausted = AdbError::RetriesExhausted {
        command: "input swipe".into(),
        attempts: 4,
        last: "timed out".into(),
    };
    assert!(exhausted.is_transport_failure());

    assert!(!AdbError::ScreenSizeParseFailed.is_transport_failure());
    assert!(
        !AdbError::ImageDecodeFailed {
            description: "bad png".into()
        }
        .is_transport_failure()
    );
}

// ============================================================
// FRAME STREAM
// ============================================================

/// Produces a new blank frame per capture while `producing` is set
struct CountingDevice {
    captures: AtomicU64,
    producing: AtomicBool,
}

impl CountingDevice {
    fn new(producing: bool) -> Arc<Self> {
        Arc::new(Self {
            captures: AtomicU64::new(0),
            producing: AtomicBool::new(producing),
        })
    }
}

impl GameDevice for CountingDevice {
    async fn capture_frame(&self) -> AdbResult<Option<Frame>> {
        let index = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        if self.producing.load(Ordering::SeqCst) {
            Ok(Some(Frame::new(GrayImage::new(8, 8), index)))
        } else {
            Ok(None)
        }
    }

    async fn click(&self, _x: u32, _y: u32) -> AdbResult<()> {
        Ok(())
    }

    async fn is_app_active(&self) -> AdbResult<bool> {
        Ok(true)
    }

    async fn launch_app(&self) -> AdbResult<()> {
        Ok(())
    }

    async fn go_back(&self) -> AdbResult<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_stream_delivers_frames_newer_than_request() {
    let device = CountingDevice::new(true);
    let mut stream = FrameStream::start(
        device.clone(),
        Duration::from_millis(500),
        Duration::from_secs(15),
    );

    let first = stream.next_frame().await.expect("first frame");
    tokio::time::sleep(Duration::from_secs(2)).await;
    let second = stream.next_frame().await.expect("second frame");

    assert!(second.index > first.index);
    assert!(second.captured_at > first.captured_at);
    assert_eq!(stream.restarts(), 0);

    stream.stop().await;
    assert!(!stream.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_stale_stream_is_restarted() {
    let device = CountingDevice::new(false);
    let mut stream = FrameStream::start(
        device.clone(),
        Duration::from_millis(500),
        Duration::from_secs(15),
    );

    let start = tokio::time::Instant::now();
    assert!(stream.next_frame().await.is_none());
    assert!(start.elapsed() >= Duration::from_secs(15));
    assert_eq!(stream.restarts(), 1);
    assert!(stream.is_running());

    device.producing.store(true, Ordering::SeqCst);
    assert!(stream.next_frame().await.is_some());

    stream.stop().await;
    assert!(!stream.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_direct_source_captures_each_request() {
    let device = CountingDevice::new(true);
    let mut source = FrameSource::Direct(device.clone());
    let a = source.capture().await.unwrap().unwrap();
    let b = source.capture().await.unwrap().unwrap();
    assert_eq!((a.index, b.index), (1, 2));
    source.shutdown().await;
}
