//! Continuous background capture
//!
//! A tokio task captures frames on a fixed interval and publishes the newest one on a
//! `watch` channel. Consumers wait for a frame taken after their request, and a stream
//! that stops producing within the freshness window is restarted.

use super::error::AdbResult;
use super::types::GameDevice;
use crate::vision::Frame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long `stop` waits for the capture task before aborting it
pub const STOP_GRACE: Duration = Duration::from_secs(5);

pub struct FrameStream<D> {
    device: Arc<D>,
    interval: Duration,
    freshness: Duration,
    stop: Arc<AtomicBool>,
    frame_rx: watch::Receiver<Option<Frame>>,
    task: Option<JoinHandle<()>>,
    restarts: u32,
}

impl<D: GameDevice> FrameStream<D> {
    pub fn start(device: Arc<D>, interval: Duration, freshness: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (frame_rx, task) = Self::spawn(Arc::clone(&device), interval, Arc::clone(&stop));
        log::info!("🎞️ Frame stream started ({}ms interval)", interval.as_millis());
        Self {
            device,
            interval,
            freshness,
            stop,
            frame_rx,
            task: Some(task),
            restarts: 0,
        }
    }

    fn spawn(
        device: Arc<D>,
        interval: Duration,
        stop: Arc<AtomicBool>,
    ) -> (watch::Receiver<Option<Frame>>, JoinHandle<()>) {
        let (frame_tx, frame_rx) = watch::channel::<Option<Frame>>(None);
        let task = tokio::spawn(async move {
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                match device.capture_frame().await {
                    Ok(Some(frame)) => {
                        if frame_tx.send(Some(frame)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("⚠️ Frame stream capture failed: {e}"),
                }
                tokio::time::sleep(interval).await;
            }
            log::debug!("🛑 Frame stream task ended");
        });
        (frame_rx, task)
    }

    /// Number of times the capture task was replaced after going stale
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Wait for a frame captured after this call. Gives up once the freshness window passes,
    /// restarting the capture task.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        let requested = Instant::now();
        let rx = &mut self.frame_rx;
        let wait = async {
            loop {
                let latest = rx.borrow_and_update().clone();
                if let Some(frame) = latest
                    && frame.captured_at >= requested
                {
                    return Some(frame);
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        };

        let outcome = tokio::time::timeout(self.freshness, wait).await;
        match outcome {
            Ok(Some(frame)) => Some(frame),
            _ => {
                log::warn!(
                    "⚠️ No fresh frame within {}s, restarting the frame stream",
                    self.freshness.as_secs()
                );
                self.restart();
                None
            }
        }
    }

    fn restart(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.stop = Arc::new(AtomicBool::new(false));
        let (frame_rx, task) =
            Self::spawn(Arc::clone(&self.device), self.interval, Arc::clone(&self.stop));
        self.frame_rx = frame_rx;
        self.task = Some(task);
        self.restarts += 1;
    }

    /// Set the stop flag, then give the task a bounded grace period to finish
    pub async fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(mut task) = self.task.take() else {
            return;
        };
        match tokio::time::timeout(STOP_GRACE, &mut task).await {
            Ok(_) => log::info!("🛑 Frame stream stopped"),
            Err(_) => {
                log::warn!("⚠️ Frame stream did not stop within {STOP_GRACE:?}, aborting it");
                task.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

/// Where the loops get their frames from
pub enum FrameSource<D> {
    /// One capture round trip per request
    Direct(Arc<D>),
    Stream(FrameStream<D>),
}

impl<D: GameDevice> FrameSource<D> {
    pub async fn capture(&mut self) -> AdbResult<Option<Frame>> {
        match self {
            FrameSource::Direct(device) => device.capture_frame().await,
            FrameSource::Stream(stream) => Ok(stream.next_frame().await),
        }
    }

    pub async fn shutdown(&mut self) {
        if let FrameSource::Stream(stream) = self {
            stream.stop().await;
        }
    }
}
