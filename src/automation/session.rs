// Automation session: one device, explicit app state, simple poll loops
use super::error::{AutomationError, AutomationResult};
use crate::adb::{AppControl, FrameSource, InputDispatcher};
use crate::template_matching::{Frame, MatchMode, Point, Reference, TemplateMatcher};
use serde::Serialize;
use tokio::time::{Duration, Instant, sleep};

#[derive(Debug, Clone)]
pub struct SessionTimings {
    /// Delay between foreground queries
    pub poll_interval: Duration,
    /// How long one foreground wait lasts before relaunching
    pub foreground_timeout: Duration,
    /// Pause after an app first reaches the foreground
    pub settle_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            foreground_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TapOutcome {
    Tapped {
        reference: String,
        point: Point,
        score: f32,
    },
    NotDetected,
}

/// Context object passed through automation steps in place of a global
/// device handle and "is running" flag
pub struct Session<D> {
    device: D,
    app_running: bool,
    timings: SessionTimings,
}

impl<D> Session<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            app_running: false,
            timings: SessionTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_app_running(&self) -> bool {
        self.app_running
    }
}

impl<D: FrameSource> Session<D> {
    /// Capture a screenshot and downscale it by `frame_scale`
    pub async fn capture_frame(&self, frame_scale: f32) -> AutomationResult<Frame> {
        let capture = self.device.screen_capture().await?;
        log::debug!(
            "📸 Captured {} bytes in {}ms",
            capture.bytes.len(),
            capture.duration_ms
        );
        let frame = Frame::from_encoded(&capture.bytes)?;
        Ok(frame.resized(frame_scale)?)
    }
}

impl<D: FrameSource + InputDispatcher> Session<D> {
    /// Capture, search each reference in order with first-match scale walk,
    /// and tap the center of the first match found
    pub async fn detect_and_tap(
        &self,
        matcher: &TemplateMatcher,
        references: &[Reference],
    ) -> AutomationResult<TapOutcome> {
        let frame = self.capture_frame(matcher.config().frame_scale).await?;

        for reference in references {
            let matches = matcher.find_with_mode(&frame, reference, MatchMode::FirstMatch);
            let Some(found) = matches.first() else {
                continue;
            };

            let point = TemplateMatcher::tap_point(&frame, found);
            log::info!(
                "👆 Tapping {} at {} (frame {}, score {:.3})",
                reference.name(),
                point,
                found.center(),
                found.score
            );
            self.device.tap(point.x, point.y).await?;
            return Ok(TapOutcome::Tapped {
                reference: reference.name().to_string(),
                point,
                score: found.score,
            });
        }

        log::info!("Image not detected.");
        Ok(TapOutcome::NotDetected)
    }
}

impl<D: AppControl> Session<D> {
    /// Poll until `package` owns the focused window or the timeout elapses
    pub async fn wait_for_foreground(&self, package: &str) -> AutomationResult<bool> {
        let deadline = Instant::now() + self.timings.foreground_timeout;
        loop {
            if self.device.foreground_package().await?.as_deref() == Some(package) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.timings.poll_interval).await;
        }
    }

    /// Bring `package` to the foreground, launching it up to `max_launches` times
    pub async fn ensure_app(&mut self, package: &str, max_launches: u32) -> AutomationResult<()> {
        let mut launches = 0;
        loop {
            if self.wait_for_foreground(package).await? {
                if !self.app_running {
                    log::info!("✅ {package} is in the foreground, letting it settle");
                    sleep(self.timings.settle_delay).await;
                }
                self.app_running = true;
                return Ok(());
            }

            self.app_running = false;
            if launches == max_launches {
                return Err(AutomationError::AppNotForeground {
                    package: package.to_string(),
                    attempts: launches,
                });
            }
            launches += 1;
            log::warn!("⏳ {package} not in the foreground, launching ({launches}/{max_launches})");
            self.device.launch_app(package).await?;
        }
    }
}

impl<D: AppControl + InputDispatcher> Session<D> {
    /// Go home and swipe up to open the app drawer
    pub async fn open_app_drawer(&self) -> AutomationResult<()> {
        self.device.press_home().await?;
        let (width, height) = self.device.screen_dimensions();
        let x = width / 2;
        let start_y = height * 85 / 100;
        let end_y = height * 40 / 100;
        self.device.swipe(x, start_y, x, end_y, Some(100)).await?;
        Ok(())
    }
}
