// Tests for the automation session against a scripted device

use super::{AutomationError, Session, SessionTimings, TapOutcome};
use crate::adb::{AdbResult, AppControl, FrameSource, InputDispatcher};
use crate::template_matching::{Frame, MatchConfig, Point, Reference, TemplateMatcher};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct MockDevice {
    screenshot: Vec<u8>,
    screen: (u32, u32),
    foreground: Mutex<Option<String>>,
    launch_brings_foreground: bool,
    launches: Mutex<Vec<String>>,
    taps: Mutex<Vec<(u32, u32)>>,
    swipes: Mutex<Vec<(u32, u32, u32, u32, Option<u32>)>>,
    home_presses: Mutex<u32>,
}

impl FrameSource for MockDevice {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        Ok(self.screenshot.clone())
    }
}

impl InputDispatcher for MockDevice {
    async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        self.taps.lock().unwrap().push((x, y));
        Ok(())
    }

    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration_ms: Option<u32>,
    ) -> AdbResult<()> {
        self.swipes
            .lock()
            .unwrap()
            .push((x1, y1, x2, y2, duration_ms));
        Ok(())
    }
}

impl AppControl for MockDevice {
    fn screen_dimensions(&self) -> (u32, u32) {
        self.screen
    }

    async fn foreground_package(&self) -> AdbResult<Option<String>> {
        Ok(self.foreground.lock().unwrap().clone())
    }

    async fn launch_app(&self, package: &str) -> AdbResult<()> {
        self.launches.lock().unwrap().push(package.to_string());
        if self.launch_brings_foreground {
            *self.foreground.lock().unwrap() = Some(package.to_string());
        }
        Ok(())
    }

    async fn press_home(&self) -> AdbResult<()> {
        *self.home_presses.lock().unwrap() += 1;
        Ok(())
    }
}

fn fast_timings() -> SessionTimings {
    SessionTimings {
        poll_interval: Duration::from_millis(1),
        foreground_timeout: Duration::from_millis(5),
        settle_delay: Duration::from_millis(1),
    }
}

fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| {
        Rgb([rng.random(), rng.random(), rng.random()])
    })
}

fn encode_png(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// ============================================================
// DETECT AND TAP
// ============================================================

#[tokio::test]
async fn test_detect_and_tap_maps_to_device_pixels() {
    let screen = noise(200, 160, 21);
    let small = Frame::new(screen.clone()).unwrap().resized(0.5).unwrap();
    let icon = image::imageops::crop_imm(small.image(), 30, 20, 10, 10).to_image();

    let device = MockDevice {
        screenshot: encode_png(&screen),
        screen: (200, 160),
        ..Default::default()
    };
    let session = Session::new(device).with_timings(fast_timings());
    let matcher = TemplateMatcher::new(MatchConfig {
        threshold: 0.9,
        frame_scale: 0.5,
        ..MatchConfig::default()
    })
    .unwrap();
    let references = vec![
        Reference::new("absent", RgbImage::from_pixel(6, 6, Rgb([9, 9, 9]))).unwrap(),
        Reference::new("icon", icon).unwrap(),
    ];

    let outcome = session.detect_and_tap(&matcher, &references).await.unwrap();

    match outcome {
        TapOutcome::Tapped {
            reference,
            point,
            score,
        } => {
            assert_eq!(reference, "icon");
            assert_eq!(point, Point::new(70, 50));
            assert!(score > 0.999);
        }
        TapOutcome::NotDetected => panic!("icon should be detected"),
    }
    assert_eq!(*session.device().taps.lock().unwrap(), vec![(70, 50)]);
}

#[tokio::test]
async fn test_detect_and_tap_not_detected_does_not_tap() {
    let device = MockDevice {
        screenshot: encode_png(&noise(64, 64, 22)),
        screen: (64, 64),
        ..Default::default()
    };
    let session = Session::new(device);
    let references =
        vec![Reference::new("solid", RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]))).unwrap()];

    let outcome = session
        .detect_and_tap(&TemplateMatcher::default(), &references)
        .await
        .unwrap();

    assert_eq!(outcome, TapOutcome::NotDetected);
    assert!(session.device().taps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_detect_and_tap_bad_screenshot_is_invalid_input() {
    let device = MockDevice {
        screenshot: b"\x89PNG truncated".to_vec(),
        ..Default::default()
    };
    let session = Session::new(device);
    let references = vec![Reference::new("any", RgbImage::new(2, 2)).unwrap()];

    let err = session
        .detect_and_tap(&TemplateMatcher::default(), &references)
        .await
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert!(session.device().taps.lock().unwrap().is_empty());
}

// ============================================================
// APP FOREGROUND POLLING
// ============================================================

#[tokio::test]
async fn test_ensure_app_already_running() {
    let device = MockDevice {
        foreground: Mutex::new(Some("com.android.settings".to_string())),
        ..Default::default()
    };
    let mut session = Session::new(device).with_timings(fast_timings());

    session.ensure_app("com.android.settings", 3).await.unwrap();

    assert!(session.is_app_running());
    assert!(session.device().launches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ensure_app_launches_when_missing() {
    let device = MockDevice {
        foreground: Mutex::new(Some("com.android.launcher".to_string())),
        launch_brings_foreground: true,
        ..Default::default()
    };
    let mut session = Session::new(device).with_timings(fast_timings());
    assert!(!session.is_app_running());

    session.ensure_app("com.android.settings", 3).await.unwrap();

    assert!(session.is_app_running());
    assert_eq!(
        *session.device().launches.lock().unwrap(),
        vec!["com.android.settings".to_string()]
    );
}

#[tokio::test]
async fn test_ensure_app_gives_up_after_max_launches() {
    let device = MockDevice::default();
    let mut session = Session::new(device).with_timings(fast_timings());

    let err = session.ensure_app("com.example.game", 2).await.unwrap_err();

    match err {
        AutomationError::AppNotForeground { package, attempts } => {
            assert_eq!(package, "com.example.game");
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!session.is_app_running());
    assert_eq!(session.device().launches.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_wait_for_foreground_times_out() {
    let session = Session::new(MockDevice::default()).with_timings(fast_timings());
    assert!(!session.wait_for_foreground("com.example.game").await.unwrap());
}

// ============================================================
// GESTURES
// ============================================================

#[tokio::test]
async fn test_open_app_drawer_swipes_up_from_bottom() {
    let device = MockDevice {
        screen: (1080, 2400),
        ..Default::default()
    };
    let session = Session::new(device);

    session.open_app_drawer().await.unwrap();

    assert_eq!(*session.device().home_presses.lock().unwrap(), 1);
    assert_eq!(
        *session.device().swipes.lock().unwrap(),
        vec![(540, 2040, 540, 960, Some(100))]
    );
}
