// Device capability traits and shared types
use super::error::AdbResult;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ImageCapture {
    /// Encoded screenshot (PNG from `screencap -p`)
    pub bytes: Vec<u8>,
    pub duration_ms: u128,
}

// Source of screen rasters (device screenshot, saved file)
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    // Raw backend-specific capture
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>>;

    // Default high-level capture with timing
    async fn screen_capture(&self) -> AdbResult<ImageCapture> {
        let start = std::time::Instant::now();
        let bytes = self.screen_capture_bytes().await?;
        Ok(ImageCapture {
            bytes,
            duration_ms: start.elapsed().as_millis(),
        })
    }
}

// Touch input on the device
#[allow(async_fn_in_trait)]
pub trait InputDispatcher {
    async fn tap(&self, x: u32, y: u32) -> AdbResult<()>;
    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration_ms: Option<u32>,
    ) -> AdbResult<()>;
}

// App lifecycle queries used by the automation poll loop
#[allow(async_fn_in_trait)]
pub trait AppControl {
    fn screen_dimensions(&self) -> (u32, u32);
    async fn foreground_package(&self) -> AdbResult<Option<String>>;
    async fn launch_app(&self, package: &str) -> AdbResult<()>;
    async fn press_home(&self) -> AdbResult<()>;
}

#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
}
