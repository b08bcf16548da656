use super::error::{AdbError, AdbResult};
use super::types::{AppControl, Device, FrameSource, InputDispatcher};
use tokio::process::Command;

/// Device backend driving the `adb` command line tool
pub struct AdbShell {
    pub device: Device,
    pub screen_x: u32,
    pub screen_y: u32,
}

impl AdbShell {
    fn ensure_adb_available() -> AdbResult<()> {
        match std::process::Command::new("adb").arg("version").output() {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(AdbError::command_failed("adb version", &out.stderr)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AdbError::AdbNotFound),
            Err(e) => Err(AdbError::CommandSpawn {
                command: "adb version".to_string(),
                source: e,
            }),
        }
    }

    /// Run `adb <args>` without selecting a device
    async fn run_adb(args: &[&str]) -> AdbResult<Vec<u8>> {
        let command = format!("adb {}", args.join(" "));
        log::debug!("▶️ {command}");
        let output = Command::new("adb")
            .args(args)
            .output()
            .await
            .map_err(|source| AdbError::CommandSpawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(AdbError::command_failed(&command, &output.stderr));
        }
        Ok(output.stdout)
    }

    /// Run `adb -s <serial> <args>` against this device
    async fn run(&self, args: &[&str]) -> AdbResult<Vec<u8>> {
        let mut full = vec!["-s", self.device.name.as_str()];
        full.extend_from_slice(args);
        Self::run_adb(&full).await
    }

    pub async fn list_devices() -> AdbResult<Vec<Device>> {
        Self::ensure_adb_available()?;
        let stdout = Self::run_adb(&["devices", "-l"]).await?;
        Ok(Self::parse_devices(&String::from_utf8_lossy(&stdout)))
    }

    pub fn parse_devices(output: &str) -> Vec<Device> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] == "device" {
                    let name = parts[0].to_string();
                    let transport_id = parts
                        .iter()
                        .find_map(|part| part.strip_prefix("transport_id:"))
                        .map(str::to_string);
                    Some(Device { name, transport_id })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Connect to the named device, or the first attached one
    pub async fn connect(device_name: Option<&str>) -> AdbResult<Self> {
        match device_name {
            Some(name) => Self::new_with_device(name).await,
            None => Self::connect_first().await,
        }
    }

    pub async fn connect_first() -> AdbResult<Self> {
        let devices = Self::list_devices().await?;
        let first = devices.into_iter().next().ok_or(AdbError::NoDevices)?;
        Self::open(first).await
    }

    pub async fn new_with_device(device_name: &str) -> AdbResult<Self> {
        let devices = Self::list_devices().await?;
        let device = devices
            .into_iter()
            .find(|d| d.name == device_name)
            .ok_or_else(|| AdbError::DeviceNotFound {
                name: device_name.to_string(),
            })?;
        Self::open(device).await
    }

    async fn open(device: Device) -> AdbResult<Self> {
        let mut shell = Self {
            device,
            screen_x: 0,
            screen_y: 0,
        };
        let stdout = shell.run(&["shell", "wm", "size"]).await?;
        let (screen_x, screen_y) = Self::parse_screen_size(&String::from_utf8_lossy(&stdout))?;
        shell.screen_x = screen_x;
        shell.screen_y = screen_y;
        log::info!(
            "📱 Connected to {} ({}x{})",
            shell.device.name,
            screen_x,
            screen_y
        );
        Ok(shell)
    }

    /// Parse `wm size` output; an override size wins over the physical size
    pub fn parse_screen_size(stdout: &str) -> AdbResult<(u32, u32)> {
        let parse = |prefix: &str| {
            stdout.lines().find_map(|line| {
                let (x, y) = line.trim().strip_prefix(prefix)?.trim().split_once('x')?;
                Some((x.parse::<u32>().ok()?, y.parse::<u32>().ok()?))
            })
        };
        parse("Override size:")
            .or_else(|| parse("Physical size:"))
            .ok_or(AdbError::ScreenSizeParseFailed)
    }

    /// Extract the package owning the focused window from `dumpsys window`
    pub fn parse_focused_package(dumpsys: &str) -> Option<String> {
        ["mCurrentFocus=", "mFocusedApp="].iter().find_map(|key| {
            dumpsys
                .lines()
                .filter(|line| line.contains(key))
                .find_map(|line| {
                    line.split_whitespace().find_map(|token| {
                        let (package, _) = token.split_once('/')?;
                        let package =
                            package.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
                        (package.contains('.') && !package.contains('='))
                            .then(|| package.to_string())
                    })
                })
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device.name
    }

    fn check_bounds(&self, x: u32, y: u32) -> AdbResult<()> {
        if x >= self.screen_x || y >= self.screen_y {
            return Err(AdbError::OutOfBounds {
                x,
                y,
                width: self.screen_x,
                height: self.screen_y,
            });
        }
        Ok(())
    }
}

impl FrameSource for AdbShell {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        self.run(&["exec-out", "screencap", "-p"]).await
    }
}

impl InputDispatcher for AdbShell {
    async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        self.check_bounds(x, y)?;
        let (x, y) = (x.to_string(), y.to_string());
        self.run(&["shell", "input", "tap", &x, &y]).await?;
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
        for &(x, y) in &[(x1, y1), (x2, y2)] {
            self.check_bounds(x, y)?;
        }
        let mut args: Vec<String> = ["shell", "input", "swipe"]
            .iter()
            .map(|s| s.to_string())
            .chain([x1, y1, x2, y2].iter().map(u32::to_string))
            .collect();
        if let Some(d) = duration_ms {
            args.push(d.to_string());
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).await?;
        Ok(())
    }
}

impl AppControl for AdbShell {
    fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    async fn foreground_package(&self) -> AdbResult<Option<String>> {
        let stdout = self.run(&["shell", "dumpsys", "window"]).await?;
        Ok(Self::parse_focused_package(&String::from_utf8_lossy(
            &stdout,
        )))
    }

    async fn launch_app(&self, package: &str) -> AdbResult<()> {
        log::info!("🚀 Launching {package}");
        self.run(&[
            "shell",
            "monkey",
            "-p",
            package,
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ])
        .await?;
        Ok(())
    }

    async fn press_home(&self) -> AdbResult<()> {
        self.run(&["shell", "input", "keyevent", "KEYCODE_HOME"])
            .await?;
        Ok(())
    }
}
