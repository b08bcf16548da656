use android_ui_match::loader::{FsLoader, ResourceLoader};
use android_ui_match::template_matching::{
    MatchConfig, MatchError, MatchMode, MatchResult, Reference,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 🤖 Android UI automation: find reference images on screen and tap them
#[derive(Debug, Parser)]
#[command(
    name = "android-ui-match",
    version = env!("APP_VERSION_DISPLAY"),
    long_version = concat!(env!("APP_VERSION_DISPLAY"), " (built ", env!("APP_BUILD_YEAR"), ")")
)]
pub struct Args {
    /// Enable debug output for matching
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match references against a saved screenshot
    Match {
        /// Screenshot to search in
        #[arg(long)]
        frame: PathBuf,
        #[command(flatten)]
        references: ReferenceArgs,
        #[command(flatten)]
        tuning: MatchArgs,
        /// Write the screenshot with match boxes drawn to this file
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture the device screen and tap the first reference found
    Tap {
        #[arg(long)]
        device: Option<String>,
        #[command(flatten)]
        references: ReferenceArgs,
        #[command(flatten)]
        tuning: MatchArgs,
    },
    /// Take a screenshot and save it to a file
    Screenshot {
        #[arg(long)]
        device: Option<String>,
        #[arg(long, short, default_value = "cli-screenshot.png")]
        output: PathBuf,
    },
    /// List attached devices
    Devices,
    /// Launch an app and wait until it is in the foreground
    WaitApp {
        #[arg(long)]
        device: Option<String>,
        /// Package name, e.g. com.android.settings
        #[arg(long)]
        package: String,
        /// Maximum number of launch attempts
        #[arg(long, default_value_t = 5)]
        attempts: u32,
    },
    /// Go home and swipe up to open the app drawer
    AppDrawer {
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(Debug, clap::Args)]
pub struct ReferenceArgs {
    /// Reference image to look for (repeatable)
    #[arg(long = "reference", short = 'r', required_unless_present = "reference_dir")]
    pub references: Vec<PathBuf>,
    /// Directory of *.png references
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,
}

impl ReferenceArgs {
    pub fn load(&self) -> MatchResult<Vec<Reference>> {
        let loader = FsLoader;
        let mut loaded = self
            .references
            .iter()
            .map(|path| loader.load_reference(path))
            .collect::<MatchResult<Vec<_>>>()?;
        if let Some(dir) = &self.reference_dir {
            loaded.extend(loader.load_directory(dir)?);
        }
        if loaded.is_empty() {
            return Err(MatchError::invalid_input(
                "references",
                "no reference images to search for",
            ));
        }
        Ok(loaded)
    }
}

#[derive(Debug, clap::Args)]
pub struct MatchArgs {
    /// JSON match configuration; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Minimum correlation score (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f32>,
    /// Comma-separated reference scales, tried in order
    #[arg(long, value_delimiter = ',')]
    pub scales: Option<Vec<f32>>,
    /// exhaustive | first-match
    #[arg(long)]
    pub mode: Option<MatchMode>,
    /// Downscale captured screenshots by this factor before matching
    #[arg(long)]
    pub frame_scale: Option<f32>,
}

impl MatchArgs {
    /// Layer the config file (or `base`) and flag overrides
    pub fn resolve(&self, base: MatchConfig) -> MatchResult<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::from_json_file(path)?,
            None => base,
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(scales) = &self.scales {
            config.scales = scales.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(frame_scale) = self.frame_scale {
            config.frame_scale = frame_scale;
        }
        config.validate()?;
        Ok(config)
    }
}
