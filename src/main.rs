mod args;

use android_ui_match::adb::{AdbShell, FrameSource};
use android_ui_match::automation::{AutomationResult, Session, TapOutcome};
use android_ui_match::loader::FileFrameSource;
use android_ui_match::template_matching::{
    Match, MatchConfig, Point, TemplateMatcher, create_tap_config, overlay,
};
use args::{Args, Command};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;

/// Exit code when every step worked but nothing was detected
const EXIT_NOT_DETECTED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Serialize)]
struct ReportedMatch {
    #[serde(flatten)]
    found: Match,
    center: Point,
    tap: Point,
}

#[derive(Serialize)]
struct ReferenceReport {
    reference: String,
    matches: Vec<ReportedMatch>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("❌ {e}");
            if e.is_invalid_input() {
                log::error!("Check the reference and screenshot files");
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "info,android_ui_match=debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

async fn run(command: Command) -> AutomationResult<ExitCode> {
    match command {
        Command::Match {
            frame,
            references,
            tuning,
            overlay: overlay_path,
            json,
        } => {
            let matcher = TemplateMatcher::new(tuning.resolve(MatchConfig::default())?)?;
            let references = references.load()?;
            let source = FileFrameSource::new(frame);
            log::info!(
                "🔍 Matching {} references against {}",
                references.len(),
                source.path().display()
            );
            let session = Session::new(source);
            let frame = session.capture_frame(matcher.config().frame_scale).await?;

            let mut reports = Vec::with_capacity(references.len());
            for reference in &references {
                let matches = matcher.find(&frame, reference);
                if matches.is_empty() {
                    println!("❌ {}: image not detected", reference.name());
                }
                let reported = matches
                    .into_iter()
                    .map(|found| {
                        let tap = TemplateMatcher::tap_point(&frame, &found);
                        if !json {
                            println!("✅ {} -> tap {}", found.describe(reference.name()), tap);
                        }
                        ReportedMatch {
                            center: found.center(),
                            tap,
                            found,
                        }
                    })
                    .collect();
                reports.push(ReferenceReport {
                    reference: reference.name().to_string(),
                    matches: reported,
                });
            }

            if let Some(path) = overlay_path {
                let all: Vec<Match> = reports
                    .iter()
                    .flat_map(|r| r.matches.iter().map(|m| m.found.clone()))
                    .collect();
                overlay::save_overlay(&frame, &all, path)?;
            }
            if json {
                match serde_json::to_string_pretty(&reports) {
                    Ok(text) => println!("{text}"),
                    Err(e) => log::error!("Failed to serialize report: {e}"),
                }
            }

            let detected = reports.iter().any(|r| !r.matches.is_empty());
            Ok(exit_for(detected))
        }
        Command::Tap {
            device,
            references,
            tuning,
        } => {
            let matcher = TemplateMatcher::new(tuning.resolve(create_tap_config())?)?;
            let references = references.load()?;
            let session = Session::new(AdbShell::connect(device.as_deref()).await?);

            match session.detect_and_tap(&matcher, &references).await? {
                TapOutcome::Tapped {
                    reference,
                    point,
                    score,
                } => {
                    println!("👆 Tapped {reference} at {point} (score {score:.3})");
                    Ok(exit_for(true))
                }
                TapOutcome::NotDetected => {
                    println!("❌ Image not detected.");
                    Ok(exit_for(false))
                }
            }
        }
        Command::Screenshot { device, output } => {
            let client = AdbShell::connect(device.as_deref()).await?;
            let cap = client.screen_capture().await?;
            if let Err(e) = tokio::fs::write(&output, &cap.bytes).await {
                println!("❌ Write failed: {e}");
                return Ok(ExitCode::from(EXIT_ERROR));
            }
            println!(
                "✅ Screenshot from {} ({}ms) saved to {}",
                client.device_name(),
                cap.duration_ms,
                output.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Devices => {
            let devices = AdbShell::list_devices().await?;
            if devices.is_empty() {
                println!("❌ No devices found");
                return Ok(exit_for(false));
            }
            for d in devices {
                println!(
                    "📱 {} (transport_id={})",
                    d.name,
                    d.transport_id.as_deref().unwrap_or("-")
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::WaitApp {
            device,
            package,
            attempts,
        } => {
            let mut session = Session::new(AdbShell::connect(device.as_deref()).await?);
            session.ensure_app(&package, attempts).await?;
            println!("✅ {package} is running");
            Ok(ExitCode::SUCCESS)
        }
        Command::AppDrawer { device } => {
            let session = Session::new(AdbShell::connect(device.as_deref()).await?);
            session.open_app_drawer().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_for(detected: bool) -> ExitCode {
    if detected {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NOT_DETECTED)
    }
}
