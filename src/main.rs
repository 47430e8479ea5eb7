mod camera;
mod config;
mod controller;
mod permissions;
mod session;
mod snapshot;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use camera::{CameraSettings, DeviceRegistry, NokhwaRegistry};
use config::Config;
use controller::CameraController;
use session::NokhwaSession;
use snapshot::SnapshotService;
use ui::CamshotApp;

#[derive(Parser)]
#[command(
    name = "camshot",
    about = "Webcam viewer with still-image snapshot capture",
    after_help = "EXAMPLES:
    # Open the viewer with the default camera
    camshot

    # Open a specific camera and save snapshots somewhere else
    camshot --device 1 --output-dir ~/snaps

    # List available cameras
    camshot list-cameras"
)]
struct Cli {
    /// Camera device index to select at startup
    #[arg(long, short = 'd')]
    device: Option<u32>,

    /// Directory for saved snapshots (defaults to the platform pictures directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Disable the mirrored (selfie) preview
    #[arg(long)]
    no_mirror: bool,

    /// Path to a config file (defaults to ~/.config/camshot/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available camera devices
    ListCameras,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    if let Some(Commands::ListCameras) = cli.command {
        return list_cameras();
    }

    let config = Config::load(cli.config.as_deref())?;

    let settings = CameraSettings {
        mirror: config.camera.mirror && !cli.no_mirror,
        ..CameraSettings::default()
    };
    let preferred_device = cli.device.unwrap_or(config.camera.device);
    let output_dir = cli.output_dir.or(config.output.directory);

    let controller = CameraController::new(
        Box::new(NokhwaRegistry),
        Box::new(NokhwaSession::new(settings)),
    )
    .with_preferred_device(preferred_device);
    let snapshots = SnapshotService::new(output_dir);
    let app = CamshotApp::new(controller, snapshots);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native("camshot", options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| format!("Failed to start UI: {}", e))?;

    Ok(())
}

fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = NokhwaRegistry.list_video_inputs()?;

    if devices.is_empty() {
        println!("No cameras found");
        return Ok(());
    }

    println!("Available cameras:");
    for device in &devices {
        println!("  {}", device);
    }
    Ok(())
}
