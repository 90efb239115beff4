use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cockpit_core::{ActiveLayerRegistry, ConfigManager, ControlContext};
use cockpit_xtouch::{MidiTransport, Surface};

mod monitor;

/// Drives an X-Touch Mini as a two-layer cockpit panel.
#[derive(Parser, Debug)]
#[command(name = "cockpit")]
#[command(about = "X-Touch Mini cockpit panel driver")]
struct Args {
    /// Config file (default: config.json in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Substring of the surface's MIDI port name, overrides the config file
    #[arg(long)]
    device: Option<String>,

    /// Long press timeout in seconds, overrides the config file
    #[arg(long)]
    long_press_timeout: Option<f64>,

    /// List MIDI ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ConfigManager::new(args.config);
    let mut settings = config
        .load()
        .with_context(|| format!("loading {}", config.config_path().display()))?;

    if let Some(device) = args.device {
        settings.midi_device = device;
    }
    if let Some(timeout) = args.long_press_timeout {
        settings.long_press_timeout_secs = timeout;
    }
    ConfigManager::validate_settings(&settings)
        .map_err(|errors| anyhow::anyhow!("invalid settings: {}", errors.join(", ")))?;

    if args.list_ports {
        let ports = MidiTransport::list_ports(&settings.client_name)?;
        println!("Inputs:");
        for name in ports.inputs {
            println!("  {}", name);
        }
        println!("Outputs:");
        for name in ports.outputs {
            println!("  {}", name);
        }
        return Ok(());
    }

    let mut transport = MidiTransport::connect(&settings.client_name, &settings.midi_device)?;
    let midi_rx = transport
        .take_receiver()
        .context("MIDI input receiver already taken")?;

    let context = ControlContext::new(
        Arc::new(ActiveLayerRegistry::new()),
        transport.sink(),
        tokio::runtime::Handle::current(),
    );
    let surface = Arc::new(Surface::with_settings(context, &settings));
    monitor::wire(&surface);

    for summary in surface.summaries() {
        log::debug!("{}", summary);
    }

    if settings.refresh_leds_on_start {
        surface.refresh_leds();
    }

    log::info!(
        "Driving '{}' (long press after {}s), ctrl-c to quit",
        transport.device_name(),
        settings.long_press_timeout_secs
    );

    cockpit_xtouch::run(surface, midi_rx, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {}", e);
        }
    })
    .await;

    log::info!("Shutting down");
    Ok(())
}
