//! midir-backed MIDI transport for the surface.
//!
//! Inbound bytes are forwarded from the midir callback thread over an
//! unbounded channel; [`run`] drains that channel into a [`Surface`].
//! Outbound LED feedback goes through [`MidirSink`].

use std::future::Future;
use std::sync::Arc;

use cockpit_core::{MidiMessage, MidiSink, SurfaceError};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::surface::Surface;

/// Output connection shared by every control.
pub struct MidirSink {
    connection: Mutex<MidiOutputConnection>,
}

impl MidiSink for MidirSink {
    fn send(&self, message: MidiMessage) -> Result<(), SurfaceError> {
        self.connection
            .lock()
            .send(&message.to_bytes())
            .map_err(|e| SurfaceError::MidiSend(e.to_string()))
    }
}

/// Port names visible to the MIDI backend.
#[derive(Debug, Clone, Default)]
pub struct PortListing {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Open input and output connections to one surface.
pub struct MidiTransport {
    device_name: String,
    _input: MidiInputConnection<mpsc::UnboundedSender<Vec<u8>>>,
    output: Arc<MidirSink>,
    midi_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MidiTransport {
    /// Connect to the first input and output ports whose name contains
    /// `device_name`.
    pub fn connect(client_name: &str, device_name: &str) -> Result<Self, SurfaceError> {
        let midi_in = MidiInput::new(&format!("{}_in", client_name))
            .map_err(|e| SurfaceError::MidiInit(e.to_string()))?;

        let in_port = midi_in
            .ports()
            .into_iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .map(|name| name.contains(device_name))
                    .unwrap_or(false)
            })
            .ok_or_else(|| SurfaceError::PortNotFound(device_name.to_string()))?;

        let midi_out = MidiOutput::new(&format!("{}_out", client_name))
            .map_err(|e| SurfaceError::MidiInit(e.to_string()))?;

        let out_port = midi_out
            .ports()
            .into_iter()
            .find(|port| {
                midi_out
                    .port_name(port)
                    .map(|name| name.contains(device_name))
                    .unwrap_or(false)
            })
            .ok_or_else(|| SurfaceError::PortNotFound(device_name.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();

        let input = midi_in
            .connect(
                &in_port,
                "cockpit-input",
                move |_timestamp, message, tx| {
                    // Receiver gone means we are shutting down.
                    let _ = tx.send(message.to_vec());
                },
                tx,
            )
            .map_err(|e| SurfaceError::MidiConnect(e.to_string()))?;

        let output = midi_out
            .connect(&out_port, "cockpit-output")
            .map_err(|e| SurfaceError::MidiConnect(e.to_string()))?;

        tracing::info!("Connected to MIDI device '{}'", device_name);

        Ok(Self {
            device_name: device_name.to_string(),
            _input: input,
            output: Arc::new(MidirSink {
                connection: Mutex::new(output),
            }),
            midi_rx: Some(rx),
        })
    }

    /// List the available MIDI ports.
    pub fn list_ports(client_name: &str) -> Result<PortListing, SurfaceError> {
        let midi_in =
            MidiInput::new(client_name).map_err(|e| SurfaceError::MidiInit(e.to_string()))?;
        let midi_out =
            MidiOutput::new(client_name).map_err(|e| SurfaceError::MidiInit(e.to_string()))?;

        Ok(PortListing {
            inputs: midi_in
                .ports()
                .iter()
                .filter_map(|port| midi_in.port_name(port).ok())
                .collect(),
            outputs: midi_out
                .ports()
                .iter()
                .filter_map(|port| midi_out.port_name(port).ok())
                .collect(),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Output handle for [`cockpit_core::ControlContext`].
    pub fn sink(&self) -> Arc<dyn MidiSink> {
        self.output.clone()
    }

    /// Take the inbound byte stream (only once).
    pub fn take_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<u8>>> {
        self.midi_rx.take()
    }
}

/// Feed inbound MIDI into `surface` until `shutdown` resolves or the input
/// closes.
///
/// Each message is handled on the blocking pool, one at a time and in
/// arrival order, since a release may wait for a long-press callback that is
/// still running.
pub async fn run<F>(
    surface: Arc<Surface>,
    mut midi_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tracing::info!("Surface running");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Surface received shutdown");
                break;
            }

            message = midi_rx.recv() => {
                let Some(message) = message else {
                    tracing::warn!("MIDI input closed");
                    break;
                };
                let surface = surface.clone();
                let handled =
                    tokio::task::spawn_blocking(move || surface.handle_midi_message(&message))
                        .await;
                if let Err(e) = handled {
                    tracing::error!("MIDI handler failed: {}", e);
                }
            }
        }
    }
}
