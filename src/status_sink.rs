// Output side of the bridge. The status loop hands fully classified events
// to a set of sinks; each sink owns its own line format. Delivery is
// best-effort per sink: one failing channel never blocks the others.

use std::io::Write;

use anyhow::Result;
use log::warn;
use serde::Serialize;

use crate::text::{AddressText, MetadataText, NameText};

/// A discrete status event emitted by the poll loop.
///
/// Tags are stable; payloads are the bounded text captured at emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum StatusEvent {
    Connected,
    Disconnected,
    DeviceAddress(AddressText),
    DeviceName(NameText),
    Playing,
    Stopped,
    Artist(MetadataText),
    Title(MetadataText),
    VolumeSet,
}

/// A line-oriented status channel.
pub trait StatusSink {
    fn emit(&mut self, event: &StatusEvent) -> Result<()>;
}

/// Broadcast group over any number of channels.
///
/// A sink that returns an error is logged and skipped for that event; it
/// stays registered and gets the next one.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn StatusSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn attach(&mut self, sink: Box<dyn StatusSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn broadcast(&mut self, event: &StatusEvent) {
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.emit(event) {
                warn!("status sink failed to deliver {:?}: {:#}", event, e);
            }
        }
    }
}

/// Debug channel: one `BT:`-prefixed line per event.
pub struct PrefixLineSink<W: Write> {
    out: W,
}

impl<W: Write> PrefixLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StatusSink for PrefixLineSink<W> {
    fn emit(&mut self, event: &StatusEvent) -> Result<()> {
        match event {
            StatusEvent::Connected => writeln!(self.out, "BT:CONNECTED")?,
            StatusEvent::Disconnected => writeln!(self.out, "BT:DISCONNECTED")?,
            StatusEvent::DeviceAddress(addr) => writeln!(self.out, "BT:MAC:{}", addr)?,
            StatusEvent::DeviceName(name) => writeln!(self.out, "BT:NAME:{}", name)?,
            StatusEvent::Playing => writeln!(self.out, "BT:PLAYING")?,
            StatusEvent::Stopped => writeln!(self.out, "BT:STOPPED")?,
            StatusEvent::Artist(artist) => writeln!(self.out, "BT:ARTIST:{}", artist)?,
            StatusEvent::Title(title) => writeln!(self.out, "BT:TITLE:{}", title)?,
            StatusEvent::VolumeSet => writeln!(self.out, "BT:VOLUME:SET")?,
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Machine-telemetry channel: one JSON object per line.
pub struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StatusSink for JsonLineSink<W> {
    fn emit(&mut self, event: &StatusEvent) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
