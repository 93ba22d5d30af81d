//! Bridges an asynchronous Bluetooth A2DP/AVRCP sink to a cooperative status
//! loop.
//!
//! The radio stack delivers connection, audio and metadata notifications on
//! its own controller context; this crate synchronizes them into a
//! [`SharedState`] store that a single-threaded [`StatusLoop`] drains once
//! per tick, emitting debounced [`StatusEvent`]s to line-oriented sinks and
//! driving a delayed volume-set command through the transport.
//!
//! The transport itself, the audio pipeline and the output channels are
//! collaborators behind traits ([`RadioEvents`] is implemented by the core
//! for the stack to call; [`VolumeControl`] and [`StatusSink`] are
//! implemented by the platform wiring).

pub mod clock;
pub mod config;
pub mod radio_events;
pub mod shared_state;
pub mod status_loop;
pub mod status_sink;
pub mod text;
pub mod timer;

pub use clock::{StdClock, TickClock};
pub use config::BridgeConfig;
pub use radio_events::{AudioState, BdAddr, EventBridge, LinkState, RadioEvents};
pub use shared_state::{
    ConnectionState, DeviceIdentity, MetadataKind, PlaybackState, SharedState,
};
pub use status_loop::{StatusLoop, VolumeControl};
pub use status_sink::{JsonLineSink, PrefixLineSink, SinkSet, StatusEvent, StatusSink};
pub use timer::OneShotTimer;
