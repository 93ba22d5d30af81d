// Producer-side entry points. The radio stack invokes these on its own
// execution context, so every method validates its input, writes into the
// shared store and returns; no formatting, no output, no blocking. Binding
// these methods to the stack's callback registration happens outside the
// core.

use std::fmt::Write as _;
use std::sync::Arc;

use log::trace;

use crate::clock::TickClock;
use crate::config::{BridgeConfig, FALLBACK_DEVICE_NAME};
use crate::shared_state::{MetadataKind, PlaybackState, SharedState};
use crate::text::{self, AddressText, PinText};

/// Raw six-byte Bluetooth device address as delivered by the stack.
pub type BdAddr = [u8; 6];

/// Link state reported by the transport's connection callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

/// Audio stream state reported by the transport's audio callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Started,
    Stopped,
    /// Remote paused the stream without tearing the channel down. Reported
    /// as `Stopped` downstream.
    RemoteSuspend,
}

/// AVRCP attribute id carrying the track title.
pub const ATTR_TITLE: u8 = 0x01;
/// AVRCP attribute id carrying the artist name.
pub const ATTR_ARTIST: u8 = 0x02;

/// One method per radio-stack event kind.
///
/// Every entry point tolerates a missing or empty payload without fault.
/// Implementations must be callable from a context that can preempt the
/// status loop at any instruction boundary.
pub trait RadioEvents {
    /// A2DP connection state changed.
    fn connection_state_changed(&self, state: LinkState);

    /// A2DP audio stream state changed.
    fn audio_state_changed(&self, state: AudioState);

    /// AVRCP metadata attribute delivered. Unrecognized ids are ignored.
    fn metadata_updated(&self, attr_id: u8, text: Option<&str>);

    /// Remote device address became known.
    fn device_address_resolved(&self, address: Option<&BdAddr>);

    /// Remote name lookup finished; `None` means the lookup failed.
    fn device_name_resolved(&self, name: Option<&str>);

    /// Legacy pairing requested; must answer synchronously.
    fn pairing_code_requested(&self) -> &str;
}

/// The core's producer half: validates stack events and writes them into the
/// shared store.
pub struct EventBridge<C: TickClock> {
    state: Arc<SharedState>,
    clock: C,
    pin_code: PinText,
    volume_delay_ms: u32,
}

impl<C: TickClock> EventBridge<C> {
    pub fn new(state: Arc<SharedState>, clock: C, config: &BridgeConfig) -> Self {
        Self {
            state,
            clock,
            pin_code: text::bounded(&config.pin_code),
            volume_delay_ms: config.volume_delay_ms,
        }
    }
}

impl<C: TickClock> RadioEvents for EventBridge<C> {
    fn connection_state_changed(&self, state: LinkState) {
        match state {
            LinkState::Connected => {
                self.state
                    .begin_connection(self.clock.now_ms(), self.volume_delay_ms);
            }
            LinkState::Disconnected => {
                if !self.state.complete_disconnection() {
                    trace!("disconnect while not connected, ignored");
                }
            }
            LinkState::Connecting | LinkState::Disconnecting => {
                trace!("transitional link state {:?}, ignored", state);
            }
        }
    }

    fn audio_state_changed(&self, state: AudioState) {
        let playback = match state {
            AudioState::Started => PlaybackState::Started,
            AudioState::Stopped | AudioState::RemoteSuspend => PlaybackState::Stopped,
        };
        self.state.set_playback(playback);
    }

    fn metadata_updated(&self, attr_id: u8, text: Option<&str>) {
        let Some(text) = text else {
            return;
        };

        let kind = match attr_id {
            ATTR_TITLE => MetadataKind::Title,
            ATTR_ARTIST => MetadataKind::Artist,
            _ => {
                trace!("metadata attribute 0x{:02x} ignored", attr_id);
                return;
            }
        };
        self.state.write_metadata(kind, text);
    }

    fn device_address_resolved(&self, address: Option<&BdAddr>) {
        let Some(addr) = address else {
            return;
        };

        let mut formatted = AddressText::new();
        // Exactly 17 bytes, which is the buffer's capacity.
        let _ = write!(
            formatted,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            addr[0], addr[1], addr[2], addr[3], addr[4], addr[5]
        );
        self.state.set_pending_address(&formatted);
    }

    fn device_name_resolved(&self, name: Option<&str>) {
        let name = match name {
            Some(n) if !n.is_empty() => n,
            _ => FALLBACK_DEVICE_NAME,
        };
        self.state.set_pending_name(name);
    }

    fn pairing_code_requested(&self) -> &str {
        self.pin_code.as_str()
    }
}
