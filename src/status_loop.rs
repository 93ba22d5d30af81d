// The cooperative poll side. One tick drains the store's markers in a fixed
// order, applies debounce against the last emitted values and pushes status
// events to the sinks. The order matters: promotion has to finalize the
// confirmed identity before anything else in the same tick reports on it.

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::clock::TickClock;
use crate::config::BridgeConfig;
use crate::shared_state::{MetadataKind, PlaybackState, SharedState};
use crate::status_sink::{SinkSet, StatusEvent};
use crate::text::MetadataText;

/// Transport-side volume command, answered by the Bluetooth stack wiring.
pub trait VolumeControl {
    fn set_volume(&mut self, level: u8) -> Result<()>;
}

/// Drives one status tick per invocation of [`StatusLoop::tick`].
///
/// Runs on a single logical thread with no internal suspension; all shared
/// data is read through the store's drain operations.
pub struct StatusLoop<C: TickClock, V: VolumeControl> {
    state: Arc<SharedState>,
    clock: C,
    volume: V,
    sinks: SinkSet,
    volume_level: u8,
    last_title: MetadataText,
    last_artist: MetadataText,
}

impl<C: TickClock, V: VolumeControl> StatusLoop<C, V> {
    pub fn new(
        state: Arc<SharedState>,
        clock: C,
        volume: V,
        sinks: SinkSet,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            state,
            clock,
            volume,
            sinks,
            volume_level: config.volume_level,
            last_title: MetadataText::new(),
            last_artist: MetadataText::new(),
        }
    }

    /// One pass over all pending work.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        // 1. Promote a pending connection and report the committed identity.
        if let Some(identity) = self.state.take_connection_promotion() {
            info!("link up: {} ({})", identity.name, identity.address);
            self.sinks.broadcast(&StatusEvent::Connected);
            if !identity.address.is_empty() {
                self.sinks
                    .broadcast(&StatusEvent::DeviceAddress(identity.address));
            }
            if !identity.name.is_empty() {
                self.sinks.broadcast(&StatusEvent::DeviceName(identity.name));
            }
        }

        // 2. Deferred volume action.
        if self.state.poll_volume_timer(now) {
            if let Err(e) = self.volume.set_volume(self.volume_level) {
                warn!("volume set failed: {:#}", e);
            }
            self.sinks.broadcast(&StatusEvent::VolumeSet);
        }

        // 3. Disconnection report. The debounce caches belong to this side
        // of the bridge, so they reset here rather than in the producer.
        if self.state.take_disconnection() {
            info!("link down");
            self.last_title.clear();
            self.last_artist.clear();
            self.sinks.broadcast(&StatusEvent::Disconnected);
        }

        // 4. Playback state report.
        if let Some(playback) = self.state.take_playback() {
            self.sinks.broadcast(match playback {
                PlaybackState::Started => &StatusEvent::Playing,
                PlaybackState::Stopped => &StatusEvent::Stopped,
            });
        }

        // 5. Metadata reports, artist before title.
        if let Some(artist) = self.state.take_metadata(MetadataKind::Artist) {
            if !artist.is_empty() && artist != self.last_artist {
                self.sinks.broadcast(&StatusEvent::Artist(artist.clone()));
                self.last_artist = artist;
            }
        }
        if let Some(title) = self.state.take_metadata(MetadataKind::Title) {
            if !title.is_empty() && title != self.last_title {
                self.sinks.broadcast(&StatusEvent::Title(title.clone()));
                self.last_title = title;
            }
        }
    }
}
