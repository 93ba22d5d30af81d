// End-to-end scenarios driven through the public API: scripted producer
// events, manual clock, recording sink and volume control.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use btbridge::config::FALLBACK_DEVICE_NAME;
use btbridge::radio_events::{ATTR_ARTIST, ATTR_TITLE};
use btbridge::text;
use btbridge::{
    AudioState, BridgeConfig, ConnectionState, EventBridge, LinkState, RadioEvents, SharedState,
    SinkSet, StatusEvent, StatusLoop, StatusSink, TickClock, VolumeControl,
};

/// Clock the test moves by hand.
#[derive(Default)]
struct ManualClock(AtomicU32);

impl ManualClock {
    fn set(&self, now: u32) {
        self.0.store(now, Ordering::SeqCst);
    }

    fn advance(&self, delta: u32) {
        let now = self.0.load(Ordering::SeqCst).wrapping_add(delta);
        self.0.store(now, Ordering::SeqCst);
    }
}

impl TickClock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

struct RecordingSink(Arc<Mutex<Vec<StatusEvent>>>);

impl StatusSink for RecordingSink {
    fn emit(&mut self, event: &StatusEvent) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct RecordingVolume(Arc<Mutex<Vec<u8>>>);

impl VolumeControl for RecordingVolume {
    fn set_volume(&mut self, level: u8) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(level);
        Ok(())
    }
}

struct Harness {
    state: Arc<SharedState>,
    clock: Arc<ManualClock>,
    bridge: EventBridge<Arc<ManualClock>>,
    status: StatusLoop<Arc<ManualClock>, RecordingVolume>,
    events: Arc<Mutex<Vec<StatusEvent>>>,
    volume_calls: Arc<Mutex<Vec<u8>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    fn with_config(config: BridgeConfig) -> Self {
        let state = Arc::new(SharedState::new());
        let clock = Arc::new(ManualClock::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let volume_calls = Arc::new(Mutex::new(Vec::new()));

        let bridge = EventBridge::new(state.clone(), clock.clone(), &config);

        let mut sinks = SinkSet::new();
        sinks.attach(Box::new(RecordingSink(events.clone())));

        let status = StatusLoop::new(
            state.clone(),
            clock.clone(),
            RecordingVolume(volume_calls.clone()),
            sinks,
            &config,
        );

        Self {
            state,
            clock,
            bridge,
            status,
            events,
            volume_calls,
        }
    }

    /// Events emitted since the last drain.
    fn drain(&mut self) -> Vec<StatusEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn connect_with_identity(&self) {
        self.bridge.connection_state_changed(LinkState::Connected);
        self.bridge
            .device_address_resolved(Some(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        self.bridge.device_name_resolved(Some("MyPhone"));
    }
}

#[test]
fn connect_scenario_emits_identity_once_and_arms_timer() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.status.tick();

    assert_eq!(
        h.drain(),
        vec![
            StatusEvent::Connected,
            StatusEvent::DeviceAddress(text::bounded("AA:BB:CC:DD:EE:FF")),
            StatusEvent::DeviceName(text::bounded("MyPhone")),
        ]
    );
    assert_eq!(h.state.connection(), ConnectionState::Connected);
    assert!(h.state.is_volume_timer_armed());

    // Nothing new on the next tick.
    h.status.tick();
    assert!(h.drain().is_empty());
}

#[test]
fn two_connect_events_before_a_tick_emit_once() {
    let mut h = Harness::new();
    h.bridge.connection_state_changed(LinkState::Connected);
    h.bridge.connection_state_changed(LinkState::Connected);
    h.bridge.device_name_resolved(Some("MyPhone"));
    h.status.tick();
    h.status.tick();

    let events = h.drain();
    let connects = events
        .iter()
        .filter(|e| **e == StatusEvent::Connected)
        .count();
    assert_eq!(connects, 1);
}

#[test]
fn identity_fields_are_omitted_when_unresolved() {
    let mut h = Harness::new();
    h.bridge.connection_state_changed(LinkState::Connected);
    h.status.tick();

    assert_eq!(h.drain(), vec![StatusEvent::Connected]);
}

#[test]
fn failed_name_lookup_reports_placeholder() {
    let mut h = Harness::new();
    h.bridge.connection_state_changed(LinkState::Connected);
    h.bridge.device_name_resolved(None);
    h.status.tick();

    assert_eq!(
        h.drain(),
        vec![
            StatusEvent::Connected,
            StatusEvent::DeviceName(text::bounded(FALLBACK_DEVICE_NAME)),
        ]
    );
}

#[test]
fn repeated_artist_is_debounced() {
    let mut h = Harness::new();
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();

    assert_eq!(h.drain(), vec![StatusEvent::Artist(text::bounded("Queen"))]);

    // Re-announced across ticks: still one emission total.
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();
    assert!(h.drain().is_empty());
}

#[test]
fn changed_artist_is_reported_again() {
    let mut h = Harness::new();
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Led Zeppelin"));
    h.status.tick();

    assert_eq!(
        h.drain(),
        vec![
            StatusEvent::Artist(text::bounded("Queen")),
            StatusEvent::Artist(text::bounded("Led Zeppelin")),
        ]
    );
}

#[test]
fn artist_is_reported_before_title_within_a_tick() {
    let mut h = Harness::new();
    h.bridge.metadata_updated(ATTR_TITLE, Some("Bohemian Rhapsody"));
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();

    assert_eq!(
        h.drain(),
        vec![
            StatusEvent::Artist(text::bounded("Queen")),
            StatusEvent::Title(text::bounded("Bohemian Rhapsody")),
        ]
    );
}

#[test]
fn empty_metadata_is_never_emitted() {
    let mut h = Harness::new();
    h.bridge.metadata_updated(ATTR_TITLE, Some(""));
    h.status.tick();
    assert!(h.drain().is_empty());
}

#[test]
fn oversized_metadata_is_truncated_not_dropped() {
    let mut h = Harness::new();
    let long = "x".repeat(1000);
    h.bridge.metadata_updated(ATTR_TITLE, Some(&long));
    h.status.tick();

    let events = h.drain();
    assert_eq!(events.len(), 1);
    match &events[0] {
        StatusEvent::Title(title) => {
            assert_eq!(title.len(), btbridge::config::METADATA_CAPACITY);
            assert!(long.starts_with(title.as_str()));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn playback_transitions_are_reported() {
    let mut h = Harness::new();
    h.bridge.audio_state_changed(AudioState::Started);
    h.status.tick();
    h.bridge.audio_state_changed(AudioState::RemoteSuspend);
    h.status.tick();

    assert_eq!(h.drain(), vec![StatusEvent::Playing, StatusEvent::Stopped]);
}

#[test]
fn volume_fires_once_after_delay() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.status.tick();
    h.drain();

    h.clock.set(1999);
    h.status.tick();
    assert!(h.drain().is_empty());
    assert!(h.volume_calls.lock().unwrap().is_empty());

    h.clock.set(2000);
    h.status.tick();
    assert_eq!(h.drain(), vec![StatusEvent::VolumeSet]);
    assert_eq!(*h.volume_calls.lock().unwrap(), vec![127]);

    // One shot only.
    h.clock.set(10_000);
    h.status.tick();
    assert!(h.drain().is_empty());
    assert_eq!(h.volume_calls.lock().unwrap().len(), 1);
}

#[test]
fn volume_fires_across_clock_wraparound() {
    let mut h = Harness::new();
    h.clock.set(u32::MAX - 500);
    h.connect_with_identity();
    h.status.tick();
    h.drain();

    // Just before the wrap: not due yet.
    h.clock.set(u32::MAX);
    h.status.tick();
    assert!(h.drain().is_empty());

    // Wrapped but still short of now + 2000.
    h.clock.set(1400);
    h.status.tick();
    assert!(h.drain().is_empty());

    h.clock.set(1500);
    h.status.tick();
    assert_eq!(h.drain(), vec![StatusEvent::VolumeSet]);
    assert_eq!(h.volume_calls.lock().unwrap().len(), 1);

    h.clock.set(4000);
    h.status.tick();
    assert!(h.drain().is_empty());
}

#[test]
fn disconnect_before_delay_suppresses_volume_set() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.status.tick();
    h.drain();

    h.clock.set(500);
    h.bridge.connection_state_changed(LinkState::Disconnected);
    h.clock.set(5000);
    h.status.tick();

    assert_eq!(h.drain(), vec![StatusEvent::Disconnected]);
    assert!(h.volume_calls.lock().unwrap().is_empty());
}

#[test]
fn disconnect_resets_everything() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.bridge.audio_state_changed(AudioState::Started);
    h.bridge.metadata_updated(ATTR_TITLE, Some("Song"));
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Band"));
    h.status.tick();
    h.drain();

    h.bridge.connection_state_changed(LinkState::Disconnected);
    h.status.tick();
    assert_eq!(h.drain(), vec![StatusEvent::Disconnected]);

    // No leftovers on later ticks, and the store is back to its initial form.
    h.status.tick();
    assert!(h.drain().is_empty());
    assert_eq!(h.state.connection(), ConnectionState::Disconnected);
    assert!(h.state.confirmed_identity().address.is_empty());
    assert!(!h.state.is_volume_timer_armed());
}

#[test]
fn disconnect_while_not_connected_is_a_no_op() {
    let mut h = Harness::new();
    h.bridge.connection_state_changed(LinkState::Disconnected);
    h.status.tick();
    assert!(h.drain().is_empty());
}

#[test]
fn disconnect_clears_debounce_for_the_next_session() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();
    h.drain();

    h.bridge.connection_state_changed(LinkState::Disconnected);
    h.status.tick();
    h.drain();

    // Same artist in a fresh session must be reported again.
    h.bridge.connection_state_changed(LinkState::Connected);
    h.status.tick();
    h.bridge.metadata_updated(ATTR_ARTIST, Some("Queen"));
    h.status.tick();

    let events = h.drain();
    assert!(events.contains(&StatusEvent::Artist(text::bounded("Queen"))));
}

#[test]
fn reconnect_after_disconnect_commits_fresh_identity() {
    let mut h = Harness::new();
    h.connect_with_identity();
    h.status.tick();
    h.bridge.connection_state_changed(LinkState::Disconnected);
    h.status.tick();
    h.drain();

    h.bridge.connection_state_changed(LinkState::Connected);
    h.bridge
        .device_address_resolved(Some(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]));
    h.bridge.device_name_resolved(Some("OtherPhone"));
    h.status.tick();

    assert_eq!(
        h.drain(),
        vec![
            StatusEvent::Connected,
            StatusEvent::DeviceAddress(text::bounded("11:22:33:44:55:66")),
            StatusEvent::DeviceName(text::bounded("OtherPhone")),
        ]
    );
}

#[test]
fn custom_volume_level_is_applied() {
    let mut h = Harness::with_config(BridgeConfig {
        volume_level: 80,
        volume_delay_ms: 100,
        ..BridgeConfig::default()
    });
    h.connect_with_identity();
    h.status.tick();
    h.drain();

    h.clock.set(100);
    h.status.tick();
    assert_eq!(*h.volume_calls.lock().unwrap(), vec![80]);
}

#[test]
fn racing_metadata_writes_are_never_lost() {
    let state = Arc::new(SharedState::new());
    let clock = Arc::new(ManualClock::default());
    let events = Arc::new(Mutex::new(Vec::new()));
    let config = BridgeConfig::default();

    let bridge = EventBridge::new(state.clone(), clock.clone(), &config);
    let mut sinks = SinkSet::new();
    sinks.attach(Box::new(RecordingSink(events.clone())));
    let mut status = StatusLoop::new(
        state,
        clock,
        RecordingVolume(Arc::new(Mutex::new(Vec::new()))),
        sinks,
        &config,
    );

    let writer = thread::spawn(move || {
        for i in 0..200u32 {
            let value = format!("artist-{}", i);
            bridge.metadata_updated(ATTR_ARTIST, Some(&value));
            if i % 16 == 0 {
                thread::sleep(Duration::from_micros(50));
            }
        }
    });

    while !writer.is_finished() {
        status.tick();
    }
    writer.join().unwrap();

    // Whatever interleaving happened, the final write must surface.
    status.tick();
    status.tick();

    let events = events.lock().unwrap();
    let last_artist = events
        .iter()
        .rev()
        .find_map(|e| match e {
            StatusEvent::Artist(a) => Some(a.as_str().to_string()),
            _ => None,
        })
        .expect("at least one artist event");
    assert_eq!(last_artist, "artist-199");
}
