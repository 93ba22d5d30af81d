// Host simulation driver. Stands in for the target wiring: a scripted "radio
// stack" on a second thread fires the producer entry points while the main
// thread runs the status loop, with the debug channel on stdout and the
// telemetry channel on stderr. On hardware the same construction order
// applies, with the stack's callback registration bound to `RadioEvents` and
// the audio pipeline configured before the loop starts.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::info;

use btbridge::config::LOOP_DELAY_MS;
use btbridge::{
    AudioState, BridgeConfig, EventBridge, JsonLineSink, LinkState, PrefixLineSink, RadioEvents,
    SinkSet, StatusLoop, StdClock, SharedState, VolumeControl,
};

/// Simulated transport volume command.
struct SimVolume;

impl VolumeControl for SimVolume {
    fn set_volume(&mut self, level: u8) -> Result<()> {
        info!("🔊 transport volume set to {}", level);
        Ok(())
    }
}

/// Scripted remote device session driving the producer entry points.
fn run_radio_script(bridge: EventBridge<Arc<StdClock>>) {
    let pause = |ms: u64| thread::sleep(Duration::from_millis(ms));

    pause(50);
    info!("📡 remote requests pairing, answering {}", bridge.pairing_code_requested());

    bridge.connection_state_changed(LinkState::Connecting);
    bridge.connection_state_changed(LinkState::Connected);
    bridge.device_address_resolved(Some(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
    bridge.device_name_resolved(Some("MyPhone"));

    pause(100);
    bridge.audio_state_changed(AudioState::Started);

    pause(200);
    bridge.metadata_updated(btbridge::radio_events::ATTR_TITLE, Some("Bohemian Rhapsody"));
    bridge.metadata_updated(btbridge::radio_events::ATTR_ARTIST, Some("Queen"));

    // Remote re-announces the same tags; the loop must stay quiet.
    pause(300);
    bridge.metadata_updated(btbridge::radio_events::ATTR_TITLE, Some("Bohemian Rhapsody"));
    bridge.metadata_updated(btbridge::radio_events::ATTR_ARTIST, Some("Queen"));

    // Wait out the volume delay, then change tracks.
    pause(2200);
    bridge.metadata_updated(btbridge::radio_events::ATTR_TITLE, Some("'39"));

    pause(300);
    bridge.audio_state_changed(AudioState::Stopped);
    bridge.connection_state_changed(LinkState::Disconnected);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BridgeConfig::default();
    config.validate()?;

    info!("starting status bridge as '{}'", config.device_name);

    // The audio pipeline is configured once before anything else runs; the
    // bridge never touches it afterwards. Nothing to configure on a host.
    info!("audio pipeline ready (44.1 kHz stereo)");

    let state = Arc::new(SharedState::new());
    let clock = Arc::new(StdClock::new());

    let bridge = EventBridge::new(state.clone(), clock.clone(), &config);

    let mut sinks = SinkSet::new();
    sinks.attach(Box::new(PrefixLineSink::new(std::io::stdout())));
    sinks.attach(Box::new(JsonLineSink::new(std::io::stderr())));

    let mut status = StatusLoop::new(state, clock, SimVolume, sinks, &config);

    info!("bridge ready, pairing code {}", config.pin_code);

    let driver = thread::spawn(move || run_radio_script(bridge));

    while !driver.is_finished() {
        status.tick();
        thread::sleep(Duration::from_millis(LOOP_DELAY_MS));
    }
    driver.join().expect("radio script panicked");

    // Drain whatever the script left behind.
    for _ in 0..4 {
        status.tick();
        thread::sleep(Duration::from_millis(LOOP_DELAY_MS));
    }

    info!("simulation complete");
    Ok(())
}
