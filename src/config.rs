// Configuration constants and runtime settings for the status bridge.
// Capacities are compile-time so every text field stays a fixed-size buffer;
// the tunables that a deployment actually changes live in BridgeConfig.

use anyhow::{anyhow, Result};

/// Capacity of the title/artist metadata buffers, in bytes.
pub const METADATA_CAPACITY: usize = 256;

/// Capacity of the remote device name buffer, in bytes.
pub const NAME_CAPACITY: usize = 64;

/// Capacity of the formatted device address ("AA:BB:CC:DD:EE:FF"), in bytes.
pub const ADDRESS_CAPACITY: usize = 17;

/// Maximum length of a legacy pairing code, in digits.
pub const PIN_CAPACITY: usize = 16;

/// Name the transport advertises to remote devices.
pub const DEFAULT_DEVICE_NAME: &str = "Radio BT Bridge";

/// Pairing code handed to the stack when a remote requests legacy pairing.
pub const DEFAULT_PIN_CODE: &str = "9876";

/// Delay between a connection and the deferred volume-set action.
pub const DEFAULT_VOLUME_DELAY_MS: u32 = 2000;

/// AVRCP absolute volume applied by the deferred action (0x7f is full scale).
pub const DEFAULT_VOLUME_LEVEL: u8 = 127;

/// Upper bound of the AVRCP absolute volume range.
pub const MAX_VOLUME_LEVEL: u8 = 127;

/// Placeholder stored when the remote name lookup fails or comes back empty.
pub const FALLBACK_DEVICE_NAME: &str = "Unknown";

/// Poll period of the cooperative status loop.
pub const LOOP_DELAY_MS: u64 = 5;

/// Runtime settings consumed by the bridge.
///
/// The core never owns platform wiring; it only reads these values. A caller
/// should `validate()` before starting the poll loop so a bad pairing code is
/// rejected before the transport ever asks for it.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Name advertised by the transport. Not used by the core itself.
    pub device_name: String,
    /// Legacy pairing code, 4 to 16 ASCII digits.
    pub pin_code: String,
    /// Milliseconds between connection and the deferred volume set.
    pub volume_delay_ms: u32,
    /// Absolute volume level applied when the deferred action fires.
    pub volume_level: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            pin_code: DEFAULT_PIN_CODE.to_string(),
            volume_delay_ms: DEFAULT_VOLUME_DELAY_MS,
            volume_level: DEFAULT_VOLUME_LEVEL,
        }
    }
}

impl BridgeConfig {
    /// Validate settings values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() {
            return Err(anyhow!("Device name must not be empty"));
        }

        if self.pin_code.len() < 4 || self.pin_code.len() > PIN_CAPACITY {
            return Err(anyhow!(
                "Pairing code must be between 4 and {} digits",
                PIN_CAPACITY
            ));
        }

        if !self.pin_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(anyhow!("Pairing code must contain only digits"));
        }

        if self.volume_level > MAX_VOLUME_LEVEL {
            return Err(anyhow!(
                "Volume level {} exceeds maximum {}",
                self.volume_level,
                MAX_VOLUME_LEVEL
            ));
        }

        Ok(())
    }
}
