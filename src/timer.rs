//! Timing constants for the poll loop and the DHT11 wire protocol

/// Idle time before every sensor poll. The DHT11 hands back stale or corrupt
/// frames when asked more often than every ~2 s.
pub const SENSOR_DELAY: u32 = 2000;

/// How long the splash screen stays up after power-on
pub const SPLASH_DELAY: u32 = 2000;

/// Host start signal: line held low (ms). The DHT11 wants at least 18 ms.
pub const DHT_START_LOW_MS: u32 = 20;

/// Host release before listening for the response (us)
pub const DHT_START_RELEASE_US: u32 = 30;

/// Upper bound on any single level while waiting on the sensor (us)
pub const DHT_LEVEL_TIMEOUT_US: u32 = 100;

/// A data bit whose high pulse lasts longer than this (us) is a 1
pub const DHT_ONE_THRESHOLD_US: u32 = 40;
