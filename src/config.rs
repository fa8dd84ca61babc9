//! Node configuration and identity
//!
//! The only persisted value is the node position, a single integer under
//! the `aero` namespace. Everything else is derived from it: the pixel
//! count comes from a static table and the universe block from the pixel
//! count and channel layout.

use core::fmt;

use embassy_time::{Duration, Timer};
use heapless::{LinearMap, String};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::assembler::ChannelLayout;
use crate::color::{Rgbw, rgbw};
use crate::handoff::PublishPolicy;
use crate::liveness::{DEFAULT_SELF_TEST_LEVEL, DEFAULT_SILENCE_THRESHOLD};
use crate::mapper::{DMX_UNIVERSE_SIZE, UniverseMapper};

/// Persisted configuration namespace
pub const CONFIG_NAMESPACE: &str = "aero";

/// Key holding the node position
pub const POSITION_KEY: &str = "strip_position";

/// Raw build-time position override
pub const POSITION_OVERRIDE: Option<&str> = option_env!("AERO_STRIP_POSITION");

/// Pixel count of a standard strip
pub const DEFAULT_PIXEL_COUNT: usize = 660;

/// Default period of the unconfigured-position wait loop
pub const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Color shown while a firmware update is written
pub const DEFAULT_UPDATE_COLOR: Rgbw = rgbw(0, 0, 40, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Node position is unset (zero or missing)
    Unconfigured,
    /// Pixel count exceeds the compiled frame capacity
    TooManyPixels { requested: usize, capacity: usize },
    /// Universe payload cannot hold a single pixel
    InvalidUniverseSize,
    /// Node's universe block does not fit the universe space
    UniverseOverflow { position: u32 },
    /// The configuration store rejected a write
    StoreWrite,
    /// Mapper and channel layout disagree on channels per pixel
    LayoutMismatch { mapper: u8, layout: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "node position is not configured"),
            Self::TooManyPixels {
                requested,
                capacity,
            } => write!(f, "{requested} pixels exceed frame capacity {capacity}"),
            Self::InvalidUniverseSize => write!(f, "universe size cannot hold a pixel"),
            Self::UniverseOverflow { position } => {
                write!(f, "universe block of position {position} overflows")
            }
            Self::StoreWrite => write!(f, "configuration store write failed"),
            Self::LayoutMismatch { mapper, layout } => write!(
                f,
                "mapper uses {mapper} channels per pixel, layout uses {layout}"
            ),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Node-local persistent integer storage
pub trait ConfigStore {
    type Error;

    fn get_u32(&mut self, namespace: &str, key: &str) -> Option<u32>;

    fn set_u32(&mut self, namespace: &str, key: &str, value: u32) -> Result<(), Self::Error>;
}

/// Longest `namespace/key` pair a [`MemoryStore`] accepts
pub const MEMORY_KEY_CAPACITY: usize = 32;

/// The store is full or the key is too long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

/// In-memory [`ConfigStore`] holding up to `N` values
#[derive(Debug, Default)]
pub struct MemoryStore<const N: usize> {
    values: LinearMap<String<MEMORY_KEY_CAPACITY>, u32, N>,
}

impl<const N: usize> MemoryStore<N> {
    pub const fn new() -> Self {
        Self {
            values: LinearMap::new(),
        }
    }

    fn slot(namespace: &str, key: &str) -> Option<String<MEMORY_KEY_CAPACITY>> {
        let mut slot = String::new();
        slot.push_str(namespace).ok()?;
        slot.push('/').ok()?;
        slot.push_str(key).ok()?;
        Some(slot)
    }
}

impl<const N: usize> ConfigStore for MemoryStore<N> {
    type Error = StoreFull;

    fn get_u32(&mut self, namespace: &str, key: &str) -> Option<u32> {
        let slot = Self::slot(namespace, key)?;
        self.values.get(&slot).copied()
    }

    fn set_u32(&mut self, namespace: &str, key: &str, value: u32) -> Result<(), StoreFull> {
        let slot = Self::slot(namespace, key).ok_or(StoreFull)?;
        self.values.insert(slot, value).map_err(|_| StoreFull)?;
        Ok(())
    }
}

/// Per-position pixel counts
#[derive(Debug, Clone, Copy)]
pub struct PixelCountTable {
    /// Count used for positions without an override
    pub fallback: usize,
    /// `(position, pixel count)` pairs
    pub overrides: &'static [(u32, usize)],
}

impl PixelCountTable {
    /// Same pixel count for every position
    pub const fn uniform(count: usize) -> Self {
        Self {
            fallback: count,
            overrides: &[],
        }
    }

    pub fn pixel_count(&self, position: u32) -> usize {
        self.overrides
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, count)| *count)
            .unwrap_or(self.fallback)
    }
}

/// Static node configuration
#[derive(Debug, Clone, Copy)]
pub struct NodeConfig {
    pub layout: ChannelLayout,
    /// Payload bytes per universe
    pub universe_size: u16,
    pub publish: PublishPolicy,
    /// Silent ticks tolerated before a restart
    pub silence_threshold: u32,
    /// Channel level of the self-test pattern
    pub self_test_level: u8,
    /// Color held while a firmware update is in progress
    pub update_color: Rgbw,
    pub pixels: PixelCountTable,
    /// Retry period while the node position is unset
    pub config_poll_interval: Duration,
}

impl NodeConfig {
    pub const fn new() -> Self {
        Self {
            layout: ChannelLayout::Rgbw,
            universe_size: DMX_UNIVERSE_SIZE,
            publish: PublishPolicy::OnSync,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            self_test_level: DEFAULT_SELF_TEST_LEVEL,
            update_color: DEFAULT_UPDATE_COLOR,
            pixels: PixelCountTable::uniform(DEFAULT_PIXEL_COUNT),
            config_poll_interval: CONFIG_POLL_INTERVAL,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a position override, ignoring malformed values
pub fn parse_position(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse().ok()
}

/// Position override baked in at build time, if any
pub fn build_position_override() -> Option<u32> {
    parse_position(POSITION_OVERRIDE)
}

/// Read the node position, first writing `override_position` if it differs
/// from the stored value.
pub fn load_position<S: ConfigStore>(
    store: &mut S,
    override_position: Option<u32>,
) -> Result<u32, ConfigError> {
    if let Some(position) = override_position {
        if store.get_u32(CONFIG_NAMESPACE, POSITION_KEY) != Some(position) {
            store
                .set_u32(CONFIG_NAMESPACE, POSITION_KEY, position)
                .map_err(|_| ConfigError::StoreWrite)?;
        }
    }

    match store.get_u32(CONFIG_NAMESPACE, POSITION_KEY) {
        Some(position) if position != 0 => Ok(position),
        _ => Err(ConfigError::Unconfigured),
    }
}

/// Resolved identity of this node
#[derive(Debug, Clone, Copy)]
pub struct NodeIdentity {
    position: u32,
    mapper: UniverseMapper,
}

impl NodeIdentity {
    /// Derive the identity of the node at `position`
    ///
    /// `capacity` is the compiled frame capacity.
    pub fn new(position: u32, config: &NodeConfig, capacity: usize) -> Result<Self, ConfigError> {
        if position == 0 {
            return Err(ConfigError::Unconfigured);
        }
        let channels = config.layout.channels_per_pixel();
        if config.universe_size < u16::from(channels) {
            return Err(ConfigError::InvalidUniverseSize);
        }
        let pixel_count = config.pixels.pixel_count(position);
        if pixel_count > capacity {
            return Err(ConfigError::TooManyPixels {
                requested: pixel_count,
                capacity,
            });
        }
        let mapper =
            UniverseMapper::for_position(position, pixel_count, config.universe_size, channels)
                .ok_or(ConfigError::UniverseOverflow { position })?;

        Ok(Self { position, mapper })
    }

    /// Load the position from `store` and derive the identity
    pub fn load<S: ConfigStore>(
        store: &mut S,
        config: &NodeConfig,
        capacity: usize,
        override_position: Option<u32>,
    ) -> Result<Self, ConfigError> {
        let position = load_position(store, override_position)?;
        Self::new(position, config, capacity)
    }

    pub const fn position(&self) -> u32 {
        self.position
    }

    pub const fn pixel_count(&self) -> usize {
        self.mapper.pixel_count()
    }

    pub const fn mapper(&self) -> UniverseMapper {
        self.mapper
    }
}

/// Block until the node position is configured
///
/// Polls the store once per `config.config_poll_interval`, applying the
/// build-time override. Errors other than a missing position are returned.
pub async fn wait_for_identity<S: ConfigStore>(
    store: &mut S,
    config: &NodeConfig,
    capacity: usize,
) -> Result<NodeIdentity, ConfigError> {
    loop {
        match NodeIdentity::load(store, config, capacity, build_position_override()) {
            Err(ConfigError::Unconfigured) => {
                #[cfg(feature = "esp32-log")]
                println!("Please set strip position in preferences");
                Timer::after(config.config_poll_interval).await;
            }
            result => return result,
        }
    }
}
