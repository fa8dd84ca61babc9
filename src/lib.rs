#![no_std]

pub mod assembler;
pub mod color;
pub mod config;
pub mod frame;
pub mod handoff;
pub mod liveness;
pub mod mapper;
pub mod node;
pub mod output;
pub mod render_loop;
pub mod update;

pub use assembler::{ChannelLayout, FrameAssembler};
pub use config::{
    ConfigError, ConfigStore, MemoryStore, NodeConfig, NodeIdentity, PixelCountTable,
    wait_for_identity,
};
pub use frame::PixelFrame;
pub use handoff::{
    Consumed, FrameHandoff, FramePublisher, FrameReceiver, PublishOutcome, PublishPolicy,
};
pub use liveness::{LivenessAction, LivenessMonitor, LivenessState};
pub use mapper::{MapError, PixelRange, UniverseMapper};
pub use node::{NodeController, NodeEvent, SystemControl, UniversePayload};
pub use output::SmartLedsOutput;
pub use render_loop::{FramePacer, RenderLoop};
pub use update::{UpdateAction, UpdateEvent, UpdateGate};

pub use color::{Rgb, Rgbw};
pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The render loop is generic over this trait and hands it one complete
/// frame per call.
pub trait OutputDriver {
    /// Write pixels to the LED strip
    fn write(&mut self, pixels: &[Rgbw]);
}
