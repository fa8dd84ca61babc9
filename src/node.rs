//! Control-plane orchestration
//!
//! [`NodeController`] receives decoded protocol events, writes them into the
//! working frame, publishes frames per the configured policy and drives the
//! liveness and update state machines. All recovery is a full restart
//! through [`SystemControl`].

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::assembler::FrameAssembler;
use crate::config::{ConfigError, NodeConfig, NodeIdentity};
use crate::handoff::{FramePublisher, PublishOutcome, PublishPolicy};
use crate::liveness::{
    LivenessAction, LivenessMonitor, LivenessState, PayloadOutcome, draw_self_test,
};
use crate::mapper::{MapError, PixelRange};
use crate::update::{UpdateAction, UpdateEvent, UpdateGate};

/// Period of [`NodeEvent::Tick`]
pub const LIVENESS_TICK: Duration = Duration::from_secs(1);

/// Platform hooks the controller needs
pub trait SystemControl {
    /// Restart the whole node; on hardware this does not return
    fn restart(&mut self);
}

/// Color data for one universe, as delivered by the protocol decoder
#[derive(Debug, Clone, Copy)]
pub struct UniversePayload<'d> {
    pub universe: u16,
    pub data: &'d [u8],
    /// Decoder sequence number, 0 when sequencing is disabled
    pub sequence: u8,
}

/// Everything the control plane reacts to
#[derive(Debug, Clone, Copy)]
pub enum NodeEvent<'d> {
    Universe(UniversePayload<'d>),
    /// Explicit "synchronize now" from the protocol layer
    Sync,
    /// Periodic liveness tick
    Tick,
    Update(UpdateEvent),
}

pub struct NodeController<'a, S: SystemControl, const MAX_PIXELS: usize> {
    assembler: FrameAssembler<MAX_PIXELS>,
    publisher: FramePublisher<'a, MAX_PIXELS>,
    liveness: LivenessMonitor,
    update: UpdateGate,
    policy: PublishPolicy,
    self_test_level: u8,
    system: S,
}

impl<'a, S: SystemControl, const MAX_PIXELS: usize> NodeController<'a, S, MAX_PIXELS> {
    pub fn new(
        identity: &NodeIdentity,
        config: &NodeConfig,
        publisher: FramePublisher<'a, MAX_PIXELS>,
        system: S,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            assembler: FrameAssembler::new(identity.mapper(), config.layout)?,
            publisher,
            liveness: LivenessMonitor::new(config.silence_threshold),
            update: UpdateGate::new(config.update_color),
            policy: config.publish,
            self_test_level: config.self_test_level,
            system,
        })
    }

    /// Show the first self-test step before any tick arrives
    pub fn start(&mut self) -> PublishOutcome {
        #[cfg(feature = "esp32-log")]
        {
            let universes = self.assembler.mapper().universes();
            println!(
                "Node ready: {} pixels, universes {}..{}",
                self.assembler.frame().len(),
                universes.start,
                universes.end
            );
        }
        draw_self_test(self.assembler.frame_mut(), 0, self.self_test_level);
        self.publish()
    }

    pub fn handle(&mut self, event: NodeEvent<'_>) {
        match event {
            NodeEvent::Universe(payload) => {
                // Foreign universes are dropped; the error is only diagnostic
                let _ = self.on_universe_payload(&payload);
            }
            NodeEvent::Sync => {
                self.on_sync();
            }
            NodeEvent::Tick => self.on_tick(),
            NodeEvent::Update(update) => self.on_update(update),
        }
    }

    /// Apply one universe payload to the working frame
    ///
    /// Payloads for universes this node does not own are dropped and leave
    /// the liveness state untouched.
    pub fn on_universe_payload(
        &mut self,
        payload: &UniversePayload<'_>,
    ) -> Result<PixelRange, MapError> {
        if let Err(err) = self.assembler.locate(payload.universe, payload.data) {
            #[cfg(feature = "esp32-log")]
            println!("Dropped payload (seq {}): {}", payload.sequence, err);
            return Err(err);
        }

        if self.liveness.on_payload() == PayloadOutcome::WentLive {
            #[cfg(feature = "esp32-log")]
            println!("Network active, leaving self-test");
            self.assembler.frame_mut().clear();
        }

        let range = self.assembler.apply(payload.universe, payload.data)?;
        if self.policy == PublishPolicy::Eager {
            self.publish();
        }
        Ok(range)
    }

    /// Publish the working frame on the decoder's sync signal
    pub fn on_sync(&mut self) -> PublishOutcome {
        self.publish()
    }

    pub fn on_tick(&mut self) {
        match self.liveness.tick() {
            LivenessAction::Idle => {}
            LivenessAction::SelfTest { step } => {
                draw_self_test(self.assembler.frame_mut(), step, self.self_test_level);
                self.publish();
            }
            LivenessAction::Restart => {
                #[cfg(feature = "esp32-log")]
                println!(
                    "No control data for {} ticks, restarting",
                    self.liveness.silence()
                );
                self.system.restart();
            }
        }
    }

    pub fn on_update(&mut self, event: UpdateEvent) {
        match event {
            UpdateEvent::Started => self.liveness.pause(),
            UpdateEvent::Finished | UpdateEvent::Failed => self.liveness.resume(),
        }
        if self.update.on_event(event, &self.publisher) == UpdateAction::Restart {
            #[cfg(feature = "esp32-log")]
            println!("Firmware update failed, restarting");
            self.system.restart();
        }
    }

    fn publish(&mut self) -> PublishOutcome {
        self.publisher.publish(self.assembler.frame())
    }

    pub const fn state(&self) -> LivenessState {
        self.liveness.state()
    }

    pub const fn liveness(&self) -> &LivenessMonitor {
        &self.liveness
    }

    pub const fn assembler(&self) -> &FrameAssembler<MAX_PIXELS> {
        &self.assembler
    }

    pub const fn is_updating(&self) -> bool {
        self.update.in_progress()
    }

    pub const fn system(&self) -> &S {
        &self.system
    }
}
