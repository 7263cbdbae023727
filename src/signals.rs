// src/signals.rs

//! Hardware input forwarding.
//!
//! Input pins are read elsewhere; what arrives here is already a
//! [`HardwareSignal`]. The router decides which auger request a signal turns
//! into. It only reaches into the UI through the [`ChuteButtonEvents`]
//! capability a scene may expose, never by asking what kind of scene is
//! showing.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Something the input pins reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareSignal {
    ChuteButtonPressed,
    ChuteButtonReleased,
    /// The auger's magnetic sensor saw a revolution.
    AugerSensorTriggered,
}

/// Scenes that take part in dispensing expose this capability.
pub trait ChuteButtonEvents: Send + Sync {
    /// Show or hide the "pull the chute handle" instruction.
    fn set_chute_button_instruction(&self, visible: bool);
}

pub trait Scene: Send + Sync {
    fn name(&self) -> &str;

    fn chute_button(&self) -> Option<&dyn ChuteButtonEvents> {
        None
    }
}

/// Whatever currently owns the screen.
pub trait SceneHost: Send + Sync {
    fn current_scene(&self) -> Option<Arc<dyn Scene>>;
}

/// Motor-side collaborator. Safety interlocks are its business.
pub trait AugerControl: Send + Sync {
    fn start_auger_requested(&self);
    fn stop_auger_requested(&self);
    fn auger_sensor_detected(&self);
}

#[derive(Clone)]
pub struct SignalRouter {
    scenes: Arc<dyn SceneHost>,
    auger: Arc<dyn AugerControl>,
}

impl fmt::Debug for SignalRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRouter").finish_non_exhaustive()
    }
}

impl SignalRouter {
    pub fn new(scenes: Arc<dyn SceneHost>, auger: Arc<dyn AugerControl>) -> Self {
        Self { scenes, auger }
    }

    pub fn forward(&self, signal: HardwareSignal) {
        match signal {
            HardwareSignal::ChuteButtonPressed => self.chute_pressed(),
            HardwareSignal::ChuteButtonReleased => {
                debug!("chute button released");
                self.auger.stop_auger_requested();
            }
            HardwareSignal::AugerSensorTriggered => self.auger.auger_sensor_detected(),
        }
    }

    /// A press only dispenses while a scene with the chute capability is up.
    fn chute_pressed(&self) {
        let Some(scene) = self.scenes.current_scene() else {
            debug!("chute button pressed with no scene; ignoring");
            return;
        };

        match scene.chute_button() {
            Some(chute) => {
                debug!(scene = scene.name(), "chute button pressed");
                chute.set_chute_button_instruction(false);
                self.auger.start_auger_requested();
            }
            None => debug!(scene = scene.name(), "chute button pressed outside dispensing; ignoring"),
        }
    }
}
