#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use spoolr::dispatch::{
    AuditLog, DeviceDiscovery, DispatchContext, NetworkStatus, NotificationStatus,
    UpdateAvailability, UpdateChannel,
};
use spoolr::exec::{CompletedTask, TaskOwner};
use spoolr::signals::{AugerControl, ChuteButtonEvents, Scene, SceneHost};

/// Task owner that forwards every completion to a channel.
pub struct RecordingOwner {
    tx: mpsc::UnboundedSender<CompletedTask>,
}

impl RecordingOwner {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<CompletedTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl TaskOwner for RecordingOwner {
    fn task_completed(&self, task: CompletedTask) {
        let _ = self.tx.send(task);
    }
}

/// One collaborator implementing every dispatch trait, logging each call as a
/// string such as `"set_update_available(true)"`.
#[derive(Debug, Default)]
pub struct RecordingCollaborators {
    calls: Mutex<Vec<String>>,
    status: Mutex<String>,
    beta: bool,
}

impl RecordingCollaborators {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn beta() -> Arc<Self> {
        Arc::new(Self {
            beta: true,
            ..Self::default()
        })
    }

    /// Pretend the network already reports `status`.
    pub fn with_status(self: Arc<Self>, status: &str) -> Arc<Self> {
        *self.status.lock().unwrap() = status.to_string();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn context(self: &Arc<Self>) -> DispatchContext {
        DispatchContext {
            network: self.clone(),
            updates: self.clone(),
            notifications: self.clone(),
            devices: self.clone(),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NetworkStatus for RecordingCollaborators {
    fn set_status_value(&self, raw: &str) {
        *self.status.lock().unwrap() = raw.trim().to_string();
        self.record(format!("set_status_value({})", raw.trim()));
    }

    fn has_status_value(&self, value: &str) -> bool {
        *self.status.lock().unwrap() == value
    }

    fn check_if_connected(&self) {
        self.record("check_if_connected".to_string());
    }
}

impl UpdateAvailability for RecordingCollaborators {
    fn set_update_available(&self, available: bool) {
        self.record(format!("set_update_available({available})"));
    }
}

impl UpdateChannel for RecordingCollaborators {
    fn beta_mode(&self) -> bool {
        self.beta
    }
}

impl NotificationStatus for RecordingCollaborators {
    fn set_status(&self, raw: &str) {
        self.record(format!("set_status({})", raw.trim()));
    }
}

impl DeviceDiscovery for RecordingCollaborators {
    fn devices_reported(&self, raw: &str) {
        self.record(format!("devices_reported({})", raw.trim()));
    }
}

impl AuditLog for RecordingCollaborators {
    fn write_log(&self, line: &str) {
        self.record(format!("write_log({line})"));
    }
}

/// Auger collaborator recording requests.
#[derive(Debug, Default)]
pub struct RecordingAuger {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingAuger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl AugerControl for RecordingAuger {
    fn start_auger_requested(&self) {
        self.calls.lock().unwrap().push("start");
    }

    fn stop_auger_requested(&self) {
        self.calls.lock().unwrap().push("stop");
    }

    fn auger_sensor_detected(&self) {
        self.calls.lock().unwrap().push("sensor");
    }
}

/// A scene; dispensing scenes expose the chute-button capability.
#[derive(Debug, Default)]
pub struct FakeScene {
    name: String,
    dispensing: bool,
    instruction: Mutex<Option<bool>>,
}

impl FakeScene {
    pub fn dispensing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            dispensing: true,
            instruction: Mutex::new(None),
        })
    }

    pub fn plain(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            dispensing: false,
            instruction: Mutex::new(None),
        })
    }

    /// Last value passed to `set_chute_button_instruction`.
    pub fn instruction(&self) -> Option<bool> {
        *self.instruction.lock().unwrap()
    }
}

impl ChuteButtonEvents for FakeScene {
    fn set_chute_button_instruction(&self, visible: bool) {
        *self.instruction.lock().unwrap() = Some(visible);
    }
}

impl Scene for FakeScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn chute_button(&self) -> Option<&dyn ChuteButtonEvents> {
        if self.dispensing { Some(self) } else { None }
    }
}

/// Scene host whose current scene the test switches.
#[derive(Default)]
pub struct FakeSceneHost {
    current: Mutex<Option<Arc<dyn Scene>>>,
}

impl FakeSceneHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, scene: Arc<dyn Scene>) {
        *self.current.lock().unwrap() = Some(scene);
    }
}

impl SceneHost for FakeSceneHost {
    fn current_scene(&self) -> Option<Arc<dyn Scene>> {
        self.current.lock().unwrap().clone()
    }
}
