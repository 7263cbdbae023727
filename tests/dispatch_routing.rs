// tests/dispatch_routing.rs

use std::sync::Arc;

use tokio::time::Duration;

use spoolr::config::{Settings, TomlSettings};
use spoolr::dispatch::{
    CompletionRouter, EmailHeader, ProblemNotice, RECONNECTING_STATUS, SaleNotice, TaskDispatcher,
};
use spoolr::exec::{CompletedTask, TaskLauncher, TaskOutcome};
use spoolr::types::{ProcessSupport, TaskKind};
use spoolr_test_utils::recording::{RecordingCollaborators, RecordingOwner};
use spoolr_test_utils::scripts::ScriptDir;
use spoolr_test_utils::{init_tracing, with_timeout};

fn completed(kind: TaskKind, output: &str) -> CompletedTask {
    CompletedTask {
        kind,
        invocation: kind.to_string(),
        output: output.to_string(),
        outcome: TaskOutcome::Exited(Some(0)),
        elapsed: Duration::from_millis(1),
    }
}

fn header() -> EmailHeader {
    EmailHeader {
        recipient: "owner@example.com".to_string(),
        machine: "spoolr-07".to_string(),
        datetime: "2024-05-01T10:00".to_string(),
    }
}

#[test]
fn test_update_check_true_marks_update_available() {
    let collab = RecordingCollaborators::new();
    let router = CompletionRouter::new(collab.context());

    assert!(router.route(&completed(TaskKind::UpdateCheck, "true\n")));
    assert!(router.route(&completed(TaskKind::UpdateCheck, "false\n")));

    assert_eq!(
        collab.calls(),
        vec!["set_update_available(true)", "set_update_available(false)"]
    );
}

#[test]
fn test_network_connect_sets_status_then_checks() {
    let collab = RecordingCollaborators::new();
    let router = CompletionRouter::new(collab.context());

    router.route(&completed(TaskKind::NetworkConnect, "Connected\n"));

    assert_eq!(
        collab.calls(),
        vec!["set_status_value(Connected)", "check_if_connected"]
    );
}

#[test]
fn test_disconnect_does_not_overwrite_reconnecting_status() {
    let collab = RecordingCollaborators::new().with_status(RECONNECTING_STATUS);
    let router = CompletionRouter::new(collab.context());

    assert!(router.route(&completed(TaskKind::NetworkDisconnect, "Disconnected\n")));
    assert!(collab.calls().is_empty());

    let collab = RecordingCollaborators::new().with_status("Connected");
    let router = CompletionRouter::new(collab.context());
    router.route(&completed(TaskKind::NetworkDisconnect, "Disconnected\n"));
    assert_eq!(
        collab.calls(),
        vec!["set_status_value(Disconnected)", "check_if_connected"]
    );
}

#[test]
fn test_every_email_kind_sets_notification_status() {
    let collab = RecordingCollaborators::new();
    let router = CompletionRouter::new(collab.context());

    for kind in [
        TaskKind::TestEmail,
        TaskKind::SaleEmail,
        TaskKind::FillNeededEmail,
        TaskKind::ProblemEmail,
        TaskKind::OutOfOrderEmail,
    ] {
        assert!(router.route(&completed(kind, "sent\n")));
    }

    assert_eq!(collab.calls(), vec!["set_status(sent)"; 5]);
}

#[test]
fn test_usb_listing_goes_to_device_discovery() {
    let collab = RecordingCollaborators::new();
    let router = CompletionRouter::new(collab.context());

    router.route(&completed(TaskKind::UsbDevices, "Bill Acceptor\n"));

    assert_eq!(collab.calls(), vec!["devices_reported(Bill Acceptor)"]);
}

#[test]
fn test_unrouted_kinds_are_dropped() {
    let collab = RecordingCollaborators::new();
    let router = CompletionRouter::new(collab.context());

    for kind in [
        TaskKind::ClearTerminal,
        TaskKind::Shutdown,
        TaskKind::Restart,
        TaskKind::Reset,
        TaskKind::HostWifi,
        TaskKind::KillWifi,
        TaskKind::StartVpn,
        TaskKind::StopVpn,
        TaskKind::Update,
    ] {
        assert!(!router.route(&completed(kind, "true\nConnected\n")));
    }
    assert!(collab.calls().is_empty());
}

struct Harness {
    dir: ScriptDir,
    collab: Arc<RecordingCollaborators>,
    dispatcher: TaskDispatcher,
    router: CompletionRouter,
    completions: tokio::sync::mpsc::UnboundedReceiver<CompletedTask>,
}

impl Harness {
    fn new(collab: Arc<RecordingCollaborators>, support: ProcessSupport) -> Self {
        Self::with_settings(collab, support, TomlSettings::default())
    }

    fn with_settings(
        collab: Arc<RecordingCollaborators>,
        support: ProcessSupport,
        settings: TomlSettings,
    ) -> Self {
        let dir = ScriptDir::new();
        let (owner, completions) = RecordingOwner::new();
        let launcher = TaskLauncher::new(dir.path(), support, owner);
        let settings: Arc<dyn Settings> = Arc::new(settings);
        let dispatcher =
            TaskDispatcher::new(launcher, settings, collab.clone(), collab.clone());
        let router = CompletionRouter::new(collab.context());
        Self {
            dir,
            collab,
            dispatcher,
            router,
            completions,
        }
    }

    async fn next_routed(&mut self) -> CompletedTask {
        let task = with_timeout(self.completions.recv())
            .await
            .expect("completion delivered");
        self.router.route(&task);
        self.dispatcher.launcher().task_routed();
        task
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_check_end_to_end() {
    init_tracing();
    let mut h = Harness::new(RecordingCollaborators::new(), ProcessSupport::Enabled);
    h.dir.script("updatecheck.sh", "echo \"checking $1\"\necho true");

    h.dispatcher.check_for_update();
    let task = h.next_routed().await;

    assert_eq!(task.kind, TaskKind::UpdateCheck);
    assert_eq!(task.invocation, "updatecheck.sh master");
    assert_eq!(task.output, "checking master\ntrue\n");
    assert_eq!(h.collab.calls(), vec!["set_update_available(true)"]);
    assert_eq!(h.dispatcher.launcher().in_flight(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_beta_channel_selects_beta_branch() {
    init_tracing();
    let mut h = Harness::new(RecordingCollaborators::beta(), ProcessSupport::Enabled);
    h.dir.script("update.sh", "echo \"$1\"");

    h.dispatcher.update();
    let task = h.next_routed().await;

    assert_eq!(task.kind, TaskKind::Update);
    assert_eq!(task.output, "beta\n");
    assert!(h.collab.calls().is_empty(), "update output is not routed");
}

#[cfg(unix)]
#[tokio::test]
async fn test_connect_network_passes_credentials_from_settings() {
    init_tracing();
    let mut document = toml::Table::new();
    let mut network = toml::Table::new();
    network.insert("apn".into(), "internet".into());
    network.insert("username".into(), "machine".into());
    network.insert("password".into(), "s3cret".into());
    document.insert("network".into(), toml::Value::Table(network));

    let mut h = Harness::with_settings(
        RecordingCollaborators::new(),
        ProcessSupport::Enabled,
        TomlSettings::new(document),
    );
    h.dir
        .script("connect.sh", "echo \"$1/$2/$3\" > args.txt\necho Connected");

    h.dispatcher.connect_network();
    let task = h.next_routed().await;

    assert_eq!(task.kind, TaskKind::NetworkConnect);
    assert!(!task.invocation.contains("s3cret"));
    let args = std::fs::read_to_string(h.dir.path().join("args.txt")).unwrap();
    assert_eq!(args, "internet/machine/s3cret\n");
    assert_eq!(
        h.collab.calls(),
        vec!["set_status_value(Connected)", "check_if_connected"]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_email_arguments_are_passed_in_order() {
    init_tracing();
    let mut h = Harness::new(RecordingCollaborators::new(), ProcessSupport::Enabled);
    h.dir.script("sendsaleemail.sh", "printf '%s\\n' \"$@\"");
    h.dir.script("sendoutoforder.sh", "echo \"$4:$5\"");

    h.dispatcher.send_sale_email(
        header(),
        SaleNotice {
            amount: "12.50".to_string(),
            method: "cash".to_string(),
            remaining: "40".to_string(),
        },
    );
    let sale = h.next_routed().await;
    assert_eq!(
        sale.output,
        "owner@example.com\nspoolr-07\n2024-05-01T10:00\n12.50\ncash\n40\n"
    );

    h.dispatcher.send_out_of_order_email(
        header(),
        ProblemNotice {
            code: "E42".to_string(),
            description: "auger jammed".to_string(),
        },
    );
    let out_of_order = h.next_routed().await;
    assert_eq!(out_of_order.kind, TaskKind::OutOfOrderEmail);
    assert_eq!(out_of_order.output, "E42:auger jammed\n");
    assert_eq!(h.collab.calls().len(), 2);
}

#[tokio::test]
async fn test_unsupported_platform_completes_every_operation_immediately() {
    init_tracing();
    let mut h = Harness::new(RecordingCollaborators::new(), ProcessSupport::Disabled);

    h.dispatcher.check_for_update();
    let task = h.next_routed().await;
    assert_eq!(task.outcome, TaskOutcome::Unsupported);
    assert!(task.output.is_empty());
    assert_eq!(h.collab.calls(), vec!["set_update_available(false)"]);

    h.dispatcher.send_test_email(header());
    h.dispatcher.send_fill_needed_email(header(), "3");
    h.dispatcher.send_problem_email(
        header(),
        ProblemNotice {
            code: "E1".to_string(),
            description: "low".to_string(),
        },
    );
    h.dispatcher.host_wifi();
    h.dispatcher.kill_wifi();
    h.dispatcher.start_vpn();
    h.dispatcher.stop_vpn();
    h.dispatcher.reset();
    h.dispatcher.get_usb_devices();
    h.dispatcher.disconnect_network();
    h.dispatcher.clear_terminal();
    for _ in 0..11 {
        let task = h.next_routed().await;
        assert_eq!(task.outcome, TaskOutcome::Unsupported);
    }
    assert_eq!(h.dispatcher.launcher().in_flight(), 0);
}

#[tokio::test]
async fn test_power_operations_are_audited() {
    init_tracing();
    let mut h = Harness::new(RecordingCollaborators::new(), ProcessSupport::Disabled);

    h.dispatcher.shut_down();
    h.dispatcher.restart();
    h.next_routed().await;
    h.next_routed().await;

    assert_eq!(
        h.collab.calls(),
        vec!["write_log(Machine shut down.)", "write_log(Machine restarting.)"]
    );
}
