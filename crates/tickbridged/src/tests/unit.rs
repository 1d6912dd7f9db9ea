//! Unit tests for bootstrap and the reference host launch path.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rstest::rstest;

use crate::bootstrap::{BootstrapError, StaticConfigLoader, bootstrap_with};
use crate::bridge::Bridge;
use crate::health::HealthReporter;
use crate::process::{
    HostLoop, LaunchError, ShutdownError, ShutdownFlag, ShutdownSignal, run_bridge_with,
};

use super::support::{
    FailingConfigLoader, HealthEvent, InvalidConfigLoader, RecordingHealthReporter,
    TestConfigLoader,
};

/// Shutdown trigger that is already raised when armed.
struct PreRaisedSignal;

impl ShutdownSignal for PreRaisedSignal {
    fn arm(&self) -> Result<ShutdownFlag, ShutdownError> {
        let flag = ShutdownFlag::new();
        flag.raise();
        Ok(flag)
    }
}

#[rstest]
fn bootstrap_prepares_the_socket_directory() {
    let loader = TestConfigLoader::new();
    let reporter = RecordingHealthReporter::default();

    let bootstrapped = bootstrap_with(&loader, &reporter).expect("bootstrap should succeed");

    let path = bootstrapped
        .config()
        .bridge_socket()
        .unix_path()
        .expect("unix endpoint");
    assert!(path.parent().is_some_and(|parent| parent.exists()));
    assert_eq!(
        reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[rstest]
fn bootstrap_reports_validation_failures() {
    let reporter = RecordingHealthReporter::default();

    let error = bootstrap_with(&InvalidConfigLoader, &reporter).expect_err("zero batch limit");

    assert!(matches!(error, BootstrapError::Validation { .. }));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
fn launch_propagates_bootstrap_failures() {
    let reporter: Arc<dyn HealthReporter> = Arc::new(RecordingHealthReporter::default());

    let error = run_bridge_with(&FailingConfigLoader, reporter, &PreRaisedSignal)
        .expect_err("configuration should fail");

    assert!(matches!(error, LaunchError::Bootstrap(_)));
}

#[rstest]
fn launch_names_the_configured_endpoint_when_binding_fails() {
    let reserved = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = reserved.local_addr().expect("reserved addr").port();
    let loader = StaticConfigLoader::new(tickbridge_config::Config {
        bridge_socket: tickbridge_config::SocketEndpoint::tcp("127.0.0.1", port),
        port_search_span: 0,
        ..tickbridge_config::Config::default()
    });
    let reporter: Arc<dyn HealthReporter> = Arc::new(RecordingHealthReporter::default());

    let error = run_bridge_with(&loader, reporter, &PreRaisedSignal).expect_err("port taken");

    let LaunchError::Bind { configured, source } = error else {
        panic!("expected a bind failure, got {error}");
    };
    assert_eq!(configured, format!("tcp://127.0.0.1:{port}"));
    assert!(source.is_address_in_use());
}

#[rstest]
fn launch_with_a_raised_flag_binds_then_shuts_down() {
    let recorder = Arc::new(RecordingHealthReporter::default());
    let reporter: Arc<dyn HealthReporter> = recorder.clone();

    run_bridge_with(&TestConfigLoader::new(), reporter, &PreRaisedSignal)
        .expect("launch should succeed");

    let events = recorder.events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::ListenerBound(_))),
        "{events:?}"
    );
}

#[rstest]
fn host_loop_ticks_until_the_flag_is_raised() {
    let config = tickbridge_config::Config {
        bridge_socket: tickbridge_config::SocketEndpoint::tcp("127.0.0.1", 0),
        ..tickbridge_config::Config::default()
    };
    let mut bridge = Bridge::start(&config, Arc::new(RecordingHealthReporter::default()))
        .expect("start bridge");
    bridge
        .coordinator_mut()
        .host_mut()
        .editor_mut()
        .play()
        .expect("enter play mode");
    let flag = ShutdownFlag::new();
    let trigger = flag.clone();
    let raiser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        trigger.raise();
    });

    let ticks = HostLoop::new(Duration::from_millis(5)).run(&mut bridge, &flag);

    raiser.join().expect("raiser thread");
    assert!(ticks >= 2, "only {ticks} ticks ran");
    assert!(bridge.coordinator().host().editor().frame() >= ticks);
    bridge.shutdown().expect("shutdown");
}
