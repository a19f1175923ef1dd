//! End-to-end session lifecycle against a scripted gimbal.

use std::io;
use std::time::Duration;

use gimbal_channel::mock::{ScriptedChannel, Step};
use gimbal_protocol::{InboundHeader, RetryBudget};
use gimbal_session::{
    Gain, HandshakeFailure, NullSink, Session, SessionConfig, SessionError,
    SessionState,
};

fn config() -> SessionConfig {
    SessionConfig {
        boot_settle: Duration::ZERO,
        budget: RetryBudget {
            max_attempts: 10,
            settle_delay: Duration::ZERO,
            read_timeout: Duration::from_millis(5),
        },
        ..SessionConfig::default()
    }
}

/// Answers like the firmware: identity, version, and a `LOOP` echo after
/// every setter.
fn firmware(line: &str) -> Vec<Step> {
    let (header, value) = line.split_once(';').unwrap_or((line, ""));
    match header {
        "GETDN" => vec![Step::line("DEVN;ddc-gimbal")],
        "GETVE" => vec![Step::line("WARN;low battery"), Step::line("VERS;1,7")],
        "SETPO" => vec![
            Step::line(format!("LOOP;{value}")),
            Step::line(format!("DATA;{value}.0,5000")),
        ],
        _ => vec![Step::line(format!("LOOP;{value}"))],
    }
}

#[tokio::test]
async fn test_full_session_against_simulated_firmware() {
    let channel = ScriptedChannel::new()
        .line("boot banner v1")
        .respond_with(firmware);
    let probe = channel.probe();
    let mut session = Session::with_sink(config(), NullSink).unwrap();

    session.connect(channel).await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let version = session.get_version().await.unwrap();
    assert_eq!(version.into_tuple(), ("1".to_string(), "7".to_string()));

    session.set_enable(true).await.unwrap();
    session.tune(Gain::Proportional, 2.5).await.unwrap();
    session.set_position(44.6).await.unwrap();
    let sample = session.read_sample().await.unwrap();
    assert_eq!(sample.angle_deg, 45.0);
    assert_eq!(sample.timestamp_us, 5000);

    session.disconnect().await;
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        probe.writes(),
        vec![
            "GETDN;0\n",
            "GETVE;0\n",
            "SETEN;1\n",
            "TUNEP;2.5\n",
            "SETPO;45\n",
        ]
    );
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_unplugged_device_fails_then_reconnects() {
    let first = ScriptedChannel::new()
        .line("DEVN;ddc-gimbal")
        .fail_read(io::ErrorKind::BrokenPipe);
    let first_probe = first.probe();
    let mut session = Session::with_sink(config(), NullSink).unwrap();
    session.connect(first).await.unwrap();

    let err = session.await_reply(InboundHeader::Data).await.unwrap_err();
    assert!(matches!(err, SessionError::Channel(_)));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(first_probe.closes(), 1);

    assert!(matches!(
        session.set_position(10.0).await,
        Err(SessionError::NotConnected(SessionState::Failed))
    ));

    let second = ScriptedChannel::new().respond_with(firmware);
    session.connect(second).await.unwrap();
    session.set_position(10.0).await.unwrap();
    assert_eq!(first_probe.closes(), 1);
}

#[tokio::test]
async fn test_non_gimbal_device_is_rejected() {
    let channel = ScriptedChannel::new().respond_with(|line| match line {
        "GETDN;0" => vec![Step::line("DEVN;thermostat,rev2")],
        _ => Vec::new(),
    });
    let probe = channel.probe();
    let mut session = Session::with_sink(config(), NullSink).unwrap();

    let err = session.connect(channel).await.unwrap_err();

    match err {
        SessionError::HandshakeFailed(HandshakeFailure::WrongDevice {
            payload,
            ..
        }) => assert_eq!(payload, "thermostat,rev2"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(probe.closes(), 1);
    assert_eq!(session.channel_name(), None);
}

#[tokio::test]
async fn test_malformed_identity_line_is_skipped_until_budget_ends() {
    let channel = ScriptedChannel::new()
        .line("DEVN ddc-gimbal")
        .line("DEVN;;ddc-gimbal");
    let probe = channel.probe();
    let mut session = Session::with_sink(config(), NullSink).unwrap();

    let err = session.connect(channel).await.unwrap_err();

    assert!(matches!(err, SessionError::HandshakeFailed(HandshakeFailure::Read(_))));
    assert_eq!(probe.reads(), 10);
    assert_eq!(probe.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_boot_settle_delays_identity_query() {
    let channel = ScriptedChannel::new().respond_with(firmware);
    let probe = channel.probe();
    let config = SessionConfig {
        boot_settle: SessionConfig::default().boot_settle,
        ..config()
    };
    let mut session = Session::with_sink(config, NullSink).unwrap();

    let handle = tokio::spawn(async move {
        session.connect(channel).await.map(|()| session)
    });

    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert!(probe.writes().is_empty());

    let session = handle.await.unwrap().unwrap();
    assert!(session.is_ready());
    assert_eq!(probe.writes(), vec!["GETDN;0\n"]);
}
