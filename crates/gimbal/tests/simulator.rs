//! Integration tests driving the public API against a simulated gimbal.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gimbal::channel::mock::{ScriptedChannel, Step};
use gimbal::prelude::*;

// =========================================================================
// Simulated firmware
// =========================================================================

/// Firmware model: decodes each command line and answers like the
/// controller would.
#[derive(Debug, Default)]
struct Firmware {
    enabled: bool,
    forward: bool,
    position: i64,
    kp: f64,
    rejected: usize,
}

impl Firmware {
    fn handle(&mut self, line: &str) -> Vec<Step> {
        let codec = LineCodec::default();
        let command = match codec.decode_command(line) {
            Ok(Some(command)) => command,
            _ => {
                self.rejected += 1;
                return vec![Step::line("WARN;bad command")];
            }
        };

        match (command.header, command.value) {
            (OutboundHeader::GetDeviceName, _) => {
                vec![Step::line("DEVN;ddc-gimbal")]
            }
            (OutboundHeader::GetVersion, _) => vec![Step::line("VERS;3,2")],
            (OutboundHeader::SetEnable, Scalar::Int(v)) => {
                self.enabled = v != 0;
                vec![Step::line(format!("LOOP;{}", u8::from(self.enabled)))]
            }
            (OutboundHeader::SetDirection, Scalar::Int(v)) => {
                self.forward = v != 0;
                Vec::new()
            }
            (OutboundHeader::SetPosition, Scalar::Int(v)) => {
                self.position = v;
                vec![
                    Step::Silence,
                    Step::line(format!("DATA;{v}.0,{}", 1000 + v)),
                ]
            }
            (OutboundHeader::TuneP, value) => {
                self.kp = value.to_string().parse().unwrap_or_default();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        boot_settle: Duration::ZERO,
        budget: RetryBudget {
            max_attempts: 8,
            settle_delay: Duration::ZERO,
            read_timeout: Duration::from_millis(5),
        },
        ..SessionConfig::default()
    }
}

fn simulated() -> (ScriptedChannel, Arc<Mutex<Firmware>>) {
    let firmware = Arc::new(Mutex::new(Firmware::default()));
    let model = Arc::clone(&firmware);
    let channel = ScriptedChannel::new()
        .line("WARN;booting")
        .respond_with(move |line| model.lock().unwrap().handle(line));
    (channel, firmware)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_commands_reach_firmware_state() -> Result<(), GimbalError> {
    let (channel, firmware) = simulated();
    let mut session = Session::with_sink(config(), NullSink)?;

    session.connect(channel).await?;
    session.set_enable(true).await?;
    session.set_direction(true).await?;
    session.tune(Gain::Proportional, 0.75).await?;
    session.set_position(-30.2).await?;

    let sample = session.read_sample().await?;
    assert_eq!(sample.angle_deg, -30.0);
    assert_eq!(sample.timestamp_us, 970);

    let state = firmware.lock().unwrap();
    assert!(state.enabled);
    assert!(state.forward);
    assert_eq!(state.position, -30);
    assert_eq!(state.kp, 0.75);
    assert_eq!(state.rejected, 0);
    Ok(())
}

#[tokio::test]
async fn test_version_through_error_conversions() -> Result<(), GimbalError> {
    let (channel, _firmware) = simulated();
    let mut session = Session::with_sink(config(), NullSink)?;
    session.connect(channel).await?;

    let version = session.get_version().await?;

    assert_eq!(version.into_tuple(), ("3".to_string(), "2".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_command_before_connect_surfaces_as_session_error() {
    let mut session: Session<ScriptedChannel, NullSink> =
        Session::with_sink(config(), NullSink).unwrap();

    let err: GimbalError = session.set_position(10.0).await.unwrap_err().into();

    assert!(matches!(
        err,
        GimbalError::Session(SessionError::NotConnected(SessionState::Disconnected))
    ));
}

#[tokio::test]
async fn test_shared_session_serves_several_tasks() {
    let (channel, firmware) = simulated();
    let shared = SharedSession::new(Session::with_sink(config(), NullSink).unwrap());
    shared.connect(channel).await.unwrap();

    let mover = {
        let shared = shared.clone();
        tokio::spawn(async move { shared.set_position(15.0).await })
    };
    let reader = {
        let shared = shared.clone();
        tokio::spawn(async move { shared.get_version().await })
    };

    mover.await.unwrap().unwrap();
    let version = reader.await.unwrap().unwrap();

    assert_eq!(version.to_string(), "3.2");
    assert_eq!(firmware.lock().unwrap().position, 15);

    shared.disconnect().await;
    assert_eq!(shared.state().await, SessionState::Disconnected);
}
