//! A cloneable handle for using one session from several tasks.

use std::sync::Arc;

use gimbal_channel::Channel;
use gimbal_protocol::{DataSample, Version};
use tokio::sync::{Mutex, MutexGuard};

use crate::sink::{LogSink, TracingSink};
use crate::{Session, SessionError, SessionState};

/// A [`Session`] behind an async mutex.
///
/// Each method holds the lock for one whole operation, so a query and its
/// reply are never split by another task's command. Use [`lock`] to run
/// several operations back to back.
///
/// [`lock`]: SharedSession::lock
pub struct SharedSession<C: Channel, L: LogSink = TracingSink> {
    inner: Arc<Mutex<Session<C, L>>>,
}

impl<C: Channel, L: LogSink> Clone for SharedSession<C, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Channel, L: LogSink> SharedSession<C, L> {
    pub fn new(session: Session<C, L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access for a sequence of operations.
    pub async fn lock(&self) -> MutexGuard<'_, Session<C, L>> {
        self.inner.lock().await
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }

    pub async fn connect(&self, channel: C) -> Result<(), SessionError> {
        self.inner.lock().await.connect(channel).await
    }

    pub async fn disconnect(&self) {
        self.inner.lock().await.disconnect().await;
    }

    pub async fn set_enable(&self, enable: bool) -> Result<(), SessionError> {
        self.inner.lock().await.set_enable(enable).await
    }

    pub async fn set_direction(&self, forward: bool) -> Result<(), SessionError> {
        self.inner.lock().await.set_direction(forward).await
    }

    pub async fn set_position(&self, degrees: f64) -> Result<(), SessionError> {
        self.inner.lock().await.set_position(degrees).await
    }

    pub async fn get_version(&self) -> Result<Version, SessionError> {
        self.inner.lock().await.get_version().await
    }

    pub async fn read_sample(&self) -> Result<DataSample, SessionError> {
        self.inner.lock().await.read_sample().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gimbal_channel::mock::{ScriptedChannel, Step};

    use super::*;
    use crate::{NullSink, SessionConfig};

    fn config() -> SessionConfig {
        SessionConfig {
            boot_settle: Duration::ZERO,
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_clones_share_one_session() {
        let shared = SharedSession::new(
            Session::with_sink(config(), NullSink).unwrap(),
        );
        let other = shared.clone();

        let channel = ScriptedChannel::new().line("DEVN;ddc-gimbal");
        shared.connect(channel).await.unwrap();

        assert_eq!(other.state().await, SessionState::Ready);
        other.disconnect().await;
        assert_eq!(shared.state().await, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_concurrent_queries_do_not_interleave() {
        let channel = ScriptedChannel::new()
            .line("DEVN;ddc-gimbal")
            .respond_with(|line| match line {
                "GETVE;0" => vec![Step::line("VERS;1,4")],
                _ => Vec::new(),
            });
        let probe = channel.probe();
        let shared = SharedSession::new(
            Session::with_sink(config(), NullSink).unwrap(),
        );
        shared.connect(channel).await.unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.get_version().await })
            })
            .collect();
        for task in tasks {
            let version = task.await.unwrap().unwrap();
            assert_eq!(version.to_string(), "1.4");
        }

        assert_eq!(probe.writes().len(), 5);
    }
}
