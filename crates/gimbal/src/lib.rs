//! # gimbal
//!
//! Host-side control of a camera gimbal over a serial line.
//!
//! The controller speaks a line protocol (`SETPO;90`, `VERS;1,3`, ...).
//! A [`Session`] proves the device is the gimbal, then exposes typed
//! commands; the layers underneath are re-exported as [`channel`],
//! [`protocol`] and [`session`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gimbal::prelude::*;
//!
//! # async fn run() -> Result<(), GimbalError> {
//! let config = GimbalConfig::from_json_file("gimbal.json")?;
//! let mut link = gimbal::connect_serial(&config).await?;
//! link.set_enable(true).await?;
//! link.set_position(90.0).await?;
//! println!("firmware {}", link.get_version().await?);
//! link.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod config;
#[cfg(feature = "serial")]
mod connect;
mod error;

pub use config::{ConfigError, GimbalConfig};
#[cfg(feature = "serial")]
pub use connect::connect_serial;
pub use error::GimbalError;

pub use gimbal_channel as channel;
pub use gimbal_protocol as protocol;
pub use gimbal_session as session;

pub use gimbal_session::Session;

/// Common imports for applications.
///
/// ```rust
/// use gimbal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{ConfigError, GimbalConfig, GimbalError};

    #[cfg(feature = "serial")]
    pub use crate::connect_serial;
    #[cfg(feature = "serial")]
    pub use gimbal_channel::{SerialChannel, SerialSettings};

    pub use gimbal_channel::{Channel, ChannelError};
    pub use gimbal_protocol::{
        Command, DataSample, InboundHeader, LineCodec, Message,
        OutboundHeader, ProtocolError, RetryBudget, Scalar, Version,
    };
    pub use gimbal_session::{
        Gain, HandshakeFailure, LogEvent, LogSink, NullSink, Session,
        SessionConfig, SessionError, SessionState, SharedSession,
        TracingSink,
    };
}
