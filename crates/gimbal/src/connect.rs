//! Opening a serial link and running the handshake in one call.

use gimbal_channel::SerialChannel;
use gimbal_session::Session;

use crate::{GimbalConfig, GimbalError};

/// Opens the port in `config.serial` and connects a session over it.
///
/// Returns once the gimbal has identified itself, which takes at least
/// `config.session.boot_settle`.
///
/// # Errors
/// - [`GimbalError::Channel`] if the port cannot be opened
/// - [`GimbalError::Session`] if the configuration is unusable or the
///   handshake fails
pub async fn connect_serial(
    config: &GimbalConfig,
) -> Result<Session<SerialChannel>, GimbalError> {
    let settings = config.serial.clone();
    let channel = tokio::task::spawn_blocking(move || SerialChannel::open(&settings))
        .await
        .map_err(|err| gimbal_channel::ChannelError::Serial(err.to_string()))??;

    let mut session = Session::new(config.session.clone())?;
    session.connect(channel).await?;
    Ok(session)
}
