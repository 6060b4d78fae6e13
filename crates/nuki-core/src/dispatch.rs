//! Inbound frame dispatch.
//!
//! Every indication the transport delivers passes through here exactly
//! once, on the task that is currently waiting for it. Frames that fail
//! framing, CRC or secretbox checks are dropped silently; the waiting
//! state machine observes nothing and eventually times out, since the
//! protocol has no negative acknowledgement for framing errors.

use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::debug;

use crate::error::{CmdError, CmdResult};
use crate::session::SessionState;
use crate::store::Credentials;
use crate::transport::{Channel, Transport};
use nuki_crypto::envelope;
use nuki_wire::decode_plain;

/// Decode one inbound frame and apply it to the session.
///
/// `credentials` are required to open user-channel frames; without them
/// (i.e. during pairing) encrypted frames are dropped.
pub(crate) fn apply_frame(
    session: &mut SessionState,
    channel: Channel,
    frame: &[u8],
    credentials: Option<&Credentials>,
) {
    match channel {
        Channel::Pairing => match decode_plain(frame) {
            Ok((command, payload)) => {
                debug!(%command, len = payload.len(), "pairing frame");
                session.apply_message(command, &payload);
            }
            Err(err) => debug!(%err, len = frame.len(), "dropping pairing frame"),
        },
        Channel::User => {
            let Some(credentials) = credentials else {
                debug!(len = frame.len(), "dropping user frame, no credentials");
                return;
            };
            match envelope::open(frame, &credentials.secret_key, credentials.authorization_id) {
                Ok((command, payload)) => {
                    debug!(%command, len = payload.len(), "user frame");
                    session.apply_message(command, &payload);
                }
                Err(err) => debug!(%err, len = frame.len(), "dropping user frame"),
            }
        }
    }
}

/// Wait for the next indication and apply it, bounded by `deadline`.
///
/// Returns [`CmdError::Timeout`] once the deadline has passed; transport
/// failures surface as-is.
pub(crate) async fn recv_and_apply<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    credentials: Option<&Credentials>,
    deadline: Instant,
) -> CmdResult<()> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining == Duration::ZERO {
        return Err(CmdError::Timeout);
    }
    match timeout(remaining, transport.recv()).await {
        Err(_) => Err(CmdError::Timeout),
        Ok(Err(err)) => Err(err.into()),
        Ok(Ok((channel, frame))) => {
            apply_frame(session, channel, &frame, credentials);
            Ok(())
        }
    }
}

/// Apply frames that are already in flight, giving up once none arrives
/// within `grace`.
///
/// A command is terminal as soon as its success signal fires, but replies
/// that stream in lists (log entries, keypad codes) keep arriving for a
/// moment after the frame that raised the signal. One settle window picks
/// them up before the session is released.
pub(crate) async fn drain_pending<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    credentials: Option<&Credentials>,
    grace: Duration,
) {
    while let Ok(Ok((channel, frame))) = timeout(grace, transport.recv()).await {
        apply_frame(session, channel, &frame, credentials);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BleAddress;
    use nuki_wire::{encode_plain, Command};

    fn credentials() -> Credentials {
        Credentials {
            secret_key: [0x11; 32],
            ble_address: BleAddress([0; 6]),
            authorization_id: [0xDE, 0xAD, 0xBE, 0xEF],
            security_pin: 0,
        }
    }

    #[test]
    fn valid_pairing_frame_is_applied() {
        let mut session = SessionState::new();
        let frame = encode_plain(Command::PUBLIC_KEY, &[0xAA; 32]).unwrap();
        apply_frame(&mut session, Channel::Pairing, &frame, None);
        assert_eq!(session.remote_public_key, [0xAA; 32]);
    }

    #[test]
    fn corrupted_pairing_frame_is_dropped() {
        let mut session = SessionState::new();
        let mut frame = encode_plain(Command::CHALLENGE, &[0xBB; 32]).unwrap();
        frame[4] ^= 0x01;
        apply_frame(&mut session, Channel::Pairing, &frame, None);
        assert!(!session.has_challenge_nonce());
        assert_eq!(session.last_message_code, Command::EMPTY);
    }

    #[test]
    fn user_frame_requires_credentials() {
        let creds = credentials();
        let frame = envelope::seal(
            Command::STATUS,
            &[0x00],
            &creds.secret_key,
            creds.authorization_id,
        )
        .unwrap();

        let mut session = SessionState::new();
        apply_frame(&mut session, Channel::User, &frame, None);
        assert_eq!(session.last_message_code, Command::EMPTY);

        apply_frame(&mut session, Channel::User, &frame, Some(&creds));
        assert_eq!(session.last_message_code, Command::STATUS);
    }

    #[test]
    fn user_frame_with_wrong_key_is_dropped() {
        let creds = credentials();
        let frame = envelope::seal(Command::STATUS, &[0x00], &[0x99; 32], creds.authorization_id)
            .unwrap();

        let mut session = SessionState::new();
        apply_frame(&mut session, Channel::User, &frame, Some(&creds));
        assert_eq!(session.last_message_code, Command::EMPTY);
        assert!(!session.crc_check_ok);
    }
}
