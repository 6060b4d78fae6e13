//! The pairing handshake.
//!
//! Seven steps over the plain (GDIO) channel: exchange public keys, derive
//! the long-term key, prove possession of it twice (authenticator, then
//! authorization data), confirm the authorization ID the lock assigns, and
//! wait for the completion status. Each step has its own deadline; a step
//! that makes no progress ends the run with a timeout.
//!
//! Every write here goes through the plain frame codec; the encrypted
//! channel only exists once this handshake has produced credentials.

use tokio::time::Instant;
use tracing::debug;
use zeroize::Zeroizing;

use crate::dispatch::recv_and_apply;
use crate::error::{CmdError, CmdResult};
use crate::session::{SessionState, STATUS_COMPLETE};
use crate::transport::Transport;
use nuki_crypto::keys::derive_long_term_key;
use nuki_crypto::{authenticator, KeyPair};
use nuki_wire::{encode_plain, Command};

/// Kind of client an authorization belongs to, as sent in the
/// authorization data message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum IdType {
    App = 0,
    #[default]
    Bridge = 1,
    Fob = 2,
    Keypad = 3,
}

/// Inputs of a pairing run. The keypair is bootstrapped by the caller and
/// only borrowed here.
pub(crate) struct PairingParams<'a> {
    pub keys: &'a KeyPair,
    pub device_name: &'a str,
    pub app_id: u32,
    pub id_type: IdType,
    pub step_timeout: std::time::Duration,
}

/// What a successful run produces; the controller persists it.
pub(crate) struct PairingOutcome {
    pub long_term_key: Zeroizing<[u8; 32]>,
    pub authorization_id: [u8; 4],
    pub lock_id: [u8; 16],
}

pub(crate) async fn run<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    params: &PairingParams<'_>,
) -> CmdResult<PairingOutcome> {
    session.reset_pairing();
    let result = handshake(transport, session, params).await;
    // Terminal either way: the scratch space must not outlive the run.
    session.reset_pairing();
    result
}

async fn handshake<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    params: &PairingParams<'_>,
) -> CmdResult<PairingOutcome> {
    let name = encode_device_name(params.device_name)?;

    // Ask the lock for its public key.
    debug!("pairing: requesting lock public key");
    send_plain(
        transport,
        Command::REQUEST_DATA,
        &Command::PUBLIC_KEY.raw().to_le_bytes(),
    )
    .await?;
    wait_for(transport, session, params, |s| {
        s.remote_public_key != [0u8; 32]
    })
    .await?;
    let remote_public_key = session.remote_public_key;

    // Send ours back and derive the shared long-term key k.
    debug!("pairing: sending client public key");
    send_plain(transport, Command::PUBLIC_KEY, &params.keys.public_key).await?;
    let long_term_key = Zeroizing::new(derive_long_term_key(params.keys, &remote_public_key));

    // First challenge: authenticate both public keys.
    wait_for(transport, session, params, SessionState::has_challenge_nonce).await?;
    let nonce = session.consume_challenge_nonce();
    let auth = authenticator(
        &long_term_key,
        &[&params.keys.public_key, &remote_public_key, &nonce],
    );
    debug!("pairing: sending authenticator");
    send_plain(transport, Command::AUTHORIZATION_AUTHENTICATOR, &auth).await?;

    // Second challenge: authenticate the authorization data.
    wait_for(transport, session, params, SessionState::has_challenge_nonce).await?;
    let challenge = session.consume_challenge_nonce();
    let mut client_nonce = [0u8; 32];
    getrandom::getrandom(&mut client_nonce).map_err(|_| CmdError::Rng)?;

    // id_type(1) || app_id(4) || name(32) || client_nonce(32), with the
    // challenge appended for the authenticator only.
    let id_type = [params.id_type as u8];
    let app_id = params.app_id.to_le_bytes();
    let auth = authenticator(
        &long_term_key,
        &[&id_type, &app_id, &name, &client_nonce, &challenge],
    );
    let mut message = Vec::with_capacity(101);
    message.extend_from_slice(&auth);
    message.extend_from_slice(&id_type);
    message.extend_from_slice(&app_id);
    message.extend_from_slice(&name);
    message.extend_from_slice(&client_nonce);
    debug!("pairing: sending authorization data");
    send_plain(transport, Command::AUTHORIZATION_DATA, &message).await?;

    // The lock answers with our authorization ID, its own ID and a final
    // challenge; confirm the authorization ID under that challenge.
    wait_for(transport, session, params, |s| {
        s.authorization_id != [0u8; 4] && s.has_challenge_nonce()
    })
    .await?;
    let authorization_id = session.authorization_id;
    let lock_id = session.lock_id;
    let challenge = session.consume_challenge_nonce();
    let auth = authenticator(&long_term_key, &[&authorization_id, &challenge]);
    let mut confirmation = Vec::with_capacity(36);
    confirmation.extend_from_slice(&auth);
    confirmation.extend_from_slice(&authorization_id);
    debug!("pairing: confirming authorization id");
    send_plain(transport, Command::AUTHORIZATION_ID_CONFIRMATION, &confirmation).await?;

    wait_for(transport, session, params, |s| {
        s.received_status == STATUS_COMPLETE
    })
    .await?;
    debug!("pairing: complete");

    Ok(PairingOutcome {
        long_term_key,
        authorization_id,
        lock_id,
    })
}

/// Pump inbound frames into the session until `ready` holds. The deadline
/// restarts at each step, so one stalled step ends the whole run.
async fn wait_for<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    params: &PairingParams<'_>,
    ready: impl Fn(&SessionState) -> bool,
) -> CmdResult<()> {
    let deadline = Instant::now() + params.step_timeout;
    while !ready(session) {
        recv_and_apply(transport, session, None, deadline).await?;
    }
    Ok(())
}

async fn send_plain<T: Transport>(
    transport: &T,
    command: Command,
    payload: &[u8],
) -> CmdResult<()> {
    let frame = encode_plain(command, payload)
        .map_err(|_| CmdError::InvalidArgument("payload exceeds frame limit"))?;
    transport.write_pairing(&frame).await?;
    Ok(())
}

fn encode_device_name(device_name: &str) -> CmdResult<[u8; 32]> {
    let bytes = device_name.as_bytes();
    if bytes.len() > 32 {
        return Err(CmdError::InvalidArgument("device name exceeds 32 bytes"));
    }
    let mut name = [0u8; 32];
    name[..bytes.len()].copy_from_slice(bytes);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_name_is_zero_padded() {
        let name = encode_device_name("Bridge").unwrap();
        assert_eq!(&name[..6], b"Bridge");
        assert!(name[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_device_name_rejected() {
        let too_long = "x".repeat(33);
        assert!(matches!(
            encode_device_name(&too_long),
            Err(CmdError::InvalidArgument(_))
        ));
    }
}
