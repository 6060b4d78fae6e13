//! Command orchestration over the encrypted channel.
//!
//! Four request/response shapes, selected by the action's category. All of
//! them are edge-triggered on the two dispatch signals
//! (`last_message_code`, `crc_check_ok`); every terminal transition clears
//! `last_message_code` so a stale reply can never satisfy the next action.
//! At most one action is in flight at a time; the session controller
//! serializes them.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::dispatch::{drain_pending, recv_and_apply};
use crate::error::{CmdError, CmdResult};
use crate::session::{SessionState, STATUS_ACCEPTED, STATUS_COMPLETE, STATUS_NONE};
use crate::store::Credentials;
use crate::transport::Transport;
use nuki_crypto::envelope;
use nuki_wire::Command;

/// Documented upper bound for an action payload. The largest payload the
/// action surface produces is the 86-byte authorization invite.
pub const MAX_ACTION_PAYLOAD: usize = 96;

/// How long a finished action keeps listening for stragglers of its own
/// reply stream.
const SETTLE_TIMEOUT: Duration = Duration::from_millis(20);

/// Request/response shape of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandCategory {
    /// One request, one data reply.
    Plain,
    /// Challenge handshake, then the command carrying the challenge nonce.
    WithChallenge,
    /// Like [`CommandCategory::WithChallenge`], but the lock acknowledges
    /// twice: `Status::Accepted`, then `Status::Complete`.
    WithChallengeAndAccept,
    /// Like [`CommandCategory::WithChallenge`], with the security PIN
    /// appended after the nonce.
    WithChallengeAndPin,
}

/// One in-flight unit of work.
#[derive(Clone, Debug)]
pub struct Action {
    pub category: CommandCategory,
    pub command: Command,
    pub payload: Vec<u8>,
}

impl Action {
    pub fn plain(command: Command, payload: Vec<u8>) -> Self {
        Action { category: CommandCategory::Plain, command, payload }
    }

    pub fn with_challenge(command: Command, payload: Vec<u8>) -> Self {
        Action { category: CommandCategory::WithChallenge, command, payload }
    }

    pub fn with_challenge_and_accept(command: Command, payload: Vec<u8>) -> Self {
        Action { category: CommandCategory::WithChallengeAndAccept, command, payload }
    }

    pub fn with_challenge_and_pin(command: Command, payload: Vec<u8>) -> Self {
        Action { category: CommandCategory::WithChallengeAndPin, command, payload }
    }
}

/// Drive `action` to a terminal result.
pub(crate) async fn execute<T: Transport>(
    transport: &T,
    session: &mut SessionState,
    credentials: &Credentials,
    action: &Action,
    step_timeout: Duration,
) -> CmdResult<()> {
    if action.payload.len() > MAX_ACTION_PAYLOAD {
        return Err(CmdError::InvalidArgument("action payload too large"));
    }

    let mut machine = Machine { transport, session: &mut *session, credentials, step_timeout };
    let result = match action.category {
        CommandCategory::Plain => machine.run_plain(action).await,
        CommandCategory::WithChallenge => machine.run_with_challenge(action, None).await,
        CommandCategory::WithChallengeAndPin => {
            let pin = machine.credentials.security_pin;
            machine.run_with_challenge(action, Some(pin)).await
        }
        CommandCategory::WithChallengeAndAccept => {
            machine.run_with_challenge_accept(action).await
        }
    };
    if result.is_ok() {
        drain_pending(transport, session, Some(credentials), SETTLE_TIMEOUT).await;
    }
    session.last_message_code = Command::EMPTY;
    result
}

struct Machine<'a, T: Transport> {
    transport: &'a T,
    session: &'a mut SessionState,
    credentials: &'a Credentials,
    step_timeout: Duration,
}

impl<T: Transport> Machine<'_, T> {
    async fn run_plain(&mut self, action: &Action) -> CmdResult<()> {
        debug!(command = %action.command, "sending command");
        self.session.last_message_code = Command::EMPTY;
        self.send(action.command, &action.payload).await?;

        let deadline = self.deadline();
        loop {
            self.step(deadline).await?;
            match self.session.last_message_code {
                Command::EMPTY => continue,
                Command::ERROR_REPORT => return Err(self.failed()),
                _ => return Ok(()),
            }
        }
    }

    async fn run_with_challenge(&mut self, action: &Action, pin: Option<u16>) -> CmdResult<()> {
        self.request_challenge(false).await?;

        debug!(command = %action.command, "sending command");
        self.session.last_message_code = Command::EMPTY;
        self.session.crc_check_ok = false;
        let mut payload = action.payload.clone();
        payload.extend_from_slice(&self.session.consume_challenge_nonce());
        if let Some(pin) = pin {
            payload.extend_from_slice(&pin.to_le_bytes());
        }
        self.send(action.command, &payload).await?;

        let deadline = self.deadline();
        loop {
            self.step(deadline).await?;
            if self.session.last_message_code == Command::ERROR_REPORT {
                return Err(self.failed());
            }
            if self.session.crc_check_ok {
                return Ok(());
            }
        }
    }

    async fn run_with_challenge_accept(&mut self, action: &Action) -> CmdResult<()> {
        self.request_challenge(true).await?;

        debug!(command = %action.command, "sending command");
        self.session.last_message_code = Command::EMPTY;
        self.session.received_status = STATUS_NONE;
        let mut payload = action.payload.clone();
        payload.extend_from_slice(&self.session.consume_challenge_nonce());
        self.send(action.command, &payload).await?;

        // First acknowledgement: the lock accepted and started moving.
        let deadline = self.deadline();
        loop {
            self.step(deadline).await?;
            match self.session.last_message_code {
                Command::ERROR_REPORT => return Err(self.failed()),
                Command::STATUS if self.session.received_status == STATUS_ACCEPTED => break,
                _ => continue,
            }
        }
        debug!(command = %action.command, "command accepted");
        self.session.last_message_code = Command::EMPTY;
        self.session.received_status = STATUS_NONE;

        // Second acknowledgement: the motion finished.
        let deadline = self.deadline();
        loop {
            self.step(deadline).await?;
            match self.session.last_message_code {
                Command::ERROR_REPORT => return Err(self.failed()),
                Command::STATUS if self.session.received_status == STATUS_COMPLETE => {
                    debug!(command = %action.command, "command complete");
                    return Ok(());
                }
                _ => continue,
            }
        }
    }

    /// Ask for a challenge and wait for the nonce. When `fail_on_error` is
    /// set an `ErrorReport` ends the run; otherwise anything but the
    /// challenge is ignored until the deadline.
    async fn request_challenge(&mut self, fail_on_error: bool) -> CmdResult<()> {
        debug!("requesting challenge");
        self.session.last_message_code = Command::EMPTY;
        self.send(Command::REQUEST_DATA, &Command::CHALLENGE.raw().to_le_bytes())
            .await?;

        let deadline = self.deadline();
        loop {
            self.step(deadline).await?;
            match self.session.last_message_code {
                Command::CHALLENGE => return Ok(()),
                Command::ERROR_REPORT if fail_on_error => return Err(self.failed()),
                _ => continue,
            }
        }
    }

    async fn send(&mut self, command: Command, payload: &[u8]) -> CmdResult<()> {
        // Sealing fails only if the RNG does.
        let frame = envelope::seal(
            command,
            payload,
            &self.credentials.secret_key,
            self.credentials.authorization_id,
        )
        .map_err(|_| CmdError::Rng)?;
        self.transport.write_user(&frame).await?;
        Ok(())
    }

    async fn step(&mut self, deadline: Instant) -> CmdResult<()> {
        recv_and_apply(self.transport, self.session, Some(self.credentials), deadline).await
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.step_timeout
    }

    fn failed(&self) -> CmdError {
        CmdError::Failed {
            code: self.session.last_error_code.unwrap_or(0),
            command: self.session.last_error_command,
        }
    }
}
