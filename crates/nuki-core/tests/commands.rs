//! Command orchestration scenarios against the scripted mock lock.

mod support;

use std::sync::Arc;

use support::{test_config, MockLock, Reply, LOCK_ADDRESS};

use nuki_core::{
    Action, BleAddress, Channel, CmdError, CredentialStore, Credentials, InMemoryStore, NukiClient,
};
use nuki_crypto::envelope;
use nuki_wire::types::{Config, KeyTurnerState, LockAction};
use nuki_wire::Command;

const KEY: [u8; 32] = [0x77; 32];
const AUTH_ID: [u8; 4] = [1, 2, 3, 4];
const PIN: u16 = 1234;

async fn paired_client(script: Vec<Vec<Reply>>) -> NukiClient<MockLock, InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    Credentials {
        secret_key: KEY,
        ble_address: LOCK_ADDRESS,
        authorization_id: AUTH_ID,
        security_pin: PIN,
    }
    .save(&*store)
    .await
    .unwrap();

    let transport = MockLock::new(script).with_credentials(KEY, AUTH_ID);
    NukiClient::new(transport, store, test_config())
}

fn open_write(frame: &[u8]) -> (Command, Vec<u8>) {
    envelope::open(frame, &KEY, AUTH_ID).unwrap()
}

#[tokio::test]
async fn request_key_turner_state_populates_snapshot() {
    let script = vec![vec![Reply::Encrypted(
        Command::KEYTURNER_STATES,
        vec![0u8; 21],
    )]];
    let client = paired_client(script).await;

    let state = client.request_key_turner_state().await.unwrap();
    assert_eq!(state, KeyTurnerState::default());
    assert_eq!(client.key_turner_state().await, Some(state));

    // The request itself is an encrypted RequestData for 0x000C.
    let writes = client.transport().writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, Channel::User);
    let (command, payload) = open_write(&writes[0].1);
    assert_eq!(command, Command::REQUEST_DATA);
    assert_eq!(payload, Command::KEYTURNER_STATES.raw().to_le_bytes());
}

#[tokio::test]
async fn lock_action_runs_accept_then_complete() {
    let challenge = [0xDD; 32];
    let script = vec![
        vec![Reply::Encrypted(Command::CHALLENGE, challenge.to_vec())],
        vec![
            Reply::Encrypted(Command::STATUS, vec![0x01]),
            Reply::Encrypted(Command::STATUS, vec![0x00]),
        ],
    ];
    let client = paired_client(script).await;

    client
        .lock_action(LockAction::Unlock, 0, None)
        .await
        .unwrap();

    let writes = client.transport().writes();
    assert_eq!(writes.len(), 2);

    // First write asks for a challenge.
    let (command, payload) = open_write(&writes[0].1);
    assert_eq!(command, Command::REQUEST_DATA);
    assert_eq!(payload, Command::CHALLENGE.raw().to_le_bytes());

    // Second write is the action with the consumed nonce appended.
    let (command, payload) = open_write(&writes[1].1);
    assert_eq!(command, Command::LOCK_ACTION);
    assert_eq!(payload.len(), 1 + 4 + 1 + 32);
    assert_eq!(payload[0], u8::from(LockAction::Unlock));
    assert_eq!(&payload[1..5], &0x1000_0001u32.to_le_bytes());
    assert_eq!(payload[5], 0);
    assert_eq!(&payload[6..], &challenge);
}

#[tokio::test]
async fn pin_bearing_retrieval_collects_log_entries() {
    let challenge = [0xEE; 32];
    let mut entries = Vec::new();
    for index in 1u8..=3 {
        let mut entry = vec![0u8; 53];
        entry[0] = index;
        entries.push(Reply::Encrypted(Command::LOG_ENTRY, entry));
    }
    entries.push(Reply::Encrypted(
        Command::LOG_ENTRY_COUNT,
        vec![1, 3, 0, 0, 0],
    ));

    let script = vec![
        vec![Reply::Encrypted(Command::CHALLENGE, challenge.to_vec())],
        entries,
    ];
    let client = paired_client(script).await;

    client.retrieve_log_entries(0, 10, 0, false).await.unwrap();

    let log = client.log_entries().await;
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].index, 1);
    assert_eq!(log[2].index, 3);
    assert!(client.logging_enabled().await);
    assert_eq!(client.log_entry_count().await, 3);

    // The command payload ends with nonce || pin.
    let writes = client.transport().writes();
    let (command, payload) = open_write(&writes[1].1);
    assert_eq!(command, Command::REQUEST_LOG_ENTRIES);
    assert_eq!(payload.len(), 8 + 32 + 2);
    assert_eq!(&payload[8..40], &challenge);
    assert_eq!(&payload[40..], &PIN.to_le_bytes());
}

#[tokio::test]
async fn retrieval_clears_previous_result_list() {
    let script = vec![
        vec![Reply::Encrypted(Command::CHALLENGE, vec![0xE1; 32])],
        vec![
            {
                let mut entry = vec![0u8; 53];
                entry[0] = 9;
                Reply::Encrypted(Command::LOG_ENTRY, entry)
            },
            Reply::Encrypted(Command::LOG_ENTRY_COUNT, vec![1, 1, 0, 0, 0]),
        ],
        vec![Reply::Encrypted(Command::CHALLENGE, vec![0xE2; 32])],
        vec![Reply::Encrypted(Command::LOG_ENTRY_COUNT, vec![1, 0, 0, 0, 0])],
    ];
    let client = paired_client(script).await;

    client.retrieve_log_entries(0, 10, 0, false).await.unwrap();
    assert_eq!(client.log_entries().await.len(), 1);

    // The second retrieval returns no entries; the old list must be gone.
    client.retrieve_log_entries(9, 10, 0, false).await.unwrap();
    assert!(client.log_entries().await.is_empty());
}

#[tokio::test]
async fn request_config_succeeds_on_crc_signal() {
    let script = vec![
        vec![Reply::Encrypted(Command::CHALLENGE, vec![0xCA; 32])],
        vec![Reply::Encrypted(Command::CONFIG, vec![0u8; 74])],
    ];
    let client = paired_client(script).await;

    let config = client.request_config().await.unwrap();
    assert_eq!(config, Config::decode(&[0u8; 74]).unwrap());
}

#[tokio::test]
async fn error_report_fails_the_action_and_is_retained() {
    let script = vec![vec![Reply::Encrypted(
        Command::ERROR_REPORT,
        vec![0x20, 0x0C, 0x00],
    )]];
    let client = paired_client(script).await;

    let result = client.request_key_turner_state().await;
    assert_eq!(
        result.unwrap_err(),
        CmdError::Failed { code: 0x20, command: Command::KEYTURNER_STATES }
    );
    assert_eq!(
        client.last_error().await,
        Some((0x20, Command::KEYTURNER_STATES))
    );
}

#[tokio::test]
async fn execute_without_credentials_sends_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let client = NukiClient::new(MockLock::new(vec![]), store, test_config());

    let action = Action::plain(
        Command::REQUEST_DATA,
        Command::KEYTURNER_STATES.raw().to_le_bytes().to_vec(),
    );
    assert_eq!(client.execute(action).await, Err(CmdError::NotPaired));
    assert!(client.transport().writes().is_empty());
    assert_eq!(client.transport().connect_attempts(), 0);
}

#[tokio::test]
async fn command_times_out_when_lock_stays_silent() {
    let client = paired_client(vec![]).await;

    let result = client.request_battery_report().await;
    assert_eq!(result, Err(CmdError::Timeout));
}

#[tokio::test]
async fn silent_challenge_reply_times_out_the_pin_command() {
    // The challenge arrives but the command reply never does.
    let script = vec![vec![Reply::Encrypted(Command::CHALLENGE, vec![0xAB; 32])]];
    let client = paired_client(script).await;

    let result = client.verify_security_pin().await;
    assert_eq!(result, Err(CmdError::Timeout));
}

#[tokio::test]
async fn concurrent_actions_are_serialized() {
    let state_reply = || vec![Reply::Encrypted(Command::KEYTURNER_STATES, vec![0u8; 21])];
    let script = vec![state_reply(), state_reply()];
    let client = paired_client(script).await;

    let (first, second) = tokio::join!(
        client.request_key_turner_state(),
        client.request_key_turner_state(),
    );
    first.unwrap();
    second.unwrap();

    // Two requests, two writes, no interleaving within an action.
    assert_eq!(client.transport().writes().len(), 2);
}

#[tokio::test]
async fn set_security_pin_updates_the_store() {
    let script = vec![
        vec![Reply::Encrypted(Command::CHALLENGE, vec![0xAC; 32])],
        vec![Reply::Encrypted(Command::STATUS, vec![0x00])],
    ];
    let client = paired_client(script).await;

    client.set_security_pin(4321).await.unwrap();

    let stored = client
        .store()
        .get_bytes(nuki_core::store::KEY_SECURITY_PIN)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, 4321u16.to_le_bytes());
}

#[tokio::test]
async fn address_survives_reversed_storage_round_trip() {
    let client = paired_client(vec![]).await;
    let credentials = Credentials::load(&**client.store()).await.unwrap().unwrap();
    assert_eq!(credentials.ble_address, LOCK_ADDRESS);
    assert_eq!(credentials.ble_address, BleAddress([0x54, 0xD2, 0x72, 0x01, 0x02, 0x03]));
}
