mod common;

use std::time::Duration;

use common::*;
use rusty_paybook::prelude::*;

fn synced_fixture() -> Fixture {
    let mut pablo = contact("c1", "Pablo Diaz", PABLO_ADDRESS);
    pablo.email = Some("pablo@wallet.io".to_string());
    let fx = fixture(
        FakeDirectory::with_remote(vec![pablo, contact("c2", "Ana Maria", ANA_ADDRESS)]),
        &[],
    );
    fx.book.load();
    fx
}

fn defaults() -> TransferDefaults {
    TransferDefaults {
        network: "sepolia".to_string(),
        token_address: "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7"
            .to_string(),
        decimals: 18,
    }
}

#[test]
fn find_is_case_insensitive_substring() {
    let fx = synced_fixture();

    assert_eq!(fx.book.find_by_name("pab").map(|c| c.id), Some("c1".to_string()));
    assert_eq!(fx.book.find_by_name("MARIA").map(|c| c.id), Some("c2".to_string()));
    assert_eq!(fx.book.find_by_name("wallet.io").map(|c| c.id), Some("c1".to_string()));
    assert!(fx.book.find_by_name("zed").is_none());
    assert!(fx.book.find_by_name("   ").is_none());
}

#[test]
fn find_returns_first_match_in_order() {
    let fx = synced_fixture();

    // "a" is in both names; Pablo comes first
    assert_eq!(fx.book.find_by_name("a").map(|c| c.id), Some("c1".to_string()));
}

#[test]
fn unknown_contact_fails_without_transfer() {
    let fx = synced_fixture();

    let err = fx
        .book
        .transfer_to_contact("unknown-name", 10.0, "sepolia", "0x01", 18)
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(fx.wallet.transfers().is_empty());
}

#[test]
fn transfer_uses_resolved_address() -> Result<(), AppError> {
    let fx = synced_fixture();

    let receipt = fx
        .book
        .transfer_to_contact("ana", 5.5, "mainnet", "0x01", 6)?;

    assert_eq!(receipt.transaction_hash.as_deref(), Some("0xtx1"));
    let sent = fx.wallet.transfers();
    assert_eq!(
        sent,
        vec![TransferRequest {
            network: "mainnet".to_string(),
            from_address: fx.wallet.address.clone(),
            to_address: ANA_ADDRESS.to_string(),
            token_address: "0x01".to_string(),
            amount: 5.5,
            decimals: 6,
        }]
    );
    Ok(())
}

#[test]
fn wallet_rejection_is_reported() {
    let fx = synced_fixture();
    *fx.wallet.reject_with.lock().unwrap() = Some("Insufficient balance".to_string());

    let err = fx
        .book
        .transfer_to_contact("Pablo", 1.0, "sepolia", "0x01", 18)
        .unwrap_err();

    assert!(err.to_string().contains("Insufficient balance"));
}

#[test]
fn non_positive_amount_is_rejected_locally() {
    let fx = synced_fixture();

    for amount in [0.0, -3.0, f64::NAN] {
        let err = fx
            .book
            .transfer_to_contact("Pablo", amount, "sepolia", "0x01", 18)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
    assert!(fx.wallet.transfers().is_empty());
}

#[test]
fn directory_transfer_reports_outcome() {
    let fx = synced_fixture();

    assert!(
        fx.book
            .transfer_via_directory("Pablo Diaz", 2.0, "sepolia", "0x01", 18)
            .is_ok()
    );

    let err = fx
        .book
        .transfer_via_directory("Nobody", 2.0, "sepolia", "0x01", 18)
        .unwrap_err();
    assert!(matches!(err, AppError::Transfer(ref msg) if msg == "Contact not found"));

    let sent = fx.directory.transfers.lock().unwrap().clone();
    assert_eq!(sent[0].user_email.as_deref(), Some(OWNER_EMAIL));
    assert_eq!(sent[0].from_address, fx.wallet.address);
}

#[test]
fn assistant_acknowledges_then_reports_transfer() {
    let fx = synced_fixture();
    let (assistant, events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    let reply = assistant.respond("send 10 to Pablo");
    assert_eq!(reply, "Sending 10 to Pablo...");

    match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        AssistantEvent::TransferSettled {
            name,
            amount,
            result,
        } => {
            assert_eq!(name, "Pablo");
            assert_eq!(amount, 10.0);
            assert!(result.is_ok());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(fx.wallet.transfers()[0].to_address, PABLO_ADDRESS);
}

#[test]
fn assistant_reports_unknown_contact_later() {
    let fx = synced_fixture();
    let (assistant, events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    assert_eq!(assistant.respond("enviar 5.5 a Zed"), "Sending 5.5 to Zed...");

    match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        AssistantEvent::TransferSettled { result, .. } => {
            assert!(result.unwrap_err().contains("Not found"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(fx.wallet.transfers().is_empty());
}

#[test]
fn assistant_rejects_bad_amount_without_scheduling() {
    let fx = synced_fixture();
    let (assistant, events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    let reply = assistant.respond("send -3 to Bob");

    assert!(reply.starts_with("Invalid amount"));
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn assistant_reports_last_known_balance() {
    let fx = synced_fixture();
    let (assistant, _events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    assert_eq!(assistant.respond("balance"), "Balance not available yet");

    assistant.set_balance(Some(12.3456));
    assert_eq!(assistant.respond("Cual es mi SALDO?"), "Your balance is 12.35");
}

#[test]
fn assistant_falls_back_to_help() {
    let fx = synced_fixture();
    let (assistant, _events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    assert_eq!(
        assistant.respond("hola"),
        rusty_paybook::domain::command::HELP_TEXT
    );
}

#[test]
fn agent_transfer_schedules_balance_refresh() {
    let fx = synced_fixture();
    let (assistant, events) =
        Assistant::new(fx.book.clone(), defaults(), Duration::ZERO).unwrap();

    assistant.on_agent_reply(&AgentReply {
        text: "Checked your balance".to_string(),
        transfer_executed: false,
    });
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());

    assistant.on_agent_reply(&AgentReply {
        text: "Sent 3 to Ana".to_string(),
        transfer_executed: true,
    });
    assert_eq!(
        events.recv_timeout(Duration::from_secs(5)).unwrap(),
        AssistantEvent::BalanceRefreshDue
    );
}
