//! Card lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the public client
//! API over real HTTP through the default `ureq` transport. Covers session
//! bootstrap, every card operation, and the three failure kinds the client
//! reports for well-formed responses.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bento_core::{
    Address, AddressType, CardStatus, CardType, Credentials, Error, Session, SessionConfig,
};
use mock_server::{DEMO_ACCESS_KEY, DEMO_SECRET_KEY};

/// Spawn the mock server on its own runtime thread and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn open_session(addr: SocketAddr) -> Session {
    Session::obtain(
        &SessionConfig::new(&format!("http://{addr}")),
        &Credentials::new(DEMO_ACCESS_KEY, DEMO_SECRET_KEY),
    )
    .unwrap()
}

#[test]
fn card_lifecycle() {
    let addr = start_server();
    let session = open_session(addr);

    // Step 1: the session carries the application descriptor.
    assert!(!session.authorization().is_empty());
    assert_eq!(session.application().access_key.as_deref(), Some(DEMO_ACCESS_KEY));

    // Step 2: business and an empty card list.
    let business = session.get_business().unwrap();
    assert_eq!(business.business_id, Some(12345));
    assert_eq!(business.addresses[0].address_type, Some(AddressType::BusinessAddress));
    assert!(session.get_cards().unwrap().is_empty());

    // Step 3: create a card; the service assigns id and digits.
    let card = session.new_card(CardType::EmployeeCard, "Travel").unwrap();
    assert_eq!(card.card_id, Some(1001));
    assert_eq!(card.card_type, Some(CardType::EmployeeCard));
    assert_eq!(card.status, Some(CardStatus::TurnedOff));
    assert_eq!(card.alias.as_deref(), Some("Travel"));
    let last_four = card.last_four.clone().unwrap();
    assert_eq!(last_four, "4001");

    // Step 4: turn on, then off again.
    let card = card.turn_on().unwrap();
    assert_eq!(card.status, Some(CardStatus::TurnedOn));
    let card = card.turn_off().unwrap();
    assert_eq!(card.status, Some(CardStatus::TurnedOff));

    // Step 5: activation with the wrong digits is a business error.
    let err = card.activate("0000").unwrap_err();
    let business_err = err.as_business().expect("business error");
    assert_eq!(business_err.code(), "INVALID_LAST_FOUR");
    assert_eq!(business_err.message(), "Last four digits do not match");

    let card = card.activate(&last_four).unwrap();
    assert_eq!(card.lifecycle_status.as_deref(), Some("ACTIVATED"));

    // Step 6: rename through a full-record put.
    let mut card = card;
    card.card_mut().alias = Some("Renamed".to_string());
    let card = card.put().unwrap();
    assert_eq!(card.alias.as_deref(), Some("Renamed"));

    // Step 7: reissue prints new digits and the PAN follows them.
    let card = card.reissue().unwrap();
    let reissued_four = card.last_four.clone().unwrap();
    assert_ne!(reissued_four, last_four);
    let pan = card.pan_and_cvv().unwrap();
    assert!(pan.pan.unwrap().ends_with(&reissued_four));
    assert_eq!(pan.cvv.as_deref(), Some("123"));

    // Step 8: billing address must be set before it can be read.
    let err = card.billing_address().unwrap_err();
    assert_eq!(err.as_business().unwrap().code(), "NOT_FOUND");

    let address = Address {
        active: true,
        address_type: Some(AddressType::UserAddress),
        city: Some("Oakland".to_string()),
        street: Some("1 Broadway".to_string()),
        zip_code: Some("94607".to_string()),
        ..Address::default()
    };
    let stored = card.set_billing_address(&address).unwrap();
    assert!(stored.id.is_some());
    assert_eq!(card.billing_address().unwrap().city.as_deref(), Some("Oakland"));

    let moved = Address {
        city: Some("Berkeley".to_string()),
        ..address
    };
    let updated = card.update_billing_address(&moved).unwrap();
    assert_eq!(updated.id, stored.id);
    assert_eq!(card.billing_address().unwrap().city.as_deref(), Some("Berkeley"));

    // Step 9: the card shows up in listings and transactions.
    let cards = session.get_cards().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].alias.as_deref(), Some("Renamed"));

    let transactions = session.get_transactions().unwrap();
    assert_eq!(transactions.size, Some(1));
    let first = &transactions.card_transactions[0];
    assert_eq!(first.card.as_ref().unwrap().card_id, Some(1001));
    assert_eq!(first.payee.as_ref().unwrap().name.as_deref(), Some("Coffee Shop"));

    // Step 10: a deleted card refuses to turn on.
    let card = card.delete().unwrap();
    assert_eq!(card.status, Some(CardStatus::Canceled));
    let err = card.turn_on().unwrap_err();
    assert!(matches!(
        err,
        Error::UnexpectedState {
            requested: CardStatus::TurnedOn,
            actual: Some(CardStatus::Canceled),
        }
    ));
}

#[test]
fn bad_credentials_yield_missing_token() {
    let addr = start_server();
    let err = Session::obtain(
        &SessionConfig::new(&format!("http://{addr}/")),
        &Credentials::new(DEMO_ACCESS_KEY, "not-the-secret"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingAuthToken));
}

#[test]
fn unknown_card_is_business_error() {
    let addr = start_server();
    let session = open_session(addr);

    let err = session.get_card(42).unwrap_err();
    let business_err = err.as_business().expect("business error");
    assert_eq!(business_err.code(), "NOT_FOUND");
    assert_eq!(err.to_string(), "Bento Error: [Card not found], [NOT_FOUND]");
}

#[test]
fn sink_sees_both_sides_of_every_call() {
    let addr = start_server();
    let mut session = open_session(addr);

    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    session.set_sink(move |line: &str| captured.lock().unwrap().push(line.to_string()));

    session.new_card(CardType::CategoryCard, "Supplies").unwrap();
    session.get_cards().unwrap();

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with(&format!(
        "Sending request: [method: POST] [uri: http://{addr}/cards] body: "
    )));
    assert!(lines[0].contains(r#""lastFour":3215"#));
    assert!(lines[1].starts_with("Received response: [status: 200] "));
    assert_eq!(
        lines[2],
        format!("Sending request: [method: GET] [uri: http://{addr}/cards]")
    );
    assert!(lines[3].contains("Supplies"));
}

#[test]
fn stale_token_is_rejected() {
    let addr = start_server();
    let session = open_session(addr);
    let forged = Session::with_token(
        session.base_url(),
        "forged-token",
        bento_core::UreqTransport::default(),
    );

    let err = forged.get_business().unwrap_err();
    assert_eq!(err.as_business().unwrap().code(), "UNAUTHORIZED");
}
