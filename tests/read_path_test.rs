use mailsession::config::SessionConfig;
use mailsession::projector::{live_items, project_items};
use mailsession::store::{ItemCollection, MailItem};
use mailsession::{Address, DateBound, FormatError, MailError, MailSession, SnapshotStore};

const MAILBOX: &str = r#"{
    "accounts": [
        {
            "name": "Alin",
            "email": "alin@example.com",
            "folders": [
                {
                    "name": "Inbox",
                    "items": [
                        {
                            "received": "2019-08-29T08:05:00",
                            "subject": "Kick-off",
                            "body": "Agenda attached",
                            "html_body": "<p>Agenda attached</p>",
                            "sender": { "name": "Bob", "address": "bob@example.com" },
                            "recipients": [
                                { "name": "Alin", "address": "alin@example.com" }
                            ]
                        },
                        {
                            "received": "2019-09-04T09:30:00",
                            "subject": "Budget",
                            "body": "Numbers inside",
                            "sender": {
                                "name": "Carol",
                                "address": "/o=Corp/ou=Exchange/cn=Recipients/cn=carol",
                                "address_type": "EX",
                                "directory_address": "carol@corp.example.com"
                            },
                            "recipients": [
                                {
                                    "name": "Alin",
                                    "address": "/o=Corp/ou=Exchange/cn=Recipients/cn=alin",
                                    "address_type": "EX",
                                    "directory_address": "alin@example.com"
                                },
                                {
                                    "name": "Finance",
                                    "address": "/o=Corp/ou=Exchange/cn=Recipients/cn=finance",
                                    "address_type": "EX"
                                }
                            ]
                        },
                        {
                            "received": "2019-09-10T17:45:00",
                            "subject": "Retro",
                            "sender": { "name": "Bob", "address": "bob@example.com" }
                        }
                    ],
                    "folders": [ { "name": "Newsletters" } ]
                }
            ]
        },
        {
            "name": "Work",
            "email": "work@corp.example.com",
            "folders": [
                {
                    "name": "Inbox",
                    "folders": [
                        {
                            "name": "Planning",
                            "items": [
                                {
                                    "received": "2019-09-05T11:00:00",
                                    "subject": "Sprint 12",
                                    "sender": { "name": "Dan", "address": "dan@corp.example.com" }
                                },
                                {
                                    "class": 53,
                                    "received": "2019-09-06T11:00:00",
                                    "subject": "Accepted: Sprint 12",
                                    "sender": { "name": "Eve", "address": "eve@corp.example.com" }
                                }
                            ]
                        }
                    ]
                }
            ]
        }
    ]
}"#;

fn store() -> SnapshotStore {
    SnapshotStore::from_json(MAILBOX).expect("Failed to load test mailbox")
}

#[test]
fn test_list_accounts_in_client_order() {
    let store = store();
    let session = MailSession::new(&store);

    let accounts = session.list_accounts().unwrap();
    let emails: Vec<&str> = accounts.iter().map(|a| a.email.as_str()).collect();
    assert_eq!(emails, ["alin@example.com", "work@corp.example.com"]);
    assert_eq!(accounts[0].name, "Alin");
}

#[test]
fn test_defaults_to_first_account_inbox() {
    let store = store();
    let session = MailSession::new(&store);

    let items = session.resolve_items(None, None).unwrap();
    assert_eq!(items.count().unwrap(), 3);

    let items = session.resolve_items(Some("work@corp.example.com"), None).unwrap();
    assert_eq!(items.count().unwrap(), 0);
}

#[test]
fn test_nested_folder_path() {
    let store = store();
    let session = MailSession::new(&store);

    let items = session
        .resolve_items(Some("work@corp.example.com"), Some("Inbox > Planning"))
        .unwrap();
    assert_eq!(items.count().unwrap(), 2);

    let items = session
        .resolve_items(Some("work@corp.example.com"), Some("  Inbox>Planning "))
        .unwrap();
    assert_eq!(items.count().unwrap(), 2);
}

#[test]
fn test_path_missing_from_first_account_names_account_and_path() {
    let store = store();
    let session = MailSession::new(&store);

    match session.resolve_items(None, Some("Inbox > Planning")) {
        Err(MailError::Resolution { account, path, .. }) => {
            assert_eq!(account, "alin@example.com");
            assert_eq!(path, "Inbox > Planning");
        }
        Err(e) => panic!("expected a resolution error, got {}", e),
        Ok(_) => panic!("expected a resolution error"),
    }
}

#[test]
fn test_folder_names_are_case_sensitive() {
    let store = store();
    let session = MailSession::new(&store);

    assert!(matches!(
        session.resolve_items(None, Some("inbox")),
        Err(MailError::Resolution { .. })
    ));
}

#[test]
fn test_unknown_account_is_a_resolution_error() {
    let store = store();
    let session = MailSession::new(&store);

    let err = session
        .resolve_items(Some("nobody@example.com"), None)
        .err()
        .expect("unknown account should fail");
    let message = err.to_string();
    assert!(message.contains("nobody@example.com"), "{}", message);
    assert!(message.contains("Inbox"), "{}", message);
}

#[test]
fn test_empty_client_has_no_accounts() {
    let store = SnapshotStore::from_json(r#"{ "accounts": [] }"#).unwrap();
    let session = MailSession::new(&store);

    assert!(matches!(
        session.resolve_items(None, None),
        Err(MailError::NoAccounts)
    ));
}

#[test]
fn test_default_folder_comes_from_config() {
    let store = store();
    let config = SessionConfig {
        default_folder: "Inbox > Newsletters".to_string(),
        ..SessionConfig::default()
    };
    let session = MailSession::with_config(&store, config);

    let items = session.resolve_items(None, None).unwrap();
    assert_eq!(items.count().unwrap(), 0);
}

#[test]
fn test_filter_with_either_separator() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    let dashed = session
        .filter_by_date(&inbox, Some(DateBound::from("04-09-2019")), None)
        .unwrap();
    let slashed = session
        .filter_by_date(&inbox, Some(DateBound::from("04/09/2019")), None)
        .unwrap();
    assert_eq!(dashed.count().unwrap(), 2);
    assert_eq!(slashed.count().unwrap(), 2);

    let between = session
        .filter_by_date(
            &inbox,
            Some(DateBound::from("01/09/2019")),
            Some(DateBound::from("10-09-2019")),
        )
        .unwrap();
    assert_eq!(between.count().unwrap(), 1);
}

#[test]
fn test_filter_with_date_values() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    let end = chrono::NaiveDate::from_ymd_opt(2019, 9, 1).unwrap();
    let filtered = session.filter_by_date(&inbox, None, Some(end.into())).unwrap();
    assert_eq!(filtered.count().unwrap(), 1);
}

#[test]
fn test_filter_needs_a_bound() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    assert!(matches!(
        session.filter_by_date(&inbox, None, None),
        Err(MailError::MissingDateBound)
    ));
    assert!(matches!(
        session.filter_by_date(&inbox, Some(DateBound::from("")), None),
        Err(MailError::MissingDateBound)
    ));
}

#[test]
fn test_filter_rejects_malformed_bounds() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    assert!(matches!(
        session.filter_by_date(&inbox, Some(DateBound::from("2019/09/04")), None),
        Err(MailError::Format(FormatError::InvalidDate { param: "start", .. }))
    ));
    assert!(matches!(
        session.filter_by_date(&inbox, None, Some(DateBound::from("04.09.2019"))),
        Err(MailError::Format(FormatError::InvalidDate { param: "end", .. }))
    ));
}

#[test]
fn test_filter_without_matches_is_an_error() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    match session.filter_by_date(&inbox, Some(DateBound::from("01/01/2020")), None) {
        Err(MailError::EmptyResult { query }) => {
            assert_eq!(query, "[ReceivedTime] >= '01/01/2020'");
        }
        Err(e) => panic!("expected EmptyResult, got {}", e),
        Ok(_) => panic!("expected EmptyResult"),
    }
}

#[test]
fn test_projection_reads_fields_and_addresses() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();
    let filtered = session
        .filter_by_date(
            &inbox,
            Some(DateBound::from("04/09/2019")),
            Some(DateBound::from("05/09/2019")),
        )
        .unwrap();

    let records: Vec<_> = session
        .project_items(filtered)
        .collect::<mailsession::Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 1);

    let budget = &records[0];
    assert_eq!(budget.subject, "Budget");
    assert_eq!(budget.body, "Numbers inside");
    assert_eq!(budget.received.format("%d/%m/%Y %H:%M").to_string(), "04/09/2019 09:30");
    assert_eq!(budget.sender.name, "Carol");
    assert_eq!(budget.sender.email, Address::Smtp("carol@corp.example.com".to_string()));

    let names: Vec<&str> = budget.recipients.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Alin", "Finance"]);
    assert_eq!(budget.recipients[0].email, Address::Smtp("alin@example.com".to_string()));
    assert_eq!(
        budget.recipients[1].email,
        Address::Unresolved("/o=Corp/ou=Exchange/cn=Recipients/cn=finance".to_string())
    );
}

#[test]
fn test_projection_omits_live_item_by_default() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    for record in session.project_items(inbox) {
        let record = record.unwrap();
        assert!(record.mail_item.as_ref().is_none());
    }
}

#[test]
fn test_projection_keeps_the_consumed_item() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    let handles: Vec<_> = live_items(inbox.clone())
        .collect::<mailsession::Result<_>>()
        .unwrap();
    let records: Vec<_> = project_items(inbox, true)
        .collect::<mailsession::Result<_>>()
        .unwrap();

    assert_eq!(handles.len(), 3);
    assert_eq!(records.len(), 3);
    for (handle, record) in handles.iter().zip(&records) {
        let kept = record.mail_item.as_ref().expect("live item should be kept");
        assert!(kept.same_item(handle));
        assert_eq!(kept.subject(), record.subject);
    }
}

#[test]
fn test_projection_is_lazy_and_partial_reads_are_fine() {
    let store = store();
    let session = MailSession::new(&store);
    let inbox = session.resolve_items(None, None).unwrap();

    let mut records = session.project_items(inbox);
    let first = records.next().unwrap().unwrap();
    assert_eq!(first.subject, "Kick-off");
    drop(records);
}

#[test]
fn test_unsupported_item_stops_the_sequence() {
    let store = store();
    let session = MailSession::new(&store);
    let planning = session
        .resolve_items(Some("work@corp.example.com"), Some("Inbox > Planning"))
        .unwrap();

    let mut records = session.project_items(planning);
    assert_eq!(records.next().unwrap().unwrap().subject, "Sprint 12");
    assert!(matches!(
        records.next(),
        Some(Err(MailError::UnsupportedItem(_)))
    ));
    assert!(records.next().is_none());
}
