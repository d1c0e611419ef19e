//! Memory store and turn pipeline running against the JSON files on disk.

use chrono::{TimeDelta, Utc};
use tempfile::TempDir;

use doppel_core::chat::turn::TurnProcessor;
use doppel_core::clock::{Clock, ManualClock};
use doppel_core::context::ContextAssembler;
use doppel_core::directive::executor::DirectiveExecutor;
use doppel_core::directive::parser::parse_reply;
use doppel_core::memory::store::MemoryStore;
use doppel_core::service::account::AccountService;
use doppel_infra::filesystem::{chat_dir, users_db_path};
use doppel_infra::generator::CommandGenerator;
use doppel_infra::json::{JsonHistoryStore, JsonUserStore};
use doppel_types::directive::DirectiveOutcome;
use doppel_types::memory::{DeleteSelector, SaveOutcome, Serial};

fn stores(dir: &TempDir) -> (JsonUserStore, JsonHistoryStore) {
    (
        JsonUserStore::new(users_db_path(dir.path())),
        JsonHistoryStore::new(chat_dir(dir.path())),
    )
}

#[tokio::test]
async fn memory_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (users, history) = stores(&dir);
    AccountService::new(users.clone(), history)
        .create("dhairya", None)
        .await
        .unwrap();

    let clock = ManualClock::new(Utc::now());
    let mut store = MemoryStore::open(users.clone(), clock.clone(), "dhairya")
        .await
        .unwrap();
    store.save("likes tea", None).await.unwrap();
    store
        .save("at the dentist", Some(clock.now() + TimeDelta::hours(2)))
        .await
        .unwrap();
    store.save("gym at 6", None).await.unwrap();
    store.delete(&DeleteSelector::Serial(Serial(1))).await.unwrap();

    let reopened = MemoryStore::open(users, clock, "dhairya").await.unwrap();
    let facts: Vec<_> = reopened.list().cloned().collect();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].serial, Serial(2));
    assert_eq!(facts[0].text, "at the dentist");
    assert!(facts[0].expiry.is_some());
    assert_eq!(facts[1].serial, Serial(3));
    assert_eq!(reopened.next_serial(), Serial(4));
}

#[tokio::test]
async fn legacy_entries_are_migrated_once() {
    let dir = TempDir::new().unwrap();
    let db_path = users_db_path(dir.path());
    tokio::fs::write(
        &db_path,
        r#"{"dhairya": {"starting_command": "x", "analysis": null,
            "learning": ["likes tea", {"sno": 5, "text": "works nights"}, {"text": "hates mornings"}]}}"#,
    )
    .await
    .unwrap();

    let users = JsonUserStore::new(&db_path);
    let store = MemoryStore::open(users.clone(), ManualClock::new(Utc::now()), "dhairya")
        .await
        .unwrap();
    let serials: Vec<u64> = store.list().map(|f| f.serial.0).collect();
    assert_eq!(serials, vec![6, 5, 7]);

    let after_first = tokio::fs::read_to_string(&db_path).await.unwrap();
    MemoryStore::open(users, ManualClock::new(Utc::now()), "dhairya")
        .await
        .unwrap();
    let after_second = tokio::fs::read_to_string(&db_path).await.unwrap();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn end_to_end_timed_directive() {
    let dir = TempDir::new().unwrap();
    let (users, history) = stores(&dir);
    AccountService::new(users.clone(), history)
        .create("dhairya", None)
        .await
        .unwrap();

    let clock = ManualClock::new(Utc::now());
    let mut store = MemoryStore::open(users.clone(), clock.clone(), "dhairya")
        .await
        .unwrap();
    let reply = parse_reply("/save_to_memory likes coffee /for 1h");
    let execution = DirectiveExecutor::execute(&mut store, &reply.directives)
        .await
        .unwrap();
    assert!(matches!(
        execution.outcomes.as_slice(),
        [DirectiveOutcome::SavedTimed { serial: Serial(1), .. }]
    ));

    clock.advance(TimeDelta::minutes(61));
    assert_eq!(store.list().count(), 0);
    let swept = store.sweep(clock.now()).await.unwrap();
    assert_eq!(swept.len(), 1);

    let reopened = MemoryStore::open(users, clock, "dhairya").await.unwrap();
    assert!(reopened.is_empty());
    assert_eq!(reopened.next_serial(), Serial(2), "serials are never reused");
}

#[tokio::test]
async fn one_shot_save_survives_open_chat_session() {
    let dir = TempDir::new().unwrap();
    let (users, history) = stores(&dir);
    AccountService::new(users.clone(), history)
        .create("dhairya", None)
        .await
        .unwrap();

    let clock = ManualClock::new(Utc::now());
    let mut chat = MemoryStore::open(users.clone(), clock.clone(), "dhairya")
        .await
        .unwrap();

    // A second handle on the same file, as a separate `doppel remember` would use.
    let one_shot_users = JsonUserStore::new(users_db_path(dir.path()));
    let mut one_shot = MemoryStore::open(one_shot_users, clock.clone(), "dhairya")
        .await
        .unwrap();
    assert_eq!(
        one_shot.save("gym closes at 10", None).await.unwrap(),
        SaveOutcome::Saved(Serial(1))
    );
    drop(one_shot);

    assert_eq!(
        chat.save("exam on friday", None).await.unwrap(),
        SaveOutcome::Saved(Serial(2))
    );
    chat.delete(&DeleteSelector::Serial(Serial(2))).await.unwrap();

    let reopened = MemoryStore::open(users, clock, "dhairya").await.unwrap();
    let texts: Vec<&str> = reopened.list().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["gym closes at 10"]);
    assert_eq!(reopened.next_serial(), Serial(3));
}

#[tokio::test]
async fn duplicate_save_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let (users, history) = stores(&dir);
    AccountService::new(users.clone(), history)
        .create("dhairya", None)
        .await
        .unwrap();

    let mut store = MemoryStore::open(users, ManualClock::new(Utc::now()), "dhairya")
        .await
        .unwrap();
    store.save("Go to gym", None).await.unwrap();
    let before = tokio::fs::read_to_string(users_db_path(dir.path())).await.unwrap();
    assert_eq!(
        store.save("go to GYM", None).await.unwrap(),
        SaveOutcome::Duplicate
    );
    let after = tokio::fs::read_to_string(users_db_path(dir.path())).await.unwrap();
    assert_eq!(before, after);
}

#[cfg(unix)]
#[tokio::test]
async fn turn_through_external_generator() {
    let dir = TempDir::new().unwrap();
    let (users, history) = stores(&dir);
    let accounts = AccountService::new(users.clone(), history.clone());
    let profile = accounts.create("dhairya", None).await.unwrap();

    let generator = CommandGenerator::new(
        "sh",
        vec![
            "-c".to_string(),
            "cat >/dev/null; printf 'noted bro\\n/save_to_memory exam on friday /for 2d\\n'"
                .to_string(),
        ],
        "test-model",
    );
    let store = MemoryStore::open(users.clone(), ManualClock::new(Utc::now()), "dhairya")
        .await
        .unwrap();
    let mut processor = TurnProcessor::open(
        store,
        history.clone(),
        generator,
        profile,
        ContextAssembler::new(40, "mimic"),
    )
    .await
    .unwrap();

    let report = processor.process("exam is on friday").await.unwrap();
    assert_eq!(report.display, "noted bro");
    assert!(matches!(
        report.outcomes.as_slice(),
        [DirectiveOutcome::SavedTimed { serial: Serial(1), raw, .. }] if raw == "2d"
    ));

    let raw = tokio::fs::read_to_string(chat_dir(dir.path()).join("dhairya_chat.json"))
        .await
        .unwrap();
    assert!(raw.contains("exam is on friday"));
    assert!(raw.contains("noted bro"));
    assert!(!raw.contains("/save_to_memory"));
}
