mod common;

use std::fs;

use cashflow_core::{
    config::ConfigManager,
    errors::LedgerError,
    ledger::{
        Action, DateWindow, DeleteRequest, DeleteScope, FlowRole, OneOffEntry, OpeningBalance,
        Schedule,
    },
    storage::{load_state, persist, JsonStore, LedgerStore, StoreDocument},
    utils::{FixedClock, SequentialIds},
};
use common::{date, definition};
use tempfile::tempdir;
use uuid::Uuid;

#[test]
fn json_store_round_trips_reducer_output() {
    let temp = tempdir().unwrap();
    let store = JsonStore::in_dir(temp.path()).unwrap();
    let fallback = OpeningBalance::new(0, date(2025, 1, 1));
    let ids = SequentialIds::new();

    let mut state = load_state(&store, fallback).unwrap();
    for action in [
        Action::SetOpeningBalance(OpeningBalance::new(100_000, date(2025, 1, 1))),
        Action::AddDefinition {
            role: FlowRole::Income,
            definition: definition(1, "Pay", 150_000, Schedule::Biweekly, date(2025, 1, 3)),
        },
        Action::AddDefinition {
            role: FlowRole::Bill,
            definition: definition(2, "Gym", 5_000, Schedule::Weekly, date(2025, 1, 6)),
        },
        Action::AddOneOff(OneOffEntry::new(
            Uuid::from_u128(3),
            date(2025, 1, 9),
            2_500,
            "Books",
        )),
        Action::Delete(DeleteRequest {
            definition_id: Uuid::from_u128(2),
            scope: DeleteScope::ThisOccurrence(date(2025, 1, 13)),
        }),
    ] {
        let mutations = state.apply(action, &ids).unwrap();
        persist(&store, &mutations).unwrap();
    }

    let reloaded = load_state(&JsonStore::in_dir(temp.path()).unwrap(), fallback).unwrap();
    assert_eq!(reloaded, state);

    let window = DateWindow::new(date(2025, 1, 1), date(2025, 2, 28)).unwrap();
    assert_eq!(reloaded.timeline(window), state.timeline(window));
}

#[test]
fn store_file_is_replaced_atomically() {
    let temp = tempdir().unwrap();
    let store = JsonStore::in_dir(temp.path()).unwrap();
    store
        .upsert_definition(
            FlowRole::Bill,
            &definition(1, "Rent", 80_000, Schedule::Monthly, date(2025, 1, 1)),
        )
        .unwrap();
    let original = fs::read_to_string(store.path()).unwrap();

    // A directory squatting on the temp path makes the staged write fail.
    let tmp = store.path().with_extension("json.tmp");
    fs::create_dir_all(&tmp).unwrap();
    let result = store.upsert_definition(
        FlowRole::Bill,
        &definition(2, "Power", 9_000, Schedule::Monthly, date(2025, 1, 5)),
    );
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
}

#[test]
fn newer_schema_versions_are_refused() {
    let temp = tempdir().unwrap();
    let store = JsonStore::in_dir(temp.path()).unwrap();
    let mut document = StoreDocument::new();
    document.schema_version += 1;
    fs::write(store.path(), serde_json::to_string(&document).unwrap()).unwrap();

    assert!(matches!(
        store.list_bill_definitions(),
        Err(LedgerError::Storage(_))
    ));
}

#[test]
fn unknown_schedule_tags_load_and_expand_to_nothing() {
    let temp = tempdir().unwrap();
    let store = JsonStore::in_dir(temp.path()).unwrap();
    let raw = r#"{
        "schema_version": 1,
        "income_sources": [],
        "bills": [{
            "id": "00000000-0000-0000-0000-000000000007",
            "label": "Legacy",
            "amount": 1000,
            "schedule": "fortnightly-ish",
            "start_date": "2025-01-01"
        }],
        "misc_spending": []
    }"#;
    fs::write(store.path(), raw).unwrap();

    let state = load_state(&store, OpeningBalance::new(0, date(2025, 1, 1))).unwrap();
    assert_eq!(state.bills.len(), 1);
    let window = DateWindow::new(date(2025, 1, 1), date(2025, 12, 31)).unwrap();
    assert!(state.timeline(window).is_empty());
}

#[test]
fn opening_date_holds_across_sessions_as_the_clock_moves() {
    let temp = tempdir().unwrap();
    let ids = SequentialIds::new();

    // First run on 2025-01-01 records spending mid-month.
    let config = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
    let settings = config.load(&FixedClock(date(2025, 1, 1))).unwrap();
    let store = JsonStore::in_dir(config.base_dir()).unwrap();
    let mut state = load_state(&store, settings.opening()).unwrap();
    let mutations = state
        .apply(
            Action::AddOneOff(OneOffEntry::new(
                Uuid::from_u128(1),
                date(2025, 1, 15),
                4_000,
                "Concert",
            )),
            &ids,
        )
        .unwrap();
    persist(&store, &mutations).unwrap();

    // Next run, weeks later.
    let config = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
    let settings = config.load(&FixedClock(date(2025, 3, 1))).unwrap();
    assert_eq!(settings.opening_balance_date, date(2025, 1, 1));
    let state = load_state(&JsonStore::in_dir(config.base_dir()).unwrap(), settings.opening())
        .unwrap();
    let january = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
    assert_eq!(state.timeline(january).rows.len(), 1);
}

#[test]
fn reusing_an_id_under_the_other_role_keeps_state_and_store_in_step() {
    let temp = tempdir().unwrap();
    let store = JsonStore::in_dir(temp.path()).unwrap();
    let fallback = OpeningBalance::new(0, date(2025, 1, 1));
    let ids = SequentialIds::new();
    let mut state = load_state(&store, fallback).unwrap();

    let mutations = state
        .apply(
            Action::AddDefinition {
                role: FlowRole::Income,
                definition: definition(7, "Pay", 100_000, Schedule::Monthly, date(2025, 1, 1)),
            },
            &ids,
        )
        .unwrap();
    persist(&store, &mutations).unwrap();

    let err = state
        .apply(
            Action::AddDefinition {
                role: FlowRole::Bill,
                definition: definition(7, "Rent", 80_000, Schedule::Monthly, date(2025, 1, 1)),
            },
            &ids,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateId(_)));

    let reloaded = load_state(&store, fallback).unwrap();
    assert_eq!(reloaded, state);
    assert_eq!((reloaded.incomes.len(), reloaded.bills.len()), (1, 0));
}
