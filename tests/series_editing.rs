mod common;

use cashflow_core::{
    errors::LedgerError,
    ledger::{
        expand, Action, DateWindow, DefinitionChanges, DeleteRequest, DeleteScope, EditRequest,
        EditScope, FlowRole, Schedule,
    },
    storage::LedgerStore,
};
use common::{date, definition, Harness};
use uuid::Uuid;

const GYM: u128 = 42;

fn harness_with_weekly_gym() -> Harness {
    let mut harness = Harness::new(0);
    harness.apply(Action::AddDefinition {
        role: FlowRole::Bill,
        definition: definition(GYM, "Gym", 5_000, Schedule::Weekly, date(2025, 1, 6)),
    });
    harness
}

fn window() -> DateWindow {
    DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap()
}

#[test]
fn delete_this_occurrence_only() {
    let mut harness = harness_with_weekly_gym();
    harness.apply(Action::Delete(DeleteRequest {
        definition_id: Uuid::from_u128(GYM),
        scope: DeleteScope::ThisOccurrence(date(2025, 1, 13)),
    }));

    let (_, gym) = harness.state.find_definition(Uuid::from_u128(GYM)).unwrap();
    assert!(gym.exceptions.contains(&date(2025, 1, 13)));
    assert_eq!(
        expand(gym, window()),
        vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 1, 27)]
    );

    let stored = harness.store.list_bill_definitions().unwrap();
    assert!(stored[0].exceptions.contains(&date(2025, 1, 13)));
}

#[test]
fn edit_this_and_future_splits_the_series() {
    let mut harness = harness_with_weekly_gym();
    harness.apply(Action::Edit(EditRequest {
        definition_id: Uuid::from_u128(GYM),
        target_date: date(2025, 1, 13),
        changes: DefinitionChanges::amount(7_500),
        scope: EditScope::ThisAndFuture,
    }));

    let (_, original) = harness.state.find_definition(Uuid::from_u128(GYM)).unwrap();
    assert_eq!(original.end_date, Some(date(2025, 1, 12)));
    assert_eq!(harness.state.bills.len(), 2);

    let rows = harness.state.timeline(window()).rows;
    let charges: Vec<(chrono::NaiveDate, i64)> =
        rows.iter().map(|row| (row.date, row.delta)).collect();
    assert_eq!(
        charges,
        vec![
            (date(2025, 1, 6), -5_000),
            (date(2025, 1, 13), -7_500),
            (date(2025, 1, 20), -7_500),
            (date(2025, 1, 27), -7_500)
        ]
    );
    assert_eq!(harness.store.list_bill_definitions().unwrap().len(), 2);
}

#[test]
fn edit_this_occurrence_replaces_a_single_charge() {
    let mut harness = harness_with_weekly_gym();
    harness.apply(Action::Edit(EditRequest {
        definition_id: Uuid::from_u128(GYM),
        target_date: date(2025, 1, 20),
        changes: DefinitionChanges::amount(0),
        scope: EditScope::ThisOccurrence,
    }));

    let deltas: Vec<i64> = harness
        .state
        .timeline(window())
        .rows
        .iter()
        .map(|row| row.delta)
        .collect();
    assert_eq!(deltas, vec![-5_000, -5_000, 0, -5_000]);
}

#[test]
fn targets_that_do_not_occur_are_rejected_without_changes() {
    let mut harness = harness_with_weekly_gym();
    let before = harness.state.clone();
    let err = harness
        .state
        .apply(
            Action::Edit(EditRequest {
                definition_id: Uuid::from_u128(GYM),
                target_date: date(2025, 1, 14),
                changes: DefinitionChanges::amount(1),
                scope: EditScope::ThisAndFuture,
            }),
            &harness.ids,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingOccurrence { .. }));
    assert_eq!(harness.state, before);
}

#[test]
fn delete_entire_series_clears_state_and_store() {
    let mut harness = harness_with_weekly_gym();
    harness.apply(Action::Delete(DeleteRequest {
        definition_id: Uuid::from_u128(GYM),
        scope: DeleteScope::EntireSeries,
    }));
    assert!(harness.state.bills.is_empty());
    assert!(harness.store.list_bill_definitions().unwrap().is_empty());
    assert!(harness.state.timeline(window()).is_empty());
}
