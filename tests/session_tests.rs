use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use expense_tracker::export::to_csv;
use expense_tracker::models::{CategoryId, Money, NewExpense, UserId};
use expense_tracker::reports::{apply_at, DatePreset, FilterState};
use expense_tracker::services::Session;
use expense_tracker::store::{DocumentPath, DocumentStore, MemoryStore};
use expense_tracker::ExpenseError;

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

async fn signed_in(store: &MemoryStore) -> Session<MemoryStore> {
    let session = Session::new(Arc::new(store.clone()));
    session.sign_in(UserId::parse("alice").unwrap()).await.unwrap();
    session.wait_until_synced().await.unwrap();
    session
}

#[tokio::test]
async fn legacy_and_current_records_share_one_view() {
    let store = MemoryStore::new();
    let user = UserId::parse("alice").unwrap();
    let expenses = DocumentPath::expenses(&user);
    store
        .write(
            &expenses.child("legacy"),
            json!({ "amount": 800.0, "category": "Rent", "date": "2024-01-02T00:00:00" })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .await
        .unwrap();

    let session = signed_in(&store).await;
    session
        .ledger()
        .add(NewExpense::new(
            Money::from_cents(1999),
            CategoryId::from("food"),
            "Food",
            at(2024, 1, 31, 23, 59, 59),
        ))
        .await
        .unwrap();
    session
        .ledger()
        .add(NewExpense::new(
            Money::from_cents(500),
            CategoryId::from("food"),
            "Food",
            at(2024, 2, 1, 0, 0, 0),
        ))
        .await
        .unwrap();

    let mut changes = session.ledger().subscribe_changes();
    changes.wait_for(|v| v.len() == 3).await.unwrap();

    let now = at(2024, 1, 20, 0, 0, 0);
    assert_eq!(session.ledger().monthly_total_at(now), Money::from_cents(81999));

    let summaries = session.ledger().monthly_category_summaries_at(now);
    assert_eq!(summaries[0].category_name, "Rent");
    assert_eq!(summaries[0].color_key, "DDA0DD");

    let snapshot = session.ledger().snapshot();
    let january = apply_at(&snapshot, &FilterState::preset(DatePreset::ThisMonth), now);
    assert_eq!(january.len(), 2);
    assert_eq!(january.expenses[0].date, at(2024, 1, 31, 23, 59, 59));

    let rent_only = apply_at(
        &snapshot,
        &FilterState::preset(DatePreset::All).with_categories([CategoryId::from("Rent")]),
        now,
    );
    assert_eq!(rent_only.total, Money::from_cents(80000));

    let csv = String::from_utf8(to_csv(&january.expenses)).unwrap();
    assert_eq!(
        csv,
        "date,category,amount,note\n2024-01-02,Rent,800.00,\n2024-01-31,Food,19.99,\n"
    );
}

#[tokio::test]
async fn rename_then_delete_guard_through_session() {
    let store = MemoryStore::new();
    let session = signed_in(&store).await;

    let food = session.categories().add("Food").await.unwrap();
    session
        .ledger()
        .add(NewExpense::new(
            Money::from_cents(1200),
            food.id.clone(),
            food.name.clone(),
            at(2024, 5, 5, 12, 0, 0),
        ))
        .await
        .unwrap();

    let report = session
        .categories()
        .rename(&food.id, "  Dining ")
        .await
        .unwrap()
        .wait_propagation()
        .await
        .unwrap();
    assert_eq!((report.matched, report.updated), (1, 1));

    let mut changes = session.ledger().subscribe_changes();
    changes
        .wait_for(|v| v.iter().all(|e| e.category_name == "Dining") && !v.is_empty())
        .await
        .unwrap();

    let err = session.categories().delete(&food.id).await.unwrap_err();
    assert!(matches!(err, ExpenseError::CategoryInUse { references: 1, .. }));
}

#[tokio::test]
async fn budget_follows_ledger_total() {
    let store = MemoryStore::new();
    let session = signed_in(&store).await;
    session.budget().set_budget(Money::from_cents(10000)).await.unwrap();

    let mut budget = session.budget().subscribe_changes();
    budget.wait_for(|b| b.is_set()).await.unwrap();

    assert!(!session.budget().is_over_budget(Money::from_cents(10000)));
    assert!(session.budget().is_over_budget(Money::from_cents(10001)));

    session.budget().set_budget(Money::zero()).await.unwrap();
    budget.wait_for(|b| !b.is_set()).await.unwrap();
    assert!(!session.budget().is_over_budget(Money::from_cents(10001)));
}
