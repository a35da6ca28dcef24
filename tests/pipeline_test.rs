//! End-to-end pipeline tests: realtime store subscriptions feeding table
//! views, without any HTTP in between.

use std::sync::Arc;

use serde_json::{json, Value};
use trustlock::projection::map_risk_report;
use trustlock::report::render_text;
use trustlock::store::{MemoryStore, RealtimeStore};
use trustlock::view::TableView;
use trustlock::StatusFilter;

fn seeded_store() -> MemoryStore {
    let mut sessions = serde_json::Map::new();
    for i in 0..25 {
        sessions.insert(
            format!("user{i:02}"),
            json!({
                "status": i % 3 != 0,
                "loginTime": "1/2/2026, 9:00:00 AM",
                "logoutTime": "null",
            }),
        );
    }

    MemoryStore::with_root(json!({
        "component_1": Value::Object(sessions),
        "component_3": {
            "Patient_health": {
                "dev-a": true,
                "dev-a_vitals": {"heart_rate": 71.0, "spo2": 97.5},
                "dev-b": 0,
            }
        },
        "component_4": {
            "malicious": true,
            "summary": "Credential stuffing observed",
            "Who_would_exploit_the_area_of_concern_or_threat_":
                {"query": "Who would exploit it?", "answer": "External actor"},
            "steps": {
                "risk_evaluation": {"query": "Overall?", "answer": "High"}
            }
        },
    }))
}

#[tokio::test]
async fn subscription_drives_session_view() {
    let store = Arc::new(seeded_store());
    let mut sub = store.subscribe("component_1").await.unwrap();

    let mut view = TableView::sessions();
    let initial = sub.recv().await.unwrap();
    view.apply_snapshot(&initial).unwrap();

    let render = view.render();
    assert_eq!(render.summary.total(), 25);
    assert_eq!(render.total_pages, 3);
    assert!(render.controls.show);

    // A write lands as a fresh snapshot that replaces the working copy
    store
        .write(
            "component_1/zz-new",
            json!({"status": true, "loginTime": "t", "logoutTime": "null"}),
        )
        .await
        .unwrap();
    let next = sub.recv().await.unwrap();
    view.apply_snapshot(&next).unwrap();
    assert_eq!(view.records().len(), 26);

    // A remove does the same
    store.remove("component_1/zz-new").await.unwrap();
    let next = sub.recv().await.unwrap();
    view.apply_snapshot(&next).unwrap();
    assert_eq!(view.records().len(), 25);
}

#[tokio::test]
async fn later_snapshot_supersedes_earlier_view() {
    let store = Arc::new(seeded_store());
    let mut sub = store.subscribe("component_1").await.unwrap();
    let _ = sub.recv().await;

    store
        .write("component_1/only", json!({"status": true}))
        .await
        .unwrap();
    store.remove("component_1/only").await.unwrap();

    // Drain to the latest event; the view must reflect it alone.
    let mut latest = None;
    while let Some(snap) = sub.try_recv() {
        latest = Some(snap);
    }
    let mut view = TableView::sessions();
    view.apply_snapshot(&latest.unwrap()).unwrap();
    assert!(view.records().iter().all(|r| r.name != "only"));
}

#[tokio::test]
async fn filters_and_search_apply_to_live_snapshot() {
    let store = Arc::new(seeded_store());
    let snap = store.snapshot("component_1").await.unwrap();

    let mut view = TableView::sessions();
    view.apply_snapshot(&snap).unwrap();

    view.set_filter("status", StatusFilter::parse("Danger"));
    let render = view.render();
    // users 0, 3, 6, ... are inactive
    assert_eq!(render.rows.len(), 9);
    assert!(render.rows.iter().all(|r| !r.status));
    // Summary still covers everything
    assert_eq!(render.summary.total(), 25);

    view.set_search("user1");
    let render = view.render();
    assert!(render.rows.iter().all(|r| r.name.starts_with("user1")));
}

#[tokio::test]
async fn vitals_view_resolves_sibling_records() {
    let store = Arc::new(seeded_store());
    let snap = store.snapshot("component_3").await.unwrap();

    let mut view = TableView::device_vitals();
    view.apply_snapshot(&snap).unwrap();

    let render = view.render();
    assert_eq!(render.rows.len(), 2);
    let a = render.rows.iter().find(|r| r.id == "dev-a").unwrap();
    assert!(a.health);
    assert_eq!(a.vitals.as_ref().unwrap().heart_rate, Some(71.0));
    let b = render.rows.iter().find(|r| r.id == "dev-b").unwrap();
    assert!(!b.health);
    assert!(b.vitals.is_none());
}

#[tokio::test]
async fn risk_report_renders_from_live_snapshot() {
    let store = Arc::new(seeded_store());
    let snap = store.snapshot("component_4").await.unwrap();

    let report = map_risk_report(&snap).unwrap();
    assert!(report.malicious);
    assert_eq!(report.risk_evaluation, "High");

    let text = render_text(&report);
    assert!(text.contains("Threat Analysis Report"));
    assert!(text.contains("Malicious: Yes"));
    assert!(text.contains("Who would exploit it?"));
}

#[tokio::test]
async fn unsubscribed_handle_stops_receiving() {
    let store = Arc::new(seeded_store());
    let mut sub = store.subscribe("component_1").await.unwrap();
    let _ = sub.recv().await;

    sub.unsubscribe();
    sub.unsubscribe();

    store
        .write("component_1/after", json!({"status": true}))
        .await
        .unwrap();
    assert!(sub.try_recv().is_none());
}
