use fete::save::{save_selections, AssumeYes};
use fete::store::{EventStore, HttpStore};
use fete_core::catalog::Catalog;
use fete_core::response::parse_plan_payload;
use fete_core::save::{SaveError, SaveOutcome};
use fete_core::session::{build_plan_ui, RenderSession};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> RenderSession {
    let plan = parse_plan_payload(json!({
        "event_classification": "social_celebration",
        "plan": {
            "event_type": "social_celebration",
            "themes": [{"name": "Garden Party"}, {"name": "Retro Disco"}],
            "timeline": [{"time": "18:00", "activity": "Arrive"}],
            "budget_breakdown": [{"category": "Food", "amount": 100, "percentage": 100}]
        }
    }))
    .unwrap();
    let mut session = build_plan_ui(plan, &Catalog::builtin());
    session.choose("themes", 1).unwrap();
    session
}

#[tokio::test]
async fn posts_payload_and_reads_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "selectedOptions": {"themes": {"name": "Retro Disco"}},
            "timeline": [{"time": "18:00", "activity": "Arrive"}],
            "fullPlan": {"event_classification": "social_celebration"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "eventId": "evt-9",
            "tasksSaved": 1,
            "budgetItemsSaved": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpStore::new(format!("{}/events", server.uri()), Some("tok".to_owned())).unwrap();
    let outcome = save_selections(&session(), &store, &mut AssumeYes)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            event_id: "evt-9".to_owned(),
            tasks_saved: 1,
            budget_items_saved: 1,
        }
    );
}

#[tokio::test]
async fn receipt_error_becomes_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "table locked"
        })))
        .mount(&server)
        .await;

    let store = HttpStore::new(format!("{}/events", server.uri()), None).unwrap();
    let session = session();
    let err = save_selections(&session, &store, &mut AssumeYes)
        .await
        .unwrap_err();

    assert!(matches!(&err, SaveError::Transport { message } if message.contains("table locked")));
    assert!(session.selections().is_selected("themes", 1));
}

#[tokio::test]
async fn plain_error_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let store = HttpStore::new(format!("{}/events", server.uri()), None).unwrap();
    let err = store
        .save(&fete_core::save::assemble_payload(&session()))
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("storage error (502"), "{msg}");
    assert!(msg.contains("bad gateway"), "{msg}");
}

#[test]
fn empty_url_is_rejected() {
    assert!(HttpStore::new("  ".to_owned(), None).is_err());
}
