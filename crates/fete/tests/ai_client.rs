use fete::ai::AiPlanner;
use fete_core::config::AiConfig;
use fete_protocol::EventDetails;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAN: &str = r#"{"event_classification":"professional_gathering","plan":{"event_type":"professional_gathering","agenda":[{"time":"9:00","item":"Welcome"}],"tech_needs":["Projector"]}}"#;

fn details() -> EventDetails {
    EventDetails {
        title: "Quarterly offsite".to_owned(),
        description: "Planning day".to_owned(),
        event_date: "2026-11-02".to_owned(),
        guest_count: 12,
        total_budget: 600.0,
        venue_type: "office".to_owned(),
        event_setting: None,
    }
}

fn planner(server: &MockServer) -> AiPlanner {
    let config = AiConfig {
        base_url: server.uri(),
        model: "test-model".to_owned(),
        ..AiConfig::default()
    };
    AiPlanner::new(&config, "sk-test".to_owned()).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn plan_sends_prompt_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(PLAN)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = planner(&server).plan(&details()).await.unwrap();
    assert_eq!(reply.plan.event_classification, "professional_gathering");
    assert_eq!(reply.plan.plan.event_type(), "professional_gathering");
    assert_eq!(reply.raw, PLAN);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("Quarterly offsite"));
    assert!(system.contains("$50.00 per person"));
}

#[tokio::test]
async fn fenced_reply_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(&format!("```json\n{PLAN}\n```"))),
        )
        .mount(&server)
        .await;

    let reply = planner(&server).plan(&details()).await.unwrap();
    assert_eq!(reply.plan.plan.event_type(), "professional_gathering");
}

#[tokio::test]
async fn error_status_includes_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = planner(&server).plan(&details()).await.unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("ai api error (429"), "{msg}");
    assert!(msg.contains("slow down"), "{msg}");
}

#[tokio::test]
async fn empty_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = planner(&server).plan(&details()).await.unwrap_err();
    assert!(format!("{err:#}").contains("ai response has no content"));
}

#[tokio::test]
async fn unknown_event_type_is_malformed() {
    let server = MockServer::start().await;
    let bad = r#"{"event_classification":"x","plan":{"event_type":"picnic"}}"#;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(bad)))
        .mount(&server)
        .await;

    let err = planner(&server).plan(&details()).await.unwrap_err();
    assert!(format!("{err:#}").contains("does not match the expected structure"));
}

#[test]
fn blank_api_key_is_rejected() {
    let err = AiPlanner::new(&AiConfig::default(), " ".to_owned()).unwrap_err();
    assert!(err.to_string().contains("missing ai api key"));
}
