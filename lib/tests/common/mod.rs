#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use training_programs::{
    ContentGateway, Dashboard, Environment, Fetcher, GatewayConfig, LegacyGateway, LocalGateway,
    LocalStore,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on the discard port, so every request is refused.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

pub fn config(base: &str, environment: Environment) -> GatewayConfig {
    let legacy = Url::parse(&format!("{base}/api")).unwrap();
    let content = Url::parse(&format!("{base}/content-api")).unwrap();
    let local = Url::parse(base).unwrap();

    GatewayConfig::new(legacy, content, local)
        .with_environment(environment)
        .with_local_latency(Duration::ZERO)
}

pub fn legacy(base: &str) -> LegacyGateway {
    LegacyGateway::new(Fetcher::new(), &config(base, Environment::Production))
}

pub fn content(base: &str) -> ContentGateway {
    ContentGateway::new(Fetcher::new(), &config(base, Environment::Production))
}

pub fn offline_local() -> LocalGateway {
    LocalGateway::new(
        Fetcher::new(),
        &config(UNREACHABLE, Environment::Production),
        LocalStore::in_memory(),
    )
}

pub fn offline_dashboard() -> Dashboard {
    Dashboard::new(legacy(UNREACHABLE), offline_local())
}

pub async fn mount_envelope(server: &MockServer, route: &str, result: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
        .mount(server)
        .await;
}

pub fn class(class_id: i64) -> Value {
    json!({
        "classId": class_id,
        "location": "Bensalem, PA",
        "startDate": "2026-03-02T08:00:00",
        "endDate": "2026-03-06T16:00:00",
        "seats": 6,
        "type": "ILT"
    })
}
