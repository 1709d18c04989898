//! Integration tests for the sensor-replay HTTP server

use sensor_replay::config::Config;
use sensor_replay::server::{run, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;

/// CSV with an explicit timestamp column: 10 rows one second apart,
/// Temperature cleanly separating the two classes.
fn sample_csv() -> String {
    let mut csv = String::from("synthetic_timestamp,ID,Temperature,Pressure,Response\n");
    for i in 0..10 {
        let label = u8::from(i >= 5);
        let temp = if label == 1 { 35.0 } else { 15.0 };
        csv.push_str(&format!(
            "2021-01-01 00:00:0{i},{i},{temp},{}.25,{label}\n",
            i % 3
        ));
    }
    csv
}

/// Start a server over scratch dataset/model paths. The TempDir must stay
/// alive for the duration of the test.
async fn start_server(dir: &TempDir) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let pipeline = Config {
        dataset_path: dir.path().join("dataset.csv"),
        model_path: dir.path().join("model.json"),
        // Zero pacing so stream tests finish promptly
        pacing: Duration::ZERO,
        ..Config::default()
    };
    let config = ServerConfig::new(0, pipeline);

    let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown_tx)
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_train_model_requires_every_window_field() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/train-model", addr))
        .json(&serde_json::json!({
            "trainStart": "2021-01-01T00:00:00",
            "trainEnd": "2021-01-01T00:00:06",
            "testStart": "2021-01-01T00:00:07"
            // testEnd missing
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "missing_field");
    assert_eq!(body["error"], "testEnd required");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_simulate_refuses_before_training() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;
    std::fs::write(dir.path().join("dataset.csv"), sample_csv()).unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!(
            "http://{}/simulate?start=2021-01-01T00:00:00&end=2021-01-01T00:00:09",
            addr
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "model_missing");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_upload_train_then_simulate_round() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;
    let client = reqwest::Client::new();

    // Upload the dataset through the API
    let response = client
        .post(format!("http://{}/upload-dataset?name=sample.csv", addr))
        .body(sample_csv())
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["fileName"], "sample.csv");
    assert_eq!(summary["totalRecords"], 10);

    // Train on the first six seconds, test on the rest
    let response = client
        .post(format!("http://{}/train-model", addr))
        .json(&serde_json::json!({
            "trainStart": "2021-01-01T00:00:00",
            "trainEnd": "2021-01-01T00:00:06",
            "testStart": "2021-01-01T00:00:07",
            "testEnd": "2021-01-01T00:00:09"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let report: serde_json::Value = response.json().await.unwrap();

    let counted = report["tp"].as_u64().unwrap()
        + report["tn"].as_u64().unwrap()
        + report["fp"].as_u64().unwrap()
        + report["fn"].as_u64().unwrap();
    assert_eq!(counted, 3, "three rows fall in the test window");
    assert!(report["accuracy"].as_f64().is_some());
    assert!(!report["acc_plot"].as_str().unwrap().is_empty());
    assert!(!report["conf_plot"].as_str().unwrap().is_empty());

    // Replay a three-row window as SSE
    let response = client
        .get(format!(
            "http://{}/simulate?start=2021-01-01T00:00:01&end=2021-01-01T00:00:03",
            addr
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false));

    let body = response.text().await.unwrap();
    let events: Vec<serde_json::Value> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|json| serde_json::from_str(json).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["timestamp"], "2021-01-01 00:00:01");
    assert_eq!(events[2]["timestamp"], "2021-01-01 00:00:03");
    assert_eq!(events[0]["id"], 1);
    assert!(events[0]["confidence"].as_f64().is_some());
    assert!(events[0]["temperature"].as_f64().is_some());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_validate_dates_flags_overlap_and_empty_windows() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;
    std::fs::write(dir.path().join("dataset.csv"), sample_csv()).unwrap();
    let client = reqwest::Client::new();

    // Testing period starts before training ends
    let response = client
        .post(format!("http://{}/validate-dates", addr))
        .json(&serde_json::json!({
            "trainingStart": "2021-01-01T00:00:00",
            "trainingEnd": "2021-01-01T00:00:05",
            "testingStart": "2021-01-01T00:00:03",
            "testingEnd": "2021-01-01T00:00:07",
            "simulationStart": "2021-01-01T00:00:08",
            "simulationEnd": "2021-01-01T00:00:09"
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isValid"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Training period must end before"));

    // Ordered periods, but the simulation window has no rows
    let response = client
        .post(format!("http://{}/validate-dates", addr))
        .json(&serde_json::json!({
            "trainingStart": "2021-01-01T00:00:00",
            "trainingEnd": "2021-01-01T00:00:04",
            "testingStart": "2021-01-01T00:00:05",
            "testingEnd": "2021-01-01T00:00:09",
            "simulationStart": "2030-01-01T00:00:00",
            "simulationEnd": "2030-01-01T00:00:09"
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isValid"], false);
    assert!(body["message"].as_str().unwrap().contains("no data"));

    // A well-formed split validates with per-window counts
    let response = client
        .post(format!("http://{}/validate-dates", addr))
        .json(&serde_json::json!({
            "trainingStart": "2021-01-01T00:00:00",
            "trainingEnd": "2021-01-01T00:00:04",
            "testingStart": "2021-01-01T00:00:05",
            "testingEnd": "2021-01-01T00:00:07",
            "simulationStart": "2021-01-01T00:00:08",
            "simulationEnd": "2021-01-01T00:00:09"
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isValid"], true);
    assert_eq!(body["trainingRecords"], 5);
    assert_eq!(body["testingRecords"], 3);
    assert_eq!(body["simulationRecords"], 2);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_cors_headers() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start_server(&dir).await;

    let client = reqwest::Client::new();
    let response = client
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/train-model", addr),
        )
        .header("Origin", "http://localhost")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Failed to send request");

    assert!(
        response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
        "CORS preflight failed: {}",
        response.status()
    );

    let _ = shutdown_tx.send(());
}
