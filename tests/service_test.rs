use reqwest::StatusCode;
use serde_json::{json, Value};
use spamguard::{artifact, Label, PredictionService, SpamClassifier};
use tokio::net::TcpListener;

const BITCOIN_PHRASE: &str = "Invest in Bitcoin today for huge returns. Crypto is the future.";

fn setup_test_classifier() -> SpamClassifier {
    SpamClassifier::builder()
        .add_example("Invest in bitcoin for huge returns", Label::Spam)
        .add_example("Crypto is the future, buy now", Label::Spam)
        .add_example("Are we still on for dinner tonight?", Label::Ham)
        .add_example("Call me when you land", Label::Ham)
        .add_example("Thanks for today", Label::Ham)
        .build()
        .expect("Failed to create classifier")
}

/// Starts the service on an ephemeral port and returns its `/predict` URL.
async fn spawn_service(service: PredictionService) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, service.router()).await.unwrap();
    });
    format!("http://{}/predict", addr)
}

#[tokio::test]
async fn test_predicts_spam_for_bitcoin_phrase() {
    let url = spawn_service(PredictionService::new(setup_test_classifier())).await;

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "text": BITCOIN_PHRASE }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "text": BITCOIN_PHRASE, "prediction": "Spam" }));
}

#[tokio::test]
async fn test_empty_text_is_valid() {
    let url = spawn_service(PredictionService::new(setup_test_classifier())).await;

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "text": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["text"], "");
    // Three ham examples against two spam: the prior decides.
    assert_eq!(body["prediction"], "Ham");
}

#[tokio::test]
async fn test_malformed_requests_are_client_errors() {
    let url = spawn_service(PredictionService::new(setup_test_classifier())).await;
    let client = reqwest::Client::new();

    let wrong_type = client.post(&url).json(&json!({ "text": 123 })).send().await.unwrap();
    assert_eq!(wrong_type.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong_type.json().await.unwrap();
    assert!(body["detail"].is_string());

    let missing = client.post(&url).json(&json!({ "message": "hi" })).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let invalid_json = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{\"text\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(invalid_json.status(), StatusCode::BAD_REQUEST);

    let no_content_type = client.post(&url).body("{\"text\": \"hi\"}").send().await.unwrap();
    assert_eq!(no_content_type.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let wrong_method = client.get(&url).send().await.unwrap();
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);

    let unknown_route = client.post(url.replace("/predict", "/classify")).send().await.unwrap();
    assert_eq!(unknown_route.status(), StatusCode::NOT_FOUND);

    // The service keeps serving after rejected requests.
    let ok = client.post(&url).json(&json!({ "text": "hello" })).send().await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let url = spawn_service(PredictionService::new(setup_test_classifier())).await;
    let client = reqwest::Client::new();

    let mut handles = vec![];
    for i in 0..16 {
        let client = client.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let text = if i % 2 == 0 { "bitcoin returns" } else { "dinner tonight" };
            let body: Value = client
                .post(&url)
                .json(&json!({ "text": text }))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            (i, body["prediction"].as_str().unwrap().to_string())
        }));
    }

    for handle in handles {
        let (i, prediction) = handle.await.unwrap();
        let expected = if i % 2 == 0 { "Spam" } else { "Ham" };
        assert_eq!(prediction, expected);
    }
}

#[tokio::test]
async fn test_serves_model_loaded_from_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/model.bin");
    artifact::save(&setup_test_classifier(), &path).unwrap();

    let service = PredictionService::load(&path).unwrap();
    let url = spawn_service(service).await;

    let body: Value = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "text": BITCOIN_PHRASE }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["prediction"], "Spam");
}

#[test]
fn test_service_refuses_to_start_without_model() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PredictionService::load(dir.path().join("missing.bin")).is_err());

    let corrupt = dir.path().join("corrupt.bin");
    std::fs::write(&corrupt, b"not a model").unwrap();
    assert!(PredictionService::load(&corrupt).is_err());
}
