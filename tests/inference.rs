//! Encoding and prediction through a loaded context, plus the HTTP surface.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use stroke_risk::encoder::LabelEncoder;
use stroke_risk::inference::{InferenceContext, PatientInput};
use stroke_risk::web;
use stroke_risk::StrokeError;

fn context() -> InferenceContext {
    InferenceContext::new(common::reference_artifact(common::reference_encoders())).unwrap()
}

#[test]
fn reference_record_encodes_to_expected_vector() {
    let features = context().feature_vector(&common::reference_input()).unwrap();
    // gender, age, hypertension, heart_disease, ever_married, work_type,
    // residence_type, avg_glucose_level, bmi, smoking_status
    let expected = vec![0.0, 45.0, 0.0, 0.0, 1.0, 2.0, 1.0, 90.0, 24.5, 2.0];
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<u64>>();
    assert_eq!(bits(&features), bits(&expected));
}

#[test]
fn yes_no_fields_become_flags() {
    let input = PatientInput {
        heart_disease: "Yes".into(),
        hypertension: "Yes".into(),
        ..common::reference_input()
    };
    let features = context().feature_vector(&input).unwrap();
    assert_eq!(features[2], 1.0);
    assert_eq!(features[3], 1.0);
}

#[test]
fn prediction_is_stable() {
    let ctx = context();
    let a = ctx.predict(&common::reference_input()).unwrap();
    let b = ctx.predict(&common::reference_input()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.label == 1, a.probabilities[1] > a.probabilities[0]);
}

#[test]
fn unseen_category_is_a_usage_error() {
    let mut encoders = common::reference_encoders();
    encoders.insert(
        "work_type".into(),
        LabelEncoder::fit("work_type", ["Private", "Self-employed", "Govt_job", "children"]).unwrap(),
    );
    let ctx = InferenceContext::new(common::reference_artifact(encoders)).unwrap();
    let input = PatientInput {
        work_type: "Never_worked".into(),
        ..common::reference_input()
    };
    let err = ctx.predict(&input).unwrap_err();
    assert!(matches!(err, StrokeError::UnknownCategory { .. }));
    assert!(err.is_usage_error());
}

#[test]
fn age_limits_apply_at_prediction() {
    let ctx = context();
    for age in [0.0, 120.0] {
        let input = PatientInput { age, ..common::reference_input() };
        assert!(ctx.predict(&input).is_ok(), "age {age}");
    }
    for age in [-1.0, 121.0] {
        let input = PatientInput { age, ..common::reference_input() };
        assert!(matches!(ctx.predict(&input), Err(StrokeError::InvalidInput(_))), "age {age}");
    }
}

const FORM_BODY: &str = "work_type=Private&gender=Female&smoking_status=never+smoked&age=45&ever_married=Yes&bmi=24.5&residence_type=Urban&avg_glucose_level=90&heart_disease=No&hypertension=No";

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn form_page_is_served() {
    let app = web::router(Arc::new(context()));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"<form method="post" action="/predict">"#));
}

#[tokio::test]
async fn form_submission_renders_prediction() {
    let app = web::router(Arc::new(context()));
    let response = app.oneshot(post_form(FORM_BODY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Prediction: "));
    assert!(html.contains("risk</strong>"));
    assert!(html.contains("(class 0): "));
    assert!(html.contains("<td>24.5</td>"));
}

#[tokio::test]
async fn out_of_range_age_is_a_bad_request() {
    let app = web::router(Arc::new(context()));
    let body = FORM_BODY.replace("age=45", "age=121");
    let response = app.oneshot(post_form(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("class=\"error\""));
}

#[tokio::test]
async fn json_api_matches_context() {
    let ctx = Arc::new(context());
    let expected = ctx.predict(&common::reference_input()).unwrap();
    let app = web::router(ctx);
    let payload = serde_json::to_string(&common::reference_input()).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["label"], expected.label);
    assert_eq!(json["risk"], if expected.label == 1 { "high" } else { "low" });
    assert_eq!(json["probabilities"][1].as_f64().unwrap(), expected.probabilities[1]);
}

#[tokio::test]
async fn schema_endpoint_lists_columns_in_order() {
    let app = web::router(Arc::new(context()));
    let response = app
        .oneshot(Request::builder().uri("/api/schema").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["columns"][0]["name"], "gender");
    assert_eq!(json["columns"][0]["kind"], "categorical");
    assert_eq!(json["columns"].as_array().unwrap().len(), 10);
}
