//! Single-page form around an [`InferenceContext`].

use std::fmt::Write;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use log::{info, warn};
use serde::Serialize;

use crate::artifact::FeatureSchema;
use crate::error::StrokeError;
use crate::inference::{InferenceContext, PatientInput, Prediction};
use crate::records::{StrokeRecord, MAX_AGE};

pub fn router(ctx: Arc<InferenceContext>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/api/schema", get(schema))
        .with_state(ctx)
}

fn status_for(err: &StrokeError) -> StatusCode {
    match err {
        StrokeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StrokeError::UnknownCategory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn index() -> Html<String> {
    Html(render_page(&PatientInput::default(), None))
}

async fn predict_form(
    State(ctx): State<Arc<InferenceContext>>,
    Form(input): Form<PatientInput>,
) -> Response {
    match ctx.predict(&input) {
        Ok(prediction) => {
            info!("predicted {} (p1={:.2})", prediction.risk, prediction.probabilities[1]);
            Html(render_page(&input, Some(Ok((ctx.schema(), &prediction))))).into_response()
        }
        Err(err) => {
            warn!("rejected submission: {err}");
            let body = render_page(&input, Some(Err(&err)));
            (status_for(&err), Html(body)).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn predict_json(
    State(ctx): State<Arc<InferenceContext>>,
    Json(input): Json<PatientInput>,
) -> Response {
    match ctx.predict(&input) {
        Ok(prediction) => Json(prediction).into_response(),
        Err(err) => (
            status_for(&err),
            Json(ErrorBody {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn schema(State(ctx): State<Arc<InferenceContext>>) -> Json<FeatureSchema> {
    Json(ctx.schema().clone())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn select(out: &mut String, name: &str, label: &str, current: &str) {
    let _ = writeln!(out, r#"<label>{label}<select name="{name}">"#);
    for choice in StrokeRecord::choices(name).unwrap_or(&[]) {
        let selected = if *choice == current { " selected" } else { "" };
        let choice = escape_html(choice);
        let _ = writeln!(out, r#"<option value="{choice}"{selected}>{choice}</option>"#);
    }
    let _ = writeln!(out, "</select></label>");
}

fn number(out: &mut String, name: &str, label: &str, value: f64, max: Option<f64>) {
    let max = max.map(|m| format!(r#" max="{m}""#)).unwrap_or_default();
    let _ = writeln!(
        out,
        r#"<label>{label}<input type="number" name="{name}" min="0"{max} step="any" value="{value}" required></label>"#
    );
}

type Outcome<'a> = Option<Result<(&'a FeatureSchema, &'a Prediction), &'a StrokeError>>;

pub fn render_page(input: &PatientInput, outcome: Outcome<'_>) -> String {
    let mut out = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Stroke Prediction</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 640px; margin: 40px auto; background: #f5f5f5; }
        .container { background: white; padding: 24px 32px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        label { display: block; margin: 10px 0; }
        select, input { display: block; width: 100%; padding: 6px; margin-top: 4px; }
        .result { margin-top: 20px; padding: 12px; background: #e8f5e9; border-left: 4px solid #4CAF50; }
        .error { margin-top: 20px; padding: 12px; background: #fdecea; border-left: 4px solid #d32f2f; }
        table { border-collapse: collapse; margin-top: 12px; }
        td, th { border: 1px solid #ddd; padding: 4px 8px; font-size: 0.9em; }
    </style>
</head>
<body>
<div class="container">
<h1>Stroke Prediction</h1>
<h2>Enter your data</h2>
<form method="post" action="/predict">
"#,
    );
    select(&mut out, "work_type", "Work type", &input.work_type);
    select(&mut out, "gender", "Gender", &input.gender);
    select(&mut out, "smoking_status", "Smoking status", &input.smoking_status);
    number(&mut out, "age", "Age", input.age, Some(MAX_AGE));
    select(&mut out, "ever_married", "Ever married", &input.ever_married);
    number(&mut out, "bmi", "Body mass index (BMI)", input.bmi, None);
    select(&mut out, "residence_type", "Residence type", &input.residence_type);
    number(&mut out, "avg_glucose_level", "Average glucose level", input.avg_glucose_level, None);
    select(&mut out, "heart_disease", "History of heart disease", &input.heart_disease);
    select(&mut out, "hypertension", "Hypertension", &input.hypertension);
    out.push_str("<button type=\"submit\">Predict stroke</button>\n</form>\n");

    match outcome {
        Some(Ok((schema, prediction))) => {
            out.push_str("<h3>Submitted data</h3>\n<table><tr>");
            for name in schema.names() {
                let _ = write!(out, "<th>{}</th>", escape_html(name));
            }
            out.push_str("</tr><tr>");
            for value in &prediction.features {
                let _ = write!(out, "<td>{value}</td>");
            }
            out.push_str("</tr></table>\n");
            let _ = writeln!(
                out,
                r#"<div class="result"><strong>Prediction: {}</strong><br>
Probability of low stroke risk (class 0): {:.2}<br>
Probability of high stroke risk (class 1): {:.2}</div>"#,
                prediction.risk, prediction.probabilities[0], prediction.probabilities[1]
            );
        }
        Some(Err(err)) => {
            let _ = writeln!(out, r#"<div class="error">{}</div>"#, escape_html(&err.to_string()));
        }
        None => {}
    }
    out.push_str("</div>\n</body>\n</html>\n");
    out
}
