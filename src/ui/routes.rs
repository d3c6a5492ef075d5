//! # Web routes for the naturalness-prediction demo
//!
//! One page, one endpoint: `GET /` serves the input form, `POST /predict`
//! takes a SMILES string and returns an HTML fragment with a best-effort
//! structure depiction and the classifier's verdict.
//!
//! The model, tokenizer and config are loaded once at startup into
//! [`AppState`] and shared read-only across requests; there is no per-request
//! mutable state. Handler failures surface through actix's default error
//! rendering.

use actix_web::{error::ErrorInternalServerError, web, App, Error, HttpResponse, HttpServer, Responder};
use actix_files::NamedFile;
use serde::Deserialize;

use crate::config::ClassifierConfig;
use crate::depict;
use crate::model::SequenceClassifier;
use crate::tokenizer::TokenizerAdapter;

/// Read-only context shared by all requests, constructed once at startup.
pub struct AppState {
    pub classifier: SequenceClassifier,
    pub tokenizer: TokenizerAdapter,
    pub config: ClassifierConfig,
}

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub smiles: String,
}

/// Serves the demo page.
pub async fn index() -> impl Responder {
    NamedFile::open_async("./src/ui/index.html").await
}

/// Runs the classifier on one SMILES string and renders the result fragment.
pub async fn predict(
    state: web::Data<AppState>,
    form: web::Form<PredictForm>,
) -> Result<HttpResponse, Error> {
    let smiles = form.smiles.trim();
    if smiles.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .content_type("text/html")
            .body("<p class=\"error\">Please enter a SMILES string.</p>"));
    }

    // Depiction is best-effort: a string the scanner rejects still gets a
    // prediction, just no image.
    let image = depict::draw_molecule(smiles);

    let (ids, mask) = state
        .tokenizer
        .encode_one(smiles)
        .map_err(ErrorInternalServerError)?;
    let (label_idx, probs) = state
        .classifier
        .predict(&ids, &mask)
        .map_err(ErrorInternalServerError)?;

    let label = state
        .config
        .labels
        .get(label_idx)
        .map(String::as_str)
        .unwrap_or("Unknown");
    let natural_prob = probs.get(1).copied().unwrap_or(0.0);

    let mut body = String::new();
    match image {
        Some(svg) => body.push_str(&format!("<div class=\"structure\">{svg}</div>")),
        None => body.push_str("<p class=\"note\">Could not parse the SMILES string; no structure image.</p>"),
    }
    body.push_str(&format!(
        "<pre class=\"result\">Type: {}\nNatural Product Probability: {:.4}</pre>",
        html_escape::encode_text(label),
        natural_prob
    ));

    Ok(HttpResponse::Ok().content_type("text/html").body(body))
}

/// Binds the demo server and serves until shutdown.
pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(state);
    log::info!("starting demo server at http://{host}:{port}/");
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/", web::get().to(index))
            .route("/predict", web::post().to(predict))
    })
    .bind((host, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use crate::test_support::{test_classifier, write_test_tokenizer};

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer_path = write_test_tokenizer(dir.path());
        let state = AppState {
            classifier: test_classifier(),
            tokenizer: TokenizerAdapter::from_file(&tokenizer_path, 16).unwrap(),
            config: ClassifierConfig::default(),
        };
        (state, dir)
    }

    #[actix_rt::test]
    async fn predict_returns_image_and_summary() {
        let (state, _dir) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form(&[("smiles", "CCO")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let body_str = std::str::from_utf8(&body).unwrap();
        assert!(body_str.contains("<svg"));
        assert!(body_str.contains("Type: "));
        assert!(body_str.contains("Natural Product Probability: "));
    }

    #[actix_rt::test]
    async fn unparseable_smiles_still_gets_a_prediction() {
        let (state, _dir) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form(&[("smiles", "!!not-smiles!!")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let body_str = std::str::from_utf8(&body).unwrap();
        assert!(!body_str.contains("<svg"));
        assert!(body_str.contains("no structure image"));
        assert!(body_str.contains("Natural Product Probability: "));
    }

    #[actix_rt::test]
    async fn empty_input_is_a_bad_request() {
        let (state, _dir) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form(&[("smiles", "   ")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
