use crate::context::DashboardContext;
use crate::payload::{CounterfactualRequest, SimilarRequest};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use rankx_core::{EntityId, Error};
use std::convert::Infallible;
use std::sync::Arc;

pub struct RestApi;

impl RestApi {
    pub async fn start(context: Arc<DashboardContext>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .configure(routes(context.clone()))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register the dashboard routes on an app
pub fn routes(context: Arc<DashboardContext>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(context))
            .route("/api/entities", web::get().to(list_entities))
            .route("/api/entities/{id}/dashboard", web::get().to(dashboard))
            .route("/api/entities/{id}/gain", web::get().to(gain))
            .route("/api/attributions/summary", web::get().to(summary))
            .route(
                "/api/attributions/compare/{first}/{second}",
                web::get().to(compare),
            )
            .route("/api/counterfactual", web::post().to(counterfactual))
            .route("/api/similar", web::post().to(similar))
            .route("/api/model/metrics", web::get().to(model_metrics));
    }
}

fn entity_id(raw: &str) -> EntityId {
    raw.parse().unwrap_or_else(|never: Infallible| match never {})
}

fn error_response(err: Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::EntityNotFound(_) => HttpResponse::NotFound().json(body),
        Error::Validation(_) => HttpResponse::BadRequest().json(body),
        _ => {
            tracing::error!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

async fn list_entities(context: web::Data<Arc<DashboardContext>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(context.list_entities()))
}

async fn dashboard(
    context: web::Data<Arc<DashboardContext>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = entity_id(&path.into_inner());
    match context.dashboard(&id) {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(dashboard)),
        Err(e) => Ok(error_response(e)),
    }
}

async fn gain(
    context: web::Data<Arc<DashboardContext>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = entity_id(&path.into_inner());
    match context.gain(&id) {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(e)),
    }
}

async fn summary(context: web::Data<Arc<DashboardContext>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(context.summary()))
}

async fn compare(
    context: web::Data<Arc<DashboardContext>>,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (first, second) = path.into_inner();
    match context.compare(&entity_id(&first), &entity_id(&second)) {
        Ok(rows) => Ok(HttpResponse::Ok().json(rows)),
        Err(e) => Ok(error_response(e)),
    }
}

async fn counterfactual(
    context: web::Data<Arc<DashboardContext>>,
    req: web::Json<CounterfactualRequest>,
) -> ActixResult<HttpResponse> {
    match context.simulate(&req) {
        Ok(simulation) => Ok(HttpResponse::Ok().json(simulation)),
        Err(e) => Ok(error_response(e)),
    }
}

async fn similar(
    context: web::Data<Arc<DashboardContext>>,
    req: web::Json<SimilarRequest>,
) -> ActixResult<HttpResponse> {
    match context.find_similar(&req) {
        Ok(results) => Ok(HttpResponse::Ok().json(results)),
        Err(e) => Ok(error_response(e)),
    }
}

async fn model_metrics(context: web::Data<Arc<DashboardContext>>) -> ActixResult<HttpResponse> {
    match context.fit_metrics() {
        Some(metrics) => Ok(HttpResponse::Ok().json(metrics)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "no recorded outcomes to evaluate the model against"
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rankx_core::{Entity, EntityStore, FeatureSchema, LinearModel};
    use serde_json::{json, Value};

    fn context() -> Arc<DashboardContext> {
        let schema = FeatureSchema::new(["a", "b"]).unwrap();
        let entities: Vec<Entity> = (1..=6u64)
            .map(|i| {
                Entity::from_values(i, &[i as f64, 10.0 - i as f64])
                    .with_name(format!("Entity {}", i))
                    .with_outcome(i as f64)
            })
            .collect();
        let store = EntityStore::new(schema, entities).unwrap();
        let model = LinearModel::new(vec!["a".into(), "b".into()], 0.5, vec![1.0, -0.5]);
        Arc::new(DashboardContext::build(store, model, ContextConfig::default()).unwrap())
    }

    #[actix_web::test]
    async fn test_list_and_dashboard() {
        let app = test::init_service(App::new().configure(routes(context()))).await;

        let req = test::TestRequest::get().uri("/api/entities").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 6);
        assert_eq!(body[0]["id"], json!(1));

        let req = test::TestRequest::get()
            .uri("/api/entities/2/dashboard")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["entity"]["name"], json!("Entity 2"));
        assert_eq!(body["similar"].as_array().unwrap().len(), 5);
        // 0.5 + 2 - 4
        assert_eq!(body["prediction"], json!(-1.5));
    }

    #[actix_web::test]
    async fn test_unknown_entity_is_404() {
        let app = test::init_service(App::new().configure(routes(context()))).await;

        for uri in [
            "/api/entities/99/dashboard",
            "/api/entities/nope/gain",
            "/api/attributions/compare/1/99",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_compare() {
        let app = test::init_service(App::new().configure(routes(context()))).await;
        let req = test::TestRequest::get()
            .uri("/api/attributions/compare/1/3")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["feature"], json!("a"));
        assert_eq!(body[0]["difference"], json!(2.0));
        assert_eq!(body[1]["difference"], json!(1.0));
    }

    #[actix_web::test]
    async fn test_counterfactual() {
        let app = test::init_service(App::new().configure(routes(context()))).await;
        let req = test::TestRequest::post()
            .uri("/api/counterfactual")
            .set_json(json!({"entity_id": 1, "features": {"a": 3.0}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["delta"], json!(2.0));

        let req = test::TestRequest::post()
            .uri("/api/counterfactual")
            .set_json(json!({"entity_id": 1}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["baseline"], body["simulated"]);

        // A numeric string in the body names the same entity as the path id
        let req = test::TestRequest::post()
            .uri("/api/counterfactual")
            .set_json(json!({"entity_id": "1", "features": {"a": 3.0}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["delta"], json!(2.0));
    }

    #[actix_web::test]
    async fn test_similar_validation() {
        let app = test::init_service(App::new().configure(routes(context()))).await;

        let req = test::TestRequest::post()
            .uri("/api/similar")
            .set_json(json!({"features": {"a": 2.0, "b": 8.0}, "limit": 2}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], json!(2));
        assert_eq!(body[0]["distance"], json!(0.0));

        let req = test::TestRequest::post()
            .uri("/api/similar")
            .set_json(json!({"features": {"a": 2.0}, "context_features": ["zzz"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_gain_summary_and_metrics() {
        let app = test::init_service(App::new().configure(routes(context()))).await;

        let req = test::TestRequest::get().uri("/api/entities/1/gain").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["cohort_size"], json!(1));
        assert_eq!(body["gains"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/attributions/summary")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sample_size"], json!(6));

        let req = test::TestRequest::get().uri("/api/model/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["samples"], json!(6));
    }
}
