// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, time_series, time_series_csv, time_series_png};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/ndvi/time-series", post(time_series))
        .route("/ndvi/time-series.csv", post(time_series_csv))
        .route("/ndvi/time-series.png", post(time_series_png))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::imagery_backend::mock::MockBackend;
    use crate::application::ndvi_service::NdviService;
    use crate::infrastructure::config::{ChartSettings, QuerySettings};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(backend: Arc<MockBackend>) -> Router {
        let ndvi_service = NdviService::new(backend, QuerySettings::default(), ChartSettings::default());
        router(Arc::new(AppState { ndvi_service }))
    }

    fn scenario_backend() -> Arc<MockBackend> {
        Arc::new(MockBackend::with_records(&[
            ("2020-01-03", Some(0.42)),
            ("2020-01-06", None),
        ]))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn point_request() -> Value {
        json!({
            "start_date": "2020-01-01",
            "end_date": "2020-01-08",
            "shape": {"geometry": {"type": "Point", "coordinates": [53.16, 36.59]}}
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app(scenario_backend())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_time_series_json() {
        let response = app(scenario_backend())
            .oneshot(post_json("/ndvi/time-series", point_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let chart: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            chart,
            json!({
                "dates": ["2020-01-03", "2020-01-06"],
                "values": [0.42, null],
                "month_ticks": ["2020-01"]
            })
        );
    }

    #[tokio::test]
    async fn test_time_series_csv_download() {
        let response = app(scenario_backend())
            .oneshot(post_json("/ndvi/time-series.csv", point_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ndvi_time_series.csv\""
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Date,NDVI\n2020-01-03,0.42\n2020-01-06,\n");
    }

    #[tokio::test]
    async fn test_time_series_png_download() {
        let response = app(scenario_backend())
            .oneshot(post_json("/ndvi/time-series.png", point_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_missing_geometry_is_bad_request() {
        let backend = scenario_backend();
        let response = app(backend.clone())
            .oneshot(post_json(
                "/ndvi/time-series.csv",
                json!({"start_date": "2020-01-01", "end_date": "2020-01-08", "shape": null}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("no geometry"));
        assert_eq!(backend.calls(), 0);
    }

    async fn rejected(backend: Arc<MockBackend>, request: Request<Body>) -> Value {
        let response = app(backend).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_shapes_are_bad_request() {
        let backend = scenario_backend();
        for shape in [
            json!("garbage"),
            json!([1, 2]),
            json!({"geometry": "garbage"}),
        ] {
            let error = rejected(
                backend.clone(),
                post_json(
                    "/ndvi/time-series",
                    json!({"start_date": "2020-01-01", "end_date": "2020-01-08", "shape": shape}),
                ),
            )
            .await;
            assert!(error["error"].as_str().unwrap().starts_with("malformed geometry"));
            assert!(error["trace"].is_array());
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_dates_are_bad_request() {
        let backend = scenario_backend();
        let shape = json!({"geometry": {"type": "Point", "coordinates": [53.16, 36.59]}});

        let error = rejected(
            backend.clone(),
            post_json("/ndvi/time-series.csv", json!({"end_date": "2020-01-08", "shape": shape})),
        )
        .await;
        assert!(error["error"].as_str().unwrap().contains("start_date"));

        let error = rejected(
            backend.clone(),
            post_json(
                "/ndvi/time-series.csv",
                json!({"start_date": "2020-01-01", "end_date": 20200108, "shape": shape}),
            ),
        )
        .await;
        assert!(error["error"].as_str().unwrap().contains("end_date"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let backend = scenario_backend();
        let request = Request::post("/ndvi/time-series")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let error = rejected(backend.clone(), request).await;
        assert!(error["error"].as_str().unwrap().starts_with("invalid request body"));

        let error = rejected(backend.clone(), post_json("/ndvi/time-series", json!("generate"))).await;
        assert!(error["error"].as_str().unwrap().starts_with("invalid request body"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_is_bad_gateway() {
        let response = app(Arc::new(MockBackend::failing("Earth Engine quota exceeded")))
            .oneshot(post_json("/ndvi/time-series", point_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "failed to fetch NDVI time series");
        assert_eq!(
            error["trace"][1],
            "imagery service error: Earth Engine quota exceeded"
        );
    }
}
