use crate::config::ConverterConfig;
use crate::handlers;
use crate::middleware::{enforce_origin, CorsPolicy};
use crate::services::{Converter, LibreOfficeConverter};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ConverterConfig,
    pub converter: Arc<dyn Converter>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsPolicy::from_config(&state.config.cors);

    Router::new()
        .route(
            "/health",
            get(handlers::health_check).fallback(handlers::not_found),
        )
        .route(
            "/convert",
            post(handlers::convert_document)
                .fallback(handlers::not_found)
                // The upload validator enforces its own streaming limit.
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(cors.layer())
        .layer(from_fn_with_state(cors, enforce_origin))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: ConverterConfig) -> Result<Self, AppError> {
        let converter: Arc<dyn Converter> =
            Arc::new(LibreOfficeConverter::new(&config.soffice.binary_path));
        Self::build_with_converter(config, converter).await
    }

    pub async fn build_with_converter(
        config: ConverterConfig,
        converter: Arc<dyn Converter>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            cors_mode = ?config.cors.mode,
            soffice = %config.soffice.binary_path,
            "Listening on {}",
            port
        );

        let router = build_router(AppState { config, converter });

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serves until `signal` resolves, then lets in-flight conversions finish.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
