#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use converter_service::config::{
    ConverterConfig, CorsConfig, CorsMode, Environment, SofficeConfig,
};
use converter_service::services::{ConversionError, Converter};
use converter_service::startup::{build_router, AppState, Application};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_HEADER: &[u8] = b"%PDF-1.4\n";
pub const BOUNDARY: &str = "converter-test-boundary";

pub enum Behavior {
    /// Returns a PDF header followed by the input bytes.
    Echo,
    /// Fails with the given engine message.
    Fail(String),
}

pub struct FakeConverter {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeConverter {
    pub fn echo() -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Echo,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, input: Vec<u8>, extension: &str) -> Result<Vec<u8>, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(extension, ".pdf");

        match &self.behavior {
            Behavior::Echo => {
                let mut pdf = PDF_HEADER.to_vec();
                pdf.extend_from_slice(&input);
                Ok(pdf)
            }
            Behavior::Fail(message) => Err(ConversionError::Engine(message.clone())),
        }
    }
}

pub fn test_config(mode: CorsMode, origins: &[&str]) -> ConverterConfig {
    ConverterConfig {
        common: CoreConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "converter-service".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        cors: CorsConfig {
            mode,
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
        },
        soffice: SofficeConfig {
            binary_path: "soffice".to_string(),
        },
    }
}

pub fn default_config() -> ConverterConfig {
    test_config(
        CorsMode::AllowList,
        &["http://localhost:3000", "https://fundocs.vercel.app"],
    )
}

pub fn router_with(config: ConverterConfig, converter: Arc<dyn Converter>) -> Router {
    build_router(AppState { config, converter })
}

/// One part of a hand-built multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn docx(filename: &'a str, data: Vec<u8>) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            content_type: Some(DOCX_MIME),
            data,
        }
    }

    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn convert_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Failed to parse JSON")
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(converter: Arc<dyn Converter>) -> Self {
        Self::spawn_with(default_config(), converter).await
    }

    pub async fn spawn_with(config: ConverterConfig, converter: Arc<dyn Converter>) -> Self {
        let app = Application::build_with_converter(config, converter)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
