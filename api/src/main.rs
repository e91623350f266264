//! Confidential Age Verification API Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client (Frontend)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                      Routes Layer                        ││
//! │  │  /health  /verify/*  /v1/user-decrypt  /relayer/*       ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Services Layer                        ││
//! │  │  EncryptionService   DecryptionGateway   Flow           ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Protocol Layer                        ││
//! │  │  AgeVerificationStore      ComparisonEngine             ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FHE Coprocessor / Relayer                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhe_age_protocol::{AgeVerificationStore, ThresholdConfig};

// 라이브러리에서 가져오기
use fhe_age_api::{
    routes, AppState, Config, DecryptionGateway, EncryptionService, FheEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,tower_http=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fhe_age_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Confidential Age Verification API Server");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    // FHE 엔진 + 암호화 어댑터 초기화
    let engine = Arc::new(FheEngine::new());
    let encryption = Arc::new(EncryptionService::new(engine.clone()));
    encryption.init().await?;
    tracing::info!("🔐 FHE engine initialized");

    // 레코드 스토어
    let store = Arc::new(AgeVerificationStore::new(
        config.contract_address.clone(),
        ThresholdConfig::default(),
        engine.clone(),
    ));
    tracing::info!(
        "🗄️  Record store ready at {} (threshold year: {})",
        store.address(),
        store.threshold_year()
    );

    // 복호화 권한 게이트웨이
    let gateway = Arc::new(DecryptionGateway::new(engine.clone()));
    tracing::info!("🔓 Decryption gateway ready");

    // 앱 상태 구성
    let state = AppState {
        store,
        encryption,
        gateway,
        config: Arc::new(config.clone()),
        http: reqwest::Client::new(),
    };

    // 라우터 구성
    let app = create_app(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 미들웨어를 포함한 앱 구성
fn create_app(state: AppState) -> axum::Router {
    // CORS 설정
    // 프로덕션에서는 특정 도메인만 허용
    // 개발 환경에서는 localhost 허용
    use tower_http::cors::AllowOrigin;

    let cors = if state.config.is_production() {
        // 프로덕션: 특정 도메인만 허용 (환경변수로 설정)
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string());
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        // 개발: localhost 허용
        CorsLayer::new()
            .allow_origin([
                "http://localhost:3000".parse().unwrap(),
                "http://127.0.0.1:3000".parse().unwrap(),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    routes::router(state)
        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
