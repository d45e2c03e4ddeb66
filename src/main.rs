use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use careplan_stub::StubStore;
use careplan_stub::routes::ApiDoc;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Runner settings resolved once at startup.
#[derive(Debug, PartialEq)]
struct RunConfig {
    addr: SocketAddr,
    token: Option<String>,
    seed: Option<PathBuf>,
}

impl RunConfig {
    fn from_env_values(
        addr: Option<String>,
        token: Option<String>,
        seed: Option<String>,
    ) -> anyhow::Result<Self> {
        let non_blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let addr = non_blank(addr)
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()?;
        Ok(Self {
            addr,
            token: non_blank(token),
            seed: non_blank(seed).map(PathBuf::from),
        })
    }
}

/// Serves the in-memory care plan API.
///
/// # Environment Variables
/// - `CAREPLAN_STUB_ADDR`: listen address (default: "0.0.0.0:8080")
/// - `CAREPLAN_STUB_TOKEN`: bearer token required on API routes; unset disables the check
/// - `CAREPLAN_STUB_SEED`: optional YAML file with staff and care plans to preload
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("careplan=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = RunConfig::from_env_values(
        std::env::var("CAREPLAN_STUB_ADDR").ok(),
        std::env::var("CAREPLAN_STUB_TOKEN").ok(),
        std::env::var("CAREPLAN_STUB_SEED").ok(),
    )?;

    let store = StubStore::new(cfg.token.clone());
    if let Some(seed) = &cfg.seed {
        store.load_seed_file(seed)?;
        tracing::info!("++ Seeded from {}", seed.display());
    }
    if cfg.token.is_none() {
        tracing::warn!("CAREPLAN_STUB_TOKEN is not set; API routes accept any caller");
    }

    let app = careplan_stub::router(store)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/swagger.json", ApiDoc::openapi()));

    tracing::info!("++ Starting care plan stub API on {}", cfg.addr);
    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
