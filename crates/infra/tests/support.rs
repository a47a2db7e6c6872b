//! Shared helpers for infra integration tests

use std::sync::{Arc, Once};

use serde_json::{json, Value};
use tollgate_domain::ClientConfig;
use tollgate_infra::auth::jwt;
use tollgate_infra::{AlwaysOnline, ConnectivityProbe, TollgateClient};
use tracing_subscriber::EnvFilter;

pub const CLIENT_KEY: &str = "test-client-key";

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Live configuration pointed at `base_url` with short delays.
pub fn live_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(base_url, CLIENT_KEY);
    config.timeout_ms = 2_000;
    config.retry.max_retries = 3;
    config.retry.base_delay_ms = 20;
    config.retry.max_delay_ms = 1_000;
    config.storage.use_keychain = false;
    config
}

/// Mock-mode configuration without artificial latency.
pub fn mock_config() -> ClientConfig {
    let mut config = ClientConfig::mock(CLIENT_KEY);
    config.mock_delay_ms = 0;
    config.storage.use_keychain = false;
    config
}

pub fn live_client(config: ClientConfig) -> TollgateClient {
    client_with_connectivity(config, Arc::new(AlwaysOnline))
}

pub fn client_with_connectivity(
    config: ClientConfig,
    connectivity: Arc<dyn ConnectivityProbe>,
) -> TollgateClient {
    init_tracing();
    TollgateClient::builder(config).connectivity(connectivity).build().expect("client should build")
}

/// Unsigned JWT expiring at `exp` (seconds since the epoch).
pub fn jwt_with_exp(exp: i64) -> String {
    jwt::encode_unsigned(&json!({ "sub": "ada", "exp": exp }))
}

pub fn expired_jwt() -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() - 60)
}

/// Successful envelope body carrying `data`.
pub fn envelope(data: Value) -> Value {
    json!({ "statusCode": 200, "success": true, "message": "OK", "data": data })
}

pub fn token_envelope(token: &str) -> Value {
    envelope(json!({ "jwtToken": token }))
}
