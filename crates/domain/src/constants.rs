//! Application constants
//!
//! Centralized location for domain-level constants: backend endpoint paths,
//! timing defaults and storage slot names.

// Backend endpoints
pub const APP_TOKEN_PATH: &str = "/apptoken";
pub const LOGIN_PATH: &str = "/login";
pub const REFRESH_PATH: &str = "/refresh";
pub const LOGOUT_PATH: &str = "/logout";
pub const HEALTH_PATH: &str = "/health";

// Request timing
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONNECTIVITY_TIMEOUT_MS: u64 = 3_000;

// Retry budget (initial attempt + DEFAULT_MAX_RETRIES retries)
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

// Mock mode
pub const DEFAULT_MOCK_DELAY_MS: u64 = 300;

// Credential storage
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "tollgate";
pub const APP_TOKEN_SLOT: &str = "app_token";
pub const USER_TOKEN_SLOT: &str = "user_token";
pub const REFRESH_TOKEN_SLOT: &str = "refresh_token";

// Headers
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";
