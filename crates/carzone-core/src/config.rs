use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_bool(&raw).ok_or_else(|| invalid(var, format!("expected a boolean, got \"{raw}\"")))
    };

    let base_url = or_default(
        "CARZONE_BASE_URL",
        "https://www.carzone.ie/rest/1.0/Car/stock",
    );
    let detail_base_url = or_default(
        "CARZONE_DETAIL_BASE_URL",
        "https://www.carzone.ie/rest/1.0/Car",
    );

    let page_count = parse_i64("CARZONE_PAGE_COUNT", "0")?;
    let first_page = parse_u32("CARZONE_FIRST_PAGE", "1")?;

    let chunk_size = parse_usize("CARZONE_CHUNK_SIZE", "4")?;
    if chunk_size == 0 {
        return Err(invalid("CARZONE_CHUNK_SIZE", "must be at least 1".into()));
    }
    let inter_chunk_delay_ms = parse_u64("CARZONE_INTER_CHUNK_DELAY_MS", "0")?;

    let max_retries = parse_u32("CARZONE_MAX_RETRIES", "5")?;
    if max_retries == 0 {
        return Err(invalid("CARZONE_MAX_RETRIES", "must be at least 1".into()));
    }
    let retry_delay_ms = parse_u64("CARZONE_RETRY_DELAY_MS", "500")?;

    let enrichment_enabled = parse_flag("CARZONE_ENRICHMENT", "false")?;
    let detail_concurrency = parse_usize("CARZONE_DETAIL_CONCURRENCY", "1")?;
    if detail_concurrency == 0 {
        return Err(invalid(
            "CARZONE_DETAIL_CONCURRENCY",
            "must be at least 1".into(),
        ));
    }

    let request_timeout_secs = parse_u64("CARZONE_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CARZONE_USER_AGENT", "carzone/0.1 (listing-harvester)");
    let log_level = or_default("CARZONE_LOG_LEVEL", "info");
    let output_path = PathBuf::from(or_default("CARZONE_OUTPUT_PATH", "./carzone_results.csv"));

    Ok(AppConfig {
        base_url,
        detail_base_url,
        page_count,
        first_page,
        chunk_size,
        inter_chunk_delay_ms,
        max_retries,
        retry_delay_ms,
        enrichment_enabled,
        detail_concurrency,
        request_timeout_secs,
        user_agent,
        log_level,
        output_path,
    })
}

/// Parse a boolean flag value.
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
