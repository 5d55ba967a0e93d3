//! API server configuration.

use std::fmt;
use std::time::Duration;

use tbauth_core::auth::jwt::{DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL};
use url::Url;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default bound on upstream calls (key set fetch, legacy forwarding).
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the API server.
///
/// Populated by the server binary from its command line / environment.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3000").
    pub bind_addr: String,
    /// Shared HS512 secret for minted session tokens.
    pub signing_key: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// The platform's native login endpoint.
    pub upstream_login_url: Url,
    pub upstream_timeout: Duration,
}

impl ApiConfig {
    /// Config with defaults for everything but the required values.
    pub fn new(signing_key: impl Into<String>, upstream_login_url: Url) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            signing_key: signing_key.into(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            upstream_login_url,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// Shortest accepted session token lifetime; anything shorter would mint a
/// token whose `exp` equals its `iat`.
pub const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(1);

/// Unit spellings and their length in milliseconds. A year is 365.25 days.
const DURATION_UNITS: &[(&[&str], f64)] = &[
    (&["milliseconds", "millisecond", "msecs", "msec", "ms"], 1.0),
    (&["seconds", "second", "secs", "sec", "s"], 1_000.0),
    (&["minutes", "minute", "mins", "min", "m"], 60_000.0),
    (&["hours", "hour", "hrs", "hr", "h"], 3_600_000.0),
    (&["days", "day", "d"], 86_400_000.0),
    (&["weeks", "week", "w"], 604_800_000.0),
    (&["years", "year", "yrs", "yr", "y"], 31_557_600_000.0),
];

/// Parse a duration such as `"9000s"`, `"7d"`, `"2.5h"`, `"1 week"` or
/// `"250ms"`.
///
/// Units are case-insensitive and may be separated from the number by spaces.
/// A bare number is milliseconds, so `.env` files written for the Node
/// gateway keep their meaning.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{input}'"))?;
    let unit = unit.trim_start().to_ascii_lowercase();
    let unit_ms = if unit.is_empty() {
        1.0
    } else {
        DURATION_UNITS
            .iter()
            .find(|(names, _)| names.contains(&unit.as_str()))
            .map(|(_, ms)| *ms)
            .ok_or_else(|| format!("unknown unit '{unit}' in duration '{input}'"))?
    };

    Duration::try_from_secs_f64(value * unit_ms / 1_000.0)
        .map_err(|e| format!("invalid duration '{input}': {e}"))
}

/// [`parse_duration`] for session token lifetimes, which must be at least
/// [`MIN_TOKEN_LIFETIME`].
pub fn parse_token_lifetime(s: &str) -> Result<Duration, String> {
    let ttl = parse_duration(s)?;
    if ttl < MIN_TOKEN_LIFETIME {
        return Err(format!("token lifetime '{}' is shorter than 1s", s.trim()));
    }
    Ok(ttl)
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("signing_key", &"***")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("upstream_login_url", &self.upstream_login_url.as_str())
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig::new(
            "super-secret",
            Url::parse("http://tb:8080/api/auth/login").unwrap(),
        )
    }

    #[test]
    fn defaults_match_platform_lifetimes() {
        let cfg = config();
        assert_eq!(cfg.access_token_ttl, Duration::from_secs(9000));
        assert_eq!(cfg.refresh_token_ttl, Duration::from_secs(604_800));
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration("9000s").unwrap(), Duration::from_secs(9000));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("1y").unwrap(), Duration::from_secs(31_557_600));
    }

    #[test]
    fn parses_fractions_and_long_unit_names() {
        assert_eq!(parse_duration("2.5h").unwrap(), Duration::from_secs(9000));
        assert_eq!(parse_duration("1 week").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("3 Days").unwrap(), Duration::from_secs(259_200));
        assert_eq!(parse_duration("10 mins").unwrap(), Duration::from_secs(600));
    }

    #[test]
    fn bare_number_is_milliseconds() {
        assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_unparseable_duration() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5 fortnights").is_err());
        assert!(parse_duration("1.2.3s").is_err());
    }

    #[test]
    fn token_lifetime_must_reach_one_second() {
        assert!(parse_token_lifetime("250ms").is_err());
        assert!(parse_token_lifetime("0s").is_err());
        assert_eq!(parse_token_lifetime("1s").unwrap(), MIN_TOKEN_LIFETIME);
        assert_eq!(parse_token_lifetime("7d").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn debug_hides_signing_key() {
        let shown = format!("{:?}", config());
        assert!(!shown.contains("super-secret"));
    }
}
