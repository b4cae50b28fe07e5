use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    /// Fixed event_source_url reported on every outbound event. When unset,
    /// the source URL is derived from the request's Referer header.
    pub source_url: Option<String>,
    pub capi: Option<CapiConfig>,
    pub mail: Option<MailBridgeConfig>,
}

/// Credentials for the advertising platform's server-side events API.
/// Absence does not abort startup; hook posts fail with a 500 instead.
#[derive(Debug, Clone)]
pub struct CapiConfig {
    pub pixel_id: String,
    pub access_token: String,
    pub test_event_code: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct MailBridgeConfig {
    pub token: String,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FORMBRIDGE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_HOST: {e}"))?;

        let port: u16 = env_or("FORMBRIDGE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_PORT: {e}"))?;

        let max_body_size: usize = env_or("FORMBRIDGE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("FORMBRIDGE_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMBRIDGE_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("FORMBRIDGE_LOG_LEVEL", "info");

        let source_url = std::env::var("FORMBRIDGE_SOURCE_URL").ok();

        let capi = match (
            std::env::var("FORMBRIDGE_PIXEL_ID").ok(),
            std::env::var("FORMBRIDGE_CAPI_ACCESS_TOKEN").ok(),
        ) {
            (Some(pixel_id), Some(access_token)) => Some(CapiConfig {
                pixel_id,
                access_token,
                test_event_code: std::env::var("FORMBRIDGE_TEST_EVENT_CODE").ok(),
                base_url: env_or(
                    "FORMBRIDGE_CAPI_BASE_URL",
                    "https://graph.facebook.com/v18.0",
                ),
            }),
            _ => None,
        };

        let mail = match (
            std::env::var("FORMBRIDGE_MAIL_TOKEN").ok(),
            std::env::var("FORMBRIDGE_SMTP_HOST").ok(),
            std::env::var("FORMBRIDGE_SMTP_PORT").ok(),
            std::env::var("FORMBRIDGE_SMTP_USER").ok(),
            std::env::var("FORMBRIDGE_SMTP_PASS").ok(),
        ) {
            (Some(token), Some(smtp_host), Some(smtp_port), Some(user), Some(pass)) => {
                Some(MailBridgeConfig {
                    token,
                    smtp: SmtpConfig {
                        host: smtp_host,
                        port: smtp_port
                            .parse()
                            .map_err(|e| format!("Invalid FORMBRIDGE_SMTP_PORT: {e}"))?,
                        user,
                        pass,
                    },
                })
            }
            _ => None,
        };

        Ok(Config {
            host,
            port,
            max_body_size,
            trusted_proxies,
            log_level,
            source_url,
            capi,
            mail,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
