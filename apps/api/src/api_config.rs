use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use systicket_core::AppError;
use systicket_domain::{CustomRoleMode, InactiveCustomRolePolicy, ResolutionPolicy};
use tracing_subscriber::EnvFilter;

const MIN_SECRET_LENGTH: usize = 32;

/// What the binary should do after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    MigrateRevert,
}

impl ApiCommand {
    fn from_arg(arg: Option<&str>) -> Result<Self, AppError> {
        match arg {
            None => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("migrate-revert") => Ok(Self::MigrateRevert),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'migrate' or 'migrate-revert'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub internal_events_token: String,
    pub resolution_policy: ResolutionPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::from_arg(env::args().nth(1).as_deref())?;

        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(10);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let resolution_policy = ResolutionPolicy {
            inactive_custom_role: parse_inactive_custom_role_policy(
                env::var("INACTIVE_CUSTOM_ROLE_POLICY").ok().as_deref(),
            )?,
            custom_role_mode: parse_custom_role_mode(env::var("CUSTOM_ROLE_MODE").ok().as_deref())?,
        };

        // Secrets are only needed by the server.
        let (bootstrap_token, internal_events_token) = if command == ApiCommand::Serve {
            let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;
            ensure_secret_length("SESSION_SECRET", &required_env("SESSION_SECRET")?)?;
            let internal_events_token = required_env("INTERNAL_EVENTS_TOKEN")?;
            ensure_secret_length("INTERNAL_EVENTS_TOKEN", &internal_events_token)?;
            (bootstrap_token, internal_events_token)
        } else {
            (String::new(), String::new())
        };

        Ok(Self {
            command,
            database_url,
            database_max_connections,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            internal_events_token,
            resolution_policy,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_inactive_custom_role_policy(
    value: Option<&str>,
) -> Result<InactiveCustomRolePolicy, AppError> {
    match value.map(str::trim) {
        None | Some("") | Some("fall_back") => Ok(InactiveCustomRolePolicy::FallBack),
        Some("retain") => Ok(InactiveCustomRolePolicy::Retain),
        Some(other) => Err(AppError::Validation(format!(
            "INACTIVE_CUSTOM_ROLE_POLICY must be either 'fall_back' or 'retain', got '{other}'"
        ))),
    }
}

fn parse_custom_role_mode(value: Option<&str>) -> Result<CustomRoleMode, AppError> {
    match value.map(str::trim) {
        None | Some("") | Some("extend") => Ok(CustomRoleMode::Extend),
        Some("replace") => Ok(CustomRoleMode::Replace),
        Some(other) => Err(AppError::Validation(format!(
            "CUSTOM_ROLE_MODE must be either 'extend' or 'replace', got '{other}'"
        ))),
    }
}

fn ensure_secret_length(name: &str, value: &str) -> Result<(), AppError> {
    if value.len() < MIN_SECRET_LENGTH {
        return Err(AppError::Validation(format!(
            "{name} must be at least {MIN_SECRET_LENGTH} characters"
        )));
    }

    Ok(())
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
