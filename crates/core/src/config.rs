use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::{DocumentRenderer, HtmlRenderer, StudioProfile, WkhtmltopdfRenderer};
use crate::cpq::catalog::{builtin_catalog, CatalogError, PricingCatalog};

pub const ENV_PREFIX: &str = "WRH_QUOTE_";
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["wrh-quote.toml", "config/wrh-quote.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub studio: StudioProfile,
    pub catalog: CatalogConfig,
    pub document: DocumentConfig,
    pub mail: MailConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// Replacement price list. `None` means the built-in catalog.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct DocumentConfig {
    pub output_dir: PathBuf,
    pub renderer: RendererKind,
    pub wkhtmltopdf_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub outbox_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// PDF through wkhtmltopdf when available, HTML otherwise.
    Auto,
    Html,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub outbox_dir: Option<PathBuf>,
    pub renderer: Option<RendererKind>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            studio: StudioProfile::default(),
            catalog: CatalogConfig::default(),
            document: DocumentConfig {
                output_dir: PathBuf::from("quotes"),
                renderer: RendererKind::Auto,
                wkhtmltopdf_path: None,
            },
            mail: MailConfig { outbox_dir: PathBuf::from("outbox") },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for RendererKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "html" => Ok(Self::Html),
            other => Err(ConfigError::Validation(format!(
                "unsupported document renderer `{other}` (expected auto|html)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The configured catalog file, or the built-in price list.
    pub fn load_catalog(&self) -> Result<PricingCatalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => PricingCatalog::load(path),
            None => Ok(builtin_catalog().clone()),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(studio) = patch.studio {
            if let Some(company_name) = studio.company_name {
                self.studio.company_name = company_name;
            }
            if let Some(quote_recipient) = studio.quote_recipient {
                self.studio.quote_recipient = quote_recipient;
            }
            if let Some(contact_email) = studio.contact_email {
                self.studio.contact_email = contact_email;
            }
            if let Some(currency) = studio.currency {
                self.studio.currency = currency;
            }
            if let Some(reference_prefix) = studio.reference_prefix {
                self.studio.reference_prefix = reference_prefix;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(document) = patch.document {
            if let Some(output_dir) = document.output_dir {
                self.document.output_dir = output_dir;
            }
            if let Some(renderer) = document.renderer {
                self.document.renderer = renderer;
            }
            if let Some(wkhtmltopdf_path) = document.wkhtmltopdf_path {
                self.document.wkhtmltopdf_path = Some(wkhtmltopdf_path);
            }
        }

        if let Some(mail) = patch.mail {
            if let Some(outbox_dir) = mail.outbox_dir {
                self.mail.outbox_dir = outbox_dir;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WRH_QUOTE_STUDIO_COMPANY_NAME") {
            self.studio.company_name = value;
        }
        if let Some(value) = read_env("WRH_QUOTE_STUDIO_QUOTE_RECIPIENT") {
            self.studio.quote_recipient = value;
        }
        if let Some(value) = read_env("WRH_QUOTE_STUDIO_CONTACT_EMAIL") {
            self.studio.contact_email = value;
        }
        if let Some(value) = read_env("WRH_QUOTE_STUDIO_CURRENCY") {
            self.studio.currency = value;
        }
        if let Some(value) = read_env("WRH_QUOTE_STUDIO_REFERENCE_PREFIX") {
            self.studio.reference_prefix = value;
        }

        if let Some(value) = read_env("WRH_QUOTE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("WRH_QUOTE_DOCUMENT_OUTPUT_DIR") {
            self.document.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("WRH_QUOTE_DOCUMENT_RENDERER") {
            self.document.renderer = value.parse()?;
        }
        if let Some(value) = read_env("WRH_QUOTE_DOCUMENT_WKHTMLTOPDF_PATH") {
            self.document.wkhtmltopdf_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("WRH_QUOTE_MAIL_OUTBOX_DIR") {
            self.mail.outbox_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("WRH_QUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("WRH_QUOTE_SERVER_PORT") {
            self.server.port = parse_u16("WRH_QUOTE_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("WRH_QUOTE_LOGGING_LEVEL").or_else(|| read_env("WRH_QUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WRH_QUOTE_LOGGING_FORMAT").or_else(|| read_env("WRH_QUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(output_dir) = overrides.output_dir {
            self.document.output_dir = output_dir;
        }
        if let Some(outbox_dir) = overrides.outbox_dir {
            self.mail.outbox_dir = outbox_dir;
        }
        if let Some(renderer) = overrides.renderer {
            self.document.renderer = renderer;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_studio(&self.studio)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl DocumentConfig {
    pub fn renderer(&self) -> Box<dyn DocumentRenderer> {
        match (self.renderer, &self.wkhtmltopdf_path) {
            (RendererKind::Html, _) => Box::new(HtmlRenderer),
            (RendererKind::Auto, Some(path)) => Box::new(WkhtmltopdfRenderer::with_binary(path)),
            (RendererKind::Auto, None) => Box::new(WkhtmltopdfRenderer::detect()),
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_studio(studio: &StudioProfile) -> Result<(), ConfigError> {
    if studio.company_name.trim().is_empty() {
        return Err(ConfigError::Validation("studio.company_name must not be empty".to_string()));
    }
    let addresses = [
        ("studio.quote_recipient", &studio.quote_recipient),
        ("studio.contact_email", &studio.contact_email),
    ];
    for (key, value) in addresses {
        let trimmed = value.trim();
        if trimmed.starts_with('@') || trimmed.ends_with('@') || !trimmed.contains('@') {
            return Err(ConfigError::Validation(format!(
                "{key} must be an email address, got `{value}`"
            )));
        }
    }
    let currency = &studio.currency;
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "studio.currency must be a 3-letter uppercase code, got `{currency}`"
        )));
    }
    let prefix = &studio.reference_prefix;
    if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "studio.reference_prefix must be non-empty and alphanumeric, got `{prefix}`"
        )));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    studio: Option<StudioPatch>,
    catalog: Option<CatalogPatch>,
    document: Option<DocumentPatch>,
    mail: Option<MailPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StudioPatch {
    company_name: Option<String>,
    quote_recipient: Option<String>,
    contact_email: Option<String>,
    currency: Option<String>,
    reference_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentPatch {
    output_dir: Option<PathBuf>,
    renderer: Option<RendererKind>,
    wkhtmltopdf_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct MailPatch {
    outbox_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, RendererKind};
    use crate::domain::ServiceType;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "WRH_QUOTE_STUDIO_COMPANY_NAME",
        "WRH_QUOTE_STUDIO_QUOTE_RECIPIENT",
        "WRH_QUOTE_STUDIO_CURRENCY",
        "WRH_QUOTE_SERVER_PORT",
        "WRH_QUOTE_LOG_LEVEL",
        "WRH_QUOTE_LOG_FORMAT",
        "WRH_QUOTE_DOCUMENT_RENDERER",
        "TEST_WRH_RECIPIENT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        ensure(config.studio.company_name == "White Rabbit Hole", "default company name")?;
        ensure(config.studio.currency == "AED", "default currency")?;
        ensure(config.server.port == 8080, "default port")?;
        ensure(config.document.renderer == RendererKind::Auto, "default renderer")?;
        ensure(config.catalog.path.is_none(), "built-in catalog by default")?;
        Ok(())
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("TEST_WRH_RECIPIENT", "quotes@wrh.ae");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("wrh-quote.toml");
            fs::write(
                &path,
                r#"
[studio]
quote_recipient = "${TEST_WRH_RECIPIENT}"
reference_prefix = "WRHQ"

[document]
renderer = "html"
output_dir = "/tmp/wrh-quotes"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.studio.quote_recipient == "quotes@wrh.ae",
                "recipient should be interpolated from the environment",
            )?;
            ensure(config.studio.reference_prefix == "WRHQ", "prefix should come from file")?;
            ensure(config.document.renderer == RendererKind::Html, "renderer from file")?;
            ensure(
                config.document.output_dir == PathBuf::from("/tmp/wrh-quotes"),
                "output dir from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_WRH_RECIPIENT"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let path = dir.path().join("wrh-quote.toml");
        fs::write(&path, "[studio]\ncompany_name = \"${TEST_WRH_UNSET_NAME}\"\n")
            .map_err(|err| err.to_string())?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                result,
                Err(ConfigError::MissingEnvInterpolation { ref var })
                    if var == "TEST_WRH_UNSET_NAME"
            ),
            "unset interpolation variable should fail",
        )
    }

    #[test]
    fn env_overrides_file_and_overrides_win_over_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("WRH_QUOTE_STUDIO_COMPANY_NAME", "Rabbit Films");
        env::set_var("WRH_QUOTE_SERVER_PORT", "9090");
        env::set_var("WRH_QUOTE_LOG_LEVEL", "warn");
        env::set_var("WRH_QUOTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err| err.to_string())?;
            let path = dir.path().join("wrh-quote.toml");
            fs::write(&path, "[studio]\ncompany_name = \"From File\"\n")
                .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    server_port: Some(7000),
                    renderer: Some(RendererKind::Html),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.studio.company_name == "Rabbit Films", "env should beat the file")?;
            ensure(config.server.port == 7000, "programmatic override should beat env")?;
            ensure(config.logging.level == "warn", "log level alias should apply")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "log format alias")?;
            ensure(config.document.renderer == RendererKind::Html, "renderer override")?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn invalid_env_values_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("WRH_QUOTE_SERVER_PORT", "eighty");
        let port = AppConfig::load(LoadOptions::default());
        clear_vars(MANAGED_VARS);
        ensure(
            matches!(
                port,
                Err(ConfigError::InvalidEnvOverride { ref key, .. })
                    if key == "WRH_QUOTE_SERVER_PORT"
            ),
            "non-numeric port should be rejected",
        )?;

        env::set_var("WRH_QUOTE_DOCUMENT_RENDERER", "docx");
        let renderer = AppConfig::load(LoadOptions::default());
        clear_vars(MANAGED_VARS);
        ensure(matches!(renderer, Err(ConfigError::Validation(_))), "unknown renderer rejected")
    }

    #[test]
    fn studio_validation_catches_bad_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let cases = [
            ("WRH_QUOTE_STUDIO_CURRENCY", "aed"),
            ("WRH_QUOTE_STUDIO_QUOTE_RECIPIENT", "not-an-address"),
            ("WRH_QUOTE_STUDIO_COMPANY_NAME", "   "),
        ];
        for (key, value) in cases {
            env::set_var(key, value);
            let result = AppConfig::load(LoadOptions::default());
            clear_vars(MANAGED_VARS);
            // Whitespace-only env values are ignored, so the company name case passes.
            if value.trim().is_empty() {
                ensure(result.is_ok(), "blank env values fall back to defaults")?;
            } else {
                ensure(matches!(result, Err(ConfigError::Validation(_))), "bad studio value")?;
            }
        }

        let mut config = AppConfig::default();
        config.studio.reference_prefix = "WRH-".to_string();
        ensure(config.validate().is_err(), "prefix with punctuation is rejected")?;
        config.studio.reference_prefix = "WRH".to_string();
        config.server.port = 0;
        ensure(config.validate().is_err(), "port zero is rejected")?;
        Ok(())
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let missing = dir.path().join("absent.toml");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported",
        )
    }

    #[test]
    fn catalog_path_replaces_builtin_catalog() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
[[services]]
service_type = "timelapse"

[[services.subtypes]]
name = "Construction Time-lapse"

[[services.subtypes.packages]]
name = "Per Month"
min = 4000
max = 6000
"#,
        )
        .map_err(|err| err.to_string())?;

        let mut config = AppConfig::default();
        let builtin = config.load_catalog().map_err(|err| err.to_string())?;
        ensure(builtin.service_types().len() == 5, "built-in catalog has five services")?;

        config.catalog.path = Some(path);
        let custom = config.load_catalog().map_err(|err| err.to_string())?;
        ensure(custom.service_types() == vec![ServiceType::Timelapse], "file replaces wholesale")?;
        ensure(
            custom.subtypes(ServiceType::Photography).is_none(),
            "services absent from the file are not merged in",
        )
    }
}
