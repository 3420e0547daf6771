use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use wrh_quote_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILES};

use crate::commands::{load_config, CommandResult};

/// One reported setting: dotted key, rendered value, env override keys.
struct Setting {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source = field_source(
            setting.key,
            setting.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(setting.key, &setting.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let optional_path = |path: Option<&Path>| {
        path.map(|path| path.display().to_string()).unwrap_or_else(|| "<unset>".to_string())
    };

    vec![
        Setting {
            key: "studio.company_name",
            value: config.studio.company_name.clone(),
            env_keys: &["WRH_QUOTE_STUDIO_COMPANY_NAME"],
        },
        Setting {
            key: "studio.quote_recipient",
            value: config.studio.quote_recipient.clone(),
            env_keys: &["WRH_QUOTE_STUDIO_QUOTE_RECIPIENT"],
        },
        Setting {
            key: "studio.contact_email",
            value: config.studio.contact_email.clone(),
            env_keys: &["WRH_QUOTE_STUDIO_CONTACT_EMAIL"],
        },
        Setting {
            key: "studio.currency",
            value: config.studio.currency.clone(),
            env_keys: &["WRH_QUOTE_STUDIO_CURRENCY"],
        },
        Setting {
            key: "studio.reference_prefix",
            value: config.studio.reference_prefix.clone(),
            env_keys: &["WRH_QUOTE_STUDIO_REFERENCE_PREFIX"],
        },
        Setting {
            key: "catalog.path",
            value: config
                .catalog
                .path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string()),
            env_keys: &["WRH_QUOTE_CATALOG_PATH"],
        },
        Setting {
            key: "document.output_dir",
            value: config.document.output_dir.display().to_string(),
            env_keys: &["WRH_QUOTE_DOCUMENT_OUTPUT_DIR"],
        },
        Setting {
            key: "document.renderer",
            value: format!("{:?}", config.document.renderer),
            env_keys: &["WRH_QUOTE_DOCUMENT_RENDERER"],
        },
        Setting {
            key: "document.wkhtmltopdf_path",
            value: optional_path(config.document.wkhtmltopdf_path.as_deref()),
            env_keys: &["WRH_QUOTE_DOCUMENT_WKHTMLTOPDF_PATH"],
        },
        Setting {
            key: "mail.outbox_dir",
            value: config.mail.outbox_dir.display().to_string(),
            env_keys: &["WRH_QUOTE_MAIL_OUTBOX_DIR"],
        },
        Setting {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["WRH_QUOTE_SERVER_BIND_ADDRESS"],
        },
        Setting {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["WRH_QUOTE_SERVER_PORT"],
        },
        Setting {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["WRH_QUOTE_LOGGING_LEVEL", "WRH_QUOTE_LOG_LEVEL"],
        },
        Setting {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["WRH_QUOTE_LOGGING_FORMAT", "WRH_QUOTE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
