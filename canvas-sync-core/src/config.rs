//! Settings loading.
//!
//! Values are layered, highest precedence first:
//! 1. command-line flags ([`Overrides`])
//! 2. the config file (`~/.config/canvas_caldav_sync` unless `--config` is given)
//! 3. credential files in `$CREDENTIALS_DIRECTORY` (`canvas-api-key`, `caldav-password`)
//! 4. built-in defaults
//!
//! The config file holds one `key = value` (or `key: value`) pair per line with unquoted
//! values, read as INI. A file ending in `.toml` is read as TOML instead.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use crate::constants::{
    CALDAV_PASSWORD_CREDENTIAL, CANVAS_API_KEY_CREDENTIAL, CREDENTIALS_DIRECTORY_ENV,
    DEFAULT_CATEGORY, DEFAULT_CONFIG_PATH, DEFAULT_DESCRIPTION_ID_PREFIX, DEFAULT_FALLBACK_HOUR,
    DEFAULT_LOOK_AHEAD_DAYS,
};
use crate::due::{DuePolicy, LocalFrame};
use crate::error::{SyncError, SyncResult};
use crate::policy::Admission;
use crate::reconcile::SyncOptions;

/// Values given on the command line. `None` leaves lower layers in effect.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub canvas_url: Option<String>,
    pub canvas_user_id: Option<String>,
    pub canvas_api_key: Option<String>,
    pub caldav_url: Option<String>,
    pub caldav_user: Option<String>,
    pub caldav_password: Option<String>,
    pub caldav_calendar_url: Option<String>,
    pub description_id_prefix: Option<String>,
    pub category: Option<String>,
    pub look_ahead: Option<i64>,
    pub no_due: Option<bool>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i64>,
    pub fallback_hour: Option<i64>,
    pub skip_inactive_courses: Option<bool>,
}

/// Shape of the merged configuration before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSettings {
    canvas_url: Option<String>,
    canvas_user_id: Option<String>,
    canvas_api_key: Option<String>,
    caldav_url: Option<String>,
    caldav_user: Option<String>,
    caldav_password: Option<String>,
    caldav_calendar_url: Option<String>,
    description_id_prefix: String,
    category: String,
    look_ahead: i64,
    no_due: bool,
    timezone: Option<String>,
    timezone_offset: Option<i64>,
    fallback_hour: i64,
    skip_inactive_courses: bool,
}

#[derive(Clone)]
pub struct CanvasSettings {
    pub url: String,
    pub user_id: String,
    pub api_key: String,
}

impl fmt::Debug for CanvasSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasSettings")
            .field("url", &self.url)
            .field("user_id", &self.user_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct CalDavSettings {
    pub url: String,
    pub user: String,
    pub password: String,
    pub calendar_url: String,
}

impl fmt::Debug for CalDavSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalDavSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("calendar_url", &self.calendar_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub canvas: CanvasSettings,
    pub caldav: CalDavSettings,
    pub sync: SyncOptions,
}

impl Settings {
    /// Load settings from the config file, the credentials directory and `overrides`.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> SyncResult<Self> {
        let credentials_dir = std::env::var_os(CREDENTIALS_DIRECTORY_ENV).map(PathBuf::from);
        Self::load_from(config_file, credentials_dir.as_deref(), overrides)
    }

    pub fn load_from(
        config_file: Option<&Path>,
        credentials_dir: Option<&Path>,
        overrides: &Overrides,
    ) -> SyncResult<Self> {
        let mut builder = Config::builder()
            .set_default("description-id-prefix", DEFAULT_DESCRIPTION_ID_PREFIX)
            .and_then(|b| b.set_default("category", DEFAULT_CATEGORY))
            .and_then(|b| b.set_default("look-ahead", DEFAULT_LOOK_AHEAD_DAYS))
            .and_then(|b| b.set_default("no-due", false))
            .and_then(|b| b.set_default("fallback-hour", DEFAULT_FALLBACK_HOUR))
            .and_then(|b| b.set_default("skip-inactive-courses", false))
            .map_err(config_error)?;

        if let Some(dir) = credentials_dir {
            builder = add_credentials(builder, dir)?;
        }

        // An explicit --config must exist, the default location is optional
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        builder = builder.add_source(
            File::new(&path.to_string_lossy(), config_file_format(&path)).required(required),
        );

        builder = apply_overrides(builder, overrides).map_err(config_error)?;

        let raw: RawSettings = builder
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        raw.validate()
    }
}

impl RawSettings {
    fn validate(self) -> SyncResult<Settings> {
        let canvas = CanvasSettings {
            url: require(self.canvas_url, "canvas-url")?,
            user_id: require(self.canvas_user_id, "canvas-user-id")?,
            api_key: require(self.canvas_api_key, "canvas-api-key")?,
        };

        let caldav = CalDavSettings {
            url: require(self.caldav_url, "caldav-url")?,
            user: require(self.caldav_user, "caldav-user")?,
            password: require(self.caldav_password, "caldav-password")?,
            calendar_url: require(self.caldav_calendar_url, "caldav-calendar-url")?,
        };

        let frame = match (self.timezone, self.timezone_offset) {
            (Some(_), Some(_)) => {
                return Err(SyncError::Config(
                    "'timezone' and 'timezone-offset' cannot both be set".to_string(),
                ));
            }
            (Some(name), None) => {
                let tz: Tz = name
                    .parse()
                    .map_err(|e| SyncError::Config(format!("Unknown timezone '{name}': {e}")))?;
                LocalFrame::Zone(tz)
            }
            (None, Some(hours)) => LocalFrame::FixedOffset(hours),
            (None, None) => LocalFrame::Utc,
        };

        let fallback_hour = i32::try_from(self.fallback_hour)
            .ok()
            .filter(|h| (-1..=23).contains(h))
            .ok_or_else(|| {
                SyncError::Config(format!(
                    "'fallback-hour' must be between -1 and 23, got {}",
                    self.fallback_hour
                ))
            })?;

        if self.description_id_prefix.is_empty() {
            return Err(SyncError::Config(
                "'description-id-prefix' must not be empty".to_string(),
            ));
        }

        let sync = SyncOptions {
            description_id_prefix: self.description_id_prefix,
            category: self.category,
            admission: Admission {
                look_ahead: self.look_ahead,
                include_undated: self.no_due,
            },
            due_policy: DuePolicy {
                frame,
                fallback_hour,
            },
            skip_inactive_courses: self.skip_inactive_courses,
            dry_run: false,
        };

        Ok(Settings {
            canvas,
            caldav,
            sync,
        })
    }
}

fn require(value: Option<String>, key: &str) -> SyncResult<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        SyncError::Config(format!(
            "Missing required setting '{key}' (pass --{key} or set it in the config file)"
        ))
    })
}

fn config_file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
        _ => FileFormat::Ini,
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned())
}

/// Credential files as lowest-precedence values
fn add_credentials(
    mut builder: ConfigBuilder<DefaultState>,
    dir: &Path,
) -> SyncResult<ConfigBuilder<DefaultState>> {
    for name in [CANVAS_API_KEY_CREDENTIAL, CALDAV_PASSWORD_CREDENTIAL] {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }

        let secret = std::fs::read_to_string(&path)?;
        let secret = secret.trim_end_matches(['\r', '\n']).to_string();
        builder = builder.set_default(name, secret).map_err(config_error)?;
    }

    Ok(builder)
}

fn apply_overrides(
    builder: ConfigBuilder<DefaultState>,
    o: &Overrides,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_override_option("canvas-url", o.canvas_url.clone())?
        .set_override_option("canvas-user-id", o.canvas_user_id.clone())?
        .set_override_option("canvas-api-key", o.canvas_api_key.clone())?
        .set_override_option("caldav-url", o.caldav_url.clone())?
        .set_override_option("caldav-user", o.caldav_user.clone())?
        .set_override_option("caldav-password", o.caldav_password.clone())?
        .set_override_option("caldav-calendar-url", o.caldav_calendar_url.clone())?
        .set_override_option("description-id-prefix", o.description_id_prefix.clone())?
        .set_override_option("category", o.category.clone())?
        .set_override_option("look-ahead", o.look_ahead)?
        .set_override_option("no-due", o.no_due)?
        .set_override_option("timezone", o.timezone.clone())?
        .set_override_option("timezone-offset", o.timezone_offset)?
        .set_override_option("fallback-hour", o.fallback_hour)?
        .set_override_option("skip-inactive-courses", o.skip_inactive_courses)
}

fn config_error(e: config::ConfigError) -> SyncError {
    SyncError::Config(e.to_string())
}
