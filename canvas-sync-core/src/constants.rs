pub const DEFAULT_CONFIG_PATH: &str = "~/.config/canvas_caldav_sync";

pub const DEFAULT_DESCRIPTION_ID_PREFIX: &str = "assignment-id: ";
pub const DEFAULT_CATEGORY: &str = "canvas-assignment";
pub const DEFAULT_LOOK_AHEAD_DAYS: i64 = 14;
/// Hours are never below -1, so the fallback rule is off by default
pub const DEFAULT_FALLBACK_HOUR: i64 = -1;

/// Set by systemd for units using `LoadCredential=`
pub const CREDENTIALS_DIRECTORY_ENV: &str = "CREDENTIALS_DIRECTORY";
pub const CANVAS_API_KEY_CREDENTIAL: &str = "canvas-api-key";
pub const CALDAV_PASSWORD_CREDENTIAL: &str = "caldav-password";
