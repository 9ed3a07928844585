use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::warn;

use crate::models::ProjectorSettings;

use super::connection::{get_meta, set_meta};

const SETTINGS_KEY: &str = "projector_settings";

/// Stored projector look, or the defaults when nothing was saved yet. A
/// value that no longer parses is logged and replaced by the defaults.
pub fn load_projector_settings(conn: &Connection) -> Result<ProjectorSettings> {
    let Some(raw) = get_meta(conn, SETTINGS_KEY)? else {
        return Ok(ProjectorSettings::default());
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => Ok(settings),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable projector settings");
            Ok(ProjectorSettings::default())
        }
    }
}

pub fn save_projector_settings(conn: &Connection, settings: &ProjectorSettings) -> Result<()> {
    let raw = serde_json::to_string(settings).context("failed to serialize projector settings")?;
    set_meta(conn, SETTINGS_KEY, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::models::TextAlign;

    #[test]
    fn defaults_until_something_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let conn = ensure_schema(&dir.path().join("db.sqlite")).unwrap();
        assert_eq!(load_projector_settings(&conn).unwrap(), ProjectorSettings::default());

        let settings = ProjectorSettings {
            background_color: "#112233".to_string(),
            is_bold: true,
            text_align: TextAlign::Left,
            ..ProjectorSettings::default()
        };
        save_projector_settings(&conn, &settings).unwrap();
        assert_eq!(load_projector_settings(&conn).unwrap(), settings);
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let conn = ensure_schema(&dir.path().join("db.sqlite")).unwrap();
        set_meta(&conn, SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(load_projector_settings(&conn).unwrap(), ProjectorSettings::default());
    }
}
