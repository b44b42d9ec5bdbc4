use gallery::{GalleryError, MonthLabeler};
use media_source::AccessPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use viewer::Size;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub data_path: PathBuf,
    pub locale: String,
    pub utc_offset_minutes: Option<i32>,
    pub authorized_volumes: Vec<String>,
    pub display_density: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub grid_columns: usize,
    pub memories_limit: usize,
    pub debug_console: bool,
    pub trace_spans: bool,
}

#[derive(Default)]
pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub data_path: Option<PathBuf>,
    pub locale: Option<String>,
    pub authorized_volumes: Option<Vec<String>>,
    pub debug_console: bool,
    pub trace_spans: bool,
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photos")
}

impl AppConfig {
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let mut builder = config::Config::builder();
        let path = path.unwrap_or_else(|| default_base_dir().join("config"));
        builder = builder.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(false),
        );
        let cfg = builder.build().unwrap_or_default();

        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let data_path = cfg
            .get_string("data_path")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_base_dir());
        let locale = cfg
            .get_string("locale")
            .unwrap_or_else(|_| "en_US".to_string());
        let utc_offset_minutes = cfg.get_int("utc_offset_minutes").ok().map(|m| m as i32);
        let authorized_volumes = cfg
            .get::<Vec<String>>("authorized_volumes")
            .unwrap_or_default();
        let display_density = cfg.get_float("display_density").unwrap_or(1.0) as f32;
        let viewport_width = cfg.get_float("viewport_width").unwrap_or(1080.0) as f32;
        let viewport_height = cfg.get_float("viewport_height").unwrap_or(1920.0) as f32;
        let grid_columns = cfg.get_int("grid_columns").unwrap_or(4).max(1) as usize;
        let memories_limit = cfg.get_int("memories_limit").unwrap_or(4).max(0) as usize;
        let debug_console = cfg.get_bool("debug_console").unwrap_or(false);
        let trace_spans = cfg.get_bool("trace_spans").unwrap_or(false);

        Self {
            log_level,
            data_path,
            locale,
            utc_offset_minutes,
            authorized_volumes,
            display_density,
            viewport_width,
            viewport_height,
            grid_columns,
            memories_limit,
            debug_console,
            trace_spans,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(p) = &ov.data_path {
            self.data_path = p.clone();
        }
        if let Some(l) = &ov.locale {
            self.locale = l.clone();
        }
        if let Some(v) = &ov.authorized_volumes {
            self.authorized_volumes = v.clone();
        }
        if ov.debug_console {
            self.debug_console = true;
        }
        if ov.trace_spans {
            self.trace_spans = true;
        }
        self
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(|| default_base_dir().join("config"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_path.join("index.sqlite")
    }

    /// Empty `authorized_volumes` grants every volume.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::from_volumes(self.authorized_volumes.iter().cloned())
    }

    pub fn labeler(&self) -> Result<MonthLabeler, GalleryError> {
        MonthLabeler::from_config(&self.locale, self.utc_offset_minutes)
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(Some(dir.path().join("missing.toml")));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.locale, "en_US");
        assert_eq!(cfg.utc_offset_minutes, None);
        assert!(cfg.authorized_volumes.is_empty());
        assert_eq!(cfg.access_policy(), AccessPolicy::All);
        assert_eq!(cfg.viewport(), Size::new(1080.0, 1920.0));
        assert_eq!(cfg.grid_columns, 4);
        assert_eq!(cfg.memories_limit, 4);
    }

    #[test]
    fn test_file_values_and_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\nlocale = \"de_DE\"\nutc_offset_minutes = 120\n\
             authorized_volumes = [\"external_primary\"]\ndisplay_density = 2.5\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(Some(path));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.utc_offset_minutes, Some(120));
        assert_eq!(cfg.display_density, 2.5);
        assert!(cfg.access_policy().allows("external_primary"));
        assert!(!cfg.access_policy().allows("sd_card"));
        assert!(cfg.labeler().is_ok());

        let cfg = cfg.apply_overrides(&AppConfigOverrides {
            log_level: Some("warn".into()),
            authorized_volumes: Some(Vec::new()),
            ..Default::default()
        });
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.locale, "de_DE");
        assert_eq!(cfg.access_policy(), AccessPolicy::All);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let mut cfg = AppConfig::load_from(Some(dir.path().join("none")));
        cfg.locale = "fr_FR".into();
        cfg.grid_columns = 3;
        cfg.save_to(Some(path.clone())).unwrap();

        let loaded = AppConfig::load_from(Some(path));
        assert_eq!(loaded.locale, "fr_FR");
        assert_eq!(loaded.grid_columns, 3);
    }

    #[test]
    #[serial]
    fn test_default_paths_follow_home() {
        let dir = tempdir().unwrap();
        let old_home = std::env::var_os("HOME");
        std::env::set_var("HOME", dir.path());
        let cfg = AppConfig::load_from(None);
        match old_home {
            Some(h) => std::env::set_var("HOME", h),
            None => std::env::remove_var("HOME"),
        }
        assert_eq!(cfg.data_path, dir.path().join(".photos"));
        assert_eq!(cfg.index_path(), dir.path().join(".photos").join("index.sqlite"));
    }
}
