use crate::core::geofence::DEFAULT_GEOFENCE_RADIUS_FT;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_radius_ft")]
    pub default_geofence_radius_ft: f64,
    #[serde(default = "default_certify_tolerance")]
    pub certify_tolerance_minutes: i64,
    #[serde(default = "default_display_unit")]
    pub display_unit: String,
}

fn default_radius_ft() -> f64 {
    DEFAULT_GEOFENCE_RADIUS_FT
}
fn default_certify_tolerance() -> i64 {
    6
}
fn default_display_unit() -> String {
    "feet".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            default_geofence_radius_ft: default_radius_ft(),
            certify_tolerance_minutes: default_certify_tolerance(),
            display_unit: default_display_unit(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("shifttracker")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".shifttracker")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("shifttracker.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("shifttracker.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Self {
        let path = Self::config_file();

        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
                Err(_) => Config::default(),
            }
        } else {
            Config::default()
        }
    }

    /// Default geofence radius in meters, for assignments created
    /// without an explicit radius.
    pub fn default_radius_m(&self) -> f64 {
        crate::core::geofence::feet_to_meters(self.default_geofence_radius_ft)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> io::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)
                .map_err(|e| io::Error::other(format!("config serialization failed: {e}")))?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("Config file: {:?}", Self::config_file());
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("Database:    {db_path:?}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let cfg = Config::default();
        assert_eq!(cfg.default_geofence_radius_ft, 250.0);
        assert_eq!(cfg.certify_tolerance_minutes, 6);
        assert_eq!(cfg.display_unit, "feet");
    }

    #[test]
    fn default_radius_converts_to_meters() {
        let cfg = Config::default();
        assert!((cfg.default_radius_m() - 76.2).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/st.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/st.sqlite");
        assert_eq!(cfg.certify_tolerance_minutes, 6);
    }
}
