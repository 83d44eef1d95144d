use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Dean,
    Teacher,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Dean => "Dean",
            Role::Teacher => "Teacher",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "dean" => Some(Role::Dean),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default)]
    pub role: Role,
    /// Command that receives the print document path as its last argument.
    /// Falls back to the platform opener when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_command: Option<String>,
}

fn default_user_name() -> String {
    "Administrator".into()
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Self::from_env()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    fn from_env() -> Result<Self> {
        let api_url = std::env::var("SCHOOL_ADMIN_URL").with_context(|| {
            "SCHOOL_ADMIN_URL not set. Create a config file or set the env var."
        })?;
        let api_token = std::env::var("SCHOOL_ADMIN_TOKEN").ok();
        let user_name = std::env::var("SCHOOL_ADMIN_USER").unwrap_or_else(|_| default_user_name());
        let role = match std::env::var("SCHOOL_ADMIN_ROLE") {
            Ok(raw) => Role::parse(&raw)
                .with_context(|| format!("SCHOOL_ADMIN_ROLE must be admin, dean or teacher (got {raw:?})"))?,
            Err(_) => Role::default(),
        };

        Ok(Self {
            api_url,
            api_token,
            user_name,
            role,
            print_command: None,
        })
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path().with_context(|| "Could not determine config directory")?;
        Self::write_default(&path)?;
        Ok(path)
    }

    fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            api_url: "http://localhost:8080/api/".into(),
            api_token: Some("your-api-token-here".into()),
            user_name: default_user_name(),
            role: Role::Admin,
            print_command: None,
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("school-admin").join("config.toml"))
    }

    pub fn session(&self) -> Session {
        Session {
            user_name: self.user_name.clone(),
            role: self.role,
        }
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Who is using the dashboard. Built once at startup and read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_name: String,
    pub role: Role,
}

impl Session {
    /// Teachers may browse everything but change nothing.
    pub fn can_edit(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Dean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url, "http://localhost:8080/api/");
        assert_eq!(loaded.role, Role::Admin);
        assert!(loaded.print_command.is_none());
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://registrar.example.edu/\"\nrole = \"teacher\"\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.user_name, "Administrator");
        assert!(config.api_token.is_none());

        let session = config.session();
        assert_eq!(session.role, Role::Teacher);
        assert!(!session.can_edit());
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("Dean"), Some(Role::Dean));
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("janitor"), None);
    }
}
