use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::dates::DateRange;

pub const DEFAULT_CONFIG_PATH: &str = "~/.clockify-to-jira/config.yaml";
pub const DEFAULT_PERIOD: u32 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot load configuration from file {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Invalid config data: {0}")]
    Invalid(String),
    #[error("Cannot find workspace {0} in configuration")]
    WorkspaceNotFound(String),
    #[error("Cannot find client {0} in given workspace")]
    ClientNotFound(String),
    #[error("No workspaces configured")]
    WorkspacesNotConfigured,
    #[error("No configured workspace matches the selector")]
    WorkspacesNotMatchingSelector,
    #[error("Configuration file {} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("Error during creating configuration file: {0}")]
    Generate(String),
}

pub type Workspaces = BTreeMap<String, Workspace>;
pub type Clients = BTreeMap<String, Client>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global: Global,
    pub default_client: Client,
    pub default_workspace: Workspace,
    pub workspaces: Workspaces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub clockify_token: String,
    /// Lookback window in days.
    pub period: u32,
}

impl Default for Global {
    fn default() -> Self {
        Self {
            clockify_token: String::new(),
            period: DEFAULT_PERIOD,
        }
    }
}

/// Jira credentials and rounding rules for one billable client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    pub jira_client_user: String,
    pub jira_host: String,
    pub jira_username: String,
    pub jira_password: String,
    #[serde(alias = "stachursky_mode")]
    pub precision: u32,
    pub enabled: bool,
}

impl Client {
    /// Empty strings and a zero precision inherit from `default`.
    /// `enabled` never inherits: only this client's own flag counts.
    pub fn resolve(&self, default: &Client) -> Client {
        Client {
            jira_client_user: inherit(&self.jira_client_user, &default.jira_client_user),
            jira_host: inherit(&self.jira_host, &default.jira_host),
            jira_username: inherit(&self.jira_username, &default.jira_username),
            jira_password: inherit(&self.jira_password, &default.jira_password),
            precision: if self.precision != 0 {
                self.precision
            } else {
                default.precision
            },
            enabled: self.enabled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub workspace_id: String,
    pub jira_migration_failed_tag: String,
    pub jira_migration_skip_tag: String,
    pub jira_migration_success_tag: String,
    pub clients: Clients,
}

impl Workspace {
    /// Fills unset fields from the default workspace and merges every client
    /// with the default client. Client keys are lower-cased; two keys of one
    /// workspace differing only by case are rejected.
    pub fn resolve(
        &self,
        default_workspace: &Workspace,
        default_client: &Client,
    ) -> Result<Workspace, ConfigError> {
        let mut clients = Clients::new();
        for source in [&default_workspace.clients, &self.clients] {
            for (id, client) in lowercase_keys(source)? {
                clients.insert(id, client.resolve(default_client));
            }
        }

        Ok(Workspace {
            workspace_id: inherit(&self.workspace_id, &default_workspace.workspace_id),
            jira_migration_failed_tag: inherit(
                &self.jira_migration_failed_tag,
                &default_workspace.jira_migration_failed_tag,
            ),
            jira_migration_skip_tag: inherit(
                &self.jira_migration_skip_tag,
                &default_workspace.jira_migration_skip_tag,
            ),
            jira_migration_success_tag: inherit(
                &self.jira_migration_success_tag,
                &default_workspace.jira_migration_success_tag,
            ),
            clients,
        })
    }

    pub fn get_client(&self, client_id: &str) -> Result<&Client, ConfigError> {
        let key = client_id.to_lowercase();
        self.clients
            .get(&key)
            .ok_or(ConfigError::ClientNotFound(key))
    }

    fn overwrite_precision(&mut self, precision: u32) {
        for client in self.clients.values_mut() {
            client.precision = precision;
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_yaml(&contents)
    }

    /// Parses a YAML document and resolves every workspace against the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            serde_yaml::from_str(contents).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if config.global.period == 0 {
            return Err(ConfigError::Invalid(
                "global.period must be at least 1 day".to_string(),
            ));
        }
        config.workspaces = config.resolved_workspaces()?;
        Ok(config)
    }

    fn resolved_workspaces(&self) -> Result<Workspaces, ConfigError> {
        let mut resolved = Workspaces::new();
        for (key, workspace) in &self.workspaces {
            let workspace = workspace
                .resolve(&self.default_workspace, &self.default_client)
                .map_err(|err| match err {
                    ConfigError::Invalid(reason) => {
                        ConfigError::Invalid(format!("workspaces.{key}.clients: {reason}"))
                    }
                    other => other,
                })?;
            for (id, client) in &workspace.clients {
                if client.precision == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "workspaces.{key}.clients.{id}.precision must be at least 1 minute"
                    )));
                }
            }
            resolved.insert(key.clone(), workspace);
        }
        Ok(resolved)
    }

    pub fn get_workspace(&self, key: &str) -> Result<&Workspace, ConfigError> {
        self.workspaces
            .get(key)
            .ok_or_else(|| ConfigError::WorkspaceNotFound(key.to_string()))
    }

    /// All workspaces, or only those whose key is in a non-empty selector.
    pub fn find_workspaces(&self, selector: &[String]) -> Result<Workspaces, ConfigError> {
        if self.workspaces.is_empty() {
            return Err(ConfigError::WorkspacesNotConfigured);
        }

        if selector.is_empty() {
            return Ok(self.workspaces.clone());
        }

        let mut matching = Workspaces::new();
        for id in selector {
            match self.get_workspace(id) {
                Ok(workspace) => {
                    matching.insert(id.clone(), workspace.clone());
                }
                Err(err) => warn!(error = %err, "Ignoring workspace selector"),
            }
        }

        if matching.is_empty() {
            return Err(ConfigError::WorkspacesNotMatchingSelector);
        }

        Ok(matching)
    }

    pub fn overwrite_period(&mut self, period: u32) {
        self.global.period = period;
    }

    /// Forces one precision onto the default client and every resolved client.
    pub fn overwrite_precision(&mut self, precision: u32) {
        self.default_client.precision = precision;
        for workspace in self.workspaces.values_mut() {
            workspace.overwrite_precision(precision);
        }
    }

    pub fn time_interval(&self, now: DateTime<Local>) -> DateRange {
        DateRange::lookback(now, self.global.period)
    }
}

pub fn template() -> Config {
    Config {
        global: Global {
            clockify_token: "(visit https://app.clockify.me/user/preferences#advanced)".to_string(),
            period: DEFAULT_PERIOD,
        },
        default_client: Client {
            jira_client_user: "firstname.lastname".to_string(),
            jira_host: "https://your-domain.atlassian.net".to_string(),
            jira_username: "firstname.lastname@domain.com".to_string(),
            jira_password: "(visit https://id.atlassian.com/manage/api-tokens)".to_string(),
            precision: 15,
            enabled: false,
        },
        default_workspace: Workspace {
            workspace_id: "(visit https://app.clockify.me/workspaces -> settings -> id from url)"
                .to_string(),
            jira_migration_failed_tag: "jira-migration-failed".to_string(),
            jira_migration_skip_tag: "jira-migration-skip".to_string(),
            jira_migration_success_tag: "logged".to_string(),
            clients: Clients::new(),
        },
        workspaces: Workspaces::new(),
    }
}

pub fn template_yaml() -> Result<String, ConfigError> {
    serde_yaml::to_string(&template()).map_err(|err| ConfigError::Generate(err.to_string()))
}

/// Writes the template to `path`, creating parent directories. Never overwrites.
pub fn generate_template(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ConfigError::Generate(err.to_string()))?;
    }

    let yaml = template_yaml()?;
    fs::write(path, yaml).map_err(|err| ConfigError::Generate(err.to_string()))
}

fn lowercase_keys(clients: &Clients) -> Result<Vec<(String, &Client)>, ConfigError> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    let mut lowered = Vec::with_capacity(clients.len());
    for (id, client) in clients {
        let key = id.to_lowercase();
        if let Some(other) = seen.insert(key.clone(), id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "clients {other} and {id} differ only by case"
            )));
        }
        lowered.push((key, client));
    }
    Ok(lowered)
}

fn inherit(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
