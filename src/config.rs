use anyhow::{Context, bail};
use mtcareers::SheetLayout;
use mtcareers::client::{Credentials, SHEETS_API, SheetsApi};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// The public MT Career workbook.
pub const DEFAULT_SPREADSHEET_ID: &str = "1DWYq3T1w8u1N0CWWJ72tqQRv67c1eY098u0wyuiMEmA";

pub const API_KEY_VAR: &str = "MTTITLECARD_API_KEY";
pub const ACCESS_TOKEN_VAR: &str = "MTTITLECARD_ACCESS_TOKEN";
pub const SPREADSHEET_ID_VAR: &str = "MTTITLECARD_SPREADSHEET_ID";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub spreadsheet_id: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub layout: SheetLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_owned(),
            api_key: None,
            access_token: None,
            base_url: SHEETS_API.to_owned(),
            timeout_secs: 10,
            layout: SheetLayout::default(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON file if one was given, then the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// `var` looks up an environment variable; blank values are ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| var(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = lookup(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(token) = lookup(ACCESS_TOKEN_VAR) {
            self.access_token = Some(token);
        }
        if let Some(id) = lookup(SPREADSHEET_ID_VAR) {
            self.spreadsheet_id = id;
        }
    }

    /// An access token wins over an API key when both are set.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        match (&self.access_token, &self.api_key) {
            (Some(token), _) => Ok(Credentials::AccessToken(token.clone())),
            (None, Some(key)) => Ok(Credentials::ApiKey(key.clone())),
            (None, None) => bail!(
                "no Google credentials configured: set {API_KEY_VAR} or {ACCESS_TOKEN_VAR}, \
                 or `api_key` / `access_token` in the config file"
            ),
        }
    }

    pub fn sheets_api(&self) -> anyhow::Result<SheetsApi> {
        if self.spreadsheet_id.trim().is_empty() {
            bail!("the spreadsheet id is empty");
        }
        Ok(SheetsApi::new(self.credentials()?)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}
