// Earth Engine access tokens: fixed, or minted by a command and cached
use crate::application::imagery_backend::RemoteQueryError;
use crate::infrastructure::config::EarthEngineSettings;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug)]
pub enum AccessToken {
    Static(String),
    Command(CommandToken),
}

/// Runs e.g. `gcloud auth print-access-token` and reuses its output for `ttl`
#[derive(Debug)]
pub struct CommandToken {
    program: String,
    args: Vec<String>,
    ttl: Duration,
    cached: Mutex<Option<(String, Instant)>>,
}

impl AccessToken {
    pub fn from_settings(settings: &EarthEngineSettings) -> Self {
        let command = settings
            .access_token_command
            .as_deref()
            .map(str::split_whitespace)
            .and_then(|mut parts| parts.next().map(|program| (program, parts)));

        match command {
            Some((program, args)) => AccessToken::Command(CommandToken {
                program: program.to_string(),
                args: args.map(str::to_string).collect(),
                ttl: Duration::from_secs(settings.token_ttl_secs),
                cached: Mutex::new(None),
            }),
            None => AccessToken::Static(settings.access_token.clone()),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self {
            AccessToken::Static(token) => !token.is_empty(),
            AccessToken::Command(_) => true,
        }
    }

    pub async fn get(&self) -> Result<String, RemoteQueryError> {
        match self {
            AccessToken::Static(token) => Ok(token.clone()),
            AccessToken::Command(command) => command.get().await,
        }
    }

    /// Drop a cached token the service rejected so the next request mints a new one
    pub async fn invalidate(&self) {
        if let AccessToken::Command(command) = self {
            *command.cached.lock().await = None;
        }
    }
}

impl CommandToken {
    async fn get(&self) -> Result<String, RemoteQueryError> {
        let mut cached = self.cached.lock().await;
        if let Some((token, minted)) = cached.as_ref() {
            if minted.elapsed() < self.ttl {
                return Ok(token.clone());
            }
        }

        let token = self.mint().await?;
        *cached = Some((token.clone(), Instant::now()));
        Ok(token)
    }

    async fn mint(&self) -> Result<String, RemoteQueryError> {
        tracing::debug!("Refreshing Earth Engine access token via {}", self.program);

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| RemoteQueryError::Service(format!("token command {} failed: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(RemoteQueryError::Service(format!(
                "token command {} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(RemoteQueryError::Service(format!(
                "token command {} printed no token",
                self.program
            )));
        }
        Ok(token)
    }
}
