//! Infrastructure implementation of the `SettingsProvider` port.
//!
//! Reads `<config_folder>/<seq>.settings` and decrypts protected settings
//! with `openssl smime`, using the certificate pair the hosting agent keeps
//! under its library directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::application::ports::{CommandRunner, SettingsProvider};
use crate::application::services::retry::run_command;
use crate::domain::{CommandInvocation, HandlerError, HandlerSettings, ProtectedSettings, PublicSettings};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    runtime_settings: Vec<RuntimeSettings>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeSettings {
    handler_settings: RawHandlerSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHandlerSettings {
    #[serde(default)]
    public_settings: Option<PublicSettings>,
    #[serde(default)]
    protected_settings: Option<String>,
    #[serde(default)]
    protected_settings_cert_thumbprint: Option<String>,
}

/// Settings loaded once per process from the hosting agent's settings file.
pub struct FileSettingsProvider<'a, R> {
    runner: &'a R,
    settings_path: PathBuf,
    waagent_lib_dir: PathBuf,
    cache: OnceCell<HandlerSettings>,
}

impl<'a, R: CommandRunner> FileSettingsProvider<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R, settings_path: PathBuf, waagent_lib_dir: PathBuf) -> Self {
        Self {
            runner,
            settings_path,
            waagent_lib_dir,
            cache: OnceCell::new(),
        }
    }

    async fn load(&self) -> HandlerSettings {
        let raw = match self.read_handler_settings() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    "Unable to load handler settings from {}: {e:#}",
                    self.settings_path.display()
                );
                return HandlerSettings::default();
            }
        };

        let protected = match (raw.protected_settings, raw.protected_settings_cert_thumbprint) {
            (Some(encrypted), Some(thumbprint)) => self
                .decrypt(&encrypted, &thumbprint)
                .await
                .map(Some)
                .map_err(|e| {
                    tracing::error!("Unable to read protected settings: {e:#}");
                    match e.downcast_ref::<HandlerError>() {
                        Some(named) => named.clone(),
                        None => HandlerError::ProtectedSettingsUnreadable(format!("{e:#}")),
                    }
                }),
            _ => Ok(None),
        };
        HandlerSettings {
            public: raw.public_settings,
            protected,
        }
    }

    fn read_handler_settings(&self) -> Result<RawHandlerSettings> {
        let path = &self.settings_path;
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let file: SettingsFile =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        file.runtime_settings
            .into_iter()
            .next()
            .map(|r| r.handler_settings)
            .ok_or_else(|| anyhow::anyhow!("{} has no runtime settings", path.display()))
    }

    async fn decrypt(&self, encrypted: &str, thumbprint: &str) -> Result<ProtectedSettings> {
        let which = CommandInvocation::new("which openssl").unchecked().redacted();
        if !run_command(self.runner, &which).await?.success() {
            return Err(HandlerError::UnsupportedOpenSsl.into());
        }

        let der = STANDARD
            .decode(encrypted.trim())
            .context("protected settings are not valid base64")?;
        let cert = self.waagent_lib_dir.join(format!("{thumbprint}.crt"));
        let key = self.waagent_lib_dir.join(format!("{thumbprint}.prv"));
        let command = format!(
            "openssl smime -inform DER -decrypt -recip {} -inkey {}",
            cert.display(),
            key.display()
        );

        let output = self
            .runner
            .run_with_stdin(&command, &der)
            .await
            .context("Failed decrypting protectedSettings")?;
        anyhow::ensure!(output.status.success(), "Failed decrypting protectedSettings");
        serde_json::from_slice(&output.stdout).context("JSON exception decoding protected settings")
    }
}

impl<R: CommandRunner> SettingsProvider for FileSettingsProvider<'_, R> {
    async fn settings(&self) -> Result<HandlerSettings> {
        Ok(self.cache.get_or_init(|| self.load()).await.clone())
    }
}
