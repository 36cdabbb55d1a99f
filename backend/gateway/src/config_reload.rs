//! Hot configuration reload.
//!
//! Watches the config document and swaps the shared [`ScanConfig`] when it
//! changes. A document that fails to load or validate is logged and the
//! previous config stays in effect. Requests already running keep the
//! snapshot they started with.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use listscan_config::{load_config, validate};
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::server::SharedConfig;

pub struct ConfigReloader {
    path: PathBuf,
    shared: SharedConfig,
}

impl ConfigReloader {
    pub fn new(path: impl Into<PathBuf>, shared: SharedConfig) -> Self {
        Self {
            path: path.into(),
            shared,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, validate and publish the document once.
    pub async fn reload(&self) -> Result<()> {
        let config = load_config(&self.path).await?;
        let report = validate(&config);
        report.log();
        if !report.is_valid() {
            bail!(
                "{} has {} validation error(s); keeping the current config",
                self.path.display(),
                report.errors.len()
            );
        }
        *self.shared.write().await = config;
        info!(path = %self.path.display(), "Config reloaded");
        Ok(())
    }

    /// Watch the config file for changes and reload on every write.
    ///
    /// The parent directory is watched so that editors which replace the
    /// file, and a file created after startup, are both picked up.
    pub fn watch(self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .context("config path has no file name")?;

        let (tx, mut rx) = mpsc::channel(100);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Err(e) = tx.blocking_send(res) {
                error!("Failed to forward config file event: {:?}", e);
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %self.path.display(), "Watching configuration file for changes");

        tokio::spawn(async move {
            // keep watcher alive
            let _watcher = watcher;
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) if touches(&event, &file_name) => {
                        if let Err(e) = self.reload().await {
                            warn!(error = %format!("{e:#}"), "Config reload failed");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Config watch error: {:?}", e),
                }
            }
        });

        Ok(())
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
