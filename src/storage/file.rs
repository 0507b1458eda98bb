// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt as _, sync::Mutex};
use uuid::Uuid;

use crate::{
    error::{self, Result},
    metadata,
};

use super::{Changes, Feed, IsPersistent, Storage};

struct Shared {
    path: PathBuf,
    write_lock: Mutex<()>,
    feed: Feed,
}

/// Storage backed by a JSON object on disk.
///
/// Only handles created through [`File::share`] are notified of each other's
/// changes; writes by other processes are picked up on the next read.
pub struct File {
    origin: Uuid,
    shared: Arc<Shared>,
}

impl File {
    /// Opens `file` inside the per-user data directory.
    pub fn new<P: AsRef<Path>>(file: P) -> Result<Self> {
        let dirs = metadata::PROJECT_DIRS
            .as_ref()
            .ok_or(error::Storage::NoProjectDirs)?;
        Ok(Self::with_path(dirs.data_dir().join(file)))
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::new(Shared {
                path: path.into(),
                write_lock: Mutex::new(()),
                feed: Feed::new(),
            }),
        }
    }

    pub fn share(&self) -> Self {
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        match fs::read(&self.shared.path).await {
            Ok(contents) if contents.is_empty() => Ok(HashMap::new()),
            Ok(contents) => serde_json::from_slice(&contents).map_err(|source| {
                error::Error::from(error::Storage::Corrupt {
                    path: self.shared.path.display().to_string(),
                    source,
                })
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, data: &HashMap<String, String>) -> Result<()> {
        let path = &self.shared.path;
        if data.is_empty() {
            return match fs::remove_file(path).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                Ok(()) | Err(_) => Ok(()),
            };
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staging = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let staged = async {
            Self::stage(&staging, &serde_json::to_vec(data)?).await?;
            fs::rename(&staging, path).await?;
            Ok::<_, error::Error>(())
        }
        .await;
        if staged.is_err() {
            _ = fs::remove_file(&staging).await;
        }
        staged
    }

    /// Writes `contents` to a file that must not exist yet, readable only by
    /// the owner.
    async fn stage(staging: &Path, contents: &[u8]) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        _ = options.write(true).create_new(true);
        #[cfg(unix)]
        {
            _ = options.mode(0o600);
        }

        let mut file = options.open(staging).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl IsPersistent for File {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl Storage for File {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.shared.write_lock.lock().await;
        let mut data = self.load().await?;
        _ = data.insert(key.to_owned(), value.to_owned());
        self.save(&data).await?;
        self.shared.feed.publish(self.origin, key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.shared.write_lock.lock().await;
        let mut data = self.load().await?;
        if data.remove(key).is_some() {
            self.save(&data).await?;
            self.shared.feed.publish(self.origin, key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> Changes {
        self.shared.feed.subscribe(self.origin)
    }
}
