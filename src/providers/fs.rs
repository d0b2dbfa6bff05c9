/*
 * Copyright 2024 Google LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use notify::Watcher;
use tracing::Instrument;

use crate::{config::SourceDocument, store::MemoryStore};

/// Applies the [`SourceDocument`] at `path` to `store`, then reapplies it
/// every time the file changes.
pub async fn watch(
    store: Arc<MemoryStore>,
    ready: Arc<AtomicBool>,
    path: impl Into<std::path::PathBuf>,
) -> crate::Result<()> {
    let path = path.into();
    let span = tracing::info_span!("provider", kind = "file", path = %path.display());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    async fn watch_inner(
        store: &MemoryStore,
        path: &std::path::Path,
        tx: tokio::sync::mpsc::UnboundedSender<Result<notify::Event, notify::Error>>,
    ) -> crate::Result<notify::RecommendedWatcher> {
        tracing::info!("discovering configuration through filesystem");
        let mut watcher = notify::RecommendedWatcher::new(
            move |res| {
                // The receiver only goes away once watching has stopped.
                let _ = tx.send(res);
            },
            Default::default(),
        )?;

        tracing::trace!("reading file");
        apply(store, path).await?;
        watcher.watch(path, notify::RecursiveMode::NonRecursive)?;
        tracing::info!("watching file");
        Ok(watcher)
    }

    let _watcher = watch_inner(&store, &path, tx)
        .instrument(span.clone())
        .await?;

    ready.store(true, Ordering::SeqCst);

    while let Some(event) = rx.recv().instrument(span.clone()).await.transpose()? {
        tracing::trace!(event = ?event.kind, "new file event");

        if !matches!(
            event.kind,
            notify::EventKind::Modify(notify::event::ModifyKind::Data(_))
        ) {
            continue;
        }

        for path in event.paths {
            // At least on macOS it's not always safe to
            // immediately read file after the change, a small
            // delay fixes that.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            tracing::info!(path = %path.display(), "file changed, updating sources");
            apply(&store, &path).instrument(span.clone()).await?;
        }
    }

    Err(eyre::eyre!("filesystem watch unexpectedly stopped"))
}

async fn apply(store: &MemoryStore, path: &std::path::Path) -> crate::Result<()> {
    let buf = tokio::fs::read(path).await?;
    let document = SourceDocument::from_slice(&buf)?;
    tracing::debug!(
        listeners = document.listeners.len(),
        endpoints = document.endpoints.len(),
        "applying source document"
    );
    store.apply_document(document);
    crate::metrics::provider_events("document", "applied").inc();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{EndpointAddress, EndpointSet, ListenerConfig},
        store::{ConfigStore, EndpointStore},
    };

    #[tokio::test]
    async fn basic() {
        let store = Arc::new(MemoryStore::new());
        let ready = Arc::new(AtomicBool::new(false));
        let mut document = SourceDocument {
            listeners: vec![ListenerConfig::new("ns", "greeter", <_>::default())],
            endpoints: vec![],
        };

        let tmp_dir = tempfile::tempdir().unwrap();
        let file_path = tmp_dir.path().join("sources.yaml");
        tokio::fs::write(&file_path, serde_yaml::to_string(&document).unwrap())
            .await
            .unwrap();
        let _handle = tokio::spawn(watch(store.clone(), ready.clone(), file_path.clone()));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(ready.load(Ordering::SeqCst));
        assert!(store.get("ns", "greeter").is_some());

        document.endpoints.push(EndpointSet {
            namespace: "ns".into(),
            name: "greeter-1".into(),
            service: "greeter".into(),
            endpoints: vec![EndpointAddress::ready("10.0.0.1")],
            ..<_>::default()
        });
        tokio::fs::write(&file_path, serde_yaml::to_string(&document).unwrap())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(1, EndpointStore::list(&*store, "ns", "greeter").len());
    }

    #[tokio::test]
    async fn missing_file() {
        let store = Arc::new(MemoryStore::new());
        let ready = Arc::new(AtomicBool::new(false));
        let tmp_dir = tempfile::tempdir().unwrap();

        let result = watch(store, ready.clone(), tmp_dir.path().join("missing.yaml")).await;
        assert!(result.is_err());
        assert!(!ready.load(Ordering::SeqCst));
    }
}
