use crate::app::{App, BackendEvent, LoadRequest};
use crate::domain::DirectoryStat;
use crate::infra::HistoryStore;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatsSource {
    Store,
    Derived,
}

impl StatsSource {
    fn for_store(store: &dyn HistoryStore) -> Self {
        if store.supports_directory_stats() {
            StatsSource::Store
        } else {
            StatsSource::Derived
        }
    }
}

pub(crate) fn send_task(
    app: &mut App,
    task_tx: &UnboundedSender<LoadRequest>,
    request: LoadRequest,
) -> Result<()> {
    debug!(?request, "dispatching load");
    app.busy = true;
    task_tx
        .send(request)
        .map_err(|err| anyhow::anyhow!("failed to dispatch load: {err}"))
}

pub(crate) async fn worker_loop(
    store: Arc<dyn HistoryStore>,
    mut task_rx: UnboundedReceiver<LoadRequest>,
    event_tx: UnboundedSender<BackendEvent>,
) {
    let stats_source = StatsSource::for_store(store.as_ref());

    while let Some(task) = task_rx.recv().await {
        let event = match task {
            LoadRequest::History { directory } => {
                let s = store.clone();
                let dir = directory.clone();
                let result =
                    tokio::task::spawn_blocking(move || s.commands_by_directory(&dir)).await;
                match result {
                    Ok(Ok(commands)) => BackendEvent::HistoryLoaded {
                        directory,
                        commands,
                    },
                    other => BackendEvent::Error {
                        context: "history".to_string(),
                        message: flatten_error(other),
                    },
                }
            }
            LoadRequest::Tree => {
                let s = store.clone();
                let result = tokio::task::spawn_blocking(move || match stats_source {
                    StatsSource::Store => s.directory_stats(),
                    StatsSource::Derived => derive_directory_stats(s.as_ref()),
                })
                .await;
                match result {
                    Ok(Ok(stats)) => BackendEvent::TreeLoaded { stats },
                    other => BackendEvent::Error {
                        context: "tree".to_string(),
                        message: flatten_error(other),
                    },
                }
            }
        };

        if event_tx.send(event).is_err() {
            break;
        }
    }
}

fn derive_directory_stats(store: &dyn HistoryStore) -> Result<Vec<DirectoryStat>> {
    let mut stats = Vec::new();
    for dir in store.directories_with_history()? {
        let commands = store.commands_by_directory(&dir)?;
        let Some(last_used) = commands.iter().map(|c| c.timestamp).max() else {
            continue;
        };
        stats.push(DirectoryStat {
            active: Path::new(&dir).is_dir(),
            command_count: commands.len(),
            path: dir,
            last_used,
        });
    }
    Ok(stats)
}

fn flatten_error<T>(res: std::result::Result<anyhow::Result<T>, tokio::task::JoinError>) -> String {
    match res {
        Ok(Ok(_)) => "ok".to_string(),
        Ok(Err(err)) => format!("{err:#}"),
        Err(err) => format!("join error: {err}"),
    }
}
