//! Background worker thread for metadata API access.

use crate::backend::{CoreCmd, CoreEvent, RequestId, SidebarOp};
use crossbeam_channel::{unbounded, Receiver, Sender};
use metasidebar_core::{
    config::env_flag_enabled,
    models::{EditorSet, FileRecord, ListOptions},
    ApiError, MetadataApi,
};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Handle for sending commands to, and receiving events from, the backend worker.
pub struct BackendHandle {
    pub cmd_tx: Sender<CoreCmd>,
    pub evt_rx: Receiver<CoreEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListCacheKey {
    file_id: String,
    include_properties: bool,
}

#[derive(Debug, Default)]
struct ListCache {
    key: Option<ListCacheKey>,
    items: Option<EditorSet>,
    cached_at: Option<Instant>,
    hits: u64,
    misses: u64,
    invalidations: u64,
}

impl ListCache {
    fn lookup(&mut self, key: &ListCacheKey) -> Option<EditorSet> {
        if self.key.as_ref() != Some(key) {
            return None;
        }
        let fresh = self
            .cached_at
            .is_some_and(|cached_at| cached_at.elapsed() <= LIST_CACHE_MAX_AGE);
        if !fresh {
            return None;
        }
        let items = self.items.clone()?;
        self.hits = self.hits.saturating_add(1);
        Some(items)
    }

    fn store(&mut self, key: ListCacheKey, items: EditorSet) {
        self.key = Some(key);
        self.items = Some(items);
        self.cached_at = Some(Instant::now());
    }

    fn invalidate(&mut self) {
        if self.key.is_some() || self.items.is_some() || self.cached_at.is_some() {
            self.key = None;
            self.items = None;
            self.cached_at = None;
            self.invalidations = self.invalidations.saturating_add(1);
        }
    }
}

// Cached lists expire quickly so writes made through other clients become
// visible without a forced refresh.
const LIST_CACHE_MAX_AGE: Duration = Duration::from_millis(500);

fn log_list_perf(enabled: bool, cache: &ListCache, cache_hit: bool, elapsed_ms: f64, items: usize) {
    if !enabled {
        return;
    }
    info!(
        target: "metasidebar_sidebar::backend_perf",
        cache_hit = cache_hit,
        elapsed_ms = elapsed_ms,
        items = items,
        list_hits = cache.hits,
        list_misses = cache.misses,
        cache_invalidations = cache.invalidations,
        "backend list perf"
    );
}

fn failed(request: RequestId, op: SidebarOp, err: ApiError) -> CoreEvent {
    error!("backend {} {} failed: {}", op.label().to_lowercase(), request, err);
    CoreEvent::Failed {
        request,
        op,
        message: format!("{} failed: {}", op.label(), err),
    }
}

struct Worker<A> {
    api: A,
    cache: ListCache,
    perf_log_enabled: bool,
}

impl<A: MetadataApi> Worker<A> {
    fn fetch_list(
        &mut self,
        file: &FileRecord,
        options: &ListOptions,
    ) -> Result<EditorSet, ApiError> {
        let started = Instant::now();
        let key = ListCacheKey {
            file_id: file.id.clone(),
            include_properties: options.include_properties,
        };
        if !options.force_fetch {
            if let Some(items) = self.cache.lookup(&key) {
                log_list_perf(
                    self.perf_log_enabled,
                    &self.cache,
                    true,
                    started.elapsed().as_secs_f64() * 1000.0,
                    items.editors.len(),
                );
                return Ok(items);
            }
        }
        self.cache.misses = self.cache.misses.saturating_add(1);
        let items = self.api.get_editors(file, options)?;
        self.cache.store(key, items.clone());
        log_list_perf(
            self.perf_log_enabled,
            &self.cache,
            false,
            started.elapsed().as_secs_f64() * 1000.0,
            items.editors.len(),
        );
        Ok(items)
    }

    fn handle(&mut self, cmd: CoreCmd) -> CoreEvent {
        match cmd {
            CoreCmd::ListEditors {
                request,
                file,
                options,
            } => match self.fetch_list(&file, &options) {
                Ok(set) => CoreEvent::EditorsLoaded {
                    request,
                    editors: set.editors,
                    templates: set.templates,
                },
                Err(err) => failed(request, SidebarOp::List, err),
            },
            CoreCmd::CreateMetadata {
                request,
                file,
                template,
            } => match self.api.create_metadata(&file, &template) {
                Ok(editor) => {
                    self.cache.invalidate();
                    CoreEvent::EditorCreated { request, editor }
                }
                Err(err) => failed(request, SidebarOp::Add, err),
            },
            CoreCmd::UpdateMetadata {
                request,
                file,
                editor_id,
                template,
                ops,
            } => match self.api.update_metadata(&file, &template, &ops) {
                Ok(editor) => {
                    self.cache.invalidate();
                    CoreEvent::EditorSaved {
                        request,
                        editor_id,
                        editor,
                    }
                }
                Err(err) => failed(request, SidebarOp::Save, err),
            },
            CoreCmd::DeleteMetadata {
                request,
                file,
                editor_id,
                template,
            } => match self.api.delete_metadata(&file, &template) {
                Ok(()) => {
                    self.cache.invalidate();
                    CoreEvent::EditorDeleted { request, editor_id }
                }
                Err(err) => failed(request, SidebarOp::Remove, err),
            },
        }
    }
}

/// Spawn the backend worker thread that performs blocking metadata API calls.
///
/// Commands are executed one at a time in the order they were sent, so
/// completions arrive in issue order. The worker exits once every command
/// sender is dropped.
///
/// # Returns
/// A [`BackendHandle`] containing the command sender and event receiver.
///
/// # Panics
/// Panics if the worker thread cannot be spawned.
pub fn spawn_backend<A>(api: A) -> BackendHandle
where
    A: MetadataApi + 'static,
{
    let (cmd_tx, cmd_rx) = unbounded::<CoreCmd>();
    let (evt_tx, evt_rx) = unbounded();

    thread::Builder::new()
        .name("metasidebar-backend".to_string())
        .spawn(move || {
            let mut worker = Worker {
                api,
                cache: ListCache::default(),
                perf_log_enabled: env_flag_enabled("METASIDEBAR_BACKEND_PERF_LOG"),
            };
            for cmd in cmd_rx.iter() {
                let event = worker.handle(cmd);
                if evt_tx.send(event).is_err() {
                    debug!("sidebar dropped; stopping backend worker");
                    break;
                }
            }
        })
        .expect("spawn backend thread");

    BackendHandle { cmd_tx, evt_rx }
}
