//! Sidebar controller: turns user intents into backend commands and applies
//! backend events to the editor list state.

use crate::backend::{spawn_backend, BackendHandle, CoreCmd, CoreEvent, RequestId, SidebarOp};
use crossbeam_channel::{RecvTimeoutError, TryRecvError};
use metasidebar_core::models::{FileRecord, ListOptions};
use metasidebar_core::patch::PatchOp;
use metasidebar_core::{project, Config, EditorListState, MetadataApi, SidebarView};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-sidebar settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarOptions {
    /// Request the free-form properties template path when listing.
    pub include_properties: bool,
}

impl Default for SidebarOptions {
    fn default() -> Self {
        Self {
            include_properties: true,
        }
    }
}

impl SidebarOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_properties: config.include_properties,
        }
    }
}

/// Metadata sidebar for one file.
///
/// Owns the editor list state exclusively. Mutating intents are executed by
/// the backend worker strictly in issue order; each completion is applied as
/// a delta to whatever the current snapshot is, so a completion for an
/// editor that has since disappeared is a no-op.
pub struct MetadataSidebar {
    file: FileRecord,
    options: SidebarOptions,
    backend: BackendHandle,
    state: Arc<EditorListState>,
    revision: u64,
    next_request: u64,
    pending: HashMap<RequestId, SidebarOp>,
    closed: bool,
}

impl MetadataSidebar {
    /// Create a sidebar without issuing any request.
    pub fn new(file: FileRecord, backend: BackendHandle, options: SidebarOptions) -> Self {
        Self {
            file,
            options,
            backend,
            state: Arc::new(EditorListState::default()),
            revision: 0,
            next_request: 0,
            pending: HashMap::new(),
            closed: false,
        }
    }

    /// Create a sidebar and issue the initial list request.
    pub fn mount(file: FileRecord, backend: BackendHandle, options: SidebarOptions) -> Self {
        let mut sidebar = Self::new(file, backend, options);
        sidebar.load(false);
        sidebar
    }

    /// Spawn a dedicated backend worker for `api` and mount a sidebar on it.
    pub fn spawn<A>(file: FileRecord, api: A, options: SidebarOptions) -> Self
    where
        A: MetadataApi + 'static,
    {
        Self::mount(file, spawn_backend(api), options)
    }

    pub fn file(&self) -> &FileRecord {
        &self.file
    }

    pub fn can_edit(&self) -> bool {
        self.file.can_edit()
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<EditorListState> {
        Arc::clone(&self.state)
    }

    /// Incremented on every state change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether any request is awaiting its completion.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Project the current state for display.
    pub fn view(&self) -> SidebarView<'_> {
        project(&self.state, self.can_edit())
    }

    fn commit(&mut self, next: EditorListState) {
        if next != *self.state {
            self.state = Arc::new(next);
            self.revision = self.revision.saturating_add(1);
        }
    }

    /// Keep the busy flag in step with outstanding requests.
    fn settle_loading(&mut self) {
        let busy = !self.pending.is_empty();
        if self.state.is_loading != busy {
            let next = self.state.set_loading(busy);
            self.commit(next);
        }
    }

    fn dispatch(&mut self, op: SidebarOp, build: impl FnOnce(RequestId) -> CoreCmd) -> bool {
        self.next_request = self.next_request.saturating_add(1);
        let request = RequestId(self.next_request);
        self.pending.insert(request, op);
        self.settle_loading();

        if self.backend.cmd_tx.send(build(request)).is_ok() {
            return true;
        }
        warn!("{} failed: backend unavailable", op.label());
        self.pending.remove(&request);
        let next = self.state.set_error(true);
        self.commit(next);
        self.settle_loading();
        false
    }

    /// Fetch editors and templates.
    ///
    /// Repeatable: each call supersedes every outstanding request, whose
    /// completions are then ignored, and clears the error flag.
    ///
    /// # Arguments
    /// - `force`: Bypass cached list responses.
    ///
    /// # Returns
    /// `true` when the request was handed to the backend.
    pub fn load(&mut self, force: bool) -> bool {
        if self.closed {
            return false;
        }
        if !self.pending.is_empty() {
            debug!(
                "superseding {} outstanding requests for file {}",
                self.pending.len(),
                self.file.id
            );
            self.pending.clear();
        }
        let next = self.state.set_error(false);
        self.commit(next);

        let file = self.file.clone();
        let options = ListOptions {
            force_fetch: force,
            include_properties: self.options.include_properties,
        };
        self.dispatch(SidebarOp::List, |request| CoreCmd::ListEditors {
            request,
            file,
            options,
        })
    }

    /// Attach a new instance of the template identified by `scope` and
    /// `template_key`.
    ///
    /// # Returns
    /// `false` without side effects when editors are not loaded yet or the
    /// template is unknown.
    pub fn add_template(&mut self, scope: &str, template_key: &str) -> bool {
        if self.closed || !self.state.is_initialized() {
            return false;
        }
        let Some(template) = self.state.template(scope, template_key).cloned() else {
            debug!("add ignored: unknown template {}/{}", scope, template_key);
            return false;
        };
        let file = self.file.clone();
        self.dispatch(SidebarOp::Add, |request| CoreCmd::CreateMetadata {
            request,
            file,
            template,
        })
    }

    /// Persist `ops` against the editor with `editor_id`.
    ///
    /// # Returns
    /// `false` without side effects when the editor is not present.
    pub fn save(&mut self, editor_id: &str, ops: Vec<PatchOp>) -> bool {
        if self.closed {
            return false;
        }
        let Some(template) = self
            .state
            .editor(editor_id)
            .map(|editor| editor.template.clone())
        else {
            debug!("save ignored: editor {} not present", editor_id);
            return false;
        };
        let file = self.file.clone();
        let editor_id = editor_id.to_string();
        self.dispatch(SidebarOp::Save, |request| CoreCmd::UpdateMetadata {
            request,
            file,
            editor_id,
            template,
            ops,
        })
    }

    /// Detach the editor with `editor_id`.
    ///
    /// # Returns
    /// `false` without side effects when the editor is not present.
    pub fn remove(&mut self, editor_id: &str) -> bool {
        if self.closed {
            return false;
        }
        let Some(template) = self
            .state
            .editor(editor_id)
            .map(|editor| editor.template.clone())
        else {
            debug!("remove ignored: editor {} not present", editor_id);
            return false;
        };
        let file = self.file.clone();
        let editor_id = editor_id.to_string();
        self.dispatch(SidebarOp::Remove, |request| CoreCmd::DeleteMetadata {
            request,
            file,
            editor_id,
            template,
        })
    }

    /// Record local unsaved edits on an editor. Never touches the backend.
    ///
    /// # Returns
    /// `false` when the editor is not present.
    pub fn modify(&mut self, editor_id: &str, is_dirty: bool) -> bool {
        if self.closed || self.state.editor(editor_id).is_none() {
            return false;
        }
        let next = self.state.set_dirty(editor_id, is_dirty);
        self.commit(next);
        true
    }

    /// Apply one backend event.
    ///
    /// Events for unknown or superseded requests, and any event after
    /// [`Self::close`], are dropped.
    pub fn apply_event(&mut self, event: CoreEvent) {
        let request = event.request();
        if self.closed {
            debug!("sidebar closed; dropping completion {}", request);
            return;
        }
        let Some(op) = self.pending.remove(&request) else {
            debug!("dropping completion {} for superseded request", request);
            return;
        };

        let next = match event {
            CoreEvent::EditorsLoaded {
                editors, templates, ..
            } => self.state.initialize(editors, templates),
            CoreEvent::EditorCreated { editor, .. } => self.state.insert(editor),
            CoreEvent::EditorSaved {
                editor_id, editor, ..
            } => self.state.replace_one(&editor_id, editor),
            CoreEvent::EditorDeleted { editor_id, .. } => self.state.remove_by_id(&editor_id),
            CoreEvent::Failed {
                op: failed_op,
                message,
                ..
            } => {
                if failed_op != op {
                    debug!(
                        "completion {} reported {} for a {} request",
                        request,
                        failed_op.label(),
                        op.label()
                    );
                }
                warn!("{} (file {})", message, self.file.id);
                self.state.set_error(true)
            }
        };
        self.commit(next);
        self.settle_loading();
    }

    fn backend_lost(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        warn!(
            "backend stopped with {} requests outstanding",
            self.pending.len()
        );
        self.pending.clear();
        let next = self.state.set_error(true);
        self.commit(next);
        self.settle_loading();
    }

    /// Apply every event that is already available without blocking.
    ///
    /// # Returns
    /// The number of events received.
    pub fn poll(&mut self) -> usize {
        let mut received = 0;
        while !self.closed {
            match self.backend.evt_rx.try_recv() {
                Ok(event) => {
                    received += 1;
                    self.apply_event(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.backend_lost();
                    break;
                }
            }
        }
        received
    }

    /// Block until no request is outstanding or `timeout` elapses.
    ///
    /// A timeout too large to represent as a deadline waits without one.
    ///
    /// # Returns
    /// `true` when the sidebar became idle with the backend still running.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        while !self.closed && self.has_pending() {
            let received = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.backend.evt_rx.recv_timeout(remaining) {
                        Ok(event) => Some(event),
                        Err(RecvTimeoutError::Timeout) => return false,
                        Err(RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => self.backend.evt_rx.recv().ok(),
            };
            match received {
                Some(event) => self.apply_event(event),
                None => {
                    self.backend_lost();
                    return false;
                }
            }
        }
        !self.closed
    }

    /// Tear the sidebar down. Outstanding completions will be ignored.
    pub fn close(&mut self) {
        self.pending.clear();
        self.settle_loading();
        self.closed = true;
    }
}
