//! Sync engine: moves the context between local state and the active root.
//!
//! Conflicts are resolved by comparing whole-object `dateModified` stamps.
//! Writes to the remote are copy-on-write: the engine builds a new object
//! and hands it to [`SyncEngine::update_remote_context`] wholesale.

use crate::backend::{AccessStrategy, BackendAccess, BackendHandle, RootKind, SettingsRegistry};
use crate::config::SyncConfig;
use crate::error::{SoftFailure, SyncOutcome};
use crate::resolver::BackendResolver;
use crate::validate::Validator;
use crate::{SyncError, SyncResult};
use ctxsync_model::remote::{date_modified_of, stamp, strip_meta};
use ctxsync_model::{LocalState, PathResolver};
use ctxsync_types::{Millis, SessionId, SharedClock};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Options for [`SyncEngine::set_remote_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootOptions {
    /// Make the resolved root the engine's active root.
    pub persist: bool,
    /// Return the resolved handle to the caller.
    pub return_value: bool,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            persist: true,
            return_value: false,
        }
    }
}

/// The sync engine. One engine serves one synchronization session.
#[derive(Debug)]
pub struct SyncEngine {
    /// Tags this engine's log lines.
    session: SessionId,
    config: SyncConfig,
    resolver: BackendResolver,
    validator: Validator,
    paths: PathResolver,
    clock: SharedClock,
    /// Root every read and write goes through.
    active_root: Option<BackendHandle>,
    /// Last remote object seen or written.
    remote_context: Option<Map<String, Value>>,
}

impl SyncEngine {
    /// Creates an engine with no active root.
    pub fn new(resolver: BackendResolver, config: SyncConfig) -> Self {
        let validator = config.validator();
        Self {
            session: SessionId::new(),
            paths: config.path_resolver(),
            resolver: resolver.with_validator(validator),
            validator,
            config,
            clock: SharedClock::default(),
            active_root: None,
            remote_context: None,
        }
    }

    /// Replaces the clock used for `dateModified` stamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Into<SharedClock>) -> Self {
        self.clock = clock.into();
        self
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &BackendResolver {
        &self.resolver
    }

    #[must_use]
    pub fn remote_key(&self) -> &str {
        &self.config.remote_key
    }

    /// Points the engine at a different key. The cache belongs to the old
    /// key and is dropped.
    pub fn set_remote_key(&mut self, key: impl Into<String>) {
        self.config.remote_key = key.into();
        self.remote_context = None;
    }

    #[must_use]
    pub fn active_root(&self) -> Option<&BackendHandle> {
        self.active_root.as_ref()
    }

    /// The cached remote object, if one has been read or written.
    #[must_use]
    pub fn remote_context(&self) -> Option<&Map<String, Value>> {
        self.remote_context.as_ref()
    }

    // ── Root selection ───────────────────────────────────────────

    /// Resolves `source` and, with `persist`, makes it the active root.
    ///
    /// An empty name is `MissingArgument`. A name that does not resolve is
    /// logged and leaves the engine unchanged.
    pub fn set_remote_root(
        &mut self,
        source: &str,
        opts: RootOptions,
    ) -> SyncResult<Option<BackendHandle>> {
        if !self.validator.require_present(Some(source), "sourceName")? {
            return Ok(None);
        }
        let Some(handle) = self.resolver.resolve(source) else {
            self.skip(SoftFailure::UnresolvedRoot(source.to_string()));
            return Ok(None);
        };
        Ok(self.adopt(handle, opts))
    }

    /// Like [`SyncEngine::set_remote_root`] with `persist`, falling back to
    /// the configured default root when `source` does not resolve.
    pub fn use_root_or_default(&mut self, source: &str) -> SyncResult<Option<RootKind>> {
        if !self.validator.require_present(Some(source), "sourceName")? {
            return Ok(None);
        }
        let Some(handle) = self.resolver.resolve_or(source, &self.config.default_root) else {
            self.skip(SoftFailure::UnresolvedRoot(source.to_string()));
            return Ok(None);
        };
        let kind = handle.kind();
        self.adopt(handle, RootOptions::default());
        Ok(Some(kind))
    }

    fn adopt(&mut self, handle: BackendHandle, opts: RootOptions) -> Option<BackendHandle> {
        if opts.persist {
            info!(session = %self.session, root = %handle.kind(), strategy = %handle.strategy(), "active root set");
            self.active_root = Some(handle.clone());
            self.remote_context = None;
        }
        opts.return_value.then_some(handle)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Reads the remote object (or one field of it) from the active root and
    /// refreshes the cache. Without an active root the cache is served.
    ///
    /// A registry root is read only while nothing is cached: its writes are
    /// detached, so after one the cache is newer than the registry.
    ///
    /// `Ok(None)` means nothing is stored under the remote key (or the
    /// requested field is absent).
    pub fn get_remote(&mut self, item: Option<&str>) -> SyncResult<Option<Value>> {
        let registry_root = matches!(
            self.active_root.as_ref().map(BackendHandle::strategy),
            Some(AccessStrategy::Registry)
        );
        let remote = match &self.active_root {
            Some(_) if registry_root && self.remote_context.is_some() => {
                self.remote_context.clone().map(Value::Object)
            }
            Some(root) => {
                let fetched = self.paths.resolve(root.access(), &self.config.remote_key);
                if let Some(Value::Object(object)) = &fetched {
                    self.remote_context = Some(object.clone());
                }
                fetched
            }
            None => match &self.remote_context {
                Some(cached) => Some(Value::Object(cached.clone())),
                None => return Err(SyncError::Uninitialized),
            },
        };

        let Some(item) = item else {
            return Ok(remote);
        };
        match remote {
            None => Ok(None),
            Some(Value::Object(object)) => Ok(object.get(item).cloned()),
            Some(_) => Err(SyncError::TypeMismatch(format!(
                "cannot read `{item}`: remote context is not an object"
            ))),
        }
    }

    /// The remote object, or why there is none.
    pub(crate) fn fetch_object(&mut self) -> SyncResult<Result<Map<String, Value>, SoftFailure>> {
        match self.get_remote(None) {
            Ok(Some(Value::Object(object))) => Ok(Ok(object)),
            Ok(Some(_)) => Ok(Err(SoftFailure::RemoteNotObject)),
            Ok(None) => Ok(Err(SoftFailure::NoRemoteContext)),
            Err(SyncError::Uninitialized) => Ok(Err(SoftFailure::NoActiveRoot)),
            Err(err) => Err(err),
        }
    }

    // ── Push ─────────────────────────────────────────────────────

    /// Shallow-merges `local.data` over the remote object (local wins) and
    /// writes the result stamped with now.
    pub fn push_state(&mut self, local: &LocalState) -> SyncResult<SyncOutcome> {
        let ts = self.clock.now_millis();
        self.push_data(local.data(), ts)
    }

    /// Pushes a bare JSON object. A non-object is `InvalidArgument`.
    pub fn push_state_value(&mut self, local: &Value) -> SyncResult<SyncOutcome> {
        if !self.validator.require_object(local, "localState")? {
            return Ok(self.skip(SoftFailure::RejectedInput("localState")));
        }
        let data = match local {
            Value::Object(object) => strip_meta(object.clone()),
            _ => Map::new(),
        };
        let ts = self.clock.now_millis();
        self.push_data(&data, ts)
    }

    pub(crate) fn push_data(
        &mut self,
        data: &Map<String, Value>,
        ts: Millis,
    ) -> SyncResult<SyncOutcome> {
        if self.active_root.is_none() {
            return Ok(self.skip(SoftFailure::NoActiveRoot));
        }
        let mut remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => {
                warn!(session = %self.session, "{reason}; pushing into an empty object");
                Map::new()
            }
        };
        remote.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        stamp(&mut remote, ts);
        self.update_remote_context(remote)?;
        debug!(session = %self.session, keys = data.len(), date_modified = ts, "pushed");
        Ok(SyncOutcome::Pushed { date_modified: ts })
    }

    // ── Pull ─────────────────────────────────────────────────────

    /// Copies the remote object into `local.data`: replaced with
    /// `overwrite`, else shallow-merged (remote wins). Stamps local with now.
    pub fn pull_state(&mut self, local: &mut LocalState, overwrite: bool) -> SyncResult<SyncOutcome> {
        let remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => return Ok(self.skip(reason)),
        };
        let ts = self.clock.now_millis();
        apply_pull(local, remote, overwrite, ts);
        debug!(session = %self.session, overwrite, date_modified = ts, "pulled");
        Ok(SyncOutcome::Pulled { date_modified: ts })
    }

    /// Pulls into a bare JSON object, which also receives `dateModified`.
    /// A non-object target is `InvalidArgument`.
    pub fn pull_state_value(&mut self, local: &mut Value, overwrite: bool) -> SyncResult<SyncOutcome> {
        if !self.validator.require_object(local, "localState")? {
            return Ok(self.skip(SoftFailure::RejectedInput("localState")));
        }
        let Value::Object(target) = local else {
            return Err(SyncError::invalid("localState", "expected an object"));
        };
        let remote = match self.fetch_object()? {
            Ok(object) => strip_meta(object),
            Err(reason) => return Ok(self.skip(reason)),
        };
        if overwrite {
            *target = remote;
        } else {
            target.extend(remote);
        }
        let ts = self.clock.now_millis();
        stamp(target, ts);
        Ok(SyncOutcome::Pulled { date_modified: ts })
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Pushes if local is strictly newer, pulls with overwrite if the remote
    /// is strictly newer, and does nothing on a tie.
    ///
    /// After a transfer both sides carry the same stamp, so an immediate
    /// second call is `Unchanged`.
    pub fn sync_state(&mut self, local: &mut LocalState) -> SyncResult<SyncOutcome> {
        if self.active_root.is_none() {
            return Ok(self.skip(SoftFailure::NoActiveRoot));
        }
        let remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => return Ok(self.skip(reason)),
        };
        let local_ts = local.date_modified();
        let remote_ts = date_modified_of(&remote);
        debug!(session = %self.session, local_ts, remote_ts, "comparing timestamps");

        match local_ts.cmp(&remote_ts) {
            Ordering::Greater => {
                let ts = self.clock.now_millis();
                let outcome = self.push_data(local.data(), ts)?;
                if let SyncOutcome::Pushed { date_modified } = outcome {
                    local.set_date_modified(date_modified);
                }
                Ok(outcome)
            }
            Ordering::Less => {
                apply_pull(local, remote, true, remote_ts);
                debug!(session = %self.session, date_modified = remote_ts, "pulled");
                Ok(SyncOutcome::Pulled {
                    date_modified: remote_ts,
                })
            }
            Ordering::Equal => Ok(SyncOutcome::Unchanged),
        }
    }

    /// [`SyncEngine::sync_state`] for a bare JSON object carrying its own
    /// `dateModified`. A non-object is `InvalidArgument`.
    pub fn sync_state_value(&mut self, local: &mut Value) -> SyncResult<SyncOutcome> {
        if !self.validator.require_object(local, "localState")? {
            return Ok(self.skip(SoftFailure::RejectedInput("localState")));
        }
        let Value::Object(target) = local else {
            return Err(SyncError::invalid("localState", "expected an object"));
        };
        if self.active_root.is_none() {
            return Ok(self.skip(SoftFailure::NoActiveRoot));
        }
        let remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => return Ok(self.skip(reason)),
        };
        let local_ts = date_modified_of(target);
        let remote_ts = date_modified_of(&remote);

        match local_ts.cmp(&remote_ts) {
            Ordering::Greater => {
                let ts = self.clock.now_millis();
                let outcome = self.push_data(&strip_meta(target.clone()), ts)?;
                if let SyncOutcome::Pushed { date_modified } = outcome {
                    stamp(target, date_modified);
                }
                Ok(outcome)
            }
            Ordering::Less => {
                *target = remote;
                Ok(SyncOutcome::Pulled {
                    date_modified: remote_ts,
                })
            }
            Ordering::Equal => Ok(SyncOutcome::Unchanged),
        }
    }

    // ── Remote writes ────────────────────────────────────────────

    /// Sets `value` at the dot-path `path` inside a copy of the remote
    /// object, creating intermediate objects, then writes the copy.
    pub fn update_remote_property(&mut self, path: &str, value: Value) -> SyncResult<SyncOutcome> {
        if !self.validator.require_non_empty(path, "path")? {
            return Ok(self.skip(SoftFailure::RejectedInput("path")));
        }
        if self.active_root.is_none() {
            return Ok(self.skip(SoftFailure::NoActiveRoot));
        }
        let mut remote = match self.get_remote(None)? {
            None => Map::new(),
            Some(Value::Object(object)) => object,
            Some(_) => {
                return Err(SyncError::TypeMismatch(format!(
                    "cannot set `{path}`: remote context is not an object"
                )));
            }
        };
        self.paths.set(&mut remote, path, value)?;
        let ts = self.clock.now_millis();
        stamp(&mut remote, ts);
        self.update_remote_context(remote)?;
        info!(session = %self.session, path, date_modified = ts, "remote property updated");
        Ok(SyncOutcome::Written { date_modified: ts })
    }

    /// Writes `context` wholesale under the remote key of the active root
    /// and caches it.
    ///
    /// Keyed-store failures are returned. Registry writes are detached: they
    /// are dispatched and logged but never awaited, so their failures never
    /// reach the caller.
    pub fn update_remote_context(&mut self, context: Map<String, Value>) -> SyncResult<()> {
        if let Some(root) = &self.active_root {
            let key = self.config.remote_key.as_str();
            let value = Value::Object(context.clone());
            let (head, tail) = match key.split_once('.') {
                Some((head, tail)) => (head, Some(tail)),
                None => (key, None),
            };
            match root.access() {
                BackendAccess::DirectFields(object) => {
                    object.with_fields(|fields| self.paths.set(fields, key, value))?;
                }
                BackendAccess::KeyedAccessor(store) => {
                    let top = self.nest(store.get(head), tail, value)?;
                    store.set(head, top)?;
                }
                BackendAccess::Registry {
                    registry,
                    namespace,
                } => {
                    warn!(
                        session = %self.session,
                        namespace = %namespace,
                        key = head,
                        "writing through a settings registry; caller must confirm the key is registered"
                    );
                    let top = self.nest(registry.get(namespace, head), tail, value)?;
                    dispatch_registry_write(
                        Arc::clone(registry),
                        namespace.clone(),
                        head.to_string(),
                        top,
                        self.session,
                    );
                }
            }
            debug!(session = %self.session, root = %root.kind(), "remote context written");
        }
        self.remote_context = Some(context);
        Ok(())
    }

    /// Replaces the remote object with an empty one stamped with now.
    ///
    /// With nothing cached the active root is read first; a root with no
    /// stored context is skipped.
    pub fn clear_remote_context(&mut self) -> SyncResult<SyncOutcome> {
        if self.remote_context.is_none() {
            match self.fetch_object()? {
                Ok(_) => {}
                Err(SoftFailure::NoActiveRoot) => {
                    return Ok(self.skip(SoftFailure::NoRemoteContext));
                }
                Err(reason) => return Ok(self.skip(reason)),
            }
        }
        let mut fresh = Map::new();
        let ts = self.clock.now_millis();
        stamp(&mut fresh, ts);
        self.update_remote_context(fresh)?;
        info!(session = %self.session, date_modified = ts, "remote context cleared");
        Ok(SyncOutcome::Written { date_modified: ts })
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Embeds `value` at `tail` inside the current top-level value, for
    /// remote keys that are dot-paths.
    fn nest(&self, current: Option<Value>, tail: Option<&str>, value: Value) -> SyncResult<Value> {
        let Some(tail) = tail else {
            return Ok(value);
        };
        let mut top = match current {
            Some(Value::Object(object)) => object,
            _ => Map::new(),
        };
        self.paths.set(&mut top, tail, value)?;
        Ok(Value::Object(top))
    }

    pub(crate) fn skip(&self, reason: SoftFailure) -> SyncOutcome {
        warn!(session = %self.session, "skipped: {reason}");
        SyncOutcome::Skipped(reason)
    }

    pub(crate) fn validator(&self) -> Validator {
        self.validator
    }
}

fn apply_pull(local: &mut LocalState, remote: Map<String, Value>, overwrite: bool, ts: Millis) {
    let incoming = strip_meta(remote);
    if overwrite {
        local.replace_data(incoming);
    } else {
        local.merge_data(incoming);
    }
    local.set_date_modified(ts);
}

/// Runs a registry write without waiting for it: spawned on the current
/// tokio runtime, or driven to completion on a throwaway one when called
/// outside any runtime.
fn dispatch_registry_write(
    registry: Arc<dyn SettingsRegistry>,
    namespace: String,
    key: String,
    value: Value,
    session: SessionId,
) {
    let write = async move {
        match registry.set(&namespace, &key, value).await {
            Ok(()) => debug!(%session, namespace = %namespace, key = %key, "registry write completed"),
            Err(err) => error!(%session, namespace = %namespace, key = %key, "registry write failed: {err}"),
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(write);
        }
        Err(_) => match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(write),
            Err(err) => error!(%session, "registry write dropped, no runtime: {err}"),
        },
    }
}
