//! Picker session state machine.
//!
//! ```text
//! Closed ──open──> Open ──begin_commit──> Committing ──success──> Closed
//!                   ^                          │
//!                   └──────── failure ─────────┘
//! ```
//!
//! The controller never performs I/O. The two asynchronous steps, decoding
//! the pick image and submitting the exclusion list, are carried out by the
//! host, which reports back with the ticket it was handed. Tickets carry the
//! generation of the session that issued them; results for a closed or
//! reopened session are dropped without touching the current one.
//!
//! Events only mark the frame dirty. The overlay is rendered once when the
//! host asks for it, so a burst of hover events costs one repaint.

use std::collections::BTreeSet;

use crate::config::PickerConfig;
use crate::error::{PickerError, Result};
use crate::raster::codec::PackedColorId;
use crate::raster::source::SourceBuffer;
use crate::render::overlay::{render_into, DisplayBuffer, OverlayStyle};
use crate::selection::hit_test::{self, ViewTransform};
use crate::selection::registry::{Manifest, ObjectRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Open,
    Committing,
}

/// Handed out by [`SelectionController::open`]; return it with the decoded
/// pick image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild a ticket that crossed a language boundary as a bare number.
    #[allow(dead_code)]
    pub(crate) fn from_raw(generation: u64) -> Self {
        Self { generation }
    }
}

/// Identifies one outstanding submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket {
    generation: u64,
    attempt: u32,
}

impl SubmitTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[allow(dead_code)]
    pub(crate) fn from_raw(generation: u64, attempt: u32) -> Self {
        Self { generation, attempt }
    }
}

/// Everything the host needs to call the submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub ticket: SubmitTicket,
    pub device_id: String,
    /// Ascending, comma-separated ids; empty when nothing is excluded.
    pub ids: String,
}

/// Input events, dispatched through [`SelectionController::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickerAction {
    Click { x: f64, y: f64, view: ViewTransform },
    Hover { x: f64, y: f64, view: ViewTransform },
    HoverLeave,
    ListToggle(PackedColorId),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

/// Result of one toggle: the record's pending flag and whether it flipped.
#[derive(Debug, Clone, Copy)]
struct ToggleOutcome {
    pending: bool,
    changed: bool,
}

#[derive(Debug)]
struct Session {
    generation: u64,
    /// Manifest and exclusions captured at open, consumed once the image loads.
    inputs: Option<(Manifest, BTreeSet<PackedColorId>)>,
    registry: Option<ObjectRegistry>,
    source: Option<SourceBuffer>,
    load: LoadStatus,
    hover: Option<PackedColorId>,
    frame: Option<DisplayBuffer>,
    dirty: bool,
    submit: Option<SubmitTicket>,
    attempts: u32,
}

impl Session {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            inputs: None,
            registry: None,
            source: None,
            load: LoadStatus::Pending,
            hover: None,
            frame: None,
            dirty: true,
            submit: None,
            attempts: 0,
        }
    }

    fn interactive(&self) -> bool {
        self.load == LoadStatus::Loaded && self.registry.is_some()
    }
}

#[derive(Debug)]
pub struct SelectionController {
    config: PickerConfig,
    style: OverlayStyle,
    generation: u64,
    session: Option<Session>,
    last_error: Option<PickerError>,
}

impl SelectionController {
    pub fn new(config: PickerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            style: OverlayStyle::from(&config),
            config,
            generation: 0,
            session: None,
            last_error: None,
        })
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn state(&self) -> PickerState {
        match &self.session {
            None => PickerState::Closed,
            Some(s) if s.submit.is_some() => PickerState::Committing,
            Some(_) => PickerState::Open,
        }
    }

    /// Open generation; bumps on every `open`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the image is loaded and the registry built.
    pub fn is_interactive(&self) -> bool {
        self.session.as_ref().is_some_and(Session::interactive)
    }

    /// Most recent recoverable error, for the host to surface.
    pub fn last_error(&self) -> Option<&PickerError> {
        self.last_error.as_ref()
    }

    pub fn registry(&self) -> Option<&ObjectRegistry> {
        self.session.as_ref().and_then(|s| s.registry.as_ref())
    }

    pub fn source(&self) -> Option<&SourceBuffer> {
        self.session.as_ref().and_then(|s| s.source.as_ref())
    }

    pub fn hovered(&self) -> Option<PackedColorId> {
        self.session.as_ref().and_then(|s| s.hover)
    }

    /// Start a new session and request the pick image.
    ///
    /// Any previous session is discarded. Without a manifest or exclusion
    /// list the picker opens disabled and `ManifestMissing` is returned.
    pub fn open(
        &mut self,
        manifest: Option<Manifest>,
        already_excluded: Option<BTreeSet<PackedColorId>>,
    ) -> Result<LoadTicket> {
        self.start_session();
        let generation = self.generation;

        let (Some(manifest), Some(excluded)) = (manifest, already_excluded) else {
            log::warn!("picker {} opened without manifest; staying disabled", generation);
            if let Some(session) = self.session.as_mut() {
                session.load = LoadStatus::Failed;
            }
            return Err(self.record(PickerError::ManifestMissing));
        };

        if let Some(session) = self.session.as_mut() {
            session.inputs = Some((manifest, excluded));
        }
        log::debug!("picker {} opened, awaiting pick image", generation);
        Ok(LoadTicket { generation })
    }

    /// Start a new session with an already decoded pick image.
    pub fn open_with_source(
        &mut self,
        manifest: Option<Manifest>,
        already_excluded: Option<BTreeSet<PackedColorId>>,
        source: SourceBuffer,
    ) -> Result<()> {
        let ticket = self.open(manifest, already_excluded)?;
        self.complete_load(ticket, Ok(source)).map(|_| ())
    }

    /// Deliver the outcome of the image load.
    ///
    /// Returns `Ok(false)` when the ticket belongs to a closed or replaced
    /// session; the result is dropped. A failed load leaves the canvas
    /// blank and the error is returned and recorded.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SourceBuffer>,
    ) -> Result<bool> {
        let expected = self.config.dimensions();
        let filter = self.config.filter_to_raster;
        let Some(session) = self.live_session(ticket.generation) else {
            log::debug!("dropping pick image for stale session {}", ticket.generation);
            return Ok(false);
        };
        if session.load != LoadStatus::Pending {
            log::debug!("pick image for session {} already resolved", ticket.generation);
            return Ok(false);
        }

        let source = match result.and_then(|s| check_dimensions(s, expected)) {
            Ok(source) => source,
            Err(err) => {
                session.load = LoadStatus::Failed;
                session.inputs = None;
                log::warn!("pick image failed to load: {}", err);
                return Err(self.record(err));
            }
        };

        if let Some((manifest, excluded)) = session.inputs.take() {
            let mut registry = ObjectRegistry::build(&manifest, &excluded);
            if filter {
                registry.retain_present(&source.object_ids());
            }
            log::info!(
                "picker {} ready with {} object{}",
                session.generation,
                registry.len(),
                if registry.len() == 1 { "" } else { "s" }
            );
            session.registry = Some(registry);
        }
        session.source = Some(source);
        session.load = LoadStatus::Loaded;
        session.dirty = true;
        Ok(true)
    }

    /// Decode PNG bytes fetched by the host and deliver them.
    pub fn complete_load_png(
        &mut self,
        ticket: LoadTicket,
        fetched: std::result::Result<&[u8], String>,
    ) -> Result<bool> {
        let expected = self.config.dimensions();
        let result = fetched
            .map_err(PickerError::ImageLoad)
            .and_then(|bytes| SourceBuffer::decode_png(bytes, expected));
        self.complete_load(ticket, result)
    }

    /// Toggle the object under the pointer.
    ///
    /// Returns the object's pending flag, or `None` when nothing registered
    /// was hit.
    pub fn click(&mut self, x: f64, y: f64, view: &ViewTransform) -> Option<bool> {
        self.toggle_at(x, y, view).map(|outcome| outcome.pending)
    }

    /// Toggle from the list widget; same path as a canvas click.
    pub fn toggle_from_list(&mut self, id: PackedColorId) -> Option<bool> {
        self.toggle_id(id).map(|outcome| outcome.pending)
    }

    /// Update hover from a pointer move. Background and unregistered pixels
    /// clear the hover. Returns whether the hover changed.
    pub fn hover(&mut self, x: f64, y: f64, view: &ViewTransform) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.interactive()) else {
            return false;
        };
        let hovered = match (session.source.as_ref(), session.registry.as_ref()) {
            (Some(source), Some(registry)) => hit_test::resolve(source, registry, x, y, view),
            _ => None,
        };
        Self::set_hover(session, hovered)
    }

    /// Pointer left the canvas.
    pub fn hover_leave(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => Self::set_hover(session, None),
            None => false,
        }
    }

    /// Route an input event. Returns whether the rendered state changed.
    pub fn dispatch(&mut self, action: PickerAction) -> bool {
        match action {
            PickerAction::Click { x, y, view } => {
                self.toggle_at(x, y, &view).is_some_and(|o| o.changed)
            }
            PickerAction::Hover { x, y, view } => self.hover(x, y, &view),
            PickerAction::HoverLeave => self.hover_leave(),
            PickerAction::ListToggle(id) => self.toggle_id(id).is_some_and(|o| o.changed),
            PickerAction::Close => {
                let was_open = self.session.is_some();
                self.close();
                was_open
            }
        }
    }

    /// Whether the next `display` call will repaint.
    pub fn needs_repaint(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.interactive() && (s.dirty || s.frame.is_none()))
    }

    /// Current overlay, rendered on demand. `None` while the canvas is
    /// blank (image pending or failed, picker disabled or closed).
    pub fn display(&mut self) -> Option<&DisplayBuffer> {
        let style = self.style;
        let session = self.session.as_mut().filter(|s| s.interactive())?;
        let (source, registry) = (session.source.as_ref()?, session.registry.as_ref()?);

        if session.dirty || session.frame.is_none() {
            let frame = session
                .frame
                .get_or_insert_with(|| DisplayBuffer::blank(source.width(), source.height()));
            render_into(frame, source, registry, session.hover, &style);
            session.dirty = false;
        }
        session.frame.as_ref()
    }

    /// Freeze the pending selection and hand it to the host for submission.
    pub fn begin_commit(&mut self) -> Result<CommitRequest> {
        let device_id = self.config.device_id.clone();
        let outcome = match self.session.as_mut() {
            None => Err(PickerError::NotReady("picker is closed")),
            Some(s) if s.submit.is_some() => Err(PickerError::CommitInFlight),
            Some(s) if !s.interactive() => {
                Err(PickerError::NotReady("pick image or manifest unavailable"))
            }
            Some(s) => {
                s.attempts += 1;
                let ticket = SubmitTicket {
                    generation: s.generation,
                    attempt: s.attempts,
                };
                s.submit = Some(ticket);
                let ids = s
                    .registry
                    .as_ref()
                    .map(ObjectRegistry::normalized_pending)
                    .unwrap_or_default();
                Ok(CommitRequest { ticket, device_id, ids })
            }
        };

        match outcome {
            Ok(request) => {
                log::info!("submitting exclusion list [{}]", request.ids);
                Ok(request)
            }
            Err(err) => {
                log::debug!("commit rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Deliver the submit outcome.
    ///
    /// Success closes the picker. Failure keeps every pending selection so
    /// the user can retry, and is returned as `PickerError::Submit`. Stale
    /// tickets yield `Ok(false)`.
    pub fn complete_commit(
        &mut self,
        ticket: SubmitTicket,
        result: std::result::Result<(), String>,
    ) -> Result<bool> {
        let Some(session) = self
            .live_session(ticket.generation)
            .filter(|s| s.submit == Some(ticket))
        else {
            log::debug!("dropping submit result for stale session {}", ticket.generation);
            return Ok(false);
        };
        session.submit = None;

        match result {
            Ok(()) => {
                log::info!("exclusion list accepted");
                self.last_error = None;
                self.session = None;
                Ok(true)
            }
            Err(reason) => {
                log::warn!("exclusion list rejected: {}", reason);
                Err(self.record(PickerError::Submit(reason)))
            }
        }
    }

    /// Dismiss the picker. Outstanding loads and submits become stale.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("picker {} closed", self.generation);
        }
    }

    fn start_session(&mut self) {
        self.generation += 1;
        self.last_error = None;
        self.session = Some(Session::new(self.generation));
    }

    fn live_session(&mut self, generation: u64) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.generation == generation)
    }

    /// Interactive session that accepts selection changes.
    fn editable_session(&mut self) -> Option<&mut Session> {
        let session = self.session.as_mut().filter(|s| s.interactive())?;
        if session.submit.is_some() {
            log::debug!("selection locked while a submit is in flight");
            return None;
        }
        Some(session)
    }

    fn toggle_at(&mut self, x: f64, y: f64, view: &ViewTransform) -> Option<ToggleOutcome> {
        let session = self.editable_session()?;
        let (source, registry) = (session.source.as_ref()?, session.registry.as_ref()?);
        let id = hit_test::resolve(source, registry, x, y, view)?;
        Self::apply_toggle(session, id)
    }

    fn toggle_id(&mut self, id: PackedColorId) -> Option<ToggleOutcome> {
        let session = self.editable_session()?;
        Self::apply_toggle(session, id)
    }

    fn apply_toggle(session: &mut Session, id: PackedColorId) -> Option<ToggleOutcome> {
        let registry = session.registry.as_mut()?;
        let before = registry.is_pending(id);
        let pending = registry.toggle(id)?;
        let changed = pending != before;
        if changed {
            session.dirty = true;
        }
        Some(ToggleOutcome { pending, changed })
    }

    fn set_hover(session: &mut Session, hovered: Option<PackedColorId>) -> bool {
        if session.hover == hovered {
            return false;
        }
        session.hover = hovered;
        session.dirty = true;
        true
    }

    fn record(&mut self, err: PickerError) -> PickerError {
        self.last_error = Some(err.clone());
        err
    }
}

fn check_dimensions(source: SourceBuffer, expected: (usize, usize)) -> Result<SourceBuffer> {
    let actual = (source.width(), source.height());
    if actual != expected {
        return Err(PickerError::ImageLoad(format!(
            "pick image is {}x{}, expected {}x{}",
            actual.0, actual.1, expected.0, expected.1
        )));
    }
    Ok(source)
}
