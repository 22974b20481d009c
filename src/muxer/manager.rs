/*!
 * Config Muxer
 * Merges the requests of concurrent sessions onto the single shared facility
 */

use super::clock::choose_clock;
use super::filter::EventFilter;
use super::request::TraceRequest;
use super::resolve::resolve_events;
use super::session::{CompactSchedConfig, SessionConfig, SetupErrors};
use super::state::{intersect_in_place, union_in_place, FacilityState};
use super::syscall_filter::SyscallFilter;
use crate::core::config::MuxerSettings;
use crate::core::errors::{MuxerError, MuxerResult};
use crate::core::limits::{FTRACE_GROUP, FUNCTION_GRAPH_TRACER, NOP_TRACER, RAW_SYSCALLS_GROUP};
use crate::core::types::{EventId, SessionId, TraceClock};
use crate::facility::TraceFacility;
use crate::monitoring::span_operation;
use crate::tables::{Event, EventTable, SyscallTable, VendorEventMap};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// What the exclusive part of a setup changed, so a failure can undo it
#[derive(Debug, Default)]
struct SetupUndo {
    syscall_filter_written: bool,
    function_filters_written: bool,
    engaged_function_graph: bool,
}

/// Arbitrates the shared tracing facility between sessions
///
/// The facility is one global, persistent piece of state. Each session asks
/// for a configuration; the muxer installs the union of all of them, writes
/// only what changed, and shrinks the installed set again as sessions go
/// away. Agents outside this process may touch the same files, so every
/// operation recomputes what it wants from the registry instead of trusting
/// incremental bookkeeping.
///
/// Not synchronized: all mutating operations take `&mut self`.
pub struct ConfigMuxer<'a, F: TraceFacility + ?Sized> {
    facility: &'a F,
    table: &'a EventTable,
    syscalls: SyscallTable,
    vendor_events: VendorEventMap,
    settings: MuxerSettings,
    last_id: SessionId,
    state: FacilityState,
    /// Every registered session, active or not
    sessions: BTreeMap<SessionId, SessionConfig>,
    /// Tracing is on iff this is non-empty
    active: BTreeSet<SessionId>,
}

impl<'a, F: TraceFacility + ?Sized> ConfigMuxer<'a, F> {
    /// The facility and table must outlive the muxer
    pub fn new(
        facility: &'a F,
        table: &'a EventTable,
        syscalls: SyscallTable,
        vendor_events: VendorEventMap,
    ) -> Self {
        Self {
            facility,
            table,
            syscalls,
            vendor_events,
            settings: MuxerSettings::default(),
            last_id: SessionId::INVALID,
            state: FacilityState::default(),
            sessions: BTreeMap::new(),
            active: BTreeSet::new(),
        }
    }

    pub fn with_settings(mut self, settings: MuxerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adjust the facility to honour `request` and register it
    ///
    /// Best effort: events the kernel lacks or refuses are skipped and
    /// reported in `errors`, and annotations are left alone when another agent
    /// holds them. Returns `SessionId::INVALID` when the facility could not be
    /// configured; nothing is registered in that case.
    pub fn setup_config(
        &mut self,
        request: &TraceRequest,
        errors: Option<&mut SetupErrors>,
    ) -> SessionId {
        let span = span_operation("setup_config");
        let _entered = span.enter();
        let mut scratch = SetupErrors::default();
        let errors = errors.unwrap_or(&mut scratch);

        let result = self.try_setup(request, errors);
        span.record_result(result.is_ok());
        match result {
            Ok(id) => {
                span.record_session(id);
                info!(
                    session = %id,
                    events = self.sessions[&id].event_filter.len(),
                    "Session registered"
                );
                id
            }
            Err(e) => {
                warn!(error = %e, "Session setup failed");
                errors.fatal = Some(e);
                SessionId::INVALID
            }
        }
    }

    /// Start tracing for `id`
    ///
    /// Turns `tracing_on` on for the first active session only; everything
    /// else was installed during setup.
    pub fn activate_config(&mut self, id: SessionId) -> bool {
        let span = span_operation("activate_config");
        let _entered = span.enter();
        span.record_session(id);

        if !id.is_valid() || !self.sessions.contains_key(&id) {
            warn!(session = %id, "Cannot activate unknown session");
            return false;
        }
        if self.active.contains(&id) {
            debug!(session = %id, "Session already active");
            return false;
        }

        let first = self.active.is_empty();
        self.active.insert(id);
        if first {
            if let Err(e) = self.facility.set_tracing_on(true) {
                warn!(session = %id, error = %e, "Failed to enable tracing");
                self.active.remove(&id);
                return false;
            }
        }

        info!(session = %id, active = self.active.len(), "Session activated");
        true
    }

    /// Undo the changes made for `id`
    ///
    /// Returns false iff `id` is invalid or not registered. Write failures
    /// while shrinking are logged; the session is gone either way. Buffer
    /// size, clock and tracer are left as they are.
    pub fn remove_config(&mut self, id: SessionId) -> bool {
        let span = span_operation("remove_config");
        let _entered = span.enter();
        span.record_session(id);

        if !id.is_valid() || self.sessions.remove(&id).is_none() {
            return false;
        }

        let mut expected_events = EventFilter::new();
        let mut expected_apps = Vec::new();
        let mut expected_categories = Vec::new();
        for config in self.sessions.values() {
            expected_events.union_with(&config.event_filter);
            union_in_place(&config.atrace_apps, &mut expected_apps);
            union_in_place(&config.atrace_categories, &mut expected_categories);
        }

        // Remaining sessions may have asked for annotations we never managed
        // to start; only aim for what is actually running.
        intersect_in_place(&self.state.atrace_apps, &mut expected_apps);
        intersect_in_place(&self.state.atrace_categories, &mut expected_categories);
        let atrace_changed = expected_apps.len() != self.state.atrace_apps.len()
            || expected_categories.len() != self.state.atrace_categories.len();
        if self.state.atrace_on && atrace_changed {
            if expected_apps.is_empty() && expected_categories.is_empty() {
                self.disable_atrace();
            } else {
                match self
                    .facility
                    .start_annotations(&expected_apps, &expected_categories)
                {
                    Ok(()) => {
                        self.state.atrace_apps = expected_apps;
                        self.state.atrace_categories = expected_categories;
                    }
                    Err(e) => warn!(error = %e, "Failed to restart annotations"),
                }
            }
        }

        if let Err(e) = self.update_syscall_filter(&SyscallFilter::None) {
            warn!(error = %e, "Failed to shrink syscall filter");
        }

        let table = self.table;
        let stale: Vec<EventId> = self
            .state
            .events
            .iter()
            .filter(|event_id| !expected_events.is_enabled(*event_id))
            .collect();
        for event_id in stale {
            let Some(event) = table.get_by_id(event_id) else {
                self.state.events.remove(event_id);
                continue;
            };
            if event.group == FTRACE_GROUP {
                self.state.events.remove(event_id);
                continue;
            }
            match self.facility.disable_event(&event.group, &event.name) {
                Ok(()) => self.state.events.remove(event_id),
                Err(e) => warn!(event = %event.group_and_name(), error = %e, "Failed to disable event"),
            }
        }

        if self.active.remove(&id) && self.active.is_empty() {
            // Dormant sessions may still be registered; they keep their
            // configuration but nothing records until one is activated.
            if let Err(e) = self.facility.set_tracing_on(false) {
                warn!(error = %e, "Failed to disable tracing");
            }
        }

        info!(session = %id, remaining = self.sessions.len(), "Session removed");
        true
    }

    /// Put the tracer back to `nop`
    ///
    /// Separate from removal because the kernel refuses to switch tracers
    /// while readers hold the per-CPU pipes; the caller releases them first.
    pub fn reset_current_tracer(&mut self) -> bool {
        let span = span_operation("reset_current_tracer");
        let _entered = span.enter();

        if !self.state.funcgraph_on {
            return true;
        }

        if let Err(e) = self.facility.reset_current_tracer() {
            warn!(error = %e, "Failed to reset current_tracer to nop");
            return false;
        }
        self.state.funcgraph_on = false;

        if let Err(e) = self.facility.clear_function_filters() {
            warn!(error = %e, "Failed to reset function filters");
            return false;
        }
        if let Err(e) = self.facility.clear_function_graph_filters() {
            warn!(error = %e, "Failed to reset function graph filters");
            return false;
        }
        true
    }

    pub fn data_source_config(&self, id: SessionId) -> Option<&SessionConfig> {
        self.sessions.get(&id)
    }

    /// Per-CPU buffer size pinned by the first session, 0 before that
    pub fn per_cpu_buffer_size_pages(&self) -> usize {
        self.state.cpu_buffer_size_pages
    }

    /// Clock chosen by the first session
    pub fn ftrace_clock(&self) -> Option<TraceClock> {
        self.state.clock
    }

    /// Union of the events this muxer has enabled
    pub fn central_event_filter(&self) -> &EventFilter {
        &self.state.events
    }

    /// Syscall filter last installed
    pub fn installed_syscall_filter(&self) -> &SyscallFilter {
        &self.state.syscall_filter
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        self.active.contains(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn annotations_enabled(&self) -> bool {
        self.state.atrace_on
    }

    pub fn annotation_apps(&self) -> &[String] {
        &self.state.atrace_apps
    }

    pub fn annotation_categories(&self) -> &[String] {
        &self.state.atrace_categories
    }

    fn try_setup(
        &mut self,
        request: &TraceRequest,
        errors: &mut SetupErrors,
    ) -> MuxerResult<SessionId> {
        let tracing_on = self.facility.is_tracing_on()?;
        if self.sessions.is_empty() {
            // If someone outside this process is using the facility give up now
            if tracing_on {
                return Err(MuxerError::TracingInUse);
            }
        } else if !self.active.is_empty() && !tracing_on {
            return Err(MuxerError::TracingDisabledExternally);
        }

        if request.enable_function_graph && !self.state.funcgraph_on {
            let tracer = self.facility.current_tracer()?;
            if tracer != NOP_TRACER {
                return Err(MuxerError::TracerBusy { tracer });
            }
        }

        let id = self.last_id.next().ok_or(MuxerError::IdsExhausted)?;

        let events = self.lookup_events(request, errors);
        let requested: EventFilter = events.iter().map(|event| event.id).collect();
        let syscall_filter = self.build_syscall_filter(&requested, request, errors);

        let mut undo = SetupUndo::default();
        if let Err(e) = self.install_exclusive(request, &syscall_filter, &mut undo) {
            self.undo_exclusive(undo);
            return Err(e);
        }

        if self.sessions.is_empty() {
            // Fresh start: drop whatever was left enabled before us
            match self.facility.disable_all_events() {
                Ok(()) => self.state.events = EventFilter::new(),
                Err(e) => warn!(error = %e, "Failed to disable stale events"),
            }
            if let Err(e) = self.facility.clear_trace() {
                warn!(error = %e, "Failed to clear trace buffer");
            }
        }

        if self.state.clock.is_none() {
            self.setup_clock(request);
        }

        let mut filter = EventFilter::new();
        for event in events {
            if self.enable_event(event) {
                filter.add(event.id);
            } else {
                errors.failed_events.insert(event.group_and_name().to_string());
            }
        }

        if request.requires_atrace() {
            if !self.state.atrace_on && self.facility.is_external_agent_active() {
                warn!("Userspace annotations held by another agent, leaving them alone");
                errors.annotation_errors.push(
                    "Userspace annotations are in use by another agent; not enabling them".into(),
                );
            } else {
                self.update_atrace(request, errors);
            }
        }

        let config = SessionConfig {
            event_filter: filter,
            syscall_filter,
            compact_sched: CompactSchedConfig {
                enabled: request.compact_sched.enabled && self.table.compact_sched_supported(),
            },
            atrace_apps: request.atrace_apps.clone(),
            atrace_categories: request.atrace_categories.clone(),
            symbolize_ksyms: request.symbolize_ksyms,
            function_graph: request.enable_function_graph,
        };

        self.last_id = id;
        self.sessions.insert(id, config);
        Ok(id)
    }

    /// Map resolved names to kernel events, reporting the ones that don't exist
    fn lookup_events(&self, request: &TraceRequest, errors: &mut SetupErrors) -> Vec<&'a Event> {
        let table: &'a EventTable = self.table;
        resolve_events(request, table, &self.vendor_events)
            .into_iter()
            .filter_map(|name| match table.get(&name) {
                Some(event) => Some(event),
                None => {
                    debug!(event = %name, "Event doesn't exist");
                    errors.unknown_events.insert(name.to_string());
                    None
                }
            })
            .collect()
    }

    /// Writes that must all succeed for the session to exist
    fn install_exclusive(
        &mut self,
        request: &TraceRequest,
        syscall_filter: &SyscallFilter,
        undo: &mut SetupUndo,
    ) -> MuxerResult<()> {
        // Pre-seed with the new session so the filter is never narrower than
        // what it will record. A failed write may leave entry and exit apart,
        // so it counts as written.
        undo.syscall_filter_written = true;
        undo.syscall_filter_written = self.update_syscall_filter(syscall_filter)?;

        if request.enable_function_graph {
            if !self.state.funcgraph_on {
                undo.function_filters_written = true;
                self.facility.clear_function_filters()?;
                self.facility.clear_function_graph_filters()?;
            }
            self.facility
                .append_function_filters(&request.function_filters)?;
            self.facility
                .append_function_graph_filters(&request.function_graph_roots)?;
            if !self.state.funcgraph_on {
                self.facility.set_current_tracer(FUNCTION_GRAPH_TRACER)?;
                self.state.funcgraph_on = true;
                undo.engaged_function_graph = true;
            }
        }

        if self.state.cpu_buffer_size_pages == 0 {
            let pages = self.settings.buffer_pages_for(request.buffer_size_kb);
            self.facility
                .set_buffer_size_kb(pages * self.settings.page_size_kb)?;
            self.state.cpu_buffer_size_pages = pages;
            debug!(pages, "Pinned per-CPU buffer size");
        }

        Ok(())
    }

    fn undo_exclusive(&mut self, undo: SetupUndo) {
        if undo.engaged_function_graph {
            self.state.funcgraph_on = false;
            if let Err(e) = self.facility.reset_current_tracer() {
                warn!(error = %e, "Failed to roll back current_tracer");
            }
        }
        if undo.function_filters_written {
            let cleared = self
                .facility
                .clear_function_filters()
                .and_then(|()| self.facility.clear_function_graph_filters());
            if let Err(e) = cleared {
                warn!(error = %e, "Failed to roll back function filters");
            }
        }
        if undo.syscall_filter_written {
            if let Err(e) = self.restore_syscall_filter() {
                warn!(error = %e, "Failed to roll back syscall filter");
            }
        } else {
            self.state.syscall_filter = self.registry_syscall_filter();
        }
    }

    /// Syscalls a session needs, following the three-state policy
    fn build_syscall_filter(
        &self,
        requested: &EventFilter,
        request: &TraceRequest,
        errors: &mut SetupErrors,
    ) -> SyscallFilter {
        if !requested.has_group(RAW_SYSCALLS_GROUP, self.table) {
            return SyscallFilter::None;
        }
        if request.syscall_events.is_empty() {
            return SyscallFilter::All;
        }

        let mut ids = BTreeSet::new();
        for syscall in &request.syscall_events {
            let id = self
                .syscalls
                .id_by_name(syscall)
                .or_else(|| syscall.parse().ok());
            match id {
                Some(id) => {
                    ids.insert(id);
                }
                None => {
                    warn!(syscall = %syscall, "Can't enable syscall, not known");
                    errors.unknown_syscalls.insert(syscall.clone());
                }
            }
        }
        SyscallFilter::explicit(ids)
    }

    /// Install the union of every session's syscall filter and `extra`
    ///
    /// Returns whether the control files were written.
    fn update_syscall_filter(&mut self, extra: &SyscallFilter) -> MuxerResult<bool> {
        let union = self.registry_syscall_filter().union(extra);

        if union.restriction() == self.state.syscall_filter.restriction() {
            self.state.syscall_filter = union;
            return Ok(false);
        }

        self.facility.set_syscall_filter(&union.expression())?;
        debug!(filter = %union.expression(), "Installed syscall filter");
        self.state.syscall_filter = union;
        Ok(true)
    }

    /// Union of every registered session's syscall filter
    fn registry_syscall_filter(&self) -> SyscallFilter {
        let mut union = SyscallFilter::None;
        for config in self.sessions.values() {
            union.union_with(&config.syscall_filter);
        }
        union
    }

    /// Rewrite the registry's syscall union regardless of what is installed
    fn restore_syscall_filter(&mut self) -> MuxerResult<()> {
        let union = self.registry_syscall_filter();
        self.facility.set_syscall_filter(&union.expression())?;
        self.state.syscall_filter = union;
        Ok(())
    }

    fn setup_clock(&mut self, request: &TraceRequest) {
        let current = self.facility.clock().unwrap_or_default();
        let available = self.facility.available_clocks();
        let mut selected = current.clone();

        if let Some(clock) = choose_clock(
            &available,
            &self.settings.clock_priority,
            request.use_monotonic_raw_clock,
        ) {
            if clock != current {
                match self.facility.set_clock(&clock) {
                    Ok(()) => selected = clock,
                    Err(e) => warn!(clock = %clock, error = %e, "Failed to set clock"),
                }
            }
        }

        info!(clock = %selected, "Trace clock selected");
        self.state.clock = Some(TraceClock::from_name(&selected));
    }

    /// Make sure `event` is on; false if the kernel refused
    fn enable_event(&mut self, event: &Event) -> bool {
        if self.state.events.is_enabled(event.id) {
            return true;
        }
        // Always-on events have no enable file
        if event.group == FTRACE_GROUP {
            self.state.events.add(event.id);
            return true;
        }
        match self.facility.enable_event(&event.group, &event.name) {
            Ok(()) => {
                self.state.events.add(event.id);
                true
            }
            Err(e) => {
                debug!(event = %event.group_and_name(), error = %e, "Failed to enable event");
                false
            }
        }
    }

    fn update_atrace(&mut self, request: &TraceRequest, errors: &mut SetupErrors) {
        // Stash the union and only commit it once annotations restart, so a
        // rejected argument does not poison the running set
        let mut categories = self.state.atrace_categories.clone();
        union_in_place(&request.atrace_categories, &mut categories);
        let mut apps = self.state.atrace_apps.clone();
        union_in_place(&request.atrace_apps, &mut apps);

        if self.state.atrace_on
            && apps.len() == self.state.atrace_apps.len()
            && categories.len() == self.state.atrace_categories.len()
        {
            return;
        }

        match self.facility.start_annotations(&apps, &categories) {
            Ok(()) => {
                self.state.atrace_apps = apps;
                self.state.atrace_categories = categories;
                self.state.atrace_on = true;
            }
            Err(e) => {
                warn!(error = %e, "Failed to start annotations");
                errors.annotation_errors.push(e.to_string());
            }
        }
    }

    fn disable_atrace(&mut self) {
        if let Err(e) = self.facility.stop_annotations() {
            warn!(error = %e, "Failed to stop annotations");
        }
        self.state.atrace_on = false;
        self.state.atrace_apps.clear();
        self.state.atrace_categories.clear();
    }
}
