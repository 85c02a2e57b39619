//! Worker-thread turn execution.
//!
//! `TurnRuntime` owns the single in-flight turn: it spawns a named worker
//! thread that drives the provider, buffers the emitted events, and applies
//! them to the session strictly in emission order when the UI thread drains
//! the queue. A provider that panics or returns without a terminal event
//! still ends its turn with a `Failed` event.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use chat_api::ChatTurn;

use crate::provider::{CancelSignal, TurnEvent, TurnId, TurnProvider, TurnRequest};
use crate::session::{ChatSession, Notice, SessionHost};

struct ActiveTurn {
    turn_id: TurnId,
    cancel: CancelSignal,
    join_handle: Option<JoinHandle<()>>,
}

pub struct TurnRuntime {
    pending_events: Mutex<VecDeque<TurnEvent>>,
    pending_notices: Mutex<Vec<Notice>>,
    render_requested: AtomicBool,
    next_turn_id: AtomicU64,
    active_turn: Mutex<Option<ActiveTurn>>,
    provider: Arc<dyn TurnProvider>,
}

impl TurnRuntime {
    pub fn new(provider: Arc<dyn TurnProvider>) -> Arc<Self> {
        Arc::new(Self {
            pending_events: Mutex::new(VecDeque::new()),
            pending_notices: Mutex::new(Vec::new()),
            render_requested: AtomicBool::new(false),
            next_turn_id: AtomicU64::new(1),
            active_turn: Mutex::new(None),
            provider,
        })
    }

    fn start_turn_internal(self: &Arc<Self>, messages: Vec<ChatTurn>) -> Result<TurnId, String> {
        let mut active_turn = self.lock_active_turn();
        if active_turn.is_some() {
            return Err("Turn already active".to_string());
        }

        let turn_id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        let request = TurnRequest { turn_id, messages };
        let join_handle = self.spawn_worker(request, Arc::clone(&cancel))?;

        *active_turn = Some(ActiveTurn {
            turn_id,
            cancel,
            join_handle: Some(join_handle),
        });

        Ok(turn_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        request: TurnRequest,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, String> {
        let turn_id = request.turn_id;
        let runtime = Arc::clone(self);
        thread::Builder::new()
            .name(format!("program-turn-{turn_id}"))
            .spawn(move || runtime.run_worker(request, cancel))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))
    }

    fn run_worker(self: Arc<Self>, request: TurnRequest, cancel: CancelSignal) {
        let turn_id = request.turn_id;

        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let runtime = Arc::clone(&self);
        let provider = Arc::clone(&self.provider);

        let mut emit = move |event: TurnEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }
            runtime.enqueue_turn_event(event);
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            provider.run(request, Arc::clone(&cancel), &mut emit)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => emit(TurnEvent::Failed { turn_id, error }),
            Err(_) => emit(TurnEvent::Failed {
                turn_id,
                error: "Turn provider panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) && self.is_active_turn_id(turn_id) {
            emit(TurnEvent::Failed {
                turn_id,
                error: "Turn provider exited without terminal event".to_string(),
            });
        }
    }

    fn enqueue_turn_event(&self, event: TurnEvent) {
        lock_unpoisoned(&self.pending_events).push_back(event);
    }

    /// Applies queued turn events to the session in emission order. Returns
    /// the number of events applied.
    pub fn drain_pending_turn_events(
        &self,
        session: &mut ChatSession,
        host: &mut dyn SessionHost,
    ) -> usize {
        let mut drained = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            let Some(event) = event else {
                break;
            };

            let turn_id = event.turn_id();
            let terminal = event.is_terminal();

            match event {
                TurnEvent::Started { turn_id } => session.on_turn_started(turn_id),
                TurnEvent::Chunk { turn_id, text } => session.on_turn_chunk(turn_id, &text),
                TurnEvent::Finished { turn_id } => session.on_turn_finished(turn_id),
                TurnEvent::Failed { turn_id, error } => {
                    session.on_turn_failed(turn_id, &error, host)
                }
                TurnEvent::Cancelled { turn_id } => session.on_turn_cancelled(turn_id),
            }

            if terminal {
                self.clear_active_turn_if_matching(turn_id);
            }

            drained += 1;
        }

        if drained > 0 {
            host.request_render();
        }

        drained
    }

    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        !lock_unpoisoned(&self.pending_events).is_empty()
    }

    #[must_use]
    pub fn is_turn_active(&self) -> bool {
        self.lock_active_turn().is_some()
    }

    /// Blocks until the active turn's worker exits. The terminal event is
    /// still delivered through the queue; call
    /// [`TurnRuntime::drain_pending_turn_events`] afterwards.
    pub fn wait_for_worker(&self) {
        let join_handle = {
            let mut active_turn = self.lock_active_turn();
            active_turn
                .as_mut()
                .and_then(|active| active.join_handle.take())
        };

        if let Some(join_handle) = join_handle {
            let _ = join_handle.join();
        }
    }

    /// Consumes a queued render request, if any. Shells poll this after
    /// draining events.
    pub fn take_render_request(&self) -> bool {
        self.render_requested.swap(false, Ordering::SeqCst)
    }

    /// Takes all queued notices for display.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock_unpoisoned(&self.pending_notices))
    }

    fn clear_active_turn_if_matching(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        let mut completed = match active_turn.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn is_active_turn_id(&self, turn_id: TurnId) -> bool {
        self.lock_active_turn()
            .as_ref()
            .map(|active| active.turn_id)
            == Some(turn_id)
    }

    fn cancel_turn_internal(&self, turn_id: TurnId) {
        let active_turn = self.lock_active_turn();
        if let Some(active_turn) = active_turn.as_ref() {
            if active_turn.turn_id == turn_id {
                active_turn.cancel.store(true, Ordering::SeqCst);
            }
        }
    }

    fn lock_active_turn(&self) -> MutexGuard<'_, Option<ActiveTurn>> {
        lock_unpoisoned(&self.active_turn)
    }
}

impl SessionHost for Arc<TurnRuntime> {
    fn start_turn(&mut self, messages: Vec<ChatTurn>) -> Result<TurnId, String> {
        self.start_turn_internal(messages)
    }

    fn cancel_turn(&mut self, turn_id: TurnId) {
        self.cancel_turn_internal(turn_id);
    }

    fn request_render(&mut self) {
        self.render_requested.store(true, Ordering::SeqCst);
    }

    fn notify(&mut self, notice: Notice) {
        lock_unpoisoned(&self.pending_notices).push(notice);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
