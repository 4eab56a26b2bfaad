// Snapshot synchronization engine.
//
// Owns the canonical client-side snapshot and reconciles it against server
// polls. Local mutations are applied optimistically (zero perceived
// latency), then confirmed by re-fetching the authoritative state; a failed
// mutation is never rolled back locally, it is discarded by a forced
// resync.
//
// Everything here runs on one logical thread: methods take `&mut self` and
// suspend only at transport await points, so snapshot access needs no
// locking. Requests are never cancelled once issued, and overlapping
// mutations are not serialized — the last response to arrive wins. That
// lost-update window under rapid double-fire is accepted, not guarded.

use tracing::{debug, warn};

use kette_common::fingerprint::Fingerprint;
use kette_common::protocol::{Mutation, ValidationError};
use kette_common::types::{Habit, HabitDetail, Snapshot};

use crate::transport::{ApiError, ApiTransport};

/// Where accepted snapshots and detail payloads are rendered to.
///
/// Rendering is synchronous and never suspends; the engine calls it at most
/// once per accepted change.
pub trait View {
    fn render(&mut self, snapshot: &Snapshot);
    fn show_detail(&mut self, detail: &HabitDetail);
}

/// What a reconciliation attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New snapshot accepted and rendered.
    Updated,
    /// Server state was byte-identical to the last accepted snapshot; no
    /// re-render.
    Unchanged,
    /// Fetch failed; the client stays on its current (possibly stale) state.
    Failed,
    /// Background tick suppressed because a mutation was in flight.
    Skipped,
}

/// Client-side state synchronization engine. One instance per session:
/// `new → bootstrap → [poll | mutate]*`, no explicit teardown.
pub struct SyncEngine<T: ApiTransport, V: View> {
    transport: T,
    view: V,
    snapshot: Snapshot,
    last_accepted: Fingerprint,
    in_flight: u32,
    open_detail: Option<i64>,
}

impl<T: ApiTransport, V: View> SyncEngine<T, V> {
    pub fn new(transport: T, view: V) -> Self {
        Self {
            transport,
            view,
            snapshot: Snapshot::default(),
            last_accepted: Fingerprint::default(),
            in_flight: 0,
            open_detail: None,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Whether at least one server snapshot (or inlined bootstrap value) has
    /// been accepted.
    pub fn is_synced(&self) -> bool {
        !self.last_accepted.is_empty()
    }

    /// Adopt an inlined initial snapshot if present (avoids a blank first
    /// paint), then reconcile with the server unconditionally — the inlined
    /// value may be stale.
    pub async fn bootstrap(&mut self, initial: Option<Snapshot>) -> PollOutcome {
        if let Some(snapshot) = initial {
            self.last_accepted = Fingerprint::of(&snapshot);
            self.snapshot = snapshot;
            self.view.render(&self.snapshot);
        }
        self.poll(false).await
    }

    /// Fetch the authoritative snapshot and reconcile.
    ///
    /// Fails silently: no error reaches the caller beyond the outcome, and
    /// only foreground polls log the failure (background ticks would spam
    /// the log every interval).
    pub async fn poll(&mut self, is_background: bool) -> PollOutcome {
        match self.transport.fetch_state().await {
            Ok(snapshot) => self.accept(snapshot).await,
            Err(error) => {
                if !is_background {
                    warn!(%error, "state sync failed");
                }
                PollOutcome::Failed
            }
        }
    }

    /// One tick of the background polling loop.
    ///
    /// Suppressed entirely while a mutation is in flight, so a stale poll
    /// response cannot overwrite a just-applied optimistic edit before the
    /// mutation's own confirmatory poll lands.
    pub async fn background_tick(&mut self) -> PollOutcome {
        if self.in_flight > 0 {
            return PollOutcome::Skipped;
        }
        self.poll(true).await
    }

    /// Validate, optimistically apply, submit, reconcile. Returns whether
    /// the server confirmed the mutation.
    ///
    /// On transport failure or rejection the optimistic edit is not rolled
    /// back; one forced resync poll discards it (and is itself allowed to
    /// fail, leaving the client stale until the next successful poll).
    pub async fn mutate(&mut self, mutation: Mutation) -> Result<bool, ValidationError> {
        mutation.validate()?;

        if self.apply_optimistic(&mutation) {
            self.view.render(&self.snapshot);
        }

        let confirmed = self.submit(&mutation).await;
        if !confirmed {
            // The optimistic edit is now unconfirmed. Drop the gate before
            // the forced resync: the server's state may serialize identically
            // to the last accepted snapshot, and the gate would otherwise
            // discard the very response that rolls the edit back.
            self.last_accepted = Fingerprint::default();
            self.poll(false).await;
        }
        Ok(confirmed)
    }

    /// Open the detail view for a habit. Accepted polls re-fetch it until
    /// `close_detail` is called.
    pub async fn open_detail(&mut self, id: i64) -> Result<HabitDetail, ApiError> {
        let detail = self.transport.fetch_habit_detail(id).await?;
        self.open_detail = Some(id);
        self.view.show_detail(&detail);
        Ok(detail)
    }

    pub fn close_detail(&mut self) {
        self.open_detail = None;
    }

    /// Reconcile a fetched snapshot against the last accepted one.
    async fn accept(&mut self, snapshot: Snapshot) -> PollOutcome {
        let fingerprint = Fingerprint::of(&snapshot);
        if fingerprint == self.last_accepted {
            return PollOutcome::Unchanged;
        }

        self.last_accepted = fingerprint;
        self.snapshot = snapshot;
        self.view.render(&self.snapshot);
        debug!("accepted new server snapshot");

        // An open detail view refers to the superseded snapshot; re-fetch
        // so it stays consistent. Failures here are ignored like any other
        // silent poll failure.
        if let Some(id) = self.open_detail {
            if let Ok(detail) = self.transport.fetch_habit_detail(id).await {
                self.view.show_detail(&detail);
            }
        }

        PollOutcome::Updated
    }

    /// POST the mutation; on HTTP success, one confirmatory poll re-derives
    /// the authoritative snapshot (server-computed streaks etc. may differ
    /// from the optimistic edit).
    ///
    /// `in_flight` is restored on every path so background polling can
    /// never end up permanently suspended.
    async fn submit(&mut self, mutation: &Mutation) -> bool {
        self.in_flight += 1;
        let confirmed = match self.transport.submit(mutation).await {
            Ok(()) => {
                self.poll(false).await;
                true
            }
            Err(error) => {
                warn!(kind = mutation.kind(), %error, "mutation failed");
                false
            }
        };
        self.in_flight -= 1;
        confirmed
    }

    /// Apply the local pre-image of a mutation. Returns whether the snapshot
    /// changed (and therefore needs a render).
    ///
    /// Additions and invites have no local pre-image — the server assigns
    /// ids and group state — so they only become visible via the
    /// confirmatory poll.
    fn apply_optimistic(&mut self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::ToggleHabit { id } => match self.snapshot.habit_mut(*id) {
                Some(habit) => {
                    apply_habit_toggle(habit);
                    true
                }
                None => false,
            },
            Mutation::ToggleTask { id } => match self.snapshot.task_mut(*id) {
                Some(task) => {
                    task.completed = !task.completed;
                    true
                }
                None => false,
            },
            Mutation::DeleteHabit { id } => {
                let before = self.snapshot.habits.len();
                self.snapshot.habits.retain(|h| h.id != *id);
                self.snapshot.habits.len() != before
            }
            Mutation::DeleteTask { id } => {
                let before = self.snapshot.tasks.len();
                self.snapshot.tasks.retain(|t| t.id != *id);
                self.snapshot.tasks.len() != before
            }
            Mutation::AddHabit { .. } | Mutation::AddTask { .. } | Mutation::InviteToHabit { .. } => {
                false
            }
        }
    }
}

/// The habit toggle rule: a completed habit resets to zero; otherwise one
/// repetition is logged, clamped to the target, completing on the clamp.
/// Maintains `completed == (current >= target)` for any `target >= 1`.
fn apply_habit_toggle(habit: &mut Habit) {
    if habit.completed {
        habit.current = 0;
        habit.completed = false;
    } else {
        habit.current += 1;
        if habit.current >= habit.target {
            habit.current = habit.target;
            habit.completed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use kette_common::types::{Frequency, Friend, FriendMatch, PendingRequest, Task};

    use crate::transport::ApiError;

    // ── Test doubles ────────────────────────────────────────────────

    /// Scripted transport: each `fetch_state` pops the next response, every
    /// call is counted, submitted mutations are recorded.
    #[derive(Default)]
    struct MockTransport {
        states: RefCell<VecDeque<Result<Snapshot, ApiError>>>,
        submits: RefCell<VecDeque<Result<(), ApiError>>>,
        submitted: RefCell<Vec<Mutation>>,
        state_calls: Cell<u32>,
        detail_calls: Cell<u32>,
        detail: Option<HabitDetail>,
    }

    impl MockTransport {
        fn with_states<I>(states: I) -> Self
        where
            I: IntoIterator<Item = Result<Snapshot, ApiError>>,
        {
            Self { states: RefCell::new(states.into_iter().collect()), ..Default::default() }
        }

        fn queue_state(&mut self, state: Result<Snapshot, ApiError>) {
            self.states.borrow_mut().push_back(state);
        }

        fn queue_submit(&mut self, result: Result<(), ApiError>) {
            self.submits.borrow_mut().push_back(result);
        }
    }

    impl ApiTransport for MockTransport {
        async fn fetch_state(&self) -> Result<Snapshot, ApiError> {
            self.state_calls.set(self.state_calls.get() + 1);
            self.states
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ApiError::Transport("no scripted state".into())))
        }

        async fn fetch_habit_detail(&self, _id: i64) -> Result<HabitDetail, ApiError> {
            self.detail_calls.set(self.detail_calls.get() + 1);
            self.detail.clone().ok_or(ApiError::Status(404))
        }

        async fn fetch_friends(&self) -> Result<Vec<Friend>, ApiError> {
            Ok(vec![])
        }

        async fn fetch_pending_requests(&self) -> Result<Vec<PendingRequest>, ApiError> {
            Ok(vec![])
        }

        async fn search_users(&self, _query: &str) -> Result<Vec<FriendMatch>, ApiError> {
            Ok(vec![])
        }

        async fn send_friend_action(
            &self,
            _action: &kette_common::protocol::FriendAction,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn submit(&self, mutation: &Mutation) -> Result<(), ApiError> {
            self.submitted.borrow_mut().push(mutation.clone());
            self.submits.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }

    /// Records every render so tests can assert on exact render counts and
    /// on the state visible at each render.
    #[derive(Default)]
    struct RecordingView {
        renders: Vec<Snapshot>,
        details: Vec<HabitDetail>,
    }

    impl View for RecordingView {
        fn render(&mut self, snapshot: &Snapshot) {
            self.renders.push(snapshot.clone());
        }

        fn show_detail(&mut self, detail: &HabitDetail) {
            self.details.push(detail.clone());
        }
    }

    fn habit(id: i64, text: &str, target: u32, current: u32) -> Habit {
        Habit {
            id,
            text: text.into(),
            target,
            current,
            completed: current >= target,
            frequency: Frequency::Daily,
            shared: false,
            shared_info: String::new(),
        }
    }

    fn task(id: i64, text: &str, completed: bool) -> Task {
        Task { id, text: text.into(), completed, tag: None }
    }

    fn snapshot_a() -> Snapshot {
        Snapshot { habits: vec![habit(1, "Run", 3, 2)], tasks: vec![task(7, "Shop", false)], streak: 0 }
    }

    fn snapshot_b() -> Snapshot {
        Snapshot { habits: vec![habit(1, "Run", 3, 3)], tasks: vec![task(7, "Shop", false)], streak: 1 }
    }

    fn engine(
        transport: MockTransport,
    ) -> SyncEngine<MockTransport, RecordingView> {
        SyncEngine::new(transport, RecordingView::default())
    }

    // ── Bootstrap ───────────────────────────────────────────────────

    #[tokio::test]
    async fn bootstrap_adopts_inlined_snapshot_before_first_poll() {
        let transport = MockTransport::with_states([Ok(snapshot_a())]);
        let mut engine = engine(transport);

        let outcome = engine.bootstrap(Some(snapshot_a())).await;

        // Inlined value rendered immediately; the reconciling poll found the
        // server byte-identical, so no second render.
        assert_eq!(outcome, PollOutcome::Unchanged);
        assert_eq!(engine.view.renders.len(), 1);
        assert_eq!(engine.transport.state_calls.get(), 1);
        assert!(engine.is_synced());
    }

    #[tokio::test]
    async fn bootstrap_without_inlined_value_renders_from_first_poll() {
        let transport = MockTransport::with_states([Ok(snapshot_a())]);
        let mut engine = engine(transport);

        let outcome = engine.bootstrap(None).await;

        assert_eq!(outcome, PollOutcome::Updated);
        assert_eq!(engine.view.renders.len(), 1);
        assert_eq!(engine.snapshot(), &snapshot_a());
    }

    #[tokio::test]
    async fn bootstrap_replaces_stale_inlined_snapshot() {
        let transport = MockTransport::with_states([Ok(snapshot_b())]);
        let mut engine = engine(transport);

        engine.bootstrap(Some(snapshot_a())).await;

        assert_eq!(engine.view.renders.len(), 2);
        assert_eq!(engine.snapshot(), &snapshot_b());
    }

    // ── Fingerprint gate ────────────────────────────────────────────

    #[tokio::test]
    async fn identical_poll_does_not_rerender() {
        let transport = MockTransport::with_states([Ok(snapshot_a()), Ok(snapshot_a())]);
        let mut engine = engine(transport);

        assert_eq!(engine.poll(false).await, PollOutcome::Updated);
        assert_eq!(engine.poll(false).await, PollOutcome::Unchanged);
        assert_eq!(engine.view.renders.len(), 1);
    }

    #[tokio::test]
    async fn changed_snapshot_renders_exactly_once() {
        let transport = MockTransport::with_states([
            Ok(snapshot_a()),
            Ok(snapshot_a()),
            Ok(snapshot_a()),
            Ok(snapshot_b()),
        ]);
        let mut engine = engine(transport);

        for _ in 0..3 {
            engine.poll(true).await;
        }
        assert_eq!(engine.poll(true).await, PollOutcome::Updated);

        // One render for A (first acceptance), exactly one for B.
        assert_eq!(engine.view.renders.len(), 2);
        assert_eq!(engine.view.renders[1], snapshot_b());
    }

    #[tokio::test]
    async fn poll_failure_is_silent_and_keeps_state() {
        let transport = MockTransport::with_states([
            Ok(snapshot_a()),
            Err(ApiError::Transport("connection refused".into())),
        ]);
        let mut engine = engine(transport);

        engine.poll(false).await;
        assert_eq!(engine.poll(true).await, PollOutcome::Failed);

        assert_eq!(engine.snapshot(), &snapshot_a());
        assert_eq!(engine.view.renders.len(), 1);
    }

    // ── Optimistic mutation ─────────────────────────────────────────

    #[tokio::test]
    async fn toggle_habit_completes_at_target_before_any_response() {
        let mut transport = MockTransport::default();
        // Confirmatory poll echoes the completed state back.
        transport.queue_state(Ok(snapshot_b()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a(); // current=2, target=3
        engine.last_accepted = Fingerprint::of(&engine.snapshot);

        let confirmed = engine.mutate(Mutation::ToggleHabit { id: 1 }).await.expect("valid");

        assert!(confirmed);
        // First render is the optimistic edit, before the POST resolved.
        let first = &engine.view.renders[0].habits[0];
        assert_eq!(first.current, 3);
        assert!(first.completed);
        assert_eq!(engine.transport.submitted.borrow().len(), 1);
    }

    #[tokio::test]
    async fn toggle_completed_habit_resets_to_zero() {
        let mut transport = MockTransport::default();
        transport.queue_state(Ok(snapshot_a()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_b(); // completed
        engine.last_accepted = Fingerprint::of(&engine.snapshot);

        engine.mutate(Mutation::ToggleHabit { id: 1 }).await.expect("valid");

        let first = &engine.view.renders[0].habits[0];
        assert_eq!(first.current, 0);
        assert!(!first.completed);
    }

    #[tokio::test]
    async fn toggle_task_flips_completion() {
        let mut transport = MockTransport::default();
        transport.queue_state(Ok(snapshot_a()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();

        engine.mutate(Mutation::ToggleTask { id: 7 }).await.expect("valid");

        assert!(engine.view.renders[0].tasks[0].completed);
    }

    #[tokio::test]
    async fn delete_removes_locally_before_confirmation() {
        let mut transport = MockTransport::default();
        transport.queue_state(Ok(Snapshot::default()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();

        engine.mutate(Mutation::DeleteHabit { id: 1 }).await.expect("valid");

        assert!(engine.view.renders[0].habits.is_empty());
    }

    #[tokio::test]
    async fn additions_render_only_via_confirmatory_poll() {
        let mut server_state = snapshot_a();
        server_state.tasks.push(task(8, "New", false));
        let mut transport = MockTransport::default();
        transport.queue_state(Ok(server_state.clone()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();
        engine.last_accepted = Fingerprint::of(&engine.snapshot);

        engine.mutate(Mutation::add_task("New", None)).await.expect("valid");

        // No optimistic render: the only render shows the server's state.
        assert_eq!(engine.view.renders.len(), 1);
        assert_eq!(engine.view.renders[0], server_state);
    }

    #[tokio::test]
    async fn confirmed_mutation_adopts_server_truth_even_if_it_differs() {
        // Server recomputes streak; the optimistic edit had streak 0.
        let mut transport = MockTransport::default();
        transport.queue_state(Ok(snapshot_b()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();
        engine.last_accepted = Fingerprint::of(&engine.snapshot);

        let confirmed = engine.mutate(Mutation::ToggleHabit { id: 1 }).await.expect("valid");

        assert!(confirmed);
        assert_eq!(engine.snapshot().streak, 1);
        assert_eq!(engine.transport.state_calls.get(), 1);
    }

    // ── Failure semantics ───────────────────────────────────────────

    #[tokio::test]
    async fn failed_mutation_triggers_exactly_one_resync() {
        let mut transport = MockTransport::default();
        transport.queue_submit(Err(ApiError::Status(500)));
        transport.queue_state(Ok(snapshot_a()));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();
        engine.last_accepted = Fingerprint::of(&engine.snapshot);

        let confirmed = engine.mutate(Mutation::ToggleHabit { id: 1 }).await.expect("valid");

        assert!(!confirmed);
        assert_eq!(engine.transport.state_calls.get(), 1);
        // The resync restored the pre-toggle server state even though it
        // serialized identically to the last accepted snapshot.
        assert_eq!(engine.snapshot(), &snapshot_a());
        // Optimistic render, then the rollback render.
        assert_eq!(engine.view.renders.len(), 2);
        assert_eq!(engine.view.renders[1], snapshot_a());
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn rejected_ack_is_treated_like_any_failure() {
        let mut transport = MockTransport::default();
        transport.queue_submit(Err(ApiError::Rejected));
        transport.queue_state(Err(ApiError::Transport("down".into())));
        let mut engine = engine(transport);
        engine.snapshot = snapshot_a();

        let confirmed = engine.mutate(Mutation::ToggleTask { id: 7 }).await.expect("valid");

        // Resync itself failed: the unconfirmed optimistic edit stays
        // visible until the next successful poll.
        assert!(!confirmed);
        assert!(engine.snapshot().tasks[0].completed);
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn validation_error_stops_before_any_network_call() {
        let mut engine = engine(MockTransport::default());
        engine.snapshot = snapshot_a();

        let result = engine.mutate(Mutation::add_task("   ", None)).await;

        assert_eq!(result, Err(ValidationError::EmptyText));
        assert_eq!(engine.transport.state_calls.get(), 0);
        assert!(engine.transport.submitted.borrow().is_empty());
        assert!(engine.view.renders.is_empty());
    }

    // ── Background suppression ──────────────────────────────────────

    #[tokio::test]
    async fn background_tick_is_suppressed_while_in_flight() {
        let mut engine = engine(MockTransport::default());
        engine.in_flight = 1;

        assert_eq!(engine.background_tick().await, PollOutcome::Skipped);
        assert_eq!(engine.transport.state_calls.get(), 0);
    }

    #[tokio::test]
    async fn background_tick_polls_when_idle() {
        let transport = MockTransport::with_states([Ok(snapshot_a())]);
        let mut engine = engine(transport);

        assert_eq!(engine.background_tick().await, PollOutcome::Updated);
        assert_eq!(engine.transport.state_calls.get(), 1);
    }

    // ── Detail view ─────────────────────────────────────────────────

    fn detail() -> HabitDetail {
        HabitDetail {
            text: "Run".into(),
            target: 3,
            frequency: Frequency::Daily,
            streak: 2,
            history: vec![],
            recent: vec![],
        }
    }

    #[tokio::test]
    async fn accepted_poll_refreshes_open_detail() {
        let mut transport = MockTransport::with_states([Ok(snapshot_a()), Ok(snapshot_b())]);
        transport.detail = Some(detail());
        let mut engine = engine(transport);

        engine.poll(false).await;
        engine.open_detail(1).await.expect("detail");
        engine.poll(false).await;

        // Once on open, once on the accepted poll.
        assert_eq!(engine.view.details.len(), 2);
        assert_eq!(engine.transport.detail_calls.get(), 2);
    }

    #[tokio::test]
    async fn closed_detail_is_not_refetched() {
        let mut transport = MockTransport::with_states([Ok(snapshot_a()), Ok(snapshot_b())]);
        transport.detail = Some(detail());
        let mut engine = engine(transport);

        engine.poll(false).await;
        engine.open_detail(1).await.expect("detail");
        engine.close_detail();
        engine.poll(false).await;

        assert_eq!(engine.view.details.len(), 1);
    }

    #[tokio::test]
    async fn unchanged_poll_does_not_refetch_detail() {
        let mut transport = MockTransport::with_states([Ok(snapshot_a()), Ok(snapshot_a())]);
        transport.detail = Some(detail());
        let mut engine = engine(transport);

        engine.poll(false).await;
        engine.open_detail(1).await.expect("detail");
        engine.poll(false).await;

        assert_eq!(engine.view.details.len(), 1);
    }

    // ── Toggle rule invariant ───────────────────────────────────────

    proptest::proptest! {
        #[test]
        fn toggle_always_maintains_completion_invariant(
            target in 1u32..10,
            current in 0u32..10,
            toggles in 1usize..20,
        ) {
            let mut habit = habit(1, "x", target, current.min(target));
            for _ in 0..toggles {
                apply_habit_toggle(&mut habit);
                proptest::prop_assert_eq!(habit.completed, habit.current >= habit.target);
                proptest::prop_assert!(habit.current <= habit.target);
            }
        }
    }
}
