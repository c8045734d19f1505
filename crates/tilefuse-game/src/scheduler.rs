//! Serialized move queue with a settle delay.
//!
//! The scheduler is a single task that owns the game state, its RNG, and a
//! bounded queue of pending directional inputs. Draining is two-speed: a
//! move that changed the board arms a one-shot settle timer before the
//! next command is evaluated, while a no-op move is skipped over without
//! delay. At most one evaluation is ever in flight, and the board is only
//! touched from this task.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use tilefuse_rules::engine::{Board, Direction, Game, Position, Score, SpawnPolicy};
use tilefuse_rules::events::GameEvent;

/// Most queued moves held at once; swipes beyond this are dropped.
pub const DEFAULT_CAPACITY: usize = 100;
/// Pause after a board-changing move so its animations can finish.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(300);

/// A queued directional input awaiting evaluation.
struct PendingCommand {
    direction: Direction,
    completion: oneshot::Sender<bool>,
}

enum Control {
    Move(PendingCommand),
    InsertTile {
        position: Position,
        value: u32,
        reply: oneshot::Sender<bool>,
    },
    InsertRandom {
        reply: oneshot::Sender<Option<(Position, u32)>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// Point-in-time view of the game for presentation and end-state checks.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub board: Board,
    pub score: Score,
    pub won: Option<Position>,
    pub lost: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    pub capacity: usize,
    pub settle: Duration,
    /// RNG seed for tile spawning; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub spawn: SpawnPolicy,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            capacity: DEFAULT_CAPACITY,
            settle: DEFAULT_SETTLE,
            seed: None,
            spawn: SpawnPolicy::default(),
        }
    }
}

/// The scheduler task. Build with [`MoveScheduler::new`], start with
/// [`MoveScheduler::spawn`], and talk to it through the returned
/// [`SchedulerHandle`]; game events arrive on the returned receiver.
pub struct MoveScheduler {
    game: Game,
    rng: StdRng,
    spawn_policy: SpawnPolicy,
    rx: mpsc::UnboundedReceiver<Control>,
    queue: VecDeque<PendingCommand>,
    capacity: usize,
    settle: Duration,
    events: mpsc::UnboundedSender<GameEvent>,
    cancel: CancellationToken,
}

impl MoveScheduler {
    pub fn new(
        game: Game,
        opts: SchedulerOptions,
        cancel: CancellationToken,
    ) -> (
        Self,
        SchedulerHandle,
        mpsc::UnboundedReceiver<GameEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scheduler = MoveScheduler {
            game,
            rng,
            spawn_policy: opts.spawn,
            rx,
            queue: VecDeque::new(),
            capacity: opts.capacity,
            settle: opts.settle,
            events: events_tx,
            cancel,
        };
        (scheduler, SchedulerHandle { tx }, events_rx)
    }

    /// Run the scheduler on a Tokio task. Non-blocking; returns the
    /// JoinHandle for lifecycle management.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            let control = tokio::select! {
                _ = self.cancel.cancelled() => return,
                control = self.rx.recv() => match control {
                    Some(control) => control,
                    None => return,
                },
            };
            self.handle(control);
            while self.drain() {
                if !self.settle_pause().await {
                    return;
                }
            }
        }
    }

    fn handle(&mut self, control: Control) {
        match control {
            Control::Move(command) => {
                if self.queue.len() >= self.capacity {
                    // The player is swiping faster than the game settles.
                    debug!("move queue full, dropping {:?}", command.direction);
                    return;
                }
                self.queue.push_back(command);
            }
            Control::InsertTile {
                position,
                value,
                reply,
            } => {
                let event = self.game.insert_tile(position, value);
                let inserted = event.is_some();
                self.forward(event);
                let _ = reply.send(inserted);
            }
            Control::InsertRandom { reply } => {
                let event = self
                    .game
                    .insert_tile_at_random_empty(&mut self.rng, self.spawn_policy);
                let placed = match event {
                    Some(GameEvent::TileInserted { at, value }) => Some((at, value)),
                    _ => None,
                };
                self.forward(event);
                let _ = reply.send(placed);
            }
            Control::Snapshot { reply } => {
                let _ = reply.send(Snapshot {
                    board: self.game.board().clone(),
                    score: self.game.score(),
                    won: self.game.has_won(),
                    lost: self.game.has_lost(),
                });
            }
            Control::Reset { reply } => {
                if !self.queue.is_empty() {
                    debug!("reset dropped {} queued moves", self.queue.len());
                }
                self.queue.clear();
                self.game.reset();
                self.forward(Some(GameEvent::ScoreChanged { total: 0 }));
                let _ = reply.send(());
            }
        }
    }

    /// Pop and evaluate queued moves until one changes the board or the
    /// queue empties. Returns true when a settle pause is owed.
    fn drain(&mut self) -> bool {
        while let Some(command) = self.queue.pop_front() {
            let outcome = self.game.evaluate_move(command.direction);
            for event in outcome.events {
                let _ = self.events.send(event);
            }
            let _ = command.completion.send(outcome.changed);
            if outcome.changed {
                return true;
            }
        }
        false
    }

    /// Wait out the settle delay while still accepting mailbox traffic.
    /// A reset ends the pause early, dropping the timer with it; returns
    /// false when the scheduler should shut down.
    async fn settle_pause(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.settle);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                control = self.rx.recv() => {
                    let Some(control) = control else { return false };
                    let was_reset = matches!(control, Control::Reset { .. });
                    self.handle(control);
                    if was_reset {
                        return true;
                    }
                }
            }
        }
    }

    fn forward(&self, event: Option<GameEvent>) {
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
    }
}

/// Cloneable handle feeding the scheduler task.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Control>,
}

impl SchedulerHandle {
    /// Queue a directional move. The command is enqueued immediately;
    /// the returned future resolves to `Some(changed)` once it has been
    /// evaluated, or `None` when it was dropped: queue full, cleared by
    /// a reset, or scheduler gone.
    pub fn submit_move(
        &self,
        direction: Direction,
    ) -> impl std::future::Future<Output = Option<bool>> {
        let (completion, rx) = oneshot::channel();
        let sent = self
            .tx
            .send(Control::Move(PendingCommand {
                direction,
                completion,
            }))
            .is_ok();
        async move {
            if !sent {
                return None;
            }
            rx.await.ok()
        }
    }

    /// Place a tile at `position`; false when the slot was occupied.
    pub async fn insert_tile(&self, position: Position, value: u32) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(Control::InsertTile {
                position,
                value,
                reply,
            })
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Spawn a policy-valued tile at a random empty position; `None`
    /// when the board is full.
    pub async fn insert_random(&self) -> Option<(Position, u32)> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Control::InsertRandom { reply }).ok()?;
        rx.await.ok().flatten()
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Control::Snapshot { reply }).ok()?;
        rx.await.ok()
    }

    /// Clear board, score, and queue; any armed settle timer dies with
    /// the queue.
    pub async fn reset(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Control::Reset { reply }).is_ok() {
            let _ = rx.await;
        }
    }
}
