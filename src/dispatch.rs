use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use crate::config::MAX_COMPUTE_WORKERS;
use crate::error::BoardError;
use crate::simulation::Board;

/// Lifecycle of one dispatcher run.
///
/// `Initialized` is stored at construction, once the worker count and
/// partition are fixed; `Running` and `Finished` are published with
/// release ordering so a status reader on another thread never observes
/// `Finished` before every board publish is visible. A cancelled run
/// never reaches `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatchStatus {
    Uninitialized = 0,
    Initialized = 1,
    Running = 2,
    Finished = 3,
}

impl DispatchStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Initialized,
            2 => Self::Running,
            3 => Self::Finished,
            _ => Self::Uninitialized,
        }
    }
}

/// One slot in a batch's board array.
///
/// Each slot leaves `Pending` at most once, written by the single thread
/// that drains the worker channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardSlot {
    /// No worker has published a result for this index yet
    Pending,
    /// Simulation completed
    Ready(Board),
    /// Board construction or simulation failed; siblings are unaffected
    Failed(BoardError),
}

impl BoardSlot {
    pub fn board(&self) -> Option<&Board> {
        match self {
            Self::Ready(board) => Some(board),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// The immutable parameters and initial configurations for one rule, plus
/// one board slot per configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunBatch {
    rule: u8,
    width: usize,
    generations: usize,
    seeds: Vec<Vec<u8>>,
    slots: Vec<BoardSlot>,
}

impl RunBatch {
    pub fn new(
        seeds: Vec<Vec<u8>>,
        width: usize,
        generations: usize,
        rule: u8,
    ) -> Result<Self, BoardError> {
        if width < 1 || generations < 1 {
            return Err(BoardError::InvalidDimensions { width, generations });
        }
        let slots = seeds.iter().map(|_| BoardSlot::Pending).collect();
        Ok(Self {
            rule,
            width,
            generations,
            seeds,
            slots,
        })
    }

    pub fn rule(&self) -> u8 {
        self.rule
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Number of board slots (equals the number of seeds)
    pub fn board_count(&self) -> usize {
        self.slots.len()
    }

    pub fn seed(&self, index: usize) -> Option<&[u8]> {
        self.seeds.get(index).map(Vec::as_slice)
    }

    /// Inspect a slot: `None` means no such index, `Pending` means not yet
    /// simulated, `Failed` carries the per-board error.
    pub fn slot(&self, index: usize) -> Option<&BoardSlot> {
        self.slots.get(index)
    }

    /// The simulated board at `index`, if one has been published
    pub fn board(&self, index: usize) -> Option<&Board> {
        self.slots.get(index).and_then(BoardSlot::board)
    }

    /// All published boards, in slot order
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.slots.iter().filter_map(BoardSlot::board)
    }

    pub fn simulated_count(&self) -> usize {
        self.boards().count()
    }

    /// True when every slot holds a simulated board
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(BoardSlot::is_ready)
    }

    /// Split borrows for the run loop: workers read the seed table while
    /// the receiving thread writes slots.
    fn seeds_and_slots(&mut self) -> (&[Vec<u8>], &mut [BoardSlot]) {
        (&self.seeds, &mut self.slots)
    }
}

impl Default for RunBatch {
    /// The degenerate batch: one all-dead 1x1 board under rule 0
    fn default() -> Self {
        Self {
            rule: 0x00,
            width: 1,
            generations: 1,
            seeds: vec![vec![0x00]],
            slots: vec![BoardSlot::Pending],
        }
    }
}

/// Cloneable, thread-safe view of a running dispatch: status polling and
/// cancellation.
#[derive(Clone)]
pub struct DispatchHandle {
    status: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
}

impl DispatchHandle {
    pub fn status(&self) -> DispatchStatus {
        DispatchStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_finished(&self) -> bool {
        self.status() == DispatchStatus::Finished
    }

    /// Ask the worker pool to stop between boards. Already-published
    /// slots stay valid; unpublished slots stay `Pending`; the status
    /// never reaches `Finished`.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }
}

/// Drives every board in a [`RunBatch`] to completion on a bounded pool
/// of worker threads.
///
/// Worker `k` of `W = min(8, board count)` processes indices
/// `k, k+W, k+2W, ...` in ascending order, so each index belongs to
/// exactly one worker. Workers build owned boards and send them over a
/// channel; the run thread is the only writer of the slot array.
pub struct Dispatcher {
    batch: RunBatch,
    workers: usize,
    status: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
}

/// The indices assigned to `worker` under a static stride-`worker_count`
/// partition of `0..board_count`
fn assigned_indices(
    worker: usize,
    worker_count: usize,
    board_count: usize,
) -> impl Iterator<Item = usize> {
    (worker..board_count).step_by(worker_count.max(1))
}

impl Dispatcher {
    pub fn new(batch: RunBatch) -> Self {
        let workers = batch.board_count().min(MAX_COMPUTE_WORKERS);
        Self {
            batch,
            workers,
            status: Arc::new(AtomicU8::new(DispatchStatus::Initialized as u8)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn status(&self) -> DispatchStatus {
        DispatchStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// A handle for status readers and cancellation requests on other
    /// threads. Clone freely; it stays valid after `run` returns.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            status: Arc::clone(&self.status),
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Simulate every board in the batch and return it.
    ///
    /// Blocks until all workers drain; callers wanting asynchronous
    /// progress run this on its own thread and poll a [`DispatchHandle`].
    pub fn run(mut self) -> RunBatch {
        let start = Instant::now();
        self.status
            .store(DispatchStatus::Running as u8, Ordering::Release);

        let board_count = self.batch.board_count();
        if board_count == 0 {
            self.status
                .store(DispatchStatus::Finished as u8, Ordering::Release);
            return self.batch;
        }

        let workers = self.workers;
        let rule = self.batch.rule();
        let width = self.batch.width();
        let generations = self.batch.generations();

        let cancel = &self.cancel;
        let (seeds, slots) = self.batch.seeds_and_slots();
        let (tx, rx) = mpsc::channel::<(usize, Result<Board, BoardError>)>();

        thread::scope(|scope| {
            for worker in 0..workers {
                let tx = tx.clone();
                let cancel = Arc::clone(cancel);
                scope.spawn(move || {
                    let worker_start = Instant::now();
                    for index in assigned_indices(worker, workers, board_count) {
                        if cancel.load(Ordering::Acquire) {
                            log::debug!("compute worker {} stopping on cancel", worker);
                            return;
                        }
                        let outcome = Board::new(&seeds[index], width, generations)
                            .map(|board| board.simulate(rule));
                        if tx.send((index, outcome)).is_err() {
                            return;
                        }
                    }
                    log::debug!(
                        "compute worker {} done in {} ms",
                        worker,
                        worker_start.elapsed().as_millis()
                    );
                });
            }
            drop(tx);

            // Single writer: every slot leaves Pending at most once.
            for (index, outcome) in rx {
                slots[index] = match outcome {
                    Ok(board) => BoardSlot::Ready(board),
                    Err(error) => {
                        log::warn!("board {} failed to simulate: {}", index, error);
                        BoardSlot::Failed(error)
                    }
                };
            }
        });

        if self.cancel.load(Ordering::Acquire) {
            log::info!(
                "simulation for rule {} cancelled after {} ms",
                rule,
                start.elapsed().as_millis()
            );
        } else {
            self.status
                .store(DispatchStatus::Finished as u8, Ordering::Release);
            log::info!(
                "simulation for rule {} done in {} ms",
                rule,
                start.elapsed().as_millis()
            );
        }
        self.batch
    }
}
