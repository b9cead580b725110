use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::NEIGHBORHOOD_COUNT;
use crate::dispatch::RunBatch;
use crate::error::QueryError;

/// Which statistic a query computes across a batch collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Per-cell alive/dead counts across all boards
    State,
    /// Per-cell counts of each of the 8 neighborhood patterns
    Rule,
    /// Reserved; reduces to the INVALID sentinel result
    User,
}

/// Lifecycle of one query run.
///
/// `Ended` is a one-shot consumption marker: the first poll that observes
/// `Finished` flips the status to `Ended` and still returns `Finished`;
/// every later poll, on any thread, sees `Ended`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum QueryStatus {
    Waiting = 0,
    Running = 1,
    Finished = 2,
    Ended = 3,
}

impl QueryStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::Finished,
            3 => Self::Ended,
            _ => Self::Waiting,
        }
    }
}

/// One named statistical grid produced by a query: a flat
/// generation-major count array with the same shape as the source boards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryBoard {
    values: Vec<u32>,
    descriptor: String,
    value_range: (u32, u32),
    dims: (usize, usize),
    source_board_count: usize,
}

impl QueryBoard {
    fn from_counts(
        values: Vec<u32>,
        descriptor: impl Into<String>,
        dims: (usize, usize),
        source_board_count: usize,
    ) -> Self {
        let max = values.iter().copied().max().unwrap_or(0);
        let min = values.iter().copied().min().unwrap_or(0);
        Self {
            values,
            descriptor: descriptor.into(),
            value_range: (max, min),
            dims,
            source_board_count,
        }
    }

    /// Flat counts, generation-major, length `width * generations`
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// `(max, min)` over the whole grid
    pub fn value_range(&self) -> (u32, u32) {
        self.value_range
    }

    /// `(width, generations)`
    pub fn dims(&self) -> (usize, usize) {
        self.dims
    }

    /// How many source boards were examined to produce this grid
    pub fn source_board_count(&self) -> usize {
        self.source_board_count
    }
}

/// Cloneable, thread-safe poller for a query's status.
#[derive(Clone)]
pub struct QueryHandle {
    status: Arc<AtomicU8>,
}

impl QueryHandle {
    /// Poll the status, consuming the `Finished` notification: exactly
    /// one poll across all holders observes `Finished`.
    pub fn poll(&self) -> QueryStatus {
        match self.status.compare_exchange(
            QueryStatus::Finished as u8,
            QueryStatus::Ended as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => QueryStatus::Finished,
            Err(raw) => QueryStatus::from_u8(raw),
        }
    }

    /// Read the status without consuming the notification
    pub fn peek(&self) -> QueryStatus {
        QueryStatus::from_u8(self.status.load(Ordering::Acquire))
    }
}

/// Reduces a collection of completed [`RunBatch`]es into named per-cell
/// statistical grids.
///
/// Batches may use different rules but must share width and generation
/// count; only boards already published into their slots are examined,
/// so callers must not hand the engine a batch that is still running.
pub struct QueryEngine<'a> {
    kind: QueryKind,
    batches: &'a [RunBatch],
    width: usize,
    generations: usize,
    status: Arc<AtomicU8>,
    results: Vec<QueryBoard>,
}

impl<'a> QueryEngine<'a> {
    /// Validate shapes and enter the `Waiting` state.
    pub fn new(batches: &'a [RunBatch], kind: QueryKind) -> Result<Self, QueryError> {
        let first = batches.first().ok_or(QueryError::EmptyInput)?;
        let expected = (first.width(), first.generations());
        for (index, batch) in batches.iter().enumerate().skip(1) {
            let found = (batch.width(), batch.generations());
            if found != expected {
                return Err(QueryError::ShapeMismatch {
                    index,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            kind,
            batches,
            width: expected.0,
            generations: expected.1,
            status: Arc::new(AtomicU8::new(QueryStatus::Waiting as u8)),
            results: Vec::new(),
        })
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// A handle for pollers on other threads
    pub fn handle(&self) -> QueryHandle {
        QueryHandle {
            status: Arc::clone(&self.status),
        }
    }

    /// Poll the status, consuming a `Finished` observation (see
    /// [`QueryHandle::poll`]).
    pub fn poll(&self) -> QueryStatus {
        self.handle().poll()
    }

    /// Read the status without consuming the notification
    pub fn peek(&self) -> QueryStatus {
        QueryStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Run the reduction: a single pass over every published board,
    /// O(total cells). Blocks; callers wanting asynchronous progress run
    /// this on its own thread and poll a [`QueryHandle`].
    pub fn run(&mut self) {
        let start = Instant::now();
        self.status
            .store(QueryStatus::Running as u8, Ordering::Release);

        self.results = match self.kind {
            QueryKind::State => self.query_state(),
            QueryKind::Rule => self.query_rule(),
            QueryKind::User => {
                log::warn!("unsupported query kind {:?}, producing sentinel result", self.kind);
                self.query_fail()
            }
        };

        self.status
            .store(QueryStatus::Finished as u8, Ordering::Release);
        log::info!("query completed in {} ms", start.elapsed().as_millis());
    }

    /// All result grids, once the reduction has finished
    pub fn results(&self) -> Result<&[QueryBoard], QueryError> {
        if matches!(self.peek(), QueryStatus::Finished | QueryStatus::Ended) {
            Ok(&self.results)
        } else {
            Err(QueryError::NotReady)
        }
    }

    /// One result grid by index
    pub fn result(&self, index: usize) -> Result<&QueryBoard, QueryError> {
        self.results()?
            .get(index)
            .ok_or(QueryError::IndexNotFound(index))
    }

    /// Consume the engine, keeping only the result grids
    pub fn into_results(self) -> Result<Vec<QueryBoard>, QueryError> {
        if matches!(self.peek(), QueryStatus::Finished | QueryStatus::Ended) {
            Ok(self.results)
        } else {
            Err(QueryError::NotReady)
        }
    }

    fn grid_size(&self) -> usize {
        self.width * self.generations
    }

    fn query_state(&self) -> Vec<QueryBoard> {
        let mut alive = vec![0u32; self.grid_size()];
        let mut dead = vec![0u32; self.grid_size()];
        let mut examined = 0usize;

        for batch in self.batches {
            for board in batch.boards() {
                examined += 1;
                for (index, cell) in board.cells().iter().enumerate() {
                    if cell.is_alive() {
                        alive[index] += 1;
                    } else {
                        dead[index] += 1;
                    }
                }
            }
        }

        let dims = (self.width, self.generations);
        vec![
            QueryBoard::from_counts(alive, "Alive Count", dims, examined),
            QueryBoard::from_counts(dead, "Dead Count", dims, examined),
        ]
    }

    fn query_rule(&self) -> Vec<QueryBoard> {
        let mut counts = vec![vec![0u32; self.grid_size()]; NEIGHBORHOOD_COUNT];
        let mut examined = 0usize;

        for batch in self.batches {
            for board in batch.boards() {
                examined += 1;
                for (index, cell) in board.cells().iter().enumerate() {
                    counts[cell.rule_index as usize][index] += 1;
                }
            }
        }

        let dims = (self.width, self.generations);
        counts
            .into_iter()
            .enumerate()
            .map(|(pattern, values)| {
                QueryBoard::from_counts(
                    values,
                    format!("Count for {:03b}", pattern),
                    dims,
                    examined,
                )
            })
            .collect()
    }

    /// Defined fallback for unrecognized kinds: a single all-zero grid
    fn query_fail(&self) -> Vec<QueryBoard> {
        vec![QueryBoard::from_counts(
            vec![0u32; self.grid_size()],
            "INVALID",
            (self.width, self.generations),
            0,
        )]
    }
}
