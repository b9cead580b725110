use std::thread;
use std::time::Duration;

use rule_atlas::config::{
    DEFAULT_BOARD_COUNT, DEFAULT_GENERATIONS, DEFAULT_RULE, DEFAULT_WIDTH,
};
use rule_atlas::simulation::{random_seeds, single_alive};
use rule_atlas::{Dispatcher, QueryEngine, QueryKind, RunBatch};

fn main() {
    env_logger::init();

    log::info!("Starting elementary CA survey...");
    log::info!("Board size: {}x{}", DEFAULT_WIDTH, DEFAULT_GENERATIONS);

    // One fixed single-alive-cell configuration plus random ones, shared
    // across every rule so the aggregates are comparable.
    let mut seeds = vec![single_alive(DEFAULT_WIDTH, DEFAULT_WIDTH / 2)];
    seeds.extend(random_seeds(DEFAULT_WIDTH, DEFAULT_BOARD_COUNT - 1));

    let rules = [DEFAULT_RULE, 90, 110];
    let mut completed = Vec::with_capacity(rules.len());
    for rule in rules {
        let batch = match RunBatch::new(seeds.clone(), DEFAULT_WIDTH, DEFAULT_GENERATIONS, rule) {
            Ok(batch) => batch,
            Err(error) => {
                log::error!("could not build batch for rule {}: {}", rule, error);
                return;
            }
        };

        let dispatcher = Dispatcher::new(batch);
        let handle = dispatcher.handle();
        log::info!(
            "Dispatching rule {} across {} workers...",
            rule,
            dispatcher.worker_count()
        );

        let join = thread::spawn(move || dispatcher.run());
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        let batch = join.join().expect("dispatcher thread panicked");
        log::info!(
            "Rule {}: {}/{} boards simulated",
            rule,
            batch.simulated_count(),
            batch.board_count()
        );
        completed.push(batch);
    }

    run_query(&completed, QueryKind::State);
    run_query(&completed, QueryKind::Rule);
}

fn run_query(batches: &[RunBatch], kind: QueryKind) {
    let mut engine = match QueryEngine::new(batches, kind) {
        Ok(engine) => engine,
        Err(error) => {
            log::error!("query setup failed: {}", error);
            return;
        }
    };
    engine.run();

    match engine.into_results() {
        Ok(results) => {
            for board in results {
                let (width, generations) = board.dims();
                let (max, min) = board.value_range();
                log::info!(
                    "{}: {}x{} over {} boards, counts in [{}, {}]",
                    board.descriptor(),
                    width,
                    generations,
                    board.source_board_count(),
                    min,
                    max
                );
            }
        }
        Err(error) => log::error!("query produced no results: {}", error),
    }
}
