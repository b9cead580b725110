mod board;
mod cell;
mod seeds;

pub use board::{Board, StreamFields};
pub use cell::{neighborhood_index, rule_bit, Cell};
pub use seeds::{random_seeds, seed_bytes, single_alive};
