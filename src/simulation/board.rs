use crate::error::BoardError;
use crate::simulation::cell::{neighborhood_index, rule_bit, Cell};

/// Which per-cell fields a flat stream emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamFields {
    /// One element per cell: the binary state
    State,
    /// One element per cell: the neighborhood index
    Rule,
    /// Two elements per cell: (state, rule_index), zero-padded
    Both,
}

/// One simulated space-time grid: an initial generation plus the
/// generations derived from it by a rule number.
///
/// Cells are stored flat in generation-major (row-major) order, so cell
/// `(generation, column)` lives at `generation * width + column`. A board
/// starts with only generation 0 populated; [`Board::simulate`] consumes
/// it and returns the fully populated, read-only result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    generations: usize,
    cells: Vec<Cell>,
    simulated: bool,
}

impl Board {
    /// Unpack a packed-bit seed into generation 0 of a new board.
    ///
    /// Bit `j` of seed byte `i` maps to cell `i * 8 + j`; seed bits past
    /// `width` are ignored.
    pub fn new(seed: &[u8], width: usize, generations: usize) -> Result<Self, BoardError> {
        if width < 1 || generations < 1 {
            return Err(BoardError::InvalidDimensions { width, generations });
        }
        if seed.len() * 8 < width {
            return Err(BoardError::InvalidSeed {
                available: seed.len() * 8,
                width,
            });
        }

        let mut cells = vec![Cell::seed(false); width * generations];
        for (column, cell) in cells.iter_mut().enumerate().take(width) {
            let alive = (seed[column / 8] >> (column % 8)) & 0x01 != 0;
            *cell = Cell::seed(alive);
        }

        Ok(Self {
            width,
            generations,
            cells,
            simulated: false,
        })
    }

    /// Derive generations 1.. from generation 0 under an 8-bit Wolfram
    /// rule, with toroidal (wrap-around) columns.
    ///
    /// Consumes the board, so a board can never be simulated twice.
    pub fn simulate(mut self, rule: u8) -> Self {
        let width = self.width;
        for generation in 1..self.generations {
            let previous = (generation - 1) * width;
            for column in 0..width {
                let left = self.cells[previous + (column + width - 1) % width].state;
                let center = self.cells[previous + column].state;
                let right = self.cells[previous + (column + 1) % width].state;
                let neighborhood = neighborhood_index(left, center, right);
                self.cells[generation * width + column] =
                    Cell::derived(rule_bit(rule, neighborhood), neighborhood);
            }
        }
        self.simulated = true;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    /// True once every generation has been populated by `simulate`
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// All cells, flat in generation-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// One generation's row of cells
    pub fn generation(&self, index: usize) -> Option<&[Cell]> {
        if index < self.generations {
            Some(&self.cells[index * self.width..(index + 1) * self.width])
        } else {
            None
        }
    }

    pub fn cell(&self, generation: usize, column: usize) -> Option<Cell> {
        if generation < self.generations && column < self.width {
            Some(self.cells[generation * self.width + column])
        } else {
            None
        }
    }

    /// Project the board into a flat byte stream of
    /// `width * generations * element_width` bytes, generation-major, one
    /// zero-padded element per cell. Read-only; callable any number of
    /// times.
    pub fn to_flat_stream(
        &self,
        fields: StreamFields,
        element_width: usize,
    ) -> Result<Vec<u8>, BoardError> {
        let minimum = match fields {
            StreamFields::Both => 2,
            _ => 1,
        };
        if element_width < minimum {
            return Err(BoardError::InvalidElementWidth {
                requested: element_width,
                minimum,
            });
        }

        // At element width 2 the interleaved stream is exactly the cell
        // grid's own byte layout.
        if fields == StreamFields::Both && element_width == 2 {
            return Ok(bytemuck::cast_slice(&self.cells).to_vec());
        }

        let mut output = vec![0u8; self.cells.len() * element_width];
        for (index, cell) in self.cells.iter().enumerate() {
            let base = index * element_width;
            match fields {
                StreamFields::State => output[base] = cell.state,
                StreamFields::Rule => output[base] = cell.rule_index,
                StreamFields::Both => {
                    output[base] = cell.state;
                    output[base + 1] = cell.rule_index;
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SEED_RULE_ALIVE, SEED_RULE_DEAD};

    #[test]
    fn test_rejects_invalid_dimensions() {
        assert_eq!(
            Board::new(&[0x00], 0, 4),
            Err(BoardError::InvalidDimensions { width: 0, generations: 4 })
        );
        assert_eq!(
            Board::new(&[0x00], 8, 0),
            Err(BoardError::InvalidDimensions { width: 8, generations: 0 })
        );
    }

    #[test]
    fn test_rejects_short_seed() {
        assert_eq!(
            Board::new(&[0x00], 9, 4),
            Err(BoardError::InvalidSeed { available: 8, width: 9 })
        );
    }

    #[test]
    fn test_seed_bit_order() {
        // Bit j of byte i maps to cell i*8+j: 0x08 sets column 3,
        // byte 1 bit 7 sets column 15.
        let board = Board::new(&[0x08, 0x80], 16, 1).unwrap();
        for column in 0..16 {
            let expected = column == 3 || column == 15;
            assert_eq!(
                board.cell(0, column).unwrap().is_alive(),
                expected,
                "column {} alive flag",
                column
            );
        }
    }

    #[test]
    fn test_seed_sentinel_rule_indices() {
        let board = Board::new(&[0x01], 2, 1).unwrap();
        assert_eq!(board.cell(0, 0).unwrap().rule_index, SEED_RULE_ALIVE);
        assert_eq!(board.cell(0, 1).unwrap().rule_index, SEED_RULE_DEAD);
    }

    #[test]
    fn test_unsimulated_board() {
        let board = Board::new(&[0x01], 8, 4).unwrap();
        assert!(!board.is_simulated());
        assert_eq!(board.cells().len(), 32);
        // Generations past 0 start dead
        assert!(board.generation(1).unwrap().iter().all(|c| !c.is_alive()));
    }

    #[test]
    fn test_rule_30_single_alive_cell() {
        // Single alive cell at column 3; rule 30 (0b00011110) turns
        // neighborhoods 001, 010, 100 alive.
        let board = Board::new(&[0x08], 8, 3).unwrap().simulate(30);
        assert!(board.is_simulated());

        let gen1: Vec<u8> = board.generation(1).unwrap().iter().map(|c| c.state).collect();
        assert_eq!(gen1, vec![0, 0, 1, 1, 1, 0, 0, 0]);
        assert_eq!(board.cell(1, 2).unwrap().rule_index, 0b001);
        assert_eq!(board.cell(1, 3).unwrap().rule_index, 0b010);
        assert_eq!(board.cell(1, 4).unwrap().rule_index, 0b100);
        assert_eq!(board.cell(1, 0).unwrap().rule_index, 0b000);

        let gen2: Vec<u8> = board.generation(2).unwrap().iter().map(|c| c.state).collect();
        assert_eq!(gen2, vec![0, 1, 1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_toroidal_wrap_left_edge() {
        // Alive cell at column 0: column w-1 sees it as its right
        // neighbor in the next generation.
        let board = Board::new(&[0x01], 8, 2).unwrap().simulate(30);
        assert_eq!(board.cell(1, 7).unwrap().rule_index, 0b001);
        assert_eq!(board.cell(1, 7).unwrap().state, 1);
        assert_eq!(board.cell(1, 1).unwrap().rule_index, 0b100);
        assert_eq!(board.cell(1, 1).unwrap().state, 1);
    }

    #[test]
    fn test_toroidal_wrap_right_edge() {
        // Alive cell at column w-1: column 0 sees it as its left neighbor.
        let board = Board::new(&[0x80], 8, 2).unwrap().simulate(30);
        assert_eq!(board.cell(1, 0).unwrap().rule_index, 0b100);
        assert_eq!(board.cell(1, 0).unwrap().state, 1);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let seed = [0xA5, 0x3C];
        let first = Board::new(&seed, 16, 12).unwrap().simulate(110);
        let second = Board::new(&seed, 16, 12).unwrap().simulate(110);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_stream_length_and_round_trip() {
        let board = Board::new(&[0x08], 8, 4).unwrap().simulate(30);
        let stream = board.to_flat_stream(StreamFields::State, 1).unwrap();
        assert_eq!(stream.len(), 8 * 4);
        let states: Vec<u8> = board.cells().iter().map(|c| c.state).collect();
        assert_eq!(stream, states);
    }

    #[test]
    fn test_flat_stream_interleaved() {
        let board = Board::new(&[0x08], 8, 4).unwrap().simulate(30);
        let stream = board.to_flat_stream(StreamFields::Both, 2).unwrap();
        assert_eq!(stream.len(), 8 * 4 * 2);
        for (index, cell) in board.cells().iter().enumerate() {
            assert_eq!(stream[index * 2], cell.state);
            assert_eq!(stream[index * 2 + 1], cell.rule_index);
        }
    }

    #[test]
    fn test_flat_stream_zero_padding() {
        let board = Board::new(&[0x08], 8, 2).unwrap().simulate(30);
        let stream = board.to_flat_stream(StreamFields::Both, 4).unwrap();
        assert_eq!(stream.len(), 8 * 2 * 4);
        for element in stream.chunks(4) {
            assert_eq!(&element[2..], &[0, 0]);
        }
    }

    #[test]
    fn test_flat_stream_rejects_small_elements() {
        let board = Board::new(&[0x08], 8, 2).unwrap().simulate(30);
        assert_eq!(
            board.to_flat_stream(StreamFields::State, 0),
            Err(BoardError::InvalidElementWidth { requested: 0, minimum: 1 })
        );
        assert_eq!(
            board.to_flat_stream(StreamFields::Both, 1),
            Err(BoardError::InvalidElementWidth { requested: 1, minimum: 2 })
        );
    }
}
