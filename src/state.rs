//! Positions, moves and move generation

use std::fmt;
use std::str::FromStr;

use crate::bitboard::{self, BOARD_MASK};
use crate::error::GameError;
use crate::{HEIGHT, WIDTH};

/// One of the two players. White moves first and is the maximizing side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// The negamax sign of this side: `1` for White, `-1` for Black
    pub fn color(self) -> i32 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

/// A square on the board, with row 0 along the top edge
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub column: usize,
    pub row: usize,
}

impl Square {
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    pub fn in_bounds(&self) -> bool {
        self.column < WIDTH && self.row < HEIGHT
    }

    fn from_index(index: usize) -> Self {
        let (column, row) = bitboard::index_to_square(index);
        Self { column, row }
    }

    fn bit(&self) -> Option<u64> {
        bitboard::square_bit(self.column as i32, self.row as i32)
    }

    /// The neighbouring square in `direction`, if it is on the board
    pub fn step(&self, direction: Direction) -> Option<Square> {
        let (dx, dy) = direction.offset();
        let column = self.column as i32 + dx;
        let row = self.row as i32 + dy;
        bitboard::square_index(column, row).map(Square::from_index)
    }
}

// squares are written 1-indexed, column first: "13" is column 1, row 3
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.column + 1, self.row + 1)
    }
}

/// The four orthogonal directions a piece can slide
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    West,
    North,
    South,
}

impl Direction {
    /// All directions in move generation order
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// `(column, row)` offset of one step in this direction
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::South => (0, 1),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::East => 'E',
            Direction::West => 'W',
            Direction::North => 'N',
            Direction::South => 'S',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'E' => Some(Direction::East),
            'W' => Some(Direction::West),
            'N' => Some(Direction::North),
            'S' => Some(Direction::South),
            _ => None,
        }
    }
}

/// A piece and the direction it slides in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub direction: Direction,
}

impl Move {
    pub const fn new(from: Square, direction: Direction) -> Self {
        Self { from, direction }
    }

    /// The square the piece lands on, if it is on the board
    pub fn destination(&self) -> Option<Square> {
        self.from.step(self.direction)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.direction.letter())
    }
}

impl FromStr for Move {
    type Err = GameError;

    /// Parses the three character notation `<column><row><direction>`, e.g. `"13E"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidMove(s.to_string());
        let mut chars = s.trim().chars();

        let column = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)? as usize;
        let row = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)? as usize;
        let direction = chars
            .next()
            .and_then(Direction::from_letter)
            .ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }

        match (column, row) {
            (1..=WIDTH, 1..=HEIGHT) => Ok(Move::new(Square::new(column - 1, row - 1), direction)),
            _ => Err(invalid()),
        }
    }
}

/// A position: the squares occupied by each player
///
/// States are immutable values. Applying a move returns a new `State`, so
/// states can be used directly as transposition table keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct State {
    white: u64,
    black: u64,
}

impl State {
    /// Builds a state from each player's squares
    ///
    /// Fails if a square is off the board, listed twice, or claimed by both players.
    pub fn new<W, B>(white: W, black: B) -> Result<Self, GameError>
    where
        W: IntoIterator<Item = Square>,
        B: IntoIterator<Item = Square>,
    {
        let white = Self::collect_mask(white)?;
        let black = Self::collect_mask(black)?;

        if let Some(index) = bitboard::bits(white & black).next() {
            return Err(GameError::Overlap(Square::from_index(index)));
        }
        Ok(Self { white, black })
    }

    fn collect_mask<I: IntoIterator<Item = Square>>(squares: I) -> Result<u64, GameError> {
        let mut mask = 0;
        for square in squares {
            let bit = square.bit().ok_or(GameError::OutOfBounds {
                column: square.column,
                row: square.row,
            })?;
            if mask & bit != 0 {
                return Err(GameError::DuplicatePiece(square));
            }
            mask |= bit;
        }
        Ok(mask)
    }

    /// The standard starting position: six pieces each, alternating down
    /// the two outer columns
    pub fn initial() -> Self {
        const WHITE: [(usize, usize); 6] = [(0, 2), (0, 4), (0, 6), (6, 1), (6, 3), (6, 5)];
        const BLACK: [(usize, usize); 6] = [(0, 1), (0, 3), (0, 5), (6, 0), (6, 2), (6, 4)];

        let mask = |squares: &[(usize, usize)]| {
            squares
                .iter()
                .filter_map(|&(column, row)| Square::new(column, row).bit())
                .fold(0, |mask, bit| mask | bit)
        };
        Self {
            white: mask(&WHITE),
            black: mask(&BLACK),
        }
    }

    /// The same position with the two players' pieces exchanged
    pub fn swapped(&self) -> Self {
        Self {
            white: self.black,
            black: self.white,
        }
    }

    /// Bitboard of a player's pieces
    pub fn mask(&self, side: Side) -> u64 {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    /// Bitboard of all occupied squares
    pub fn occupied(&self) -> u64 {
        self.white | self.black
    }

    /// Iterates over a player's squares in bitboard order
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = Square> {
        bitboard::bits(self.mask(side)).map(Square::from_index)
    }

    pub fn piece_count(&self, side: Side) -> usize {
        self.mask(side).count_ones() as usize
    }

    /// The player owning the piece on `square`, if any
    pub fn owner(&self, square: Square) -> Option<Side> {
        let bit = square.bit()?;
        if self.white & bit != 0 {
            Some(Side::White)
        } else if self.black & bit != 0 {
            Some(Side::Black)
        } else {
            None
        }
    }

    /// Lists every legal move for `side`
    ///
    /// Pieces are visited in bitboard order and directions in [`Direction::ALL`]
    /// order, so the result is deterministic.
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        let empty = BOARD_MASK & !self.occupied();
        let mut moves = Vec::with_capacity(4 * self.piece_count(side));
        for from in self.pieces(side) {
            for &direction in Direction::ALL.iter() {
                let to = from.step(direction).and_then(|to| to.bit());
                if to.map_or(false, |bit| bit & empty != 0) {
                    moves.push(Move::new(from, direction));
                }
            }
        }
        moves
    }

    /// Lists every legal move for `side` with the position it leads to
    pub fn successors(&self, side: Side) -> Vec<(Move, State)> {
        self.legal_moves(side)
            .into_iter()
            .filter_map(|mv| {
                let to = mv.destination()?;
                Some((mv, self.play(side, mv.from, to)))
            })
            .collect()
    }

    /// Applies a move, returning the new position
    ///
    /// The moving player is the owner of the piece on the move's origin. An
    /// illegal move is a caller error: moves should come from [`State::legal_moves`].
    pub fn apply(&self, mv: Move) -> Result<State, GameError> {
        let side = self.owner(mv.from).ok_or(GameError::IllegalMove {
            mv,
            reason: "no piece on the origin square",
        })?;
        let to = mv.destination().ok_or(GameError::IllegalMove {
            mv,
            reason: "destination is off the board",
        })?;
        if self.owner(to).is_some() {
            return Err(GameError::IllegalMove {
                mv,
                reason: "destination is occupied",
            });
        }
        Ok(self.play(side, mv.from, to))
    }

    // relocates a piece without checking legality
    fn play(&self, side: Side, from: Square, to: Square) -> State {
        let (from, to) = match (from.bit(), to.bit()) {
            (Some(from), Some(to)) => (from, to),
            _ => return *self,
        };
        let mut next = *self;
        match side {
            Side::White => next.white = (next.white & !from) | to,
            Side::Black => next.black = (next.black & !from) | to,
        }
        next
    }

    /// Does `side` have four pieces in a row, column or diagonal?
    pub fn is_terminal_win(&self, side: Side) -> bool {
        bitboard::has_alignment(self.mask(side))
    }

    /// The player with four in a row, if any
    pub fn winner(&self) -> Option<Side> {
        if self.is_terminal_win(Side::Black) {
            Some(Side::Black)
        } else if self.is_terminal_win(Side::White) {
            Some(Side::White)
        } else {
            None
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::initial()
    }
}

// 'O' for White, 'X' for Black, one comma separated row per line
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..HEIGHT {
            let cells: Vec<&str> = (0..WIDTH)
                .map(|column| match self.owner(Square::new(column, row)) {
                    Some(Side::White) => "O",
                    Some(Side::Black) => "X",
                    None => " ",
                })
                .collect();
            writeln!(f, "{}", cells.join(","))?;
        }
        Ok(())
    }
}
