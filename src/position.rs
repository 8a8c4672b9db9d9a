//! Breakthrough position representation and move execution.
//!
//! This module provides the core game state:
//! - A 64-square board of pawns, row-major from `a1` to `h8`
//! - The ply counter, whose parity gives the side to move
//! - An incrementally maintained Zobrist hash
//! - The compact text format used to exchange positions
//!
//! White starts on ranks 1-2 and moves up the board, Black starts on
//! ranks 7-8 and moves down. A side wins by reaching the opponent's home
//! rank; the game is then over for the side that is to move.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{
    BLACK_HOME_RANK, BOARDSIZE, FEN_PLACEHOLDERS, FILES, N, PAWNS_PER_SIDE, WHITE_HOME_RANK,
};
use crate::zobrist;

/// A square on the board, `a1` = 0 through `h8` = 63.
pub type Square = i8;

/// Contents of a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Piece {
    #[default]
    Empty,
    White,
    Black,
}

impl Piece {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Piece::Empty
    }

    #[inline]
    pub fn is_white(self) -> bool {
        self == Piece::White
    }

    #[inline]
    pub fn is_black(self) -> bool {
        self == Piece::Black
    }

    /// The side owning this pawn, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Piece::Empty => None,
            Piece::White => Some(Side::White),
            Piece::Black => Some(Side::Black),
        }
    }
}

impl From<Side> for Piece {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Piece::White,
            Side::Black => Piece::Black,
        }
    }
}

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// The side to move after `ply` half-moves.
    #[inline]
    pub fn from_ply(ply: u32) -> Side {
        if ply & 1 == 0 { Side::White } else { Side::Black }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// Failure to read a position, move or square from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("unexpected trailing field '{0}'")]
    TrailingField(String),

    #[error("invalid character '{0}' in board layout")]
    InvalidPieceChar(char),

    #[error("rank {0} holds more than 8 squares")]
    RankOverflow(usize),

    #[error("board layout has {0} ranks, expected 8")]
    WrongRankCount(usize),

    #[error("invalid side to move '{0}'")]
    InvalidSide(String),

    #[error("invalid move number '{0}'")]
    InvalidMoveNumber(String),

    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid move '{0}'")]
    InvalidMove(String),
}

/// Build a square from 0-based file and rank.
#[inline]
pub fn square(file: usize, rank: usize) -> Square {
    (rank * N + file) as Square
}

#[inline]
pub fn file_of(sq: Square) -> usize {
    sq as usize % N
}

#[inline]
pub fn rank_of(sq: Square) -> usize {
    sq as usize / N
}

/// Parse a square name such as `e4`. Files are lowercase only.
pub fn parse_square(s: &str) -> Result<Square, ParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(ParseError::InvalidSquare(s.to_string()));
    }
    let file = FILES
        .iter()
        .position(|&f| f == bytes[0])
        .ok_or_else(|| ParseError::InvalidSquare(s.to_string()))?;
    let rank = match bytes[1] {
        b'1'..=b'8' => (bytes[1] - b'1') as usize,
        _ => return Err(ParseError::InvalidSquare(s.to_string())),
    };
    Ok(square(file, rank))
}

/// Name of a square, e.g. `d2`.
pub fn str_square(sq: Square) -> String {
    format!("{}{}", FILES[file_of(sq)] as char, rank_of(sq) + 1)
}

/// A pawn move. Captures are implicit: whatever stood on `target` is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub source: Square,
    pub target: Square,
}

impl Move {
    /// Placeholder move of a search root, which no move produced.
    pub const NONE: Move = Move {
        source: -1,
        target: -1,
    };

    pub const fn new(source: Square, target: Square) -> Self {
        Self { source, target }
    }

    pub fn is_none(&self) -> bool {
        *self == Move::NONE
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        write!(f, "{}{}", str_square(self.source), str_square(self.target))
    }
}

impl FromStr for Move {
    type Err = ParseError;

    /// Parse the four-character form, e.g. `d2e3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 4 || !s.is_ascii() {
            return Err(ParseError::InvalidMove(s.to_string()));
        }
        let source =
            parse_square(&s[..2]).map_err(|_| ParseError::InvalidMove(s.to_string()))?;
        let target =
            parse_square(&s[2..]).map_err(|_| ParseError::InvalidMove(s.to_string()))?;
        Ok(Move::new(source, target))
    }
}

/// A Breakthrough position.
///
/// `Position` is `Copy`: the search clones it freely whenever it needs to
/// explore a continuation without touching the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    squares: [Piece; BOARDSIZE],
    ply: u32,
    hash: u64,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard starting position: two ranks of pawns per side, White to move.
    pub fn new() -> Self {
        let mut squares = [Piece::Empty; BOARDSIZE];
        squares[..PAWNS_PER_SIDE].fill(Piece::White);
        squares[BOARDSIZE - PAWNS_PER_SIDE..].fill(Piece::Black);
        Self {
            squares,
            ply: 0,
            hash: zobrist::hash_squares(&squares),
        }
    }

    /// An empty board at the given ply, for setting up positions by hand.
    pub fn empty(ply: u32) -> Self {
        Self {
            squares: [Piece::Empty; BOARDSIZE],
            ply,
            hash: 0,
        }
    }

    /// Place `piece` on `sq`, replacing its previous content.
    pub fn put(&mut self, sq: Square, piece: Piece) {
        let old = self.squares[sq as usize];
        self.hash ^= zobrist::key(sq, old) ^ zobrist::key(sq, piece);
        self.squares[sq as usize] = piece;
    }

    #[inline]
    pub fn at(&self, sq: Square) -> Piece {
        self.squares[sq as usize]
    }

    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn squares(&self) -> &[Piece; BOARDSIZE] {
        &self.squares
    }

    #[inline]
    pub fn side_to_move(&self) -> Side {
        Side::from_ply(self.ply)
    }

    /// Play a move without any legality check.
    ///
    /// The pawn on `source` replaces whatever stands on `target`. Only feed
    /// moves produced by [`MoveGen`](crate::movegen::MoveGen).
    pub fn play(&mut self, mv: Move) {
        let mover = self.squares[mv.source as usize];
        let captured = self.squares[mv.target as usize];

        self.hash ^= zobrist::key(mv.source, mover);
        self.hash ^= zobrist::key(mv.target, captured);
        self.hash ^= zobrist::key(mv.target, mover);

        self.squares[mv.target as usize] = mover;
        self.squares[mv.source as usize] = Piece::Empty;
        self.ply += 1;
    }

    /// Whether the previous move broke through, ending the game.
    pub fn is_terminal(&self) -> bool {
        match self.side_to_move() {
            Side::Black => self.rank(BLACK_HOME_RANK).iter().any(|p| p.is_white()),
            Side::White => self.rank(WHITE_HOME_RANK).iter().any(|p| p.is_black()),
        }
    }

    /// Whether the side to move has lost, either to a breakthrough or
    /// because none of its pawns are left.
    ///
    /// A side with at least one pawn always has a move: its most advanced
    /// pawn can step diagonally, so this matches "no moves left".
    pub fn is_over(&self) -> bool {
        self.is_terminal() || !self.squares.contains(&Piece::from(self.side_to_move()))
    }

    /// The winning side, if the game is over.
    pub fn winner(&self) -> Option<Side> {
        self.is_over().then(|| self.side_to_move().opponent())
    }

    fn rank(&self, rank: usize) -> &[Piece] {
        &self.squares[rank * N..(rank + 1) * N]
    }

    /// Serialize to the compact text format.
    ///
    /// Ranks go from White's home rank up. Empty squares before a pawn are
    /// counted with a digit; empty squares at the end of a rank are left
    /// implicit.
    pub fn fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in 0..N {
            let mut empty = 0;
            for &piece in self.rank(rank) {
                let ch = match piece {
                    Piece::Empty => {
                        empty += 1;
                        continue;
                    }
                    Piece::White => 'P',
                    Piece::Black => 'p',
                };
                if empty > 0 {
                    out.push(char::from(b'0' + empty));
                    empty = 0;
                }
                out.push(ch);
            }
            if rank + 1 < N {
                out.push('/');
            }
        }
        let side = match self.side_to_move() {
            Side::White => 'w',
            Side::Black => 'b',
        };
        out.push(' ');
        out.push(side);
        out.push(' ');
        out.push_str(FEN_PLACEHOLDERS);
        out.push(' ');
        out.push_str(&(self.ply / 2 + 1).to_string());
        out
    }

    /// Parse a position written by [`Position::fen`].
    ///
    /// Fully padded ranks (`8`, `3P4`) are accepted as well.
    pub fn from_fen(fen: &str) -> Result<Self, ParseError> {
        let mut fields = fen.split_whitespace();
        let board = fields.next().ok_or(ParseError::MissingField("board"))?;
        let side = fields.next().ok_or(ParseError::MissingField("side to move"))?;
        for name in ["castling", "en passant", "halfmove clock"] {
            fields.next().ok_or(ParseError::MissingField(name))?;
        }
        let fullmove = fields.next().ok_or(ParseError::MissingField("fullmove number"))?;
        if let Some(extra) = fields.next() {
            return Err(ParseError::TrailingField(extra.to_string()));
        }

        let black_to_move = match side {
            "w" => false,
            "b" => true,
            _ => return Err(ParseError::InvalidSide(side.to_string())),
        };
        let ply = fullmove
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| n.checked_add(black_to_move as u32))
            .ok_or_else(|| ParseError::InvalidMoveNumber(fullmove.to_string()))?;

        let mut pos = Position::empty(ply);
        parse_board(board, &mut pos)?;
        Ok(pos)
    }
}

fn parse_board(board: &str, pos: &mut Position) -> Result<(), ParseError> {
    let mut rank = 0;
    let mut file = 0;
    for ch in board.chars() {
        match ch {
            '/' => {
                rank += 1;
                if rank >= N {
                    return Err(ParseError::WrongRankCount(rank + 1));
                }
                file = 0;
            }
            'P' | 'p' => {
                if file >= N {
                    return Err(ParseError::RankOverflow(rank + 1));
                }
                let piece = if ch == 'P' { Piece::White } else { Piece::Black };
                pos.put(square(file, rank), piece);
                file += 1;
            }
            '1'..='8' => {
                file += ch as usize - '0' as usize;
                if file > N {
                    return Err(ParseError::RankOverflow(rank + 1));
                }
            }
            _ => return Err(ParseError::InvalidPieceChar(ch)),
        }
    }
    if rank + 1 != N {
        return Err(ParseError::WrongRankCount(rank + 1));
    }
    Ok(())
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..N).rev() {
            write!(f, "{} ", rank + 1)?;
            for &piece in self.rank(rank) {
                let ch = match piece {
                    Piece::White => 'P',
                    Piece::Black => 'p',
                    Piece::Empty => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for &file in FILES {
            write!(f, "{} ", file as char)?;
        }
        writeln!(f)
    }
}
