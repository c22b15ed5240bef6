//! Piece-placement parsing into an 8x8 board grid
//!
//! Only the first field of a FEN record is meaningful here. Side to move,
//! castling rights, en-passant square and move counters are accepted in the
//! input and discarded. Legality of the position is never checked.

use std::fmt;
use thiserror::Error;

/// Number of ranks and files on the board
pub const BOARD_SIZE: usize = 8;

/// The standard opening position as a full FEN record
pub const STARTING_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Longest prefix of the input repeated in an error message
const ECHO_LIMIT: usize = 32;

/// Error type for placement parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing left after trimming and cutting off the trailing FEN fields
    #[error("empty position string")]
    Empty,
    /// A character outside `RNBQKP`, `rnbqkp`, `1`-`8` and `/`. `input`
    /// holds at most the first 32 characters of the placement field.
    #[error("invalid character '{found}' in position '{input}'")]
    InvalidCharacter { input: String, found: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Map a placement letter (either case) to a kind
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Lowercase placement letter
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    White,
    Black,
}

impl PieceColor {
    /// Single-letter prefix used in sprite file names (`w` / `b`)
    pub fn prefix(self) -> char {
        match self {
            PieceColor::White => 'w',
            PieceColor::Black => 'b',
        }
    }
}

/// A piece on the board: kind plus color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: PieceColor,
}

impl Piece {
    pub fn new(kind: PieceKind, color: PieceColor) -> Self {
        Self { kind, color }
    }

    /// Decode a placement letter; uppercase is white, lowercase is black.
    pub fn from_letter(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() { PieceColor::White } else { PieceColor::Black };
        Some(Self { kind, color })
    }

    /// Placement letter for this piece, cased by color
    pub fn letter(self) -> char {
        match self.color {
            PieceColor::White => self.kind.letter().to_ascii_uppercase(),
            PieceColor::Black => self.kind.letter(),
        }
    }

    /// Every piece, white first
    pub fn all() -> impl Iterator<Item = Piece> {
        [PieceColor::White, PieceColor::Black]
            .into_iter()
            .flat_map(|color| PieceKind::ALL.into_iter().map(move |kind| Piece::new(kind, color)))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = match self.color {
            PieceColor::White => "white",
            PieceColor::Black => "black",
        };
        let kind = match self.kind {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        write!(f, "{} {}", color, kind)
    }
}

/// A square is either empty or holds one piece
pub type Cell = Option<Piece>;

/// Decoded board: `ranks[0]` is the top rank as written in the string,
/// `ranks[r][0]` the leftmost file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGrid {
    ranks: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    placement: String,
}

impl BoardGrid {
    /// An empty board
    pub fn empty() -> Self {
        Self { ranks: [[None; BOARD_SIZE]; BOARD_SIZE], placement: "8/8/8/8/8/8/8/8".to_string() }
    }

    /// Parse the piece-placement field of a position string.
    ///
    /// The input is trimmed and cut at the first whitespace, so full FEN
    /// records are accepted. Parsing is lenient about structure:
    ///
    /// - missing or empty rank tokens are empty ranks (`"////////"` is an empty board)
    /// - rank tokens after the eighth are ignored
    /// - a rank is capped at eight files; tokens past the last file are ignored
    ///
    /// # Examples
    ///
    /// ```
    /// use mfen::board::{BoardGrid, Piece, PieceColor, PieceKind};
    ///
    /// let grid = BoardGrid::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    /// assert_eq!(grid.cell(0, 4), Some(Piece::new(PieceKind::King, PieceColor::Black)));
    /// assert_eq!(grid.cell(7, 4), Some(Piece::new(PieceKind::King, PieceColor::White)));
    /// assert_eq!(grid.placement(), "4k3/8/8/8/8/8/8/4K3");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidCharacter` for anything but piece letters,
    /// digits `1`-`8` and `/`, and `ParseError::Empty` for blank input.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let placement = placement_field(raw);
        if placement.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(found) = placement.chars().find(|&c| !is_placement_char(c)) {
            return Err(ParseError::InvalidCharacter { input: echo(placement), found });
        }

        let mut ranks = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (rank, token) in placement.split('/').take(BOARD_SIZE).enumerate() {
            let mut file = 0usize;
            for c in token.chars() {
                if file >= BOARD_SIZE {
                    break;
                }
                if let Some(run) = c.to_digit(10) {
                    file += run as usize;
                } else if let Some(piece) = Piece::from_letter(c) {
                    ranks[rank][file] = Some(piece);
                    file += 1;
                }
            }
        }

        Ok(Self { ranks, placement: placement.to_string() })
    }

    /// Cell at `(rank, file)`; out-of-range coordinates read as empty.
    pub fn cell(&self, rank: usize, file: usize) -> Cell {
        self.ranks.get(rank).and_then(|r| r.get(file)).copied().flatten()
    }

    /// Rows of cells, top rank first
    pub fn ranks(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.ranks
    }

    /// Iterate over occupied squares as `(rank, file, piece)`
    pub fn pieces(&self) -> impl Iterator<Item = (usize, usize, Piece)> + '_ {
        self.ranks.iter().enumerate().flat_map(|(rank, cells)| {
            cells.iter().enumerate().filter_map(move |(file, cell)| cell.map(|p| (rank, file, p)))
        })
    }

    /// The placement field this grid was parsed from (trimmed, trailing
    /// FEN fields removed).
    pub fn placement(&self) -> &str {
        &self.placement
    }

    /// Re-encode the grid in compressed rank notation.
    ///
    /// Runs of empty squares are always folded into a single digit, so the
    /// result can differ byte-wise from the parsed input while denoting the
    /// same grid.
    pub fn to_placement(&self) -> String {
        let mut out = String::with_capacity(71);
        for (i, rank) in self.ranks.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            let mut empty = 0u8;
            for cell in rank {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.letter());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
        }
        out
    }
}

impl Default for BoardGrid {
    fn default() -> Self {
        Self::empty()
    }
}

fn placement_field(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.split(char::is_whitespace).next().unwrap_or("")
}

/// Input as quoted in error messages, cut to `ECHO_LIMIT` characters
fn echo(placement: &str) -> String {
    match placement.char_indices().nth(ECHO_LIMIT) {
        Some((end, _)) => format!("{}...", &placement[..end]),
        None => placement.to_string(),
    }
}

fn is_placement_char(c: char) -> bool {
    matches!(c, '1'..='8' | '/') || PieceKind::from_letter(c).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(c: char) -> Cell {
        Piece::from_letter(c)
    }

    #[test]
    fn test_parse_starting_position() {
        let grid = BoardGrid::parse(STARTING_POSITION).unwrap();
        assert_eq!(grid.placement(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");

        assert_eq!(grid.cell(0, 0), piece('r'));
        assert_eq!(grid.cell(0, 3), piece('q'));
        assert_eq!(grid.cell(0, 4), piece('k'));
        assert_eq!(grid.cell(1, 7), piece('p'));
        assert_eq!(grid.cell(6, 0), piece('P'));
        assert_eq!(grid.cell(7, 4), piece('K'));
        for rank in 2..6 {
            for file in 0..BOARD_SIZE {
                assert_eq!(grid.cell(rank, file), None);
            }
        }
        assert_eq!(grid.pieces().count(), 32);
    }

    #[test]
    fn test_letter_case_sets_color() {
        let white = Piece::from_letter('N').unwrap();
        let black = Piece::from_letter('n').unwrap();
        assert_eq!(white, Piece::new(PieceKind::Knight, PieceColor::White));
        assert_eq!(black, Piece::new(PieceKind::Knight, PieceColor::Black));
        assert_eq!(white.letter(), 'N');
        assert_eq!(black.letter(), 'n');
    }

    #[test]
    fn test_digit_runs() {
        let grid = BoardGrid::parse("2p4p/8/8/8/8/8/8/8").unwrap();
        assert_eq!(grid.cell(0, 0), None);
        assert_eq!(grid.cell(0, 1), None);
        assert_eq!(grid.cell(0, 2), piece('p'));
        assert_eq!(grid.cell(0, 6), None);
        assert_eq!(grid.cell(0, 7), piece('p'));
    }

    #[test]
    fn test_trailing_fields_are_discarded() {
        let a = BoardGrid::parse("8/8/8/8/8/8/8/K7 b - e3 12 40").unwrap();
        let b = BoardGrid::parse("  8/8/8/8/8/8/8/K7  ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.placement(), "8/8/8/8/8/8/8/K7");
    }

    #[test]
    fn test_slashes_only_is_empty_board() {
        let grid = BoardGrid::parse("////////").unwrap();
        assert_eq!(grid.pieces().count(), 0);
        assert_eq!(grid.to_placement(), "8/8/8/8/8/8/8/8");

        let grid = BoardGrid::parse("/").unwrap();
        assert_eq!(grid.pieces().count(), 0);
    }

    #[test]
    fn test_missing_ranks_are_empty() {
        let grid = BoardGrid::parse("k7/K7").unwrap();
        assert_eq!(grid.cell(0, 0), piece('k'));
        assert_eq!(grid.cell(1, 0), piece('K'));
        assert_eq!(grid.pieces().count(), 2);
    }

    #[test]
    fn test_rank_overflow_is_capped() {
        let grid = BoardGrid::parse("44k/8/8/8/8/8/8/8").unwrap();
        assert_eq!(grid.pieces().count(), 0);

        let grid = BoardGrid::parse("RNBQKBNRQQ/8/8/8/8/8/8/8").unwrap();
        assert_eq!(grid.cell(0, 7), piece('R'));
        assert_eq!(grid.pieces().count(), 8);
    }

    #[test]
    fn test_extra_ranks_are_ignored() {
        let grid = BoardGrid::parse("8/8/8/8/8/8/8/8/KKKKKKKK").unwrap();
        assert_eq!(grid.pieces().count(), 0);
    }

    #[test]
    fn test_invalid_characters() {
        let err = BoardGrid::parse("xxxxxxxx/8/8/8/8/8/8/8").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidCharacter { input: "xxxxxxxx/8/8/8/8/8/8/8".to_string(), found: 'x' }
        );
        assert!(matches!(BoardGrid::parse("9/8/8/8/8/8/8/8"), Err(ParseError::InvalidCharacter { found: '9', .. })));
        assert!(matches!(BoardGrid::parse("0/8"), Err(ParseError::InvalidCharacter { found: '0', .. })));
    }

    #[test]
    fn test_invalid_character_message_is_bounded() {
        let long = format!("x{}", "8".repeat(4200));
        match BoardGrid::parse(&long).unwrap_err() {
            ParseError::InvalidCharacter { input, found } => {
                assert_eq!(found, 'x');
                assert_eq!(input, format!("x{}...", "8".repeat(31)));
            }
            other => panic!("expected invalid character, got {:?}", other),
        }

        // Exactly at the limit nothing is cut
        let at_limit = format!("{}x", "8".repeat(31));
        assert!(matches!(
            BoardGrid::parse(&at_limit),
            Err(ParseError::InvalidCharacter { input, .. }) if input == at_limit
        ));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(BoardGrid::parse(""), Err(ParseError::Empty));
        assert_eq!(BoardGrid::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_to_placement_reparses_to_same_grid() {
        let inputs = [
            STARTING_POSITION,
            "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
            "8/8/8/8/8/8/8/8",
            "11111111/8/8/8/8/8/8/7k",
            "4k3/8/3K4/8/8/8/8/8",
        ];
        for input in inputs {
            let grid = BoardGrid::parse(input).unwrap();
            let again = BoardGrid::parse(&grid.to_placement()).unwrap();
            assert_eq!(grid.ranks(), again.ranks(), "round trip of {}", input);
        }
        let grid = BoardGrid::parse("11111111/8/8/8/8/8/8/7k").unwrap();
        assert_eq!(grid.to_placement(), "8/8/8/8/8/8/8/7k");
    }

    #[test]
    fn test_all_pieces() {
        let all: Vec<Piece> = Piece::all().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].color, PieceColor::White);
        assert_eq!(all[11], Piece::new(PieceKind::King, PieceColor::Black));
    }
}
