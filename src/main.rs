// src/main.rs
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use rand::{SeedableRng, RngCore};
use rand::rngs::StdRng;
use lazy_static::lazy_static;
use regex::Regex;

// --- Constants ---
const DEFAULT_STATS_FILENAME: &str = "chessboard_session.json";

/// Back-rank piece order, left to right from the a-file.
const BACK_RANK_ORDER: [PieceType; 8] = [
    PieceType::Rook, PieceType::Knight, PieceType::Bishop, PieceType::Queen,
    PieceType::King, PieceType::Bishop, PieceType::Knight, PieceType::Rook,
];

// --- Enums and Basic Structs ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
enum Color { White, Black }

impl Color {
    fn opponent(&self) -> Color {
        match self { Color::White => Color::Black, Color::Black => Color::White }
    }

    /// Row the pawns of this color start on.
    fn pawn_home_row(&self) -> u8 {
        match self { Color::White => 6, Color::Black => 1 }
    }

    /// Direction of pawn travel along the row axis. White advances toward
    /// row 0, black toward row 7.
    fn pawn_direction(&self) -> i8 {
        match self { Color::White => -1, Color::Black => 1 }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
enum PieceType { Pawn, Knight, Bishop, Rook, Queen, King }

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
struct Piece {
    kind: PieceType,
    color: Color,
}

impl Piece {
    fn new(kind: PieceType, color: Color) -> Self { Piece { kind, color } }

    fn value(&self) -> u32 {
        match self.kind {
            PieceType::Pawn => 1, PieceType::Knight => 3, PieceType::Bishop => 3,
            PieceType::Rook => 5, PieceType::Queen => 9, PieceType::King => 0,
        }
    }

    #[allow(dead_code)] // Handy for setting up positions (e.g., in tests)
    fn from_char(c: char) -> Option<Self> {
        let color = if c.is_uppercase() { Color::White } else { Color::Black };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn, 'n' => PieceType::Knight, 'b' => PieceType::Bishop,
            'r' => PieceType::Rook, 'q' => PieceType::Queen, 'k' => PieceType::King,
            _ => return None,
        };
        Some(Piece::new(kind, color))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.kind {
            PieceType::Pawn => 'p', PieceType::Knight => 'n', PieceType::Bishop => 'b',
            PieceType::Rook => 'r', PieceType::Queen => 'q', PieceType::King => 'k',
        };
        let symbol = match self.color {
            Color::White => symbol.to_ascii_uppercase(),
            Color::Black => symbol,
        };
        write!(f, "{}", symbol)
    }
}

/// A board coordinate. Row 0 is the top of the board (black's back rank),
/// row 7 the bottom (white's back rank); columns run left to right from
/// the a-file. Both components are guaranteed in range by construction.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    fn new(row: i8, col: i8) -> Result<Square, MoveError> {
        if !(0..8).contains(&row) || !(0..8).contains(&col) {
            return Err(MoveError::OutOfRange { row, col });
        }
        Ok(Square { row: row as u8, col: col as u8 })
    }

    /// Parses algebraic notation (e.g. "e4") into a square. Accepts
    /// uppercase files.
    fn from_algebraic(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file_char = chars.next()?.to_ascii_lowercase();
        let rank_char = chars.next()?;
        if chars.next().is_some() { return None; }
        let col = match file_char { 'a'..='h' => file_char as u8 - b'a', _ => return None };
        let row = match rank_char { '1'..='8' => 7 - (rank_char as u8 - b'1'), _ => return None };
        Some(Square { row, col })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_char = (b'a' + self.col) as char;
        let rank_char = (b'1' + (7 - self.row)) as char;
        write!(f, "{}{}", file_char, rank_char)
    }
}

/// A proposed move: origin and destination squares.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
struct Move {
    from: Square,
    to: Square,
}

impl Move {
    fn new(from: Square, to: Square) -> Self { Move { from, to } }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

// --- Board State ---

/// An 8x8 mailbox board. The grid is the single source of truth for
/// occupancy: every legality check reads it and nothing else.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    fn empty() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    /// Creates the standard chess starting position.
    fn starting_position() -> Self {
        let mut board = Board::empty();
        for col in 0..8 {
            board.squares[0][col] = Some(Piece::new(BACK_RANK_ORDER[col], Color::Black));
            board.squares[1][col] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board.squares[6][col] = Some(Piece::new(PieceType::Pawn, Color::White));
            board.squares[7][col] = Some(Piece::new(BACK_RANK_ORDER[col], Color::White));
        }
        board
    }

    #[inline(always)]
    fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row as usize][sq.col as usize]
    }

    /// Places a piece, returning whatever previously occupied the square.
    fn set_piece_at(&mut self, sq: Square, piece: Piece) -> Option<Piece> {
        self.squares[sq.row as usize][sq.col as usize].replace(piece)
    }

    /// Empties a square, returning the removed piece (if any).
    fn clear_square(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.row as usize][sq.col as usize].take()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for row in 0..8u8 {
            write!(f, "{} | ", 8 - row)?;
            for col in 0..8u8 {
                match self.squares[row as usize][col as usize] {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}

// --- Move Validation ---
//
// The validator is a pure predicate over a board snapshot: no side
// effects, no board mutation, no state of its own. It may be called from
// any number of threads against a shared snapshot; the caller owns the
// board exclusively while applying an accepted move.

/// Decides whether moving `piece` from `from` to `to` is legal for the
/// player `active`, given the board snapshot.
///
/// Contract violations (the board does not record `piece` at `from`)
/// surface as errors; every in-contract input maps to a plain legal or
/// illegal verdict. Turn order is enforced here: a piece that does not
/// belong to `active` is never legal to move.
fn is_valid_move(
    board: &Board,
    active: Color,
    piece: Piece,
    from: Square,
    to: Square,
) -> Result<bool, MoveError> {
    // The caller and the board must agree on what is being moved.
    match board.piece_at(from) {
        Some(found) if found == piece => {}
        _ => return Err(MoveError::OriginMismatch { square: from }),
    }

    // Not this player's piece, not this player's move.
    if piece.color != active {
        return Ok(false);
    }

    // A move must displace the piece. This also rules out the degenerate
    // king "move" to its own square.
    if from == to {
        return Ok(false);
    }

    // No capturing your own pieces, regardless of piece kind or path.
    if let Some(target) = board.piece_at(to) {
        if target.color == piece.color {
            return Ok(false);
        }
    }

    // Piece-specific geometry and obstruction. Each rule can assume the
    // checks above already passed.
    let legal = match piece.kind {
        PieceType::Pawn => is_valid_pawn_move(board, piece.color, from, to),
        PieceType::Rook => is_valid_rook_move(board, from, to),
        PieceType::Knight => is_valid_knight_move(from, to),
        PieceType::Bishop => is_valid_bishop_move(board, from, to),
        PieceType::Queen => is_valid_queen_move(board, from, to),
        PieceType::King => is_valid_king_move(from, to),
    };
    Ok(legal)
}

/// Pawn movement: one step forward onto an empty square, two steps from
/// the home row with both squares ahead empty, or a one-step diagonal
/// capture. No en passant, no promotion.
fn is_valid_pawn_move(board: &Board, color: Color, from: Square, to: Square) -> bool {
    let direction = color.pawn_direction();
    let row_diff = to.row as i8 - from.row as i8;
    let col_diff = (to.col as i8 - from.col as i8).abs();

    // Single forward step.
    if col_diff == 0 && row_diff == direction && board.piece_at(to).is_none() {
        return true;
    }

    // Double step from the home row. The skipped square must be empty as
    // well as the destination: a pawn cannot jump over a blocker.
    if col_diff == 0 && from.row == color.pawn_home_row() && row_diff == 2 * direction {
        let skipped = Square {
            row: (from.row as i8 + direction) as u8,
            col: from.col,
        };
        return board.piece_at(skipped).is_none() && board.piece_at(to).is_none();
    }

    // Diagonal capture. Any occupant here is an opposing piece; captures
    // of the mover's own pieces were filtered before dispatch.
    if col_diff == 1 && row_diff == direction {
        return board.piece_at(to).is_some();
    }

    false
}

/// Rook movement: a straight line along a row or column with nothing in
/// the way.
fn is_valid_rook_move(board: &Board, from: Square, to: Square) -> bool {
    if from.row != to.row && from.col != to.col {
        return false;
    }
    path_is_clear(board, from, to)
}

/// Knight movement: an L-shape, two squares on one axis and one on the
/// other. Knights jump, so occupancy along the way is irrelevant.
fn is_valid_knight_move(from: Square, to: Square) -> bool {
    let row_diff = (to.row as i8 - from.row as i8).abs();
    let col_diff = (to.col as i8 - from.col as i8).abs();
    (row_diff == 2 && col_diff == 1) || (row_diff == 1 && col_diff == 2)
}

/// Bishop movement: a diagonal line with nothing in the way.
fn is_valid_bishop_move(board: &Board, from: Square, to: Square) -> bool {
    let row_diff = (to.row as i8 - from.row as i8).abs();
    let col_diff = (to.col as i8 - from.col as i8).abs();
    if row_diff != col_diff {
        return false;
    }
    path_is_clear(board, from, to)
}

/// Queen movement: rook or bishop movement from the same squares.
fn is_valid_queen_move(board: &Board, from: Square, to: Square) -> bool {
    is_valid_rook_move(board, from, to) || is_valid_bishop_move(board, from, to)
}

/// King movement: at most one square on each axis. The zero-displacement
/// case is rejected before dispatch.
fn is_valid_king_move(from: Square, to: Square) -> bool {
    let row_diff = (to.row as i8 - from.row as i8).abs();
    let col_diff = (to.col as i8 - from.col as i8).abs();
    row_diff <= 1 && col_diff <= 1
}

/// Walks the straight or diagonal ray from `from` toward `to`, one square
/// at a time, and reports whether every intermediate square is empty. The
/// destination itself is not inspected; capture rules are decided by the
/// caller. Expects the two squares to share a row, column, or diagonal.
fn path_is_clear(board: &Board, from: Square, to: Square) -> bool {
    let row_step = (to.row as i8 - from.row as i8).signum();
    let col_step = (to.col as i8 - from.col as i8).signum();

    let mut row = from.row as i8 + row_step;
    let mut col = from.col as i8 + col_step;
    while (row, col) != (to.row as i8, to.col as i8) {
        if board.squares[row as usize][col as usize].is_some() {
            return false; // Blocked by another piece
        }
        row += row_step;
        col += col_step;
    }
    true
}

// --- Game State ---

/// Per-side tally of move attempts for the session summary.
#[derive(Debug, Serialize, Default, Clone, Copy, PartialEq, Eq)]
struct MoveTally {
    accepted: u32,
    rejected: u32,
}

/// What happened when a move was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MoveOutcome {
    piece: Piece,
    captured: Option<Piece>,
}

/// Owns the canonical board and the active player. All board mutation
/// happens here, and only after the validator accepts a move.
#[derive(Debug)]
struct Game {
    board: Board,
    active: Color,
    captured_by_white: Vec<Piece>, // Black pieces taken by White
    captured_by_black: Vec<Piece>, // White pieces taken by Black
    white_tally: MoveTally,
    black_tally: MoveTally,
    session_start: Instant,
}

impl Game {
    fn new() -> Self {
        Game {
            board: Board::starting_position(),
            active: Color::White,
            captured_by_white: Vec::new(),
            captured_by_black: Vec::new(),
            white_tally: MoveTally::default(),
            black_tally: MoveTally::default(),
            session_start: Instant::now(),
        }
    }

    /// Discards the current position and starts over from the standard
    /// starting position, white to move.
    fn reset(&mut self) {
        *self = Game::new();
    }

    fn tally_mut(&mut self) -> &mut MoveTally {
        match self.active {
            Color::White => &mut self.white_tally,
            Color::Black => &mut self.black_tally,
        }
    }

    /// Attempts a move for the active player. On acceptance the origin
    /// square is cleared, the piece lands on the destination (returning
    /// any captured piece), and the turn passes to the opponent; this is
    /// the only place the board changes. Rejected moves leave the board
    /// and the turn untouched.
    pub fn try_move(&mut self, mv: Move) -> Result<MoveOutcome, MoveError> {
        let piece = match self.board.piece_at(mv.from) {
            Some(piece) => piece,
            None => {
                self.tally_mut().rejected += 1;
                return Err(MoveError::EmptyOrigin { square: mv.from });
            }
        };

        if !is_valid_move(&self.board, self.active, piece, mv.from, mv.to)? {
            self.tally_mut().rejected += 1;
            return Err(MoveError::IllegalMove { from: mv.from, to: mv.to });
        }

        self.board.clear_square(mv.from);
        let captured = self.board.set_piece_at(mv.to, piece);
        if let Some(captured_piece) = captured {
            match self.active {
                Color::White => self.captured_by_white.push(captured_piece),
                Color::Black => self.captured_by_black.push(captured_piece),
            }
        }
        self.tally_mut().accepted += 1;
        self.active = self.active.opponent();

        Ok(MoveOutcome { piece, captured })
    }

    /// Lists every destination the validator accepts for the piece on
    /// `from`, given the current turn. A piece of the waiting player has
    /// no legal destinations until the turn comes back around.
    pub fn legal_destinations(&self, from: Square) -> Result<Vec<Square>, MoveError> {
        let piece = self.board.piece_at(from)
            .ok_or(MoveError::EmptyOrigin { square: from })?;

        let mut destinations = Vec::new();
        for row in 0..8 {
            for col in 0..8 {
                let to = Square { row, col };
                if let Ok(true) = is_valid_move(&self.board, self.active, piece, from, to) {
                    destinations.push(to);
                }
            }
        }
        Ok(destinations)
    }

    /// Picks a random legal move for the active player, if one exists.
    pub fn hint(&self) -> Option<Move> {
        let mut candidates = Vec::new();
        for row in 0..8 {
            for col in 0..8 {
                let from = Square { row, col };
                match self.board.piece_at(from) {
                    Some(piece) if piece.color == self.active => {}
                    _ => continue,
                }
                if let Ok(destinations) = self.legal_destinations(from) {
                    candidates.extend(destinations.into_iter().map(|to| Move::new(from, to)));
                }
            }
        }
        if candidates.is_empty() {
            return None;
        }
        let mut rng = StdRng::from_os_rng();
        let pick = (rng.next_u64() % candidates.len() as u64) as usize;
        Some(candidates[pick])
    }

    // --- Session Summary Generation and Saving ---

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            white: self.white_tally,
            black: self.black_tally,
            captures_by_white: self.captured_by_white.iter().map(Piece::to_string).collect(),
            captures_by_black: self.captured_by_black.iter().map(Piece::to_string).collect(),
            session_duration: self.session_start.elapsed(),
            to_move: self.active,
        }
    }

    /// Saves the session summary to a JSON file.
    pub fn save_summary_to_file(&self, filename: &str) -> Result<(), SaveLoadError> {
        let summary = self.summary();

        let json_data = serde_json::to_string_pretty(&summary)
            .map_err(SaveLoadError::Serialization)?;

        fs::write(filename, json_data)
            .map_err(|e| SaveLoadError::Io(filename.to_string(), e))?;

        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Captured by White: ")?;
        let mut sorted_capt_w = self.captured_by_white.clone();
        sorted_capt_w.sort_by_key(|p| p.value());
        for piece in sorted_capt_w { write!(f, "{} ", piece)?; }
        writeln!(f)?;

        write!(f, "Captured by Black: ")?;
        let mut sorted_capt_b = self.captured_by_black.clone();
        sorted_capt_b.sort_by_key(|p| p.value());
        for piece in sorted_capt_b { write!(f, "{} ", piece)?; }
        writeln!(f)?;

        writeln!(f, "Session time: {}", format_duration(self.session_start.elapsed()))?;
        writeln!(f, "---------------------")?;
        writeln!(f, "{}", self.board)?;
        write!(f, "Turn: {:?}", self.active)
    }
}

// --- Custom Error Types ---

#[derive(Debug)]
pub enum MoveError {
    InvalidFormat(String),
    OutOfRange { row: i8, col: i8 },
    EmptyOrigin { square: Square },
    OriginMismatch { square: Square },
    IllegalMove { from: Square, to: Square },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::InvalidFormat(input) => write!(f, "Invalid move format: '{}'. Use origin and destination squares, like 'e2e4' or 'e2-e4'.", input),
            MoveError::OutOfRange { row, col } => write!(f, "Coordinates ({}, {}) are off the board.", row, col),
            MoveError::EmptyOrigin { square } => write!(f, "No piece on {}.", square),
            MoveError::OriginMismatch { square } => write!(f, "Board state mismatch: the piece to move is not on {}.", square),
            MoveError::IllegalMove { from, to } => write!(f, "Illegal move: {} to {} is not allowed for that piece right now.", from, to),
        }
    }
}
impl Error for MoveError {}

#[derive(Debug)]
pub enum CommandError {
    UnknownCommand(String),
    InvalidArgument(String),
    SaveLoadError(SaveLoadError),
    IoError(io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(cmd) => write!(f, "Unknown command: '{}'. Type 'help' for commands.", cmd),
            CommandError::InvalidArgument(arg) => write!(f, "Invalid argument: '{}'", arg),
            CommandError::SaveLoadError(e) => write!(f, "Summary Save Error: {}", e),
            CommandError::IoError(e) => write!(f, "Input/Output error: {}", e),
        }
    }
}
impl Error for CommandError {}

impl From<SaveLoadError> for CommandError {
    fn from(e: SaveLoadError) -> Self { CommandError::SaveLoadError(e) }
}
impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self { CommandError::IoError(e) }
}
impl From<MoveError> for CommandError {
    fn from(e: MoveError) -> Self {
        CommandError::InvalidArgument(format!("{}", e))
    }
}

#[derive(Debug)]
pub enum SaveLoadError {
    Serialization(serde_json::Error),
    Io(String, io::Error),
}

impl fmt::Display for SaveLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveLoadError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SaveLoadError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}
impl Error for SaveLoadError {}

// --- Session Summary ---

#[derive(Debug, Serialize)]
struct SessionSummary {
    white: MoveTally,
    black: MoveTally,
    captures_by_white: Vec<String>,
    captures_by_black: Vec<String>,
    session_duration: Duration,
    to_move: Color,
}

// --- Input Parsing ---

lazy_static! {
    // Accepts "e2e4", "e2-e4", "e2xe4", "e2 e4", "e2 to e4", any case.
    static ref MOVE_RE: Regex =
        Regex::new(r"(?i)^([a-h][1-8])\s*(?:->|-|x|to)?\s*([a-h][1-8])$").unwrap();
}

#[derive(Debug, PartialEq, Eq)]
enum UserInput {
    Move(Move),
    Command(Command),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Moves(Square),
    Hint,
    Board,
    New,
    SaveStats(String),
    Help,
    Quit,
}

/// Parses user input into a UserInput variant or returns a CommandError.
fn parse_user_input(input: &str) -> Result<UserInput, CommandError> {
    let trimmed_input = input.trim();

    // Check for commands (split once for efficiency)
    let mut parts = trimmed_input.splitn(2, char::is_whitespace);
    let command_word = parts.next().unwrap_or("").to_lowercase();
    let argument = parts.next().unwrap_or("").trim();

    match command_word.as_str() {
        "moves" => {
            let square = Square::from_algebraic(argument)
                .ok_or_else(|| CommandError::InvalidArgument(
                    format!("'moves' needs a square, e.g. 'moves e2'; got '{}'", argument)))?;
            return Ok(UserInput::Command(Command::Moves(square)));
        }
        "hint" => return Ok(UserInput::Command(Command::Hint)),
        "board" => return Ok(UserInput::Command(Command::Board)),
        "new" | "reset" => return Ok(UserInput::Command(Command::New)),
        "savestats" => {
            let filename = if argument.is_empty() { DEFAULT_STATS_FILENAME } else { argument }.to_string();
            return Ok(UserInput::Command(Command::SaveStats(filename)));
        }
        "help" | "?" => return Ok(UserInput::Command(Command::Help)),
        "quit" | "exit" => return Ok(UserInput::Command(Command::Quit)),
        _ => {} // Not a recognized command word, try parsing as a move
    }

    match parse_move_text(trimmed_input) {
        Ok(mv) => Ok(UserInput::Move(mv)),
        // A lone word that is neither a command nor a move reads better
        // as an unknown command than as a malformed move.
        Err(_) if argument.is_empty() && command_word.len() > 2
            && command_word.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Err(CommandError::UnknownCommand(command_word))
        }
        Err(move_err) => Err(CommandError::InvalidArgument(
            format!("Invalid input '{}': {}", trimmed_input, move_err))),
    }
}

/// Parses move text like "e2e4" or "e2-e4" into a Move. Does NOT check
/// legality, only format.
fn parse_move_text(input: &str) -> Result<Move, MoveError> {
    let trimmed = input.trim();
    let caps = MOVE_RE.captures(trimmed)
        .ok_or_else(|| MoveError::InvalidFormat(trimmed.to_string()))?;

    // The regex constrains both captures to valid squares.
    let from = Square::from_algebraic(&caps[1])
        .ok_or_else(|| MoveError::InvalidFormat(trimmed.to_string()))?;
    let to = Square::from_algebraic(&caps[2])
        .ok_or_else(|| MoveError::InvalidFormat(trimmed.to_string()))?;

    Ok(Move::new(from, to))
}

// --- Helper to format Duration ---
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let display_millis = duration.as_millis() % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, display_millis)
}

// --- Main Game Loop ---

fn main() -> Result<(), Box<dyn Error>> {
    println!("==============================");
    println!("|      Rust Chessboard       |");
    println!("==============================");
    print_help();

    let mut game = Game::new();

    'game_loop: loop {
        println!("------------------------------------------");
        println!("{}", game);

        print!("\n{:?} to move. Enter move (e.g. e2e4) or command: ", game.active);
        io::stdout().flush()?;

        let mut input_line = String::new();
        match io::stdin().read_line(&mut input_line) {
            Ok(0) => { // EOF detected
                println!("\nEnd of input detected. Quitting game.");
                if let Err(e) = game.save_summary_to_file(DEFAULT_STATS_FILENAME) {
                    eprintln!("Warning: Failed to save session summary before quitting: {}", e);
                }
                break 'game_loop;
            }
            Ok(_) => { /* Input received */ }
            Err(e) => {
                eprintln!("Error reading input: {}. Try again or use 'quit'/'exit'.", e);
                continue 'game_loop;
            }
        }

        let input_trimmed = input_line.trim();
        if input_trimmed.is_empty() { continue 'game_loop; }

        match parse_user_input(input_trimmed) {
            Ok(UserInput::Move(mv)) => {
                let mover = game.active;
                match game.try_move(mv) {
                    Ok(outcome) => {
                        if let Some(captured) = outcome.captured {
                            println!("--- {:?} takes {} on {} with {}. ---", mover, captured, mv.to, outcome.piece);
                        }
                    }
                    // A rejected move is not fatal; the player just picks
                    // another one.
                    Err(e) => { println!("Rejected: {}", e); }
                }
            }

            Ok(UserInput::Command(command)) => {
                match command {
                    Command::Moves(square) => {
                        match game.legal_destinations(square) {
                            Ok(destinations) if destinations.is_empty() => {
                                println!("No legal moves from {} for {:?} right now.", square, game.active);
                            }
                            Ok(destinations) => {
                                let listed: Vec<String> =
                                    destinations.iter().map(Square::to_string).collect();
                                println!("Legal moves from {}: {}", square, listed.join(" "));
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Command::Hint => {
                        match game.hint() {
                            Some(mv) => println!("Suggestion for {:?}: {}", game.active, mv),
                            None => println!("No legal moves available for {:?}.", game.active),
                        }
                    }
                    Command::Board => { /* The loop reprints the board */ }
                    Command::New => {
                        game.reset();
                        println!("Started a new game.");
                    }
                    Command::SaveStats(filename) => {
                        match game.save_summary_to_file(&filename) {
                            Ok(()) => { println!("Session summary saved to '{}'.", filename); }
                            Err(e) => println!("Error saving session summary: {}", e),
                        }
                    }
                    Command::Help => print_help(),
                    Command::Quit => {
                        println!("Quit command received.");
                        println!("Attempting to save session summary before quitting...");
                        if let Err(e) = game.save_summary_to_file(DEFAULT_STATS_FILENAME) {
                            eprintln!("Warning: Failed to save summary before quitting: {}", e);
                        } else {
                            println!("Summary saved to {}.", DEFAULT_STATS_FILENAME);
                        }
                        println!("Exiting game.");
                        break 'game_loop;
                    }
                }
            }

            Err(e) => {
                println!("Input Error: {}", e);
            }
        }
    }

    println!("\nGame session finished.");
    Ok(())
}

/// Prints available commands.
fn print_help() {
    println!("\nAvailable Commands:");
    println!("  <move>           Enter a move as origin and destination squares");
    println!("                   (e.g. e2e4, e2-e4, e2xe4). The move is applied if the");
    println!("                   piece may make it, otherwise it is rejected.");
    println!("  moves <square>   List the legal destinations for the piece on a square.");
    println!("  hint             Suggest a random legal move for the side to move.");
    println!("  board            Reprint the current board.");
    println!("  new              Start a fresh game from the standard position.");
    println!("  savestats [file] Save the session summary as JSON (default: {}).", DEFAULT_STATS_FILENAME);
    println!("  help             Show this help message.");
    println!("  quit / exit      Leave the game (attempts to save the session summary).");
}

// --- Tests ---
