use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square, ALL_PIECES, EMPTY};
use std::str::FromStr;

use crate::models::TerminalStatus;

/// Repetitions after which the authority ends the game automatically.
pub const AUTOMATIC_REPETITION_DRAW: usize = 5;

/// Half-moves without a capture or pawn move after which the game is drawn.
pub const AUTOMATIC_MOVE_RULE_DRAW: u32 = 150;

/// Convert a chess color to the name used on the wire
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "White".to_string(),
        Color::Black => "Black".to_string(),
    }
}

/// Parse a color name, ignoring case
pub fn parse_color(name: &str) -> Option<Color> {
    match name.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// Parse a promotion piece from a letter or a full name
pub fn parse_piece(name: &str) -> Option<Piece> {
    match name.trim().to_ascii_lowercase().as_str() {
        "q" | "queen" => Some(Piece::Queen),
        "r" | "rook" => Some(Piece::Rook),
        "b" | "bishop" => Some(Piece::Bishop),
        "n" | "knight" => Some(Piece::Knight),
        _ => None,
    }
}

/// Parse coordinate notation (`e2e4`, `a7a8q`)
pub fn parse_uci(text: &str) -> Option<ChessMove> {
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return None;
    }
    let source = Square::from_str(&text[0..2].to_lowercase()).ok()?;
    let dest = Square::from_str(&text[2..4].to_lowercase()).ok()?;
    let promotion = match text.get(4..) {
        Some("") | None => None,
        Some(letter) => Some(parse_piece(letter)?),
    };
    Some(ChessMove::new(source, dest, promotion))
}

pub fn is_legal(board: &Board, chess_move: ChessMove) -> bool {
    MoveGen::new_legal(board).any(|m| m == chess_move)
}

/// True when moving the piece on `source` to `target` would promote a pawn.
pub fn is_promotion_move(board: &Board, source: Square, target: Square) -> bool {
    if board.piece_on(source) != Some(Piece::Pawn) {
        return false;
    }
    match board.color_on(source) {
        Some(Color::White) => target.get_rank() == Rank::Eighth,
        Some(Color::Black) => target.get_rank() == Rank::First,
        None => false,
    }
}

/// Same piece placement and side to move, ignoring castling and en passant
pub fn same_position(a: &Board, b: &Board) -> bool {
    a.side_to_move() == b.side_to_move()
        && a.color_combined(Color::White) == b.color_combined(Color::White)
        && a.color_combined(Color::Black) == b.color_combined(Color::Black)
        && ALL_PIECES.iter().all(|&piece| a.pieces(piece) == b.pieces(piece))
}

/// Read the half-move clock field out of a FEN, defaulting to zero
pub fn halfmove_clock(fen: &str) -> u32 {
    fen.split_whitespace()
        .nth(4)
        .and_then(|field| field.parse().ok())
        .unwrap_or(0)
}

/// Classify the board, given the hashes of every position reached so far
/// (including the current one) and the half-move clock.
pub fn classify(board: &Board, position_hashes: &[u64], halfmove_clock: u32) -> TerminalStatus {
    match board.status() {
        BoardStatus::Checkmate => return TerminalStatus::Checkmate,
        BoardStatus::Stalemate => return TerminalStatus::Stalemate,
        BoardStatus::Ongoing => {}
    }
    if has_insufficient_material(board) {
        return TerminalStatus::DrawByMaterial;
    }
    let current = board.get_hash();
    let repetitions = position_hashes.iter().filter(|&&hash| hash == current).count();
    if repetitions >= AUTOMATIC_REPETITION_DRAW {
        return TerminalStatus::DrawByRepetition;
    }
    if halfmove_clock >= AUTOMATIC_MOVE_RULE_DRAW {
        return TerminalStatus::DrawOther;
    }
    TerminalStatus::None
}

/// Check if neither side has enough material to mate, by the same rules
/// the authority applies.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }
    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    let mut shades = bishops.map(|square| (square.get_rank().to_index() + square.get_file().to_index()) % 2);
    let one_shade = match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    };

    [Color::White, Color::Black].iter().all(|&color| {
        let own = *board.color_combined(color);
        let other = *board.color_combined(!color);
        if own & knights != EMPTY {
            // A lone knight, and nothing on the other side but the king
            own.popcnt() <= 2 && other & !*board.pieces(Piece::King) == EMPTY
        } else if own & bishops != EMPTY {
            one_shade && knights == EMPTY
        } else {
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn test_color_names_round_trip() {
        assert_eq!(parse_color(&color_to_string(Color::White)), Some(Color::White));
        assert_eq!(parse_color("BLACK"), Some(Color::Black));
        assert_eq!(parse_color("purple"), None);
    }

    #[test]
    fn test_parse_uci() {
        let plain = parse_uci("e2e4").unwrap();
        assert_eq!(plain.get_source(), Square::E2);
        assert_eq!(plain.get_dest(), Square::E4);
        assert_eq!(plain.get_promotion(), None);

        let promotion = parse_uci("a7a8q").unwrap();
        assert_eq!(promotion.get_promotion(), Some(Piece::Queen));

        assert!(parse_uci("a7a8x").is_none());
        assert!(parse_uci("z9e4").is_none());
        assert!(parse_uci("e2").is_none());
    }

    #[test]
    fn test_promotion_detection() {
        let position = board("4k3/P7/8/8/8/8/7p/4K3 w - - 0 1");
        assert!(is_promotion_move(&position, Square::A7, Square::A8));
        assert!(is_promotion_move(&position, Square::H2, Square::H1));
        assert!(!is_promotion_move(&position, Square::E1, Square::E2));
        assert!(!is_promotion_move(&Board::default(), Square::E2, Square::E4));
    }

    #[test]
    fn test_insufficient_material() {
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")));
        // Bishops on c1 and f8 are both on dark squares
        assert!(has_insufficient_material(&board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        // Bishops on c1 (dark) and c8 (light)
        assert!(!has_insufficient_material(&board("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));
        // Two bishops on dark squares (c1, e3) against a bare king
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/4B3/8/2B1K3 w - - 0 1")));
        // Bishops on c1 (dark) and f1 (light) can mate
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1")));
        // Knight against a knight leaves mating chances
        assert!(!has_insufficient_material(&board("4kn2/8/8/8/8/8/8/4KN2 w - - 0 1")));
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn test_classify() {
        // Fool's mate
        let mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(classify(&mated, &[], 0), TerminalStatus::Checkmate);

        let stalemate = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(classify(&stalemate, &[], 0), TerminalStatus::Stalemate);

        let start = Board::default();
        let hashes = vec![start.get_hash(); AUTOMATIC_REPETITION_DRAW];
        assert_eq!(classify(&start, &hashes, 0), TerminalStatus::DrawByRepetition);
        assert_eq!(classify(&start, &hashes[..2], 0), TerminalStatus::None);
        assert_eq!(classify(&start, &[], AUTOMATIC_MOVE_RULE_DRAW), TerminalStatus::DrawOther);
    }

    #[test]
    fn test_halfmove_clock() {
        assert_eq!(halfmove_clock("8/8/8/8/8/8/8/8 w - - 37 80"), 37);
        assert_eq!(halfmove_clock("8/8/8/8/8/8/8/8 w - -"), 0);
    }
}
