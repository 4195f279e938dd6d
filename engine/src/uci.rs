//! Line-oriented UCI front-end. Maps text commands onto engine calls and
//! nothing more; there are no search controls to expose.

use std::io::{BufRead, Write};
use std::str::FromStr;

use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square};
use log::warn;

use crate::Engine;

const DEFAULT_DEPTH: usize = 3;

/// Parses a move in coordinate notation ("e2e4", "a7a8q") against the
/// current board, resolving it to a legal move.
fn parse_move(board: &Board, text: &str) -> Option<ChessMove> {
    let bytes = text.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let square = |file: u8, rank: u8| {
        let file = (file.to_ascii_lowercase() as usize).checked_sub('a' as usize)?;
        let rank = (rank as usize).checked_sub('1' as usize)?;
        if file < 8 && rank < 8 {
            Some(Square::make_square(Rank::from_index(rank), File::from_index(file)))
        } else {
            None
        }
    };
    let from = square(bytes[0], bytes[1])?;
    let to = square(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4).map(|b| b.to_ascii_lowercase()) {
        Some(b'n') => Some(Piece::Knight),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'r') => Some(Piece::Rook),
        Some(b'q') => Some(Piece::Queen),
        _ => None,
    };
    let mv = ChessMove::new(from, to, promotion);
    MoveGen::new_legal(board).find(|legal| *legal == mv)
}

fn parse_position(args: &[&str]) -> Option<Board> {
    let mut board;
    let mut rest = args;
    match rest.first() {
        Some(&"startpos") => {
            board = Board::default();
            rest = &rest[1..];
        }
        Some(&"fen") => {
            let end = rest
                .iter()
                .position(|&word| word == "moves")
                .unwrap_or(rest.len());
            let fen = rest[1..end].join(" ");
            board = Board::from_str(&fen).ok()?;
            rest = &rest[end..];
        }
        _ => return None,
    }
    if rest.first() == Some(&"moves") {
        for &text in &rest[1..] {
            match parse_move(&board, text) {
                Some(mv) => board = board.make_move_new(mv),
                None => {
                    warn!("ignoring unparseable move {text}");
                    return Some(board);
                }
            }
        }
    }
    Some(board)
}

fn parse_depth(args: &[&str]) -> usize {
    let mut words = args.iter();
    while let Some(&word) = words.next() {
        if word == "depth" {
            if let Some(value) = words.next().and_then(|w| w.parse().ok()) {
                return value;
            }
        }
    }
    DEFAULT_DEPTH
}

/// Runs the protocol loop until `quit` or end of input.
pub fn run(
    engine: &mut Engine,
    input: impl BufRead,
    mut output: impl Write,
) -> std::io::Result<()> {
    let mut board = Board::default();
    for line in input.lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.split_first() {
            Some((&"uci", _)) => {
                writeln!(
                    output,
                    "id name {} {}",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION")
                )?;
                writeln!(output, "uciok")?;
            }
            Some((&"isready", _)) => writeln!(output, "readyok")?,
            Some((&"ucinewgame", _)) => {
                engine.new_game();
                board = Board::default();
            }
            Some((&"position", rest)) => match parse_position(rest) {
                Some(parsed) => board = parsed,
                None => warn!("ignoring malformed position command"),
            },
            Some((&"go", rest)) => {
                let depth = parse_depth(rest);
                match engine.best_move(&board, depth) {
                    Some(mv) => writeln!(output, "bestmove {mv}")?,
                    None => writeln!(output, "bestmove 0000")?,
                }
            }
            Some((&"quit", _)) => break,
            Some((other, _)) => warn!("ignoring unknown command {other}"),
            None => {}
        }
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use network::NetConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine() -> Engine {
        Engine::from_random(NetConfig::default(), 255, &mut StdRng::seed_from_u64(5))
    }

    fn session(input: &str) -> String {
        let mut engine = engine();
        let mut output = Vec::new();
        run(&mut engine, input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn handshake() {
        let out = session("uci\nisready\nquit\n");
        assert!(out.contains("uciok"));
        assert!(out.contains("readyok"));
    }

    #[test]
    fn go_replies_with_a_legal_move_from_startpos() {
        let out = session("position startpos\ngo depth 1\nquit\n");
        let text = out
            .lines()
            .find_map(|l| l.strip_prefix("bestmove "))
            .expect("no bestmove reply");
        let board = Board::default();
        let mv = parse_move(&board, text).expect("bestmove is not legal");
        assert!(MoveGen::new_legal(&board).any(|legal| legal == mv));
    }

    #[test]
    fn position_with_moves_is_tracked() {
        let out = session("position startpos moves e2e4 e7e5\ngo depth 1\nquit\n");
        let mut board = Board::default();
        for text in ["e2e4", "e7e5"] {
            let mv = parse_move(&board, text).unwrap();
            board = board.make_move_new(mv);
        }
        let text = out
            .lines()
            .find_map(|l| l.strip_prefix("bestmove "))
            .expect("no bestmove reply");
        assert!(parse_move(&board, text).is_some());
    }

    #[test]
    fn fen_positions_are_accepted() {
        let out = session("position fen 8/5K1k/8/8/8/8/8/R7 w - - 0 1\ngo depth 1\nquit\n");
        let board = Board::from_str("8/5K1k/8/8/8/8/8/R7 w - - 0 1").unwrap();
        let text = out
            .lines()
            .find_map(|l| l.strip_prefix("bestmove "))
            .expect("no bestmove reply");
        assert!(parse_move(&board, text).is_some());
    }

    #[test]
    fn parse_move_rejects_garbage() {
        let board = Board::default();
        assert!(parse_move(&board, "zz99").is_none());
        assert!(parse_move(&board, "e2").is_none());
        assert!(parse_move(&board, "e2e5").is_none());
    }
}
