//! Decoding of raw output lines into legal moves.
//!
//! Bit layout of one line, thresholded at >127 and read little-endian:
//! from-rank (bits 0-2), to-rank (3-5), from-file (6-8), to-file (9-11),
//! promotion (12-13, value + 1 as piece index: knight, bishop, rook,
//! queen).

use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square};
use ndarray::{Array2, ArrayView1};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Threshold an output element into a bit.
const THRESHOLD: i64 = 127;

struct Decoded {
    from: Square,
    to: Square,
    promotion: Piece,
}

fn decode_line(line: ArrayView1<'_, i64>) -> Decoded {
    let bit = |index: usize| line[index] > THRESHOLD;
    let field = |index: usize| {
        (bit(index) as usize) | ((bit(index + 1) as usize) << 1) | ((bit(index + 2) as usize) << 2)
    };

    let from_rank = field(0);
    let to_rank = field(3);
    let from_file = field(6);
    let to_file = field(9);
    let promotion = match (bit(12) as usize) | ((bit(13) as usize) << 1) {
        0 => Piece::Knight,
        1 => Piece::Bishop,
        2 => Piece::Rook,
        _ => Piece::Queen,
    };

    Decoded {
        from: Square::make_square(Rank::from_index(from_rank), File::from_index(from_file)),
        to: Square::make_square(Rank::from_index(to_rank), File::from_index(to_file)),
        promotion,
    }
}

/// Resolves a decoded move against the legal-move list: kept iff some legal
/// move shares its from/to pair. The promotion field survives only when the
/// mover is a pawn reaching the back rank and the fully-specified move is
/// legal; otherwise it is dropped and the move resolves to a legal move
/// with the same from/to pair.
fn legalise(
    board: &Board,
    legal: &[ChessMove],
    decoded: &Decoded,
    rng: &mut impl Rng,
) -> Option<ChessMove> {
    let matching: Vec<ChessMove> = legal
        .iter()
        .filter(|mv| mv.get_source() == decoded.from && mv.get_dest() == decoded.to)
        .copied()
        .collect();
    if matching.is_empty() {
        return None;
    }

    let is_back_rank = matches!(decoded.to.get_rank(), Rank::First | Rank::Eighth);
    if board.piece_on(decoded.from) == Some(Piece::Pawn) && is_back_rank {
        let specified = ChessMove::new(decoded.from, decoded.to, Some(decoded.promotion));
        if matching.contains(&specified) {
            return Some(specified);
        }
    }
    matching.choose(rng).copied()
}

/// Decodes every output line, filters for legality and picks uniformly
/// among the survivors; falls back to a uniformly random legal move when no
/// line decodes to one. Returns `None` only when the position has no legal
/// moves at all.
pub fn select_move(
    board: &Board,
    output: &Array2<i64>,
    rng: &mut impl Rng,
) -> Option<ChessMove> {
    let legal: Vec<ChessMove> = MoveGen::new_legal(board).collect();
    if legal.is_empty() {
        return None;
    }

    let mut candidates = Vec::new();
    for line in output.rows() {
        let decoded = decode_line(line);
        if let Some(mv) = legalise(board, &legal, &decoded, rng) {
            candidates.push(mv);
        }
    }

    if candidates.is_empty() {
        legal.choose(rng).copied()
    } else {
        candidates.choose(rng).copied()
    }
}
