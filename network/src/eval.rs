//! Forward pass: position encoding, hidden-layer iteration with drift
//! correction, and the final projection into candidate-move lines.

use chess::{Board, ChessMove, Color, File, Piece, Rank, Square};
use ndarray::{Array2, Array4};
use rand::Rng;

use crate::codec;
use crate::config::{BLOCK, EDGE, GRID, LINES, LINE_WIDTH};
use crate::net::Network;
use crate::ops::{add_wrapping_assign, grid_triple, normalise, sub_wrapping_assign, wrap_to_i8};

/// Flag value used by the encoder for set indicator bits.
const HOT: i8 = 127;

fn piece_channel(piece: Piece, color: Color) -> usize {
    let index = match piece {
        Piece::Pawn => 0,
        Piece::Knight => 1,
        Piece::Bishop => 2,
        Piece::Rook => 3,
        Piece::Queen => 4,
        Piece::King => 5,
    };
    if color == Color::White {
        index
    } else {
        index + 6
    }
}

/// The per-square side channel: four castling flags (white kingside, black
/// kingside, white queenside, black queenside) followed by the eight
/// en-passant file flags.
fn side_channel(board: &Board) -> [i8; BLOCK] {
    let flag = |set: bool| if set { HOT } else { 0 };
    let mut line = [0i8; BLOCK];
    line[0] = flag(board.castle_rights(Color::White).has_kingside());
    line[1] = flag(board.castle_rights(Color::Black).has_kingside());
    line[2] = flag(board.castle_rights(Color::White).has_queenside());
    line[3] = flag(board.castle_rights(Color::Black).has_queenside());
    if let Some(square) = board.en_passant() {
        line[4 + square.get_file().to_index()] = HOT;
    }
    line
}

/// Encodes a position into the 8x8 grid of 12x12 input blocks: eleven
/// copies of the one-hot piece/color indicator row, then the side channel.
pub fn encode(board: &Board) -> Array4<i8> {
    let side = side_channel(board);
    let mut input = Array4::<i8>::zeros((GRID, GRID, BLOCK, BLOCK));
    for rank in 0..GRID {
        for file in 0..GRID {
            let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let mut indicator = [0i8; BLOCK];
            if let (Some(piece), Some(color)) = (board.piece_on(square), board.color_on(square)) {
                indicator[piece_channel(piece, color)] = HOT;
            }
            for row in 0..BLOCK - 1 {
                for col in 0..BLOCK {
                    input[[rank, file, row, col]] = indicator[col];
                }
            }
            for col in 0..BLOCK {
                input[[rank, file, BLOCK - 1, col]] = side[col];
            }
        }
    }
    input
}

impl Network {
    /// The drift signal: per cell `Gi[r,c] (1x12) . t[r,c] . Di[r,c] (12x1)`
    /// collapsed into one integer through `Ge` and `De`. Weight-dependent
    /// noise with no external meaning.
    fn scalar_reduce(&self, t: &Array4<i8>) -> i64 {
        let gi = self.scalar_gi.as_slice().unwrap();
        let di = self.scalar_di.as_slice().unwrap();
        let tt = t.as_slice().unwrap();

        let mut total = 0i64;
        for r in 0..GRID {
            for c in 0..GRID {
                let cell = r * GRID + c;
                let gi_row = &gi[cell * BLOCK..(cell + 1) * BLOCK];
                let di_col = &di[cell * BLOCK..(cell + 1) * BLOCK];
                let block = &tt[cell * BLOCK * BLOCK..(cell + 1) * BLOCK * BLOCK];

                let mut inner = 0i32;
                for k in 0..BLOCK {
                    let mut v = 0i32;
                    for j in 0..BLOCK {
                        v += gi_row[j] as i32 * block[j * BLOCK + k] as i32;
                    }
                    inner += v * di_col[k] as i32;
                }
                let ge = self.scalar_ge[[0, r, 0, 0]] as i64;
                let de = self.scalar_de[[c, 0, 0, 0]] as i64;
                total += ge * inner as i64 * de;
            }
        }
        total
    }

    /// Runs `iterations` passes over the position and returns the raw
    /// output tensor: [`LINES`] candidate lines of width [`LINE_WIDTH`] in
    /// the accumulator domain.
    ///
    /// The correction step deliberately mutates the live left/right
    /// weights, which carries over into later iterations and later
    /// searches within the same game; only [`Network::game_end`] undoes it.
    pub fn forward(&mut self, board: &Board, iterations: usize) -> Array2<i64> {
        let hidden_layers = self.cfg.hidden_layers;
        let floor = self.cfg.normalisation;
        let rts_diff = self.cfg.rts_diff;

        let mut carried = encode(board);
        for _ in 0..iterations {
            let raw0 = grid_triple(&self.left[0], &carried, &self.right[0]);
            let mut prev = wrap_to_i8(&raw0);
            add_wrapping_assign(&mut prev, &self.bias[0]);
            let mut prev_rts = self.scalar_reduce(&prev);

            for layer in 0..hidden_layers {
                let raw = grid_triple(&self.left[layer + 1], &prev, &self.right[layer + 1]);
                let hidden = normalise(&raw, floor);
                let cur_rts = self.scalar_reduce(&hidden);

                let correction = wrap_to_i8(&grid_triple(&self.corr_g, &hidden, &self.corr_d));
                if cur_rts - prev_rts >= rts_diff {
                    sub_wrapping_assign(&mut self.left[layer + 2], &correction);
                    sub_wrapping_assign(&mut self.right[layer + 2], &correction);
                } else if prev_rts - cur_rts >= rts_diff {
                    add_wrapping_assign(&mut self.left[layer + 2], &correction);
                    add_wrapping_assign(&mut self.right[layer + 2], &correction);
                }

                prev = hidden;
                prev_rts = cur_rts;
            }
            carried = prev;
        }

        self.project(&carried)
    }

    /// Reshapes the final hidden tensor into `EDGE x EDGE` (row-major) and
    /// projects it through the two reduce matrices.
    fn project(&self, hidden: &Array4<i8>) -> Array2<i64> {
        let e = hidden.as_slice().unwrap();
        let rg = self.reduce_g.as_slice().unwrap();
        let rd = self.reduce_d.as_slice().unwrap();

        let mut mid = vec![0i64; LINES * EDGE];
        for i in 0..LINES {
            for k in 0..EDGE {
                let gv = rg[i * EDGE + k] as i64;
                if gv == 0 {
                    continue;
                }
                for j in 0..EDGE {
                    mid[i * EDGE + j] += gv * e[k * EDGE + j] as i64;
                }
            }
        }

        let mut out = Array2::<i64>::zeros((LINES, LINE_WIDTH));
        for i in 0..LINES {
            for k in 0..EDGE {
                let mv = mid[i * EDGE + k];
                if mv == 0 {
                    continue;
                }
                for j in 0..LINE_WIDTH {
                    out[[i, j]] += mv * rd[k * LINE_WIDTH + j] as i64;
                }
            }
        }
        out
    }

    /// One full evaluation: forward pass plus move decoding. Returns `None`
    /// only when the position has no legal moves.
    pub fn search(
        &mut self,
        board: &Board,
        iterations: usize,
        rng: &mut impl Rng,
    ) -> Option<ChessMove> {
        let output = self.forward(board, iterations);
        codec::select_move(board, &output, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetConfig;
    use chess::MoveGen;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::str::FromStr;

    fn net(seed: u64) -> Network {
        Network::random(NetConfig::default(), 255, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn encode_marks_pieces_and_side_channel() {
        let board = Board::default();
        let input = encode(&board);

        // White rook on a1: channel 3, all indicator rows.
        for row in 0..BLOCK - 1 {
            assert_eq!(input[[0, 0, row, 3]], HOT);
        }
        // Black king on e8: channel 11.
        assert_eq!(input[[7, 4, 0, 11]], HOT);
        // Empty square e4: indicator rows all zero.
        for col in 0..BLOCK {
            assert_eq!(input[[3, 4, 0, col]], 0);
        }
        // All four castling rights set, no en passant.
        for col in 0..4 {
            assert_eq!(input[[3, 4, BLOCK - 1, col]], HOT);
        }
        for col in 4..BLOCK {
            assert_eq!(input[[3, 4, BLOCK - 1, col]], 0);
        }
    }

    #[test]
    fn encode_flags_en_passant_file() {
        let board =
            Board::from_str("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3")
                .unwrap();
        let input = encode(&board);
        // En passant on the e-file: flag index 4 + 4.
        assert_eq!(input[[0, 0, BLOCK - 1, 8]], HOT);
    }

    #[test]
    fn forward_has_output_shape() {
        let mut net = net(10);
        let output = net.forward(&Board::default(), 1);
        assert_eq!(output.dim(), (LINES, LINE_WIDTH));
    }

    #[test]
    fn forward_is_deterministic_from_equal_states() {
        let mut a = net(11);
        let mut b = a.clone();
        let out_a = a.forward(&Board::default(), 1);
        let out_b = b.forward(&Board::default(), 1);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn drift_correction_is_undone_by_game_end() {
        let mut net = net(12);
        let before = net.content_hash();

        net.new_game();
        net.forward(&Board::default(), 2);
        net.forward(&Board::default(), 1);
        net.game_end();

        assert_eq!(net.content_hash(), before);
    }

    #[test]
    fn search_returns_a_legal_move() {
        let mut net = net(13);
        let mut rng = StdRng::seed_from_u64(99);
        let board = Board::from_str("8/5K1k/8/8/8/8/8/R7 w - - 0 1").unwrap();
        let mv = net.search(&board, 1, &mut rng).unwrap();
        assert!(MoveGen::new_legal(&board).any(|legal| legal == mv));
    }
}
