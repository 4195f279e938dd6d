//! Batched per-cell arithmetic over the 8x8 grid of 12x12 blocks.
//!
//! Products accumulate in `i32`; the triple product of three 12x12 `i8`
//! blocks stays below `i32::MAX`, so only the casts back into storage
//! wrap or saturate.

use ndarray::Array4;

use crate::config::{BLOCK, GRID};

/// Per-cell `l[r,c] @ m[r,c] @ r[r,c]` for every cell of the grid. This is
/// a batched multiply, never one large matrix product.
pub(crate) fn grid_triple(
    left: &Array4<i8>,
    middle: &Array4<i8>,
    right: &Array4<i8>,
) -> Array4<i32> {
    let mut out = Array4::<i32>::zeros((GRID, GRID, BLOCK, BLOCK));
    let l = left.as_slice().unwrap();
    let m = middle.as_slice().unwrap();
    let r = right.as_slice().unwrap();
    let o = out.as_slice_mut().unwrap();

    for cell in 0..GRID * GRID {
        let base = cell * BLOCK * BLOCK;
        let mut tmp = [0i32; BLOCK * BLOCK];
        for i in 0..BLOCK {
            for k in 0..BLOCK {
                let lv = l[base + i * BLOCK + k] as i32;
                if lv == 0 {
                    continue;
                }
                for j in 0..BLOCK {
                    tmp[i * BLOCK + j] += lv * m[base + k * BLOCK + j] as i32;
                }
            }
        }
        for i in 0..BLOCK {
            for k in 0..BLOCK {
                let tv = tmp[i * BLOCK + k];
                if tv == 0 {
                    continue;
                }
                for j in 0..BLOCK {
                    o[base + i * BLOCK + j] += tv * r[base + k * BLOCK + j] as i32;
                }
            }
        }
    }
    out
}

/// Wrapping cast back into the 8-bit storage domain.
pub(crate) fn wrap_to_i8(t: &Array4<i32>) -> Array4<i8> {
    t.mapv(|v| v as i8)
}

/// Elementwise floor at `floor`, saturating into storage: every output
/// element lies in `[floor, i8::MAX]`.
pub(crate) fn normalise(t: &Array4<i32>, floor: i32) -> Array4<i8> {
    t.mapv(|v| v.max(floor).min(i8::MAX as i32) as i8)
}

pub(crate) fn add_wrapping_assign(target: &mut Array4<i8>, delta: &Array4<i8>) {
    target.zip_mut_with(delta, |t, &d| *t = t.wrapping_add(d));
}

pub(crate) fn sub_wrapping_assign(target: &mut Array4<i8>, delta: &Array4<i8>) {
    target.zip_mut_with(delta, |t, &d| *t = t.wrapping_sub(d));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_of(value: i8) -> Array4<i8> {
        Array4::from_elem((GRID, GRID, BLOCK, BLOCK), value)
    }

    fn identity_grid() -> Array4<i8> {
        let mut t = grid_of(0);
        for r in 0..GRID {
            for c in 0..GRID {
                for i in 0..BLOCK {
                    t[[r, c, i, i]] = 1;
                }
            }
        }
        t
    }

    #[test]
    fn triple_with_identities_is_the_middle() {
        let id = identity_grid();
        let middle = grid_of(7);
        let out = grid_triple(&id, &middle, &id);
        assert!(out.iter().all(|&v| v == 7));
    }

    #[test]
    fn triple_of_constant_grids() {
        // (2 * 3 summed over 12) * 5 summed over 12 = 72 * 60.
        let out = grid_triple(&grid_of(2), &grid_of(3), &grid_of(5));
        assert!(out.iter().all(|&v| v == 2 * 3 * 5 * (BLOCK as i32) * (BLOCK as i32)));
    }

    #[test]
    fn normalise_never_yields_below_floor() {
        let mut raw = Array4::<i32>::zeros((GRID, GRID, BLOCK, BLOCK));
        raw[[0, 0, 0, 0]] = -1_000_000;
        raw[[0, 0, 0, 1]] = 31;
        raw[[0, 0, 0, 2]] = 1_000_000;
        let floored = normalise(&raw, 32);
        assert!(floored.iter().all(|&v| v >= 32));
        assert_eq!(floored[[0, 0, 0, 0]], 32);
        assert_eq!(floored[[0, 0, 0, 1]], 32);
        assert_eq!(floored[[0, 0, 0, 2]], i8::MAX);
    }

    #[test]
    fn wrap_cast_wraps() {
        let mut raw = Array4::<i32>::zeros((GRID, GRID, BLOCK, BLOCK));
        raw[[0, 0, 0, 0]] = 130;
        let wrapped = wrap_to_i8(&raw);
        assert_eq!(wrapped[[0, 0, 0, 0]], -126);
    }

    #[test]
    fn add_then_sub_round_trips() {
        let mut target = grid_of(100);
        let delta = grid_of(50);
        add_wrapping_assign(&mut target, &delta);
        assert!(target.iter().all(|&v| v == 100i8.wrapping_add(50)));
        sub_wrapping_assign(&mut target, &delta);
        assert!(target.iter().all(|&v| v == 100));
    }
}
