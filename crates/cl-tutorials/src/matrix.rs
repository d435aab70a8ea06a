// 2025 Thomas Bicanic – MIT License

//! Row-major square matrices stored as flat `f32` slices.

use std::fmt::Write;

/// Element count of a square matrix of the given order.
#[inline]
pub fn total_size(order: usize) -> usize {
    order * order
}

pub fn set_identity(order: usize, m: &mut [f32]) {
    debug_assert_eq!(m.len(), total_size(order));
    for r in 0..order {
        for c in 0..order {
            m[r * order + c] = if r == c { 1.0 } else { 0.0 };
        }
    }
}

pub fn set_null(m: &mut [f32]) {
    m.fill(0.0);
}

/// Exact check: 1 on the diagonal, 0 everywhere else.
pub fn is_identity(order: usize, m: &[f32]) -> bool {
    if m.len() != total_size(order) {
        return false;
    }
    m.chunks_exact(order.max(1)).enumerate().all(|(r, row)| {
        row.iter()
            .enumerate()
            .all(|(c, &v)| if r == c { v == 1.0 } else { v == 0.0 })
    })
}

/// Tab-separated rows, six decimals per element.
pub fn format_matrix(order: usize, m: &[f32]) -> String {
    let mut out = String::new();
    for row in m.chunks_exact(order.max(1)).take(order) {
        for v in row {
            let _ = write!(out, "{v:.6}\t");
        }
        out.push('\n');
    }
    out
}
