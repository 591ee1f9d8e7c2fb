//! Symbolic depth-first search (fill discovery)
//!
//! For pivot column `j` the search scatters column `cperm[j]` of A into the
//! dense work vector and walks the graph of already-pivoted columns of L to
//! find every row that becomes nonzero in column `j` of U.
//!
//! # Graph
//!
//! Vertices are row identities. A pivoted row `v` (rank `k = rperm[v]`) has an
//! edge to every row stored in the L part of column `k`: eliminating with
//! `U(k, j)` touches exactly those rows. Only pivoted targets are followed;
//! unpivoted targets are L-part fill and are allocated by the numeric update.
//! The graph is acyclic because a row only appears as an edge target in
//! columns closed before it was pivoted.
//!
//! # Stack
//!
//! The traversal keeps its stack in `parent`/`child` (indexed by row) instead
//! of on the call stack, so paths as long as `n` are fine:
//!
//! ```text
//! parent[v]  vertex we descended from (0 for a root)
//! child[v]   storage position of v's next unexplored edge
//! ```
//!
//! A vertex is emitted into `lurow` when its last edge is exhausted, so the
//! U part ends up in reverse topological order: every row appears after all
//! rows it reaches.

use crate::csc::CscView;
use crate::error::{LuError, LuResult};
use crate::storage::{FactorStorage, Permutations, Workspace};

/// Allocate storage for the nonzero structure of column `j`.
///
/// Requires `found[*] < j` and an all-zero `dense`. Inconsistent column
/// ranges and out-of-bounds row indices fail with `MalformedInput` before
/// anything is touched. On return:
/// - `dense` holds column `cperm[j]` of A, by original row;
/// - `found[r - 1] == j` exactly for the U rows of column `j` and the rows of
///   A's column that are still unpivoted;
/// - `lurow[ucolst[j]..lcolst[j]]` lists the U rows in reverse topological
///   order, followed by the direct L rows up to `last_lu`.
pub fn symbolic_dfs(
    j: usize,
    a: &CscView<'_>,
    storage: &mut FactorStorage,
    perm: &Permutations,
    ws: &mut Workspace,
) -> LuResult<()> {
    let col = perm.column_at(j);
    let (start, end) = a.column_range(col);
    let malformed = LuError::MalformedInput {
        column: j,
        start,
        end,
    };
    if end < start || end > a.nnz() {
        return Err(malformed);
    }
    let rows = &a.row_idx()[start..end];
    let values = &a.values()[start..end];
    if rows.iter().any(|&idx| idx >= ws.n()) {
        return Err(malformed);
    }

    storage.open_column(j);

    for (&idx, &value) in rows.iter().zip(values) {
        let root = idx + 1;
        ws.dense[root - 1] += value;

        // Below the diagonal in PA: goes straight into L.
        if perm.rperm[root - 1] == 0 || ws.found[root - 1] == j || value == 0.0 {
            continue;
        }

        depth_first(j, root, storage, perm, ws);
    }

    // Close U; the diagonal stays in L until the column is finalized.
    storage.lcolst[j - 1] = storage.last_lu;
    for &idx in rows {
        let row = idx + 1;
        if perm.rperm[row - 1] != 0 || ws.found[row - 1] == j {
            continue;
        }
        ws.found[row - 1] = j;
        storage.push_row(row);
    }
    storage.ucolst[j] = storage.last_lu;

    Ok(())
}

/// Iterative post-order DFS from `root`, emitting finished vertices into `lurow`.
fn depth_first(
    j: usize,
    root: usize,
    storage: &mut FactorStorage,
    perm: &Permutations,
    ws: &mut Workspace,
) {
    ws.parent[root - 1] = 0;
    ws.found[root - 1] = j;

    let mut vertex = root;
    let mut next = storage.lcolst[perm.rperm[root - 1] - 1];

    loop {
        let edges_end = storage.ucolst[perm.rperm[vertex - 1]];

        // Look for an unfound, already pivoted child.
        let mut descend_to = None;
        while next < edges_end {
            let candidate = storage.lurow[next];
            next += 1;
            if perm.rperm[candidate - 1] != 0 && ws.found[candidate - 1] != j {
                descend_to = Some(candidate);
                break;
            }
        }

        match descend_to {
            Some(child) => {
                ws.child[vertex - 1] = next;
                ws.parent[child - 1] = vertex;
                ws.found[child - 1] = j;
                vertex = child;
                next = storage.lcolst[perm.rperm[child - 1] - 1];
            }
            None => {
                // Step back: U(rperm[vertex], j) gets its slot now.
                storage.push_row(vertex);
                vertex = ws.parent[vertex - 1];
                if vertex == 0 {
                    return;
                }
                next = ws.child[vertex - 1];
            }
        }
    }
}
