//! Position synthesis: turns projected edges into divider positions by a
//! winding-number sweep.

use log::trace;

use super::edges::Edge;
use super::{DividerPosition, GridPositions};

/// Coalesce and cancel edges until nothing changes.
pub(crate) fn sanitize(mut edges: Vec<Edge>, wiggle: f64) -> Vec<Edge> {
    loop {
        coalesce(&mut edges);
        if !cancel_weak_minimum(&mut edges, wiggle) {
            return edges;
        }
    }
}

/// Drop empty edges and fold runs of same-direction edges into one.  A
/// folded start keeps the earliest position, a folded stop the latest.
fn coalesce(edges: &mut Vec<Edge>) {
    let mut out: Vec<Edge> = Vec::with_capacity(edges.len());
    for e in edges.drain(..).filter(|e| e.freq > 0) {
        match out.last_mut() {
            Some(prev) if prev.is_start == e.is_start => {
                prev.freq += e.freq;
                prev.weak &= e.weak;
                if !e.is_start {
                    prev.pos = e.pos;
                }
            }
            _ => out.push(e),
        }
    }
    *edges = out;
}

/// Find the first winding minimum that only exists because of inter-word
/// spacing and cancel it.  Returns whether anything changed.
fn cancel_weak_minimum(edges: &mut [Edge], wiggle: f64) -> bool {
    let mut winding: i64 = 0;
    for i in 0..edges.len() {
        let e = edges[i];
        winding += if e.is_start {
            i64::from(e.freq)
        } else {
            -i64::from(e.freq)
        };
        if e.is_start || i + 1 >= edges.len() || !edges[i + 1].is_start {
            continue;
        }
        let next = edges[i + 1];
        if !(e.weak || next.weak) {
            continue;
        }
        let zero_crossing = winding == 0 && next.pos - e.pos <= wiggle;
        if winding != 0 || zero_crossing {
            let n = e.freq.min(next.freq);
            trace!("cancelling weak gap {}..{} (winding {winding}, freq {n})", e.pos, next.pos);
            edges[i].freq -= n;
            edges[i + 1].freq -= n;
            return true;
        }
    }
    false
}

/// Sweep sanitised edges into dividers between `lo` and `hi`.  Returns
/// `None` when the axis yields no interior divider.
pub(crate) fn build(edges: &[Edge], lo: f64, hi: f64, wiggle: f64) -> Option<GridPositions> {
    let mut list = vec![DividerPosition::pinned(lo)];
    let mut winding: i64 = 0;

    for (i, e) in edges.iter().enumerate() {
        winding += if e.is_start {
            i64::from(e.freq)
        } else {
            -i64::from(e.freq)
        };
        let Some(next) = edges.get(i + 1) else {
            break;
        };
        if e.is_start || !next.is_start {
            continue;
        }

        let pos = (e.pos + next.pos) / 2.0;
        let prev = list[list.len() - 1].pos;
        if pos - prev <= wiggle || hi - pos <= wiggle {
            continue;
        }
        list.push(DividerPosition {
            pos,
            min: e.pos,
            max: next.pos,
            uncertainty: u32::try_from(winding.max(0)).unwrap_or(u32::MAX),
            reinforcement: 0,
        });
    }

    list.push(DividerPosition::pinned(hi));
    (list.len() > 2).then(|| GridPositions::new(list))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(pos: f64, is_start: bool, weak: bool, freq: u32) -> Edge {
        Edge {
            is_start,
            weak,
            pos,
            freq,
        }
    }

    #[test]
    fn test_coalesce_folds_same_direction_runs() {
        let mut edges = vec![
            edge(0.0, true, false, 1),
            edge(5.0, true, true, 2),
            edge(10.0, false, false, 1),
            edge(12.0, false, false, 0),
            edge(14.0, false, false, 2),
        ];
        coalesce(&mut edges);
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].pos, edges[0].freq, edges[0].weak), (0.0, 3, false));
        assert_eq!((edges[1].pos, edges[1].freq), (14.0, 3));
    }

    #[test]
    fn test_weak_gap_inside_other_content_is_cancelled() {
        // "aaa bbb" above "ccccccc": the word gap is covered by the line below.
        let edges = vec![
            edge(0.0, true, false, 2),
            edge(15.0, false, true, 1),
            edge(20.0, true, true, 1),
            edge(35.0, false, false, 2),
        ];
        let out = sanitize(edges, 0.5);
        assert_eq!(out.len(), 2);
        assert!(build(&out, 0.0, 35.0, 0.5).is_none());
    }

    #[test]
    fn test_consistent_weak_gap_survives() {
        // Two rows of "1 23": the gap is present on every line.
        let edges = vec![
            edge(0.0, true, false, 2),
            edge(5.0, false, true, 2),
            edge(10.0, true, true, 2),
            edge(20.0, false, false, 2),
        ];
        let out = sanitize(edges, 0.5);
        let pos = build(&out, 0.0, 20.0, 0.5).unwrap();
        assert_eq!(pos.len(), 3);
        assert_eq!(pos[1].pos, 7.5);
        assert_eq!((pos[1].min, pos[1].max), (5.0, 10.0));
        assert_eq!(pos[1].uncertainty, 0);
    }

    #[test]
    fn test_weak_zero_width_crossing_is_cancelled() {
        let edges = vec![
            edge(0.0, true, false, 1),
            edge(10.0, false, false, 1),
            edge(10.0, true, true, 1),
            edge(20.0, false, false, 1),
        ];
        let out = sanitize(edges, 0.5);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_uncertainty_is_residual_winding() {
        // A title spanning both columns keeps the gap between them open.
        let edges = vec![
            edge(10.0, true, false, 2),
            edge(30.0, true, false, 1),
            edge(40.0, false, false, 2),
            edge(60.0, true, false, 2),
            edge(80.0, false, false, 2),
            edge(115.0, false, false, 1),
        ];
        let out = sanitize(edges, 0.5);
        let pos = build(&out, 10.0, 115.0, 0.5).unwrap();
        assert_eq!(pos.len(), 3);
        assert_eq!(pos[1].uncertainty, 1);
        assert_eq!(pos[0].pos, 10.0);
        assert_eq!(pos[2].pos, 115.0);
        assert!(pos.is_monotonic());
    }

    #[test]
    fn test_dividers_near_ends_are_skipped() {
        let edges = vec![
            edge(0.2, false, false, 1),
            edge(0.4, true, false, 1),
            edge(10.0, false, false, 1),
        ];
        assert!(build(&edges, 0.0, 10.0, 0.5).is_none());
    }
}
