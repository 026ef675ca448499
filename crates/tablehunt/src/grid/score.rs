//! Grid scoring.  Lower is better; zero is a perfectly clean grid.

use super::Grid;

fn fully_bordered(grid: &Grid, x: usize, y: usize) -> bool {
    let cell = grid.cell(x, y);
    cell.h_line > 0
        && cell.v_line > 0
        && grid.cell(x, y + 1).h_line > 0
        && grid.cell(x + 1, y).v_line > 0
}

/// Crossed borders plus unruled empty cells, per interior cell.  Borders
/// inside a flattened box do not count.  A grid with no interior cells
/// scores infinity.
pub fn score(grid: &Grid) -> f64 {
    let (w, h) = (grid.width(), grid.height());
    if w < 2 || h < 2 {
        return f64::INFINITY;
    }

    let mut defects = 0usize;
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let cell = grid.cell(x, y);
            if !cell.flat {
                defects += usize::from(cell.h_crossed > 0);
                defects += usize::from(cell.v_crossed > 0);
            }
            defects += usize::from(!cell.full && !fully_bordered(grid, x, y));
        }
    }
    defects as f64 / ((w - 1) * (h - 1)) as f64
}
