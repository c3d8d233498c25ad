//! Textual snapshot visualization for log output.

use crate::joints::JointSnapshot;

const MARK: char = '•';

/// Renders the snapshot's joint positions projected onto the XZ plane
/// (top-down) as a bordered character grid. Bounds auto-fit to the hand; a
/// degenerate spread (all joints coincident, e.g. a zeroed snapshot)
/// collapses to a single centered mark.
pub fn render_top_down(snapshot: &JointSnapshot, width: usize, height: usize) -> String {
    let width = width.max(1);
    let height = height.max(1);
    let positions = snapshot.positions();

    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut min_z = f32::MAX;
    let mut max_z = f32::MIN;
    for pos in &positions {
        min_x = min_x.min(pos.x);
        max_x = max_x.max(pos.x);
        min_z = min_z.min(pos.z);
        max_z = max_z.max(pos.z);
    }

    let center_x = (min_x + max_x) / 2.0;
    let center_z = (min_z + max_z) / 2.0;
    let range = (max_x - min_x).max(max_z - min_z);
    let scale = if range > f32::EPSILON {
        // Leave a one-cell margin so edge joints stay inside the border.
        (width.min(height) as f32 - 1.0).max(1.0) / range
    } else {
        0.0
    };

    let mut grid = vec![vec![' '; width]; height];
    for pos in &positions {
        let gx = ((pos.x - center_x) * scale + (width - 1) as f32 / 2.0).round() as isize;
        let gz = ((pos.z - center_z) * scale + (height - 1) as f32 / 2.0).round() as isize;
        if (0..width as isize).contains(&gx) && (0..height as isize).contains(&gz) {
            grid[gz as usize][gx as usize] = MARK;
        }
    }

    let horizontal = "─".repeat(width + 2);
    let mut out = String::with_capacity((width + 4) * (height + 2));
    out.push_str(&horizontal);
    out.push('\n');
    for row in grid {
        out.push('│');
        out.extend(row);
        out.push('│');
        out.push('\n');
    }
    out.push_str(&horizontal);
    out
}
