use crate::core::{AxisFill, FillMode, Rect};
use crate::error::BrixelResult;

/// One blit: composite `src` (in source coordinates) onto `dst` (in output
/// coordinates). Extents differ only on a stretch axis of the Rgba→Rgba path,
/// where the rasterizer scales; the CPU kernels always see equal extents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePair {
    pub src: Rect,
    pub dst: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    src_off: i32,
    src_len: i32,
    dst_off: i32,
    dst_len: i32,
}

/// Compute the ordered tile plan for a fill mode: the Cartesian product of the
/// per-axis span sequences, row-major (rows outer, columns inner). The order
/// is deterministic; overlapping destination rectangles (possible under
/// repeat with a wide source) resolve last-writer-wins in this order.
pub fn plan_tiles(
    fill: FillMode,
    src_w: i32,
    src_h: i32,
    offset_x: i32,
    offset_y: i32,
    dst_w: i32,
    dst_h: i32,
) -> Vec<TilePair> {
    let cols = axis_spans(fill.x, src_w, offset_x, dst_w);
    let rows = axis_spans(fill.y, src_h, offset_y, dst_h);

    let mut out = Vec::with_capacity(rows.len() * cols.len());
    for row in &rows {
        if row.src_len <= 0 || row.dst_len <= 0 {
            break;
        }
        for col in &cols {
            if col.src_len <= 0 || col.dst_len <= 0 {
                break;
            }
            out.push(TilePair {
                src: Rect::new(col.src_off, row.src_off, col.src_len, row.src_len),
                dst: Rect::new(col.dst_off, row.dst_off, col.dst_len, row.dst_len),
            });
        }
    }
    out
}

/// Drive `draw` over the tile plan, aborting on the first failure.
pub fn mapped_blend(
    fill: FillMode,
    src_w: i32,
    src_h: i32,
    offset_x: i32,
    offset_y: i32,
    dst_w: i32,
    dst_h: i32,
    draw: &mut impl FnMut(Rect, Rect) -> BrixelResult<()>,
) -> BrixelResult<()> {
    for pair in plan_tiles(fill, src_w, src_h, offset_x, offset_y, dst_w, dst_h) {
        tracing::trace!(
            src = ?pair.src,
            dst = ?pair.dst,
            "blit tile"
        );
        draw(pair.src, pair.dst)?;
    }
    Ok(())
}

fn axis_spans(fill: AxisFill, src_len: i32, offset: i32, dst_len: i32) -> Vec<Span> {
    match fill {
        AxisFill::None => {
            // Only the overlap of the placed source and the output is drawn.
            let dst_off = offset.max(0);
            let src_off = (-offset).max(0);
            let len = (src_len - src_off).min(dst_len - dst_off);
            if len <= 0 {
                return Vec::new();
            }
            vec![Span {
                src_off,
                src_len: len,
                dst_off,
                dst_len: len,
            }]
        }
        AxisFill::Stretch => {
            if src_len <= 0 || dst_len <= 0 {
                return Vec::new();
            }
            // Whole source onto the whole axis; offset resets to 0. The
            // caller either pre-scaled the source (src_len == dst_len) or
            // hands the pair to a scaling rasterizer.
            vec![Span {
                src_off: 0,
                src_len,
                dst_off: 0,
                dst_len,
            }]
        }
        AxisFill::Repeat => repeat_spans(src_len, offset, dst_len),
    }
}

/// Lead partial tile (sourced from the tile's trailing pixels), `n` full
/// tiles, then a trail partial tile (sourced from the tile's leading pixels).
/// The offset only phases the tiling: it is wrapped into `[0, tile)`.
fn repeat_spans(tile: i32, offset: i32, dst_len: i32) -> Vec<Span> {
    if tile <= 0 || dst_len <= 0 {
        return Vec::new();
    }

    let lead = offset.rem_euclid(tile);
    if lead >= dst_len {
        // The destination ends inside the lead fragment.
        return vec![Span {
            src_off: tile - lead,
            src_len: dst_len,
            dst_off: 0,
            dst_len,
        }];
    }

    let remaining = dst_len - lead;
    let full = remaining / tile;
    let trail = remaining - full * tile;

    let mut spans = Vec::with_capacity(full as usize + 2);
    if lead > 0 {
        spans.push(Span {
            src_off: tile - lead,
            src_len: lead,
            dst_off: 0,
            dst_len: lead,
        });
    }
    for i in 0..full {
        spans.push(Span {
            src_off: 0,
            src_len: tile,
            dst_off: lead + i * tile,
            dst_len: tile,
        });
    }
    if trail > 0 {
        spans.push(Span {
            src_off: 0,
            src_len: trail,
            dst_off: lead + full * tile,
            dst_len: trail,
        });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths(pairs: &[TilePair]) -> Vec<i32> {
        pairs.iter().map(|p| p.dst.w).collect()
    }

    #[test]
    fn repeat_x_tile10_dest25_offset0_is_three_tiles() {
        let pairs = plan_tiles(FillMode::repeat_x(), 10, 4, 0, 0, 25, 4);
        assert_eq!(widths(&pairs), vec![10, 10, 5]);
        // Full tiles sample the whole source, the trail its first 5 columns.
        assert_eq!(pairs[0].src, Rect::new(0, 0, 10, 4));
        assert_eq!(pairs[2].src, Rect::new(0, 0, 5, 4));
        assert_eq!(pairs[2].dst, Rect::new(20, 0, 5, 4));
    }

    #[test]
    fn repeat_x_negative_offset_wraps_into_lead() {
        let pairs = plan_tiles(FillMode::repeat_x(), 10, 4, -3, 0, 25, 4);
        assert_eq!(widths(&pairs), vec![7, 10, 8]);
        // Lead samples the source's last 7 columns, i.e. [3, 10).
        assert_eq!(pairs[0].src, Rect::new(3, 0, 7, 4));
        assert_eq!(pairs[0].dst, Rect::new(0, 0, 7, 4));
        // Trail samples the leading columns at the destination end.
        assert_eq!(pairs[2].src, Rect::new(0, 0, 8, 4));
        assert_eq!(pairs[2].dst, Rect::new(17, 0, 8, 4));
    }

    #[test]
    fn repeat_x_positive_offset_beyond_tile_wraps() {
        let pairs = plan_tiles(FillMode::repeat_x(), 10, 1, 12, 0, 25, 1);
        assert_eq!(widths(&pairs), vec![2, 10, 10, 3]);
        assert_eq!(pairs[0].src, Rect::new(8, 0, 2, 1));
    }

    #[test]
    fn repeat_x_destination_narrower_than_lead_truncates() {
        let pairs = plan_tiles(FillMode::repeat_x(), 10, 1, -3, 0, 5, 1);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].src, Rect::new(3, 0, 5, 1));
        assert_eq!(pairs[0].dst, Rect::new(0, 0, 5, 1));
    }

    #[test]
    fn repeat_exact_multiple_has_no_partial_tiles() {
        let pairs = plan_tiles(FillMode::repeat_x(), 10, 1, 0, 0, 30, 1);
        assert_eq!(widths(&pairs), vec![10, 10, 10]);
    }

    #[test]
    fn stretch_xy_is_one_whole_to_whole_pair() {
        let pairs = plan_tiles(FillMode::stretch_xy(), 8, 6, 5, -2, 20, 12);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].src, Rect::new(0, 0, 8, 6));
        assert_eq!(pairs[0].dst, Rect::new(0, 0, 20, 12));
    }

    #[test]
    fn none_clips_to_overlap_on_both_ends() {
        // Placed at (-2, 3) over a 10x10 output: columns 0..6, rows 3..10.
        let pairs = plan_tiles(FillMode::none(), 8, 8, -2, 3, 10, 10);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].src, Rect::new(2, 0, 6, 7));
        assert_eq!(pairs[0].dst, Rect::new(0, 3, 6, 7));
    }

    #[test]
    fn none_with_no_overlap_is_empty_plan() {
        assert!(plan_tiles(FillMode::none(), 8, 8, 20, 0, 10, 10).is_empty());
        assert!(plan_tiles(FillMode::none(), 8, 8, -9, 0, 10, 10).is_empty());
    }

    #[test]
    fn mixed_repeat_x_none_y_iterates_row_major() {
        let pairs = plan_tiles(
            FillMode {
                x: AxisFill::Repeat,
                y: AxisFill::None,
            },
            10,
            3,
            0,
            1,
            25,
            8,
        );
        // One y span (clipped), three x spans.
        assert_eq!(pairs.len(), 3);
        for p in &pairs {
            assert_eq!(p.dst.y, 1);
            assert_eq!(p.dst.h, 3);
        }
        assert_eq!(widths(&pairs), vec![10, 10, 5]);
    }

    #[test]
    fn mixed_repeat_y_stretch_x_keeps_source_extent_on_x() {
        let pairs = plan_tiles(
            FillMode {
                x: AxisFill::Stretch,
                y: AxisFill::Repeat,
            },
            10,
            4,
            0,
            0,
            30,
            10,
        );
        assert_eq!(pairs.len(), 3); // two full rows + trail
        assert_eq!(pairs[0].src.w, 10);
        assert_eq!(pairs[0].dst.w, 30);
        assert_eq!(
            pairs.iter().map(|p| p.dst.h).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
    }

    #[test]
    fn degenerate_source_or_destination_plans_nothing() {
        assert!(plan_tiles(FillMode::repeat_xy(), 0, 4, 0, 0, 10, 10).is_empty());
        assert!(plan_tiles(FillMode::stretch_xy(), 4, 4, 0, 0, 0, 10).is_empty());
    }
}
