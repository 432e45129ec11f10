use std::sync::Arc;

use brixel::{
    AxisFill, BlendEngine, BufferId, DrawCommand, FillMode, PixelBuffer, PixelFormat, RenderOp,
    ScaleCache,
};

fn gradient_mask(id: u64, w: u32, h: u32) -> PixelBuffer {
    let data = (0..w * h).map(|i| (i % 251) as u8).collect();
    PixelBuffer::from_vec(BufferId(id), w, h, PixelFormat::Alpha, data).unwrap()
}

#[test]
fn threads_share_one_cached_copy() {
    let cache = ScaleCache::new();
    let src = gradient_mask(5, 16, 16);

    let handles: Vec<Arc<PixelBuffer>> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| cache.scaled(&src, 32, 32).unwrap()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    for pair in handles.windows(2) {
        assert_eq!(pair[0].data, pair[1].data);
    }
}

#[test]
fn concurrent_stretch_blends_onto_disjoint_outputs_succeed() {
    let engine = Arc::new(BlendEngine::default());
    let src = Arc::new(gradient_mask(9, 8, 8));

    let cmd = DrawCommand::default()
        .with_op(RenderOp::Copy)
        .with_fill(FillMode {
            x: AxisFill::Stretch,
            y: AxisFill::Stretch,
        });

    std::thread::scope(|scope| {
        for i in 0..4 {
            let engine = Arc::clone(&engine);
            let src = Arc::clone(&src);
            scope.spawn(move || {
                let mut out = PixelBuffer::new_alpha(BufferId(100 + i), 24, 24).unwrap();
                engine.blend(&cmd, &src, &mut out).unwrap();
                // Every worker sees the same resampled content.
                assert_eq!(out.alpha_at(0, 0), src.alpha_at(0, 0));
            });
        }
    });

    // All four workers asked for the same (source, size) copy.
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn clear_empties_the_cache() {
    let cache = ScaleCache::new();
    let a = gradient_mask(1, 8, 8);
    cache.scaled(&a, 4, 4).unwrap();
    cache.scaled(&a, 2, 2).unwrap();
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn handles_outlive_eviction() {
    let cache = ScaleCache::new();
    let src = gradient_mask(3, 8, 8);
    let handle = cache.scaled(&src, 4, 4).unwrap();
    cache.purge(BufferId(3));
    assert!(cache.is_empty());
    // The Arc keeps the copy alive for this consumer.
    assert_eq!(handle.width, 4);
    assert_eq!(handle.data.len(), 16);
}
