use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{BufferId, PixelBuffer};
use crate::error::BrixelResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ScaleKey {
    source: BufferId,
    width: u32,
    height: u32,
}

/// Shared cache of resized buffer copies, keyed by `(source id, target size)`.
///
/// The lock guards only the index; resampling runs outside the critical
/// section, so concurrent blends contend on map operations, never on pixel
/// work. Handles are `Arc`s: dropping the last one releases the copy, and the
/// cache retains its own reference for reuse until [`ScaleCache::purge`] or
/// [`ScaleCache::clear`].
///
/// The cache cannot see content changes. A producer that mutates a source
/// buffer must `purge(id)` before the next blend.
#[derive(Debug, Default)]
pub struct ScaleCache {
    index: Mutex<HashMap<ScaleKey, Arc<PixelBuffer>>>,
}

impl ScaleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or create a copy of `src` resampled to exactly `width x height`.
    pub fn scaled(
        &self,
        src: &PixelBuffer,
        width: u32,
        height: u32,
    ) -> BrixelResult<Arc<PixelBuffer>> {
        let key = ScaleKey {
            source: src.id,
            width,
            height,
        };
        if let Some(hit) = self.lock().get(&key) {
            tracing::trace!(source = src.id.0, width, height, "scale cache hit");
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(source = src.id.0, width, height, "scale cache miss");
        let fresh = Arc::new(resample(src, width, height)?);

        // A racing thread may have inserted meanwhile; keep whichever copy
        // landed first and drop the other.
        let mut index = self.lock();
        Ok(Arc::clone(
            index.entry(key).or_insert_with(|| Arc::clone(&fresh)),
        ))
    }

    /// Drop all cached copies of one source buffer.
    pub fn purge(&self, source: BufferId) {
        self.lock().retain(|k, _| k.source != source);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ScaleKey, Arc<PixelBuffer>>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bilinear resample into a new buffer of the requested size. Q16 fixed
/// point, works per channel for both formats.
fn resample(src: &PixelBuffer, width: u32, height: u32) -> BrixelResult<PixelBuffer> {
    let mut out = PixelBuffer::new(src.id, width, height, src.format)?;
    if src.is_degenerate() || out.is_degenerate() {
        return Ok(out);
    }
    if src.width == width && src.height == height {
        out.data.copy_from_slice(&src.data);
        return Ok(out);
    }

    let bpp = src.format.bytes_per_pixel();
    let sw = src.width as usize;
    let step_x = ((u64::from(src.width)) << 16) / u64::from(width);
    let step_y = ((u64::from(src.height)) << 16) / u64::from(height);

    for y in 0..height as usize {
        let fy = y as u64 * step_y;
        let iy = (fy >> 16) as usize;
        let ty = fy & 0xFFFF;
        let iy1 = (iy + 1).min(src.height as usize - 1);

        for x in 0..width as usize {
            let fx = x as u64 * step_x;
            let ix = (fx >> 16) as usize;
            let tx = fx & 0xFFFF;
            let ix1 = (ix + 1).min(sw - 1);

            let base = (y * width as usize + x) * bpp;
            for c in 0..bpp {
                let p00 = u64::from(src.data[(iy * sw + ix) * bpp + c]);
                let p01 = u64::from(src.data[(iy * sw + ix1) * bpp + c]);
                let p10 = u64::from(src.data[(iy1 * sw + ix) * bpp + c]);
                let p11 = u64::from(src.data[(iy1 * sw + ix1) * bpp + c]);
                let top = (p00 * (65536 - tx) + p01 * tx) >> 16;
                let bot = (p10 * (65536 - tx) + p11 * tx) >> 16;
                out.data[base + c] = ((top * (65536 - ty) + bot * ty) >> 16) as u8;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PixelFormat;

    fn gradient_mask(id: u64, w: u32, h: u32) -> PixelBuffer {
        let data = (0..w * h).map(|i| (i % 251) as u8).collect();
        PixelBuffer::from_vec(BufferId(id), w, h, PixelFormat::Alpha, data).unwrap()
    }

    #[test]
    fn hit_returns_the_same_handle() {
        let cache = ScaleCache::new();
        let src = gradient_mask(7, 8, 8);
        let a = cache.scaled(&src, 16, 16).unwrap();
        let b = cache.scaled(&src, 16, 16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_sizes_are_distinct_entries() {
        let cache = ScaleCache::new();
        let src = gradient_mask(7, 8, 8);
        let a = cache.scaled(&src, 16, 16).unwrap();
        let b = cache.scaled(&src, 16, 8).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn purge_forgets_one_source_only() {
        let cache = ScaleCache::new();
        let a = gradient_mask(1, 8, 8);
        let b = gradient_mask(2, 8, 8);
        cache.scaled(&a, 4, 4).unwrap();
        cache.scaled(&b, 4, 4).unwrap();
        cache.purge(BufferId(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn resample_to_same_size_copies() {
        let src = gradient_mask(1, 8, 8);
        let out = resample(&src, 8, 8).unwrap();
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn resample_preserves_constant_images() {
        let src =
            PixelBuffer::from_vec(BufferId(1), 4, 4, PixelFormat::Alpha, vec![99u8; 16]).unwrap();
        let up = resample(&src, 9, 7).unwrap();
        assert!(up.data.iter().all(|&b| b == 99));
        let down = resample(&src, 2, 2).unwrap();
        assert!(down.data.iter().all(|&b| b == 99));
    }

    #[test]
    fn resample_output_has_requested_dimensions() {
        let src = gradient_mask(1, 10, 3);
        let out = resample(&src, 25, 4).unwrap();
        assert_eq!((out.width, out.height), (25, 4));
        assert_eq!(out.data.len(), 100);
        assert_eq!(out.format, PixelFormat::Alpha);
    }
}
