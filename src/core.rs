use crate::error::{BrixelError, BrixelResult};

/// Identity of a buffer within the surrounding canvas system.
///
/// Ids are assigned by whoever creates the buffers; the scaler cache keys
/// scaled copies by `(BufferId, target size)`, so two buffers sharing an id
/// are assumed to share content.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BufferId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Single-channel 8-bit coverage mask.
    Alpha,
    /// 4-channel premultiplied color, 32 bits/pixel.
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Alpha => 1,
            PixelFormat::Rgba => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Intersection; the result may be empty (`is_empty`).
    pub fn intersect(self, other: Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        Rect::new(x, y, r - x, b - y)
    }

    pub fn contains_rect(self, other: Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Opaque white; the identity tint (leaves source pixels unchanged).
    pub fn opaque_white() -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

impl Default for Rgba8Premul {
    fn default() -> Self {
        Self::opaque_white()
    }
}

/// Per-axis fill policy. `None` clips, `Stretch` scales the source to the
/// destination extent, `Repeat` tiles it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisFill {
    #[default]
    None,
    Stretch,
    Repeat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FillMode {
    pub x: AxisFill,
    pub y: AxisFill,
}

impl FillMode {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn stretch_xy() -> Self {
        Self {
            x: AxisFill::Stretch,
            y: AxisFill::Stretch,
        }
    }

    pub fn repeat_xy() -> Self {
        Self {
            x: AxisFill::Repeat,
            y: AxisFill::Repeat,
        }
    }

    pub fn repeat_x() -> Self {
        Self {
            x: AxisFill::Repeat,
            y: AxisFill::None,
        }
    }

    pub fn repeat_y() -> Self {
        Self {
            x: AxisFill::None,
            y: AxisFill::Repeat,
        }
    }
}

/// An in-memory pixel plane. Row stride equals `width`, no padding.
///
/// Rgba data is premultiplied by convention; the engine trusts its producers
/// on this and never re-checks (see `Rgba8Premul`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub id: BufferId,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer. Allocation failure (or a size overflow) is
    /// reported as `BrixelError::Allocation` rather than aborting.
    pub fn new(id: BufferId, width: u32, height: u32, format: PixelFormat) -> BrixelResult<Self> {
        let len = byte_len(width, height, format)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            BrixelError::allocation(format!(
                "cannot allocate {}x{} {:?} buffer ({len} bytes)",
                width, height, format
            ))
        })?;
        data.resize(len, 0);
        Ok(Self {
            id,
            width,
            height,
            format,
            data,
        })
    }

    pub fn new_alpha(id: BufferId, width: u32, height: u32) -> BrixelResult<Self> {
        Self::new(id, width, height, PixelFormat::Alpha)
    }

    pub fn new_rgba(id: BufferId, width: u32, height: u32) -> BrixelResult<Self> {
        Self::new(id, width, height, PixelFormat::Rgba)
    }

    /// Wrap existing pixel storage. The length must match `w * h * bpp`.
    pub fn from_vec(
        id: BufferId,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> BrixelResult<Self> {
        let len = byte_len(width, height, format)?;
        if data.len() != len {
            return Err(BrixelError::validation(format!(
                "pixel storage length {} does not match {}x{} {:?} ({len} bytes)",
                data.len(),
                width,
                height,
                format
            )));
        }
        Ok(Self {
            id,
            width,
            height,
            format,
            data,
        })
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Zero-extent buffers are legal and composite as silent no-ops.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        debug_assert_eq!(self.format, PixelFormat::Alpha);
        self.data[(y * self.width + x) as usize]
    }

    pub fn rgba_at(&self, x: u32, y: u32) -> Rgba8Premul {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        let i = ((y * self.width + x) * 4) as usize;
        Rgba8Premul {
            r: self.data[i],
            g: self.data[i + 1],
            b: self.data[i + 2],
            a: self.data[i + 3],
        }
    }

    pub fn put_alpha(&mut self, x: u32, y: u32, v: u8) {
        debug_assert_eq!(self.format, PixelFormat::Alpha);
        let w = self.width;
        self.data[(y * w + x) as usize] = v;
    }

    pub fn put_rgba(&mut self, x: u32, y: u32, px: Rgba8Premul) {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i] = px.r;
        self.data[i + 1] = px.g;
        self.data[i + 2] = px.b;
        self.data[i + 3] = px.a;
    }

    pub fn fill_rgba(&mut self, px: Rgba8Premul) {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[px.r, px.g, px.b, px.a]);
        }
    }
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> BrixelResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| BrixelError::allocation("buffer size overflow"))
}
