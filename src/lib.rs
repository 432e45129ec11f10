//! Brixel is a CPU image-compositing engine.
//!
//! Given two in-memory pixel buffers (single-channel coverage masks or
//! premultiplied RGBA) it blends one onto the other under a per-axis fill
//! policy (none, stretch, repeat), an optional tint, a compositing operator,
//! and an optional clip rectangle.
//!
//! # Pipeline overview
//!
//! 1. **Select**: [`BlendKernel::select`] picks the inner loop for the
//!    `(input format, output format)` pair.
//! 2. **Scale**: a stretch axis pulls a resized source copy from the shared
//!    [`ScaleCache`] (the CPU kernels never resample).
//! 3. **Tile**: [`tile::plan_tiles`] turns the fill mode into an ordered,
//!    deterministic sequence of rectangle pairs.
//! 4. **Blit**: one kernel call per pair; the Rgba→Rgba pair delegates to the
//!    [`Rasterizer`] collaborator instead of looping itself.
//!
//! The engine is synchronous and lock-free on the pixel path; only the scale
//! cache index is shared, behind a mutex. Failures are typed
//! ([`BrixelError`]) and always precede the first write; degenerate geometry
//! is a successful no-op.
#![forbid(unsafe_code)]

pub mod blit;
pub mod command;
pub mod convert;
pub mod core;
pub mod engine;
pub mod error;
pub mod ops;
pub mod program;
pub mod raster;
pub mod scale;
pub mod tile;

pub use command::DrawCommand;
pub use core::{AxisFill, BufferId, FillMode, PixelBuffer, PixelFormat, Rect, Rgba8Premul};
pub use engine::{BlendEngine, BlendKernel};
pub use error::{BrixelError, BrixelResult};
pub use ops::RenderOp;
pub use program::{BufferPool, FilterProgram, ProgramStep};
pub use raster::{CpuRasterizer, DrawContext, Rasterizer};
pub use scale::ScaleCache;
