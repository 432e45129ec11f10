use crate::core::Rgba8Premul;

/// Per-pixel compositing rule. Not every operator is available for every
/// buffer-format pair; see [`alpha_func`] and [`mask_color_func`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderOp {
    #[default]
    Blend,
    Copy,
    Add,
    Sub,
    Mul,
    Mask,
}

/// Combine one source coverage byte with one destination coverage byte.
pub type AlphaFunc = fn(u8, u8) -> u8;

/// Composite a tinted coverage byte onto a premultiplied RGBA destination:
/// `(tint, mask, dst) -> dst`.
pub type MaskColorFunc = fn(Rgba8Premul, u8, Rgba8Premul) -> Rgba8Premul;

/// Operator table for the Alpha→Alpha kernel. `None` means the operator has
/// no 1-byte combine and the command must fail before any writes.
pub fn alpha_func(op: RenderOp) -> Option<AlphaFunc> {
    match op {
        RenderOp::Blend => Some(alpha_blend),
        RenderOp::Copy => Some(alpha_copy),
        RenderOp::Add => Some(alpha_add),
        RenderOp::Sub => Some(alpha_sub),
        RenderOp::Mul => Some(alpha_mul),
        RenderOp::Mask => None,
    }
}

/// Operator table for the Alpha→Rgba kernel. The mask byte scales the tint
/// before the combine.
pub fn mask_color_func(op: RenderOp) -> Option<MaskColorFunc> {
    match op {
        RenderOp::Blend => Some(mask_blend),
        RenderOp::Copy => Some(mask_copy),
        RenderOp::Add => Some(mask_add),
        RenderOp::Mul => Some(mask_mul),
        RenderOp::Sub | RenderOp::Mask => None,
    }
}

fn alpha_blend(s: u8, d: u8) -> u8 {
    s.saturating_add(mul_div255(u16::from(d), 255 - u16::from(s)))
}

fn alpha_copy(s: u8, _d: u8) -> u8 {
    s
}

fn alpha_add(s: u8, d: u8) -> u8 {
    d.saturating_add(s)
}

fn alpha_sub(s: u8, d: u8) -> u8 {
    d.saturating_sub(s)
}

fn alpha_mul(s: u8, d: u8) -> u8 {
    mul_div255(u16::from(s), u16::from(d))
}

/// Tint scaled by a coverage byte; stays premultiplied.
pub fn scale_tint(tint: Rgba8Premul, mask: u8) -> Rgba8Premul {
    let m = u16::from(mask);
    Rgba8Premul {
        r: mul_div255(u16::from(tint.r), m),
        g: mul_div255(u16::from(tint.g), m),
        b: mul_div255(u16::from(tint.b), m),
        a: mul_div255(u16::from(tint.a), m),
    }
}

/// Source-over of two premultiplied pixels.
pub fn over(src: Rgba8Premul, dst: Rgba8Premul) -> Rgba8Premul {
    if src.a == 0 && (src.r | src.g | src.b) == 0 {
        return dst;
    }
    let inv = 255 - u16::from(src.a);
    Rgba8Premul {
        r: src.r.saturating_add(mul_div255(u16::from(dst.r), inv)),
        g: src.g.saturating_add(mul_div255(u16::from(dst.g), inv)),
        b: src.b.saturating_add(mul_div255(u16::from(dst.b), inv)),
        a: src.a.saturating_add(mul_div255(u16::from(dst.a), inv)),
    }
}

fn mask_blend(tint: Rgba8Premul, mask: u8, dst: Rgba8Premul) -> Rgba8Premul {
    over(scale_tint(tint, mask), dst)
}

fn mask_copy(tint: Rgba8Premul, mask: u8, _dst: Rgba8Premul) -> Rgba8Premul {
    scale_tint(tint, mask)
}

fn mask_add(tint: Rgba8Premul, mask: u8, dst: Rgba8Premul) -> Rgba8Premul {
    let s = scale_tint(tint, mask);
    Rgba8Premul {
        r: dst.r.saturating_add(s.r),
        g: dst.g.saturating_add(s.g),
        b: dst.b.saturating_add(s.b),
        a: dst.a.saturating_add(s.a),
    }
}

fn mask_mul(tint: Rgba8Premul, mask: u8, dst: Rgba8Premul) -> Rgba8Premul {
    let s = scale_tint(tint, mask);
    Rgba8Premul {
        r: mul_div255(u16::from(s.r), u16::from(dst.r)),
        g: mul_div255(u16::from(s.g), u16::from(dst.g)),
        b: mul_div255(u16::from(s.b), u16::from(dst.b)),
        a: mul_div255(u16::from(s.a), u16::from(dst.a)),
    }
}

pub(crate) fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
