use image::{GrayImage, RgbaImage};

use crate::core::{BufferId, PixelBuffer, PixelFormat, Rgba8Premul};
use crate::error::{BrixelError, BrixelResult};

/// Ingest a straight-alpha image as a premultiplied Rgba buffer.
pub fn buffer_from_rgba_image(id: BufferId, img: &RgbaImage) -> BrixelResult<PixelBuffer> {
    let mut buf = PixelBuffer::new_rgba(id, img.width(), img.height())?;
    for (chunk, px) in buf.data.chunks_exact_mut(4).zip(img.pixels()) {
        let p = Rgba8Premul::from_straight_rgba(px.0[0], px.0[1], px.0[2], px.0[3]);
        chunk.copy_from_slice(&[p.r, p.g, p.b, p.a]);
    }
    Ok(buf)
}

/// Ingest a grayscale image as a coverage mask.
pub fn buffer_from_gray_image(id: BufferId, img: &GrayImage) -> BrixelResult<PixelBuffer> {
    PixelBuffer::from_vec(
        id,
        img.width(),
        img.height(),
        PixelFormat::Alpha,
        img.as_raw().clone(),
    )
}

/// Export an Rgba buffer as a straight-alpha image (unpremultiplied, rounded).
pub fn buffer_to_rgba_image(buf: &PixelBuffer) -> BrixelResult<RgbaImage> {
    if buf.format != PixelFormat::Rgba {
        return Err(BrixelError::validation("expected an rgba buffer"));
    }
    let mut img = RgbaImage::new(buf.width, buf.height);
    for (px, chunk) in img.pixels_mut().zip(buf.data.chunks_exact(4)) {
        let a = chunk[3];
        px.0 = [
            unpremul(chunk[0], a),
            unpremul(chunk[1], a),
            unpremul(chunk[2], a),
            a,
        ];
    }
    Ok(img)
}

pub fn buffer_to_gray_image(buf: &PixelBuffer) -> BrixelResult<GrayImage> {
    if buf.format != PixelFormat::Alpha {
        return Err(BrixelError::validation("expected an alpha buffer"));
    }
    GrayImage::from_raw(buf.width, buf.height, buf.data.clone())
        .ok_or_else(|| BrixelError::validation("mask storage does not match dimensions"))
}

fn unpremul(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let v = (u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a);
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_image_round_trips_through_premultiply() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 128, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([200, 100, 50, 128]));

        let buf = buffer_from_rgba_image(BufferId(1), &img).unwrap();
        assert_eq!(
            buf.rgba_at(0, 0),
            Rgba8Premul {
                r: 255,
                g: 128,
                b: 0,
                a: 255
            }
        );

        let back = buffer_to_rgba_image(&buf).unwrap();
        // Opaque pixels are exact; partially transparent ones are within
        // premultiply rounding.
        assert_eq!(back.get_pixel(0, 0).0, [255, 128, 0, 255]);
        let p = back.get_pixel(1, 0).0;
        assert!((i16::from(p[0]) - 200).abs() <= 1);
        assert!((i16::from(p[1]) - 100).abs() <= 1);
        assert!((i16::from(p[2]) - 50).abs() <= 1);
        assert_eq!(p[3], 128);
    }

    #[test]
    fn fully_transparent_pixels_export_as_zero() {
        let buf = PixelBuffer::new_rgba(BufferId(1), 1, 1).unwrap();
        let img = buffer_to_rgba_image(&buf).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn gray_image_maps_to_mask_bytes() {
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(1, 1, image::Luma([200]));
        let buf = buffer_from_gray_image(BufferId(1), &img).unwrap();
        assert_eq!(buf.format, PixelFormat::Alpha);
        assert_eq!(buf.alpha_at(1, 1), 200);
        assert_eq!(buf.alpha_at(0, 0), 0);

        let back = buffer_to_gray_image(&buf).unwrap();
        assert_eq!(back.get_pixel(1, 1).0, [200]);
    }
}
