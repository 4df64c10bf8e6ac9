//! Header sniffing for packed images.
//!
//! Reads just enough of a JPEG or PNG file to embed it without a full decode
//! (JPEG frame geometry) and to size its page from the file's own pixel
//! density (JFIF `APP0`, PNG `pHYs`). Nothing here validates sample data.

use image::ImageFormat;

/// Geometry of a JPEG's first frame header (`SOFn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegFrame {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub precision: u8,
}

impl JpegFrame {
    /// Whether the bytes can go into a PDF `DCTDecode` stream as-is.
    ///
    /// CMYK/YCCK frames and 12-bit samples take the decode path instead.
    pub fn embeddable(&self) -> bool {
        self.precision == 8 && matches!(self.components, 1 | 3) && self.width > 0 && self.height > 0
    }
}

/// Pixel density in dots per inch for `(x, y)`, if the file declares one.
pub(crate) fn density(data: &[u8], format: ImageFormat) -> Option<(f32, f32)> {
    match format {
        ImageFormat::Jpeg => jpeg_density(data),
        ImageFormat::Png => png_density(data),
        _ => None,
    }
}

/// Marker segments up to the first scan, as `(marker, payload)`.
fn jpeg_segments(data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut out = Vec::new();
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return out;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            break;
        }
        // Fill bytes before a marker.
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            break;
        };
        pos += 1;

        // RSTn and TEM have no length field.
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            continue;
        }
        if marker == 0xD9 {
            break;
        }

        let Some(len_bytes) = data.get(pos..pos + 2) else {
            break;
        };
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if len < 2 {
            break;
        }
        let Some(payload) = data.get(pos + 2..pos + len) else {
            break;
        };
        out.push((marker, payload));
        pos += len;

        if marker == 0xDA {
            break;
        }
    }
    out
}

fn is_sof(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Frame header of a JPEG file, or `None` if it has no readable `SOFn`.
pub(crate) fn jpeg_frame(data: &[u8]) -> Option<JpegFrame> {
    let (_, sof) = jpeg_segments(data)
        .into_iter()
        .find(|(marker, _)| is_sof(*marker))?;
    if sof.len() < 6 {
        return None;
    }
    Some(JpegFrame {
        precision: sof[0],
        height: u16::from_be_bytes([sof[1], sof[2]]) as u32,
        width: u16::from_be_bytes([sof[3], sof[4]]) as u32,
        components: sof[5],
    })
}

fn jpeg_density(data: &[u8]) -> Option<(f32, f32)> {
    let (_, app0) = jpeg_segments(data)
        .into_iter()
        .find(|(marker, payload)| *marker == 0xE0 && payload.starts_with(b"JFIF\0"))?;
    if app0.len() < 12 {
        return None;
    }
    let x = u16::from_be_bytes([app0[8], app0[9]]) as f32;
    let y = u16::from_be_bytes([app0[10], app0[11]]) as f32;
    let per_inch = match app0[7] {
        1 => 1.0,
        2 => 2.54,
        // 0 is an aspect ratio only.
        _ => return None,
    };
    positive(x * per_inch, y * per_inch)
}

fn png_density(data: &[u8]) -> Option<(f32, f32)> {
    const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
    if !data.starts_with(SIGNATURE) {
        return None;
    }

    let mut pos = SIGNATURE.len();
    while let Some(head) = data.get(pos..pos + 8) {
        let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
        let kind = &head[4..8];
        let body = data.get(pos + 8..pos + 8 + len)?;

        match kind {
            b"pHYs" if body.len() >= 9 => {
                // Unit 1 is pixels per metre; 0 is an aspect ratio only.
                if body[8] != 1 {
                    return None;
                }
                let x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f32;
                let y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as f32;
                return positive(x * 0.0254, y * 0.0254);
            }
            // pHYs must come before the image data.
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        pos += 8 + len + 4;
    }
    None
}

fn positive(x: f32, y: f32) -> Option<(f32, f32)> {
    (x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0).then_some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, JFIF APP0 with the given unit/density, 8-bit gray SOF0 30×20, SOS.
    fn tiny_jpeg(units: u8, x: u16, y: u16) -> Vec<u8> {
        let mut v = vec![0xFF, 0xD8];
        v.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        v.extend_from_slice(b"JFIF\0");
        v.extend_from_slice(&[1, 1, units]);
        v.extend_from_slice(&x.to_be_bytes());
        v.extend_from_slice(&y.to_be_bytes());
        v.extend_from_slice(&[0, 0]);
        v.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 8, 0, 20, 0, 30, 1, 1, 0x11, 0]);
        v.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 1, 1, 0, 0, 0x3F, 0]);
        v
    }

    fn png_with_chunk(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
        v.extend_from_slice(&13u32.to_be_bytes());
        v.extend_from_slice(b"IHDR");
        v.extend_from_slice(&[0; 13]);
        v.extend_from_slice(&[0; 4]);
        v.extend_from_slice(&(body.len() as u32).to_be_bytes());
        v.extend_from_slice(kind);
        v.extend_from_slice(body);
        v.extend_from_slice(&[0; 4]);
        v
    }

    #[test]
    fn reads_jpeg_frame() {
        let frame = jpeg_frame(&tiny_jpeg(0, 1, 1)).unwrap();
        assert_eq!(
            frame,
            JpegFrame {
                width: 30,
                height: 20,
                components: 1,
                precision: 8
            }
        );
        assert!(frame.embeddable());
    }

    #[test]
    fn cmyk_frames_are_not_embeddable() {
        let frame = JpegFrame {
            width: 10,
            height: 10,
            components: 4,
            precision: 8,
        };
        assert!(!frame.embeddable());
    }

    #[test]
    fn jfif_density_units() {
        assert_eq!(jpeg_density(&tiny_jpeg(1, 300, 150)), Some((300.0, 150.0)));
        let (x, _) = jpeg_density(&tiny_jpeg(2, 100, 100)).unwrap();
        assert!((x - 254.0).abs() < 0.01);
        assert_eq!(jpeg_density(&tiny_jpeg(0, 1, 1)), None);
        assert_eq!(jpeg_density(&tiny_jpeg(1, 0, 0)), None);
    }

    #[test]
    fn png_phys_density() {
        let mut body = Vec::new();
        body.extend_from_slice(&11811u32.to_be_bytes());
        body.extend_from_slice(&11811u32.to_be_bytes());
        body.push(1);
        let (x, y) = png_density(&png_with_chunk(b"pHYs", &body)).unwrap();
        assert!((x - 300.0).abs() < 0.1, "got {x}");
        assert!((y - 300.0).abs() < 0.1, "got {y}");

        body[8] = 0;
        assert_eq!(png_density(&png_with_chunk(b"pHYs", &body)), None);
        assert_eq!(png_density(&png_with_chunk(b"IDAT", &[1, 2, 3])), None);
    }

    #[test]
    fn garbage_has_no_header() {
        assert_eq!(jpeg_frame(b"definitely not a jpeg"), None);
        assert_eq!(density(b"nope", ImageFormat::Png), None);
        assert_eq!(density(&tiny_jpeg(1, 96, 96), ImageFormat::Gif), None);
    }
}
