//! PDF packing: one page per image, written atomically.
//!
//! Baseline and progressive JPEGs (8-bit gray or RGB) are embedded byte for
//! byte as `DCTDecode` streams. Every other image is decoded with the `image`
//! crate and embedded losslessly as Flate-compressed 8-bit samples:
//! `DeviceGray` for grayscale sources, `DeviceRGB` otherwise. A non-opaque
//! alpha channel becomes an `SMask`.
//!
//! The page is exactly the image's size at `image_dpi` when set, otherwise at
//! the density the file declares, otherwise at 72 DPI (1 px = 1 pt).
//!
//! The document is serialised into a temp file next to the destination and
//! renamed into place only after every image was embedded, so a failed pack
//! never leaves a file at the output path.

use crate::config::{ConversionConfig, FALLBACK_IMAGE_DPI};
use crate::error::ConvertError;
use crate::pipeline::header;
use crate::progress::ConversionProgressCallback;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Shown as `/Producer` in the document info dictionary.
const PRODUCER: &str = concat!("pdfimg ", env!("CARGO_PKG_VERSION"));

/// Resource name of the page's single image XObject.
const IMAGE_RESOURCE: &str = "Im0";

/// Decoded image ready to embed.
struct EmbeddedImage {
    width: u32,
    height: u32,
    gray: bool,
    /// `FlateDecode` for decoded samples, `DCTDecode` for JPEG pass-through.
    filter: &'static str,
    /// Encoded colour samples.
    samples: Vec<u8>,
    /// Flate-compressed alpha samples, if any pixel is not fully opaque.
    alpha: Option<Vec<u8>>,
    /// Declared `(x, y)` DPI of the source file.
    density: Option<(f32, f32)>,
}

/// Pack `images` into a PDF at `output`, one page per image, in order.
///
/// Blocking; call from `spawn_blocking` in async contexts. Returns the page
/// count.
pub fn pack_images(
    images: &[PathBuf],
    output: &Path,
    config: &ConversionConfig,
    progress: &dyn ConversionProgressCallback,
) -> Result<usize, ConvertError> {
    let total = images.len();
    progress.on_conversion_start(total);

    let mut doc = build_document(images, config, progress)?;
    write_atomically(&mut doc, output)?;

    info!("Packed {} images into {}", total, output.display());
    progress.on_conversion_complete(total);
    Ok(total)
}

fn build_document(
    images: &[PathBuf],
    config: &ConversionConfig,
    progress: &dyn ConversionProgressCallback,
) -> Result<Document, ConvertError> {
    let total = images.len();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(total);

    for (i, path) in images.iter().enumerate() {
        let index = i + 1;
        progress.on_item_start(index, total);

        let embedded = match load_image(path) {
            Ok(e) => e,
            Err(e) => {
                progress.on_item_error(index, total, &e.to_string());
                return Err(e);
            }
        };

        let dpi = config
            .image_dpi
            .map(|d| (d, d))
            .or(embedded.density)
            .unwrap_or((FALLBACK_IMAGE_DPI, FALLBACK_IMAGE_DPI));

        let page_id = add_page(&mut doc, pages_id, embedded, dpi).map_err(|e| {
            let err = ConvertError::PackingFailed {
                path: path.clone(),
                detail: e,
            };
            progress.on_item_error(index, total, &err.to_string());
            err
        })?;
        kids.push(page_id.into());

        debug!("Embedded image {}/{}: {}", index, total, path.display());
        progress.on_item_complete(index, total, path);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
    });
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

/// Add the image XObject, its content stream and the page; returns the page id.
fn add_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    img: EmbeddedImage,
    dpi: (f32, f32),
) -> Result<lopdf::ObjectId, String> {
    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => img.width as i64,
        "Height" => img.height as i64,
        "ColorSpace" => if img.gray { "DeviceGray" } else { "DeviceRGB" },
        "BitsPerComponent" => 8,
        "Filter" => img.filter,
    };

    if let Some(alpha) = img.alpha {
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => img.width as i64,
                "Height" => img.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            alpha,
        ));
        image_dict.set("SMask", mask_id);
    }

    let image_id = doc.add_object(Stream::new(image_dict, img.samples));

    let (w_pt, h_pt) = page_size_pt(img.width, img.height, dpi);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    w_pt.into(),
                    0.into(),
                    0.into(),
                    h_pt.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| format!("content stream encoding failed: {e}"))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w_pt.into(), h_pt.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_RESOURCE => image_id,
            },
        },
    }))
}

/// Page size in points for an image of `width`×`height` pixels at `(x, y)` DPI.
pub(crate) fn page_size_pt(width: u32, height: u32, dpi: (f32, f32)) -> (f32, f32) {
    (width as f32 * 72.0 / dpi.0, height as f32 * 72.0 / dpi.1)
}

/// Read `path` and turn it into an embeddable image stream.
fn load_image(path: &Path) -> Result<EmbeddedImage, ConvertError> {
    let packing_failed = |detail: String| ConvertError::PackingFailed {
        path: path.to_path_buf(),
        detail,
    };

    let bytes = std::fs::read(path).map_err(|e| packing_failed(e.to_string()))?;
    // Sniff the real format so a mislabelled extension still decodes.
    let format = image::guess_format(&bytes).map_err(|e| packing_failed(e.to_string()))?;
    let density = header::density(&bytes, format);

    if format == ImageFormat::Jpeg {
        if let Some(frame) = header::jpeg_frame(&bytes).filter(|f| f.embeddable()) {
            debug!(
                "Embedding JPEG as-is: {} ({}x{}, {} components)",
                path.display(),
                frame.width,
                frame.height,
                frame.components
            );
            return Ok(EmbeddedImage {
                width: frame.width,
                height: frame.height,
                gray: frame.components == 1,
                filter: "DCTDecode",
                samples: bytes,
                alpha: None,
                density,
            });
        }
    }

    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| packing_failed(e.to_string()))?;
    let mut embedded = embed(&img).map_err(|e| packing_failed(e.to_string()))?;
    embedded.density = density;
    Ok(embedded)
}

fn embed(img: &DynamicImage) -> std::io::Result<EmbeddedImage> {
    let (width, height) = (img.width(), img.height());
    let color = img.color();
    let gray = !color.has_color();

    let (samples, alpha) = if color.has_alpha() {
        if gray {
            let la = img.to_luma_alpha8().into_raw();
            split_alpha(&la, 1)
        } else {
            let rgba = img.to_rgba8().into_raw();
            split_alpha(&rgba, 3)
        }
    } else if gray {
        (img.to_luma8().into_raw(), None)
    } else {
        (img.to_rgb8().into_raw(), None)
    };

    Ok(EmbeddedImage {
        width,
        height,
        gray,
        filter: "FlateDecode",
        samples: deflate(&samples)?,
        alpha: alpha.map(|a| deflate(&a)).transpose()?,
        density: None,
    })
}

/// Split interleaved samples with a trailing alpha byte into colour and alpha
/// planes. The alpha plane is dropped when every pixel is opaque.
fn split_alpha(interleaved: &[u8], color_channels: usize) -> (Vec<u8>, Option<Vec<u8>>) {
    let stride = color_channels + 1;
    let pixels = interleaved.len() / stride;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);

    for px in interleaved.chunks_exact(stride) {
        color.extend_from_slice(&px[..color_channels]);
        alpha.push(px[color_channels]);
    }

    if alpha.iter().all(|&a| a == u8::MAX) {
        (color, None)
    } else {
        (color, Some(alpha))
    }
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data)?;
    enc.finish()
}

/// Serialise `doc` to a temp file beside `output`, then rename it into place.
fn write_atomically(doc: &mut Document, output: &Path) -> Result<(), ConvertError> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| ConvertError::io(&parent, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfimg-")
        .suffix(".pdf.tmp")
        .tempfile_in(&parent)
        .map_err(|e| ConvertError::io(&parent, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        doc.save_to(&mut writer)
            .map_err(|e| ConvertError::io(output, std::io::Error::other(e.to_string())))?;
        writer.flush().map_err(|e| ConvertError::io(output, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| ConvertError::io(output, e))?;

    tmp.persist(output).map_err(|e| {
        warn!("Could not move packed PDF into place: {}", e.error);
        ConvertError::io(output, e.error)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgressCallback;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn media_box(doc: &Document, page_id: lopdf::ObjectId) -> Vec<f32> {
        doc.get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"MediaBox"))
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    #[test]
    fn pages_follow_input_order_and_size() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        RgbImage::from_pixel(30, 20, Rgb([200, 10, 10])).save(&a).unwrap();
        GrayImage::from_pixel(11, 40, Luma([90])).save(&b).unwrap();

        let out = tmp.path().join("out.pdf");
        let n = pack_images(
            &[b.clone(), a.clone()],
            &out,
            &ConversionConfig::default(),
            &NoopProgressCallback,
        )
        .unwrap();
        assert_eq!(n, 2);

        let doc = Document::load(&out).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 11.0, 40.0]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 30.0, 20.0]);
    }

    #[test]
    fn dpi_scales_page_size() {
        assert_eq!(page_size_pt(144, 72, (144.0, 144.0)), (72.0, 36.0));
        assert_eq!(page_size_pt(100, 50, (72.0, 72.0)), (100.0, 50.0));
        assert_eq!(page_size_pt(300, 300, (300.0, 150.0)), (72.0, 144.0));
    }

    #[test]
    fn corrupt_image_fails_without_output() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("1.png");
        let bad = tmp.path().join("2.png");
        RgbImage::new(4, 4).save(&good).unwrap();
        std::fs::write(&bad, b"definitely not a png").unwrap();

        let out = tmp.path().join("out.pdf");
        let err = pack_images(
            &[good, bad.clone()],
            &out,
            &ConversionConfig::default(),
            &NoopProgressCallback,
        )
        .unwrap_err();

        match err {
            ConvertError::PackingFailed { path, .. } => assert_eq!(path, bad),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
        // No stray temp files either.
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn existing_output_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let img = tmp.path().join("x.png");
        RgbImage::new(5, 5).save(&img).unwrap();
        let out = tmp.path().join("out.pdf");
        std::fs::write(&out, b"old junk").unwrap();

        pack_images(&[img], &out, &ConversionConfig::default(), &NoopProgressCallback).unwrap();
        assert_eq!(Document::load(&out).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn alpha_is_kept_only_when_translucent() {
        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        assert!(embed(&opaque).unwrap().alpha.is_none());

        let mut see_through = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        see_through.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let e = embed(&DynamicImage::ImageRgba8(see_through)).unwrap();
        assert!(e.alpha.is_some());
        assert!(!e.gray);
    }

    fn page_image(doc: &Document, page_id: lopdf::ObjectId) -> &Stream {
        let id = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"Resources"))
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"XObject"))
            .and_then(Object::as_dict)
            .and_then(|d| d.get(IMAGE_RESOURCE.as_bytes()))
            .and_then(Object::as_reference)
            .unwrap();
        doc.get_object(id).and_then(Object::as_stream).unwrap()
    }

    fn name<'a>(stream: &'a Stream, key: &[u8]) -> &'a [u8] {
        stream.dict.get(key).and_then(Object::as_name).unwrap()
    }

    #[test]
    fn jpeg_bytes_are_embedded_unchanged() {
        let tmp = TempDir::new().unwrap();
        let color = tmp.path().join("photo.jpg");
        let gray = tmp.path().join("scan.jpg");
        RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]))
            .save(&color)
            .unwrap();
        GrayImage::from_fn(12, 9, |x, _| Luma([(x * 20) as u8]))
            .save(&gray)
            .unwrap();

        let out = tmp.path().join("out.pdf");
        pack_images(
            &[color.clone(), gray.clone()],
            &out,
            &ConversionConfig::default(),
            &NoopProgressCallback,
        )
        .unwrap();

        let doc = Document::load(&out).unwrap();
        let pages = doc.get_pages();

        let first = page_image(&doc, pages[&1]);
        assert_eq!(name(first, b"Filter"), b"DCTDecode");
        assert_eq!(name(first, b"ColorSpace"), b"DeviceRGB");
        assert_eq!(first.content, std::fs::read(&color).unwrap());
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 40.0, 30.0]);

        let second = page_image(&doc, pages[&2]);
        assert_eq!(name(second, b"Filter"), b"DCTDecode");
        assert_eq!(name(second, b"ColorSpace"), b"DeviceGray");
        assert_eq!(second.content, std::fs::read(&gray).unwrap());
    }

    #[test]
    fn png_is_flate_encoded() {
        let tmp = TempDir::new().unwrap();
        let img = tmp.path().join("a.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&img).unwrap();
        let out = tmp.path().join("out.pdf");
        pack_images(&[img], &out, &ConversionConfig::default(), &NoopProgressCallback).unwrap();

        let doc = Document::load(&out).unwrap();
        let pages = doc.get_pages();
        assert_eq!(name(page_image(&doc, pages[&1]), b"Filter"), b"FlateDecode");
    }

    /// Re-encode a PNG with a `pHYs` chunk declaring `dpi` on both axes.
    fn with_phys(png: &[u8], dpi: f32) -> Vec<u8> {
        let ppm = (dpi / 0.0254).round() as u32;
        let mut body = Vec::new();
        body.extend_from_slice(&ppm.to_be_bytes());
        body.extend_from_slice(&ppm.to_be_bytes());
        body.push(1);

        let mut crc = flate2::Crc::new();
        crc.update(b"pHYs");
        crc.update(&body);

        let mut chunk = Vec::new();
        chunk.extend_from_slice(&(body.len() as u32).to_be_bytes());
        chunk.extend_from_slice(b"pHYs");
        chunk.extend_from_slice(&body);
        chunk.extend_from_slice(&crc.sum().to_be_bytes());

        // Signature (8) + IHDR chunk (25).
        let mut out = png[..33].to_vec();
        out.extend_from_slice(&chunk);
        out.extend_from_slice(&png[33..]);
        out
    }

    #[test]
    fn declared_density_sizes_the_page() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("plain.png");
        RgbImage::from_pixel(600, 300, Rgb([9, 9, 9])).save(&plain).unwrap();
        let scan = tmp.path().join("scan.png");
        std::fs::write(&scan, with_phys(&std::fs::read(&plain).unwrap(), 300.0)).unwrap();

        let out = tmp.path().join("out.pdf");
        pack_images(&[scan.clone()], &out, &ConversionConfig::default(), &NoopProgressCallback)
            .unwrap();
        let doc = Document::load(&out).unwrap();
        let mb = media_box(&doc, doc.get_pages()[&1]);
        assert!((mb[2] - 144.0).abs() < 0.01, "got {mb:?}");
        assert!((mb[3] - 72.0).abs() < 0.01, "got {mb:?}");

        // An explicit DPI wins over the file's own.
        let config = ConversionConfig::builder().image_dpi(72.0).build().unwrap();
        pack_images(&[scan], &out, &config, &NoopProgressCallback).unwrap();
        let doc = Document::load(&out).unwrap();
        assert_eq!(
            media_box(&doc, doc.get_pages()[&1]),
            vec![0.0, 0.0, 600.0, 300.0]
        );
    }

    #[test]
    fn split_alpha_planes() {
        let (c, a) = split_alpha(&[10, 20, 30, 128, 40, 50, 60, 255], 3);
        assert_eq!(c, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(a, Some(vec![128, 255]));
    }
}
