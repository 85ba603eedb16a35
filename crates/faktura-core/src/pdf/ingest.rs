//! PDF reading backed by lopdf and pdf-extract.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{quality::score_text_quality, PdfSource, Result, TextExtraction};
use crate::error::PdfError;

/// Default rendering DPI requested by callers.
pub const DEFAULT_RENDER_DPI: u32 = 150;

/// PDF collaborator backed by lopdf (structure, encryption, embedded
/// images) and pdf-extract (text). lopdf cannot rasterize vector
/// content, so "rendering" yields the pages' embedded image objects
/// encoded as PNG; a rasterizing backend can replace this without
/// touching the pipeline.
#[derive(Debug, Default)]
pub struct LopdfSource;

impl LopdfSource {
    pub fn new() -> Self {
        Self
    }
}

impl PdfSource for LopdfSource {
    fn read_embedded_text(&self, path: &Path, max_pages: usize) -> Result<TextExtraction> {
        let max_pages = max_pages.max(1);
        let (document, raw_data) = open_document(path)?;

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages {
                path: path.to_path_buf(),
            });
        }

        let full_text =
            pdf_extract::extract_text_from_mem(&raw_data).map_err(|e| PdfError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        // pdf-extract returns whole-document text; attribute lines to
        // pages by an even split so the page bound still applies.
        let pages_to_read = page_count.min(max_pages);
        let page_texts = split_text_by_page(&full_text, page_count, pages_to_read);

        let combined_text = page_texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let quality_score = score_text_quality(&combined_text);

        debug!(
            pages = pages_to_read,
            chars = combined_text.chars().count(),
            quality = quality_score,
            "extracted embedded text"
        );

        Ok(TextExtraction {
            pages_examined: page_texts.len(),
            page_texts,
            combined_text,
            quality_score,
        })
    }

    fn render_pages(&self, path: &Path, max_pages: usize, dpi: u32) -> Result<Vec<Vec<u8>>> {
        let max_pages = max_pages.max(1);
        let (document, _) = open_document(path)?;

        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(PdfError::NoPages {
                path: path.to_path_buf(),
            });
        }
        debug!(dpi, max_pages, "collecting page images");

        let mut page_images: Vec<DynamicImage> = Vec::new();
        for (&page_number, &page_id) in pages.iter().take(max_pages) {
            match first_page_image(&document, page_id) {
                Some(image) => page_images.push(image),
                None => trace!(page = page_number, "no image object on page"),
            }
        }

        // Some producers park page scans outside the page resource
        // tree; fall back to scanning every object in the document.
        if page_images.is_empty() {
            page_images = scan_document_images(&document)
                .into_iter()
                .take(max_pages)
                .collect();
        }

        if page_images.is_empty() {
            return Err(PdfError::Render {
                path: path.to_path_buf(),
                reason: "no renderable page images found".to_string(),
            });
        }

        page_images
            .into_iter()
            .map(|image| encode_png(&image, path))
            .collect()
    }
}

fn open_document(path: &Path) -> Result<(Document, Vec<u8>)> {
    let data = std::fs::read(path).map_err(|e| PdfError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut document = Document::load_mem(&data).map_err(|e| PdfError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if document.is_encrypted() {
        // Empty-password encryption is common and openable; anything
        // else is a hard stop with no fallback.
        if document.decrypt("").is_err() {
            return Err(PdfError::Encrypted {
                path: path.to_path_buf(),
            });
        }
        debug!("decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        document.save_to(&mut decrypted).map_err(|e| PdfError::Read {
            path: path.to_path_buf(),
            reason: format!("failed to save decrypted PDF: {e}"),
        })?;
        return Ok((document, decrypted));
    }

    Ok((document, data))
}

fn split_text_by_page(full_text: &str, page_count: usize, pages_to_read: usize) -> Vec<String> {
    let lines: Vec<&str> = full_text.lines().collect();
    if page_count <= 1 {
        return vec![full_text.to_string()];
    }

    let lines_per_page = (lines.len() / page_count).max(1);
    (0..pages_to_read)
        .map(|page| {
            let start = (page * lines_per_page).min(lines.len());
            let end = if page == page_count - 1 {
                lines.len()
            } else {
                ((page + 1) * lines_per_page).min(lines.len())
            };
            lines[start..end].join("\n")
        })
        .collect()
}

fn first_page_image(document: &Document, page_id: ObjectId) -> Option<DynamicImage> {
    let resources = page_resources(document, page_id)?;
    let xobjects = resources.get(b"XObject").ok()?;
    let (_, Object::Dictionary(xobject_dict)) = document.dereference(xobjects).ok()? else {
        return None;
    };

    for (_name, object_ref) in xobject_dict.iter() {
        if let Ok((_, object)) = document.dereference(object_ref) {
            if let Some(image) = image_from_object(document, object) {
                return Some(image);
            }
        }
    }
    None
}

fn scan_document_images(document: &Document) -> Vec<DynamicImage> {
    let images: Vec<DynamicImage> = document
        .objects
        .values()
        .filter_map(|object| image_from_object(document, object))
        .collect();
    debug!(count = images.len(), "scanned document for image objects");
    images
}

fn image_from_object(document: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!(width, height, "found image object");

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };
        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG: the raw stream content already is the file.
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("unsupported image codec");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|object| match object {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => document
                .get_object(*r)
                .ok()
                .and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!(bits, "unsupported bits per component");
        return None;
    }

    decode_raw_samples(&data, width, height, color_space)
}

fn decode_raw_samples(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
) -> Option<DynamicImage> {
    let pixel_count = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixel_count * 3 => {
            for chunk in data[..pixel_count * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
        }
        b"DeviceGray" | b"G" if data.len() >= pixel_count => {
            for &gray in &data[..pixel_count] {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
        _ => {
            trace!(
                data_len = data.len(),
                "could not decode raw image samples"
            );
            return None;
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

/// Walk the page tree upwards for a Resources dictionary.
fn page_resources(document: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
    let Object::Dictionary(dict) = document.get_object(node_id).ok()? else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(resources_dict))) = document.dereference(resources) {
            return Some(resources_dict.clone());
        }
    }

    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
        return page_resources(document, *parent_id);
    }
    None
}

fn encode_png(image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| PdfError::Render {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_reports_read_error() {
        let err = open_document(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, PdfError::Read { .. }));
    }

    #[test]
    fn test_garbage_bytes_report_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = open_document(&path).unwrap_err();
        assert!(matches!(err, PdfError::Read { .. }));
    }

    #[test]
    fn test_split_text_by_page_bounds_pages() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");

        let pages = split_text_by_page(&text, 5, 2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], "line 1\nline 2");
        assert_eq!(pages[1], "line 3\nline 4");
    }

    #[test]
    fn test_split_text_single_page_keeps_everything() {
        let pages = split_text_by_page("a\nb\nc", 1, 1);
        assert_eq!(pages, vec!["a\nb\nc".to_string()]);
    }

    #[test]
    fn test_decode_raw_rgb_samples() {
        let data = vec![10u8, 20, 30, 40, 50, 60];
        let image = decode_raw_samples(&data, 2, 1, b"DeviceRGB").unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
    }

    #[test]
    fn test_decode_rejects_short_buffers() {
        assert!(decode_raw_samples(&[1, 2, 3], 2, 2, b"DeviceRGB").is_none());
        assert!(decode_raw_samples(&[1, 2], 2, 2, b"DeviceGray").is_none());
    }
}
