//! Raw page content as produced by the document parser.
//!
//! A `PageContent` carries everything the classifier and the recognition
//! tracks need: the native text layer, its blocks, and the embedded images
//! with their raw bytes. Image bytes travel as base64 strings when
//! (de)serialized so a parser can hand pages over as JSON.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Canonical reading order: top-to-bottom, then left-to-right.
    pub fn reading_order(&self, other: &BBox) -> Ordering {
        self.y0
            .total_cmp(&other.y0)
            .then_with(|| self.x0.total_cmp(&other.x0))
    }
}

/// A native text block, already in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: BBox,
    pub text: String,
}

/// An image embedded in a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub bbox: BBox,
    /// Format hint from the parser (e.g. "png", "jpeg").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Raw encoded image bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn new(bbox: BBox, data: Vec<u8>) -> Self {
        Self {
            bbox,
            format: None,
            data,
        }
    }

    /// MIME type sniffed from the bytes, falling back to the format hint.
    pub fn mime_type(&self) -> &'static str {
        let sniffed = infer::get(&self.data)
            .map(|kind| kind.mime_type())
            .filter(|mime| mime.starts_with("image/"));
        if let Some(mime) = sniffed {
            return mime;
        }
        match self.format.as_deref().map(|f| f.to_lowercase()) {
            Some(f) if f == "jpg" || f == "jpeg" => "image/jpeg",
            Some(f) if f == "tif" || f == "tiff" => "image/tiff",
            Some(f) if f == "bmp" => "image/bmp",
            Some(f) if f == "gif" => "image/gif",
            Some(f) if f == "webp" => "image/webp",
            _ => "image/png",
        }
    }
}

/// One page of raw parser output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based page index.
    pub index: u32,
    pub width: f32,
    pub height: f32,
    /// Full native text layer as reported by the parser.
    #[serde(default)]
    pub native_text: String,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default)]
    pub images: Vec<EmbeddedImage>,
}

impl PageContent {
    pub fn new(index: u32, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            native_text: String::new(),
            text_blocks: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Set the native text layer as a single block covering the page.
    pub fn with_native_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text_blocks = vec![TextBlock {
            bbox: BBox::new(0.0, 0.0, self.width, self.height),
            text: text.clone(),
        }];
        self.native_text = text;
        self
    }

    pub fn with_image(mut self, image: EmbeddedImage) -> Self {
        self.images.push(image);
        self
    }

    /// Text blocks that carry text, one per line, in parser order.
    pub fn block_text(&self) -> String {
        let blocks: Vec<&str> = self
            .text_blocks
            .iter()
            .map(|block| block.text.trim_end_matches(['\n', '\r']))
            .filter(|text| !text.trim().is_empty())
            .collect();
        blocks.join("\n")
    }

    /// Length of the trimmed native text, in characters. Parsers that only
    /// emit text blocks are measured by their joined block text.
    pub fn native_text_chars(&self) -> usize {
        let layer = self.native_text.trim();
        if !layer.is_empty() {
            return layer.chars().count();
        }
        self.block_text().trim().chars().count()
    }

    /// Number of text blocks that carry any text.
    pub fn text_block_count(&self) -> usize {
        self.text_blocks
            .iter()
            .filter(|b| !b.text.trim().is_empty())
            .count()
    }

    /// Number of image blocks that carry image data.
    pub fn image_block_count(&self) -> usize {
        self.images.iter().filter(|i| !i.data.is_empty()).count()
    }

    /// Embedded images paired with their original index, in reading order.
    ///
    /// The sort is stable, so images sharing a position keep parser order.
    pub fn images_in_reading_order(&self) -> Vec<(usize, &EmbeddedImage)> {
        let mut images: Vec<(usize, &EmbeddedImage)> = self.images.iter().enumerate().collect();
        images.sort_by(|(_, a), (_, b)| a.bbox.reading_order(&b.bbox));
        images
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn images_sorted_top_to_bottom_then_left_to_right() {
        let page = PageContent::new(1, 600.0, 800.0)
            .with_image(EmbeddedImage::new(BBox::new(300.0, 400.0, 500.0, 500.0), vec![1]))
            .with_image(EmbeddedImage::new(BBox::new(300.0, 100.0, 500.0, 200.0), vec![2]))
            .with_image(EmbeddedImage::new(BBox::new(10.0, 100.0, 200.0, 200.0), vec![3]));

        let order: Vec<usize> = page
            .images_in_reading_order()
            .into_iter()
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn native_text_length_ignores_surrounding_whitespace() {
        let page = PageContent::new(1, 100.0, 100.0).with_native_text("  hello \n");
        assert_eq!(page.native_text_chars(), 5);
    }

    #[test]
    fn blocks_measured_when_layer_text_missing() {
        let json = r#"{
            "index": 1,
            "width": 100.0,
            "height": 50.0,
            "text_blocks": [
                {"bbox": {"x0": 0, "y0": 0, "x1": 10, "y1": 10}, "text": "A full paragraph"},
                {"bbox": {"x0": 0, "y0": 20, "x1": 10, "y1": 30}, "text": "  "}
            ]
        }"#;
        let page: PageContent = serde_json::from_str(json).unwrap();
        assert!(page.native_text.is_empty());
        assert_eq!(page.block_text(), "A full paragraph");
        assert_eq!(page.native_text_chars(), 16);
    }

    #[test]
    fn mime_type_sniffed_from_bytes() {
        let mut image = EmbeddedImage::new(BBox::default(), PNG_MAGIC.to_vec());
        image.format = Some("jpeg".to_string());
        assert_eq!(image.mime_type(), "image/png");

        let hinted = EmbeddedImage {
            bbox: BBox::default(),
            format: Some("JPG".to_string()),
            data: vec![0, 1, 2],
        };
        assert_eq!(hinted.mime_type(), "image/jpeg");

        let unhinted = EmbeddedImage::new(BBox::default(), vec![0, 1, 2]);
        assert_eq!(unhinted.mime_type(), "image/png");
    }

    #[test]
    fn page_content_reads_base64_images_from_json() {
        let json = r#"{
            "index": 2,
            "width": 100.0,
            "height": 50.0,
            "images": [{"bbox": {"x0": 0, "y0": 0, "x1": 10, "y1": 10}, "data": "AQID"}]
        }"#;
        let page: PageContent = serde_json::from_str(json).unwrap();
        assert_eq!(page.index, 2);
        assert!(page.native_text.is_empty());
        assert_eq!(page.images[0].data, vec![1, 2, 3]);
    }
}
