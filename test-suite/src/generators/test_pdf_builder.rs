//! Test PDF Builder
//!
//! A builder for creating test PDFs with specific characteristics.

use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// PDF version to generate
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PdfVersion {
    V1_4,
    V1_5,
    V1_7,
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_7 => "1.7",
        };
        write!(f, "{version}")
    }
}

#[derive(Clone)]
struct PageSpec {
    width: f32,
    height: f32,
    rotate: Option<i64>,
    label: String,
}

/// Builder for creating test PDFs
pub struct TestPdfBuilder {
    version: PdfVersion,
    pages: Vec<PageSpec>,
    title: Option<String>,
    /// Put MediaBox and Resources on the Pages node instead of each page
    inherit_attributes: bool,
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPdfBuilder {
    /// Create a new PDF builder with default settings
    pub fn new() -> Self {
        Self {
            version: PdfVersion::V1_5,
            pages: Vec::new(),
            title: None,
            inherit_attributes: false,
        }
    }

    /// Create a PDF with `count` US Letter pages labelled "Page 1", "Page 2", ...
    pub fn letter_pages(count: usize) -> Self {
        (0..count).fold(Self::new(), |builder, _| builder.with_page(612.0, 792.0))
    }

    /// Set PDF version
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Add a page of the given size in points
    pub fn with_page(mut self, width: f32, height: f32) -> Self {
        let label = format!("Page {}", self.pages.len() + 1);
        self.pages.push(PageSpec {
            width,
            height,
            rotate: None,
            label,
        });
        self
    }

    /// Add a page carrying its own `/Rotate`
    pub fn with_rotated_page(mut self, width: f32, height: f32, rotate: i64) -> Self {
        self = self.with_page(width, height);
        if let Some(page) = self.pages.last_mut() {
            page.rotate = Some(rotate);
        }
        self
    }

    /// Store MediaBox and Resources on the page tree root.
    ///
    /// All pages then share the first page's size.
    pub fn with_inherited_attributes(mut self) -> Self {
        self.inherit_attributes = true;
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the PDF as bytes
    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version(self.version.to_string());
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = format!("BT /F1 24 Tf 72 72 Td ({}) Tj ET", page.label);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let mut dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            if !self.inherit_attributes {
                dict.set("MediaBox", media_box(page.width, page.height));
                dict.set("Resources", resources_id);
            }
            if let Some(rotate) = page.rotate {
                dict.set("Rotate", rotate);
            }
            kids.push(Object::Reference(doc.add_object(dict)));
        }

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        };
        if self.inherit_attributes {
            let (width, height) = self
                .pages
                .first()
                .map(|page| (page.width, page.height))
                .unwrap_or((612.0, 792.0));
            pages.set("MediaBox", media_box(width, height));
            pages.set("Resources", resources_id);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(info_dictionary(title));
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .expect("writing to a Vec cannot fail");
        bytes
    }
}

fn media_box(width: f32, height: f32) -> Object {
    vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)].into()
}

fn info_dictionary(title: &str) -> Dictionary {
    dictionary! {
        "Title" => Object::string_literal(title),
        "Producer" => Object::string_literal("pagedeck test suite"),
    }
}
