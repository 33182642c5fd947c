//! Document Validator
//!
//! Summarizes each page of a produced PDF.

use super::{ValidationError, ValidationResult};
use lopdf::{Document, Object, ObjectId};

/// What a page of a produced document looks like
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub width: f32,
    pub height: f32,
    /// `/Rotate`, 0 when absent
    pub rotate: i64,
    /// Number of image XObjects in the page resources
    pub images: usize,
}

pub struct DocumentValidator {
    doc: Document,
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

impl DocumentValidator {
    pub fn new(bytes: &[u8]) -> ValidationResult<Self> {
        Ok(Self {
            doc: Document::load_mem(bytes)?,
        })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    pub fn pages(&self) -> ValidationResult<Vec<PageSummary>> {
        self.doc
            .get_pages()
            .values()
            .map(|id| self.summarize(*id))
            .collect()
    }

    /// `/Rotate` of every page in order
    pub fn rotations(&self) -> ValidationResult<Vec<i64>> {
        Ok(self.pages()?.into_iter().map(|page| page.rotate).collect())
    }

    fn deref<'a>(&'a self, object: &'a Object) -> ValidationResult<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    fn summarize(&self, page_id: ObjectId) -> ValidationResult<PageSummary> {
        let page = self.doc.get_dictionary(page_id)?;

        let media_box = match page.get(b"MediaBox") {
            Ok(object) => self.deref(object)?.as_array()?.clone(),
            Err(_) => {
                return Err(ValidationError::InvalidStructure(format!(
                    "page {page_id:?} has no MediaBox of its own"
                )))
            }
        };
        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        if coords.len() != 4 {
            return Err(ValidationError::InvalidStructure(format!(
                "page {page_id:?} has a malformed MediaBox"
            )));
        }

        let rotate = page
            .get(b"Rotate")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);

        let images = match page.get(b"Resources") {
            Ok(resources) => {
                let resources = self.deref(resources)?.as_dict()?;
                match resources.get(b"XObject") {
                    Ok(xobjects) => self
                        .deref(xobjects)?
                        .as_dict()?
                        .iter()
                        .filter(|(_, object)| self.is_image(object))
                        .count(),
                    Err(_) => 0,
                }
            }
            Err(_) => 0,
        };

        Ok(PageSummary {
            width: coords[2] - coords[0],
            height: coords[3] - coords[1],
            rotate,
            images,
        })
    }

    fn is_image(&self, object: &Object) -> bool {
        self.deref(object)
            .ok()
            .and_then(|o| o.as_stream().ok())
            .and_then(|stream| stream.dict.get(b"Subtype").ok())
            .and_then(|subtype| subtype.as_name().ok())
            .is_some_and(|name| name == b"Image")
    }
}
