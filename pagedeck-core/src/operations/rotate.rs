//! Re-applying page rotations to a finished document
//!
//! External compressors may drop or normalize `/Rotate`. Rotations are
//! matched back to pages by position: page `i` of the document belongs to
//! `page_order[i]`.

use crate::error::Result;
use crate::page::PageId;
use crate::pdf;
use crate::rotation::RotationMap;
use tracing::debug;

pub fn apply_rotations(bytes: &[u8], rotations: &RotationMap, page_order: &[PageId]) -> Result<Vec<u8>> {
    let mut doc = pdf::load(bytes)?;
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();

    let mut applied = 0;
    for (page_id, id) in page_ids.into_iter().zip(page_order) {
        let angle = rotations.get(id);
        if !angle.is_none() {
            pdf::set_rotation(&mut doc, page_id, angle)?;
            applied += 1;
        }
    }
    debug!("Re-applied {} rotations", applied);

    pdf::save(&mut doc)
}

/// Same as [`apply_rotations`], taking the two JSON form fields of the
/// compression endpoint: an `id -> degrees` object and an array of ids.
pub fn apply_rotations_json(bytes: &[u8], rotations: &str, page_order: &str) -> Result<Vec<u8>> {
    let rotations = RotationMap::from_json(rotations)?;
    let page_order: Vec<PageId> = serde_json::from_str(page_order)?;
    apply_rotations(bytes, &rotations, &page_order)
}
