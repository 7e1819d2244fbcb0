//! Document assembly: one fixed-size DOCX page per product.
//!
//! Pages are written strictly in input order. The first entry whose barcode
//! cannot be rendered aborts the whole document; there is no partial output.

use crate::barcode::{self, BarcodeError, BarcodeImage};
use crate::product::ProductEntry;
use crate::settings::LayoutSettings;
use docx_rs::{AlignmentType, BreakType, Docx, PageMargin, Paragraph, Pic, Run};
use log::{debug, info};
use std::io::Cursor;
use thiserror::Error;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOCX_FILENAME: &str = "products.docx";

const TWIPS_PER_MM: f64 = 1440.0 / 25.4;
const EMU_PER_MM: f64 = 36_000.0;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("product {index}: {source}")]
    Barcode {
        index: usize,
        #[source]
        source: BarcodeError,
    },
    #[error("failed to write document archive: {0}")]
    Pack(String),
}

pub fn mm_to_twips(mm: f64) -> u32 {
    (mm * TWIPS_PER_MM).round() as u32
}

pub fn mm_to_emu(mm: f64) -> u32 {
    (mm * EMU_PER_MM).round() as u32
}

/// Build the complete document for `products` and return the archive bytes.
pub fn assemble(products: &[ProductEntry], layout: &LayoutSettings) -> Result<Vec<u8>, DocumentError> {
    let margin = mm_to_twips(layout.margin_mm) as i32;
    let mut docx = Docx::new()
        .page_size(
            mm_to_twips(layout.page_width_mm),
            mm_to_twips(layout.page_height_mm),
        )
        .page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        );

    for (index, product) in products.iter().enumerate() {
        if index > 0 {
            docx = docx.add_paragraph(page_break());
        }

        let image = barcode::render(&product.barcode, layout.symbology, layout.print_size())
            .map_err(|source| DocumentError::Barcode { index, source })?;

        if layout.duplicate_legacy_block {
            docx = add_card(docx, product, &image, layout, None);
        }
        docx = add_card(docx, product, &image, layout, Some(AlignmentType::Center));
        debug!("Laid out page {} for `{}`", index + 1, product.barcode);
        // `image` is dropped here; `Pic` keeps its own copy of the bytes.
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| DocumentError::Pack(e.to_string()))?;
    let bytes = buffer.into_inner();
    info!(
        "Assembled document with {} page(s), {} bytes",
        products.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

/// Picture, description and code, each in its own paragraph.
fn add_card(
    docx: Docx,
    product: &ProductEntry,
    image: &BarcodeImage,
    layout: &LayoutSettings,
    align: Option<AlignmentType>,
) -> Docx {
    let width_emu = mm_to_emu(layout.image_width_mm);
    let height_emu = mm_to_emu(layout.bar_height_mm);
    let pic = Pic::new(&image.png).size(width_emu, height_emu);

    let aligned = |paragraph: Paragraph| match &align {
        Some(alignment) => paragraph.align(alignment.clone()),
        None => paragraph,
    };

    docx.add_paragraph(aligned(Paragraph::new().add_run(Run::new().add_image(pic))))
        .add_paragraph(aligned(
            Paragraph::new().add_run(Run::new().add_text(&product.description)),
        ))
        .add_paragraph(aligned(
            Paragraph::new().add_run(Run::new().add_text(&product.code)),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions() {
        assert_eq!(mm_to_twips(25.4), 1440);
        assert_eq!(mm_to_twips(100.0), 5669);
        assert_eq!(mm_to_emu(60.0), 2_160_000);
    }
}
