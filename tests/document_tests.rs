mod common;

use common::{document_xml, drawings, embedded_images, extents, page_breaks, texts};
use labeldoc::barcode::{self, BarcodeError, Symbology};
use labeldoc::document::{DocumentError, assemble, mm_to_emu};
use labeldoc::product::ProductEntry;
use labeldoc::settings::LayoutSettings;

fn sample(n: usize) -> Vec<ProductEntry> {
    (0..n)
        .map(|i| ProductEntry::new(format!("12345678901{i}"), format!("Item {i}"), format!("100000{i}")))
        .collect()
}

#[test]
fn test_empty_list_yields_valid_empty_document() {
    let bytes = assemble(&[], &LayoutSettings::default()).unwrap();
    assert!(!bytes.is_empty());
    let xml = document_xml(&bytes);
    assert!(xml.contains("<w:body"));
    assert_eq!(drawings(&xml), 0);
    assert_eq!(page_breaks(&xml), 0);
}

#[test]
fn test_single_product_document() {
    let products = vec![ProductEntry::new("123456789012", "Test Item", "1234567")];
    let bytes = assemble(&products, &LayoutSettings::default()).unwrap();
    // DOCX is a zip archive: local file header magic.
    assert_eq!(&bytes[..2], b"PK");

    let xml = document_xml(&bytes);
    assert_eq!(drawings(&xml), 1);
    assert_eq!(page_breaks(&xml), 0);
    assert_eq!(texts(&xml), vec!["Test Item", "1234567"]);
}

#[test]
fn test_one_page_per_product_in_input_order() {
    let products = sample(4);
    let bytes = assemble(&products, &LayoutSettings::default()).unwrap();
    let xml = document_xml(&bytes);

    assert_eq!(drawings(&xml), 4);
    assert_eq!(page_breaks(&xml), 3);

    let expected: Vec<String> = products
        .iter()
        .flat_map(|p| [p.description.clone(), p.code.clone()])
        .collect();
    assert_eq!(texts(&xml), expected);
}

#[test]
fn test_paragraphs_are_centered() {
    let bytes = assemble(&sample(1), &LayoutSettings::default()).unwrap();
    let xml = document_xml(&bytes);
    assert_eq!(xml.matches("w:val=\"center\"").count(), 3);
}

#[test]
fn test_page_geometry_and_image_width() {
    let layout = LayoutSettings::default();
    let bytes = assemble(&sample(2), &layout).unwrap();
    let xml = document_xml(&bytes);

    assert!(xml.contains("w:w=\"5669\""));
    assert!(xml.contains("w:h=\"8504\""));

    let sizes = extents(&xml);
    assert_eq!(sizes.len(), 2);
    for (cx, cy) in sizes {
        assert_eq!(cx, mm_to_emu(layout.image_width_mm) as u64);
        assert_eq!(cy, mm_to_emu(layout.bar_height_mm) as u64);
    }
}

#[test]
fn test_bar_height_does_not_depend_on_value_length() {
    let layout = LayoutSettings::default();
    let products = vec![
        ProductEntry::new("1", "Short", "0000001"),
        ProductEntry::new("ABCDEFGHIJKLMNOPQRSTUVWX", "Long", "0000002"),
    ];
    let xml = document_xml(&assemble(&products, &layout).unwrap());

    let sizes = extents(&xml);
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[0], sizes[1]);
    assert_eq!(sizes[0].1, mm_to_emu(15.0) as u64);
}

#[test]
fn test_pictures_follow_input_order() {
    let layout = LayoutSettings::default();
    let values = ["1", "ABCDEFGHIJKLMNOP", "12345"];
    let products: Vec<ProductEntry> = values
        .iter()
        .enumerate()
        .map(|(i, v)| ProductEntry::new(*v, format!("Item {i}"), format!("000000{i}")))
        .collect();
    let bytes = assemble(&products, &layout).unwrap();

    let images = embedded_images(&bytes);
    assert_eq!(images.len(), values.len());
    for (value, png) in values.iter().zip(&images) {
        let expected = barcode::render(value, layout.symbology, layout.print_size()).unwrap();
        let embedded = image::load_from_memory(png).unwrap();
        assert_eq!(
            (embedded.width(), embedded.height()),
            (expected.width_px, expected.height_px),
            "picture for `{value}`"
        );
    }
}

#[test]
fn test_legacy_block_duplicates_card() {
    let layout = LayoutSettings {
        duplicate_legacy_block: true,
        ..LayoutSettings::default()
    };
    let bytes = assemble(&[ProductEntry::new("ABC-1", "Widget", "7654321")], &layout).unwrap();
    let xml = document_xml(&bytes);

    assert_eq!(drawings(&xml), 2);
    assert_eq!(texts(&xml), vec!["Widget", "7654321", "Widget", "7654321"]);
    assert_eq!(xml.matches("w:val=\"center\"").count(), 3);
}

#[test]
fn test_invalid_barcode_fails_whole_document() {
    let layout = LayoutSettings {
        symbology: Symbology::Ean13,
        ..LayoutSettings::default()
    };
    let products = vec![
        ProductEntry::new("123456789012", "Good", "1111111"),
        ProductEntry::new("NOT-A-NUMBER", "Bad", "2222222"),
        ProductEntry::new("123456789012", "Never reached", "3333333"),
    ];
    match assemble(&products, &layout) {
        Err(DocumentError::Barcode { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(source, BarcodeError::Encode { .. }));
        }
        other => panic!("expected barcode failure, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_empty_code128_barcode_still_gets_a_page() {
    let bytes = assemble(&[ProductEntry::new("", "Blank", "0000000")], &LayoutSettings::default())
        .unwrap();
    let xml = document_xml(&bytes);
    assert_eq!(drawings(&xml), 1);
    assert_eq!(page_breaks(&xml), 0);
    assert_eq!(texts(&xml), vec!["Blank", "0000000"]);
}

#[test]
fn test_empty_ean13_barcode_fails() {
    let layout = LayoutSettings {
        symbology: Symbology::Ean13,
        ..LayoutSettings::default()
    };
    assert!(matches!(
        assemble(&[ProductEntry::new("", "Blank", "0000000")], &layout),
        Err(DocumentError::Barcode {
            index: 0,
            source: BarcodeError::Encode { .. }
        })
    ));
}

#[test]
fn test_resubmission_is_structurally_equivalent() {
    let products = sample(3);
    let layout = LayoutSettings::default();
    let first = document_xml(&assemble(&products, &layout).unwrap());
    let second = document_xml(&assemble(&products, &layout).unwrap());

    assert_eq!(texts(&first), texts(&second));
    assert_eq!(drawings(&first), drawings(&second));
    assert_eq!(page_breaks(&first), page_breaks(&second));
    assert_eq!(extents(&first), extents(&second));
}
