//! PDF documents

use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;

use lopdf::Document;
use tracing::warn;

/// Text of every page in page order, concatenated with no separator.
/// Returns the text and the page count.
///
/// Pages whose content cannot be decoded are skipped.
pub fn extract(bytes: &[u8]) -> Result<(String, usize)> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::corrupt(DocumentKind::Pdf, e))?;
    let pages = doc.get_pages();

    let mut text = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!(page = page_num, error = %e, "Skipping undecodable PDF page"),
        }
    }
    Ok((text, pages.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn single_page_pdf(line: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_page_text() {
        let (text, pages) = extract(&single_page_pdf("Call 555-123-4567")).unwrap();
        assert_eq!(pages, 1);
        assert!(text.contains("Call 555-123-4567"));
    }

    #[test]
    fn test_corrupt_pdf() {
        let err = extract(b"%PDF-1.4 truncated").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument { kind: DocumentKind::Pdf, .. }));
    }
}
