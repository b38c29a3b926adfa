//! Presentations (PresentationML)

use super::ooxml::{self, Package, PackageWriter, XML_DECLARATION};
use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

const KIND: DocumentKind = DocumentKind::Presentation;
const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Maximum title length on a rebuilt slide, in characters
pub const TITLE_MAX_CHARS: usize = 100;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Text of every top-level shape, slide by slide. Returns the text and the
/// number of slides read.
pub fn extract(bytes: &[u8]) -> Result<(String, usize)> {
    let mut package = Package::open(bytes, KIND)?;

    let presentation = package.part(PRESENTATION_PART)?;
    let slide_ids = slide_order(&presentation).map_err(|e| ExtractError::corrupt(KIND, e))?;
    let rels = package.relationships(PRESENTATION_PART)?;

    let mut text = String::new();
    let mut slides = 0;
    for rel_id in slide_ids {
        let Some(target) = rels.get(&rel_id) else {
            warn!(rel_id = %rel_id, "Slide has no relationship target, skipping");
            continue;
        };
        let xml = package.part(target)?;
        let slide_text = shape_text(&xml).map_err(|e| ExtractError::corrupt(KIND, e))?;
        text.push_str(&slide_text);
        slides += 1;
    }
    Ok((text, slides))
}

/// Relationship ids from `p:sldIdLst`, in presentation order
fn slide_order(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(rel) = relationship_id(&e) {
                    ids.push(rel);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// The prefixed `r:id` attribute, as opposed to the unprefixed numeric `id`
fn relationship_id(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"id" && a.key.prefix().is_some())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Each top-level `sp` in the shape tree contributes its paragraphs joined by
/// newlines, followed by a newline. Group members and graphic frames are skipped.
fn shape_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut text = String::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<Vec<String>> = None;
    let mut paragraph: Option<String> = None;

    let parent = |stack: &[Vec<u8>]| stack.last().cloned().unwrap_or_default();

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"sp" if parent(&stack) == b"spTree" => shape = Some(Vec::new()),
                    b"p" if shape.is_some() && parent(&stack) == b"txBody" => {
                        paragraph = Some(String::new())
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"sp" if parent(&stack) == b"spTree" => text.push('\n'),
                b"p" if parent(&stack) == b"txBody" => {
                    if let Some(shape) = shape.as_mut() {
                        shape.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(paragraph) = paragraph.as_mut() {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if parent(&stack) == b"t" => {
                if let Some(paragraph) = paragraph.as_mut() {
                    paragraph.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"p" if parent(&stack) == b"txBody" => {
                        if let (Some(shape), Some(paragraph)) = (shape.as_mut(), paragraph.take()) {
                            shape.push(paragraph);
                        }
                    }
                    b"sp" if parent(&stack) == b"spTree" => {
                        if let Some(paragraphs) = shape.take() {
                            text.push_str(&paragraphs.join("\n"));
                            text.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Truncate to at most [`TITLE_MAX_CHARS`] characters
fn slide_title(line: &str) -> &str {
    match line.char_indices().nth(TITLE_MAX_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Write a new presentation with one "Title Only" slide per line of `text`.
///
/// Lines split on `\n`; a `\r` ending a line is dropped, so CRLF text yields
/// the same titles as LF text.
pub fn reconstruct(text: &str) -> Result<Vec<u8>> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut writer = PackageWriter::new();
    writer.add("[Content_Types].xml", &content_types(lines.len()))?;
    writer.add("_rels/.rels", &ooxml::root_relationships(PRESENTATION_PART))?;
    writer.add(PRESENTATION_PART, &presentation_xml(lines.len()))?;
    writer.add("ppt/_rels/presentation.xml.rels", &presentation_rels(lines.len()))?;
    writer.add("ppt/theme/theme1.xml", &theme_xml())?;
    writer.add("ppt/slideMasters/slideMaster1.xml", &master_xml())?;
    writer.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            ("slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("theme", "../theme/theme1.xml"),
        ]),
    )?;
    writer.add("ppt/slideLayouts/slideLayout1.xml", &layout_xml())?;
    writer.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[("slideMaster", "../slideMasters/slideMaster1.xml")]),
    )?;

    let layout_rels = relationships(&[("slideLayout", "../slideLayouts/slideLayout1.xml")]);
    for (i, line) in lines.iter().enumerate() {
        writer.add(&format!("ppt/slides/slide{}.xml", i + 1), &slide_xml(slide_title(line)))?;
        writer.add(&format!("ppt/slides/_rels/slide{}.xml.rels", i + 1), &layout_rels)?;
    }
    writer.finish()
}

fn relationships(targets: &[(&str, &str)]) -> String {
    let mut xml = format!(
        "{}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        XML_DECLARATION
    );
    for (i, (kind, target)) in targets.iter().enumerate() {
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{}/{}\" Target=\"{}\"/>",
            i + 1,
            REL_BASE,
            kind,
            target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>",
        XML_DECLARATION
    );
    for i in 1..=slide_count {
        xml.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation_xml(slide_count: usize) -> String {
    let mut slides = String::new();
    for i in 0..slide_count {
        slides.push_str(&format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, i + 3));
    }
    format!(
        "{}<p:presentation xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\">\
<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
<p:sldIdLst>{}</p:sldIdLst>\
<p:sldSz cx=\"9144000\" cy=\"6858000\" type=\"screen4x3\"/>\
<p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
</p:presentation>",
        XML_DECLARATION, NS_A, NS_R, NS_P, slides
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut targets = vec![
        ("slideMaster", "slideMasters/slideMaster1.xml".to_string()),
        ("theme", "theme/theme1.xml".to_string()),
    ];
    for i in 1..=slide_count {
        targets.push(("slide", format!("slides/slide{}.xml", i)));
    }
    let borrowed: Vec<(&str, &str)> = targets.iter().map(|(k, t)| (*k, t.as_str())).collect();
    relationships(&borrowed)
}

/// Non-visual group properties every shape tree starts with
const SHAPE_TREE_HEADER: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

fn title_placeholder(sp_pr: &str, paragraph: &str) -> String {
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title 1\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr>\
<p:nvPr><p:ph type=\"title\"/></p:nvPr></p:nvSpPr><p:spPr>{}</p:spPr>\
<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>",
        sp_pr, paragraph
    )
}

const TITLE_FRAME: &str =
    "<a:xfrm><a:off x=\"457200\" y=\"274638\"/><a:ext cx=\"8229600\" cy=\"1143000\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom>";

fn master_xml() -> String {
    format!(
        "{}<p:sldMaster xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\">\
<p:cSld><p:spTree>{}{}</p:spTree></p:cSld>\
<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" accent3=\"accent3\" \
accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
</p:sldMaster>",
        XML_DECLARATION,
        NS_A,
        NS_R,
        NS_P,
        SHAPE_TREE_HEADER,
        title_placeholder(TITLE_FRAME, "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>")
    )
}

fn layout_xml() -> String {
    format!(
        "{}<p:sldLayout xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\" type=\"titleOnly\" preserve=\"1\">\
<p:cSld name=\"Title Only\"><p:spTree>{}{}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>",
        XML_DECLARATION,
        NS_A,
        NS_R,
        NS_P,
        SHAPE_TREE_HEADER,
        title_placeholder("", "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>")
    )
}

fn slide_xml(title: &str) -> String {
    let paragraph = if title.is_empty() {
        "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>".to_string()
    } else {
        format!(
            "<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>",
            ooxml::escape_text(title)
        )
    };
    format!(
        "{}<p:sld xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\">\
<p:cSld><p:spTree>{}{}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        XML_DECLARATION,
        NS_A,
        NS_R,
        NS_P,
        SHAPE_TREE_HEADER,
        title_placeholder("", &paragraph)
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(name, rgb)| format!("<a:{0}><a:srgbClr val=\"{1}\"/></a:{0}>", name, rgb))
        .collect();

    let fill = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";
    let line = "<a:ln w=\"9525\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>";
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        "{}<a:theme xmlns:a=\"{}\" name=\"Office Theme\"><a:themeElements>\
<a:clrScheme name=\"Office\">{}</a:clrScheme>\
<a:fontScheme name=\"Office\">\
<a:majorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
<a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
</a:fontScheme>\
<a:fmtScheme name=\"Office\">\
<a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst>\
<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst>\
<a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>\
<a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst>\
</a:fmtScheme></a:themeElements></a:theme>",
        XML_DECLARATION,
        NS_A,
        scheme,
        fill = fill,
        line = line,
        effect = effect
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_slide_per_line() {
        let bytes = reconstruct("Quarterly review\n\n<PERSON> presents").unwrap();
        let (text, slides) = extract(&bytes).unwrap();

        assert_eq!(slides, 3);
        assert_eq!(text, "Quarterly review\n\n<PERSON> presents\n");
    }

    #[test]
    fn test_crlf_lines_match_lf_lines() {
        let bytes = reconstruct("one\r\ntwo").unwrap();
        let (text, slides) = extract(&bytes).unwrap();

        assert_eq!(slides, 2);
        assert_eq!(text, "one\ntwo\n");
    }

    #[test]
    fn test_titles_are_truncated() {
        let long = "é".repeat(150);
        let bytes = reconstruct(&long).unwrap();
        let (text, slides) = extract(&bytes).unwrap();

        assert_eq!(slides, 1);
        assert_eq!(text.trim_end().chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_top_level_shapes_only() {
        let slide = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:txBody><a:p><a:r><a:t>Line one</a:t></a:r><a:br/><a:r><a:t>wrapped</a:t></a:r></a:p><a:p><a:r><a:t>Line two</a:t></a:r></a:p></p:txBody></p:sp>
            <p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>Grouped</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp>
            <p:sp><p:spPr/></p:sp>
        </p:spTree></p:cSld></p:sld>"#;

        assert_eq!(
            shape_text(slide).unwrap(),
            "Title\nLine one\nwrapped\nLine two\n\n"
        );
    }

    #[test]
    fn test_slide_order_uses_relationship_ids() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="257" r:id="rId7"/><p:sldId id="256" r:id="rId3"/>
        </p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_order(xml).unwrap(), vec!["rId7", "rId3"]);
    }

    #[test]
    fn test_not_a_presentation_is_corrupt() {
        let err = extract(b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument { .. }));
    }
}
