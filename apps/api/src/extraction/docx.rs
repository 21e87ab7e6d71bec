//! DOCX text: the `word/document.xml` part, one line per paragraph.

use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

pub(super) fn extract(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("{DOCUMENT_PART}: {e}"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    Ok(document_text(&xml))
}

/// Flattens WordprocessingML to text. Paragraph ends and `<w:br/>` become newlines,
/// `<w:tab/>` becomes a tab, every other tag is dropped.
fn document_text(xml: &str) -> String {
    let mut text = String::with_capacity(xml.len() / 4);
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        text.push_str(&decode_entities(&rest[..open]));
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        match tag_name(&rest[open + 1..open + close]) {
            "/w:p" | "w:br" | "w:cr" => text.push('\n'),
            "w:tab" => text.push('\t'),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(&decode_entities(rest));

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn tag_name(tag: &str) -> &str {
    tag.split(|c: char| c.is_whitespace() || (c == '/' && !tag.starts_with('/')))
        .next()
        .unwrap_or("")
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
