//! Minimal PDF 1.4 writer: uncompressed content streams, base-14 fonts with
//! WinAnsiEncoding, one object per line of the xref table.
//!
//! Output depends only on the input pages. No dates, ids or random values are
//! written, so identical pages give identical bytes.

use std::fmt::Write as _;

use crate::compose::font_metrics::Font;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn operands(&self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0
        )
    }
}

/// Operators for one page, in painting order. Coordinates are PDF user space
/// (origin bottom-left).
#[derive(Debug, Default, Clone)]
pub struct PageContent {
    ops: String,
}

impl PageContent {
    pub fn text(&mut self, font: Font, size: f32, color: Rgb, x: f32, baseline: f32, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /{} {:.2} Tf {} rg 1 0 0 1 {:.2} {:.2} Tm ({}) Tj ET",
            font.resource(),
            size,
            color.operands(),
            x,
            baseline,
            escape_text(text)
        );
    }

    pub fn line(&mut self, color: Rgb, width: f32, from: (f32, f32), to: (f32, f32)) {
        let _ = writeln!(
            self.ops,
            "{} RG {:.2} w {:.2} {:.2} m {:.2} {:.2} l S",
            color.operands(),
            width,
            from.0,
            from.1,
            to.0,
            to.1
        );
    }

    pub fn fill_rect(&mut self, color: Rgb, x: f32, y: f32, width: f32, height: f32) {
        let _ = writeln!(
            self.ops,
            "{} rg {:.2} {:.2} {:.2} {:.2} re f",
            color.operands(),
            x,
            y,
            width,
            height
        );
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Maps a char onto its WinAnsiEncoding byte. Unmappable chars become `?`.
fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        '\t' => b' ',
        _ => b'?',
    }
}

/// Encodes `text` as the body of a PDF literal string.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match win_ansi_byte(c) {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            byte @ 0x20..=0x7E => out.push(byte as char),
            byte => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out
}

/// Serializes `pages` into a complete PDF file.
pub fn write_pdf(pages: &[PageContent], title: &str) -> Vec<u8> {
    let mut pages: Vec<&PageContent> = pages.iter().collect();
    let blank = PageContent::default();
    if pages.is_empty() {
        pages.push(&blank);
    }

    // 1 catalog, 2 page tree, 3-4 fonts, 5 info, then (page, contents) pairs.
    let first_page = 6;
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page + i * 2).collect();
    let mut objects: Vec<Vec<u8>> = Vec::new();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    for font in [Font::Helvetica, Font::HelveticaBold] {
        objects.push(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_font()
            )
            .into_bytes(),
        );
    }
    objects.push(format!("<< /Title {} /Producer (cvbuilder) >>", text_string(title)).into_bytes());

    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {A4_WIDTH:.2} {A4_HEIGHT:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                id + 1
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", page.ops.len()).into_bytes();
        stream.extend_from_slice(page.ops.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

/// Document-level text string (Info dictionary) as UTF-16BE hex with a BOM.
/// Page text uses WinAnsi instead, which Info strings are not decoded as.
fn text_string(value: &str) -> String {
    let mut out = String::from("<FEFF");
    for unit in value.encode_utf16() {
        let _ = write!(out, "{unit:04X}");
    }
    out.push('>');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text_specials_and_latin1() {
        assert_eq!(escape_text("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_text("Ærø"), "\\306r\\370");
        assert_eq!(escape_text("•"), "\\225");
        assert_eq!(escape_text("漢"), "?");
    }

    #[test]
    fn test_title_is_utf16_text_string() {
        assert_eq!(text_string("Ab"), "<FEFF00410062>");
        assert_eq!(text_string("Kari’s •"), "<FEFF004B0061007200692019007300202022>");

        let bytes = write_pdf(&[], "Åse’s CV");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title <FEFF00C50073006520190073002000430056>"));
    }

    #[test]
    fn test_write_pdf_structure() {
        let mut page = PageContent::default();
        page.text(Font::Helvetica, 10.0, Rgb(0, 0, 0), 40.0, 800.0, "Hello");
        let bytes = write_pdf(&[page], "Test");
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Hello) Tj"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pages = vec![PageContent::default(), PageContent::default()];
        let bytes = write_pdf(&pages, "Two");
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let xref_at: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        let table = std::str::from_utf8(&bytes[xref_at..]).unwrap();
        assert!(table.starts_with("xref"));

        let entries: Vec<usize> = table
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 9);
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(expected.as_bytes()));
        }
    }

    #[test]
    fn test_no_pages_still_yields_one_blank_page() {
        let text = String::from_utf8_lossy(&write_pdf(&[], "Empty")).into_owned();
        assert!(text.contains("/Count 1"));
    }
}
