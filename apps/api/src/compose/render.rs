use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::compose::document::{DocumentModel, Section};
use crate::compose::font_metrics::Font;
use crate::compose::pdf::{write_pdf, PageContent, Rgb, A4_HEIGHT, A4_WIDTH};

const PADDING: f32 = 40.0;
const CONTENT_WIDTH: f32 = A4_WIDTH - 2.0 * PADDING;
const ENTRY_INDENT: f32 = 12.0;

const INK: Rgb = Rgb(0x1F, 0x29, 0x37);
const MUTED: Rgb = Rgb(0x4B, 0x55, 0x63);
const SUBTLE: Rgb = Rgb(0x37, 0x41, 0x51);
const FAINT: Rgb = Rgb(0x6B, 0x72, 0x80);
const RULE: Rgb = Rgb(0xE5, 0xE7, 0xEB);
const CHIP_TEXT: Rgb = Rgb(0x1D, 0x4E, 0xD8);
const CHIP_FILL: Rgb = Rgb(0xEF, 0xF6, 0xFF);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    /// Shown in the browser.
    Preview,
    /// Saved to disk.
    Download,
}

impl RenderTarget {
    fn disposition_type(&self) -> &'static str {
        match self {
            RenderTarget::Preview => "inline",
            RenderTarget::Download => "attachment",
        }
    }
}

/// A rendered document ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: &'static str,
    /// Full `Content-Disposition` header value.
    pub disposition: String,
}

impl IntoResponse for Artifact {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, self.disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

pub fn file_name_for(doc: &DocumentModel) -> String {
    format!("{}-CV.pdf", doc.header.name)
}

/// `Content-Disposition` value with a quoted ASCII fallback and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(target: RenderTarget, file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        target.disposition_type(),
        fallback,
        urlencoding::encode(file_name)
    )
}

/// Renders the document to PDF. Both targets share the same bytes; only the
/// disposition differs.
pub fn render(doc: &DocumentModel, target: RenderTarget) -> Artifact {
    let bytes = Bytes::from(render_pdf(doc));
    let file_name = file_name_for(doc);
    Artifact {
        bytes,
        disposition: content_disposition(target, &file_name),
        file_name,
        content_type: "application/pdf",
    }
}

pub fn render_pdf(doc: &DocumentModel) -> Vec<u8> {
    let mut layout = PageLayout::new();
    layout.header(doc);
    for section in &doc.sections {
        layout.section(section);
    }
    let title = format!("{} CV", doc.header.name);
    write_pdf(&layout.finish(), &title)
}

/// Top-down flow layout over A4 pages. `cursor` is the y of the next line's
/// top edge; content that would cross the bottom padding moves to a new page.
struct PageLayout {
    pages: Vec<PageContent>,
    current: PageContent,
    cursor: f32,
    /// Left rule of the entry being laid out: x and the top y on this page.
    open_rule: Option<(f32, f32)>,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageContent::default(),
            cursor: A4_HEIGHT - PADDING,
            open_rule: None,
        }
    }

    fn new_page(&mut self) {
        if let Some((x, top)) = self.open_rule {
            self.current.line(RULE, 2.0, (x, top), (x, PADDING));
            self.open_rule = Some((x, A4_HEIGHT - PADDING));
        }
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor = A4_HEIGHT - PADDING;
    }

    fn ensure(&mut self, height: f32) {
        if self.cursor - height < PADDING && !self.current.is_empty() {
            self.new_page();
        }
    }

    fn gap(&mut self, points: f32) {
        self.cursor -= points;
    }

    fn line(&mut self, font: Font, size: f32, color: Rgb, x: f32, text: &str, leading: f32) {
        let height = size * leading;
        self.ensure(height);
        // Baseline sits at the ascent of the line box.
        let baseline = self.cursor - size * 0.8 - (height - size) / 2.0;
        self.current.text(font, size, color, x, baseline, text);
        self.cursor -= height;
    }

    fn paragraph(&mut self, font: Font, size: f32, color: Rgb, x: f32, text: &str, leading: f32) {
        let width = CONTENT_WIDTH - (x - PADDING);
        for line in font.metrics().wrap_lines(text, size, width) {
            self.line(font, size, color, x, &line, leading);
        }
    }

    fn header(&mut self, doc: &DocumentModel) {
        let header = &doc.header;
        self.paragraph(Font::HelveticaBold, 28.0, INK, PADDING, &header.name, 1.2);
        self.gap(8.0);
        let contact = format!("{}  •  {}", header.email, header.phone);
        self.paragraph(Font::Helvetica, 11.0, MUTED, PADDING, &contact, 1.2);
        self.gap(15.0);
        self.current
            .line(INK, 2.0, (PADDING, self.cursor), (A4_WIDTH - PADDING, self.cursor));
        self.gap(25.0);
    }

    fn section(&mut self, section: &Section) {
        self.gap(20.0);
        // Keep the title with at least the first line of its content.
        self.ensure(16.0 * 1.2 + 12.0 + 22.0);
        self.line(
            Font::HelveticaBold,
            16.0,
            INK,
            PADDING,
            &section.title().to_uppercase(),
            1.2,
        );
        self.gap(12.0);

        match section {
            Section::Skills { items } => self.skills(items),
            Section::Education { entries } => {
                for edu in entries {
                    self.begin_entry();
                    self.entry_heading(&edu.degree, &edu.institution, &edu.year);
                    self.end_entry();
                }
            }
            Section::Experience { entries } => {
                for exp in entries {
                    self.begin_entry();
                    self.entry_heading(&exp.title, &exp.company, &exp.years);
                    self.description("Job Description", &exp.description);
                    self.description("Related Projects", &exp.projects);
                    self.end_entry();
                }
            }
            Section::References { entries } => {
                for reference in entries {
                    self.begin_entry();
                    let x = PADDING + ENTRY_INDENT;
                    self.paragraph(Font::HelveticaBold, 14.0, INK, x, &reference.name, 1.2);
                    self.gap(3.0);
                    self.paragraph(Font::Helvetica, 10.0, MUTED, x, &reference.contact_info, 1.5);
                    self.end_entry();
                }
            }
        }
    }

    /// Skills as filled chips, wrapped across rows.
    fn skills(&mut self, items: &[String]) {
        const SIZE: f32 = 10.0;
        const PAD_X: f32 = 12.0;
        const PAD_Y: f32 = 6.0;
        const GAP: f32 = 8.0;
        let chip_height = SIZE + 2.0 * PAD_Y;
        let metrics = Font::Helvetica.metrics();

        let mut x = PADDING;
        self.ensure(chip_height);
        for skill in items {
            let chip_width = (metrics.width_pt(skill, SIZE) + 2.0 * PAD_X).min(CONTENT_WIDTH);
            if x > PADDING && x + chip_width > A4_WIDTH - PADDING {
                x = PADDING;
                self.gap(chip_height + GAP);
                self.ensure(chip_height);
            }
            let bottom = self.cursor - chip_height;
            self.current.fill_rect(CHIP_FILL, x, bottom, chip_width, chip_height);
            self.current
                .text(Font::Helvetica, SIZE, CHIP_TEXT, x + PAD_X, bottom + PAD_Y + 2.0, skill);
            x += chip_width + GAP;
        }
        self.gap(chip_height + 15.0);
    }

    fn begin_entry(&mut self) {
        // Title, company and period together.
        self.ensure(14.0 * 1.2 + 12.0 * 1.2 + 10.0 * 1.2 + 12.0);
        self.open_rule = Some((PADDING + 1.0, self.cursor));
    }

    fn end_entry(&mut self) {
        if let Some((x, top)) = self.open_rule.take() {
            self.current.line(RULE, 2.0, (x, top), (x, self.cursor));
        }
        self.gap(15.0);
    }

    fn entry_heading(&mut self, title: &str, organisation: &str, period: &str) {
        let x = PADDING + ENTRY_INDENT;
        self.paragraph(Font::HelveticaBold, 14.0, INK, x, title, 1.2);
        self.gap(3.0);
        self.paragraph(Font::Helvetica, 12.0, SUBTLE, x, organisation, 1.2);
        self.gap(3.0);
        self.paragraph(Font::Helvetica, 10.0, FAINT, x, period, 1.2);
        self.gap(6.0);
    }

    fn description(&mut self, title: &str, body: &str) {
        let x = PADDING + ENTRY_INDENT;
        self.gap(6.0);
        self.line(Font::HelveticaBold, 11.0, SUBTLE, x, title, 1.2);
        self.gap(3.0);
        self.paragraph(Font::Helvetica, 10.0, MUTED, x, body, 1.5);
    }

    fn finish(mut self) -> Vec<PageContent> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}
