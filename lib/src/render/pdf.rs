// lib/src/render/pdf.rs
//! Draws a [`PageLayout`] onto a single-page PDF with lopdf.
//!
//! Coordinates are laid out on an A4 grid and scaled to the requested format
//! with a `cm` transform, so A5 output is the same page shrunk.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::errors::RenderError;
use crate::render::layout::PageLayout;
use crate::render::{PageArtifact, PageFormat, PageRenderer};

const GRID_WIDTH: f32 = 595.0;
const GRID_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 28.0;
const LINE: f32 = 13.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Helvetica only covers WinAnsi; anything outside Latin-1 is printed as `?`.
fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

/// Greedy wrap on whitespace, assuming an average Helvetica glyph of half the font size.
fn wrap(text: &str, width: f32, size: f32, max_lines: usize) -> Vec<String> {
    let max_chars = ((width / (size * 0.5)) as usize).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push_str(" ...");
        }
    }
    lines
}

/// Accumulates content-stream operations.
struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    fn new(scale: f32) -> Self {
        Canvas {
            ops: vec![Operation::new(
                "cm",
                vec![scale.into(), 0.into(), 0.into(), scale.into(), 0.into(), 0.into()],
            )],
        }
    }

    fn text(&mut self, x: f32, y: f32, font: &str, size: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(encode(text))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// `label` in bold followed by `value`, wrapped; returns the y below the last line.
    fn labelled(&mut self, x: f32, y: f32, label: &str, value: &str, max_lines: usize) -> f32 {
        self.text(x, y, BOLD, 9.0, label);
        let indent = 110.0;
        let lines = wrap(value, GRID_WIDTH - 2.0 * MARGIN - indent, 9.0, max_lines);
        let mut cursor = y;
        for line in &lines {
            self.text(x + indent, cursor, REGULAR, 9.0, line);
            cursor -= LINE;
        }
        if lines.is_empty() {
            cursor -= LINE;
        }
        cursor
    }

    fn rule(&mut self, y: f32) {
        self.ops.push(Operation::new("w", vec![0.5f32.into()]));
        self.ops.push(Operation::new("m", vec![MARGIN.into(), y.into()]));
        self.ops.push(Operation::new("l", vec![(GRID_WIDTH - MARGIN).into(), y.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("w", vec![0.5f32.into()]));
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn encode(self) -> Result<Vec<u8>, lopdf::Error> {
        Content { operations: self.ops }.encode()
    }
}

fn draw(layout: &PageLayout, canvas: &mut Canvas) {
    let right = GRID_WIDTH - MARGIN;

    // header
    let mut y = GRID_HEIGHT - 50.0;
    canvas.text(MARGIN, y, BOLD, 16.0, &layout.header.name);
    y -= 16.0;
    canvas.text(MARGIN, y, REGULAR, 10.0, &layout.header.credentials);
    y -= LINE;
    canvas.text(MARGIN, y, REGULAR, 9.0, &layout.header.registration);
    y -= LINE;
    canvas.text(MARGIN, y, REGULAR, 9.0, &layout.header.clinic_address);
    y -= 10.0;
    canvas.rule(y);

    // patient and date
    y -= 16.0;
    canvas.text(MARGIN, y, BOLD, 11.0, &layout.patient.headline);
    canvas.text(right - 120.0, y, REGULAR, 10.0, &format!("Date: {}", layout.patient.date));
    y -= LINE + 2.0;
    canvas.text(MARGIN, y, REGULAR, 9.0, &format!("Patient ID: {}", layout.patient.patient_id));
    canvas.text(
        right - 200.0,
        y,
        REGULAR,
        9.0,
        &format!("Prescription ID: {}", layout.patient.prescription_id),
    );
    y -= 10.0;
    canvas.rule(y);

    // vitals
    y -= 16.0;
    let cell = (GRID_WIDTH - 2.0 * MARGIN) / layout.vitals.len().max(1) as f32;
    for (i, vital) in layout.vitals.iter().enumerate() {
        let shown = if vital.value.is_empty() {
            format!("{}: ", vital.label)
        } else {
            format!("{}: {} {}", vital.label, vital.value, vital.unit)
        };
        canvas.text(MARGIN + i as f32 * cell, y, REGULAR, 9.0, &shown);
    }

    // diagnosis
    y -= 20.0;
    y = canvas.labelled(MARGIN, y, "Diagnosis", &layout.diagnosis.current, 2);

    if let Some(clinical) = &layout.clinical {
        y = canvas.labelled(MARGIN, y, "Allergy", &clinical.allergy, 2);
        y = canvas.labelled(MARGIN, y, "Examination", &clinical.examination, 2);
        y = canvas.labelled(MARGIN, y, "Complaints", &clinical.complaints, 2);
        y = canvas.labelled(MARGIN, y, "Known", &clinical.known, 2);
        y = canvas.labelled(MARGIN, y, "Personal history", &clinical.personal_history, 2);
        y = canvas.labelled(MARGIN, y, "Family history", &clinical.family_history, 2);
        if let Some(notes) = &clinical.notes {
            let lines = wrap(notes, GRID_WIDTH - 2.0 * MARGIN - 16.0, 9.0, 3);
            let height = 18.0 + lines.len() as f32 * LINE;
            canvas.rect(MARGIN, y - height + 8.0, GRID_WIDTH - 2.0 * MARGIN, height);
            canvas.text(MARGIN + 8.0, y - 4.0, BOLD, 9.0, "Notes");
            let mut cursor = y - 4.0 - LINE;
            for line in &lines {
                canvas.text(MARGIN + 8.0, cursor, REGULAR, 9.0, line);
                cursor -= LINE;
            }
            y -= height + 4.0;
        }
    }

    // medication table
    y -= 8.0;
    canvas.rule(y + 10.0);
    let columns = [MARGIN, MARGIN + 24.0, MARGIN + 230.0, MARGIN + 330.0, MARGIN + 420.0, MARGIN + 480.0];
    for (x, title) in columns
        .iter()
        .zip(["#", "Medicine", "Frequency", "Timing", "Duration", "Qty"])
    {
        canvas.text(*x, y, BOLD, 9.0, title);
    }
    y -= 4.0;
    canvas.rule(y);
    for row in &layout.medications {
        y -= 12.0;
        canvas.text(columns[0], y, REGULAR, 9.0, &format!("{}.", row.number));
        canvas.text(columns[1], y, BOLD, 9.0, &row.name);
        canvas.text(columns[2], y, REGULAR, 9.0, &row.frequency);
        canvas.text(columns[3], y, REGULAR, 9.0, &row.timing);
        canvas.text(columns[4], y, REGULAR, 9.0, &row.duration);
        canvas.text(columns[5], y, REGULAR, 9.0, &row.quantity);
        canvas.text(columns[1], y - 10.0, REGULAR, 7.5, &row.composition);
        y -= ROW_HEIGHT - 12.0;
    }

    // footer
    let footer = &layout.footer;
    let mut fy = 175.0;
    canvas.rule(fy);
    fy -= 14.0;
    fy = canvas.labelled(MARGIN, fy, "Instructions", &footer.instructions, 2);
    canvas.text(MARGIN, fy - 4.0, REGULAR, 9.0, &format!("Valid till: {}", footer.valid_till));
    canvas.ops.push(Operation::new("m", vec![(right - 140.0).into(), 110.into()]));
    canvas.ops.push(Operation::new("l", vec![right.into(), 110.into()]));
    canvas.ops.push(Operation::new("S", vec![]));
    canvas.text(right - 140.0, 98.0, REGULAR, 8.0, "Signature");
    canvas.text(right - 140.0, 86.0, REGULAR, 8.0, &layout.header.name);
    canvas.text(MARGIN, 70.0, REGULAR, 7.5, footer.notice);
    canvas.text(MARGIN, 58.0, REGULAR, 7.5, &footer.footer_text);
    canvas.text(right - 60.0, 40.0, REGULAR, 8.0, &footer.page_label);
}

/// The bundled backend: one self-contained single-page PDF per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageRenderer;

impl LopdfPageRenderer {
    fn build(&self, layout: &PageLayout, format: PageFormat) -> Result<Vec<u8>, lopdf::Error> {
        let (width, height) = format.dimensions();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = |base: &str| {
            Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(base.as_bytes().to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ])
        };
        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([
                (REGULAR, Object::Reference(regular_id)),
                (BOLD, Object::Reference(bold_id)),
            ])),
        )]));

        let mut canvas = Canvas::new(width / GRID_WIDTH);
        draw(layout, &mut canvas);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), canvas.encode()?));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), width.into(), height.into()]),
            ),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        let info_id = doc.add_object(Dictionary::from_iter([(
            "Title",
            Object::string_literal(encode(&layout.title)),
        )]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.trailer.set("Info", Object::Reference(info_id));
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

impl PageRenderer for LopdfPageRenderer {
    fn render_page(&self, layout: &PageLayout, format: PageFormat) -> Result<PageArtifact, RenderError> {
        let bytes = self.build(layout, format).map_err(|e| RenderError::Page {
            page: layout.page_number,
            reason: e.to_string(),
        })?;
        Ok(PageArtifact {
            page: layout.page_number,
            bytes,
        })
    }
}
