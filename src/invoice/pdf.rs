//! PDF assembly with `lopdf`
//!
//! One page, two standard fonts and an optional RGB logo. Coordinates come
//! from the [`PageLayout`]; font sizes and line gaps shrink with its scale.

use crate::invoice::document::{Field, InvoiceDocument};
use crate::invoice::layout::{PageLayout, SectionKind, fit_logo};
use anyhow::{Context, Result, anyhow};
use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

const PT_PER_MM: f64 = 72.0 / 25.4;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const LOGO_NAME: &str = "Im1";

// Nominal sizes before layout scaling
const BODY_SIZE: f64 = 9.0;
const SMALL_SIZE: f64 = 7.0;
const TITLE_SIZE: f64 = 18.0;
const COMPANY_SIZE: f64 = 14.0;
const LINE_GAP_MM: f64 = 4.5;

fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// A decoded logo, flattened onto white
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl LogoImage {
    /// Decode PNG or JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("unsupported logo image")?;
        let (width, height) = image.dimensions();
        let rgba = image.to_rgba8();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = a as u32;
            for channel in [r, g, b] {
                let blended = (channel as u32 * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }

        Ok(Self { width, height, rgb })
    }
}

/// Encode text for the WinAnsi standard fonts
///
/// Latin-1 maps directly; a few Latin Extended letters fall back to their
/// base letter and anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            'ł' => b'l',
            'Ł' => b'L',
            'ą' => b'a',
            'Ą' => b'A',
            'ę' => b'e',
            'Ę' => b'E',
            'ś' | 'š' => b's',
            'Ś' | 'Š' => b'S',
            'ź' | 'ż' | 'ž' => b'z',
            'Ź' | 'Ż' | 'Ž' => b'Z',
            'ć' | 'č' => b'c',
            'Ć' | 'Č' => b'C',
            'ń' => b'n',
            'Ń' => b'N',
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Approximate Helvetica advance width in points
fn text_width(text: &str, size: f64) -> f64 {
    let units: f64 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | ';' | 'i' | 'l' | 'j' | 'I' | '|' | '!' => 278.0,
            'f' | 't' | 'r' | '(' | ')' | '-' | '/' => 333.0,
            '0'..='9' | '€' | '$' | '#' | '_' => 556.0,
            'm' | 'M' | 'W' => 833.0,
            'w' => 722.0,
            c if c.is_uppercase() => 667.0,
            _ => 556.0,
        })
        .sum();
    units / 1000.0 * size
}

/// Collects content stream operations in page coordinates
struct Canvas {
    page_height_pt: f64,
    ops: Vec<Operation>,
}

impl Canvas {
    fn new(page_height_mm: f64) -> Self {
        Self {
            page_height_pt: mm_to_pt(page_height_mm),
            ops: Vec::new(),
        }
    }

    /// Baseline position measured from the top edge
    fn y(&self, from_top_mm: f64) -> f64 {
        self.page_height_pt - mm_to_pt(from_top_mm)
    }

    fn text(&mut self, font: &str, size: f64, x_mm: f64, baseline_mm: f64, text: &str) {
        if text.is_empty() {
            return;
        }
        let y = self.y(baseline_mm);
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), real(size)]),
            Operation::new("Td", vec![real(mm_to_pt(x_mm)), real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Text whose right edge ends at `right_mm`
    fn text_right(&mut self, font: &str, size: f64, right_mm: f64, baseline_mm: f64, text: &str) {
        let width_mm = text_width(text, size) / PT_PER_MM;
        self.text(font, size, right_mm - width_mm, baseline_mm, text);
    }

    fn fill_rect(&mut self, gray: f64, x_mm: f64, top_mm: f64, width_mm: f64, height_mm: f64) {
        let bottom = self.y(top_mm + height_mm);
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("g", vec![real(gray)]),
            Operation::new(
                "re",
                vec![
                    real(mm_to_pt(x_mm)),
                    real(bottom),
                    real(mm_to_pt(width_mm)),
                    real(mm_to_pt(height_mm)),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn hline(&mut self, x1_mm: f64, x2_mm: f64, at_mm: f64, width_pt: f64) {
        let y = self.y(at_mm);
        self.ops.extend([
            Operation::new("w", vec![real(width_pt)]),
            Operation::new("m", vec![real(mm_to_pt(x1_mm)), real(y)]),
            Operation::new("l", vec![real(mm_to_pt(x2_mm)), real(y)]),
            Operation::new("S", vec![]),
        ]);
    }

    fn image(&mut self, name: &str, x_mm: f64, top_mm: f64, width_mm: f64, height_mm: f64) {
        let bottom = self.y(top_mm + height_mm);
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(mm_to_pt(width_mm)),
                    real(0.0),
                    real(0.0),
                    real(mm_to_pt(height_mm)),
                    real(mm_to_pt(x_mm)),
                    real(bottom),
                ],
            ),
            Operation::new("Do", vec![name.into()]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn into_content(self) -> Content {
        Content {
            operations: self.ops,
        }
    }
}

/// Draws the document sections onto a canvas
struct Painter<'a> {
    doc: &'a InvoiceDocument,
    layout: &'a PageLayout,
    canvas: Canvas,
    left: f64,
    right: f64,
}

impl<'a> Painter<'a> {
    fn size(&self, nominal: f64) -> f64 {
        self.layout.scaled(nominal)
    }

    fn gap(&self) -> f64 {
        self.layout.scaled(LINE_GAP_MM)
    }

    fn header(&mut self, logo: Option<&LogoImage>) {
        let gap = self.gap();
        let Some(section) = self.layout.section(SectionKind::Header).copied() else {
            return;
        };
        let box_width = (self.right - self.left) * 0.45;
        let box_height = section.height_mm * 0.8;

        match logo {
            Some(logo) => {
                let placement = fit_logo(logo.width as f64, logo.height as f64, box_width, box_height);
                self.canvas.image(
                    LOGO_NAME,
                    self.left,
                    section.top_mm + placement.offset_y,
                    placement.width,
                    placement.height,
                );
            }
            None => {
                let size = self.size(COMPANY_SIZE);
                let baseline = section.top_mm + box_height / 2.0;
                self.canvas
                    .text(FONT_BOLD, size, self.left, baseline, &self.doc.company_name);
            }
        }

        let size = self.size(BODY_SIZE);
        let mut baseline = section.top_mm + gap;
        self.canvas
            .text_right(FONT_BOLD, size, self.right, baseline, &self.doc.company_name);
        for line in &self.doc.company_lines {
            baseline += gap;
            self.canvas
                .text_right(FONT_REGULAR, size, self.right, baseline, line);
        }
    }

    fn invoice_info(&mut self) {
        let gap = self.gap();
        let Some(section) = self.layout.section(SectionKind::InvoiceInfo).copied() else {
            return;
        };
        let title_size = self.size(TITLE_SIZE);
        self.canvas.text(
            FONT_BOLD,
            title_size,
            self.left,
            section.top_mm + self.layout.scaled(10.0),
            &self.doc.title,
        );

        let size = self.size(BODY_SIZE);
        let label_x = self.left + (self.right - self.left) * 0.55;
        let mut baseline = section.top_mm + gap;
        for Field { label, value } in &self.doc.info {
            self.canvas.text(FONT_REGULAR, size, label_x, baseline, label);
            self.canvas.text_right(FONT_BOLD, size, self.right, baseline, value);
            baseline += gap;
        }
    }

    fn addresses(&mut self) {
        let gap = self.gap();
        let Some(section) = self.layout.section(SectionKind::Addresses).copied() else {
            return;
        };
        let small = self.size(SMALL_SIZE);
        let size = self.size(BODY_SIZE);
        self.canvas.text(
            FONT_REGULAR,
            small,
            self.left,
            section.top_mm + gap,
            &self.doc.sender_line,
        );
        self.canvas
            .hline(self.left, self.left + 85.0 * self.layout.scale, section.top_mm + gap * 1.3, 0.3);

        let column_width = (self.right - self.left) / 2.0;
        for (i, column) in self.doc.addresses.iter().enumerate() {
            let x = self.left + column_width * i as f64;
            let mut baseline = section.top_mm + gap * 3.0;
            self.canvas.text(FONT_BOLD, size, x, baseline, &column.heading);
            for line in &column.lines {
                baseline += gap;
                self.canvas.text(FONT_REGULAR, size, x, baseline, line);
            }
        }
    }

    /// Left edges of the four table columns
    fn columns(&self) -> [f64; 4] {
        let width = self.right - self.left;
        [
            self.left + 2.0,
            self.left + width * 0.45,
            self.left + width * 0.65,
            self.left + width * 0.82,
        ]
    }

    fn table(&mut self) {
        let size = self.size(BODY_SIZE);
        let columns = self.columns();

        if let Some(section) = self.layout.section(SectionKind::TableHeader).copied() {
            self.canvas.fill_rect(
                0.9,
                self.left,
                section.top_mm,
                self.right - self.left,
                section.height_mm,
            );
            let baseline = section.top_mm + section.height_mm * 0.65;
            for (i, label) in self.doc.table_header.iter().enumerate() {
                if i == 3 {
                    self.canvas
                        .text_right(FONT_BOLD, size, self.right - 2.0, baseline, label);
                } else {
                    self.canvas.text(FONT_BOLD, size, columns[i], baseline, label);
                }
            }
        }

        for (index, row) in self.doc.rows.iter().enumerate() {
            let Some(section) = self.layout.section(SectionKind::TableRow(index)).copied() else {
                continue;
            };
            let baseline = section.top_mm + section.height_mm * 0.65;
            for (i, cell) in row.cells.iter().enumerate() {
                if i == 3 {
                    self.canvas
                        .text_right(FONT_REGULAR, size, self.right - 2.0, baseline, cell);
                } else {
                    self.canvas.text(FONT_REGULAR, size, columns[i], baseline, cell);
                }
            }
            self.canvas
                .hline(self.left, self.right, section.bottom_mm(), 0.2);
        }
    }

    fn summary(&mut self) {
        let gap = self.gap();
        let Some(section) = self.layout.section(SectionKind::Summary).copied() else {
            return;
        };
        let size = self.size(BODY_SIZE);
        let label_x = self.left + (self.right - self.left) * 0.55;
        let mut baseline = section.top_mm + gap * 1.5;
        let last = self.doc.summary.len().saturating_sub(1);

        for (i, Field { label, value }) in self.doc.summary.iter().enumerate() {
            let font = if i == last { FONT_BOLD } else { FONT_REGULAR };
            if i == last {
                self.canvas
                    .hline(label_x, self.right, baseline - gap * 0.8, 0.5);
            }
            self.canvas.text(font, size, label_x, baseline, label);
            self.canvas
                .text_right(font, size, self.right - 2.0, baseline, value);
            baseline += gap * 1.2;
        }
    }

    fn footer(&mut self) {
        let gap = self.gap();
        let Some(section) = self.layout.section(SectionKind::Footer).copied() else {
            return;
        };
        let size = self.size(BODY_SIZE);
        let small = self.size(SMALL_SIZE);
        let mut baseline = section.top_mm + gap;

        if let Some(payment) = &self.doc.payment {
            self.canvas
                .text(FONT_BOLD, size, self.left, baseline, &payment.heading);
            let value_x = self.left + 30.0 * self.layout.scale;
            for Field { label, value } in &payment.fields {
                baseline += gap;
                self.canvas.text(FONT_REGULAR, size, self.left, baseline, label);
                self.canvas.text(FONT_REGULAR, size, value_x, baseline, value);
            }
            baseline += gap * 1.5;
            self.canvas
                .text(FONT_REGULAR, size, self.left, baseline, &payment.terms);
        }

        baseline += gap * 1.5;
        self.canvas
            .text(FONT_BOLD, size, self.left, baseline, &self.doc.closing);

        let bottom = section.bottom_mm();
        self.canvas
            .hline(self.left, self.right, bottom - gap * 1.2, 0.3);
        self.canvas
            .text(FONT_REGULAR, small, self.left, bottom - gap * 0.3, &self.doc.footer_line);
    }
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Render the invoice to PDF bytes
pub fn render_invoice(
    document: &InvoiceDocument,
    layout: &PageLayout,
    logo: Option<&LogoImage>,
) -> Result<Vec<u8>> {
    let geometry = layout.geometry;
    let mut painter = Painter {
        doc: document,
        layout,
        canvas: Canvas::new(geometry.height_mm),
        left: geometry.margin_left_mm,
        right: geometry.width_mm - geometry.margin_right_mm,
    };
    painter.header(logo);
    painter.invoice_info();
    painter.addresses();
    painter.table();
    painter.summary();
    painter.footer();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary("Helvetica"));
    let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));

    let mut resources = dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    };

    if let Some(logo) = logo {
        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(logo.width as i64),
                "Height" => Object::Integer(logo.height as i64),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            logo.rgb.clone(),
        );
        image
            .compress()
            .map_err(|e| anyhow!("failed to compress logo: {}", e))?;
        let image_id = doc.add_object(image);
        resources.set("XObject", dictionary! { LOGO_NAME => image_id });
    }
    let resources_id = doc.add_object(resources);

    let content = painter
        .canvas
        .into_content()
        .encode()
        .map_err(|e| anyhow!("failed to encode content stream: {}", e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => Object::Integer(1),
        "Resources" => resources_id,
        "MediaBox" => vec![
            real(0.0),
            real(0.0),
            real(mm_to_pt(geometry.width_mm)),
            real(mm_to_pt(geometry.height_mm)),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| anyhow!("failed to write PDF: {}", e))?;
    Ok(bytes)
}
