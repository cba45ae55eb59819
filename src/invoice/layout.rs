//! Single-page layout computation
//!
//! The invoice is always one A4 page. Sections are stacked from the top
//! margin with fixed nominal heights; when they do not fit, every section is
//! shrunk by the same factor instead of flowing onto a second page.

use serde::{Deserialize, Serialize};

/// Page size and margins in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_top_mm: 20.0,
            margin_bottom_mm: 20.0,
            margin_left_mm: 20.0,
            margin_right_mm: 20.0,
        }
    }

    /// Printable height between top and bottom margin
    pub fn available_height(&self) -> f64 {
        (self.height_mm - self.margin_top_mm - self.margin_bottom_mm).max(0.0)
    }

    /// Printable width between left and right margin
    pub fn content_width(&self) -> f64 {
        (self.width_mm - self.margin_left_mm - self.margin_right_mm).max(0.0)
    }
}

/// The vertical sections of the invoice, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    InvoiceInfo,
    Addresses,
    TableHeader,
    TableRow(usize),
    Summary,
    Footer,
}

/// Nominal section heights in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionHeights {
    pub header: f64,
    pub invoice_info: f64,
    pub addresses: f64,
    pub table_header: f64,
    pub table_row: f64,
    pub summary: f64,
    pub footer: f64,
}

impl Default for SectionHeights {
    fn default() -> Self {
        Self {
            header: 40.0,
            invoice_info: 30.0,
            addresses: 45.0,
            table_header: 10.0,
            table_row: 10.0,
            summary: 35.0,
            footer: 50.0,
        }
    }
}

impl SectionHeights {
    /// Nominal sections in page order
    fn sections(&self, row_count: usize) -> Vec<(SectionKind, f64)> {
        let mut sections = vec![
            (SectionKind::Header, self.header),
            (SectionKind::InvoiceInfo, self.invoice_info),
            (SectionKind::Addresses, self.addresses),
            (SectionKind::TableHeader, self.table_header),
        ];
        sections.extend((0..row_count).map(|i| (SectionKind::TableRow(i), self.table_row)));
        sections.push((SectionKind::Summary, self.summary));
        sections.push((SectionKind::Footer, self.footer));
        sections
    }

    /// Total nominal height for the given number of table rows
    pub fn required_height(&self, row_count: usize) -> f64 {
        self.sections(row_count).iter().map(|(_, h)| h).sum()
    }
}

/// A section placed on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedSection {
    pub kind: SectionKind,
    /// Distance from the top edge of the page
    pub top_mm: f64,
    pub height_mm: f64,
}

impl PlacedSection {
    pub fn bottom_mm(&self) -> f64 {
        self.top_mm + self.height_mm
    }
}

/// Result of the layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub geometry: PageGeometry,
    pub scale: f64,
    pub sections: Vec<PlacedSection>,
}

impl PageLayout {
    pub fn section(&self, kind: SectionKind) -> Option<&PlacedSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Sum of all placed section heights
    pub fn content_height(&self) -> f64 {
        self.sections.iter().map(|s| s.height_mm).sum()
    }

    /// Scale a nominal length (font size, line gap) the same way as sections
    pub fn scaled(&self, nominal: f64) -> f64 {
        nominal * self.scale
    }
}

/// Shared shrink factor: `available / required`, capped at 1.0
pub fn scale_factor(required: f64, available: f64) -> f64 {
    if required <= 0.0 || required <= available {
        1.0
    } else {
        (available / required).clamp(0.0, 1.0)
    }
}

/// Stack the sections from the top margin, shrinking them uniformly if needed
pub fn compute_layout(
    geometry: PageGeometry,
    heights: &SectionHeights,
    row_count: usize,
) -> PageLayout {
    let nominal = heights.sections(row_count);
    let required: f64 = nominal.iter().map(|(_, h)| h).sum();
    let scale = scale_factor(required, geometry.available_height());

    let mut top = geometry.margin_top_mm;
    let sections = nominal
        .into_iter()
        .map(|(kind, height)| {
            let placed = PlacedSection {
                kind,
                top_mm: top,
                height_mm: height * scale,
            };
            top += placed.height_mm;
            placed
        })
        .collect();

    PageLayout {
        geometry,
        scale,
        sections,
    }
}

/// Where the logo lands inside its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPlacement {
    pub width: f64,
    pub height: f64,
    /// Offset from the top of the box that centers the logo vertically
    pub offset_y: f64,
}

/// Fit an image into a box, preserving its aspect ratio
pub fn fit_logo(image_width: f64, image_height: f64, box_width: f64, box_height: f64) -> LogoPlacement {
    if image_width <= 0.0 || image_height <= 0.0 {
        return LogoPlacement {
            width: 0.0,
            height: 0.0,
            offset_y: box_height / 2.0,
        };
    }

    let ratio = (box_width / image_width).min(box_height / image_height);
    let width = image_width * ratio;
    let height = image_height * ratio;

    LogoPlacement {
        width,
        height,
        offset_y: (box_height - height) / 2.0,
    }
}
