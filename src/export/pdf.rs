use std::{io::BufWriter, path::Path};

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point,
};

use invoicedb_core::{format_date, Invoice};

use super::ExportError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TOP: f32 = PAGE_HEIGHT - MARGIN;
/// Lowest baseline before content moves to a fresh page.
const BOTTOM: f32 = 25.0;

const X_DESC: f32 = MARGIN;
const X_AMOUNT: f32 = 165.0;
/// Characters of 10pt text that fit left of the amount column.
const DESC_CHARS: usize = 70;
const NOTE_CHARS: usize = 95;

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageCursor<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    /// Moves down by `dy`, breaking to a new page when the bottom margin is
    /// reached.
    fn advance(&mut self, dy: f32) {
        self.y -= dy;
        if self.y < BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.font);
    }

    fn bold(&self, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.bold);
    }

    fn rule(&self) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }
}

/// Greedy word wrap. Words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(width.max(1)) {
            if line_len > 0 && line_len + 1 + chunk.len() > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(chunk);
            line_len += chunk.len();
        }
    }
    if line_len > 0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn check_renderable(invoices: &[Invoice]) -> Result<(), ExportError> {
    if invoices.is_empty() {
        return Err(ExportError::Render("no invoices to render".to_string()));
    }
    for invoice in invoices {
        if invoice.party.trim().is_empty() {
            return Err(ExportError::Render(format!("{} has no party name", invoice.label())));
        }
    }
    Ok(())
}

fn render_invoice(cursor: &mut PageCursor<'_>, invoice: &Invoice) {
    let heading = format!("{} INVOICE {}", invoice.variant.to_string().to_uppercase(), invoice.label());
    cursor.bold(&heading, 16.0, MARGIN);
    cursor.advance(9.0);
    cursor.text(&format!("Date: {}", format_date(invoice.date)), 10.0, MARGIN);
    cursor.text(&format!("Type: {}", invoice.variant), 10.0, PAGE_WIDTH / 2.0);
    cursor.advance(6.0);
    let party_label = match invoice.variant {
        invoicedb_core::InvoiceVariant::Inward => "Vendor",
        invoicedb_core::InvoiceVariant::Outward => "Customer",
    };
    cursor.text(&format!("{}: {}", party_label, invoice.party), 10.0, MARGIN);

    cursor.advance(10.0);
    cursor.bold("Description", 11.0, X_DESC);
    cursor.bold("Amount", 11.0, X_AMOUNT);
    cursor.advance(3.0);
    cursor.rule();
    cursor.advance(6.0);

    if invoice.items.is_empty() {
        cursor.text("Amount", 10.0, X_DESC);
        cursor.text(&invoice.total.to_string(), 10.0, X_AMOUNT);
        cursor.advance(6.0);
    } else {
        for (idx, item) in invoice.items.iter().enumerate() {
            let lines = wrap_text(&format!("{}. {}", idx + 1, item.description), DESC_CHARS);
            for (n, line) in lines.iter().enumerate() {
                if n > 0 {
                    cursor.advance(5.0);
                }
                cursor.text(line, 10.0, X_DESC);
                if n == 0 {
                    cursor.text(&item.amount.to_string(), 10.0, X_AMOUNT);
                }
            }
            cursor.advance(6.0);
        }
    }

    cursor.rule();
    cursor.advance(8.0);
    cursor.bold("Total", 12.0, X_DESC);
    cursor.bold(&invoice.total.to_string(), 12.0, X_AMOUNT);

    if let Some(notes) = invoice.description.as_deref().filter(|n| !n.trim().is_empty()) {
        cursor.advance(12.0);
        cursor.bold("Notes:", 10.0, MARGIN);
        for line in notes.lines().flat_map(|l| wrap_text(l, NOTE_CHARS)) {
            cursor.advance(5.0);
            cursor.text(&line, 9.0, MARGIN + 2.0);
        }
    }
}

/// Renders one page (or more, for long item lists) per invoice into an
/// in-memory PDF document.
pub fn render_invoices(invoices: &[Invoice]) -> Result<Vec<u8>, ExportError> {
    check_renderable(invoices)?;

    let title = match invoices {
        [single] => single.label(),
        _ => format!("{} invoices", invoices.len()),
    };
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Render(e.to_string()))?;

    {
        let mut cursor = PageCursor {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            font,
            bold,
            y: TOP,
        };
        for (idx, invoice) in invoices.iter().enumerate() {
            if idx > 0 {
                cursor.new_page();
            }
            render_invoice(&mut cursor, invoice);
        }
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| ExportError::Render(e.to_string()))?;
    writer.into_inner().map_err(|e| ExportError::Render(e.to_string()))
}

/// Renders `invoices` and writes the document to `path`.
pub fn export_invoices(path: &Path, invoices: &[Invoice]) -> Result<(), ExportError> {
    let bytes = render_invoices(invoices)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), count = invoices.len(), "PDF export written");
    Ok(())
}
