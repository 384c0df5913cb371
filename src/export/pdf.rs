use crate::models::{RowKind, SummaryRow};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

// A4 landscape, points.
const PAGE_W: f32 = 842.0;
const PAGE_H: f32 = 595.0;
const MARGIN: f32 = 40.0;
const ROW_H: f32 = 18.0;
const FONT_SIZE: f32 = 8.0;
const HEADER_FONT_SIZE: f32 = 9.0;
const TITLE_FONT_SIZE: f32 = 14.0;

const HEADERS: [&str; 12] = [
    "Parish", "Code", "Voting center", "Reg.", "Resp.", "Yes", "No", "Unsure",
    "% Part.", "% Yes", "% No", "% Unsure",
];

// Minimal hand-managed PDF builder: one font pair, one page tree, a fresh
// content stream per page.
struct PdfTable {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    font_id: Ref,
    bold_font_id: Ref,
    page_refs: Vec<Ref>,
    next_id: i32,
}

impl PdfTable {
    fn new() -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);
        let bold_font_id = Ref::new(4);

        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));
        pdf.type1_font(bold_font_id).base_font(Name(b"Helvetica-Bold"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            font_id,
            bold_font_id,
            page_refs: Vec::new(),
            next_id: 5,
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    // Registers a new page and returns the id its content stream must use.
    fn start_page(&mut self) -> Ref {
        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
            .contents(content_id);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        fonts.pair(Name(b"F1"), self.font_id);
        fonts.pair(Name(b"F2"), self.bold_font_id);

        content_id
    }

    fn finish_page(&mut self, content_id: Ref, content: Content) {
        self.pdf.stream(content_id, &content.finish());
    }

    fn finish(mut self) -> Vec<u8> {
        let count = self.page_refs.len() as i32;
        let mut pages = self.pdf.pages(self.pages_id);
        pages.count(count);
        pages.kids(self.page_refs.iter().copied());
        drop(pages);

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf.finish()
    }
}

fn draw_text(content: &mut Content, font: Name, x: f32, y: f32, size: f32, text: &str) {
    content.begin_text();
    content.set_font(font, size);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(text.as_bytes()));
    content.end_text();
}

fn draw_row(content: &mut Content, font: Name, y: f32, widths: &[f32], cells: &[String], size: f32) {
    let mut x = MARGIN;
    for (cell, width) in cells.iter().zip(widths) {
        draw_text(content, font, x + 2.0, y, size, cell);
        x += width;
    }
}

fn row_cells(row: &SummaryRow) -> Vec<String> {
    vec![
        row.parish.clone(),
        row.center_code.clone(),
        row.center_name.clone(),
        row.registered_voters.to_string(),
        row.responded.to_string(),
        row.yes.to_string(),
        row.no.to_string(),
        row.unsure.to_string(),
        format!("{:.2}", row.participation_pct),
        format!("{:.2}", row.yes_pct),
        format!("{:.2}", row.no_pct),
        format!("{:.2}", row.unsure_pct),
    ]
}

// Widths proportional to the longest cell per column, scaled to the page.
fn column_widths(rows: &[Vec<String>]) -> Vec<f32> {
    let mut widths: Vec<f32> = HEADERS.iter().map(|h| h.len() as f32 * 5.5).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len() as f32 * 4.5);
        }
    }
    let total: f32 = widths.iter().sum();
    let available = PAGE_W - 2.0 * MARGIN;
    let scale = available / total;
    for width in &mut widths {
        *width *= scale;
    }
    widths
}

// The totalized summary as a one-table PDF, paginated, header row repeated on
// every page. Subtotal and grand-total lines use the bold face.
pub fn summary_pdf(rows: &[SummaryRow]) -> Vec<u8> {
    let regular = Name(b"F1");
    let bold = Name(b"F2");

    let cells: Vec<Vec<String>> = rows.iter().map(row_cells).collect();
    let widths = column_widths(&cells);

    let mut builder = PdfTable::new();
    let mut content_id = builder.start_page();
    let mut content = Content::new();

    draw_text(
        &mut content,
        bold,
        MARGIN,
        PAGE_H - MARGIN,
        TITLE_FONT_SIZE,
        "Survey summary by parish and voting center",
    );

    let header_cells: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut y = PAGE_H - MARGIN - 2.0 * ROW_H;
    draw_row(&mut content, bold, y, &widths, &header_cells, HEADER_FONT_SIZE);
    y -= ROW_H;

    for (row, line) in rows.iter().zip(&cells) {
        if y < MARGIN {
            builder.finish_page(content_id, content);
            content_id = builder.start_page();
            content = Content::new();
            y = PAGE_H - MARGIN - ROW_H;
            draw_row(&mut content, bold, y, &widths, &header_cells, HEADER_FONT_SIZE);
            y -= ROW_H;
        }

        let font = if row.row_kind == RowKind::Center { regular } else { bold };
        draw_row(&mut content, font, y, &widths, line, FONT_SIZE);
        y -= ROW_H;
    }

    builder.finish_page(content_id, content);
    builder.finish()
}
