//! Minimal PDF 1.4 output: A4 pages, the two standard Helvetica fonts, text and
//! filled paths. Enough for ticket reports and the executive summary.

use std::f64::consts::PI;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::aggregate::Summary;
use crate::rows::TicketRow;

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 50.0;

type Rgb = (f64, f64, f64);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const GREY: Rgb = (0.45, 0.45, 0.45);
const RED: Rgb = (0.75, 0.1, 0.1);
const LIGHT: Rgb = (0.9, 0.9, 0.9);
const OPEN_COLOR: Rgb = (0.86, 0.33, 0.25);
const PROGRESS_COLOR: Rgb = (0.95, 0.68, 0.18);
const CLOSED_COLOR: Rgb = (0.24, 0.62, 0.36);

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Escapes text for a PDF literal string under WinAnsiEncoding.
///
/// Latin-1 characters are written as octal escapes; anything outside is `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\t' => out.push(' '),
            c if (0xA0..=0xFF).contains(&(c as u32)) => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap on an approximate Helvetica advance of half the font size.
fn wrap(text: &str, size: f64, width: f64) -> Vec<String> {
    let max_chars = ((width / (size * 0.5)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if word.is_empty() {
                continue;
            }
            let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Accumulates page content streams, breaking to a new page when the cursor
/// would run past the bottom margin.
struct Layout {
    pages: Vec<String>,
    current: String,
    y: f64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_space(&mut self, height: f64) {
        if self.y - height < MARGIN {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&mut self, x: f64, y: f64, font: Font, size: f64, color: Rgb, text: &str) {
        let _ = writeln!(
            self.current,
            "BT {:.3} {:.3} {:.3} rg /{} {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            color.0,
            color.1,
            color.2,
            font.resource(),
            escape(text)
        );
    }

    fn line(&mut self, font: Font, size: f64, color: Rgb, text: &str) {
        let leading = size * 1.35;
        self.ensure_space(leading);
        self.y -= leading;
        let y = self.y;
        self.text_at(MARGIN, y, font, size, color, text);
    }

    fn paragraph(&mut self, font: Font, size: f64, color: Rgb, text: &str) {
        for line in wrap(text, size, PAGE_WIDTH - 2.0 * MARGIN) {
            self.line(font, size, color, &line);
        }
    }

    fn field(&mut self, label: &str, value: &str) {
        self.paragraph(Font::Regular, 11.0, BLACK, &format!("{label}: {value}"));
    }

    fn heading(&mut self, text: &str) {
        self.gap(8.0);
        self.line(Font::Bold, 13.0, BLACK, text);
        let y = self.y - 4.0;
        self.rule(y);
        self.gap(4.0);
    }

    fn gap(&mut self, height: f64) {
        self.ensure_space(height);
        self.y -= height;
    }

    fn rule(&mut self, y: f64) {
        let _ = writeln!(
            self.current,
            "0.6 0.6 0.6 RG 0.5 w {MARGIN:.2} {y:.2} m {:.2} {y:.2} l S",
            PAGE_WIDTH - MARGIN
        );
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let _ = writeln!(
            self.current,
            "{:.3} {:.3} {:.3} rg {x:.2} {y:.2} {w:.2} {h:.2} re f",
            color.0, color.1, color.2
        );
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgb) {
        let Some(((x0, y0), rest)) = points.split_first() else {
            return;
        };
        let _ = write!(
            self.current,
            "{:.3} {:.3} {:.3} rg {x0:.2} {y0:.2} m",
            color.0, color.1, color.2
        );
        for (x, y) in rest {
            let _ = write!(self.current, " {x:.2} {y:.2} l");
        }
        self.current.push_str(" h f\n");
    }

    fn finish(mut self) -> Vec<String> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Serializes page content streams into a complete PDF file.
fn assemble(pages: &[String]) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-4 fonts, then a page and its content per page.
    let page_obj = |i: usize| 5 + 2 * i;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_obj(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (i, content) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_obj(i) + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

fn stamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Single-ticket report including the visit report when there is one.
pub fn ticket_report(project: &str, row: &TicketRow) -> Vec<u8> {
    let mut doc = Layout::new();

    doc.line(Font::Regular, 9.0, GREY, project);
    doc.paragraph(Font::Bold, 18.0, BLACK, &format!("Ticket #{}: {}", row.id, row.title));
    doc.gap(6.0);

    doc.field("Status", row.status.label());
    doc.field(
        "Priority",
        row.priority.map(|p| p.label()).unwrap_or("Not set"),
    );
    doc.field("Location", row.location.as_deref().unwrap_or("Not given"));
    doc.field("Client", &row.client);
    doc.field(
        "Technician",
        row.technician.as_deref().unwrap_or("Unassigned"),
    );
    doc.field("Created", &stamp(row.created_at));
    doc.field("Last updated", &stamp(row.updated_at));

    doc.heading("Description");
    doc.paragraph(Font::Regular, 11.0, BLACK, &row.description);

    doc.heading("Visit report");
    match &row.work_performed {
        Some(work) => {
            if let Some(visited) = row.visited_at {
                doc.field("Visited", &stamp(visited));
            }
            doc.line(Font::Bold, 11.0, BLACK, "Work performed");
            doc.paragraph(Font::Regular, 11.0, BLACK, work);
            let materials = row.materials_used.as_deref().unwrap_or_default();
            doc.line(Font::Bold, 11.0, BLACK, "Materials used");
            doc.paragraph(
                Font::Regular,
                11.0,
                BLACK,
                if materials.is_empty() { "None" } else { materials },
            );
            if let Some(photo) = &row.photo_filename {
                doc.field("Photo", photo);
            }
        }
        None => doc.paragraph(Font::Regular, 11.0, GREY, "No visit report yet."),
    }

    assemble(&doc.finish())
}

/// Pie slices as polygons approximating each arc in steps of at most two degrees.
fn pie_slices(cx: f64, cy: f64, r: f64, values: &[u64]) -> Vec<Vec<(f64, f64)>> {
    let total: u64 = values.iter().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut start = PI / 2.0;
    let mut slices = Vec::new();
    for &value in values {
        if value == 0 {
            slices.push(Vec::new());
            continue;
        }
        let sweep = value as f64 / total as f64 * 2.0 * PI;
        let steps = ((sweep.to_degrees() / 2.0).ceil() as usize).max(1);
        let mut points = vec![(cx, cy)];
        for step in 0..=steps {
            let angle = start - sweep * step as f64 / steps as f64;
            points.push((cx + r * angle.cos(), cy + r * angle.sin()));
        }
        slices.push(points);
        start -= sweep;
    }
    slices
}

fn state_chart(doc: &mut Layout, summary: &Summary) {
    let radius = 70.0;
    let height = 2.0 * radius + 20.0;
    doc.ensure_space(height);
    let top = doc.y;
    let cx = MARGIN + radius + 10.0;
    let cy = top - radius - 10.0;

    let counts = &summary.counts;
    let legend = [
        ("Open", counts.open, OPEN_COLOR),
        ("In Progress", counts.in_progress, PROGRESS_COLOR),
        ("Closed", counts.closed, CLOSED_COLOR),
    ];

    let slices = pie_slices(cx, cy, radius, &legend.map(|(_, v, _)| v));
    if slices.is_empty() {
        let circle = pie_slices(cx, cy, radius, &[1]);
        for points in circle {
            doc.fill_polygon(&points, LIGHT);
        }
        doc.text_at(cx - 20.0, cy - 4.0, Font::Regular, 10.0, GREY, "No data");
    } else {
        for (points, (_, _, color)) in slices.iter().zip(legend.iter()) {
            doc.fill_polygon(points, *color);
        }
    }

    let lx = cx + radius + 40.0;
    for (i, (label, value, color)) in legend.iter().enumerate() {
        let ly = top - 30.0 - i as f64 * 22.0;
        doc.fill_rect(lx, ly, 12.0, 12.0, *color);
        let share = if counts.total == 0 {
            0.0
        } else {
            *value as f64 / counts.total as f64 * 100.0
        };
        doc.text_at(
            lx + 20.0,
            ly + 2.0,
            Font::Regular,
            11.0,
            BLACK,
            &format!("{label}: {value} ({share:.1}%)"),
        );
    }
    let ly = top - 30.0 - 3.0 * 22.0;
    doc.text_at(
        lx + 20.0,
        ly + 2.0,
        Font::Bold,
        11.0,
        BLACK,
        &format!("Overdue: {}", counts.overdue),
    );

    doc.y = top - height;
}

fn technician_table(doc: &mut Layout, summary: &Summary) {
    let columns = [MARGIN, MARGIN + 220.0, MARGIN + 310.0, MARGIN + 400.0];
    let row_height = 18.0;

    let header = ["Technician", "Assigned", "Closed", "Effectiveness"];
    doc.ensure_space(row_height);
    doc.y -= row_height;
    doc.fill_rect(
        MARGIN - 4.0,
        doc.y - 5.0,
        PAGE_WIDTH - 2.0 * MARGIN + 8.0,
        row_height,
        LIGHT,
    );
    let y = doc.y;
    for (x, title) in columns.iter().zip(header) {
        doc.text_at(*x, y, Font::Bold, 11.0, BLACK, title);
    }

    if summary.technicians.is_empty() {
        doc.line(Font::Regular, 11.0, GREY, "No technicians registered.");
        return;
    }

    for tech in &summary.technicians {
        doc.ensure_space(row_height);
        doc.y -= row_height;
        let y = doc.y;
        let cells = [
            tech.username.clone(),
            tech.assigned.to_string(),
            tech.closed.to_string(),
            format!("{:.1}%", tech.effectiveness),
        ];
        for (x, cell) in columns.iter().zip(cells) {
            doc.text_at(*x, y, Font::Regular, 11.0, BLACK, &cell);
        }
    }
}

/// Executive summary: narrative, state pie chart and technician table.
pub fn executive_summary(project: &str, summary: &Summary) -> Vec<u8> {
    let mut doc = Layout::new();

    doc.line(Font::Regular, 9.0, GREY, project);
    doc.line(Font::Bold, 20.0, BLACK, "Executive summary");
    doc.line(
        Font::Regular,
        10.0,
        GREY,
        &format!("Generated {}", stamp(summary.generated_at)),
    );

    doc.heading("Overview");
    for line in &summary.narrative {
        let (font, color) = if line.starts_with("ALERT") {
            (Font::Bold, RED)
        } else {
            (Font::Regular, BLACK)
        };
        doc.paragraph(font, 11.0, color, line);
        doc.gap(4.0);
    }

    doc.heading("Tickets by state");
    state_chart(&mut doc, summary);

    doc.heading("Technician effectiveness");
    technician_table(&mut doc, summary);

    assemble(&doc.finish())
}
