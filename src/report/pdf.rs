//! Minimal PDF export: landscape A4, built-in Helvetica, paginated table.
//!
//! Helvetica only covers Latin-1, so names fall back from English to Arabic
//! and anything outside Latin-1 prints as `?`.

use super::{Report, format_date, format_datetime};
use crate::types::TaskView;
use std::fmt::Write as _;

const PAGE_WIDTH: f64 = 842.0;
const PAGE_HEIGHT: f64 = 595.0;
const MARGIN: f64 = 40.0;
const ROW_HEIGHT: f64 = 16.0;
const TABLE_FONT_SIZE: f64 = 9.0;
/// Table top on the first page, below the title block.
const FIRST_TABLE_TOP: f64 = 142.0;

const COLUMNS: [(&str, f64); 7] = [
    ("Company", 170.0),
    ("Task Type", 140.0),
    ("Priority", 70.0),
    ("Status", 80.0),
    ("Assignee", 140.0),
    ("Start Date", 81.0),
    ("End Date", 81.0),
];

/// Header fill, rgb(30, 64, 175).
const HEADER_FILL: &str = "0.118 0.251 0.686 rg";

/// Encode text for a Helvetica string literal.
fn pdf_string(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    let chars: Vec<char> = text.chars().collect();
    let truncated = chars.len() > max_chars;
    let take = if truncated {
        max_chars.saturating_sub(3)
    } else {
        chars.len()
    };
    for &ch in &chars[..take] {
        let code = ch as u32;
        let ch = if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
            ch
        } else {
            '?'
        };
        if matches!(ch, '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    if truncated {
        out.push_str("...");
    }
    out.push(')');
    out
}

/// Latin-1 bytes of an already-sanitized content stream.
fn latin1_bytes(content: &str) -> Vec<u8> {
    content
        .chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

fn text(content: &mut String, x: f64, y_top: f64, size: f64, value: &str, max_chars: usize) {
    let _ = writeln!(
        content,
        "BT /F1 {size} Tf {x:.1} {:.1} Td {} Tj ET",
        PAGE_HEIGHT - y_top,
        pdf_string(value, max_chars)
    );
}

fn table_row(content: &mut String, y_top: f64, cells: &[String], header: bool) {
    let y = PAGE_HEIGHT - y_top - ROW_HEIGHT;
    let width: f64 = COLUMNS.iter().map(|(_, w)| w).sum();

    if header {
        let _ = writeln!(
            content,
            "{HEADER_FILL} {MARGIN:.1} {y:.1} {width:.1} {ROW_HEIGHT:.1} re f 1 g"
        );
    } else {
        let _ = writeln!(
            content,
            "0.8 G 0.5 w {MARGIN:.1} {y:.1} m {:.1} {y:.1} l S 0 g",
            MARGIN + width
        );
    }

    let mut x = MARGIN;
    for (cell, (_, col_width)) in cells.iter().zip(COLUMNS.iter()) {
        let max_chars = ((col_width - 8.0) / (TABLE_FONT_SIZE * 0.5)).max(4.0) as usize;
        text(content, x + 4.0, y_top + 11.5, TABLE_FONT_SIZE, cell, max_chars);
        x += col_width;
    }

    if header {
        content.push_str("0 g\n");
    }
}

fn cells(view: &TaskView, report: &Report) -> Vec<String> {
    let offset = report.offset();
    let task = &view.task;
    let dash = || "-".to_string();
    vec![
        view.company
            .as_ref()
            .map(|c| c.name_en.clone().unwrap_or_else(|| c.name_ar.clone()))
            .unwrap_or_else(dash),
        view.category
            .as_ref()
            .map(|c| c.task_type.clone())
            .unwrap_or_else(dash),
        task.priority.label_en().to_string(),
        task.status.label_en().to_string(),
        view.assignee
            .as_ref()
            .map(|a| a.full_name_en.clone().unwrap_or_else(|| a.full_name_ar.clone()))
            .unwrap_or_else(dash),
        format_date(task.start_date, offset),
        format_date(task.end_date, offset),
    ]
}

/// Lay out the report into page content streams.
fn pages(report: &Report, title: &str) -> Vec<String> {
    let header: Vec<String> = COLUMNS.iter().map(|(name, _)| name.to_string()).collect();
    let bottom = PAGE_HEIGHT - MARGIN;

    let mut pages = Vec::new();
    let mut content = String::new();

    text(&mut content, MARGIN, 62.0, 18.0, title, 90);
    text(
        &mut content,
        MARGIN,
        85.0,
        11.0,
        &format!("Period: {}", report.period_label()),
        140,
    );
    text(
        &mut content,
        MARGIN,
        102.0,
        11.0,
        &format!(
            "Generated: {}",
            format_datetime(report.generated_at, report.offset())
        ),
        140,
    );
    text(
        &mut content,
        MARGIN,
        125.0,
        11.0,
        &format!(
            "Total Tasks: {} | Completed: {} | Completion Rate: {}%",
            report.stats.total, report.stats.completed, report.stats.completion_rate
        ),
        140,
    );

    let mut y = FIRST_TABLE_TOP;
    table_row(&mut content, y, &header, true);
    y += ROW_HEIGHT;

    for view in &report.tasks {
        if y + ROW_HEIGHT > bottom {
            pages.push(std::mem::take(&mut content));
            y = MARGIN;
            table_row(&mut content, y, &header, true);
            y += ROW_HEIGHT;
        }
        table_row(&mut content, y, &cells(view, report), false);
        y += ROW_HEIGHT;
    }

    pages.push(content);
    pages
}

/// Serialize a PDF document with one Helvetica font and the given pages.
fn document(page_contents: &[String]) -> Vec<u8> {
    // Object numbering: 1 catalog, 2 page tree, 3 font, then (page, content) pairs.
    let page_ids: Vec<usize> = (0..page_contents.len()).map(|i| 4 + i * 2).collect();
    let mut objects: Vec<Vec<u8>> = Vec::new();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (content, page_id) in page_contents.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            )
            .into_bytes(),
        );
        let stream = latin1_bytes(content);
        let mut object = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        object.extend_from_slice(&stream);
        object.extend_from_slice(b"\nendstream");
        objects.push(object);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(object);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
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

pub(crate) fn render(report: &Report, title: &str) -> Vec<u8> {
    document(&pages(report, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportPeriod, ReportStats};
    use crate::types::{EmployeeRef, Priority, Task, TaskStatus};

    fn view(i: usize) -> TaskView {
        TaskView {
            task: Task {
                id: format!("t{i}"),
                company_id: "c".into(),
                category_id: "k".into(),
                description: None,
                priority: Priority::Low,
                status: TaskStatus::Done,
                assigned_to: Some("e1".into()),
                reviewed_by: None,
                notes: None,
                created_by: None,
                start_date: None,
                end_date: Some(0),
                created_at: 0,
                updated_at: 0,
            },
            company: None,
            category: None,
            assignee: Some(EmployeeRef {
                id: "e1".into(),
                username: "sara".into(),
                full_name_ar: "سارة".into(),
                full_name_en: Some("Sara (Audit)".into()),
            }),
            reviewer: None,
            next_statuses: Vec::new(),
        }
    }

    fn report(rows: usize) -> Report {
        Report {
            period: ReportPeriod::All,
            window: None,
            employee_id: None,
            generated_at: 0,
            utc_offset_minutes: 0,
            stats: ReportStats::default(),
            tasks: (0..rows).map(view).collect(),
        }
    }

    #[test]
    fn non_latin1_becomes_question_marks() {
        assert_eq!(pdf_string("شركة", 20), "(????)");
        assert_eq!(pdf_string("Café (a\\b)", 20), "(Café \\(a\\\\b\\))");
    }

    #[test]
    fn long_text_is_truncated() {
        assert_eq!(pdf_string("abcdefghij", 6), "(abc...)");
    }

    #[test]
    fn document_is_well_formed() {
        let bytes = render(&report(3), "Wise - Task Report");
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Wise - Task Report) Tj"));
        assert!(text.contains("(Period: All Time) Tj"));
        assert!(text.contains("(Sara \\(Audit\\)) Tj"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn long_tables_continue_on_new_pages() {
        let pages = pages(&report(60), "t");
        assert!(pages.len() >= 3);
        // Every page repeats the header.
        assert!(pages.iter().all(|p| p.contains("(Company) Tj")));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = render(&report(1), "t");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = text[start..].lines().next().unwrap().parse().unwrap();
        assert!(bytes[xref_at..].starts_with(b"xref"));
    }
}
