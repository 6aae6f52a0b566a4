//! Spreadsheet export: one right-to-left sheet of task rows.

use super::{Report, format_date, or_dash};
use anyhow::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

pub(crate) const SHEET_NAME: &str = "التقرير";

pub(crate) const HEADERS: [&str; 10] = [
    "الشركة",
    "نوع المهمة",
    "التصنيف",
    "الوصف",
    "الأولوية",
    "الحالة",
    "المسؤول",
    "تاريخ البدء",
    "تاريخ الانتهاء",
    "ملاحظات",
];

const COLUMN_WIDTHS: [f64; 10] = [28.0, 24.0, 20.0, 36.0, 10.0, 12.0, 20.0, 12.0, 12.0, 30.0];

/// Cell values for one task, in header order.
pub(crate) fn task_row(report: &Report, index: usize) -> Vec<String> {
    let offset = report.offset();
    let view = &report.tasks[index];
    let task = &view.task;
    vec![
        or_dash(view.company.as_ref().map(|c| c.name_ar.as_str())),
        or_dash(view.category.as_ref().map(|c| c.task_type.as_str())),
        or_dash(view.category.as_ref().map(|c| c.classification.as_str())),
        or_dash(task.description.as_deref()),
        task.priority.label_ar().to_string(),
        task.status.label_ar().to_string(),
        or_dash(view.assignee.as_ref().map(|a| a.full_name_ar.as_str())),
        format_date(task.start_date, offset),
        format_date(task.end_date, offset),
        or_dash(task.notes.as_deref()),
    ]
}

pub(crate) fn render(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    worksheet.set_right_to_left(true);

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1E40AF))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new()
        .set_align(FormatAlign::Right)
        .set_border(FormatBorder::Thin);

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        worksheet.set_column_width(col as u16, COLUMN_WIDTHS[col])?;
    }

    for index in 0..report.tasks.len() {
        let row = (index + 1) as u32;
        for (col, value) in task_row(report, index).iter().enumerate() {
            worksheet.write_string_with_format(row, col as u16, value, &cell_format)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}
