//! Text grid and delimited export of a decoded [`Timetable`].

use itertools::Itertools;
use serde::Serialize;
use std::io;
use timetable_solver::decode::{PeriodCell, Timetable, TimetableRow};

const MIN_COLUMN_WIDTH: usize = 20;
const FREE: &str = "Free";

fn cell_lines(cell: &PeriodCell) -> Vec<String> {
    if cell.is_free() {
        return vec![FREE.to_string()];
    }
    cell.lectures
        .iter()
        .map(|l| format!("{} ({}, {})", l.course, l.faculty, l.room))
        .collect()
}

/// Rows are days, columns are periods. Concurrent lectures stack inside their column.
pub fn grid(timetable: &Timetable) -> String {
    let lines: Vec<Vec<String>> = timetable.cells.iter().map(cell_lines).collect();
    let width = lines
        .iter()
        .flatten()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_COLUMN_WIDTH);
    let columns = timetable.slots_per_day as usize + 1;
    let rule_width = columns * width + (columns - 1) * 3;

    let mut out = String::new();
    let header = std::iter::once("Day/Period".to_string())
        .chain((1..=timetable.slots_per_day).map(|p| format!("P{}", p)))
        .map(|h| format!("{:^width$}", h))
        .join(" | ");
    out.push_str(&"=".repeat(rule_width));
    out.push('\n');
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    for (day, day_cells) in lines.chunks(timetable.slots_per_day as usize).enumerate() {
        let height = day_cells.iter().map(Vec::len).max().unwrap_or(1);
        for row in 0..height {
            let label = if row == 0 {
                format!("Day {}", day + 1)
            } else {
                String::new()
            };
            let line = std::iter::once(label)
                .chain(
                    day_cells
                        .iter()
                        .map(|cell| cell.get(row).cloned().unwrap_or_default()),
                )
                .map(|text| format!("{:^width$}", text))
                .join(" | ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str(&"-".repeat(rule_width));
        out.push('\n');
    }
    out
}

/// One exported line. Field order gives the header `day,period,course,faculty,room`.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    day: u32,
    period: u32,
    course: &'a str,
    faculty: &'a str,
    room: &'a str,
}

/// Writes one record per row of [`Timetable::rows`], free periods included.
pub fn delimited<W: io::Write>(
    timetable: &Timetable,
    delimiter: u8,
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    for row in timetable.rows() {
        let record = match &row {
            TimetableRow::Lecture {
                day,
                period,
                course,
                faculty,
                room,
            } => ExportRow {
                day: *day,
                period: *period,
                course,
                faculty,
                room,
            },
            TimetableRow::Free { day, period } => ExportRow {
                day: *day,
                period: *period,
                course: FREE,
                faculty: "",
                room: "",
            },
        };
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
