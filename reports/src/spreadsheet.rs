use csv::WriterBuilder;

use crate::ReportError;
use crate::rows::TicketRow;

/// UTF-8 byte order mark; Excel needs it to read non-ASCII text correctly.
const BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: [&str; 14] = [
    "ID",
    "Title",
    "Description",
    "Location",
    "Priority",
    "Status",
    "Client",
    "Technician",
    "Created",
    "Updated",
    "Visited",
    "Work performed",
    "Materials used",
    "Photo",
];

fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// One row per ticket, visit report fields left blank when there is none.
pub fn export_csv(rows: &[TicketRow]) -> Result<Vec<u8>, ReportError> {
    let mut writer = WriterBuilder::new().from_writer(BOM.to_vec());

    writer.write_record(HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.title.clone(),
            row.description.clone(),
            row.location.clone().unwrap_or_default(),
            row.priority.map(|p| p.label().to_string()).unwrap_or_default(),
            row.status.label().to_string(),
            row.client.clone(),
            row.technician.clone().unwrap_or_default(),
            timestamp(row.created_at),
            timestamp(row.updated_at),
            row.visited_at.map(timestamp).unwrap_or_default(),
            row.work_performed.clone().unwrap_or_default(),
            row.materials_used.clone().unwrap_or_default(),
            row.photo_filename.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}
