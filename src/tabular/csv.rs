use super::{cell_text, Table, TabularError};
use ::csv::Writer;

/// Header row of labels, then one record per row.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, TabularError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(&table.headers)
        .map_err(|e| TabularError::Csv(e.to_string()))?;
    for row in &table.rows {
        let record: Vec<String> = row.iter().map(cell_text).collect();
        wtr.write_record(&record)
            .map_err(|e| TabularError::Csv(e.to_string()))?;
    }
    wtr.into_inner()
        .map_err(|e| TabularError::Csv(e.to_string()))
}
