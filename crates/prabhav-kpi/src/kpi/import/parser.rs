use std::io::Read;

use crate::kpi::parameters::ParameterSet;

use super::ParameterImportError;

/// Reads header-less `name,value,value,...` rows.
pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParameterSet, ParameterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut set = ParameterSet::new();

    for (row_index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = row_index + 1;
        let mut fields = record.iter();

        let name = match fields.next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ParameterImportError::EmptyName { row }),
        };

        let values = fields
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(offset, cell)| {
                cell.parse::<f64>()
                    .map_err(|_| ParameterImportError::InvalidValue {
                        parameter: name.clone(),
                        column: offset + 2,
                        value: cell.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        set.insert(name, values);
    }

    Ok(set)
}
