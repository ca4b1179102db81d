//! File structure pre-pass: header row and end-of-data detection

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::records::Contract;

use super::IngestError;

/// Result of one structure scan over a file.
///
/// The scan is a full O(n) pass; it trades one extra read of the file for
/// not needing to know the file length during the data pass.
#[derive(Debug, Clone)]
pub struct FileScan {
    /// Lowercased, trimmed header cells
    pub header: Vec<String>,
    /// Row index beyond which no data rows are processed
    pub end_of_data: usize,
    /// Total rows in the file
    pub total_rows: usize,
}

impl FileScan {
    /// Scan `source` once according to the contract's positional rules and
    /// rewind it so the same source can be read again from the start.
    pub fn run<R: Read + Seek>(source: &mut R, contract: &Contract) -> Result<Self, IngestError> {
        let mut header: Option<Vec<String>> = None;
        let mut end_of_data: Option<usize> = None;
        let mut blank_run = 0;
        let mut total_rows = 0;

        {
            let mut reader = contract.dialect.reader(&mut *source);
            for (row_number, row) in reader.records().enumerate() {
                let row = row?;
                total_rows += 1;

                if row_number == contract.header_position {
                    if row.iter().any(|cell| !cell.trim().is_empty()) {
                        header = Some(row.iter().map(|cell| cell.trim().to_lowercase()).collect());
                    } else {
                        return Err(IngestError::EmptyHeader(contract.header_position));
                    }
                }

                // A run of blank rows can mark end-of-data; otherwise data
                // runs to the end of the file
                if contract.empty_rows_eod > 0 && end_of_data.is_none() {
                    if row.iter().all(|cell| cell.trim().is_empty()) {
                        blank_run += 1;
                        if blank_run >= contract.empty_rows_eod {
                            end_of_data = Some(row_number);
                        }
                    } else {
                        blank_run = 0;
                    }
                }
            }
        }

        source.seek(SeekFrom::Start(0))?;

        let Some(header) = header else {
            return Err(IngestError::HeaderNotFound(contract.header_position));
        };
        let end_of_data = end_of_data.unwrap_or(total_rows);
        debug!(
            columns = header.len(),
            end_of_data, total_rows, "scanned file structure"
        );

        Ok(Self {
            header,
            end_of_data,
            total_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordKind;
    use std::io::Cursor;

    #[test]
    fn scan_collects_normalized_header_and_rewinds() {
        let contract = RecordKind::Taxonomy.contract();
        let mut source = Cursor::new("SCI_NAME, Primary_Com_Name \nturdus migratorius,American Robin\n");
        let scan = FileScan::run(&mut source, &contract).unwrap();

        assert_eq!(scan.header, vec!["sci_name", "primary_com_name"]);
        assert_eq!(scan.end_of_data, 2);
        assert_eq!(scan.total_rows, 2);
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn blank_header_row_is_a_structural_error() {
        let contract = RecordKind::Taxonomy.contract();
        let mut source = Cursor::new(" , , \ndata,row,here\n");
        assert!(matches!(
            FileScan::run(&mut source, &contract),
            Err(IngestError::EmptyHeader(0))
        ));
    }

    #[test]
    fn missing_header_row_is_a_structural_error() {
        let contract = RecordKind::Taxonomy.contract();
        let mut source = Cursor::new("");
        assert!(matches!(
            FileScan::run(&mut source, &contract),
            Err(IngestError::HeaderNotFound(0))
        ));
    }

    #[test]
    fn header_position_can_sit_below_a_title_row() {
        let contract = RecordKind::Taxonomy.contract().with_positions(1, 2);
        let mut source = Cursor::new("Survey Export,2012\nsci_name,primary_com_name\na,b\n");
        let scan = FileScan::run(&mut source, &contract).unwrap();
        assert_eq!(scan.header, vec!["sci_name", "primary_com_name"]);
    }

    #[test]
    fn blank_row_run_marks_end_of_data() {
        let contract = RecordKind::Core.contract().with_empty_rows_eod(2);
        let data = "sampling_event_id,bcr\nS1,30\n,\n,\nS2,31\n";
        let mut source = Cursor::new(data);
        let scan = FileScan::run(&mut source, &contract).unwrap();
        // The counter reaches 2 on the second blank row (index 3)
        assert_eq!(scan.end_of_data, 3);
        assert_eq!(scan.total_rows, 5);
    }

    #[test]
    fn interrupted_blank_run_does_not_end_data() {
        let contract = RecordKind::Core.contract().with_empty_rows_eod(2);
        let data = "sampling_event_id,bcr\nS1,30\n,\nS2,31\n,\nS3,32\n";
        let mut source = Cursor::new(data);
        let scan = FileScan::run(&mut source, &contract).unwrap();
        assert_eq!(scan.end_of_data, 6);
    }

    #[test]
    fn end_of_data_defaults_to_file_end() {
        let contract = RecordKind::Core.contract();
        let data = "sampling_event_id,bcr\nS1,30\n,\n,\nS2,31\n";
        let mut source = Cursor::new(data);
        let scan = FileScan::run(&mut source, &contract).unwrap();
        assert_eq!(scan.end_of_data, 5);
    }
}
