//! Human-readable dump of the view table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CameraId, ObservationDatabase, Real};

/// One row of [`TableDump`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub timestamp: Real,
    /// Feature count per camera, aligned with [`TableDump::cameras`];
    /// `None` where the camera is absent from the view.
    pub feature_counts: Vec<Option<usize>>,
}

/// Snapshot of the view table sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDump {
    pub cameras: Vec<CameraId>,
    pub rows: Vec<TableRow>,
}

impl fmt::Display for TableDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timestamp")?;
        for cam in &self.cameras {
            write!(f, "\tcam{cam}")?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{}", row.timestamp)?;
            for count in &row.feature_counts {
                match count {
                    Some(n) => write!(f, "\t{n}")?,
                    None => write!(f, "\t-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<O> ObservationDatabase<O> {
    /// Build the diagnostic table: one column per stored camera, one row per
    /// view in ascending timestamp order.
    pub fn table_dump(&self) -> TableDump {
        let cameras: Vec<CameraId> = self.store.camera_ids().collect();
        let mut rows: Vec<TableRow> = self
            .table
            .iter()
            .map(|view| TableRow {
                timestamp: view.timestamp(),
                feature_counts: cameras
                    .iter()
                    .map(|&cam| view.slot(cam).map(|slot| slot.feature_ids.len()))
                    .collect(),
            })
            .collect();
        rows.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        TableDump { cameras, rows }
    }

    /// Print [`ObservationDatabase::table_dump`] to stdout.
    pub fn print_table(&self) {
        print!("{}", self.table_dump());
    }
}
