//! The metadata record written to the photo index on save.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::backend::{columns, ContentAccess, Filesystem, Lookup, MetadataError, Row, Value};
use crate::decode::JPEG_MIME_TYPE;
use crate::identifier::ImageIdentifier;

/// Latitude/longitude pair. Stored as a unit so a record can never carry
/// only one of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// `None` for the `(0, 0)` pair, which row stores use as "unset".
    pub fn from_pair(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude != 0.0 || longitude != 0.0 {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }
}

/// Index record of a saved image, fields in persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub title: String,
    pub display_name: String,
    pub mime_type: String,
    /// Seconds since the epoch.
    pub date_taken: i64,
    pub date_modified: i64,
    pub date_added: i64,
    /// Always 0: saved pixels are already orientation-corrected.
    pub orientation: i32,
    /// Absolute path of the saved file.
    pub data_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    pub location: Option<GeoLocation>,
}

impl SaveRecord {
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|l| l.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|l| l.longitude)
    }

    /// Column/value pairs in persisted order. Location columns are left out
    /// entirely when there is no location.
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![
            (columns::TITLE, Value::Text(self.title.clone())),
            (columns::DISPLAY_NAME, Value::Text(self.display_name.clone())),
            (columns::MIME_TYPE, Value::Text(self.mime_type.clone())),
            (columns::DATE_TAKEN, Value::Integer(self.date_taken)),
            (columns::DATE_MODIFIED, Value::Integer(self.date_modified)),
            (columns::DATE_ADDED, Value::Integer(self.date_added)),
            (columns::ORIENTATION, Value::Integer(self.orientation as i64)),
            (
                columns::DATA,
                Value::Text(self.data_path.to_string_lossy().into_owned()),
            ),
            (columns::SIZE, Value::Integer(self.size as i64)),
        ];
        if let Some(location) = self.location {
            fields.push((columns::LATITUDE, Value::Real(location.latitude)));
            fields.push((columns::LONGITUDE, Value::Real(location.longitude)));
        }
        fields
    }

    pub fn to_row(&self) -> Row {
        self.fields().into_iter().collect()
    }
}

/// Capture time and location carried over from the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Provenance {
    pub date_taken: i64,
    pub location: Option<GeoLocation>,
}

const PROVENANCE_COLUMNS: [&str; 3] = [columns::DATE_TAKEN, columns::LATITUDE, columns::LONGITUDE];

/// Query the source's capture time and location.
pub fn query_provenance<C>(content: &C, source: &ImageIdentifier) -> Lookup<Provenance>
where
    C: ContentAccess + ?Sized,
{
    let result = content.query_row(source, &PROVENANCE_COLUMNS);
    Lookup::from_query(result, |row| -> Result<Provenance, MetadataError> {
        Ok(Provenance {
            date_taken: row.get_i64(columns::DATE_TAKEN)?,
            location: GeoLocation::from_pair(
                row.get_f64(columns::LATITUDE)?,
                row.get_f64(columns::LONGITUDE)?,
            ),
        })
    })
}

/// Build the index record for `output`, saved at `timestamp_millis`.
///
/// Title and display name come from the output file name. Capture time and
/// location are copied from the source's indexed metadata when it can be
/// read; otherwise the capture time is the save time and there is no
/// location. Metadata failures never fail the build.
pub fn build_save_record<C, F>(
    content: &C,
    fs: &F,
    source: &ImageIdentifier,
    output: &Path,
    timestamp_millis: i64,
) -> SaveRecord
where
    C: ContentAccess + ?Sized,
    F: Filesystem + ?Sized,
{
    let seconds = timestamp_millis / 1000;
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let size = fs.file_size(output).unwrap_or_else(|e| {
        debug!("No size for {}: {}", output.display(), e);
        0
    });

    let mut record = SaveRecord {
        title: name.clone(),
        display_name: name,
        mime_type: JPEG_MIME_TYPE.to_string(),
        date_taken: seconds,
        date_modified: seconds,
        date_added: seconds,
        orientation: 0,
        data_path: fs.absolute_path(output),
        size,
        location: None,
    };

    match query_provenance(content, source) {
        Lookup::Found(provenance) => {
            record.date_taken = provenance.date_taken;
            record.location = provenance.location;
        }
        Lookup::NotFound => {}
        Lookup::Unavailable(e) => debug!("No provenance for {}: {}", source, e),
    }

    record
}
