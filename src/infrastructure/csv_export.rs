// CSV table artifact for a time series
use crate::domain::artifact::Artifact;
use crate::domain::ndvi::NdviSeries;
use crate::infrastructure::export::ExportError;

/// `Date,NDVI` header then one row per record; nulls become empty fields
pub fn series_to_csv(series: &NdviSeries) -> Result<Artifact, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(["Date", "NDVI"])?;
    for record in &series.records {
        let value = record.ndvi.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([record.date_str(), value])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(Artifact::csv(bytes))
}
