//! Raw CSV to encoded feature table.

use std::fs::{self, File};
use std::path::Path;

use log::info;
use polars::prelude::*;
use polars_io::parquet::ParquetWriter;

use crate::dataset::Dataset;
use crate::encoder::{Encoders, LabelEncoder};
use crate::error::{Result, StrokeError};
use crate::records::{StrokeRecord, ID_COLUMN, TARGET_COLUMN};

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StrokeError::io(path, e))?;

    let df = CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Some(Arc::new(StrokeRecord::raw_schema())))
        .with_null_values(Some(NullValues::AllColumns(vec!["N/A".to_string()])))
        .finish()?;
    info!("read {} rows from {}", df.height(), path.display());
    Ok(df)
}

/// Lower-case headers, check the schema (no missing or extra columns), drop the identifier
/// and every row with a missing value.
pub fn clean(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for name in &names {
        let lower = name.to_lowercase();
        if &lower != name {
            df.rename(name, &lower)?;
        }
    }

    let present: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let required = StrokeRecord::required_columns();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !present.iter().any(|p| p == col))
        .collect();
    if !missing.is_empty() {
        return Err(StrokeError::Schema(format!("missing columns {missing:?}")));
    }

    let unexpected: Vec<&str> = present
        .iter()
        .map(String::as_str)
        .filter(|p| *p != ID_COLUMN && !required.iter().any(|r| r == p))
        .collect();
    if !unexpected.is_empty() {
        return Err(StrokeError::Schema(format!("unexpected columns {unexpected:?}")));
    }

    if present.iter().any(|p| p == ID_COLUMN) {
        df = df.drop(ID_COLUMN)?;
        info!("dropped identifier column {ID_COLUMN:?}");
    }

    let before = df.height();
    let df = df.drop_nulls::<String>(None)?;
    info!("dropped {} rows with missing values, {} left", before - df.height(), df.height());
    if df.height() == 0 {
        return Err(StrokeError::Schema("no complete rows left".into()));
    }
    Ok(df)
}

/// Fit one encoder per string column and turn the frame into a numeric dataset.
pub fn encode(df: &DataFrame) -> Result<(Dataset, Encoders)> {
    let mut encoders = Encoders::new();
    let mut columns = Vec::new();
    let mut values: Vec<Vec<f64>> = Vec::new();

    for series in df.get_columns() {
        let name = series.name().to_string();
        if name == TARGET_COLUMN {
            continue;
        }
        let column: Vec<f64> = match series.dtype() {
            DataType::Utf8 => {
                let raw: Vec<&str> = series.utf8()?.into_no_null_iter().collect();
                let (encoder, codes) = LabelEncoder::fit_transform(&name, &raw)?;
                info!("encoded {name} into {} classes", encoder.classes().len());
                encoders.insert(name.clone(), encoder);
                codes.into_iter().map(f64::from).collect()
            }
            _ => {
                let cast = series.cast(&DataType::Float64)?;
                let floats: Vec<f64> = cast.f64()?.into_no_null_iter().collect();
                floats
            }
        };
        columns.push(name);
        values.push(column);
    }

    let target = df.column(TARGET_COLUMN)?.cast(&DataType::Int32)?;
    let labels: Vec<i32> = target.i32()?.into_no_null_iter().collect();
    if let Some(bad) = labels.iter().find(|&&l| l != 0 && l != 1) {
        return Err(StrokeError::Schema(format!("target {TARGET_COLUMN:?} holds {bad}, expected 0 or 1")));
    }

    let rows = (0..df.height())
        .map(|r| values.iter().map(|col| col[r]).collect())
        .collect();
    let dataset = Dataset::new(columns, rows, labels)?;
    Ok((dataset, encoders))
}

/// Read, clean and encode in one go.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<(DataFrame, Dataset, Encoders)> {
    let df = clean(read_csv(path)?)?;
    let (dataset, encoders) = encode(&df)?;
    let [neg, pos] = dataset.class_counts();
    info!("total rows after cleaning: {} ({neg} without stroke, {pos} with stroke)", dataset.len());
    dataset.ensure_both_classes()?;
    Ok((df, dataset, encoders))
}

pub fn to_frame(data: &Dataset) -> Result<DataFrame> {
    let mut series: Vec<Series> = data
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| Series::new(name, data.column_values(i)))
        .collect();
    series.push(Series::new(TARGET_COLUMN, data.labels.clone()));
    Ok(DataFrame::new(series)?)
}

pub fn write_parquet(path: &Path, df: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StrokeError::io(parent, e))?;
    }
    let mut file = File::create(path).map_err(|e| StrokeError::io(path, e))?;
    ParquetWriter::new(&mut file).finish(df)?;
    info!("wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
