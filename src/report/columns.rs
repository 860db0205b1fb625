use anyhow::{Context, Result};
use polars::prelude::{DataFrame, DataType};
use serde_json::{json, Value};

/// Convert one DataFrame column to JSON values, nulls as `null`.
/// Integer and float columns become numbers, everything else text.
pub(crate) fn column_json(df: &DataFrame, name: &str) -> Result<Vec<Value>> {
    let column = df.column(name)
        .with_context(|| format!("[report::columns] missing column {:?}", name))?;

    let values = match column.dtype() {
        DataType::Float64 | DataType::Float32 => {
            let column = column.cast(&DataType::Float64)?;
            column.f64()?.into_iter()
                .map(|v| v.filter(|v| v.is_finite()).map(|v| json!(v)).unwrap_or(Value::Null))
                .collect()
        }
        dtype if dtype.is_integer() => {
            let column = column.cast(&DataType::Int64)?;
            column.i64()?.into_iter()
                .map(|v| v.map(|v| json!(v)).unwrap_or(Value::Null))
                .collect()
        }
        DataType::Boolean => {
            column.bool()?.into_iter()
                .map(|v| v.map(|v| json!(v)).unwrap_or(Value::Null))
                .collect()
        }
        _ => {
            let column = column.cast(&DataType::String)?;
            column.str()?.into_iter()
                .map(|v| v.map(|v| json!(v)).unwrap_or(Value::Null))
                .collect()
        }
    };

    Ok(values)
}
