use arrow::{
    array::{ArrayRef, Date32Array, Float64Builder, StringArray},
    datatypes::DataType,
};
use chrono::NaiveDate;
use std::sync::Arc;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Finite number or `None`. `NaN` and `inf` spellings stay text.
pub fn parse_finite(raw: &str) -> Option<f64> {
    clean_str(raw).parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Float64 when every present cell parses as a finite number, Utf8 otherwise.
/// An all-null column is Float64.
pub fn infer_arrow_dtype<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let all_numeric = cells
        .into_iter()
        .flatten()
        .all(|s| parse_finite(s).is_some());
    if all_numeric {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Build a column of `dtype` (Float64 or Utf8) from optional string cells.
pub fn string_cells_to_array<'a, I>(cells: I, dtype: &DataType) -> ArrayRef
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    match dtype {
        DataType::Float64 => {
            let mut b = Float64Builder::new();
            for cell in cells {
                b.append_option(cell.and_then(parse_finite));
            }
            Arc::new(b.finish())
        }
        _ => Arc::new(cells.into_iter().collect::<StringArray>()),
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Arrow `Date32` column (days since 1970-01-01).
pub fn dates_to_array<I: IntoIterator<Item = NaiveDate>>(dates: I) -> ArrayRef {
    let epoch = epoch();
    let days: Vec<i32> = dates
        .into_iter()
        .map(|d| d.signed_duration_since(epoch).num_days() as i32)
        .collect();
    Arc::new(Date32Array::from(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array};

    #[test]
    fn clean_strips_quotes() {
        assert_eq!(clean_str("  \"1.5\" "), "1.5");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str("abc"), "abc");
    }

    #[test]
    fn dtype_inference() {
        assert_eq!(
            infer_arrow_dtype([Some("1.5"), None, Some("-2")]),
            DataType::Float64
        );
        assert_eq!(infer_arrow_dtype([Some("1.5"), Some("n/a")]), DataType::Utf8);
        assert_eq!(infer_arrow_dtype([None, None]), DataType::Float64);
        assert_eq!(infer_arrow_dtype([Some("1"), Some("NaN")]), DataType::Utf8);
        assert_eq!(infer_arrow_dtype([Some("inf")]), DataType::Utf8);
    }

    #[test]
    fn non_finite_is_not_a_number() {
        assert_eq!(parse_finite(" 2.5 "), Some(2.5));
        for raw in ["NaN", "nan", "inf", "-infinity", ""] {
            assert_eq!(parse_finite(raw), None, "{raw}");
        }
    }

    #[test]
    fn float_column_keeps_nulls() {
        let arr = string_cells_to_array([Some("2.5"), None], &DataType::Float64);
        let arr = arr.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(arr.value(0), 2.5);
        assert!(arr.is_null(1));
    }

    #[test]
    fn date32_days() {
        let arr = dates_to_array([NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()]);
        let arr = arr.as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(arr.value(0), 1);
    }
}
