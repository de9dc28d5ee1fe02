//! Z-score outlier removal over the numeric columns of a frame.

use bon::builder;
use log::debug;
use polars::prelude::*;

/// Returns a copy of `frame` in which every numeric value lying `threshold` or more
/// standard deviations away from its column mean is replaced by null.
///
/// `ddof` is the delta degrees of freedom of the standard deviation (`0` for the
/// population deviation). Non-numeric columns, such as a `date` column, are left
/// untouched, as are columns whose deviation is zero or undefined. Numeric
/// columns come back as `Float64`.
///
/// # Examples
///
/// ```
/// use gastp::remove_outliers;
/// use polars::prelude::*;
///
/// let frame = df!("flow" => [10.0, 11.0, 9.0, 10.0, 10.5, 9.5, 10.0, 60.0])?;
/// let cleaned = remove_outliers(&frame).threshold(2.0).call()?;
/// assert_eq!(cleaned.column("flow")?.null_count(), 1);
/// # Ok::<(), PolarsError>(())
/// ```
#[builder]
pub fn remove_outliers(
    #[builder(start_fn)] frame: &DataFrame,
    #[builder(default = 3.0)] threshold: f64,
    #[builder(default)] ddof: u8,
) -> PolarsResult<DataFrame> {
    let mut frame = frame.clone();
    remove_outliers_in_place(&mut frame)
        .threshold(threshold)
        .ddof(ddof)
        .call()?;
    Ok(frame)
}

/// In-place variant of [`remove_outliers`], with the same options and defaults.
#[builder]
pub fn remove_outliers_in_place(
    #[builder(start_fn)] frame: &mut DataFrame,
    #[builder(default = 3.0)] threshold: f64,
    #[builder(default)] ddof: u8,
) -> PolarsResult<()> {
    let names: Vec<PlSmallStr> = frame.get_column_names().into_iter().cloned().collect();
    for name in names {
        let column = frame.column(name.as_str())?;
        let dtype = column.dtype();
        if !(dtype.is_float() || dtype.is_integer()) {
            continue;
        }

        let values: Float64Chunked = column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        let (Some(mean), Some(std)) = (values.mean(), values.std(ddof)) else {
            continue;
        };
        if std == 0.0 || !std.is_finite() {
            continue;
        }

        let before = values.null_count();
        let kept: Float64Chunked = values
            .into_iter()
            .map(|v| v.filter(|x| ((x - mean) / std).abs() < threshold))
            .collect();
        debug!(
            "Removed {} outliers from column {}",
            kept.null_count() - before,
            name
        );
        frame.with_column(kept.with_name(name).into_series())?;
    }
    Ok(())
}
