//! Categorical encoders.

use crate::utils::to_string_series;
use polars::prelude::*;
use std::collections::BTreeSet;

/// One-hot flags for a categorical column with the reference level dropped.
///
/// Levels are the distinct non-null values in byte order; the smallest is
/// the reference and gets no column. Each remaining level `v` yields a
/// Boolean column named `flag_name(v)`, true where the row equals `v`.
///
/// Returns the reference level (if any) and the flag columns in level order.
pub(crate) fn one_hot_drop_first(
    series: &Series,
    flag_name: impl Fn(&str) -> String,
) -> PolarsResult<(Option<String>, Vec<Series>)> {
    let str_series = to_string_series(series)?;
    let values = str_series.str()?;

    let levels: BTreeSet<&str> = values.into_iter().flatten().collect();
    let mut levels = levels.into_iter();
    let reference = levels.next().map(String::from);

    let flags = levels
        .map(|level| {
            let flag: Vec<bool> = values.into_iter().map(|v| v == Some(level)).collect();
            Series::new(flag_name(level).into(), flag)
        })
        .collect();

    Ok((reference, flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnNames;

    fn flag_name(level: &str) -> String {
        ColumnNames::default().certificate_flag(level)
    }

    #[test]
    fn test_one_hot_drop_first() {
        let series = Series::new("Certificate".into(), &["UA", "A", "U", "A", "Not Rated"]);
        let (reference, flags) = one_hot_drop_first(&series, flag_name).unwrap();

        assert_eq!(reference, Some("A".to_string()));
        let names: Vec<&str> = flags.iter().map(|s| s.name().as_str()).collect();
        assert_eq!(
            names,
            vec!["Certificate_Not Rated", "Certificate_U", "Certificate_UA"]
        );

        let ua: Vec<Option<bool>> = flags[2].bool().unwrap().into_iter().collect();
        assert_eq!(
            ua,
            vec![Some(true), Some(false), Some(false), Some(false), Some(false)]
        );
    }

    #[test]
    fn test_one_hot_single_level_has_no_flags() {
        let series = Series::new("Certificate".into(), &["R", "R"]);
        let (reference, flags) = one_hot_drop_first(&series, flag_name).unwrap();
        assert_eq!(reference, Some("R".to_string()));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_one_hot_empty() {
        let series = Series::new("Certificate".into(), Vec::<&str>::new());
        let (reference, flags) = one_hot_drop_first(&series, flag_name).unwrap();
        assert!(reference.is_none());
        assert!(flags.is_empty());
    }
}
