use crate::data::datatable::DataValue;
use std::cmp::Ordering;

/// Rank used when two non-null cells have different types.
/// Order: Null < Boolean < numbers < String < List
fn type_rank(value: &DataValue) -> u8 {
    match value {
        DataValue::Null => 0,
        DataValue::Boolean(_) => 1,
        DataValue::Integer(_) | DataValue::Float(_) => 2,
        DataValue::String(_) => 3,
        DataValue::List(_) => 4,
    }
}

/// Exact comparison of an integer against a float.
///
/// `i as f64` rounds above 2^53, so an `Equal` from the float comparison is
/// rechecked in i128, where any float it can equal converts without loss.
/// Non-equal results are already exact: rounding never crosses the float.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    match (i as f64).total_cmp(&f) {
        Ordering::Equal => i128::from(i).cmp(&(f as i128)),
        unequal => unequal,
    }
}

/// Total order over cell values with nulls lowest.
///
/// Same-typed values use their native ordering. Integers and floats compare
/// by magnitude. Any other type mix falls back to a fixed type rank, so the
/// result is always a consistent total order and never depends on coercion.
pub fn compare_datavalues(a: &DataValue, b: &DataValue) -> Ordering {
    match (a, b) {
        (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
        (DataValue::Float(a), DataValue::Float(b)) => a.total_cmp(b),
        (DataValue::Integer(i), DataValue::Float(f)) => compare_int_float(*i, *f),
        (DataValue::Float(f), DataValue::Integer(i)) => compare_int_float(*i, *f).reverse(),
        (DataValue::String(a), DataValue::String(b)) => a.cmp(b),
        (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),
        (DataValue::List(a), DataValue::List(b)) => a.cmp(b),
        (DataValue::Null, DataValue::Null) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Compare DataValues with optional values; a missing cell sorts as null
pub fn compare_optional_datavalues(a: Option<&DataValue>, b: Option<&DataValue>) -> Ordering {
    let a = a.unwrap_or(&DataValue::Null);
    let b = b.unwrap_or(&DataValue::Null);
    compare_datavalues(a, b)
}

/// Directional comparison used by column sorting.
///
/// Nulls come first when ascending and last when descending.
pub fn compare(a: Option<&DataValue>, b: Option<&DataValue>, ascending: bool) -> Ordering {
    let cmp = compare_optional_datavalues(a, b);
    if ascending {
        cmp
    } else {
        cmp.reverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> DataValue {
        DataValue::String(value.to_string())
    }

    #[test]
    fn test_integer_comparison() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(1), &DataValue::Integer(2)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(2), &DataValue::Integer(2)),
            Ordering::Equal
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(3), &DataValue::Integer(2)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_string_comparison() {
        assert_eq!(compare_datavalues(&s("apple"), &s("banana")), Ordering::Less);
        // Byte order, so uppercase sorts before lowercase
        assert_eq!(compare_datavalues(&s("Zed"), &s("apple")), Ordering::Less);
    }

    #[test]
    fn test_null_comparison() {
        assert_eq!(
            compare_datavalues(&DataValue::Null, &DataValue::Integer(1)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(1), &DataValue::Null),
            Ordering::Greater
        );
        assert_eq!(
            compare_datavalues(&DataValue::Null, &DataValue::Null),
            Ordering::Equal
        );
    }

    #[test]
    fn test_nulls_first_ascending_last_descending() {
        let null = DataValue::Null;
        let text = s("a");

        assert_eq!(compare(Some(&null), Some(&text), true), Ordering::Less);
        assert_eq!(compare(Some(&null), Some(&text), false), Ordering::Greater);
        assert_eq!(compare(None, Some(&text), true), Ordering::Less);
        assert_eq!(compare(Some(&text), None, false), Ordering::Less);
        assert_eq!(compare(None, Some(&null), true), Ordering::Equal);
    }

    #[test]
    fn test_mixed_numeric_compares_by_magnitude() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(2), &DataValue::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_datavalues(&DataValue::Float(1.0), &DataValue::Integer(1)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cross_type_comparison_uses_type_rank() {
        assert_eq!(
            compare_datavalues(&DataValue::Boolean(true), &DataValue::Integer(0)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(100), &s("1")),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&s("zzz"), &DataValue::List(vec!["a".into()])),
            Ordering::Less
        );
    }

    #[test]
    fn test_large_integers_against_floats_stay_transitive() {
        let two_53 = 1_i64 << 53;
        let values = [
            DataValue::Integer(two_53),
            DataValue::Float(two_53 as f64),
            DataValue::Integer(two_53 + 1),
            DataValue::Float(9.223372036854775807e18),
            DataValue::Integer(i64::MAX),
            DataValue::Float(-0.0),
            DataValue::Integer(0),
        ];

        assert_eq!(
            compare_datavalues(&values[1], &values[2]),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&values[4], &values[3]),
            Ordering::Less
        );

        for a in &values {
            for b in &values {
                assert_eq!(compare_datavalues(a, b), compare_datavalues(b, a).reverse());
                for c in &values {
                    let ab = compare_datavalues(a, b);
                    let bc = compare_datavalues(b, c);
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(compare_datavalues(a, c), Ordering::Greater);
                    }
                    if ab == Ordering::Equal && bc == Ordering::Equal {
                        assert_eq!(compare_datavalues(a, c), Ordering::Equal);
                    }
                }
            }
        }
    }

    #[test]
    fn test_cross_type_ordering_is_transitive() {
        // A string-coercion policy would cycle on these three values
        let values = [s("1a"), DataValue::Integer(2), DataValue::Integer(10)];
        for a in &values {
            for b in &values {
                for c in &values {
                    if compare_datavalues(a, b) == Ordering::Less
                        && compare_datavalues(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_datavalues(a, c), Ordering::Less);
                    }
                }
            }
        }
    }
}
