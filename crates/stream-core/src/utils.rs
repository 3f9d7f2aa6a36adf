//! Utility functions for working with small slices of observations

/// Sort a slice in place with insertion sort
///
/// Marker sets stay small (single digits to low tens), so the quadratic
/// worst case is irrelevant and the sort is stable and allocation free.
/// Comparison uses `>` directly; NaN values do not move past their
/// neighbours.
///
/// # Examples
///
/// ```rust
/// use stream_core::utils::insertion_sort;
///
/// let mut data = [3.0, 1.0, 5.0, 2.0, 4.0];
/// insertion_sort(&mut data);
/// assert_eq!(data, [1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn insertion_sort(data: &mut [f64]) {
    for j in 1..data.len() {
        let key = data[j];
        let mut i = j;
        while i > 0 && data[i - 1] > key {
            data[i] = data[i - 1];
            i -= 1;
        }
        data[i] = key;
    }
}
