use crate::fixture::RecordingEntry;
use crate::fixture::key::WindowKey;
use crate::store::StoreError;
use serde_json::{Value, json};

/// A window with both sizes made concrete against the result totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedWindow {
    pub(crate) offset: [usize; 2],
    pub(crate) size: [usize; 2],
}

impl ResolvedWindow {
    fn end(&self, dim: usize) -> usize {
        self.offset[dim].saturating_add(self.size[dim])
    }

    fn contains(&self, other: &ResolvedWindow) -> bool {
        (0..2).all(|dim| self.offset[dim] <= other.offset[dim] && self.end(dim) >= other.end(dim))
    }

    fn area(&self) -> usize {
        self.size[0].saturating_mul(self.size[1])
    }
}

/// Concrete bounds of a cached window key. Cached sizes are clamped to
/// the result totals: the capture tool records requested page sizes, not
/// effective ones, so `o0_0s10_1000` on a 10x3 result covers 10x3.
pub(crate) fn cached_bounds(key: &WindowKey, totals: [usize; 2]) -> ResolvedWindow {
    let window = match key {
        WindowKey::All => {
            return ResolvedWindow {
                offset: [0, 0],
                size: totals,
            };
        }
        WindowKey::Window(window) => window,
    };

    let mut size = [0usize; 2];
    for dim in 0..2 {
        let remaining = totals[dim].saturating_sub(window.offset[dim]);
        size[dim] = match window.size[dim] {
            Some(requested) => requested.min(remaining),
            None => remaining,
        };
    }

    ResolvedWindow {
        offset: window.offset,
        size,
    }
}

/// Concrete bounds of a *requested* window. Unlike cached keys, requests
/// exceeding the result totals are a test-authoring bug and fail with
/// `WindowOutOfRange` instead of being clamped.
fn request_bounds(entry: &RecordingEntry, request: &WindowKey) -> Result<ResolvedWindow, StoreError> {
    let window = match request {
        WindowKey::All => {
            return Ok(ResolvedWindow {
                offset: [0, 0],
                size: entry.totals,
            });
        }
        WindowKey::Window(window) => window,
    };

    let out_of_range = || StoreError::WindowOutOfRange {
        fingerprint: entry.fingerprint.clone(),
        window: request.to_string(),
        totals: entry.totals,
    };

    let mut size = [0usize; 2];
    for dim in 0..2 {
        let total = entry.totals[dim];
        let offset = window.offset[dim];
        if offset >= total {
            return Err(out_of_range());
        }
        size[dim] = match window.size[dim] {
            Some(requested) => {
                // `offset < total` already holds, so `total - offset` cannot
                // underflow and the comparison cannot overflow for any size.
                if requested > total - offset {
                    return Err(out_of_range());
                }
                requested
            }
            None => total - offset,
        };
    }

    Ok(ResolvedWindow {
        offset: window.offset,
        size,
    })
}

/// Resolve a requested window against one recording's captured views.
///
/// Priority: exact key match (O(1), payload returned untouched), then a
/// slice from the smallest cached window that fully contains the request.
/// `all` has the largest concrete bounds by construction, so the
/// smallest-first ordering makes it the fallback of last resort. Windows
/// that were never captured and cannot be derived fail; data is never
/// synthesized.
pub(crate) fn resolve_data_view(
    entry: &RecordingEntry,
    request: &WindowKey,
) -> Result<Value, StoreError> {
    if let Some(payload) = entry.data_views.get(request) {
        return Ok(payload.clone());
    }

    let requested = request_bounds(entry, request)?;

    let mut candidates: Vec<(ResolvedWindow, WindowKey)> = entry
        .data_views
        .keys()
        .filter_map(|key| {
            let cached = cached_bounds(key, entry.totals);
            cached.contains(&requested).then_some((cached, *key))
        })
        .collect();
    // Smallest containing window wins; key order breaks exact-bounds ties
    // so resolution is independent of hash iteration order.
    candidates.sort_by_key(|(bounds, key)| (bounds.area(), bounds.offset, bounds.size, *key));

    match candidates.first() {
        Some((cached, key)) => Ok(slice_payload(&entry.data_views[key], cached, &requested)),
        None => Err(StoreError::WindowUnavailable {
            fingerprint: entry.fingerprint.clone(),
            window: request.to_string(),
        }),
    }
}

/// Compute the requested sub-region of a larger cached payload.
///
/// Only the slicing contract fields are touched: `data` rows/cells are
/// cut to the requested region, `headerItems` groups are cut per
/// dimension, and `offset`/`count` are rewritten when present. Everything
/// else is carried through unchanged.
pub(crate) fn slice_payload(
    payload: &Value,
    cached: &ResolvedWindow,
    requested: &ResolvedWindow,
) -> Value {
    let mut sliced = payload.clone();
    let Some(object) = sliced.as_object_mut() else {
        return sliced;
    };

    let row_skip = requested.offset[0] - cached.offset[0];
    let col_skip = requested.offset[1] - cached.offset[1];

    let sliced_data = match object.get("data") {
        Some(Value::Array(rows)) => Some(Value::Array(
            rows.iter()
                .skip(row_skip)
                .take(requested.size[0])
                .map(|row| match row {
                    Value::Array(cells) => Value::Array(
                        cells
                            .iter()
                            .skip(col_skip)
                            .take(requested.size[1])
                            .cloned()
                            .collect(),
                    ),
                    scalar => scalar.clone(),
                })
                .collect(),
        )),
        _ => None,
    };
    if let Some(data) = sliced_data {
        object.insert("data".to_owned(), data);
    }

    let sliced_headers = match object.get("headerItems") {
        Some(Value::Array(dims)) => Some(Value::Array(
            dims.iter()
                .enumerate()
                .map(|(dim, groups)| {
                    let (skip, take) = match dim {
                        0 => (row_skip, requested.size[0]),
                        1 => (col_skip, requested.size[1]),
                        _ => return groups.clone(),
                    };
                    match groups {
                        Value::Array(groups) => Value::Array(
                            groups
                                .iter()
                                .map(|group| match group {
                                    Value::Array(items) => Value::Array(
                                        items.iter().skip(skip).take(take).cloned().collect(),
                                    ),
                                    other => other.clone(),
                                })
                                .collect(),
                        ),
                        other => other.clone(),
                    }
                })
                .collect(),
        )),
        _ => None,
    };
    if let Some(header_items) = sliced_headers {
        object.insert("headerItems".to_owned(), header_items);
    }

    if object.contains_key("offset") {
        object.insert(
            "offset".to_owned(),
            json!([requested.offset[0], requested.offset[1]]),
        );
    }
    if object.contains_key("count") {
        object.insert(
            "count".to_owned(),
            json!([requested.size[0], requested.size[1]]),
        );
    }

    sliced
}

#[cfg(test)]
mod tests {
    use super::resolve_data_view;
    use crate::fixture::key::{DataWindow, WindowKey};
    use crate::fixture::RecordingEntry;
    use crate::store::StoreError;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn grid(row_start: usize, rows: usize, columns: usize) -> Vec<Vec<String>> {
        (row_start..row_start + rows)
            .map(|row| (0..columns).map(|col| format!("r{row}c{col}")).collect())
            .collect()
    }

    fn entry_with_views(totals: [usize; 2], views: Vec<(WindowKey, Value)>) -> RecordingEntry {
        RecordingEntry {
            fingerprint: "fp_test".to_owned(),
            definition: json!({}),
            execution_result: json!({ "paging": { "total": totals } }),
            totals,
            data_views: views.into_iter().collect::<HashMap<_, _>>(),
            scenarios: Vec::new(),
        }
    }

    fn hundred_row_entry() -> RecordingEntry {
        // Mirrors the canonical capture shape: a full result plus the
        // first ten-row page requested with an oversized column size.
        entry_with_views(
            [100, 2],
            vec![
                (
                    WindowKey::All,
                    json!({ "data": grid(0, 100, 2), "offset": [0, 0], "count": [100, 2] }),
                ),
                (
                    WindowKey::Window(DataWindow::bounded([0, 0], [10, 1000])),
                    json!({
                        "data": grid(0, 10, 2),
                        "offset": [0, 0],
                        "count": [10, 2],
                        "marker": "stored-first-page"
                    }),
                ),
            ],
        )
    }

    #[test]
    fn exact_match_returns_stored_payload_untouched() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::bounded([0, 0], [10, 1000]));

        let payload = resolve_data_view(&entry, &request).expect("resolve exact window");
        // The stored artifact, not a fresh slice of `all`: the marker
        // field only exists in the captured first-page payload.
        assert_eq!(payload["marker"], "stored-first-page");
        assert_eq!(payload["data"], json!(grid(0, 10, 2)));
    }

    #[test]
    fn contained_window_is_sliced_from_smallest_candidate() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::bounded([5, 0], [5, 2]));

        let payload = resolve_data_view(&entry, &request).expect("resolve contained window");
        // Rows 5..10 fit inside the ten-row page, so the slice comes from
        // the page payload rather than from `all`.
        assert_eq!(payload["marker"], "stored-first-page");
        assert_eq!(payload["data"], json!(grid(5, 5, 2)));
        assert_eq!(payload["offset"], json!([5, 0]));
        assert_eq!(payload["count"], json!([5, 2]));
    }

    #[test]
    fn all_serves_windows_beyond_any_partial_capture() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::bounded([95, 0], [5, 2]));

        let payload = resolve_data_view(&entry, &request).expect("resolve tail window");
        assert_eq!(payload["data"], json!(grid(95, 5, 2)));
        assert!(payload.get("marker").is_none());
    }

    #[test]
    fn request_exceeding_totals_is_out_of_range() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::bounded([95, 0], [10, 2]));

        let error = resolve_data_view(&entry, &request).expect_err("out-of-range request");
        assert_eq!(
            error,
            StoreError::WindowOutOfRange {
                fingerprint: "fp_test".to_owned(),
                window: "o95_0s10_2".to_owned(),
                totals: [100, 2],
            }
        );
    }

    #[test]
    fn huge_request_size_is_out_of_range_not_a_panic() {
        let entry = hundred_row_entry();
        for size in [usize::MAX, usize::MAX - 4, 101] {
            let request = WindowKey::Window(DataWindow::bounded([5, 0], [size, 1]));
            let error = resolve_data_view(&entry, &request).expect_err("oversized request");
            assert!(matches!(error, StoreError::WindowOutOfRange { .. }));
        }
    }

    #[test]
    fn offset_at_or_past_total_is_out_of_range() {
        let entry = hundred_row_entry();
        for offset in [100, 10_000] {
            let request = WindowKey::Window(DataWindow::bounded([offset, 0], [1, 1]));
            let error = resolve_data_view(&entry, &request).expect_err("offset past total");
            assert!(matches!(error, StoreError::WindowOutOfRange { .. }));
        }
    }

    #[test]
    fn uncovered_window_is_unavailable_when_all_is_absent() {
        let entry = entry_with_views(
            [100, 2],
            vec![(
                WindowKey::Window(DataWindow::bounded([0, 0], [10, 1000])),
                json!({ "data": grid(0, 10, 2) }),
            )],
        );
        let request = WindowKey::Window(DataWindow::bounded([50, 0], [5, 2]));

        let error = resolve_data_view(&entry, &request).expect_err("uncovered window");
        assert_eq!(
            error,
            StoreError::WindowUnavailable {
                fingerprint: "fp_test".to_owned(),
                window: "o50_0s5_2".to_owned(),
            }
        );
    }

    #[test]
    fn all_request_without_all_capture_slices_a_covering_window() {
        let entry = entry_with_views(
            [10, 2],
            vec![(
                WindowKey::Window(DataWindow::new([0, 0], [None, None])),
                json!({ "data": grid(0, 10, 2), "marker": "unbounded-capture" }),
            )],
        );

        let payload = resolve_data_view(&entry, &WindowKey::All).expect("resolve all request");
        assert_eq!(payload["data"], json!(grid(0, 10, 2)));
        assert_eq!(payload["marker"], "unbounded-capture");
    }

    #[test]
    fn all_request_fails_when_nothing_covers_the_full_result() {
        let entry = entry_with_views(
            [10, 2],
            vec![(
                WindowKey::Window(DataWindow::bounded([0, 0], [5, 2])),
                json!({ "data": grid(0, 5, 2) }),
            )],
        );

        let error = resolve_data_view(&entry, &WindowKey::All).expect_err("partial coverage only");
        assert!(matches!(error, StoreError::WindowUnavailable { .. }));
    }

    #[test]
    fn unbounded_request_size_resolves_to_end_of_dimension() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::new([90, 0], [None, Some(2)]));

        let payload = resolve_data_view(&entry, &request).expect("resolve unbounded tail");
        assert_eq!(payload["data"], json!(grid(90, 10, 2)));
        assert_eq!(payload["count"], json!([10, 2]));
    }

    #[test]
    fn column_windows_slice_cells_and_column_headers() {
        let entry = entry_with_views(
            [2, 4],
            vec![(
                WindowKey::All,
                json!({
                    "data": [["a0", "b0", "c0", "d0"], ["a1", "b1", "c1", "d1"]],
                    "headerItems": [
                        [["row0", "row1"]],
                        [["colA", "colB", "colC", "colD"]]
                    ],
                    "offset": [0, 0],
                    "count": [2, 4]
                }),
            )],
        );
        let request = WindowKey::Window(DataWindow::bounded([0, 1], [2, 2]));

        let payload = resolve_data_view(&entry, &request).expect("resolve column window");
        assert_eq!(payload["data"], json!([["b0", "c0"], ["b1", "c1"]]));
        assert_eq!(
            payload["headerItems"],
            json!([[["row0", "row1"]], [["colB", "colC"]]])
        );
        assert_eq!(payload["offset"], json!([0, 1]));
        assert_eq!(payload["count"], json!([2, 2]));
    }

    #[test]
    fn resolution_is_deterministic_across_calls() {
        let entry = hundred_row_entry();
        let request = WindowKey::Window(DataWindow::bounded([2, 0], [4, 2]));

        let first = resolve_data_view(&entry, &request).expect("first resolution");
        let second = resolve_data_view(&entry, &request).expect("second resolution");
        assert_eq!(first, second);
    }

    #[test]
    fn scalar_rows_pass_through_column_slicing() {
        let entry = entry_with_views(
            [4, 1],
            vec![(
                WindowKey::All,
                json!({ "data": [10, 11, 12, 13] }),
            )],
        );
        let request = WindowKey::Window(DataWindow::bounded([1, 0], [2, 1]));

        let payload = resolve_data_view(&entry, &request).expect("resolve scalar rows");
        assert_eq!(payload["data"], json!([11, 12]));
    }
}
