//! Read-through range cache
//!
//! [`SheetDataCache`] answers a rectangular request from whatever its
//! [`Store`] already holds, fetches only the uncovered fragments, persists
//! them and stitches everything back into one matrix.

use sheet_cache_core::{
    sheet_qualified, CachedRange, CellRange, Error, Fetcher, RangeOptimizer, RangeSource, Result,
    SheetData, Store, INTEGRITY_PROBE_SIZE,
};

/// Result of [`SheetDataCache::get_sheet_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLoad {
    /// Cell values, row-major, sized to the request (empty when the
    /// remote source had nothing for an uncached request)
    pub data: SheetData,
    /// Which parts of the result came from cache and which were fetched
    pub sources: Vec<RangeSource>,
}

/// Outcome of [`SheetDataCache::validate_cache_integrity`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrityReport {
    /// Number of cached ranges probed
    pub checked: usize,
    /// Ranges whose probe could not be read back
    pub failures: Vec<CachedRange>,
}

impl IntegrityReport {
    /// Check whether every probe succeeded
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Range-based read-through cache over a [`Store`]
#[derive(Debug)]
pub struct SheetDataCache<S> {
    store: S,
}

impl<S: Store> SheetDataCache<S> {
    /// Create a cache on top of `store`
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the cache and return its store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Load `range_a1` of `sheet_name`, serving what the store covers and
    /// fetching the rest through `fetcher`.
    ///
    /// A range that doesn't parse is fetched as-is and not cached. Fetch
    /// and store read errors are returned; failing to persist a fetched
    /// fragment is only logged. Cached ranges the store cannot read back
    /// are fetched again. Requests over
    /// [`MAX_MATRIX_CELLS`](sheet_cache_core::MAX_MATRIX_CELLS) cells fail
    /// with [`Error::RangeTooLarge`].
    pub fn get_sheet_data<F>(
        &self,
        fetcher: &F,
        spreadsheet_id: &str,
        sheet_name: &str,
        range_a1: &str,
    ) -> Result<SheetLoad>
    where
        F: Fetcher + ?Sized,
    {
        let requested = match CellRange::from_a1_notation(range_a1) {
            Ok(range) => range,
            Err(e) => {
                log::warn!(
                    "cannot parse range '{}' ({}), fetching {} without caching",
                    range_a1,
                    e,
                    sheet_name
                );
                let data = fetcher
                    .fetch(spreadsheet_id, &sheet_qualified(sheet_name, range_a1))
                    .map_err(Error::Fetch)?;
                return Ok(SheetLoad {
                    data,
                    sources: vec![RangeSource::remote(range_a1)],
                });
            }
        };

        self.housekeeping(spreadsheet_id, sheet_name)?;
        let cached = self.cached_ranges(spreadsheet_id, sheet_name)?;

        if RangeOptimizer::can_satisfy_from_cache(&requested, &cached) {
            match self
                .store
                .get_sheet_data_from_cache(spreadsheet_id, sheet_name, &requested)?
            {
                Some(data) => {
                    log::debug!("{}!{} served from cache", sheet_name, requested);
                    return Ok(SheetLoad {
                        data,
                        sources: vec![RangeSource::cache(range_a1)],
                    });
                }
                None => log::warn!(
                    "{}!{} is covered but could not be read, assembling from pieces",
                    sheet_name,
                    requested
                ),
            }
        }

        // refuse oversized requests before anything is fetched
        let mut data = requested.empty_matrix()?;
        let overlapping = RangeOptimizer::find_overlapping_cached_ranges(&requested, &cached);

        // a cached range the store can't read back is fetched again
        let mut readable = Vec::with_capacity(overlapping.len());
        let mut cached_cells = Vec::with_capacity(overlapping.len());
        for cached_range in overlapping {
            let Some(overlap) = requested.intersection(&cached_range.range) else {
                continue;
            };
            match self
                .store
                .get_sheet_data_from_cache(spreadsheet_id, sheet_name, &overlap)?
            {
                Some(cells) => {
                    cached_cells.push((overlap, cells));
                    readable.push(cached_range);
                }
                None => log::warn!(
                    "could not read cached {}!{}, fetching it again",
                    sheet_name,
                    overlap
                ),
            }
        }

        let missing = RangeOptimizer::find_missing_ranges(&requested, &readable);
        log::debug!(
            "{}!{}: {} cached ranges overlap, {} fragments to fetch",
            sheet_name,
            requested,
            readable.len(),
            missing.len()
        );

        let mut fetched = Vec::with_capacity(missing.len());
        for fragment in missing {
            let notation = sheet_qualified(sheet_name, &fragment.to_a1_notation());
            log::debug!("fetching {} of {}", notation, spreadsheet_id);
            let data = fetcher
                .fetch(spreadsheet_id, &notation)
                .map_err(Error::Fetch)?;
            if has_cells(&data) {
                self.persist(spreadsheet_id, sheet_name, &fragment, &data);
            }
            fetched.push((fragment, data));
        }

        if readable.is_empty() && fetched.len() == 1 && !has_cells(&fetched[0].1) {
            return Ok(SheetLoad {
                data: Vec::new(),
                sources: vec![RangeSource::remote(range_a1)],
            });
        }

        // oldest first, so newer ranges overwrite shared cells
        for (overlap, cells) in cached_cells.iter().rev() {
            place(&mut data, &requested, overlap, cells);
        }

        for (fragment, cells) in &fetched {
            place(&mut data, &requested, fragment, cells);
        }

        Ok(SheetLoad {
            data,
            sources: provenance(range_a1, &requested, &readable, &fetched),
        })
    }

    /// Drop cached data for one sheet, or for the whole spreadsheet when
    /// `sheet_name` is `None`
    pub fn invalidate_cache(&self, spreadsheet_id: &str, sheet_name: Option<&str>) -> Result<bool> {
        let done = self
            .store
            .invalidate_sheet_data_cache(spreadsheet_id, sheet_name)?;
        log::info!(
            "invalidated cache for {} ({})",
            spreadsheet_id,
            sheet_name.unwrap_or("all sheets")
        );
        Ok(done)
    }

    /// Read back the top-left corner of every cached range on a sheet.
    ///
    /// Ranges with no stored cells, unreadable probes and store errors are
    /// all reported as failures. Nothing is repaired.
    pub fn validate_cache_integrity(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<IntegrityReport> {
        let cached = self.cached_ranges(spreadsheet_id, sheet_name)?;
        let incomplete = self
            .store
            .detect_incomplete_ranges(spreadsheet_id, sheet_name)?;

        let mut report = IntegrityReport {
            checked: cached.len(),
            failures: Vec::new(),
        };

        for cached_range in cached {
            let range = cached_range.range;
            let probe = CellRange::new(
                range.start_row(),
                range.start_col(),
                range
                    .end_row()
                    .min(range.start_row().saturating_add(INTEGRITY_PROBE_SIZE - 1)),
                range
                    .end_col()
                    .min(range.start_col().saturating_add(INTEGRITY_PROBE_SIZE - 1)),
            )?;

            let readable = cached_range
                .range_id
                .map_or(true, |id| !incomplete.contains(&id))
                && match self
                    .store
                    .get_sheet_data_from_cache(spreadsheet_id, sheet_name, &probe)
                {
                    Ok(data) => data.is_some(),
                    Err(e) => {
                        log::warn!("probe of {}!{} failed: {}", sheet_name, probe, e);
                        false
                    }
                };

            if !readable {
                log::warn!("cached range {}!{} failed validation", sheet_name, range);
                report.failures.push(cached_range);
            }
        }

        Ok(report)
    }

    fn housekeeping(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        let incomplete = self
            .store
            .detect_incomplete_ranges(spreadsheet_id, sheet_name)?;
        for range_id in &incomplete {
            self.store.delete_range_data(*range_id)?;
        }
        if !incomplete.is_empty() {
            log::info!(
                "removed {} incomplete cached ranges from {}",
                incomplete.len(),
                sheet_name
            );
        }

        let orphaned = self
            .store
            .clean_orphaned_ranges(spreadsheet_id, sheet_name)?;
        if orphaned > 0 {
            log::info!("removed {} orphaned cached ranges from {}", orphaned, sheet_name);
        }
        Ok(())
    }

    fn cached_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Vec<CachedRange>> {
        let records = self.store.get_cached_ranges(spreadsheet_id, sheet_name)?;
        Ok(records
            .iter()
            .filter_map(|record| {
                match CachedRange::from_record(spreadsheet_id, sheet_name, record) {
                    Ok(cached) => Some(cached),
                    Err(e) => {
                        log::warn!("skipping cached range {}: {}", record.range_id, e);
                        None
                    }
                }
            })
            .collect())
    }

    fn persist(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) {
        match self
            .store
            .store_sheet_data_range(spreadsheet_id, sheet_name, range, data)
        {
            Ok(range_id) => log::debug!("cached {}!{} as range {}", sheet_name, range, range_id),
            Err(e) => log::warn!("failed to cache {}!{}: {}", sheet_name, range, e),
        }
    }
}

fn has_cells(data: &SheetData) -> bool {
    data.iter().any(|row| !row.is_empty())
}

/// Copy `cells`, whose top-left is `region`'s, into `data` laid out as
/// `requested`. Values beyond `region` or outside `requested` are dropped.
fn place(data: &mut SheetData, requested: &CellRange, region: &CellRange, cells: &SheetData) {
    for (r, row) in cells.iter().take(region.row_count() as usize).enumerate() {
        for (c, value) in row.iter().take(region.col_count() as usize).enumerate() {
            let abs_row = region.start_row() + r as u32;
            let abs_col = region.start_col() + c as u32;
            if let Some((row_idx, col_idx)) = requested.offset_of(abs_row, abs_col) {
                data[row_idx][col_idx] = value.clone();
            }
        }
    }
}

fn provenance(
    range_a1: &str,
    requested: &CellRange,
    overlapping: &[CachedRange],
    fetched: &[(CellRange, SheetData)],
) -> Vec<RangeSource> {
    match fetched {
        [] => vec![RangeSource::cache(range_a1)],
        [(fragment, _)] if overlapping.is_empty() && fragment == requested => {
            vec![RangeSource::remote(range_a1)]
        }
        _ => overlapping
            .iter()
            .filter_map(|cached| requested.intersection(&cached.range))
            .map(|overlap| RangeSource::cache(overlap.to_a1_notation()))
            .chain(
                fetched
                    .iter()
                    .map(|(fragment, _)| RangeSource::remote(fragment.to_a1_notation())),
            )
            .collect(),
    }
}
