use crate::error::{RepgenError, Result};
use crate::model::{DenseSeries, HistogramEntry, SparseHistogram};

/// Expands a sparse histogram into one entry per day from its first to its
/// last day, inclusive, with zero counts for the days in between that had
/// no commits.
pub fn fill_gaps(histogram: &SparseHistogram) -> Result<DenseSeries> {
    let (first, last) = match (histogram.first_day(), histogram.last_day()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RepgenError::EmptyHistogram),
    };

    let span = (last - first).num_days() as usize + 1;
    let mut entries = Vec::with_capacity(span);
    let mut known = histogram.iter().peekable();
    let mut day = first;

    loop {
        let count = match known.peek() {
            Some(&(d, count)) if d == day => {
                known.next();
                count
            }
            _ => 0,
        };
        entries.push(HistogramEntry { date: day, count });

        if day == last {
            break;
        }
        day = day
            .succ_opt()
            .ok_or_else(|| RepgenError::InvalidDate(format!("no day after {day}")))?;
    }

    Ok(DenseSeries::from_contiguous(entries))
}
