use chrono::NaiveDate;

/// Contiguous daily dates from `start` through `end`, both inclusive. Every combined
/// table shares this row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    start: NaiveDate,
    end: NaiveDate,
}

impl Calendar {
    /// Empty when `today` falls before `start`.
    pub fn new(start: NaiveDate, today: NaiveDate) -> Self {
        Self { start, end: today }
    }

    pub fn len(&self) -> usize {
        let span = self.end.signed_duration_since(self.start).num_days();
        if span < 0 {
            0
        } else {
            span as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row index of `date`, `None` outside the range.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some(date.signed_duration_since(self.start).num_days() as usize)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len())
    }
}
