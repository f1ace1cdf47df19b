use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::email::{EmailRecord, SortField};

/// User-selected constraints for the email table. Empty / false means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub category: String,
    pub department: String,
    pub spam_only: bool,
    pub duplicate_only: bool,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    pub fn active_count(&self) -> usize {
        [
            !self.category.is_empty(),
            !self.department.is_empty(),
            self.spam_only,
            self.duplicate_only,
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, e: &EmailRecord) -> bool {
        if !self.category.is_empty() && e.category.as_deref() != Some(self.category.as_str()) {
            return false;
        }
        if !self.department.is_empty() && e.routed_to != self.department {
            return false;
        }
        if self.spam_only && !e.spam() {
            return false;
        }
        if self.duplicate_only && !e.duplicate() {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    /// Clicking the active column flips it; a new column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }

    fn compare(&self, a: &EmailRecord, b: &EmailRecord) -> Ordering {
        // A missing value on either side leaves the pair where it is.
        let (Some(va), Some(vb)) = (a.sort_value(self.field), b.sort_value(self.field)) else {
            return Ordering::Equal;
        };
        match self.direction {
            SortDirection::Ascending => locale_cmp(va, vb),
            SortDirection::Descending => locale_cmp(vb, va),
        }
    }
}

/// Collation in three levels: base letters ignoring accents and case, then
/// accents (plain before accented), then case (lowercase first).
/// Dates go through here too: ISO 8601 strings of the same shape order correctly.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
        .then_with(|| b.nfc().cmp(a.nfc()))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfc().flat_map(char::to_lowercase)
}

pub fn filter_emails<'a>(emails: &'a [EmailRecord], filters: &FilterState) -> Vec<&'a EmailRecord> {
    emails.iter().filter(|e| filters.matches(e)).collect()
}

pub fn sort_emails<'a>(rows: Vec<&'a EmailRecord>, sort: &SortState) -> Vec<&'a EmailRecord> {
    merge_sort_by(rows, |a, b| sort.compare(a, b))
}

/// Filter then sort. The input slice is left untouched.
pub fn apply<'a>(
    emails: &'a [EmailRecord],
    filters: &FilterState,
    sort: &SortState,
) -> Vec<&'a EmailRecord> {
    sort_emails(filter_emails(emails, filters), sort)
}

pub fn distinct_categories(emails: &[EmailRecord]) -> Vec<String> {
    distinct(emails.iter().filter_map(|e| e.category.as_deref()))
}

pub fn distinct_departments(emails: &[EmailRecord]) -> Vec<String> {
    distinct(emails.iter().map(|e| e.routed_to.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

// std's sort may panic when the comparator is not a total order, which ours
// is not once values go missing. Plain top-down merge sort: stable, and it
// only ever takes from the right run on a strict Less.
fn merge_sort_by<T: Copy, F>(items: Vec<T>, mut cmp: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    fn sort<T: Copy, F: FnMut(&T, &T) -> Ordering>(items: &[T], cmp: &mut F) -> Vec<T> {
        if items.len() <= 1 {
            return items.to_vec();
        }
        let (left, right) = items.split_at(items.len() / 2);
        let left = sort(left, cmp);
        let right = sort(right, cmp);

        let mut out = Vec::with_capacity(items.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            if cmp(&right[j], &left[i]) == Ordering::Less {
                out.push(right[j]);
                j += 1;
            } else {
                out.push(left[i]);
                i += 1;
            }
        }
        out.extend_from_slice(&left[i..]);
        out.extend_from_slice(&right[j..]);
        out
    }
    sort(&items, &mut cmp)
}
