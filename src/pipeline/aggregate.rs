use std::collections::HashMap;

use crate::domain::email::EmailRecord;

/// Summary numbers and chart series for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub total_count: usize,
    pub spam_count: usize,
    pub duplicate_count: usize,
    /// (label, count) in first-seen order
    pub category_counts: Vec<(String, usize)>,
    pub department_counts: Vec<(String, usize)>,
}

impl AggregateStats {
    pub fn spam_percent(&self) -> Option<u32> {
        percent_of(self.spam_count, self.total_count)
    }

    pub fn duplicate_percent(&self) -> Option<u32> {
        percent_of(self.duplicate_count, self.total_count)
    }
}

/// Rounded share of `part` in `total`; `None` when there is nothing to divide by.
pub fn percent_of(part: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    Some(((part as f64 / total as f64) * 100.0).round() as u32)
}

pub fn aggregate(emails: &[EmailRecord]) -> AggregateStats {
    let mut categories = FirstSeenCounter::default();
    let mut departments = FirstSeenCounter::default();
    let mut spam_count = 0;
    let mut duplicate_count = 0;

    for e in emails {
        if let Some(c) = e.category.as_deref() {
            categories.bump(c);
        }
        departments.bump(&e.routed_to);
        if e.spam() {
            spam_count += 1;
        }
        if e.duplicate() {
            duplicate_count += 1;
        }
    }

    AggregateStats {
        total_count: emails.len(),
        spam_count,
        duplicate_count,
        category_counts: categories.finish(),
        department_counts: departments.finish(),
    }
}

#[derive(Default)]
struct FirstSeenCounter<'a> {
    index: HashMap<&'a str, usize>,
    counts: Vec<(String, usize)>,
}

impl<'a> FirstSeenCounter<'a> {
    fn bump(&mut self, label: &'a str) {
        if label.is_empty() {
            return;
        }
        match self.index.get(label) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(label, self.counts.len());
                self.counts.push((label.to_string(), 1));
            }
        }
    }

    fn finish(self) -> Vec<(String, usize)> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::email::fixtures::{email, with_category};
    use proptest::prelude::*;

    #[test]
    fn empty_input_is_all_zero() {
        let s = aggregate(&[]);
        assert_eq!(s, AggregateStats::default());
        assert_eq!(s.spam_percent(), None);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let emails = vec![
            with_category("1", "A"),
            with_category("2", "B"),
            with_category("3", "A"),
        ];
        let s = aggregate(&emails);
        assert_eq!(
            s.category_counts,
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
    }

    #[test]
    fn departments_and_flags() {
        let mut a = email("1");
        a.routed_to = "Loans".into();
        a.is_spam = Some(true);
        let mut b = email("2");
        b.routed_to = "Security".into();
        b.is_duplicate = Some(true);
        let mut c = email("3");
        c.routed_to = "Loans".into();
        c.is_spam = Some(false);
        let mut d = email("4");
        d.routed_to = String::new();

        let s = aggregate(&[a, b, c, d]);
        assert_eq!(s.total_count, 4);
        assert_eq!(s.spam_count, 1);
        assert_eq!(s.duplicate_count, 1);
        assert_eq!(
            s.department_counts,
            vec![("Loans".to_string(), 2), ("Security".to_string(), 1)]
        );
        assert_eq!(s.spam_percent(), Some(25));
    }

    #[test]
    fn missing_and_empty_categories_are_skipped() {
        let mut blank = email("2");
        blank.category = Some(String::new());
        let s = aggregate(&[email("1"), blank, with_category("3", "Loans")]);
        assert_eq!(s.category_counts, vec![("Loans".to_string(), 1)]);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1, 8), Some(13));
        assert_eq!(percent_of(1, 3), Some(33));
        assert_eq!(percent_of(0, 5), Some(0));
    }

    fn arb_email() -> impl Strategy<Value = EmailRecord> {
        (
            "[0-9]{1,4}",
            prop::option::of(prop::sample::select(vec!["", "A", "B", "C"])),
            prop::sample::select(vec!["", "Loans", "Security"]),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
        )
            .prop_map(|(id, cat, dept, spam, dup)| EmailRecord {
                category: cat.map(str::to_string),
                routed_to: dept.to_string(),
                is_spam: spam,
                is_duplicate: dup,
                ..email(&id)
            })
    }

    proptest! {
        #[test]
        fn counts_are_bounded_by_total(emails in prop::collection::vec(arb_email(), 0..40)) {
            let s = aggregate(&emails);
            prop_assert_eq!(s.total_count, emails.len());
            prop_assert!(s.spam_count <= s.total_count);
            prop_assert!(s.duplicate_count <= s.total_count);
        }

        #[test]
        fn category_sum_matches_categorised_records(emails in prop::collection::vec(arb_email(), 0..40)) {
            let s = aggregate(&emails);
            let sum: usize = s.category_counts.iter().map(|(_, n)| n).sum();
            let with_cat = emails
                .iter()
                .filter(|e| e.category.as_deref().is_some_and(|c| !c.is_empty()))
                .count();
            prop_assert_eq!(sum, with_cat);
        }
    }
}
