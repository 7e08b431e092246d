// lib/src/pagination.rs
//! Splits a medication list across printed pages.
//!
//! Page 1 also carries the clinical notes block, so it holds fewer rows than
//! the pages after it. Row numbers run continuously across page breaks.

use std::ops::Range;

use models::Medication;

use crate::errors::RenderError;

/// Rows on page 1, which also carries the clinical notes block.
pub const FIRST_PAGE_CAPACITY: usize = 7;
/// Rows on every page after the first.
pub const OTHER_PAGE_CAPACITY: usize = 10;

/// Number of pages needed for `count` medications. Never less than one.
pub fn total_pages(count: usize) -> usize {
    if count <= FIRST_PAGE_CAPACITY {
        return 1;
    }
    1 + (count - FIRST_PAGE_CAPACITY).div_ceil(OTHER_PAGE_CAPACITY)
}

/// 1-based row number of the first medication on `page`.
pub fn first_number(page: usize) -> usize {
    if page <= 1 {
        1
    } else {
        FIRST_PAGE_CAPACITY + (page - 2) * OTHER_PAGE_CAPACITY + 1
    }
}

/// Index range into the full list that lands on `page` (1-based).
pub fn page_bounds(count: usize, page: usize) -> Result<Range<usize>, RenderError> {
    let total = total_pages(count);
    if page == 0 || page > total {
        return Err(RenderError::PageOutOfRange { page, total });
    }
    let (start, capacity) = if page == 1 {
        (0, FIRST_PAGE_CAPACITY)
    } else {
        (first_number(page) - 1, OTHER_PAGE_CAPACITY)
    };
    let start = start.min(count);
    Ok(start..(start + capacity).min(count))
}

/// The medications printed on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a> {
    pub page: usize,
    pub total_pages: usize,
    /// Row number of `medications[0]`.
    pub first_number: usize,
    pub medications: &'a [Medication],
}

impl<'a> PageSlice<'a> {
    /// Whether this page carries the clinical notes block.
    pub fn has_clinical_block(&self) -> bool {
        self.page == 1
    }

    /// `(row number, medication)` pairs in print order.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a Medication)> + 'a {
        let first = self.first_number;
        self.medications
            .iter()
            .enumerate()
            .map(move |(offset, med)| (first + offset, med))
    }
}

pub fn page_slice(medications: &[Medication], page: usize) -> Result<PageSlice<'_>, RenderError> {
    let bounds = page_bounds(medications.len(), page)?;
    Ok(PageSlice {
        page,
        total_pages: total_pages(medications.len()),
        first_number: first_number(page),
        medications: &medications[bounds],
    })
}

/// Every page of the document, in order.
pub fn paginate(medications: &[Medication]) -> Vec<PageSlice<'_>> {
    let total = total_pages(medications.len());
    (1..=total)
        .filter_map(|page| page_slice(medications, page).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meds(count: usize) -> Vec<Medication> {
        (1..=count).map(|i| Medication::named(format!("Med {}", i))).collect()
    }

    #[test]
    fn should_match_page_count_examples() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(7), 1);
        assert_eq!(total_pages(8), 2);
        assert_eq!(total_pages(17), 2);
        assert_eq!(total_pages(18), 3);
        assert_eq!(total_pages(27), 3);
        assert_eq!(total_pages(28), 4);
    }

    #[test]
    fn should_follow_page_count_formula() {
        for n in 0..200usize {
            let expected = if n <= 7 { 1 } else { 1 + (n - 7 + 9) / 10 };
            assert_eq!(total_pages(n), expected, "n = {}", n);
        }
    }

    #[test]
    fn should_reassemble_original_list_from_pages() {
        for n in 0..60 {
            let list = meds(n);
            let joined: Vec<Medication> = paginate(&list)
                .iter()
                .flat_map(|slice| slice.medications.iter().cloned())
                .collect();
            assert_eq!(joined, list, "n = {}", n);
        }
    }

    #[test]
    fn should_number_rows_continuously() {
        for n in 0..60 {
            let list = meds(n);
            let numbers: Vec<usize> = paginate(&list)
                .iter()
                .flat_map(|slice| slice.numbered().map(|(i, _)| i).collect::<Vec<_>>())
                .collect();
            assert_eq!(numbers, (1..=n).collect::<Vec<_>>(), "n = {}", n);
        }
    }

    #[test]
    fn should_put_eighth_medication_alone_on_page_two() {
        let list = meds(8);
        let pages = paginate(&list);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].medications.len(), 1);
        assert_eq!(pages[1].first_number, 8);
        assert_eq!(pages[1].medications[0].name.as_deref(), Some("Med 8"));
    }

    #[test]
    fn should_split_twelve_medications_seven_and_five() {
        let list = meds(12);
        let pages = paginate(&list);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].numbered().map(|(i, _)| i).collect::<Vec<_>>(), (1..=7).collect::<Vec<_>>());
        assert_eq!(pages[1].numbered().map(|(i, _)| i).collect::<Vec<_>>(), (8..=12).collect::<Vec<_>>());
        assert!(pages[0].has_clinical_block());
        assert!(!pages[1].has_clinical_block());
    }

    #[test]
    fn should_start_later_pages_after_full_pages() {
        assert_eq!(first_number(1), 1);
        assert_eq!(first_number(2), 8);
        assert_eq!(first_number(3), 18);
        assert_eq!(first_number(4), 28);
    }

    #[test]
    fn should_render_single_empty_page_without_medications() {
        let pages = paginate(&[]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].medications.is_empty());
    }

    #[test]
    fn should_reject_pages_outside_document() {
        let list = meds(3);
        assert!(matches!(
            page_slice(&list, 0),
            Err(RenderError::PageOutOfRange { page: 0, total: 1 })
        ));
        assert!(matches!(
            page_slice(&list, 2),
            Err(RenderError::PageOutOfRange { page: 2, total: 1 })
        ));
    }
}
