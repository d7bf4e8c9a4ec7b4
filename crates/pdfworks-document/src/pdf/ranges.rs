// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range parsing — turns strings like "1-3,5,8" into a sorted,
// duplicate-free list of zero-based page indices.

use std::collections::BTreeSet;

use pdfworks_core::error::{PdfworksError, Result};

/// A validated selection of pages, held as zero-based indices in ascending
/// order with no duplicates. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    indices: Vec<u32>,
}

impl PageSelection {
    /// Parse `ranges` against a document of `total_pages` pages.
    ///
    /// All whitespace is ignored. Tokens are separated by commas and are
    /// either a single 1-based page number or an inclusive span `a-b`.
    /// The first bad token aborts the parse with [`PdfworksError::Range`];
    /// a string that selects nothing yields [`PdfworksError::EmptySelection`].
    pub fn parse(ranges: &str, total_pages: u32) -> Result<Self> {
        let compact: String = ranges.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() || total_pages == 0 {
            return Err(PdfworksError::EmptySelection);
        }

        let mut selected = BTreeSet::new();
        for token in compact.split(',') {
            match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page_number(token, start)?;
                    let end = parse_page_number(token, end)?;
                    if start > end {
                        return Err(PdfworksError::range(token, "start is greater than end"));
                    }
                    if start < 1 {
                        return Err(PdfworksError::range(token, "page numbers start at 1"));
                    }
                    if end > total_pages {
                        return Err(PdfworksError::range(
                            token,
                            format!("document has only {total_pages} pages"),
                        ));
                    }
                    selected.extend((start - 1)..end);
                }
                None => {
                    let page = parse_page_number(token, token)?;
                    if page < 1 || page > total_pages {
                        return Err(PdfworksError::range(
                            token,
                            format!("page is out of bounds (1-{total_pages})"),
                        ));
                    }
                    selected.insert(page - 1);
                }
            }
        }

        if selected.is_empty() {
            return Err(PdfworksError::EmptySelection);
        }

        Ok(Self {
            indices: selected.into_iter().collect(),
        })
    }

    /// Zero-based page indices, ascending.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// One-based page numbers, ascending (the numbering lopdf uses).
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn into_indices(self) -> Vec<u32> {
        self.indices
    }
}

/// Parse `ranges` into sorted, unique, zero-based indices.
pub fn parse_page_ranges(ranges: &str, total_pages: u32) -> Result<Vec<u32>> {
    PageSelection::parse(ranges, total_pages).map(PageSelection::into_indices)
}

fn parse_page_number(token: &str, part: &str) -> Result<u32> {
    part.parse::<u32>()
        .map_err(|_| PdfworksError::range(token, "not a valid page number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_range_error(input: &str, total: u32, expected_token: &str) {
        match parse_page_ranges(input, total) {
            Err(PdfworksError::Range { token, .. }) => assert_eq!(token, expected_token),
            other => panic!("expected range error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn single_pages_and_spans() {
        assert_eq!(parse_page_ranges("1-3,5,8", 10).unwrap(), vec![0, 1, 2, 4, 7]);
        assert_eq!(parse_page_ranges("4", 4).unwrap(), vec![3]);
        assert_eq!(parse_page_ranges("2-2", 3).unwrap(), vec![1]);
    }

    #[test]
    fn overlapping_tokens_are_deduplicated_and_sorted() {
        assert_eq!(parse_page_ranges("1,3,2-2", 5).unwrap(), vec![0, 1, 2]);
        assert_eq!(parse_page_ranges("5,1-3,2-4", 5).unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse_page_ranges(" 1 - 2 ,\t5 ", 5).unwrap(), vec![0, 1, 4]);
    }

    #[test]
    fn reversed_span_fails() {
        assert_range_error("2-1", 5, "2-1");
    }

    #[test]
    fn span_starting_at_zero_fails() {
        assert_range_error("0-3", 5, "0-3");
    }

    #[test]
    fn span_past_the_end_fails() {
        assert_range_error("1-10", 5, "1-10");
    }

    #[test]
    fn single_page_bounds() {
        assert_range_error("0", 5, "0");
        assert_range_error("6", 5, "6");
    }

    #[test]
    fn malformed_tokens_fail_with_the_token_named() {
        assert_range_error("1,abc", 5, "abc");
        assert_range_error("1,,2", 5, "");
        assert_range_error("-3", 5, "-3");
        assert_range_error("1-2-3", 5, "1-2-3");
        assert_range_error("3-", 5, "3-");
        assert_range_error("99999999999", 5, "99999999999");
    }

    #[test]
    fn first_bad_token_wins_and_no_partial_result() {
        let err = parse_page_ranges("1,2,9,abc", 5).unwrap_err();
        assert!(err.to_string().contains("'9'"), "{err}");
    }

    #[test]
    fn empty_input_is_an_empty_selection() {
        assert!(matches!(parse_page_ranges("", 5), Err(PdfworksError::EmptySelection)));
        assert!(matches!(parse_page_ranges("  \t", 5), Err(PdfworksError::EmptySelection)));
        assert!(matches!(parse_page_ranges("1", 0), Err(PdfworksError::EmptySelection)));
    }

    #[test]
    fn output_is_always_sorted_unique_and_in_bounds() {
        let total = 7;
        let inputs = ["7,1", "3-5,4,4-6", "1-7", "2,2,2", "6-7,1-2"];
        for input in inputs {
            let pages = parse_page_ranges(input, total).unwrap();
            assert!(!pages.is_empty());
            assert!(pages.windows(2).all(|w| w[0] < w[1]), "{input}: {pages:?}");
            assert!(pages.iter().all(|&p| p < total), "{input}: {pages:?}");
        }
    }

    #[test]
    fn selection_exposes_one_based_numbers() {
        let selection = PageSelection::parse("2,4", 4).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.page_numbers().collect::<Vec<_>>(), vec![2, 4]);
    }
}
