//! Natural ("human") ordering of names.
//!
//! Names are split into maximal runs of ASCII digits and non-digits. Runs are
//! compared pairwise: digit runs by numeric magnitude, text runs
//! case-insensitively. So `page2.jpg` sorts before `page10.jpg`, and
//! `Chapter 1` sits next to `chapter 1`.
//!
//! The ordering is total. Two names that compare equal run-by-run (they
//! differ only in letter case or in leading zeros of equal numbers) fall
//! back to plain code-point order, so sorting a listing is deterministic.

use std::cmp::Ordering;

/// Compare two names in natural order.
///
/// ```
/// use folio_media::natural;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural::compare("img2", "img10"), Ordering::Less);
/// assert_eq!(natural::compare("Page 3", "page 4"), Ordering::Less);
/// assert_eq!(natural::compare("page 03", "Page 3"), Ordering::Less);
/// ```
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    compare_runs(a, b).then_with(|| a.cmp(b))
}

/// Sort a slice in natural order of the name produced by `key`.
pub fn sort_by_name<T>(items: &mut [T], key: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| compare(key(a), key(b)));
}

fn compare_runs(a: &str, b: &str) -> Ordering {
    let mut left = Runs { rest: a };
    let mut right = Runs { rest: b };
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp_run(&y) {
                Ordering::Equal => continue,
                ordering => return ordering,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl Run<'_> {
    fn cmp_run(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Run::Digits(a), Run::Digits(b)) => {
                let (x, y) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
                // Without leading zeros, the longer run is the larger number;
                // this holds for runs far beyond u64.
                x.len().cmp(&y.len()).then_with(|| x.cmp(y)).then_with(|| a.cmp(b))
            },
            (Run::Text(a), Run::Text(b)) => fold(a).cmp(fold(b)),
            // A text run never starts with a digit, so the leading characters
            // always differ and mixed comparisons agree with text/text ones.
            (Run::Digits(_), Run::Text(_)) | (Run::Text(_), Run::Digits(_)) => self.leading().cmp(&other.leading()),
        }
    }

    fn leading(&self) -> char {
        match self {
            Run::Digits(s) | Run::Text(s) => fold(s).next().unwrap_or_default(),
        }
    }
}

fn fold(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits { Run::Digits(run) } else { Run::Text(run) })
    }
}
