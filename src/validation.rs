use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Titles and names must be strictly shorter than this many characters.
pub const MAX_TITLE_LENGTH: usize = 100;
/// Ids must be strictly shorter than this many characters.
pub const MAX_ID_LENGTH: usize = 10;
/// Ratings must be strictly shorter than this many characters.
pub const MAX_RATING_LENGTH: usize = 4;
/// Exclusive bounds on the textual length of a rating range.
pub const RATING_RANGE_LENGTH: (usize, usize) = (2, 8);
pub const MIN_RELEASE_YEAR: i32 = 1800;
pub const MAX_RELEASE_YEAR: i32 = 3000;

const FORBIDDEN_CHARACTERS: &[char] = &[
    ';', '$', '!', '@', '#', '^', '&', '*', '(', ')', '_', '+', '=', '`', '"', '~', ']', '[',
];

/// A path parameter that failed validation.
///
/// Carries no payload: each endpoint supplies its own message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parameter rejected")]
pub struct Rejected;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Parses a number, allowing surrounding whitespace and single underscores
/// between digits (`1_000`).
fn parse_number<T: FromStr>(value: &str) -> Result<T, Rejected> {
    let chars: Vec<char> = value.trim().chars().collect();
    let mut digits = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c != '_' {
            digits.push(c);
            continue;
        }
        let after_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let before_digit = chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if !(after_digit && before_digit) {
            return Err(Rejected);
        }
    }
    digits.parse().map_err(|_| Rejected)
}

/// A movie title or actor name, accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLike(String);

impl TitleLike {
    pub fn parse(value: &str) -> Result<Self, Rejected> {
        let len = char_len(value);
        if len == 0 || len >= MAX_TITLE_LENGTH {
            return Err(Rejected);
        }
        if value.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
            return Err(Rejected);
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for TitleLike {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A positive numeric record id (movie id, credits movie id or actor id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(i64);

impl RecordId {
    pub fn parse(value: &str) -> Result<Self, Rejected> {
        let len = char_len(value);
        if len == 0 || len >= MAX_ID_LENGTH {
            return Err(Rejected);
        }
        let id: i64 = parse_number(value)?;
        if id < 1 {
            return Err(Rejected);
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// A lower bound on `vote_average`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating(f64);

impl Rating {
    pub fn parse(value: &str) -> Result<Self, Rejected> {
        let len = char_len(value);
        if len == 0 || len >= MAX_RATING_LENGTH {
            return Err(Rejected);
        }
        let rating: f64 = parse_number(value)?;
        // NaN fails both comparisons and is rejected here.
        if !(rating > -1.0 && rating < 11.0) {
            return Err(Rejected);
        }
        Ok(Self(rating))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// An inclusive `low-high` window on `vote_average`.
///
/// The bounds are kept in the order they were given. A reversed pair such
/// as `5-3` is accepted and yields a window nothing can fall into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRange {
    pub low: f64,
    pub high: f64,
}

impl RatingRange {
    pub fn parse(value: &str) -> Result<Self, Rejected> {
        let len = char_len(value);
        let (min, max) = RATING_RANGE_LENGTH;
        if len <= min || len >= max {
            return Err(Rejected);
        }

        let mut parts = value.split('-');
        let (Some(low), Some(high), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Rejected);
        };

        Ok(Self {
            low: parse_bounded_rating(low)?,
            high: parse_bounded_rating(high)?,
        })
    }

    pub fn is_reversed(&self) -> bool {
        self.low > self.high
    }
}

fn parse_bounded_rating(value: &str) -> Result<f64, Rejected> {
    let rating: f64 = parse_number(value)?;
    if (0.0..=10.0).contains(&rating) {
        Ok(rating)
    } else {
        Err(Rejected)
    }
}

/// A four digit release year strictly between the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseYear(i32);

impl ReleaseYear {
    pub fn parse(value: &str) -> Result<Self, Rejected> {
        if char_len(value) != 4 {
            return Err(Rejected);
        }
        let year: i32 = parse_number(value)?;
        if year <= MIN_RELEASE_YEAR || year >= MAX_RELEASE_YEAR {
            return Err(Rejected);
        }
        Ok(Self(year))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// The decade this year belongs to, e.g. 2015 -> `201`.
    pub fn decade(self) -> Decade {
        Decade(self.0 / 10)
    }

    /// Prefix matched against `release_date`.
    pub fn prefix(self) -> String {
        self.0.to_string()
    }
}

/// The first three digits of a release year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decade(i32);

impl Decade {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn prefix(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Decade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}0s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok, assert_ok_eq};

    #[test]
    fn titles_between_one_and_ninety_nine_characters_are_accepted() {
        assert_ok!(TitleLike::parse("a"));
        assert_ok!(TitleLike::parse(&"a".repeat(99)));
        assert_ok!(TitleLike::parse("Star Wars: Episode IV - A New Hope."));
    }

    #[test]
    fn empty_and_overlong_titles_are_rejected() {
        assert_err!(TitleLike::parse(""));
        assert_err!(TitleLike::parse(&"a".repeat(100)));
        assert_err!(TitleLike::parse(&"a".repeat(250)));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let title = "é".repeat(99);
        assert!(title.len() > MAX_TITLE_LENGTH);
        assert_ok!(TitleLike::parse(&title));
    }

    #[test]
    fn titles_containing_a_forbidden_character_are_rejected() {
        for c in FORBIDDEN_CHARACTERS {
            let title = format!("Alien{c}");
            assert_err!(TitleLike::parse(&title));
        }
    }

    #[test]
    fn titles_are_not_normalized() {
        let title = TitleLike::parse("  the Matrix ").unwrap();
        assert_eq!(title.as_ref(), "  the Matrix ");
    }

    #[test]
    fn short_positive_integers_are_valid_ids() {
        assert_ok_eq!(RecordId::parse("1").map(RecordId::get), 1);
        assert_ok_eq!(RecordId::parse("19995").map(RecordId::get), 19995);
        assert_ok_eq!(RecordId::parse("007").map(RecordId::get), 7);
        assert_ok_eq!(RecordId::parse("999999999").map(RecordId::get), 999_999_999);
    }

    #[test]
    fn invalid_ids_are_rejected() {
        assert_err!(RecordId::parse(""));
        assert_err!(RecordId::parse("0"));
        assert_err!(RecordId::parse("-5"));
        assert_err!(RecordId::parse("abc"));
        assert_err!(RecordId::parse("1.5"));
        assert_err!(RecordId::parse("1234567890"));
        assert_err!(RecordId::parse("12345678901"));
    }

    #[test]
    fn digit_separators_between_digits_are_accepted() {
        assert_ok_eq!(RecordId::parse("1_0").map(RecordId::get), 10);
        assert_ok_eq!(RecordId::parse(" 19_995 ").map(RecordId::get), 19995);
        assert_ok_eq!(Rating::parse("1_0").map(Rating::get), 10.0);
        assert_ok_eq!(
            RatingRange::parse("5-1_0"),
            RatingRange {
                low: 5.0,
                high: 10.0
            }
        );
    }

    #[test]
    fn misplaced_digit_separators_are_rejected() {
        assert_err!(RecordId::parse("_10"));
        assert_err!(RecordId::parse("10_"));
        assert_err!(RecordId::parse("1__0"));
        assert_err!(Rating::parse("_5"));
    }

    #[test]
    fn ratings_inside_the_open_interval_are_accepted() {
        assert_ok_eq!(Rating::parse("7.5").map(Rating::get), 7.5);
        assert_ok_eq!(Rating::parse("0").map(Rating::get), 0.0);
        assert_ok_eq!(Rating::parse("10").map(Rating::get), 10.0);
    }

    #[test]
    fn invalid_ratings_are_rejected() {
        assert_err!(Rating::parse(""));
        assert_err!(Rating::parse("11"));
        assert_err!(Rating::parse("-2"));
        assert_err!(Rating::parse("abc"));
        assert_err!(Rating::parse("nan"));
        assert_err!(Rating::parse("7.55"));
    }

    #[test]
    fn rating_ranges_parse_into_ordered_pairs() {
        assert_ok_eq!(
            RatingRange::parse("0-10"),
            RatingRange {
                low: 0.0,
                high: 10.0
            }
        );
        assert_ok_eq!(
            RatingRange::parse("6.5-8"),
            RatingRange {
                low: 6.5,
                high: 8.0
            }
        );
    }

    #[test]
    fn reversed_rating_ranges_are_kept_as_given() {
        let range = RatingRange::parse("5-3").unwrap();
        assert_eq!(range.low, 5.0);
        assert_eq!(range.high, 3.0);
        assert!(range.is_reversed());
    }

    #[test]
    fn malformed_rating_ranges_are_rejected() {
        assert_err!(RatingRange::parse("5"));
        assert_err!(RatingRange::parse("abc"));
        assert_err!(RatingRange::parse("1-2-3"));
        assert_err!(RatingRange::parse("0-11"));
        assert_err!(RatingRange::parse("10.0-10.0"));
        assert_err!(RatingRange::parse("5--3"));
        assert_err!(RatingRange::parse("-5"));
    }

    #[test]
    fn four_digit_years_inside_the_bounds_are_accepted() {
        assert_ok_eq!(ReleaseYear::parse("2010").map(ReleaseYear::get), 2010);
        assert_ok_eq!(ReleaseYear::parse("1801").map(ReleaseYear::get), 1801);
        assert_ok_eq!(ReleaseYear::parse("2999").map(ReleaseYear::get), 2999);
    }

    #[test]
    fn invalid_years_are_rejected() {
        assert_err!(ReleaseYear::parse("999"));
        assert_err!(ReleaseYear::parse("20100"));
        assert_err!(ReleaseYear::parse("1800"));
        assert_err!(ReleaseYear::parse("3000"));
        assert_err!(ReleaseYear::parse("20a0"));
    }

    #[test]
    fn decade_keeps_the_first_three_digits() {
        let decade = ReleaseYear::parse("2015").unwrap().decade();
        assert_eq!(decade.get(), 201);
        assert_eq!(decade.prefix(), "201");
        assert_eq!(decade.to_string(), "2010s");
    }
}
