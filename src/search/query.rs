//! Translates search criteria into a store query.

use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    store::{Filter, Order, Query},
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The criteria for a transaction search. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSpec {
    /// The earliest date to include.
    pub from_date: Option<Date>,
    /// The latest date to include.
    pub to_date: Option<Date>,
    /// Only include transactions with exactly this category.
    pub category: Option<String>,
}

/// Build the query for transactions matching `spec`, newest first.
///
/// Both date bounds are inclusive. A category that is empty after trimming
/// is ignored.
pub fn build_search_query(spec: &SearchSpec) -> Query {
    let mut query = Query::default().order(Order::descending("date"));

    if let Some(from_date) = spec.from_date {
        query = query.filter(Filter::gte("date", from_date.to_string()));
    }

    if let Some(to_date) = spec.to_date {
        query = query.filter(Filter::lte("date", to_date.to_string()));
    }

    if let Some(category) = spec
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
    {
        query = query.filter(Filter::eq("category", category));
    }

    query
}

/// The raw search form. Empty fields are left unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

fn parse_optional_date(label: &str, value: Option<&str>) -> Result<Option<Date>, Error> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    Date::parse(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::Validation(format!("{label} \"{value}\" is not a valid date.")))
}

impl TryFrom<SearchForm> for SearchSpec {
    type Error = Error;

    fn try_from(form: SearchForm) -> Result<Self, Self::Error> {
        Ok(SearchSpec {
            from_date: parse_optional_date("From date", form.from_date.as_deref())?,
            to_date: parse_optional_date("To date", form.to_date.as_deref())?,
            category: form
                .category
                .map(|category| category.trim().to_owned())
                .filter(|category| !category.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        store::{Filter, Order, Query},
    };

    use super::{SearchForm, SearchSpec, build_search_query};

    #[test]
    fn empty_spec_selects_everything_newest_first() {
        let got = build_search_query(&SearchSpec::default());

        assert_eq!(got, Query::default().order(Order::descending("date")));
    }

    #[test]
    fn date_range_is_inclusive() {
        let spec = SearchSpec {
            from_date: Some(date!(2024 - 01 - 01)),
            to_date: Some(date!(2024 - 01 - 31)),
            category: None,
        };

        let got = build_search_query(&spec);

        assert_eq!(
            got.filters,
            [
                Filter::gte("date", "2024-01-01"),
                Filter::lte("date", "2024-01-31"),
            ]
        );
        assert_eq!(got.limit, None);
    }

    #[test]
    fn category_is_trimmed() {
        let spec = SearchSpec {
            category: Some("  Food ".to_owned()),
            ..Default::default()
        };

        let got = build_search_query(&spec);

        assert_eq!(got.filters, [Filter::eq("category", "Food")]);
    }

    #[test]
    fn blank_category_is_ignored() {
        let spec = SearchSpec {
            category: Some("   ".to_owned()),
            ..Default::default()
        };

        assert!(build_search_query(&spec).filters.is_empty());
    }

    #[test]
    fn form_with_empty_fields_is_unfiltered() {
        let form = SearchForm {
            from_date: Some(String::new()),
            to_date: None,
            category: Some(" ".to_owned()),
        };

        assert_eq!(SearchSpec::try_from(form), Ok(SearchSpec::default()));
    }

    #[test]
    fn form_rejects_malformed_date() {
        let form = SearchForm {
            to_date: Some("31/01/2024".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            SearchSpec::try_from(form),
            Err(Error::Validation(_))
        ));
    }
}
