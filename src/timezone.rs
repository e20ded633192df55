//! Resolves the server's configured timezone into local dates.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the name is not a known timezone.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let Some(offset) = get_local_offset(canonical_timezone) else {
        tracing::error!("Invalid timezone {canonical_timezone}");
        return Err(Error::InvalidTimezone(canonical_timezone.to_owned()));
    };

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::local_today;

    #[test]
    fn utc_resolves() {
        assert!(local_today("Etc/UTC").is_ok());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_today("Middle/Earth"),
            Err(Error::InvalidTimezone("Middle/Earth".to_owned()))
        );
    }
}
