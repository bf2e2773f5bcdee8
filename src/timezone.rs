use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date and time in `canonical_timezone`, e.g. "Asia/Jakarta".
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the timezone name is not known.
pub fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset))
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::Error;

    use super::{get_local_offset, local_now};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_now("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }

    #[test]
    fn local_now_uses_the_zone_offset() {
        let now = local_now("Asia/Jakarta").unwrap();

        assert_eq!(now.offset(), UtcOffset::from_hms(7, 0, 0).unwrap());
    }
}
