use chrono::NaiveDateTime;

use crate::parser::extract::charges::Charge;
use crate::parser::patterns;

/// A charge is expired when it carries at least one exigibility/effect date and
/// every one of them parses and lies strictly before `now`. Independent of radiation.
pub fn is_expired(charge: &Charge, now: NaiveDateTime) -> bool {
    let mut dates = charge.all_dates().peekable();
    if dates.peek().is_none() {
        return false;
    }
    dates.all(|d| {
        patterns::parse_dmy(d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .is_some_and(|start| start < now)
    })
}
