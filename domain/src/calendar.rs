use crate::error::Error;
use crate::grant::Grant;
use log::*;
use meeting_ai::traits::calendar;
use meeting_ai::types::calendar::TimeRange;

/// Events on the grant's primary calendar between `start` and `end` (Unix seconds).
pub async fn list_events(
    calendar: &dyn calendar::Provider,
    grant: &Grant,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<serde_json::Value>, Error> {
    let (Some(start), Some(end)) = (non_blank(start), non_blank(end)) else {
        return Err(Error::invalid("Missing required parameters"));
    };
    for bound in [start, end] {
        if bound.parse::<i64>().is_err() {
            return Err(Error::invalid(format!("Invalid timestamp: {bound}")));
        }
    }

    let range = TimeRange {
        start: start.to_string(),
        end: end.to_string(),
    };
    debug!(
        "Listing events {start}..{end} for grant {}",
        grant.fingerprint()
    );
    Ok(calendar.events(grant.expose(), &range).await?)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
