use memcard_chunk::TurnHeader;
use memcard_schema::DerivedFn;

/// Compute a derived field from a chunk's turn headers. None when the chunk has no turns.
pub fn derive_value(func: DerivedFn, turns: &[TurnHeader]) -> Option<String> {
    let first = turns.first()?;
    let last = turns.last()?;
    match func {
        DerivedFn::FirstTurnDateYmdSlash => {
            let date = first.timestamp.split_whitespace().next().unwrap_or("");
            Some(date.replace('-', "/"))
        }
        DerivedFn::FirstLastTurnTimeRange => {
            let start = time_part(&first.timestamp);
            let end = time_part(&last.timestamp);
            if end.is_empty() || start == end {
                Some(start.to_string())
            } else {
                Some(format!("{start}-{end}"))
            }
        }
    }
}

fn time_part(timestamp: &str) -> &str {
    timestamp
        .split_once(char::is_whitespace)
        .map_or("", |(_, t)| t.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(ts: &str) -> TurnHeader {
        TurnHeader {
            timestamp: ts.into(),
            speaker: "A".into(),
        }
    }

    #[test]
    fn date_uses_first_turn() {
        let turns = [turn("2024-05-01 23:59:00"), turn("2024-05-02 00:01:00")];
        assert_eq!(
            derive_value(DerivedFn::FirstTurnDateYmdSlash, &turns).as_deref(),
            Some("2024/05/01")
        );
    }

    #[test]
    fn time_range_spans_first_to_last() {
        let turns = [turn("2024-05-01 21:03:00"), turn("2024-05-01 21:40:12")];
        assert_eq!(
            derive_value(DerivedFn::FirstLastTurnTimeRange, &turns).as_deref(),
            Some("21:03:00-21:40:12")
        );
    }

    #[test]
    fn time_range_collapses_single_time() {
        let turns = [turn("2024-05-01 21:03:00")];
        assert_eq!(
            derive_value(DerivedFn::FirstLastTurnTimeRange, &turns).as_deref(),
            Some("21:03:00")
        );
    }

    #[test]
    fn no_turns_no_value() {
        assert!(derive_value(DerivedFn::FirstTurnDateYmdSlash, &[]).is_none());
    }
}
