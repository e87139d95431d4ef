//! Now/next correlation between playlist channels and the schedule index.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::epg::ScheduleIndex;
use crate::models::{Channel, Program};

/// Titles airing now and next on one channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NowNext {
    pub current: Option<String>,
    pub next: Option<String>,
}

/// Current and next programs for a channel. Channels without an EPG id never
/// match; there is no fallback on the display name.
pub fn now_next_programs<'a, Tz: TimeZone>(
    channel: &Channel,
    index: &'a ScheduleIndex,
    now: &DateTime<Tz>,
) -> (Option<&'a Program>, Option<&'a Program>) {
    match channel.epg_id.as_deref() {
        Some(epg_id) => (
            index.current_program(epg_id, now),
            index.next_program(epg_id, now),
        ),
        None => (None, None),
    }
}

/// Titles airing now and next for a channel
pub fn describe<Tz: TimeZone>(channel: &Channel, index: &ScheduleIndex, now: &DateTime<Tz>) -> NowNext {
    let (current, next) = now_next_programs(channel, index, now);
    NowNext {
        current: current.map(|p| p.title.clone()),
        next: next.map(|p| p.title.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epg::parse_epg;
    use crate::m3u_parser::parse_playlist;
    use chrono::Utc;

    const GUIDE: &str = r#"<tv>
  <programme channel="bbc1" start="20240101180000 +0000" stop="20240101190000 +0000"><title>News</title></programme>
  <programme channel="bbc1" start="20240101190000 +0000" stop="20240101200000 +0000"><title>Weather</title></programme>
  <programme channel="BBC One" start="20240101180000 +0000" stop="20240101200000 +0000"><title>By Name</title></programme>
</tv>"#;

    #[test]
    fn test_describe_now_and_next() {
        let index = ScheduleIndex::build(parse_epg(GUIDE).unwrap());
        let channels = parse_playlist("#EXTINF:-1 tvg-id=\"bbc1\",BBC One\nhttp://stream/bbc1");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap();

        let result = describe(&channels[0], &index, &now);
        assert_eq!(result.current.as_deref(), Some("News"));
        assert_eq!(result.next.as_deref(), Some("Weather"));
    }

    #[test]
    fn test_describe_without_epg_id_is_empty() {
        let index = ScheduleIndex::build(parse_epg(GUIDE).unwrap());
        let channels = parse_playlist("#EXTINF:-1,BBC One\nhttp://stream/bbc1");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap();

        assert_eq!(describe(&channels[0], &index, &now), NowNext::default());
    }

    #[test]
    fn test_describe_unknown_epg_id() {
        let index = ScheduleIndex::build(parse_epg(GUIDE).unwrap());
        let channels = parse_playlist("#EXTINF:-1 tvg-id=\"itv\",ITV\nhttp://stream/itv");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap();

        assert_eq!(describe(&channels[0], &index, &now), NowNext::default());
    }

    #[test]
    fn test_describe_after_schedule_ends() {
        let index = ScheduleIndex::build(parse_epg(GUIDE).unwrap());
        let channels = parse_playlist("#EXTINF:-1 tvg-id=\"bbc1\",BBC One\nhttp://stream/bbc1");
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        assert_eq!(describe(&channels[0], &index, &now), NowNext::default());
    }
}
