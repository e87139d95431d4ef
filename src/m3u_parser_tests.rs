//! Tests for M3U playlist parsing

#[cfg(test)]
mod tests {
    use crate::m3u_parser::*;
    use crate::models::Quality;

    #[test]
    fn test_parse_single_entry() {
        let content = "#EXTINF:-1 tvg-id=\"bbc1\" tvg-logo=\"http://x/l.png\",BBC One HD\nhttp://stream/bbc1.m3u8";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "BBC One HD");
        assert_eq!(channels[0].url, "http://stream/bbc1.m3u8");
        assert_eq!(channels[0].logo.as_deref(), Some("http://x/l.png"));
        assert_eq!(channels[0].quality, Quality::Hd);
        assert_eq!(channels[0].epg_id.as_deref(), Some("bbc1"));
    }

    #[test]
    fn test_parse_m3u() {
        let content = r#"
#EXTM3U
#EXTINF:-1 tvg-id="cnn" group-title="News",CNN
http://example.com/live/user/pass/1.ts
#EXTINF:-1 tvg-id="bbc" group-title="News",BBC
http://example.com/live/user/pass/2.ts
#EXTINF:-1 tvg-id="mtv",MTV 480
rtmp://example.com/live/3
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].name, "CNN");
        assert_eq!(channels[1].name, "BBC");
        assert_eq!(channels[2].name, "MTV 480");
        assert_eq!(channels[2].url, "rtmp://example.com/live/3");
        assert_eq!(channels[2].quality, Quality::Sd);
        assert_eq!(channels[0].group, Some("News".to_string()));
    }

    #[test]
    fn test_name_after_first_comma() {
        let content = "#EXTINF:-1 tvg-id=\"a\",  Sports, Live  \nhttp://example.com/a";
        let channels = parse_playlist(content);
        assert_eq!(channels[0].name, "Sports, Live");
    }

    #[test]
    fn test_no_comma_means_empty_name() {
        let content = "#EXTINF:-1 tvg-id=\"a\"\nhttp://example.com/a";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "");
        assert_eq!(channels[0].epg_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_url_without_extinf() {
        let content = "#EXTM3U\nhttp://example.com/orphan.ts\n";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "");
        assert_eq!(channels[0].logo, None);
        assert_eq!(channels[0].epg_id, None);
        assert_eq!(channels[0].quality, Quality::Other);
    }

    #[test]
    fn test_consecutive_urls_share_metadata() {
        let content = "#EXTINF:-1 tvg-id=\"x\",Twin SD\nhttp://a.example/1\nhttp://a.example/2\n";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "Twin SD");
        assert_eq!(channels[1].name, "Twin SD");
        assert_eq!(channels[1].quality, Quality::Sd);
        assert_eq!(channels[1].epg_id.as_deref(), Some("x"));
        assert_ne!(channels[0].id, channels[1].id);
    }

    #[test]
    fn test_extinf_resets_draft() {
        let content = r#"#EXTINF:-1 tvg-id="one" tvg-logo="http://l/1.png",One HD
http://example.com/1
#EXTINF:-1,Two
http://example.com/2
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].name, "Two");
        assert_eq!(channels[1].logo, None);
        assert_eq!(channels[1].epg_id, None);
        assert_eq!(channels[1].quality, Quality::Other);
    }

    #[test]
    fn test_extinf_without_url_is_dropped() {
        let content = "#EXTINF:-1,Lonely\n#EXTINF:-1,Paired\nhttp://example.com/p\n#EXTINF:-1,Trailing\n";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Paired");
    }

    #[test]
    fn test_prefixes_are_case_sensitive() {
        let content = "#extinf:-1,Lower\nHTTP://example.com/upper\nudp://@233.50.230.1:5000\n";
        assert!(parse_playlist(content).is_empty());
    }

    #[test]
    fn test_mixed_newlines() {
        let content = "#EXTM3U\r\n#EXTINF:-1,A\r\nhttp://example.com/a\r#EXTINF:-1,B\nhttp://example.com/b  \n";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].url, "http://example.com/a");
        assert_eq!(channels[1].name, "B");
        assert_eq!(channels[1].url, "http://example.com/b");
    }

    #[test]
    fn test_unterminated_logo_is_absent() {
        let content = "#EXTINF:-1 tvg-id=\"ok\" tvg-logo=\"http://broken/logo.png,Broken\nhttp://example.com/b";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].logo, None);
        assert_eq!(channels[0].epg_id.as_deref(), Some("ok"));
    }

    #[test]
    fn test_extract_attribute_states() {
        let line = r#"#EXTINF:-1 tvg-id="abc" tvg-logo="unterminated"#;
        assert_eq!(extract_attribute(line, "tvg-id"), Attribute::Value("abc"));
        assert_eq!(extract_attribute(line, "tvg-logo"), Attribute::Malformed);
        assert_eq!(extract_attribute(line, "group-title"), Attribute::Absent);
        assert_eq!(extract_attribute(line, "TVG-ID"), Attribute::Absent);
    }

    #[test]
    fn test_extract_attribute_first_occurrence() {
        let line = r#"#EXTINF:-1 tvg-id="first" tvg-id="second",Dup"#;
        assert_eq!(extract_attribute(line, "tvg-id").value(), Some("first"));
    }

    #[test]
    fn test_quality_hd_wins_regardless_of_position() {
        let content = "#EXTINF:-1,SD feed 720\nhttp://a/1\n#EXTINF:-1,1080 then SD\nhttp://a/2\n#EXTINF:-1,Plain 480\nhttp://a/3\n";
        let channels = parse_playlist(content);
        assert_eq!(channels[0].quality, Quality::Hd);
        assert_eq!(channels[1].quality, Quality::Hd);
        assert_eq!(channels[2].quality, Quality::Sd);
    }

    #[test]
    fn test_progress_reports_fractions() {
        let content = "#EXTM3U\n#EXTINF:-1,A\nhttp://example.com/a\nhttp://example.com/b";
        let mut seen = Vec::new();
        let channels = parse_playlist_with_progress(content, |p| seen.push(p));
        assert_eq!(channels.len(), 2);
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(parse_playlist("").is_empty());
        assert!(parse_playlist("not a playlist\n\n###\n").is_empty());
    }

    #[test]
    fn test_parse_playlist_with_epg_url() {
        let content = r#"#EXTM3U x-tvg-url="http://example.com/epg.xml"
#EXTINF:-1 tvg-id="ch1" group-title="General",Channel 1
http://example.com/live/user/pass/1.ts
"#;
        let playlist = parse_playlist_document(content);
        assert_eq!(playlist.epg_url, Some("http://example.com/epg.xml".to_string()));
        assert_eq!(playlist.channels.len(), 1);
        assert_eq!(playlist.channels[0].group.as_deref(), Some("General"));
    }

    #[test]
    fn test_parse_playlist_url_tvg_header() {
        let content = "#EXTM3U url-tvg=\"http://example.com/guide.xml.gz\"\n";
        let playlist = parse_playlist_document(content);
        assert_eq!(playlist.epg_url.as_deref(), Some("http://example.com/guide.xml.gz"));
        assert!(playlist.channels.is_empty());
    }

    #[test]
    fn test_each_parse_generates_fresh_ids() {
        let content = "#EXTINF:-1,A\nhttp://example.com/a";
        let first = parse_playlist(content);
        let second = parse_playlist(content);
        assert_ne!(first[0].id, second[0].id);
    }
}
