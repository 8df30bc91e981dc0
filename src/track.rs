/// A resolved, playable unit of audio with display metadata.
///
/// Produced once by a [`crate::resolver::TrackResolver`] and never mutated
/// afterwards; ownership moves from the room queue into the room's
/// current-track slot and is dropped when the track finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// Canonical page URL for display. May be empty.
    pub page_url: String,
    /// Direct stream URL handed to the voice transport.
    pub stream_url: String,
    /// Duration in seconds, when the resolver knows it.
    pub duration: Option<u64>,
    pub requested_by: String,
}

impl Track {
    /// Render the duration as `m:ss` or `h:mm:ss`, `?` when unknown.
    pub fn format_duration(&self) -> String {
        format_duration(self.duration)
    }

    /// Multi-line summary for "now playing" status queries.
    pub fn describe(&self) -> String {
        format!(
            "Now playing: {}\nDuration: {}\nSource: {}\nRequested by: {}",
            self.title,
            self.format_duration(),
            source_or_na(&self.page_url),
            self.requested_by,
        )
    }
}

pub(crate) fn source_or_na(page_url: &str) -> &str {
    if page_url.is_empty() { "n/a" } else { page_url }
}

pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds.filter(|s| *s > 0) else {
        return "?".to_string();
    };
    let (m, s) = (seconds / 60, seconds % 60);
    let (h, m) = (m / 60, m % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Render a bounded queue listing: the first [`QUEUE_DISPLAY_LIMIT`] entries
/// plus a trailing "and N more" line.
pub fn format_queue(tracks: &[Track]) -> String {
    const QUEUE_DISPLAY_LIMIT: usize = 20;

    if tracks.is_empty() {
        return "Queue is empty.".to_string();
    }
    let mut lines = vec!["Queue:".to_string()];
    for (i, track) in tracks.iter().take(QUEUE_DISPLAY_LIMIT).enumerate() {
        lines.push(format!(
            "{}. {} [{}]",
            i + 1,
            track.title,
            track.format_duration()
        ));
    }
    if tracks.len() > QUEUE_DISPLAY_LIMIT {
        lines.push(format!("... and {} more", tracks.len() - QUEUE_DISPLAY_LIMIT));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, duration: Option<u64>) -> Track {
        Track {
            title: title.to_string(),
            page_url: String::new(),
            stream_url: "https://cdn.example/a.m4a".to_string(),
            duration,
            requested_by: "tester".to_string(),
        }
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(None), "?");
        assert_eq!(format_duration(Some(0)), "?");
        assert_eq!(format_duration(Some(59)), "0:59");
        assert_eq!(format_duration(Some(212)), "3:32");
        assert_eq!(format_duration(Some(3661)), "1:01:01");
    }

    #[test]
    fn queue_listing_is_bounded() {
        let tracks: Vec<Track> = (0..25).map(|i| track(&format!("t{i}"), Some(60))).collect();
        let rendered = format_queue(&tracks);
        assert!(rendered.starts_with("Queue:\n1. t0 [1:00]"));
        assert!(rendered.contains("20. t19"));
        assert!(!rendered.contains("t20 "));
        assert!(rendered.ends_with("... and 5 more"));
    }

    #[test]
    fn empty_queue_listing() {
        assert_eq!(format_queue(&[]), "Queue is empty.");
    }

    #[test]
    fn describe_falls_back_for_missing_page_url() {
        let summary = track("song", Some(61)).describe();
        assert!(summary.contains("Source: n/a"));
        assert!(summary.contains("Duration: 1:01"));
    }
}
