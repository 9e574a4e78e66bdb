//! Accept header parsing and content negotiation.

/// One media range of an Accept header, e.g. `text/*;q=0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    main: String,
    sub: String,
    quality: f32,
}

impl MediaRange {
    /// Parse a single range. Returns `None` for anything that is not
    /// `type/subtype`. A missing or malformed `q` counts as 1.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(';');
        let (main, sub) = parts.next()?.trim().split_once('/')?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return None;
        }

        let quality = parts
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
            .and_then(|(_, value)| value.trim().parse::<f32>().ok())
            .filter(|q| (0.0..=1.0).contains(q))
            .unwrap_or(1.0);

        Some(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            quality,
        })
    }

    /// Client preference weight.
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// How specifically this range matches `main/sub`: 2 exact, 1 `type/*`,
    /// 0 `*/*`, `None` when it does not match.
    fn specificity(&self, main: &str, sub: &str) -> Option<u8> {
        match (self.main.as_str(), self.sub.as_str()) {
            ("*", "*") => Some(0),
            (m, "*") if m.eq_ignore_ascii_case(main) => Some(1),
            (m, s) if m.eq_ignore_ascii_case(main) && s.eq_ignore_ascii_case(sub) => Some(2),
            _ => None,
        }
    }
}

/// A parsed Accept header, ranges kept in header order.
#[derive(Debug, Clone, Default)]
pub struct AcceptHeader {
    ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    /// Parse an Accept header; unparsable ranges are skipped.
    ///
    /// ```
    /// use tokio_chain::negotiation::AcceptHeader;
    ///
    /// let accept = AcceptHeader::parse("text/plain;q=1.0, text/html;q=0.8");
    /// assert_eq!(accept.best_match(&["text/html", "application/json"]), Some(0));
    /// ```
    pub fn parse(header: &str) -> Self {
        let ranges = header
            .split(',')
            .filter_map(|s| MediaRange::parse(s.trim()))
            .collect();
        Self { ranges }
    }

    /// Parsed ranges.
    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    /// Whether nothing usable was parsed.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Weight the client gives `mime`: the q of the most specific matching
    /// range, 0 when none matches. Parameters of `mime` are ignored.
    pub fn quality_of(&self, mime: &str) -> f32 {
        let essence = mime.split(';').next().unwrap_or("").trim();
        let Some((main, sub)) = essence.split_once('/') else {
            return 0.0;
        };

        let mut best: Option<(u8, f32)> = None;
        for range in &self.ranges {
            if let Some(spec) = range.specificity(main, sub) {
                if best.map_or(true, |(s, _)| spec > s) {
                    best = Some((spec, range.quality));
                }
            }
        }
        best.map_or(0.0, |(_, q)| q)
    }

    /// Index of the offered type the client prefers most.
    ///
    /// Types with weight 0 are never chosen; ties go to the earliest offer.
    pub fn best_match(&self, offered: &[&str]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, mime) in offered.iter().enumerate() {
            let q = self.quality_of(mime);
            if q > 0.0 && best.map_or(true, |(_, bq)| q > bq) {
                best = Some((idx, q));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_ranges() {
        let accept = AcceptHeader::parse("application/json, text/html; q=0.9, */*;q=0.1");
        assert_eq!(accept.ranges().len(), 3);
        assert_eq!(accept.ranges()[0].quality(), 1.0);
        assert_eq!(accept.ranges()[1].quality(), 0.9);
        assert_eq!(accept.ranges()[2].quality(), 0.1);
    }

    #[test]
    fn test_parse_skips_garbage() {
        let accept = AcceptHeader::parse("garbage, */html, text/plain;q=abc, ");
        assert_eq!(accept.ranges().len(), 1);
        // Malformed q defaults to 1
        assert_eq!(accept.ranges()[0].quality(), 1.0);
        assert!(AcceptHeader::parse("").is_empty());
    }

    #[test]
    fn test_most_specific_range_wins() {
        let accept = AcceptHeader::parse("text/*;q=0.3, text/html;q=0.7, */*;q=0.1");
        assert_eq!(accept.quality_of("text/html"), 0.7);
        assert_eq!(accept.quality_of("text/plain"), 0.3);
        assert_eq!(accept.quality_of("image/png"), 0.1);
        assert_eq!(accept.quality_of("TEXT/HTML; charset=utf-8"), 0.7);
    }

    #[test]
    fn test_best_match_by_weight() {
        let accept = AcceptHeader::parse("text/plain;q=1.0, text/html;q=0.8");
        assert_eq!(accept.best_match(&["text/html", "application/json"]), Some(0));

        let accept = AcceptHeader::parse("application/json;q=0.5, text/html");
        assert_eq!(accept.best_match(&["application/json", "text/html"]), Some(1));
    }

    #[test]
    fn test_best_match_ties_use_declaration_order() {
        let accept = AcceptHeader::parse("*/*");
        assert_eq!(accept.best_match(&["application/json", "text/html"]), Some(0));
        assert_eq!(accept.best_match(&["text/html", "application/json"]), Some(0));
    }

    #[test]
    fn test_zero_weight_excludes() {
        let accept = AcceptHeader::parse("text/html;q=0, */*;q=0.2");
        assert_eq!(accept.best_match(&["text/html", "application/json"]), Some(1));

        let accept = AcceptHeader::parse("application/xml");
        assert_eq!(accept.best_match(&["text/html", "application/json"]), None);
        assert_eq!(accept.best_match(&[]), None);
    }
}
