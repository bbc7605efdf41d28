use regex::Regex;

/// Checked in order; the first hit wins, so the more specific phrases must
/// stay ahead of their substrings ("inside the episode" before "inside").
const LABEL_KEYWORDS: &[(&str, &str)] = &[
    ("trailer", "TRAILER"),
    ("teaser", "TEASER"),
    ("making of", "MAKING OF"),
    ("interview", "INTERVIEW"),
    ("behind the scenes", "BEHIND THE SCENES"),
    ("deleted scene", "DELETED SCENE"),
    ("gag reel", "GAG REEL"),
    ("blooper", "BLOOPERS"),
    ("featurette", "FEATURETTE"),
    ("preview", "PREVIEW"),
    ("special", "SPECIAL"),
    ("recap", "RECAP"),
    ("inside the episode", "INSIDE THE EPISODE"),
    ("insides", "INSIDES"),
    ("inside", "INSIDE"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ThumbLabel {
    /// Badge text rendered bottom-left, e.g. "TRAILER #02".
    pub(crate) text: String,
    /// Optional season/episode tag rendered top-right, e.g. "S02-E05".
    pub(crate) corner: Option<String>,
}

pub(crate) fn detect_label(title: &str) -> Option<ThumbLabel> {
    let lower = title.to_lowercase();
    let corner = corner_tag(&lower);
    let suffix = number_suffix(&lower);

    for (keyword, badge) in LABEL_KEYWORDS {
        if lower.contains(keyword) {
            return Some(ThumbLabel {
                text: compose(badge, suffix.as_deref()),
                corner,
            });
        }
    }

    if let Some(custom) = quoted_label(title) {
        return Some(ThumbLabel {
            text: compose(&custom, suffix.as_deref()),
            corner,
        });
    }

    if corner.is_some() || suffix.is_some() {
        return Some(ThumbLabel {
            text: compose("SPECIAL", suffix.as_deref()),
            corner,
        });
    }

    None
}

fn corner_tag(lower: &str) -> Option<String> {
    let season_re = Regex::new(r"(?:staffel|season)\s*0*(\d+)").ok()?;
    let episode_re = Regex::new(r"episode\s*0*(\d+)").ok()?;

    let mut tag = captured_number(&season_re, lower).map(|num| format!("S{num:02}"));
    if let Some(num) = captured_number(&episode_re, lower) {
        tag = Some(match tag {
            Some(prefix) => format!("{prefix}-E{num:02}"),
            None => format!("E{num:02}"),
        });
    }
    tag
}

fn number_suffix(lower: &str) -> Option<String> {
    let re = Regex::new(r"#\s*0*(\d+)").ok()?;
    captured_number(&re, lower).map(|num| format!("#{num:02}"))
}

fn captured_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn quoted_label(title: &str) -> Option<String> {
    let re = Regex::new(r"''(.*?)''").ok()?;
    let inner = re.captures(title)?.get(1)?.as_str().trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

fn compose(badge: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{badge} {suffix}"),
        None => badge.to_string(),
    }
}

/// Builds the ffmpeg drawtext chain for a thumbnail badge. Geometry is
/// relative to frame height so the badge scales with the source material.
pub(crate) fn badge_filter(label: &ThumbLabel) -> String {
    let mut filter = badge_drawtext(&label.text, "h*0.04", "h-text_h-h*0.06");
    if let Some(corner) = &label.corner {
        filter.push(',');
        filter.push_str(&badge_drawtext(corner, "w-text_w-h*0.04", "h*0.04"));
    }
    filter
}

fn badge_drawtext(text: &str, x: &str, y: &str) -> String {
    format!(
        "drawtext=text='{}':x={x}:y={y}:fontsize=h*0.06:fontcolor=white:\
         box=1:boxcolor=black@0.7:boxborderw=10",
        escape_drawtext(text)
    )
}

/// drawtext values live inside a single-quoted filter argument, where
/// backslash, colon, and the quote itself are metacharacters.
pub(crate) fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '\'' => out.push_str("'\\''"),
            _ => out.push(ch),
        }
    }
    out
}
