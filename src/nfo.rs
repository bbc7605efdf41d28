use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

pub(crate) const AIRED_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct EpisodeMetadata {
    #[serde(default)]
    pub(crate) plot: String,
    #[serde(default)]
    pub(crate) aired: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) director: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) credits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) actors: Vec<Actor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Actor {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
}

pub(crate) fn read_aired_date(path: &Path) -> Result<Option<NaiveDate>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let xml = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut in_aired = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                in_aired = depth == 2 && element.local_name().as_ref() == b"aired";
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                in_aired = false;
            }
            Ok(Event::Text(text)) if in_aired => {
                let value = text
                    .unescape()
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                return Ok(parse_aired(value.trim()));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to parse {}", path.display()));
            }
        }
    }
}

pub(crate) fn parse_aired(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, AIRED_FORMAT).ok()
}

pub(crate) fn set_display_tags(path: &Path, display_season: u32, display_episode: u32) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let xml = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    let rewritten = rewrite_display_tags(xml, display_season, display_episode)
        .with_context(|| format!("failed to rewrite {}", path.display()))?;
    fs::write(path, rewritten).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Streams the record through untouched, replacing or appending only the
/// `displayseason`/`displayepisode` children of the root element.
pub(crate) fn rewrite_display_tags(
    xml: &str,
    display_season: u32,
    display_episode: u32,
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut depth = 0usize;
    let mut first_event = true;
    let mut skip_until: Option<Vec<u8>> = None;
    let mut seen_season = false;
    let mut seen_episode = false;

    loop {
        let event = reader.read_event()?;
        if first_event {
            if !matches!(event, Event::Decl(_)) {
                writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            }
            first_event = false;
        }

        match event {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                let is_target = depth == 1 && is_display_tag(&name);
                depth += 1;
                if skip_until.is_some() {
                    continue;
                }
                if is_target {
                    let value = display_value(&name, display_season, display_episode);
                    mark_seen(&name, &mut seen_season, &mut seen_episode);
                    write_text_element_bytes(&mut writer, &name, &value)?;
                    skip_until = Some(name);
                } else {
                    writer.write_event(Event::Start(element))?;
                }
            }
            Event::Empty(element) => {
                let name = element.local_name().as_ref().to_vec();
                if skip_until.is_some() {
                    continue;
                }
                if depth == 1 && is_display_tag(&name) {
                    let value = display_value(&name, display_season, display_episode);
                    mark_seen(&name, &mut seen_season, &mut seen_episode);
                    write_text_element_bytes(&mut writer, &name, &value)?;
                } else {
                    writer.write_event(Event::Empty(element))?;
                }
            }
            Event::End(element) => {
                depth = depth.saturating_sub(1);
                if let Some(skipped) = &skip_until {
                    if element.local_name().as_ref() == skipped.as_slice() {
                        skip_until = None;
                    }
                    continue;
                }
                if depth == 0 {
                    if !seen_season {
                        write_text_element_bytes(
                            &mut writer,
                            b"displayseason",
                            &display_season.to_string(),
                        )?;
                    }
                    if !seen_episode {
                        write_text_element_bytes(
                            &mut writer,
                            b"displayepisode",
                            &display_episode.to_string(),
                        )?;
                    }
                }
                writer.write_event(Event::End(element))?;
            }
            Event::Eof => break,
            other => {
                if skip_until.is_none() {
                    writer.write_event(other)?;
                }
            }
        }
    }

    Ok(writer.into_inner().into_inner())
}

fn is_display_tag(name: &[u8]) -> bool {
    name == b"displayseason" || name == b"displayepisode"
}

fn display_value(name: &[u8], display_season: u32, display_episode: u32) -> String {
    if name == b"displayseason" {
        display_season.to_string()
    } else {
        display_episode.to_string()
    }
}

fn mark_seen(name: &[u8], seen_season: &mut bool, seen_episode: &mut bool) {
    if name == b"displayseason" {
        *seen_season = true;
    } else {
        *seen_episode = true;
    }
}

fn write_text_element_bytes<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &[u8],
    value: &str,
) -> Result<()> {
    let name = String::from_utf8_lossy(name).into_owned();
    writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

pub(crate) fn write_episode_nfo(
    path: &Path,
    title: &str,
    season: u32,
    episode: u32,
    metadata: &EpisodeMetadata,
) -> Result<()> {
    let xml = render_episode_nfo(title, season, episode, metadata)?;
    fs::write(path, xml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub(crate) fn render_episode_nfo(
    title: &str,
    season: u32,
    episode: u32,
    metadata: &EpisodeMetadata,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("episodedetails")))?;

    write_text_element(&mut writer, "title", title)?;
    write_text_element(&mut writer, "season", &season.to_string())?;
    write_text_element(&mut writer, "episode", &episode.to_string())?;

    if !metadata.plot.is_empty() {
        write_text_element(&mut writer, "plot", &metadata.plot)?;
    }
    if !metadata.aired.is_empty() {
        write_text_element(&mut writer, "aired", &metadata.aired)?;
    }
    if let Some(rating) = metadata.rating {
        write_text_element(&mut writer, "rating", &rating.to_string())?;
    }
    if let Some(director) = &metadata.director {
        write_text_element(&mut writer, "director", director)?;
    }
    for writer_credit in &metadata.credits {
        write_text_element(&mut writer, "credits", writer_credit)?;
    }
    for actor in &metadata.actors {
        writer.write_event(Event::Start(BytesStart::new("actor")))?;
        write_text_element(&mut writer, "name", &actor.name)?;
        if let Some(role) = &actor.role {
            write_text_element(&mut writer, "role", role)?;
        }
        writer.write_event(Event::End(BytesEnd::new("actor")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("episodedetails")))?;

    Ok(writer.into_inner().into_inner())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewritten(xml: &str) -> String {
        let out = rewrite_display_tags(xml, 2, 7).expect("rewrite should succeed");
        String::from_utf8(out).expect("output should be UTF-8")
    }

    #[test]
    fn rewrite_appends_missing_display_tags() {
        let xml = "<episodedetails><title>Gag Reel</title><aired>2020-05-01</aired></episodedetails>";
        let out = rewritten(xml);
        assert!(out.contains("<title>Gag Reel</title>"));
        assert!(out.contains("<aired>2020-05-01</aired>"));
        assert!(out.contains("<displayseason>2</displayseason>"));
        assert!(out.contains("<displayepisode>7</displayepisode>"));
        assert!(out.starts_with("<?xml"));
    }

    #[test]
    fn rewrite_replaces_existing_display_tags() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                   <episodedetails><displayseason>9</displayseason>\
                   <displayepisode>99</displayepisode><title>X</title></episodedetails>";
        let out = rewritten(xml);
        assert!(out.contains("<displayseason>2</displayseason>"));
        assert!(out.contains("<displayepisode>7</displayepisode>"));
        assert!(!out.contains(">9<"));
        assert!(!out.contains(">99<"));
        assert_eq!(out.matches("displayseason").count(), 2);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let xml = "<episodedetails><title>X</title></episodedetails>";
        let once = rewritten(xml);
        let twice = rewritten(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn rewrite_handles_self_closed_display_tags() {
        let xml = "<episodedetails><displayseason/><title>X</title></episodedetails>";
        let out = rewritten(xml);
        assert!(out.contains("<displayseason>2</displayseason>"));
        assert!(out.contains("<displayepisode>7</displayepisode>"));
    }

    #[test]
    fn read_aired_date_parses_and_rejects() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("a.nfo");

        std::fs::write(
            &path,
            "<episodedetails><aired>2021-03-14</aired></episodedetails>",
        )
        .expect("write nfo");
        let aired = read_aired_date(&path).expect("nfo should parse");
        assert_eq!(aired, parse_aired("2021-03-14"));

        std::fs::write(
            &path,
            "<episodedetails><aired>next week</aired></episodedetails>",
        )
        .expect("write nfo");
        assert_eq!(read_aired_date(&path).expect("nfo should parse"), None);

        std::fs::write(&path, "<episodedetails><title>X</title></episodedetails>")
            .expect("write nfo");
        assert_eq!(read_aired_date(&path).expect("nfo should parse"), None);
    }

    #[test]
    fn set_display_tags_preserves_other_fields_on_disk() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("a.nfo");
        std::fs::write(
            &path,
            "<episodedetails><title>Interview</title><season>0</season>\
             <episode>5</episode><aired>2020-01-10</aired></episodedetails>",
        )
        .expect("write nfo");

        set_display_tags(&path, 1, 2).expect("tags should be written");
        let raw = std::fs::read_to_string(&path).expect("read nfo");
        assert!(raw.contains("<season>0</season>"));
        assert!(raw.contains("<displayseason>1</displayseason>"));
        assert!(raw.contains("<displayepisode>2</displayepisode>"));
        assert_eq!(
            read_aired_date(&path).expect("nfo should still parse"),
            parse_aired("2020-01-10")
        );
    }

    #[test]
    fn render_episode_nfo_includes_optional_fields() {
        let metadata = EpisodeMetadata {
            plot: "Cast interviews from the set.".to_string(),
            aired: "2020-05-01".to_string(),
            rating: Some(7.5),
            director: Some("J. Doe".to_string()),
            credits: vec!["A. Writer".to_string(), "B. Writer".to_string()],
            actors: vec![Actor {
                name: "C. Actor".to_string(),
                role: Some("Self".to_string()),
            }],
        };
        let out = render_episode_nfo("Making Of", 0, 1001, &metadata)
            .expect("render should succeed");
        let out = String::from_utf8(out).expect("output should be UTF-8");
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("<title>Making Of</title>"));
        assert!(out.contains("<season>0</season>"));
        assert!(out.contains("<episode>1001</episode>"));
        assert!(out.contains("<aired>2020-05-01</aired>"));
        assert!(out.contains("<rating>7.5</rating>"));
        assert_eq!(out.matches("<credits>").count(), 2);
        assert!(out.contains("<name>C. Actor</name>"));
        assert!(out.contains("<role>Self</role>"));
    }

    #[test]
    fn render_episode_nfo_escapes_markup_in_titles() {
        let out = render_episode_nfo("Tom & Jerry <live>", 0, 1000, &EpisodeMetadata::default())
            .expect("render should succeed");
        let out = String::from_utf8(out).expect("output should be UTF-8");
        assert!(out.contains("Tom &amp; Jerry &lt;live&gt;"));
    }
}
