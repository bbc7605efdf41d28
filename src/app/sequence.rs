use std::path::PathBuf;

use chrono::NaiveDate;

use crate::cache::DisplayCache;

/// Specials at or above this episode number are manually placed catalog
/// extras and never take part in chronological sequencing.
pub(crate) const OUT_OF_BAND_EPISODE: u32 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EpisodeRecord {
    pub(crate) path: PathBuf,
    pub(crate) season: u32,
    pub(crate) episode: u32,
    pub(crate) aired: NaiveDate,
    pub(crate) cached: Option<DisplayCache>,
}

impl EpisodeRecord {
    pub(crate) fn is_special(&self) -> bool {
        self.season == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exclusion {
    OutOfBandSpecial,
    MissingAirDate,
}

impl Exclusion {
    pub(crate) fn reason(self) -> String {
        match self {
            Exclusion::OutOfBandSpecial => {
                format!("out-of-band special, episode >= {OUT_OF_BAND_EPISODE}")
            }
            Exclusion::MissingAirDate => "no resolvable air date".to_string(),
        }
    }
}

/// Rule order matters: out-of-band specials are excluded before the air date
/// is ever considered, so a date-less E10000+ special reports as out-of-band.
pub(crate) fn check_eligibility(
    season: u32,
    episode: u32,
    aired: Option<NaiveDate>,
) -> Result<NaiveDate, Exclusion> {
    if season == 0 && episode >= OUT_OF_BAND_EPISODE {
        return Err(Exclusion::OutOfBandSpecial);
    }
    aired.ok_or(Exclusion::MissingAirDate)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DisplayPosition {
    pub(crate) season: u32,
    pub(crate) episode: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SequencedEpisode {
    pub(crate) record: EpisodeRecord,
    /// None when no regular episode preceded the record in air order, so no
    /// season context exists yet. Season 0 can never stand in for that state.
    pub(crate) display: Option<DisplayPosition>,
}

/// Merges regular episodes and specials into one air-date-ordered sequence
/// and assigns gapless display positions. Season boundaries come from
/// regular records only; a special inherits whatever season is current.
pub(crate) fn sequence_episodes(mut records: Vec<EpisodeRecord>) -> Vec<SequencedEpisode> {
    // Stable sort: records tied on all three keys keep their input order.
    records.sort_by_key(|record| (record.aired, record.season, record.episode));

    let mut current_season: Option<u32> = None;
    let mut counter = 0u32;
    let mut sequenced = Vec::with_capacity(records.len());

    for record in records {
        if !record.is_special() && current_season != Some(record.season) {
            current_season = Some(record.season);
            counter = 0;
        }

        let display = current_season.map(|season| {
            counter += 1;
            DisplayPosition {
                season,
                episode: counter,
            }
        });

        sequenced.push(SequencedEpisode { record, display });
    }

    sequenced
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteDecision {
    Write,
    Skip,
}

/// Skip only when the cached display pair matches the computed one exactly.
/// Anything else, including a missing cache, forces a write.
pub(crate) fn decide_write(
    computed: DisplayPosition,
    cached: Option<&DisplayCache>,
) -> WriteDecision {
    match cached {
        Some(cache)
            if cache.display_season == computed.season
                && cache.display_episode == computed.episode =>
        {
            WriteDecision::Skip
        }
        _ => WriteDecision::Write,
    }
}
