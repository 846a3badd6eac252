/// One content beat of a sequence.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Beat {
    /// Letter label assigned by the engine.
    pub letter: char,
    /// Signed turn count performed on this beat.
    #[serde(default)]
    pub turns: f64,
    /// Whether this beat reverses the running rotation direction.
    #[serde(default)]
    pub reversal: bool,
}

/// One record of a raw sequence as the engine writes it.
///
/// Only [`BeatRecord::Beat`] records are content; metadata and the
/// start-position sentinel are bookkeeping and never count toward length.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub enum BeatRecord {
    /// Header record the engine writes first.
    Metadata(SequenceMetadata),
    /// Start-position sentinel (the position name).
    StartPosition(String),
    /// A content beat.
    Beat(Beat),
}

/// Header metadata carried at the front of a raw sequence.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SequenceMetadata {
    /// Derived word label, if the engine filled it in.
    #[serde(default)]
    pub word: String,
    /// Author credit, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Difficulty level the sequence was generated at.
    #[serde(default)]
    pub level: u8,
}

/// Ordered beat records produced by one generation call.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RawSequence {
    records: Vec<BeatRecord>,
}

impl RawSequence {
    /// Empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn push(&mut self, record: BeatRecord) {
        self.records.push(record);
    }

    /// All records in order.
    pub fn records(&self) -> &[BeatRecord] {
        &self.records
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Whether the sequence holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Count content beats, excluding metadata and start-position sentinels.
    ///
    /// This is the number the post-generation validation gate compares against
    /// the requested length.
    pub fn content_len(&self) -> u32 {
        self.records
            .iter()
            .filter(|r| matches!(r, BeatRecord::Beat(_)))
            .count() as u32
    }

    /// Iterate content beats in order.
    pub fn beats(&self) -> impl Iterator<Item = &Beat> {
        self.records.iter().filter_map(|r| match r {
            BeatRecord::Beat(b) => Some(b),
            _ => None,
        })
    }

    /// Derive the word label from beat letters.
    pub fn word(&self) -> String {
        self.beats().map(|b| b.letter).collect()
    }
}
