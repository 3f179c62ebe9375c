//! Domain models for the archive.
//!
//! - [`YearEntry`] - One band's participation in one year
//! - [`MemberRecord`] - A band member parsed from the MEMBER column
//! - [`MusicPiece`] - A performed piece, optionally with soloists
//! - [`SoloistRecord`] - A member featured on one piece
//! - [`StoredEntry`] - A `YearEntry` with the identity assigned by the store
//! - [`HistoryDataset`] - The public `{ stats, data }` document

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Leader Glyphs
// =============================================================================

/// Role glyphs that may prefix a member's instrument code.
pub const LEADER_GLYPHS: [char; 4] = ['★', '◆', '●', '◎'];

/// Role denoted by a leader glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderGlyph {
    /// ★
    Leader,
    /// ◆
    SubLeader,
    /// ●
    SectionLeader,
    /// ◎
    SpecialMember,
}

impl LeaderGlyph {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '★' => Some(Self::Leader),
            '◆' => Some(Self::SubLeader),
            '●' => Some(Self::SectionLeader),
            '◎' => Some(Self::SpecialMember),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Leader => '★',
            Self::SubLeader => '◆',
            Self::SectionLeader => '●',
            Self::SpecialMember => '◎',
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Leader => "Leader",
            Self::SubLeader => "Sub-leader",
            Self::SectionLeader => "Section leader",
            Self::SpecialMember => "Special member",
        }
    }
}

/// Describe every glyph in a symbol run. Unknown characters are echoed back.
pub fn describe_symbols(symbols: &str) -> Vec<String> {
    symbols
        .chars()
        .map(|c| match LeaderGlyph::from_char(c) {
            Some(glyph) => glyph.describe().to_string(),
            None => c.to_string(),
        })
        .collect()
}

// =============================================================================
// Instruments
// =============================================================================

/// Expand a short instrument code to its full name.
///
/// Unknown codes (including compound ones such as `B・Vo`) are returned as-is.
pub fn normalize_instrument(code: &str) -> &str {
    match code {
        "ASx" | "Asx" => "Alto Saxophone",
        "TSx" | "Tsx" => "Tenor Saxophone",
        "BSx" | "Bsx" => "Baritone Saxophone",
        "Tp" => "Trumpet",
        "Tb" => "Trombone",
        "BTb" => "Bass Trombone",
        "P" | "Pf" => "Piano",
        "B" => "Bass",
        "G" => "Guitar",
        "D" | "Ds" => "Drums",
        "Vo" => "Vocal",
        "MC" => "MC",
        "Cl" => "Clarinet",
        other => other,
    }
}

// =============================================================================
// Member
// =============================================================================

/// A band member as listed in the MEMBER column.
///
/// Fields that could not be extracted are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Set by the admin UI; soloists may refer to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Leader/role glyphs, possibly empty.
    #[serde(default)]
    pub symbols: String,
    /// Short instrument code, e.g. `Tb` or `B・Vo`.
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub name: String,
    /// University or other affiliation.
    #[serde(default, rename = "university", alias = "affiliation")]
    pub affiliation: String,
}

impl MemberRecord {
    pub fn leader_glyphs(&self) -> Vec<LeaderGlyph> {
        self.symbols.chars().filter_map(LeaderGlyph::from_char).collect()
    }

    /// Render the member the way the source sheet writes it:
    /// `★Tb 田中 太郎（大阪大 工3）`.
    pub fn display_line(&self) -> String {
        format!(
            "{}{} {}（{}）",
            self.symbols, self.instrument, self.name, self.affiliation
        )
    }
}

// =============================================================================
// Music
// =============================================================================

/// A member singled out for a solo on one piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloistRecord {
    /// Member identifier or positional index into the entry's member list.
    #[serde(default, rename = "memberId", alias = "memberRef")]
    pub member_ref: String,
    #[serde(default)]
    pub member_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// A performed piece.
///
/// Deserializes from either the current `{ title, soloists }` object or the
/// legacy bare-string form, see [`PieceRepr`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PieceRepr")]
pub struct MusicPiece {
    pub title: String,
    pub soloists: Vec<SoloistRecord>,
}

/// Current object shape of a piece.
#[derive(Debug, Clone, Deserialize)]
pub struct PieceFields {
    pub title: String,
    #[serde(default)]
    pub soloists: Vec<SoloistRecord>,
}

/// Every shape a stored piece has been written in.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PieceRepr {
    Current(PieceFields),
    Legacy(String),
}

impl MusicPiece {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            soloists: Vec::new(),
        }
    }

    /// Upgrade any stored shape to the current one.
    pub fn upgrade(repr: PieceRepr) -> Self {
        match repr {
            PieceRepr::Current(fields) => Self {
                title: fields.title,
                soloists: fields.soloists,
            },
            PieceRepr::Legacy(raw) => Self::from_legacy(raw),
        }
    }

    /// A legacy string may itself be a JSON-encoded piece (double-encoded
    /// storage). Anything else is a plain title.
    fn from_legacy(raw: String) -> Self {
        match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Object(_)) => match serde_json::from_value::<PieceFields>(value) {
                Ok(fields) => Self::upgrade(PieceRepr::Current(fields)),
                Err(_) => Self::new(raw),
            },
            Ok(Value::String(inner)) => Self::from_legacy(inner),
            _ => Self::new(raw),
        }
    }
}

impl From<PieceRepr> for MusicPiece {
    fn from(repr: PieceRepr) -> Self {
        Self::upgrade(repr)
    }
}

// =============================================================================
// Year Entry
// =============================================================================

/// One band's participation in one year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearEntry {
    pub year: i32,
    pub band: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solo_prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub musics: Vec<MusicPiece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url2: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

impl YearEntry {
    pub fn new(year: i32, band: impl Into<String>) -> Self {
        Self {
            year,
            band: band.into(),
            ..Self::default()
        }
    }

    /// Trim scalar fields and turn blank optionals into "not set".
    ///
    /// Admin payloads send `""` for cleared fields.
    pub fn tidy(mut self) -> Self {
        self.band = self.band.trim().to_string();
        for field in [
            &mut self.prize,
            &mut self.solo_prize,
            &mut self.image_path,
            &mut self.url1,
            &mut self.url2,
        ] {
            *field = field
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
        self
    }

    /// Whether any member plays `instrument`, by code or by full name.
    pub fn has_instrument(&self, instrument: &str) -> bool {
        self.members.iter().any(|m| {
            m.instrument == instrument || normalize_instrument(&m.instrument) == instrument
        })
    }
}

/// A year entry together with the identity assigned by the store.
///
/// Timestamps keep their snake_case names; the flattened entry is camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: String,
    #[serde(flatten)]
    pub entry: YearEntry,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// History Dataset
// =============================================================================

/// Inclusive span of years covered by a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

/// Summary statistics over a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_years: usize,
    pub year_range: YearRange,
    /// Distinct band names, sorted.
    pub bands: Vec<String>,
    pub total_musics: usize,
    pub total_members: usize,
}

/// The public history document: `{ stats, data }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDataset {
    pub stats: HistoryStats,
    /// Entries sorted by year, newest first.
    pub data: Vec<YearEntry>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_piece_upgrade() {
        let piece: MusicPiece = serde_json::from_value(json!("Song A")).unwrap();
        assert_eq!(piece, MusicPiece::new("Song A"));
        assert!(piece.soloists.is_empty());
    }

    #[test]
    fn test_current_piece_is_identity() {
        let original = MusicPiece {
            title: "Moanin'".into(),
            soloists: vec![SoloistRecord {
                member_ref: "3".into(),
                member_name: "田中 太郎".into(),
                instrument: Some("Tb".into()),
                is_featured: true,
            }],
        };
        let value = serde_json::to_value(&original).unwrap();
        let back: MusicPiece = serde_json::from_value(value).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_double_encoded_piece() {
        let encoded = r#"{"title":"Spain","soloists":[]}"#;
        let piece: MusicPiece = serde_json::from_value(json!(encoded)).unwrap();
        assert_eq!(piece.title, "Spain");

        let twice = serde_json::to_string(encoded).unwrap();
        let piece: MusicPiece = serde_json::from_value(json!(twice)).unwrap();
        assert_eq!(piece.title, "Spain");
    }

    #[test]
    fn test_numeric_looking_title_stays_a_title() {
        let piece: MusicPiece = serde_json::from_value(json!("1999")).unwrap();
        assert_eq!(piece.title, "1999");
    }

    #[test]
    fn test_soloist_accepts_member_ref_alias() {
        let soloist: SoloistRecord =
            serde_json::from_value(json!({ "memberRef": "0", "memberName": "A" })).unwrap();
        assert_eq!(soloist.member_ref, "0");
        assert!(!soloist.is_featured);

        let value = serde_json::to_value(&soloist).unwrap();
        assert_eq!(value["memberId"], "0");
        assert!(value.get("instrument").is_none());
    }

    #[test]
    fn test_member_serializes_affiliation_as_university() {
        let member = MemberRecord {
            symbols: "★".into(),
            instrument: "Tb".into(),
            name: "田中 太郎".into(),
            affiliation: "大阪大 工3".into(),
            ..MemberRecord::default()
        };
        let value = serde_json::to_value(&member).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["university"], "大阪大 工3");
        assert_eq!(member.display_line(), "★Tb 田中 太郎（大阪大 工3）");
        assert_eq!(member.leader_glyphs(), vec![LeaderGlyph::Leader]);
    }

    #[test]
    fn test_entry_omits_unset_fields() {
        let entry = YearEntry::new(2005, "The New Wave Jazz Orchestra");
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("prize").is_none());
        assert!(value.get("soloPrize").is_none());
        assert_eq!(value["musics"], json!([]));
    }

    #[test]
    fn test_entry_accepts_legacy_musics() {
        let entry: YearEntry = serde_json::from_value(json!({
            "year": 1998,
            "band": "Blue Notes",
            "musics": ["Song A", { "title": "Song B", "soloists": [] }],
            "members": []
        }))
        .unwrap();
        assert_eq!(entry.musics[0], MusicPiece::new("Song A"));
        assert_eq!(entry.musics[1], MusicPiece::new("Song B"));
    }

    #[test]
    fn test_tidy_clears_blank_optionals() {
        let mut entry = YearEntry::new(2012, "  Blue Notes ");
        entry.prize = Some("  ".into());
        entry.url1 = Some(" https://example.org/v ".into());
        let entry = entry.tidy();
        assert_eq!(entry.band, "Blue Notes");
        assert_eq!(entry.prize, None);
        assert_eq!(entry.url1.as_deref(), Some("https://example.org/v"));
    }

    #[test]
    fn test_stored_entry_flattens() {
        let stored = StoredEntry {
            id: "abc".into(),
            entry: YearEntry::new(2001, "Band"),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["year"], 2001);
        assert_eq!(value["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(value["updated_at"], "2024-01-01T00:00:00Z");
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_member_id_survives_round_trip() {
        let payload = json!({
            "year": 2005,
            "band": "Blue Notes",
            "members": [{ "id": "m1", "instrument": "Tb", "name": "X" }],
            "musics": [{ "title": "Song A", "soloists": [{ "memberId": "m1", "memberName": "X" }] }]
        });
        let entry: YearEntry = serde_json::from_value(payload).unwrap();
        assert_eq!(entry.members[0].id.as_deref(), Some("m1"));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["members"][0]["id"], "m1");
        assert_eq!(
            value["musics"][0]["soloists"][0]["memberId"],
            value["members"][0]["id"]
        );
    }

    #[test]
    fn test_instrument_lookup() {
        assert_eq!(normalize_instrument("Tb"), "Trombone");
        assert_eq!(normalize_instrument("B・Vo"), "B・Vo");
        assert_eq!(describe_symbols("★x"), vec!["Leader".to_string(), "x".to_string()]);
    }
}
