//! Viseme classification for lip-sync animation.
//!
//! A viseme is a visual mouth shape bound to a class of sounds. This
//! module maps single Vietnamese characters (bare and diacritic forms)
//! to the fixed 20-entry viseme chart used by the mouth-shape assets.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Mouth-shape identifiers, numbered to match the lip image assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Viseme {
    /// a, ă and their diacritic forms (mouth open wide)
    A = 1,
    /// v, p, f (teeth on lip)
    V = 2,
    /// u, ô and diacritics (rounded, small)
    U = 3,
    /// x, s (teeth together)
    X = 4,
    /// đ, l, n, d (tongue at roof)
    D = 5,
    /// m, b (lips pressed together)
    M = 6,
    /// e, ê, i, y and diacritics (mouth wide, teeth apart)
    E = 7,
    /// ư and diacritics (unrounded back vowel)
    Uh = 8,
    /// â, ơ and diacritics (mid central)
    Oh = 9,
    /// k, c (back of tongue up)
    K = 10,
    /// r (tongue curled)
    R = 11,
    /// o, q and diacritics (rounded, medium)
    O = 12,
    /// Expression pose, never produced by classification
    Smirk = 13,
    /// Expression pose, never produced by classification
    Sad = 14,
    /// t (tongue behind teeth)
    T = 15,
    /// Reserved chart slot, never produced by classification
    Cd = 16,
    /// Silence / rest pose (default)
    Neutral = 17,
    /// Expression pose, never produced by classification
    Smile = 18,
    /// h (open, breathy)
    H = 19,
    /// g (velar, slight open)
    G = 20,
}

struct VisemeEntry {
    viseme: Viseme,
    label: &'static str,
    chars: &'static [char],
}

/// Character sets are disjoint: the reference chart lists `p` under both
/// the V and M shapes, resolved here in favor of V (its scan order).
static VISEME_TABLE: &[VisemeEntry] = &[
    VisemeEntry {
        viseme: Viseme::A,
        label: "A, Ă",
        chars: &[
            'a', 'ă', 'á', 'à', 'ả', 'ã', 'ạ', 'ắ', 'ằ', 'ẳ', 'ẵ', 'ặ',
        ],
    },
    VisemeEntry {
        viseme: Viseme::V,
        label: "V, PH",
        chars: &['v', 'p', 'f'],
    },
    VisemeEntry {
        viseme: Viseme::U,
        label: "U, Ô",
        chars: &[
            'u', 'ô', 'ú', 'ù', 'ủ', 'ũ', 'ụ', 'ố', 'ồ', 'ổ', 'ỗ', 'ộ',
        ],
    },
    VisemeEntry {
        viseme: Viseme::X,
        label: "X, S",
        chars: &['x', 's'],
    },
    VisemeEntry {
        viseme: Viseme::D,
        label: "Đ, L, N",
        chars: &['đ', 'l', 'n', 'd'],
    },
    VisemeEntry {
        viseme: Viseme::M,
        label: "M, B, P",
        chars: &['m', 'b'],
    },
    VisemeEntry {
        viseme: Viseme::E,
        label: "E, Ê, I, Y",
        chars: &[
            'e', 'ê', 'i', 'y', 'é', 'è', 'ẻ', 'ẽ', 'ẹ', 'ế', 'ề', 'ể', 'ễ', 'ệ', 'í', 'ì', 'ỉ',
            'ĩ', 'ị', 'ý', 'ỳ', 'ỷ', 'ỹ', 'ỵ',
        ],
    },
    VisemeEntry {
        viseme: Viseme::Uh,
        label: "Ư",
        chars: &['ư', 'ứ', 'ừ', 'ử', 'ữ', 'ự'],
    },
    VisemeEntry {
        viseme: Viseme::Oh,
        label: "Â, Ơ",
        chars: &[
            'â', 'ơ', 'ấ', 'ầ', 'ẩ', 'ẫ', 'ậ', 'ớ', 'ờ', 'ở', 'ỡ', 'ợ',
        ],
    },
    VisemeEntry {
        viseme: Viseme::K,
        label: "K, C",
        chars: &['k', 'c'],
    },
    VisemeEntry {
        viseme: Viseme::R,
        label: "R",
        chars: &['r'],
    },
    VisemeEntry {
        viseme: Viseme::O,
        label: "O, Q",
        chars: &['o', 'q', 'ó', 'ò', 'ỏ', 'õ', 'ọ'],
    },
    VisemeEntry {
        viseme: Viseme::Smirk,
        label: "SMIRK",
        chars: &[],
    },
    VisemeEntry {
        viseme: Viseme::Sad,
        label: "SAD",
        chars: &[],
    },
    VisemeEntry {
        viseme: Viseme::T,
        label: "TH, T",
        chars: &['t'],
    },
    VisemeEntry {
        viseme: Viseme::Cd,
        label: "C, D",
        chars: &[],
    },
    VisemeEntry {
        viseme: Viseme::Neutral,
        label: "NEUTRAL",
        chars: &[],
    },
    VisemeEntry {
        viseme: Viseme::Smile,
        label: "SMILE",
        chars: &[],
    },
    VisemeEntry {
        viseme: Viseme::H,
        label: "H",
        chars: &['h'],
    },
    VisemeEntry {
        viseme: Viseme::G,
        label: "G",
        chars: &['g'],
    },
];

/// Vietnamese vowel inventory, bare and diacritic forms. Membership here
/// decides nucleus vs. onset/coda during syllable expansion; it is a
/// larger set than any single viseme's character list.
pub const VOWELS: &str = "aăâeêioôơuưyáàảãạắằẳẵặấầẩẫậéèẻẽẹếềểễệíìỉĩịóòỏõọốồổỗộớờởỡợúùủũụứừửữựýỳỷỹỵ";

fn char_index() -> &'static HashMap<char, Viseme> {
    static INDEX: OnceLock<HashMap<char, Viseme>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for entry in VISEME_TABLE {
            for &ch in entry.chars {
                map.entry(ch).or_insert(entry.viseme);
            }
        }
        map
    })
}

impl Viseme {
    /// Human-readable chart label for this viseme.
    pub fn label(&self) -> &'static str {
        VISEME_TABLE
            .iter()
            .find(|e| e.viseme == *self)
            .map(|e| e.label)
            .unwrap_or("NEUTRAL")
    }

    /// Numeric asset id (1..=20).
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Look up a viseme by its numeric asset id.
    pub fn from_id(id: u8) -> Option<Viseme> {
        VISEME_TABLE.iter().map(|e| e.viseme).find(|v| v.id() == id)
    }

    /// Chart display order used by the reference mouth-shape sheet:
    /// speech shapes first, then neutral and the expression poses.
    pub fn chart_order() -> [Viseme; 20] {
        use Viseme::*;
        [
            A, V, U, X, D, M, E, Uh, Oh, K, R, O, T, Cd, H, G, Neutral, Smirk, Sad, Smile,
        ]
    }
}

/// Classify a single-character token into a viseme.
///
/// The input is trimmed and case-folded before lookup. Empty or
/// whitespace input, multi-character input, and characters outside
/// every declared set all resolve to [`Viseme::Neutral`]. Total and
/// pure: never fails, no side effects.
pub fn classify(token: &str) -> Viseme {
    let folded = token.trim().to_lowercase();
    let mut chars = folded.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => *char_index().get(&ch).unwrap_or(&Viseme::Neutral),
        _ => Viseme::Neutral,
    }
}

/// Whether a character counts as a vowel for syllable expansion.
pub fn is_vowel(ch: char) -> bool {
    VOWELS.contains(ch)
}

/// Whether a character belongs to the Latin + Vietnamese letter class.
/// Anything outside it (punctuation, digits, symbols) splits syllables.
pub fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ('\u{00C0}'..='\u{1EF9}').contains(&ch)
}
