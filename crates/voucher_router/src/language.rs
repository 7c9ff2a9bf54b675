//! Language detection for the four supported UI languages.
//!
//! Two heuristics live here:
//! - `detect_languages`: which scripts/languages appear in a message (prompt
//!   examples for the generative tier)
//! - `detect_ui_language`: which single language the user is probably
//!   writing in (keyword counting with per-language thresholds)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Zh,
    Bn,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Es, Language::Zh, Language::Bn];

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Zh => "zh",
            Self::Bn => "bn",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::En),
            "es" | "spanish" | "español" => Some(Self::Es),
            "zh" | "chinese" | "中文" => Some(Self::Zh),
            "bn" | "bengali" | "বাংলা" => Some(Self::Bn),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| format!("unsupported language: {}", s))
    }
}

static LATIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]").unwrap());
static SPANISH_MARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[áéíóúñ¿¡ü]").unwrap());
static CJK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[一-鿿]").unwrap());
static BENGALI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ঀ-৿]").unwrap());

const SPANISH_MARKER_WORDS: &[&str] = &["pero", "español", "hola", "ayuda", "necesito"];

static SPANISH_MARKER_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| whole_word_patterns(SPANISH_MARKER_WORDS));

/// Latin-script keywords must match whole words ("que" is not in "queens").
fn whole_word_patterns(words: &[&str]) -> Vec<Regex> {
    words
        .iter()
        .map(|w| Regex::new(&format!(r"\b{}\b", regex::escape(w))).unwrap())
        .collect()
}

/// Languages present in `message`, in `Language::ALL` order. Never empty:
/// a message with no recognizable script is treated as English.
pub fn detect_languages(message: &str) -> Vec<Language> {
    let lower = message.to_lowercase();
    let mut found = Vec::new();

    if LATIN.is_match(message) {
        found.push(Language::En);
    }
    if SPANISH_MARKS.is_match(&lower) || SPANISH_MARKER_PATTERNS.iter().any(|re| re.is_match(&lower)) {
        found.push(Language::Es);
    }
    if CJK.is_match(message) {
        found.push(Language::Zh);
    }
    if BENGALI.is_match(message) {
        found.push(Language::Bn);
    }

    if found.is_empty() {
        found.push(Language::En);
    }
    found
}

const SPANISH_KEYWORDS: &[&str] = &[
    "hola", "apartamento", "vivienda", "casa", "alquiler", "renta", "busco", "necesito",
    "ayuda", "donde", "como", "que", "soy", "tengo", "quiero", "habitacion", "habitaciones",
    "dormitorio", "precio", "costo", "dinero", "gracias", "por favor", "dime", "dame",
    "encuentro", "cuanto", "cuantas", "puedo", "puedes", "buscar", "encontrar",
];

static SPANISH_KEYWORD_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| whole_word_patterns(SPANISH_KEYWORDS));

const CHINESE_KEYWORDS: &[&str] = &[
    "你好", "公寓", "住房", "房屋", "租金", "寻找", "需要", "帮助", "在哪里", "怎么", "什么",
    "我", "有", "要", "房间", "卧室", "价格", "钱", "住房券", "布朗克斯", "布鲁克林", "曼哈顿",
    "皇后区", "谢谢", "请", "告诉", "给我", "找到",
];

const BENGALI_KEYWORDS: &[&str] = &[
    "নমস্কার", "অ্যাপার্টমেন্ট", "বাড়ি", "ভাড়া", "খুঁজছি", "প্রয়োজন", "সাহায্য", "কোথায়",
    "কিভাবে", "কি", "আমি", "আছে", "চাই", "রুম", "বেডরুম", "দাম", "টাকা", "ভাউচার", "ব্রঙ্কস",
    "ব্রুকলিন", "ম্যানহাটান", "কুইন্স", "ধন্যবাদ", "দয়া করে", "বলুন", "দিন", "খুঁজে",
];

const SPANISH_THRESHOLD: usize = 3;
const CHINESE_THRESHOLD: usize = 2;
const BENGALI_THRESHOLD: usize = 2;

/// Best guess at the language the user writes in. Spanish needs more
/// keyword hits than the others since its keywords are short and ambiguous.
pub fn detect_ui_language(message: &str) -> Language {
    let lower = message.to_lowercase();
    let count = |keywords: &[&str], haystack: &str| {
        keywords.iter().filter(|k| haystack.contains(*k)).count()
    };

    let spanish = SPANISH_KEYWORD_PATTERNS
        .iter()
        .filter(|re| re.is_match(&lower))
        .count();

    if spanish >= SPANISH_THRESHOLD {
        Language::Es
    } else if count(CHINESE_KEYWORDS, message) >= CHINESE_THRESHOLD {
        Language::Zh
    } else if count(BENGALI_KEYWORDS, message) >= BENGALI_THRESHOLD {
        Language::Bn
    } else {
        Language::En
    }
}
