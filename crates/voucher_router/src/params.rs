//! Canonical search parameters and the alias tables that normalize them.
//!
//! Both routing tiers go through the functions in this module, so a given
//! input string always normalizes to the same canonical value.

use serde::{Deserialize, Serialize};

pub const BEDROOMS_MAX: u8 = 10;
pub const RENT_MIN: u32 = 500;
pub const RENT_MAX: u32 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    StatenIsland,
}

/// Borough aliases in English, Chinese and Bengali. Spanish uses the English
/// names apart from "isla staten".
///
/// Bare "city" is not an alias: it collides with "city fheps".
pub static BOROUGH_ALIASES: &[(&str, Borough)] = &[
    ("manhattan", Borough::Manhattan),
    ("mnh", Borough::Manhattan),
    ("the city", Borough::Manhattan),
    ("曼哈顿", Borough::Manhattan),
    ("ম্যানহাটান", Borough::Manhattan),
    ("brooklyn", Borough::Brooklyn),
    ("bk", Borough::Brooklyn),
    ("bklyn", Borough::Brooklyn),
    ("布鲁克林", Borough::Brooklyn),
    ("ব্রুকলিন", Borough::Brooklyn),
    ("queens", Borough::Queens),
    ("qns", Borough::Queens),
    ("皇后区", Borough::Queens),
    ("皇后", Borough::Queens),
    ("কুইন্স", Borough::Queens),
    ("bronx", Borough::Bronx),
    ("the bronx", Borough::Bronx),
    ("bx", Borough::Bronx),
    ("布朗克斯", Borough::Bronx),
    ("布朗士", Borough::Bronx),
    ("ব্রংক্স", Borough::Bronx),
    ("ব্রনক্স", Borough::Bronx),
    ("ব্রঙ্কস", Borough::Bronx),
    ("staten island", Borough::StatenIsland),
    ("staten", Borough::StatenIsland),
    ("si", Borough::StatenIsland),
    ("isla staten", Borough::StatenIsland),
    ("史泰登岛", Borough::StatenIsland),
    ("স্ট্যাটেন আইল্যান্ড", Borough::StatenIsland),
];

impl Borough {
    pub const ALL: [Borough; 5] = [
        Borough::Manhattan,
        Borough::Brooklyn,
        Borough::Queens,
        Borough::Bronx,
        Borough::StatenIsland,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manhattan => "manhattan",
            Self::Brooklyn => "brooklyn",
            Self::Queens => "queens",
            Self::Bronx => "bronx",
            Self::StatenIsland => "staten_island",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Manhattan => "Manhattan",
            Self::Brooklyn => "Brooklyn",
            Self::Queens => "Queens",
            Self::Bronx => "the Bronx",
            Self::StatenIsland => "Staten Island",
        }
    }

    /// Resolve any known spelling, including the canonical `staten_island`.
    pub fn from_alias(raw: &str) -> Option<Self> {
        let key = alias_key(raw);
        BOROUGH_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, borough)| *borough)
    }
}

impl std::fmt::Display for Borough {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherType {
    #[serde(rename = "section_8")]
    Section8,
    #[serde(rename = "cityfheps")]
    CityFheps,
    #[serde(rename = "hasa")]
    Hasa,
    #[serde(rename = "dss")]
    Dss,
    #[serde(rename = "hra")]
    Hra,
    #[serde(rename = "housing_voucher")]
    HousingVoucher,
}

pub static VOUCHER_ALIASES: &[(&str, VoucherType)] = &[
    ("section 8", VoucherType::Section8),
    ("section8", VoucherType::Section8),
    ("section eight", VoucherType::Section8),
    ("sec 8", VoucherType::Section8),
    ("sec8", VoucherType::Section8),
    ("s8", VoucherType::Section8),
    ("sección 8", VoucherType::Section8),
    ("seccion 8", VoucherType::Section8),
    ("第八条", VoucherType::Section8),
    ("সেকশন ৮", VoucherType::Section8),
    ("cityfheps", VoucherType::CityFheps),
    ("city fheps", VoucherType::CityFheps),
    ("cityfeps", VoucherType::CityFheps),
    ("fheps", VoucherType::CityFheps),
    ("hasa", VoucherType::Hasa),
    ("dss", VoucherType::Dss),
    ("hra", VoucherType::Hra),
    ("housing voucher", VoucherType::HousingVoucher),
    ("housing vouchers", VoucherType::HousingVoucher),
    ("voucher", VoucherType::HousingVoucher),
    ("vouchers", VoucherType::HousingVoucher),
    ("vale", VoucherType::HousingVoucher),
    ("vales", VoucherType::HousingVoucher),
    ("vale de vivienda", VoucherType::HousingVoucher),
    ("voucher de vivienda", VoucherType::HousingVoucher),
    ("cupón de vivienda", VoucherType::HousingVoucher),
    ("住房券", VoucherType::HousingVoucher),
    ("住房补助", VoucherType::HousingVoucher),
    ("租房券", VoucherType::HousingVoucher),
    ("ভাউচার", VoucherType::HousingVoucher),
    ("হাউজিং ভাউচার", VoucherType::HousingVoucher),
    ("আবাসন ভাউচার", VoucherType::HousingVoucher),
];

impl VoucherType {
    pub const ALL: [VoucherType; 6] = [
        VoucherType::Section8,
        VoucherType::CityFheps,
        VoucherType::Hasa,
        VoucherType::Dss,
        VoucherType::Hra,
        VoucherType::HousingVoucher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section8 => "section_8",
            Self::CityFheps => "cityfheps",
            Self::Hasa => "hasa",
            Self::Dss => "dss",
            Self::Hra => "hra",
            Self::HousingVoucher => "housing_voucher",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Section8 => "Section 8",
            Self::CityFheps => "CityFHEPS",
            Self::Hasa => "HASA",
            Self::Dss => "DSS",
            Self::Hra => "HRA",
            Self::HousingVoucher => "a housing voucher",
        }
    }

    pub fn from_alias(raw: &str) -> Option<Self> {
        let key = alias_key(raw);
        VOUCHER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, voucher)| *voucher)
    }
}

impl std::fmt::Display for VoucherType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    Borough,
    Bedrooms,
    MaxRent,
    VoucherType,
}

impl ParamKey {
    pub const ALL: [ParamKey; 4] = [
        ParamKey::Borough,
        ParamKey::Bedrooms,
        ParamKey::MaxRent,
        ParamKey::VoucherType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borough => "borough",
            Self::Bedrooms => "bedrooms",
            Self::MaxRent => "max_rent",
            Self::VoucherType => "voucher_type",
        }
    }

    /// Human label used in confirmations ("bedrooms set to 2 bedrooms").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Borough => "borough",
            Self::Bedrooms => "bedrooms",
            Self::MaxRent => "max rent",
            Self::VoucherType => "voucher",
        }
    }

    /// Normalize a raw capture for this key through the shared tables.
    pub fn normalize(&self, raw: &str) -> Option<ParamValue> {
        match self {
            Self::Borough => parse_borough(raw),
            Self::Bedrooms => parse_bedrooms(raw),
            Self::MaxRent => parse_max_rent(raw),
            Self::VoucherType => parse_voucher(raw),
        }
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single canonical parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Borough(Borough),
    Bedrooms(u8),
    MaxRent(u32),
    Voucher(VoucherType),
}

impl ParamValue {
    pub fn key(&self) -> ParamKey {
        match self {
            Self::Borough(_) => ParamKey::Borough,
            Self::Bedrooms(_) => ParamKey::Bedrooms,
            Self::MaxRent(_) => ParamKey::MaxRent,
            Self::Voucher(_) => ParamKey::VoucherType,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Borough(b) => write!(f, "{}", b),
            Self::Bedrooms(0) => write!(f, "studio"),
            Self::Bedrooms(n) => write!(f, "{}", n),
            Self::MaxRent(r) => write!(f, "${}", group_thousands(*r)),
            Self::Voucher(v) => write!(f, "{}", v),
        }
    }
}

/// The accepted parameter map. Absent keys are `None`.
///
/// Deserialization rejects bedrooms and rent outside their domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchParams")]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borough: Option<Borough>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<VoucherType>,
}

#[derive(Deserialize)]
struct RawSearchParams {
    #[serde(default)]
    borough: Option<Borough>,
    #[serde(default)]
    bedrooms: Option<u64>,
    #[serde(default)]
    max_rent: Option<u64>,
    #[serde(default)]
    voucher_type: Option<VoucherType>,
}

impl TryFrom<RawSearchParams> for SearchParams {
    type Error = String;

    fn try_from(raw: RawSearchParams) -> Result<Self, Self::Error> {
        let bedrooms = raw
            .bedrooms
            .map(|n| {
                u8::try_from(n)
                    .ok()
                    .filter(|n| *n <= BEDROOMS_MAX)
                    .ok_or_else(|| format!("bedrooms {} outside 0..={}", n, BEDROOMS_MAX))
            })
            .transpose()?;
        let max_rent = raw
            .max_rent
            .map(|r| {
                u32::try_from(r)
                    .ok()
                    .filter(|r| (RENT_MIN..=RENT_MAX).contains(r))
                    .ok_or_else(|| format!("max_rent {} outside {}..={}", r, RENT_MIN, RENT_MAX))
            })
            .transpose()?;

        Ok(Self {
            borough: raw.borough,
            bedrooms,
            max_rent,
            voucher_type: raw.voucher_type,
        })
    }
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ParamKey) -> Option<ParamValue> {
        match key {
            ParamKey::Borough => self.borough.map(ParamValue::Borough),
            ParamKey::Bedrooms => self.bedrooms.map(ParamValue::Bedrooms),
            ParamKey::MaxRent => self.max_rent.map(ParamValue::MaxRent),
            ParamKey::VoucherType => self.voucher_type.map(ParamValue::Voucher),
        }
    }

    pub fn set(&mut self, value: ParamValue) {
        match value {
            ParamValue::Borough(b) => self.borough = Some(b),
            ParamValue::Bedrooms(n) => self.bedrooms = Some(n),
            ParamValue::MaxRent(r) => self.max_rent = Some(r),
            ParamValue::Voucher(v) => self.voucher_type = Some(v),
        }
    }

    pub fn with(mut self, value: ParamValue) -> Self {
        self.set(value);
        self
    }

    pub fn remove(&mut self, key: ParamKey) -> Option<ParamValue> {
        let old = self.get(key);
        match key {
            ParamKey::Borough => self.borough = None,
            ParamKey::Bedrooms => self.bedrooms = None,
            ParamKey::MaxRent => self.max_rent = None,
            ParamKey::VoucherType => self.voucher_type = None,
        }
        old
    }

    /// Copy of these params without `key`.
    pub fn without(&self, key: ParamKey) -> Self {
        let mut copy = self.clone();
        copy.remove(key);
        copy
    }

    /// Present values in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = ParamValue> + '_ {
        ParamKey::ALL.into_iter().filter_map(move |k| self.get(k))
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite with every value present in `other`.
    pub fn merge(&mut self, other: &SearchParams) {
        for value in other.iter() {
            self.set(value);
        }
    }

    pub fn merged(&self, other: &SearchParams) -> Self {
        let mut copy = self.clone();
        copy.merge(other);
        copy
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ParamValue> for SearchParams {
    fn from_iter<I: IntoIterator<Item = ParamValue>>(iter: I) -> Self {
        let mut params = SearchParams::new();
        for value in iter {
            params.set(value);
        }
        params
    }
}

/// Lowercase, treat `_` and `-` as spaces, collapse whitespace.
pub fn alias_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_borough(raw: &str) -> Option<ParamValue> {
    Borough::from_alias(raw).map(ParamValue::Borough)
}

pub fn parse_voucher(raw: &str) -> Option<ParamValue> {
    VoucherType::from_alias(raw).map(ParamValue::Voucher)
}

pub fn parse_bedrooms(raw: &str) -> Option<ParamValue> {
    normalize_bedrooms(raw).map(ParamValue::Bedrooms)
}

pub fn parse_max_rent(raw: &str) -> Option<ParamValue> {
    normalize_rent(raw).map(ParamValue::MaxRent)
}

/// Bedroom count from a digit, an English/Spanish/Chinese number word or
/// `studio`. Out-of-range counts yield `None`.
pub fn normalize_bedrooms(raw: &str) -> Option<u8> {
    let word = ascii_digits(&raw.trim().to_lowercase());
    let count: u8 = match word.as_str() {
        "studio" | "estudio" | "studios" => 0,
        "one" | "uno" | "una" | "un" | "一" => 1,
        "two" | "dos" | "二" | "两" => 2,
        "three" | "tres" | "三" => 3,
        "four" | "cuatro" | "四" => 4,
        "five" | "cinco" | "五" => 5,
        "six" | "seis" | "六" => 6,
        other => other.parse().ok()?,
    };
    (count <= BEDROOMS_MAX).then_some(count)
}

/// Monthly rent in whole dollars from strings like `$2,500`, `2.5k` or
/// `1800`. Values outside `[RENT_MIN, RENT_MAX]` yield `None`.
pub fn normalize_rent(raw: &str) -> Option<u32> {
    let cleaned: String = ascii_digits(&raw.to_lowercase())
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    let (number, multiplier) = match cleaned.strip_suffix('k') {
        Some(stripped) => (stripped, 1000.0),
        None => (cleaned.as_str(), 1.0),
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let dollars = (value * multiplier).round();
    if dollars < RENT_MIN as f64 || dollars > RENT_MAX as f64 {
        return None;
    }
    Some(dollars as u32)
}

/// Map Bengali digits to ASCII; everything else passes through.
fn ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '০'..='৯' => char::from(b'0' + (c as u32 - '০' as u32) as u8),
            _ => c,
        })
        .collect()
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
