//! Legacy code-page resolution.
//!
//! Header byte 29 (the "language driver") names the code page that character
//! fields were written in. The table below maps each known driver byte to a
//! numeric code page, which then resolves to a [`TextEncoding`]: Windows,
//! CJK and Macintosh pages go through `encoding_rs`, the DOS OEM pages
//! through the `oem_cp` tables. Resolution is total: byte 0x57 ("current
//! ANSI"), unknown bytes, and the few pages neither crate carries (895, 620,
//! 10006, 10029) fall back to a default.

use std::fmt;

use encoding_rs::{
    BIG5, EUC_KR, Encoding, GBK, IBM866, MACINTOSH, SHIFT_JIS, UTF_8_INIT, WINDOWS_874,
    WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1257,
    X_MAC_CYRILLIC,
};
use oem_cp::OEMCPHashMap;
use oem_cp::code_table::{DECODING_TABLE_CP_MAP, ENCODING_TABLE_CP_MAP};
use oem_cp::code_table_type::TableType;

/// Encoding used when the driver byte does not resolve.
pub static DEFAULT_ENCODING: TextEncoding = TextEncoding::Standard(&UTF_8_INIT);

/// Driver byte meaning "whatever the current ANSI code page is".
pub const CURRENT_ANSI: u8 = 0x57;

/// Driver byte to code page, sorted by driver byte.
const CODE_PAGES: &[(u8, u16)] = &[
    (0x01, 437),   // US MS-DOS
    (0x02, 850),   // International MS-DOS
    (0x03, 1252),  // Windows ANSI Latin I
    (0x04, 10000), // Standard Macintosh
    (0x08, 865),   // Danish OEM
    (0x09, 437),   // Dutch OEM
    (0x0A, 850),   // Dutch OEM*
    (0x0B, 437),   // Finnish OEM
    (0x0D, 437),   // French OEM
    (0x0E, 850),   // French OEM*
    (0x0F, 437),   // German OEM
    (0x10, 850),   // German OEM*
    (0x11, 437),   // Italian OEM
    (0x12, 850),   // Italian OEM*
    (0x13, 932),   // Japanese Shift-JIS
    (0x14, 850),   // Spanish OEM*
    (0x15, 437),   // Swedish OEM
    (0x16, 850),   // Swedish OEM*
    (0x17, 865),   // Norwegian OEM
    (0x18, 437),   // Spanish OEM
    (0x19, 437),   // English OEM (Great Britain)
    (0x1A, 850),   // English OEM (Great Britain)*
    (0x1B, 437),   // English OEM (US)
    (0x1C, 863),   // French OEM (Canada)
    (0x1D, 850),   // French OEM*
    (0x1F, 852),   // Czech OEM
    (0x22, 852),   // Hungarian OEM
    (0x23, 852),   // Polish OEM
    (0x24, 860),   // Portuguese OEM
    (0x25, 850),   // Portuguese OEM*
    (0x26, 866),   // Russian OEM
    (0x37, 850),   // English OEM (US)*
    (0x40, 852),   // Romanian OEM
    (0x4D, 936),   // Chinese GBK (PRC)
    (0x4E, 949),   // Korean (ANSI/OEM)
    (0x4F, 950),   // Chinese Big5 (Taiwan)
    (0x50, 874),   // Thai (ANSI/OEM)
    (0x58, 1252),  // Western European ANSI
    (0x59, 1252),  // Spanish ANSI
    (0x64, 852),   // Eastern European MS-DOS
    (0x65, 866),   // Russian MS-DOS
    (0x66, 865),   // Nordic MS-DOS
    (0x67, 861),   // Icelandic MS-DOS
    (0x68, 895),   // Kamenicky (Czech) MS-DOS
    (0x69, 620),   // Mazovia (Polish) MS-DOS
    (0x6A, 737),   // Greek MS-DOS (437G)
    (0x6B, 857),   // Turkish MS-DOS
    (0x6C, 863),   // French-Canadian MS-DOS
    (0x78, 950),   // Taiwan Big 5
    (0x79, 949),   // Hangul (Wansung)
    (0x7A, 936),   // PRC GBK
    (0x7B, 932),   // Japanese Shift-JIS
    (0x7C, 874),   // Thai Windows/MS-DOS
    (0x86, 737),   // Greek OEM
    (0x87, 852),   // Slovenian OEM
    (0x88, 857),   // Turkish OEM
    (0x96, 10007), // Russian Macintosh
    (0x97, 10029), // Eastern European Macintosh
    (0x98, 10006), // Greek Macintosh
    (0xC8, 1250),  // Eastern European Windows
    (0xC9, 1251),  // Russian Windows
    (0xCA, 1254),  // Turkish Windows
    (0xCB, 1253),  // Greek Windows
    (0xCC, 1257),  // Baltic Windows
];

/// DOS code pages decoded through `oem_cp`, with their display names.
const OEM_NAMES: &[(u16, &str)] = &[
    (437, "IBM437"),
    (720, "IBM720"),
    (737, "IBM737"),
    (775, "IBM775"),
    (850, "IBM850"),
    (852, "IBM852"),
    (855, "IBM855"),
    (857, "IBM857"),
    (858, "IBM00858"),
    (860, "IBM860"),
    (861, "IBM861"),
    (862, "IBM862"),
    (863, "IBM863"),
    (864, "IBM864"),
    (865, "IBM865"),
    (869, "IBM869"),
];

/// A single-byte DOS code page backed by `oem_cp` tables.
#[derive(Clone, Copy)]
pub struct OemCodePage {
    code_page: u16,
    name: &'static str,
    decoding: &'static TableType,
    encoding: &'static OEMCPHashMap<char, u8>,
}

impl OemCodePage {
    /// Look up a DOS code page by number.
    #[must_use]
    pub fn new(code_page: u16) -> Option<Self> {
        let &(_, name) = OEM_NAMES.iter().find(|(cp, _)| *cp == code_page)?;
        Some(Self {
            code_page,
            name,
            decoding: DECODING_TABLE_CP_MAP.get(&code_page)?,
            encoding: *ENCODING_TABLE_CP_MAP.get(&code_page)?,
        })
    }

    #[must_use]
    pub const fn code_page(&self) -> u16 {
        self.code_page
    }
}

impl fmt::Debug for OemCodePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OemCodePage").field(&self.code_page).finish()
    }
}

impl PartialEq for OemCodePage {
    fn eq(&self, other: &Self) -> bool {
        self.code_page == other.code_page
    }
}

impl Eq for OemCodePage {}

/// Character set used to decode and encode text fields and memo payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// A WHATWG encoding from `encoding_rs`.
    Standard(&'static Encoding),
    /// A DOS OEM code page.
    Oem(OemCodePage),
}

impl TextEncoding {
    /// Resolve a numeric code page, preferring `encoding_rs` where both carry it.
    #[must_use]
    pub fn for_code_page(code_page: u16) -> Option<Self> {
        encoding_for_code_page(code_page)
            .map(Self::Standard)
            .or_else(|| OemCodePage::new(code_page).map(Self::Oem))
    }

    /// Look up an encoding by WHATWG label (`"cp1251"`, `"latin1"`) or by a
    /// DOS page name (`"cp437"`, `"ibm850"`, `"437"`).
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return Some(Self::Standard(encoding));
        }
        let lower = label.to_ascii_lowercase();
        let digits = ["x-ibm", "ibm-", "ibm", "cp", "oem"]
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix))
            .unwrap_or(lower.as_str());
        Self::for_code_page(digits.parse().ok()?)
    }

    /// Canonical name, as reported in logs and metadata listings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard(encoding) => encoding.name(),
            Self::Oem(page) => page.name,
        }
    }

    /// Decode bytes; malformed or undefined bytes become U+FFFD.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Standard(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
            Self::Oem(page) => page.decoding.decode_string_lossy(bytes),
        }
    }

    /// Encode text, or `None` if any character has no mapping.
    #[must_use]
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Standard(encoding) => {
                let (bytes, _, unmappable) = encoding.encode(text);
                (!unmappable).then(|| bytes.into_owned())
            }
            Self::Oem(page) => oem_cp::encode_string_checked(text, page.encoding),
        }
    }
}

impl From<&'static Encoding> for TextEncoding {
    fn from(encoding: &'static Encoding) -> Self {
        Self::Standard(encoding)
    }
}

impl PartialEq<&'static Encoding> for TextEncoding {
    fn eq(&self, other: &&'static Encoding) -> bool {
        matches!(self, Self::Standard(encoding) if encoding == other)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up the code page a driver byte names.
///
/// Returns `None` for [`CURRENT_ANSI`] and for bytes outside the table.
#[must_use]
pub fn code_page(driver: u8) -> Option<u16> {
    CODE_PAGES
        .binary_search_by_key(&driver, |&(byte, _)| byte)
        .ok()
        .map(|idx| CODE_PAGES[idx].1)
}

/// Map a numeric code page to an encoding `encoding_rs` can decode.
#[must_use]
pub fn encoding_for_code_page(code_page: u16) -> Option<&'static Encoding> {
    match code_page {
        866 => Some(IBM866),
        874 => Some(WINDOWS_874),
        932 => Some(SHIFT_JIS),
        936 => Some(GBK),
        949 => Some(EUC_KR),
        950 => Some(BIG5),
        1250 => Some(WINDOWS_1250),
        1251 => Some(WINDOWS_1251),
        1252 => Some(WINDOWS_1252),
        1253 => Some(WINDOWS_1253),
        1254 => Some(WINDOWS_1254),
        1257 => Some(WINDOWS_1257),
        10000 => Some(MACINTOSH),
        10007 => Some(X_MAC_CYRILLIC),
        _ => None,
    }
}

/// Resolve a driver byte to an encoding, falling back to [`DEFAULT_ENCODING`].
#[must_use]
pub fn resolve(driver: u8) -> TextEncoding {
    resolve_or(driver, DEFAULT_ENCODING)
}

/// Resolve a driver byte to an encoding with an explicit fallback.
#[must_use]
pub fn resolve_or(driver: u8, fallback: TextEncoding) -> TextEncoding {
    let Some(cp) = code_page(driver) else {
        return fallback;
    };
    TextEncoding::for_code_page(cp).unwrap_or_else(|| {
        tracing::warn!(
            driver = format_args!("0x{driver:02X}"),
            code_page = cp,
            fallback = fallback.name(),
            "code page not supported, using fallback encoding"
        );
        fallback
    })
}
