//! Dialect tags (header byte 0).

use std::fmt;

/// How header bytes 1-3 encode the year of the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderYearEpoch {
    /// Byte 1 counts years since 1900.
    Since1900,
    /// Byte 1 is stored as the year itself.
    Verbatim,
}

/// The producer/variant that wrote a table.
///
/// | Byte | Variant                                  | Memo |
/// |------|------------------------------------------|------|
/// | 0x02 | FoxBASE                                  | no   |
/// | 0x03 | FoxBASE+ / dBASE III PLUS                | no   |
/// | 0x04 | dBASE IV / dBASE 7                       | no   |
/// | 0x30 | Visual FoxPro                            | opt  |
/// | 0x31 | Visual FoxPro, autoincrement             | opt  |
/// | 0x32 | Visual FoxPro, Varchar/Varbinary         | opt  |
/// | 0x43 | dBASE IV SQL table                       | no   |
/// | 0x63 | dBASE IV SQL system                      | no   |
/// | 0x83 | FoxBASE+ / dBASE III PLUS                | yes  |
/// | 0x8B | dBASE IV                                 | yes  |
/// | 0x8C | dBASE 7                                  | yes  |
/// | 0xCB | dBASE IV SQL table                       | yes  |
/// | 0xE5 | HiPer-Six (SMT memo)                     | yes  |
/// | 0xF5 | FoxPro 2.x (or earlier)                  | yes  |
/// | 0xFB | FoxBASE                                  | no   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DbfFileType {
    FoxBase,
    #[default]
    FoxBasePlus,
    DBase4,
    VisualFoxPro,
    VisualFoxProAutoIncrement,
    VisualFoxProVarchar,
    DBase4SqlTable,
    DBase4SqlSystem,
    FoxBasePlusMemo,
    DBase4Memo,
    DBase7Memo,
    DBase4SqlTableMemo,
    HiPerSix,
    FoxPro2Memo,
    FoxBaseLegacy,
}

impl DbfFileType {
    /// Every known dialect, in tag order.
    pub const ALL: [Self; 15] = [
        Self::FoxBase,
        Self::FoxBasePlus,
        Self::DBase4,
        Self::VisualFoxPro,
        Self::VisualFoxProAutoIncrement,
        Self::VisualFoxProVarchar,
        Self::DBase4SqlTable,
        Self::DBase4SqlSystem,
        Self::FoxBasePlusMemo,
        Self::DBase4Memo,
        Self::DBase7Memo,
        Self::DBase4SqlTableMemo,
        Self::HiPerSix,
        Self::FoxPro2Memo,
        Self::FoxBaseLegacy,
    ];

    /// Parse header byte 0.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_byte() == byte)
    }

    /// Header byte 0 for this dialect.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::FoxBase => 0x02,
            Self::FoxBasePlus => 0x03,
            Self::DBase4 => 0x04,
            Self::VisualFoxPro => 0x30,
            Self::VisualFoxProAutoIncrement => 0x31,
            Self::VisualFoxProVarchar => 0x32,
            Self::DBase4SqlTable => 0x43,
            Self::DBase4SqlSystem => 0x63,
            Self::FoxBasePlusMemo => 0x83,
            Self::DBase4Memo => 0x8B,
            Self::DBase7Memo => 0x8C,
            Self::DBase4SqlTableMemo => 0xCB,
            Self::HiPerSix => 0xE5,
            Self::FoxPro2Memo => 0xF5,
            Self::FoxBaseLegacy => 0xFB,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FoxBase | Self::FoxBaseLegacy => "FoxBASE",
            Self::FoxBasePlus => "FoxBASE+/dBASE III PLUS, no memo",
            Self::DBase4 => "dBASE IV/dBASE 7, no memo",
            Self::VisualFoxPro => "Visual FoxPro",
            Self::VisualFoxProAutoIncrement => "Visual FoxPro, autoincrement enabled",
            Self::VisualFoxProVarchar => "Visual FoxPro with field type Varchar or Varbinary",
            Self::DBase4SqlTable => "dBASE IV SQL table files, no memo",
            Self::DBase4SqlSystem => "dBASE IV SQL system files, no memo",
            Self::FoxBasePlusMemo => "FoxBASE+/dBASE III PLUS, with memo",
            Self::DBase4Memo => "dBASE IV with memo",
            Self::DBase7Memo => "dBASE 7 with memo",
            Self::DBase4SqlTableMemo => "dBASE IV SQL table files, with memo",
            Self::HiPerSix => "HiPer-Six format with SMT memo file",
            Self::FoxPro2Memo => "FoxPro 2.x (or earlier) with memo",
        }
    }

    /// Whether tables of this dialect come with a memo store.
    #[must_use]
    pub const fn has_memo(self) -> bool {
        matches!(
            self,
            Self::FoxBasePlusMemo
                | Self::DBase4Memo
                | Self::DBase7Memo
                | Self::DBase4SqlTableMemo
                | Self::HiPerSix
                | Self::FoxPro2Memo
        )
    }

    /// Year convention of the header update date.
    #[must_use]
    pub const fn year_epoch(self) -> HeaderYearEpoch {
        match self {
            Self::FoxBasePlus => HeaderYearEpoch::Verbatim,
            _ => HeaderYearEpoch::Since1900,
        }
    }
}

impl fmt::Display for DbfFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.to_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip() {
        for file_type in DbfFileType::ALL {
            assert_eq!(DbfFileType::from_byte(file_type.to_byte()), Some(file_type));
        }
        assert_eq!(DbfFileType::from_byte(0x00), None);
        assert_eq!(DbfFileType::from_byte(0x7F), None);
    }

    #[test]
    fn test_year_epoch() {
        assert_eq!(
            DbfFileType::FoxBasePlus.year_epoch(),
            HeaderYearEpoch::Verbatim
        );
        assert_eq!(
            DbfFileType::FoxBasePlusMemo.year_epoch(),
            HeaderYearEpoch::Since1900
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DbfFileType::DBase4Memo.to_string(),
            "dBASE IV with memo (0x8B)"
        );
    }
}
