use std::fmt;

/// Leading byte of every encoded value.
///
/// The numbering is part of the persisted format and must never change.
/// Tags between [`Tag::BigInt`] and [`Tag::CountryCode`] that have no codec
/// yet are reserved: they are recognized, but decoding them fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    Bool = 1,
    Int64 = 2,
    Int32 = 3,
    Float = 4,
    String = 5,
    Char = 6,
    BigInt = 7,
    BigFloat = 8,
    Array = 9,
    Document = 10,
    Collection = 11,
    Date = 12,
    TimeStamp = 13,
    Email = 14,
    Phone = 15,
    Money = 16,
    Uuid = 17,
    Binary = 18,
    Blob = 19,
    Longitude = 20,
    Latitude = 21,
    CurrencyCode = 22,
    CountryCode = 23,
    EndOfStream = 24,
    FieldName = 25,
    Last = 26,
}

const ALL: [Tag; 27] = [
    Tag::Null,
    Tag::Bool,
    Tag::Int64,
    Tag::Int32,
    Tag::Float,
    Tag::String,
    Tag::Char,
    Tag::BigInt,
    Tag::BigFloat,
    Tag::Array,
    Tag::Document,
    Tag::Collection,
    Tag::Date,
    Tag::TimeStamp,
    Tag::Email,
    Tag::Phone,
    Tag::Money,
    Tag::Uuid,
    Tag::Binary,
    Tag::Blob,
    Tag::Longitude,
    Tag::Latitude,
    Tag::CurrencyCode,
    Tag::CountryCode,
    Tag::EndOfStream,
    Tag::FieldName,
    Tag::Last,
];

impl Tag {
    /// Look up a tag by its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        ALL.get(byte as usize).copied()
    }

    /// The wire byte for this tag.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Framing tags that may never appear as user-visible content.
    pub const fn is_internal(self) -> bool {
        matches!(self, Tag::EndOfStream | Tag::FieldName | Tag::Last)
    }

    /// Returns `true` if the codec can encode and decode this tag as a value.
    pub const fn has_codec(self) -> bool {
        matches!(
            self,
            Tag::Null
                | Tag::Bool
                | Tag::Int64
                | Tag::Int32
                | Tag::Float
                | Tag::String
                | Tag::Char
                | Tag::Array
                | Tag::Document
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "Null",
            Tag::Bool => "Bool",
            Tag::Int64 => "Int64",
            Tag::Int32 => "Int32",
            Tag::Float => "Float",
            Tag::String => "String",
            Tag::Char => "Char",
            Tag::BigInt => "BigInt",
            Tag::BigFloat => "BigFloat",
            Tag::Array => "Array",
            Tag::Document => "Document",
            Tag::Collection => "Collection",
            Tag::Date => "Date",
            Tag::TimeStamp => "TimeStamp",
            Tag::Email => "Email",
            Tag::Phone => "Phone",
            Tag::Money => "Money",
            Tag::Uuid => "Uuid",
            Tag::Binary => "Binary",
            Tag::Blob => "Blob",
            Tag::Longitude => "Longitude",
            Tag::Latitude => "Latitude",
            Tag::CurrencyCode => "CurrencyCode",
            Tag::CountryCode => "CountryCode",
            Tag::EndOfStream => "EndOfStream",
            Tag::FieldName => "FieldName",
            Tag::Last => "Last",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag.as_byte()
    }
}
