//! Property values with total, never-failing projections.
//!
//! Builders read values through `as_bool`/`as_int`/`as_str`/`as_any`
//! without checking the variant first: a mismatch yields a documented
//! default instead of an error. Malformed numeric text degrades to 0 at
//! construction for the same reason - the source schema evolves, and
//! content the engine cannot interpret must vanish quietly instead of
//! aborting the import.

use crate::handle::{BinaryHandle, ObjectHandle, ShapeHandle, StreamHandle};
use crate::property::PropertySet;

/// Unit suffixes recognized in universal-measure text, with the ratio into
/// internal units (twentieths of a point).
static UNIT_RATIOS: phf::Map<&'static str, i32> = phf::phf_map! {
    "pt" => 20,
    "pc" => 240,
    "in" => 1440,
};

/// A typed leaf or structural value carried by a property.
///
/// Handle variants reference out-of-band payloads and share them on clone;
/// `Properties` owns its subtree exclusively and clones deep.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No payload. The projection defaults apply.
    #[default]
    Empty,

    /// Boolean: `true`/`True`/`1`/`on`/`On` in source text.
    Bool(bool),

    /// Signed integer.
    Int(i32),

    /// Integer parsed from base-16 text (colors, language codes, flags).
    Hex(u32),

    /// Length in internal units (twentieths of a point).
    Measure(i32),

    /// Character data.
    Str(String),

    /// Deferred reference to a binary payload.
    Binary(BinaryHandle),

    /// Deferred reference to a streamed payload.
    Stream(StreamHandle),

    /// Opaque drawing-layer shape reference.
    Shape(ShapeHandle),

    /// Opaque embedded-object reference.
    Object(ObjectHandle),

    /// Nested structured property bag.
    Properties(PropertySet),
}

/// Borrowed view over a value's payload.
///
/// Used by builders that forward a value wholesale (string, stream, shape)
/// into the document model rather than projecting a scalar out of it.
#[derive(Debug, Clone, Copy)]
pub enum AnyValue<'a> {
    None,
    Bool(bool),
    Int(i32),
    Str(&'a str),
    Binary(&'a BinaryHandle),
    Stream(&'a StreamHandle),
    Shape(&'a ShapeHandle),
    Object(&'a ObjectHandle),
}

impl Value {
    /// Parse boolean text. Anything outside the recognized true forms
    /// (`true`, `True`, `1`, `on`, `On`) is false.
    pub fn bool_text(text: &str) -> Value {
        Value::Bool(matches!(text, "true" | "True" | "1" | "on" | "On"))
    }

    /// Parse signed decimal text. Trailing garbage is ignored; malformed
    /// or overflowing text degrades to 0.
    pub fn int_text(text: &str) -> Value {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let magnitude: i64 = digits[..end].parse().unwrap_or(0);
        let signed = if negative { -magnitude } else { magnitude };
        Value::Int(i32::try_from(signed).unwrap_or(0))
    }

    /// Parse base-16 text. Stops at the first non-hex character; fully
    /// malformed text degrades to 0.
    pub fn hex_text(text: &str) -> Value {
        let mut result: u32 = 0;
        for c in text.chars() {
            match c.to_digit(16) {
                Some(digit) => result = result.wrapping_mul(16).wrapping_add(digit),
                None => break,
            }
        }
        Value::Hex(result)
    }

    /// Parse universal-measure text into internal units.
    ///
    /// A recognized unit suffix converts the leading digits (`12pt` → 240);
    /// otherwise the digits are taken as already expressed in internal
    /// units and trailing garbage is ignored (`240xyz` → 240).
    pub fn measure_text(text: &str) -> Value {
        let end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let magnitude: i32 = text[..end].parse().unwrap_or(0);
        let ratio = UNIT_RATIOS
            .entries()
            .find_map(|(suffix, ratio)| text.ends_with(suffix).then_some(*ratio));
        match ratio {
            Some(ratio) => Value::Measure(magnitude.saturating_mul(ratio)),
            None => Value::Measure(magnitude),
        }
    }

    /// Get as boolean; false unless the value is `Bool`.
    #[inline]
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            _ => false,
        }
    }

    /// Get as integer; 0 unless the value carries a number
    /// (`Bool` maps to 0/1).
    #[inline]
    pub fn as_int(&self) -> i32 {
        match self {
            Value::Bool(b) => *b as i32,
            Value::Int(n) => *n,
            Value::Hex(n) => *n as i32,
            Value::Measure(n) => *n,
            _ => 0,
        }
    }

    /// Get as string slice; empty unless the value is `Str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Value::Str(s) => s,
            _ => "",
        }
    }

    /// Borrowed view of the payload; `AnyValue::None` for `Empty` and for
    /// structural values.
    pub fn as_any(&self) -> AnyValue<'_> {
        match self {
            Value::Empty | Value::Properties(_) => AnyValue::None,
            Value::Bool(b) => AnyValue::Bool(*b),
            Value::Int(n) => AnyValue::Int(*n),
            Value::Hex(n) => AnyValue::Int(*n as i32),
            Value::Measure(n) => AnyValue::Int(*n),
            Value::Str(s) => AnyValue::Str(s),
            Value::Binary(h) => AnyValue::Binary(h),
            Value::Stream(h) => AnyValue::Stream(h),
            Value::Shape(h) => AnyValue::Shape(h),
            Value::Object(h) => AnyValue::Object(h),
        }
    }

    /// Nested property bag, only for the `Properties` variant.
    #[inline]
    pub fn properties(&self) -> Option<&PropertySet> {
        match self {
            Value::Properties(set) => Some(set),
            _ => None,
        }
    }

    /// Deferred binary handle, only for the `Binary` variant. Lazy: the
    /// payload is not touched.
    #[inline]
    pub fn binary(&self) -> Option<&BinaryHandle> {
        match self {
            Value::Binary(handle) => Some(handle),
            _ => None,
        }
    }

    /// Deferred stream handle, only for the `Stream` variant. Lazy.
    #[inline]
    pub fn stream(&self) -> Option<&StreamHandle> {
        match self {
            Value::Stream(handle) => Some(handle),
            _ => None,
        }
    }
}
