//! Shape-directed codec for dynamically typed values
//!
//! The wire carries no type information beyond enum ordinals and array
//! headers, so decoding needs the expected [`Shape`]. Shapes form a tree:
//! a pointer owns the shape of its referent, and nothing can point back
//! up, so a shape can never describe a cyclic value.
//!
//! Values encoded under a shape produce exactly the bytes the typed codec
//! produces for the matching Rust type, e.g. `Shape::Pointer(Unique,
//! String(FreeForm))` and `UniquePtr<BString>`.

use bytes::Bytes;

use crate::error::MAX_NDR_ARRAY_ELEMENTS;
use crate::{
    BString, NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWString, NdrWriter,
    Result, Uuid, VariantBool,
};

/// String body representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringForm {
    /// Counted and NUL-terminated ([`NdrWString`])
    Terminated,
    /// Counted without terminator ([`BString`])
    FreeForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Ref,
    Unique,
    Full,
}

/// Named member of a record shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// Expected wire shape of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// 16-bit automation boolean
    Bool,
    Uuid,
    /// 16-bit ordinal over a closed set
    Enum {
        name: &'static str,
        ordinals: Vec<u16>,
    },
    String(StringForm),
    Record(Vec<Field>),
    /// Self-describing array: count, element width, elements
    Array(Box<Shape>),
    Pointer(PointerKind, Box<Shape>),
}

impl Shape {
    pub fn enumeration(name: &'static str, ordinals: impl Into<Vec<u16>>) -> Self {
        Shape::Enum {
            name,
            ordinals: ordinals.into(),
        }
    }

    pub fn record(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Record(fields.into_iter().collect())
    }

    pub fn array(element: Shape) -> Self {
        Shape::Array(Box::new(element))
    }

    pub fn unique(referent: Shape) -> Self {
        Shape::Pointer(PointerKind::Unique, Box::new(referent))
    }

    pub fn full(referent: Shape) -> Self {
        Shape::Pointer(PointerKind::Full, Box::new(referent))
    }

    pub fn reference(referent: Shape) -> Self {
        Shape::Pointer(PointerKind::Ref, Box::new(referent))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::U8 => "u8",
            Shape::I8 => "i8",
            Shape::U16 => "u16",
            Shape::I16 => "i16",
            Shape::U32 => "u32",
            Shape::I32 => "i32",
            Shape::U64 => "u64",
            Shape::I64 => "i64",
            Shape::F32 => "f32",
            Shape::F64 => "f64",
            Shape::Bool => "bool",
            Shape::Uuid => "uuid",
            Shape::Enum { .. } => "enum",
            Shape::String(_) => "string",
            Shape::Record(_) => "record",
            Shape::Array(_) => "array",
            Shape::Pointer(..) => "pointer",
        }
    }

    /// Alignment of the inline representation
    pub fn alignment(&self) -> usize {
        match self {
            Shape::U8 | Shape::I8 => 1,
            Shape::U16 | Shape::I16 | Shape::Bool | Shape::Enum { .. } => 2,
            Shape::U32 | Shape::I32 | Shape::F32 | Shape::Uuid | Shape::String(_) => 4,
            Shape::U64 | Shape::I64 | Shape::F64 => 8,
            Shape::Record(fields) => fields
                .iter()
                .map(|f| f.shape.alignment())
                .max()
                .unwrap_or(1),
            Shape::Array(element) => element.alignment().max(4),
            Shape::Pointer(PointerKind::Ref, referent) => referent.alignment(),
            Shape::Pointer(..) => 4,
        }
    }

    /// Inline width in bytes, or 0 when it depends on the value
    pub fn width(&self) -> u32 {
        match self {
            Shape::U8 | Shape::I8 => 1,
            Shape::U16 | Shape::I16 | Shape::Bool | Shape::Enum { .. } => 2,
            Shape::U32 | Shape::I32 | Shape::F32 => 4,
            Shape::U64 | Shape::I64 | Shape::F64 => 8,
            Shape::Uuid => 16,
            Shape::String(_) | Shape::Array(_) => 0,
            Shape::Record(fields) => {
                let mut offset = 0usize;
                for field in fields {
                    let width = field.shape.width();
                    if width == 0 {
                        return 0;
                    }
                    offset += NdrContext::align_padding(offset, field.shape.alignment());
                    offset += width as usize;
                }
                u32::try_from(offset).unwrap_or(0)
            }
            Shape::Pointer(PointerKind::Ref, referent) => referent.width(),
            Shape::Pointer(..) => 4,
        }
    }

    /// Encode a single value as a complete message
    pub fn encode(&self, value: &Value, ctx: NdrContext) -> Result<Bytes> {
        let mut w = NdrWriter::new(ctx);
        encode_value(&mut w, self, value)?;
        w.finish()
    }

    /// Decode a complete message holding a single value
    pub fn decode(&self, bytes: Bytes, ctx: NdrContext) -> Result<Value> {
        let mut r = NdrReader::new(bytes, ctx);
        let value = decode_value(&mut r, self)?;
        r.finish()?;
        Ok(value)
    }
}

/// Dynamically typed datum
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Uuid(Uuid),
    Enum(u16),
    String(String),
    Record(Vec<(String, Value)>),
    Array(Vec<Value>),
    Pointer(Option<Box<Value>>),
}

impl Value {
    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Value::Record(
            fields
                .into_iter()
                .map(|(n, v)| (n.into(), v))
                .collect(),
        )
    }

    pub fn some(referent: Value) -> Self {
        Value::Pointer(Some(Box::new(referent)))
    }

    pub fn null() -> Self {
        Value::Pointer(None)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Member of a record value by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Uuid(_) => "uuid",
            Value::Enum(_) => "enum",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
            Value::Pointer(_) => "pointer",
        }
    }
}

fn mismatch(shape: &Shape, value: &Value) -> NdrError {
    NdrError::ShapeMismatch(format!("expected {}, found {}", shape.kind(), value.kind()))
}

/// Write one top-level value: inline part, then its deferred region
pub fn encode_value(w: &mut NdrWriter, shape: &Shape, value: &Value) -> Result<()> {
    encode_inline(w, shape, value)?;
    encode_deferred(w, shape, value)
}

fn encode_inline(w: &mut NdrWriter, shape: &Shape, value: &Value) -> Result<()> {
    match (shape, value) {
        (Shape::U8, Value::U8(v)) => w.put_u8(*v),
        (Shape::I8, Value::I8(v)) => w.put_i8(*v),
        (Shape::U16, Value::U16(v)) => w.put_u16(*v),
        (Shape::I16, Value::I16(v)) => w.put_i16(*v),
        (Shape::U32, Value::U32(v)) => w.put_u32(*v),
        (Shape::I32, Value::I32(v)) => w.put_i32(*v),
        (Shape::U64, Value::U64(v)) => w.put_u64(*v),
        (Shape::I64, Value::I64(v)) => w.put_i64(*v),
        (Shape::F32, Value::F32(v)) => w.put_f32(*v),
        (Shape::F64, Value::F64(v)) => w.put_f64(*v),
        (Shape::Bool, Value::Bool(v)) => VariantBool(*v).ndr_encode(w)?,
        (Shape::Uuid, Value::Uuid(v)) => v.ndr_encode(w)?,
        (Shape::Enum { name, ordinals }, Value::Enum(v)) => {
            if !ordinals.contains(v) {
                return Err(NdrError::InvalidDiscriminant {
                    type_name: *name,
                    value: u32::from(*v),
                });
            }
            w.put_u16(*v);
        }
        (Shape::String(StringForm::Terminated), Value::String(s)) => {
            NdrWString::new(s.as_str()).ndr_encode(w)?
        }
        (Shape::String(StringForm::FreeForm), Value::String(s)) => {
            BString::new(s.as_str()).ndr_encode(w)?
        }
        (Shape::Record(fields), Value::Record(values)) => {
            if fields.len() != values.len() {
                return Err(NdrError::ShapeMismatch(format!(
                    "record has {} fields, value has {}",
                    fields.len(),
                    values.len()
                )));
            }
            w.align(shape.alignment());
            for (field, (name, v)) in fields.iter().zip(values) {
                if field.name != *name {
                    return Err(NdrError::ShapeMismatch(format!(
                        "expected field {}, found {}",
                        field.name, name
                    )));
                }
                w.align(field.shape.alignment());
                encode_inline(w, &field.shape, v)?;
            }
        }
        (Shape::Array(element), Value::Array(items)) => {
            let count = u32::try_from(items.len())
                .map_err(|_| NdrError::IntegerOverflow)?;
            w.put_u32(count);
            w.put_u32(element.width());
            for item in items {
                w.align(element.alignment());
                encode_inline(w, element, item)?;
            }
        }
        (Shape::Pointer(PointerKind::Ref, referent), Value::Pointer(v)) => match v {
            Some(v) => encode_inline(w, referent, v)?,
            None => return Err(NdrError::NullReference("ref pointer")),
        },
        (Shape::Pointer(_, _), Value::Pointer(v)) => {
            w.put_pointer(v.is_some());
        }
        (shape, value) => return Err(mismatch(shape, value)),
    }
    Ok(())
}

// Runs after encode_inline accepted the same pairing.
fn encode_deferred(w: &mut NdrWriter, shape: &Shape, value: &Value) -> Result<()> {
    match (shape, value) {
        (Shape::Record(fields), Value::Record(values)) => {
            for (field, (_, v)) in fields.iter().zip(values) {
                encode_deferred(w, &field.shape, v)?;
            }
        }
        (Shape::Array(element), Value::Array(items)) => {
            for item in items {
                encode_deferred(w, element, item)?;
            }
        }
        (Shape::Pointer(PointerKind::Ref, referent), Value::Pointer(Some(v))) => {
            encode_deferred(w, referent, v)?;
        }
        (Shape::Pointer(_, referent), Value::Pointer(Some(v))) => {
            w.enter_referent();
            w.align(referent.alignment());
            encode_inline(w, referent, v)?;
            encode_deferred(w, referent, v)?;
        }
        _ => {}
    }
    Ok(())
}

/// Inline phase result; pointers are resolved in the deferred phase.
enum Inline {
    Value(Value),
    Record(Vec<(String, Inline)>),
    Array(Vec<Inline>),
    Ref(Box<Inline>),
    Null,
    Pending,
}

/// Read one top-level value: inline part, then its deferred region
pub fn decode_value(r: &mut NdrReader, shape: &Shape) -> Result<Value> {
    let inline = decode_inline(r, shape)?;
    r.deferred(|r| resolve(r, shape, inline))
}

fn decode_inline(r: &mut NdrReader, shape: &Shape) -> Result<Inline> {
    let value = match shape {
        Shape::U8 => Value::U8(r.get_u8()?),
        Shape::I8 => Value::I8(r.get_i8()?),
        Shape::U16 => Value::U16(r.get_u16()?),
        Shape::I16 => Value::I16(r.get_i16()?),
        Shape::U32 => Value::U32(r.get_u32()?),
        Shape::I32 => Value::I32(r.get_i32()?),
        Shape::U64 => Value::U64(r.get_u64()?),
        Shape::I64 => Value::I64(r.get_i64()?),
        Shape::F32 => Value::F32(r.get_f32()?),
        Shape::F64 => Value::F64(r.get_f64()?),
        Shape::Bool => Value::Bool(VariantBool::ndr_decode(r)?.get()),
        Shape::Uuid => Value::Uuid(Uuid::ndr_decode(r)?),
        Shape::Enum { name, ordinals } => {
            let ordinal = r.get_u16()?;
            if !ordinals.contains(&ordinal) {
                return Err(NdrError::InvalidDiscriminant {
                    type_name: *name,
                    value: u32::from(ordinal),
                });
            }
            Value::Enum(ordinal)
        }
        Shape::String(StringForm::Terminated) => Value::String(NdrWString::ndr_decode(r)?.0),
        Shape::String(StringForm::FreeForm) => Value::String(BString::ndr_decode(r)?.0),
        Shape::Record(fields) => {
            r.align(shape.alignment())?;
            let mut items = Vec::with_capacity(fields.len());
            for field in fields {
                r.align(field.shape.alignment())?;
                items.push((field.name.clone(), decode_inline(r, &field.shape)?));
            }
            return Ok(Inline::Record(items));
        }
        Shape::Array(element) => {
            let count = r.get_u32()? as usize;
            if count > MAX_NDR_ARRAY_ELEMENTS {
                return Err(NdrError::AllocationLimitExceeded {
                    requested: count,
                    limit: MAX_NDR_ARRAY_ELEMENTS,
                });
            }
            let width = r.get_u32()?;
            if width != element.width() {
                return Err(NdrError::ElementWidthMismatch {
                    expected: element.width(),
                    found: width,
                });
            }
            let mut items = Vec::with_capacity(count.min(r.remaining()));
            for _ in 0..count {
                r.align(element.alignment())?;
                items.push(decode_inline(r, element)?);
            }
            return Ok(Inline::Array(items));
        }
        Shape::Pointer(PointerKind::Ref, referent) => {
            return Ok(Inline::Ref(Box::new(decode_inline(r, referent)?)));
        }
        Shape::Pointer(..) => {
            return Ok(if r.get_pointer()? == 0 {
                Inline::Null
            } else {
                Inline::Pending
            });
        }
    };
    Ok(Inline::Value(value))
}

fn resolve(r: &mut NdrReader, shape: &Shape, inline: Inline) -> Result<Value> {
    match (shape, inline) {
        (_, Inline::Value(value)) => Ok(value),
        (Shape::Record(fields), Inline::Record(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for (field, (name, item)) in fields.iter().zip(items) {
                values.push((name, resolve(r, &field.shape, item)?));
            }
            Ok(Value::Record(values))
        }
        (Shape::Array(element), Inline::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(resolve(r, element, item)?);
            }
            Ok(Value::Array(values))
        }
        (Shape::Pointer(_, referent), Inline::Ref(inner)) => {
            Ok(Value::some(resolve(r, referent, *inner)?))
        }
        (Shape::Pointer(..), Inline::Null) => Ok(Value::null()),
        (Shape::Pointer(_, referent), Inline::Pending) => {
            r.enter_referent()?;
            r.align(referent.alignment())?;
            let inner = decode_inline(r, referent)?;
            Ok(Value::some(resolve(r, referent, inner)?))
        }
        (shape, _) => Err(NdrError::ShapeMismatch(format!(
            "inconsistent decode state for {}",
            shape.kind()
        ))),
    }
}
