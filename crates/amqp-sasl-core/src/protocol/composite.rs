use std::fmt;

use crate::protocol::primitive::{self as p, Decoder};
use crate::protocol::{descriptor_code, CodecError, Symbol};

/// A SASL performative encoded as a described list.
pub trait Composite: Sized {
    const DESCRIPTOR: u64;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError>;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decode a complete message; trailing bytes are rejected.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        let value = Self::decode_from(&mut dec)?;
        dec.finish()?;
        Ok(value)
    }
}

/// Field value with its wire type.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Symbol(&'a Symbol),
    Symbols(&'a [Symbol]),
    Binary(&'a [u8]),
    Str(&'a str),
    Ubyte(u8),
}

impl Field<'_> {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match *self {
            Field::Symbol(s) => p::put_symbol(out, s),
            Field::Symbols(s) => p::put_symbol_array(out, s),
            Field::Binary(b) => p::put_binary(out, b),
            Field::Str(s) => p::put_string(out, s),
            Field::Ubyte(v) => {
                p::put_ubyte(out, v);
                Ok(())
            }
        }
    }
}

/// One list element; `omit` marks an optional field that holds no value.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    pub value: Field<'a>,
    pub omit: bool,
}

impl<'a> FieldSpec<'a> {
    pub fn mandatory(value: Field<'a>) -> Self {
        Self { value, omit: false }
    }

    pub fn optional(value: Field<'a>, omit: bool) -> Self {
        Self { value, omit }
    }
}

/// Encode `fields` in declared order as a list described by `code`.
///
/// Omitted fields at the tail are dropped; omitted fields followed by a
/// present one are written as null to keep positions intact.
pub fn marshal_composite(out: &mut Vec<u8>, code: u64, fields: &[FieldSpec<'_>]) -> Result<(), CodecError> {
    let count = fields.iter().rposition(|f| !f.omit).map_or(0, |i| i + 1);

    let mut body = Vec::new();
    for field in &fields[..count] {
        if field.omit {
            p::put_null(&mut body);
        } else {
            field.value.encode(&mut body)?;
        }
    }

    p::put_descriptor(out, code);
    put_list(out, count, &body)
}

fn put_list(out: &mut Vec<u8>, count: usize, body: &[u8]) -> Result<(), CodecError> {
    if count == 0 {
        out.push(p::LIST0);
        return Ok(());
    }

    // list8 size covers the count byte plus the elements
    if body.len() < u8::MAX as usize && count <= u8::MAX as usize {
        out.push(p::LIST8);
        out.push((body.len() + 1) as u8);
        out.push(count as u8);
    } else {
        let size = u32::try_from(body.len() + 4)
            .map_err(|_| CodecError::Encode(format!("list too large: {} bytes", body.len())))?;
        out.push(p::LIST32);
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&(count as u32).to_be_bytes());
    }
    out.extend_from_slice(body);
    Ok(())
}

/// Descriptor of a described value. SASL names are folded into their
/// numeric codes; any other symbolic descriptor is kept by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Code(u64),
    Name(Symbol),
}

impl Descriptor {
    pub fn code(&self) -> Option<u64> {
        match self {
            Descriptor::Code(code) => Some(*code),
            Descriptor::Name(_) => None,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Code(code) => write!(f, "{code:#04x}"),
            Descriptor::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Read the descriptor of a described value.
pub fn read_descriptor(dec: &mut Decoder<'_>) -> Result<Descriptor, CodecError> {
    let ctor = dec.read_u8()?;
    if ctor != p::DESCRIBED {
        return Err(CodecError::Malformed(format!(
            "expected described type, found constructor {ctor:#04x}"
        )));
    }

    match dec.peek_u8()? {
        p::SYM8 | p::SYM32 => {
            let name = p::get_symbol(dec)?.unwrap_or_default();
            Ok(match descriptor_code(name.as_str()) {
                Some(code) => Descriptor::Code(code),
                None => Descriptor::Name(name),
            })
        }
        _ => p::get_uint(dec)?
            .map(Descriptor::Code)
            .ok_or_else(|| CodecError::Malformed("null descriptor".into())),
    }
}

/// Peek at the descriptor of an encoded composite without consuming it.
pub fn peek_descriptor(bytes: &[u8]) -> Result<Descriptor, CodecError> {
    read_descriptor(&mut Decoder::new(bytes))
}

/// Verify the descriptor and open the list that follows it.
pub fn unmarshal_composite<'a>(dec: &mut Decoder<'a>, expected: u64) -> Result<ListReader<'a>, CodecError> {
    let actual = read_descriptor(dec)?;
    if actual.code() != Some(expected) {
        return Err(CodecError::UnexpectedType { expected, actual });
    }

    let (body, count) = match dec.read_u8()? {
        p::LIST0 => (Decoder::new(&[]), 0),
        p::LIST8 => {
            let size = dec.read_u8()? as usize;
            let mut body = dec.sub(size)?;
            let count = body.read_u8()? as usize;
            (body, count)
        }
        p::LIST32 => {
            let size = dec.read_u32()? as usize;
            let mut body = dec.sub(size)?;
            let count = body.read_u32()? as usize;
            (body, count)
        }
        other => {
            return Err(CodecError::Malformed(format!(
                "expected list, found constructor {other:#04x}"
            )))
        }
    };

    Ok(ListReader { dec: body, remaining: count })
}

/// Positional reader over list elements. Reading past the encoded count
/// yields `None`, which lets short lists leave trailing fields unset.
#[derive(Debug)]
pub struct ListReader<'a> {
    dec: Decoder<'a>,
    remaining: usize,
}

impl<'a> ListReader<'a> {
    fn next_with<T>(
        &mut self,
        read: impl FnOnce(&mut Decoder<'a>) -> Result<Option<T>, CodecError>,
    ) -> Result<Option<T>, CodecError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        read(&mut self.dec)
    }

    pub fn symbol(&mut self) -> Result<Option<Symbol>, CodecError> {
        self.next_with(p::get_symbol)
    }

    pub fn symbols(&mut self) -> Result<Option<Vec<Symbol>>, CodecError> {
        self.next_with(p::get_symbols)
    }

    pub fn binary(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        self.next_with(p::get_binary)
    }

    pub fn string(&mut self) -> Result<Option<String>, CodecError> {
        self.next_with(p::get_string)
    }

    pub fn uint(&mut self) -> Result<Option<u64>, CodecError> {
        self.next_with(p::get_uint)
    }

    /// Skip elements beyond the declared fields and check the list size.
    pub fn finish(mut self) -> Result<(), CodecError> {
        while self.remaining > 0 {
            self.remaining -= 1;
            p::skip_value(&mut self.dec)?;
        }
        self.dec.finish()
    }
}

/// Absent mandatory fields are malformed, whether null or cut off by a short list.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, CodecError> {
    value.ok_or_else(|| CodecError::Malformed(format!("missing mandatory field `{field}`")))
}
