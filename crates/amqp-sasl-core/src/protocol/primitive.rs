//! AMQP 1.0 primitive encodings used by the SASL performatives.
//!
//! Only the subset of the type system that SASL needs is implemented:
//! described types, lists, symbols, binaries, strings, unsigned integers,
//! symbol arrays and null. Anything else can still be skipped generically
//! so that unknown trailing list elements do not break decoding.

use crate::protocol::{CodecError, Symbol};

pub const DESCRIBED: u8 = 0x00;
pub const NULL: u8 = 0x40;
pub const UINT0: u8 = 0x43;
pub const ULONG0: u8 = 0x44;
pub const LIST0: u8 = 0x45;
pub const UBYTE: u8 = 0x50;
pub const SMALLUINT: u8 = 0x52;
pub const SMALLULONG: u8 = 0x53;
pub const USHORT: u8 = 0x60;
pub const UINT: u8 = 0x70;
pub const ULONG: u8 = 0x80;
pub const VBIN8: u8 = 0xa0;
pub const STR8: u8 = 0xa1;
pub const SYM8: u8 = 0xa3;
pub const VBIN32: u8 = 0xb0;
pub const STR32: u8 = 0xb1;
pub const SYM32: u8 = 0xb3;
pub const LIST8: u8 = 0xc0;
pub const LIST32: u8 = 0xd0;
pub const ARRAY8: u8 = 0xe0;
pub const ARRAY32: u8 = 0xf0;

// Bounds recursion through nested described values when skipping.
const MAX_SKIP_DEPTH: usize = 16;

/// Byte cursor over an encoded value. Running out of input is always
/// reported as [`CodecError::Truncated`].
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        self.buf.get(self.pos).copied().ok_or(CodecError::Truncated)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Split off the next `n` bytes as an independent cursor.
    pub fn sub(&mut self, n: usize) -> Result<Decoder<'a>, CodecError> {
        Ok(Decoder::new(self.take(n)?))
    }

    /// Fails if any input is left unread.
    pub fn finish(&self) -> Result<(), CodecError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Malformed(format!(
                "{} trailing bytes after value",
                self.remaining()
            )))
        }
    }
}

fn len_u32(len: usize, what: &str) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::Encode(format!("{what} too long: {len} bytes")))
}

fn unexpected(expected: &str, ctor: u8) -> CodecError {
    CodecError::Malformed(format!("expected {expected}, found constructor {ctor:#04x}"))
}

// ---- encoding ----

pub fn put_null(out: &mut Vec<u8>) {
    out.push(NULL);
}

pub fn put_ubyte(out: &mut Vec<u8>, v: u8) {
    out.push(UBYTE);
    out.push(v);
}

pub fn put_descriptor(out: &mut Vec<u8>, code: u64) {
    out.push(DESCRIBED);
    match u8::try_from(code) {
        Ok(small) => {
            out.push(SMALLULONG);
            out.push(small);
        }
        Err(_) => {
            out.push(ULONG);
            out.extend_from_slice(&code.to_be_bytes());
        }
    }
}

fn put_variable(out: &mut Vec<u8>, ctor8: u8, ctor32: u8, bytes: &[u8], what: &str) -> Result<(), CodecError> {
    match u8::try_from(bytes.len()) {
        Ok(len) => {
            out.push(ctor8);
            out.push(len);
        }
        Err(_) => {
            out.push(ctor32);
            out.extend_from_slice(&len_u32(bytes.len(), what)?.to_be_bytes());
        }
    }
    out.extend_from_slice(bytes);
    Ok(())
}

pub fn put_symbol(out: &mut Vec<u8>, sym: &Symbol) -> Result<(), CodecError> {
    if !sym.is_valid() {
        return Err(CodecError::Encode(format!("symbol is not ASCII: {:?}", sym.as_str())));
    }
    put_variable(out, SYM8, SYM32, sym.as_str().as_bytes(), "symbol")
}

pub fn put_binary(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), CodecError> {
    put_variable(out, VBIN8, VBIN32, bytes, "binary")
}

pub fn put_string(out: &mut Vec<u8>, s: &str) -> Result<(), CodecError> {
    put_variable(out, STR8, STR32, s.as_bytes(), "string")
}

/// Encodes a multi-valued symbol field as an array. The compact form is
/// used only when every element and the whole array fit in one-byte sizes.
pub fn put_symbol_array(out: &mut Vec<u8>, symbols: &[Symbol]) -> Result<(), CodecError> {
    if let Some(bad) = symbols.iter().find(|s| !s.is_valid()) {
        return Err(CodecError::Encode(format!("symbol is not ASCII: {:?}", bad.as_str())));
    }

    let short = symbols.iter().all(|s| s.as_str().len() <= u8::MAX as usize);
    // count + element constructor + elements
    let size8 = 2 + symbols.iter().map(|s| 1 + s.as_str().len()).sum::<usize>();

    if short && size8 <= u8::MAX as usize && symbols.len() <= u8::MAX as usize {
        out.push(ARRAY8);
        out.push(size8 as u8);
        out.push(symbols.len() as u8);
        out.push(SYM8);
        for s in symbols {
            out.push(s.as_str().len() as u8);
            out.extend_from_slice(s.as_str().as_bytes());
        }
        return Ok(());
    }

    let size32 = 4 + 1 + symbols.iter().map(|s| 4 + s.as_str().len()).sum::<usize>();
    out.push(ARRAY32);
    out.extend_from_slice(&len_u32(size32, "symbol array")?.to_be_bytes());
    out.extend_from_slice(&len_u32(symbols.len(), "symbol array")?.to_be_bytes());
    out.push(SYM32);
    for s in symbols {
        out.extend_from_slice(&len_u32(s.as_str().len(), "symbol")?.to_be_bytes());
        out.extend_from_slice(s.as_str().as_bytes());
    }
    Ok(())
}

// ---- decoding ----
//
// Each getter consumes exactly one value. `Ok(None)` means the value was null.

fn symbol_from(bytes: &[u8]) -> Result<Symbol, CodecError> {
    if !bytes.is_ascii() {
        return Err(CodecError::Malformed("symbol contains non-ASCII bytes".into()));
    }
    // ASCII is always valid UTF-8.
    Ok(Symbol::new(String::from_utf8_lossy(bytes).into_owned()))
}

fn get_symbol_body(dec: &mut Decoder<'_>, ctor: u8) -> Result<Symbol, CodecError> {
    let len = match ctor {
        SYM8 => dec.read_u8()? as usize,
        SYM32 => dec.read_u32()? as usize,
        other => return Err(unexpected("symbol", other)),
    };
    symbol_from(dec.take(len)?)
}

pub fn get_symbol(dec: &mut Decoder<'_>) -> Result<Option<Symbol>, CodecError> {
    match dec.read_u8()? {
        NULL => Ok(None),
        ctor => get_symbol_body(dec, ctor).map(Some),
    }
}

pub fn get_binary(dec: &mut Decoder<'_>) -> Result<Option<Vec<u8>>, CodecError> {
    let len = match dec.read_u8()? {
        NULL => return Ok(None),
        VBIN8 => dec.read_u8()? as usize,
        VBIN32 => dec.read_u32()? as usize,
        other => return Err(unexpected("binary", other)),
    };
    Ok(Some(dec.take(len)?.to_vec()))
}

pub fn get_string(dec: &mut Decoder<'_>) -> Result<Option<String>, CodecError> {
    let len = match dec.read_u8()? {
        NULL => return Ok(None),
        STR8 => dec.read_u8()? as usize,
        STR32 => dec.read_u32()? as usize,
        other => return Err(unexpected("string", other)),
    };
    let bytes = dec.take(len)?;
    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| CodecError::Malformed("string is not valid UTF-8".into()))
}

/// Any unsigned integer encoding, widened to u64.
pub fn get_uint(dec: &mut Decoder<'_>) -> Result<Option<u64>, CodecError> {
    let v = match dec.read_u8()? {
        NULL => return Ok(None),
        UINT0 | ULONG0 => 0,
        UBYTE | SMALLUINT | SMALLULONG => u64::from(dec.read_u8()?),
        USHORT => u64::from(dec.read_u16()?),
        UINT => u64::from(dec.read_u32()?),
        ULONG => dec.read_u64()?,
        other => return Err(unexpected("unsigned integer", other)),
    };
    Ok(Some(v))
}

/// A multi-valued symbol field: a single symbol or an array of symbols.
pub fn get_symbols(dec: &mut Decoder<'_>) -> Result<Option<Vec<Symbol>>, CodecError> {
    let ctor = dec.read_u8()?;
    let (mut body, count) = match ctor {
        NULL => return Ok(None),
        SYM8 | SYM32 => return get_symbol_body(dec, ctor).map(|s| Some(vec![s])),
        ARRAY8 => {
            let size = dec.read_u8()? as usize;
            let mut body = dec.sub(size)?;
            let count = body.read_u8()? as usize;
            (body, count)
        }
        ARRAY32 => {
            let size = dec.read_u32()? as usize;
            let mut body = dec.sub(size)?;
            let count = body.read_u32()? as usize;
            (body, count)
        }
        other => return Err(unexpected("symbol array", other)),
    };

    let elem_ctor = body.read_u8()?;
    if elem_ctor != SYM8 && elem_ctor != SYM32 {
        return Err(unexpected("symbol array element", elem_ctor));
    }

    // Every element takes at least one byte, which bounds the allocation.
    let mut out = Vec::with_capacity(count.min(body.remaining()));
    for _ in 0..count {
        out.push(get_symbol_body(&mut body, elem_ctor)?);
    }
    body.finish()?;
    Ok(Some(out))
}

/// Skip over one encoded value of any type.
pub fn skip_value(dec: &mut Decoder<'_>) -> Result<(), CodecError> {
    skip_at_depth(dec, 0)
}

fn skip_at_depth(dec: &mut Decoder<'_>, depth: usize) -> Result<(), CodecError> {
    if depth > MAX_SKIP_DEPTH {
        return Err(CodecError::Malformed("described value nested too deeply".into()));
    }

    let ctor = dec.read_u8()?;
    if ctor == DESCRIBED {
        skip_at_depth(dec, depth + 1)?;
        return skip_at_depth(dec, depth + 1);
    }

    // The high nibble of a constructor fixes the width of its payload.
    let len = match ctor >> 4 {
        0x4 => 0,
        0x5 => 1,
        0x6 => 2,
        0x7 => 4,
        0x8 => 8,
        0x9 => 16,
        0xa | 0xc | 0xe => dec.read_u8()? as usize,
        0xb | 0xd | 0xf => dec.read_u32()? as usize,
        _ => return Err(unexpected("known type", ctor)),
    };
    dec.take(len).map(|_| ())
}
