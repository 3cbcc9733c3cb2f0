use std::fmt;

use crate::protocol::primitive::Decoder;
use crate::protocol::{
    marshal_composite, peek_descriptor, required, unmarshal_composite, CodecError, Composite, Field, FieldSpec,
};

pub const SASL_MECHANISMS: u64 = 0x40;
pub const SASL_INIT: u64 = 0x41;
pub const SASL_CHALLENGE: u64 = 0x42;
pub const SASL_RESPONSE: u64 = 0x43;
pub const SASL_OUTCOME: u64 = 0x44;

pub const MECHANISM_PLAIN: &str = "PLAIN";

const DESCRIPTOR_NAMES: [(u64, &str); 5] = [
    (SASL_MECHANISMS, "amqp:sasl-mechanisms:list"),
    (SASL_INIT, "amqp:sasl-init:list"),
    (SASL_CHALLENGE, "amqp:sasl-challenge:list"),
    (SASL_RESPONSE, "amqp:sasl-response:list"),
    (SASL_OUTCOME, "amqp:sasl-outcome:list"),
];

pub fn descriptor_code(name: &str) -> Option<u64> {
    DESCRIPTOR_NAMES.iter().find(|(_, n)| *n == name).map(|(code, _)| *code)
}

pub fn descriptor_name(code: u64) -> Option<&'static str> {
    DESCRIPTOR_NAMES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// Protocol-level identifier. Only ASCII symbols can be encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_ascii()
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a SASL exchange, carried as a ubyte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SaslCode {
    #[default]
    Ok = 0,
    /// Bad credentials.
    Auth = 1,
    Sys = 2,
    SysPerm = 3,
    SysTemp = 4,
}

impl SaslCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == SaslCode::Ok
    }

    /// Failures a later reconnect may get past without changing credentials.
    pub fn is_transient(self) -> bool {
        matches!(self, SaslCode::Sys | SaslCode::SysTemp)
    }
}

impl TryFrom<u64> for SaslCode {
    type Error = CodecError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(SaslCode::Ok),
            1 => Ok(SaslCode::Auth),
            2 => Ok(SaslCode::Sys),
            3 => Ok(SaslCode::SysPerm),
            4 => Ok(SaslCode::SysTemp),
            other => Err(CodecError::Malformed(format!("sasl-code out of range: {other}"))),
        }
    }
}

impl fmt::Display for SaslCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaslCode::Ok => "ok",
            SaslCode::Auth => "auth",
            SaslCode::Sys => "sys",
            SaslCode::SysPerm => "sys-perm",
            SaslCode::SysTemp => "sys-temp",
        };
        f.write_str(s)
    }
}

// Opaque SASL payloads can carry credentials; Debug only shows their length.
struct Redacted<'a>(&'a [u8]);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}

/// Mechanisms the broker supports, in its order of preference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaslMechanisms {
    pub mechanisms: Vec<Symbol>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SaslInit {
    pub mechanism: Symbol,
    pub initial_response: Vec<u8>,
    pub hostname: String,
}

impl fmt::Debug for SaslInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslInit")
            .field("mechanism", &self.mechanism)
            .field("initial_response", &Redacted(&self.initial_response))
            .field("hostname", &self.hostname)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaslChallenge {
    pub challenge: Vec<u8>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SaslResponse {
    pub response: Vec<u8>,
}

impl fmt::Debug for SaslResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslResponse")
            .field("response", &Redacted(&self.response))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaslOutcome {
    pub code: SaslCode,
    pub additional_data: Vec<u8>,
}

impl Composite for SaslMechanisms {
    const DESCRIPTOR: u64 = SASL_MECHANISMS;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        marshal_composite(out, Self::DESCRIPTOR, &[FieldSpec::mandatory(Field::Symbols(&self.mechanisms))])
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut list = unmarshal_composite(dec, Self::DESCRIPTOR)?;
        // An absent list is an empty advertisement, which selection then refuses.
        let mechanisms = list.symbols()?.unwrap_or_default();
        list.finish()?;
        Ok(Self { mechanisms })
    }
}

impl Composite for SaslInit {
    const DESCRIPTOR: u64 = SASL_INIT;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        marshal_composite(
            out,
            Self::DESCRIPTOR,
            &[
                FieldSpec::mandatory(Field::Symbol(&self.mechanism)),
                FieldSpec::optional(Field::Binary(&self.initial_response), self.initial_response.is_empty()),
                FieldSpec::optional(Field::Str(&self.hostname), self.hostname.is_empty()),
            ],
        )
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut list = unmarshal_composite(dec, Self::DESCRIPTOR)?;
        let mechanism = required(list.symbol()?, "mechanism")?;
        let initial_response = list.binary()?.unwrap_or_default();
        let hostname = list.string()?.unwrap_or_default();
        list.finish()?;
        Ok(Self { mechanism, initial_response, hostname })
    }
}

impl Composite for SaslChallenge {
    const DESCRIPTOR: u64 = SASL_CHALLENGE;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        marshal_composite(out, Self::DESCRIPTOR, &[FieldSpec::mandatory(Field::Binary(&self.challenge))])
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut list = unmarshal_composite(dec, Self::DESCRIPTOR)?;
        let challenge = required(list.binary()?, "challenge")?;
        list.finish()?;
        Ok(Self { challenge })
    }
}

impl Composite for SaslResponse {
    const DESCRIPTOR: u64 = SASL_RESPONSE;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        marshal_composite(out, Self::DESCRIPTOR, &[FieldSpec::mandatory(Field::Binary(&self.response))])
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut list = unmarshal_composite(dec, Self::DESCRIPTOR)?;
        let response = required(list.binary()?, "response")?;
        list.finish()?;
        Ok(Self { response })
    }
}

impl Composite for SaslOutcome {
    const DESCRIPTOR: u64 = SASL_OUTCOME;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        marshal_composite(
            out,
            Self::DESCRIPTOR,
            &[
                FieldSpec::mandatory(Field::Ubyte(self.code.as_u8())),
                FieldSpec::optional(Field::Binary(&self.additional_data), self.additional_data.is_empty()),
            ],
        )
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut list = unmarshal_composite(dec, Self::DESCRIPTOR)?;
        let code = SaslCode::try_from(required(list.uint()?, "code")?)?;
        let additional_data = list.binary()?.unwrap_or_default();
        list.finish()?;
        Ok(Self { code, additional_data })
    }
}

/// Any SASL frame body, dispatched on its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslFrameBody {
    Mechanisms(SaslMechanisms),
    Init(SaslInit),
    Challenge(SaslChallenge),
    Response(SaslResponse),
    Outcome(SaslOutcome),
}

impl SaslFrameBody {
    pub fn descriptor(&self) -> u64 {
        match self {
            SaslFrameBody::Mechanisms(_) => SASL_MECHANISMS,
            SaslFrameBody::Init(_) => SASL_INIT,
            SaslFrameBody::Challenge(_) => SASL_CHALLENGE,
            SaslFrameBody::Response(_) => SASL_RESPONSE,
            SaslFrameBody::Outcome(_) => SASL_OUTCOME,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            SaslFrameBody::Mechanisms(m) => m.encode(),
            SaslFrameBody::Init(m) => m.encode(),
            SaslFrameBody::Challenge(m) => m.encode(),
            SaslFrameBody::Response(m) => m.encode(),
            SaslFrameBody::Outcome(m) => m.encode(),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let descriptor = peek_descriptor(bytes)?;
        match descriptor.code() {
            Some(SASL_MECHANISMS) => SaslMechanisms::decode(bytes).map(SaslFrameBody::Mechanisms),
            Some(SASL_INIT) => SaslInit::decode(bytes).map(SaslFrameBody::Init),
            Some(SASL_CHALLENGE) => SaslChallenge::decode(bytes).map(SaslFrameBody::Challenge),
            Some(SASL_RESPONSE) => SaslResponse::decode(bytes).map(SaslFrameBody::Response),
            Some(SASL_OUTCOME) => SaslOutcome::decode(bytes).map(SaslFrameBody::Outcome),
            _ => Err(CodecError::Malformed(format!("not a SASL performative: {descriptor}"))),
        }
    }
}
