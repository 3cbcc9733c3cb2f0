use crate::framing::FramingError;

pub const FRAME_HEADER_LEN: usize = 8;

// Data offset in 4-byte words; 2 means no extended header.
pub const DEFAULT_DOFF: u8 = 2;

pub const FRAME_TYPE_AMQP: u8 = 0x00;
pub const FRAME_TYPE_SASL: u8 = 0x01;

/// One transport frame: type tag, channel and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: u8,
    pub channel: u16,
    pub payload: Vec<u8>,
}

impl Frame {
    /// SASL frames always travel on channel 0.
    pub fn sasl(payload: Vec<u8>) -> Self {
        Self {
            frame_type: FRAME_TYPE_SASL,
            channel: 0,
            payload,
        }
    }

    /// Size field value: header plus body.
    pub fn encoded_len(&self) -> Result<u32, FramingError> {
        u32::try_from(FRAME_HEADER_LEN + self.payload.len()).map_err(|_| FramingError::FrameTooLarge {
            len: u32::MAX,
            max: u32::MAX,
        })
    }

    pub fn encode_header(&self) -> Result<[u8; FRAME_HEADER_LEN], FramingError> {
        let size = self.encoded_len()?;
        let mut header = [0u8; FRAME_HEADER_LEN];
        header[..4].copy_from_slice(&size.to_be_bytes());
        header[4] = DEFAULT_DOFF;
        header[5] = self.frame_type;
        header[6..].copy_from_slice(&self.channel.to_be_bytes());
        Ok(header)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameLimits {
    pub max_frame_len: u32,
}

impl FrameLimits {
    pub const DEFAULT: FrameLimits = FrameLimits {
        max_frame_len: 65_536, // 64 KB
    };

    /// `len` is the full frame size, header included.
    pub fn validate_len(&self, len: u32) -> Result<(), FramingError> {
        if (len as usize) < FRAME_HEADER_LEN {
            return Err(FramingError::MalformedHeader(format!(
                "frame size {len} is smaller than the header"
            )));
        }

        if len > self.max_frame_len {
            return Err(FramingError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }
        Ok(())
    }
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
