use crate::error::NdefError;
use crate::uri::UriRecord;

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Type and ID lengths are encoded in a single byte.
const MAX_SHORT_FIELD: usize = u8::MAX as usize;

/// Type Name Format values (NFC Forum NDEF 1.0, section 3.2.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tnf {
    Empty,
    WellKnown,
    MimeMedia,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
    Reserved,
}

impl Tnf {
    fn from_bits(bits: u8) -> Self {
        match bits & TNF_MASK {
            0x00 => Tnf::Empty,
            0x01 => Tnf::WellKnown,
            0x02 => Tnf::MimeMedia,
            0x03 => Tnf::AbsoluteUri,
            0x04 => Tnf::External,
            0x05 => Tnf::Unknown,
            0x06 => Tnf::Unchanged,
            _ => Tnf::Reserved,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Tnf::Empty => 0x00,
            Tnf::WellKnown => 0x01,
            Tnf::MimeMedia => 0x02,
            Tnf::AbsoluteUri => 0x03,
            Tnf::External => 0x04,
            Tnf::Unknown => 0x05,
            Tnf::Unchanged => 0x06,
            Tnf::Reserved => 0x07,
        }
    }
}

/// Well-known record type for URIs.
pub const RTD_URI: &[u8] = b"U";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefRecord {
    pub tnf: Tnf,
    pub record_type: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    pub fn uri(uri: &UriRecord) -> Self {
        Self {
            tnf: Tnf::WellKnown,
            record_type: RTD_URI.to_vec(),
            id: Vec::new(),
            payload: uri.to_payload(),
        }
    }

    pub fn is_uri(&self) -> bool {
        self.tnf == Tnf::WellKnown && self.record_type == RTD_URI
    }

    /// Decode the payload of a well-known URI record.
    pub fn to_uri(&self) -> Result<UriRecord, NdefError> {
        if !self.is_uri() {
            return Err(NdefError::NotUri);
        }
        UriRecord::from_payload(&self.payload)
    }

    fn check_field_lengths(&self, index: usize) -> Result<(), NdefError> {
        for (field, len) in [("type", self.record_type.len()), ("id", self.id.len())] {
            if len > MAX_SHORT_FIELD {
                return Err(NdefError::FieldTooLong { index, field, len });
            }
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        let length_field = if self.payload.len() < 256 { 1 } else { 4 };
        let id_field = if self.id.is_empty() { 0 } else { 1 };
        2 + length_field
            + id_field
            + self.record_type.len()
            + self.id.len()
            + self.payload.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>, first: bool, last: bool) {
        let short = self.payload.len() < 256;
        let mut header = self.tnf.bits();
        if first {
            header |= FLAG_MB;
        }
        if last {
            header |= FLAG_ME;
        }
        if short {
            header |= FLAG_SR;
        }
        if !self.id.is_empty() {
            header |= FLAG_IL;
        }
        out.push(header);
        out.push(self.record_type.len() as u8);
        if short {
            out.push(self.payload.len() as u8);
        } else {
            out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        }
        if !self.id.is_empty() {
            out.push(self.id.len() as u8);
        }
        out.extend_from_slice(&self.record_type);
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.payload);
    }
}

/// An NDEF message: one or more records framed by MB/ME flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Result<Self, NdefError> {
        if records.is_empty() {
            return Err(NdefError::Empty);
        }
        for (index, record) in records.iter().enumerate() {
            record.check_field_lengths(index)?;
        }
        Ok(Self { records })
    }

    /// Single-record message holding one URI.
    pub fn single_uri(uri: &UriRecord) -> Self {
        Self {
            records: vec![NdefRecord::uri(uri)],
        }
    }

    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    /// Size in bytes of [`NdefMessage::encode`] output.
    pub fn encoded_len(&self) -> usize {
        self.records.iter().map(NdefRecord::encoded_len).sum()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let last = self.records.len() - 1;
        for (i, record) in self.records.iter().enumerate() {
            record.encode_into(&mut out, i == 0, i == last);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, NdefError> {
        if bytes.is_empty() {
            return Err(NdefError::Empty);
        }
        let mut reader = Reader { bytes, pos: 0 };
        let mut records = Vec::new();
        loop {
            let index = records.len();
            let header = reader.u8()?;
            if header & FLAG_CF != 0 {
                return Err(NdefError::Chunked);
            }
            if (header & FLAG_MB != 0) != (index == 0) {
                return Err(NdefError::MessageBegin { index });
            }
            let type_len = reader.u8()? as usize;
            let payload_len = if header & FLAG_SR != 0 {
                reader.u8()? as usize
            } else {
                u32::from_be_bytes(reader.array()?) as usize
            };
            let id_len = if header & FLAG_IL != 0 {
                reader.u8()? as usize
            } else {
                0
            };
            let record_type = reader.take(type_len)?.to_vec();
            let id = reader.take(id_len)?.to_vec();
            let payload = reader.take(payload_len)?.to_vec();
            records.push(NdefRecord {
                tnf: Tnf::from_bits(header),
                record_type,
                id,
                payload,
            });

            let end = header & FLAG_ME != 0;
            match (end, reader.is_done()) {
                (true, true) => break,
                (false, false) => continue,
                _ => return Err(NdefError::MessageEnd { index }),
            }
        }
        Ok(Self { records })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], NdefError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(NdefError::Truncated { offset: self.pos })?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, NdefError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], NdefError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
