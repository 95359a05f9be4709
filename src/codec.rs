//! Binary layout of temporal values.
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! [duration tag u8][value-type tag u8][count u32]
//! [flags u8: lower_inc | upper_inc | linear | has_bbox]
//! [bounding box, when has_bbox: vmin f64, vmax f64, tmin i64, tmax i64, bounds u8]
//! [ordered instants: value payload per type tag, timestamp i64]
//! ```
//!
//! A sequence set encodes its header and box followed by `count` nested
//! sequence encodings. Decoding re-validates through the public
//! constructors, so a malformed buffer never yields a partial value.

use crate::error::{Result, TemporaError};
use crate::temporal::{
    Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
};
use bytes::{BufMut, Bytes, BytesMut};
use tempora_types::{SumCount, Timestamp, Value, ValueType};

const TAG_INSTANT: u8 = 1;
const TAG_INSTANT_SET: u8 = 2;
const TAG_SEQUENCE: u8 = 3;
const TAG_SEQUENCE_SET: u8 = 4;

const VTYPE_INT: u8 = 1;
const VTYPE_FLOAT: u8 = 2;
const VTYPE_SUM_COUNT: u8 = 3;

const FLAG_LOWER_INC: u8 = 0b0001;
const FLAG_UPPER_INC: u8 = 0b0010;
const FLAG_LINEAR: u8 = 0b0100;
const FLAG_HAS_BBOX: u8 = 0b1000;

/// Encode a temporal value into its binary layout.
pub fn encode(temp: &Temporal) -> Bytes {
    let mut buf = BytesMut::with_capacity(32 + 20 * temp.num_instants());
    encode_into(temp, &mut buf);
    buf.freeze()
}

/// Decode a temporal value, consuming the whole buffer.
pub fn decode(bytes: &[u8]) -> Result<Temporal> {
    let mut reader = Reader::new(bytes);
    let temp = decode_one(&mut reader)?;
    if !reader.is_empty() {
        return Err(TemporaError::Serialization(format!(
            "{} trailing bytes after a complete value",
            reader.remaining()
        )));
    }
    Ok(temp)
}

fn encode_into(temp: &Temporal, buf: &mut BytesMut) {
    match temp {
        Temporal::Instant(inst) => {
            put_header(buf, TAG_INSTANT, inst.value_type(), 1, true, true, temp, false);
            put_instant(buf, inst);
        }
        Temporal::InstantSet(set) => {
            put_header(
                buf,
                TAG_INSTANT_SET,
                set.value_type(),
                set.num_instants(),
                true,
                true,
                temp,
                true,
            );
            for inst in set.instants() {
                put_instant(buf, inst);
            }
        }
        Temporal::Sequence(seq) => {
            put_header(
                buf,
                TAG_SEQUENCE,
                seq.value_type(),
                seq.num_instants(),
                seq.lower_inc(),
                seq.upper_inc(),
                temp,
                true,
            );
            for inst in seq.instants() {
                put_instant(buf, inst);
            }
        }
        Temporal::SequenceSet(set) => {
            let span = set.time_span();
            put_header(
                buf,
                TAG_SEQUENCE_SET,
                set.value_type(),
                set.num_sequences(),
                span.lower_inc,
                span.upper_inc,
                temp,
                true,
            );
            for seq in set.sequences() {
                encode_into(&Temporal::Sequence(seq.clone()), buf);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn put_header(
    buf: &mut BytesMut,
    tag: u8,
    value_type: ValueType,
    count: usize,
    lower_inc: bool,
    upper_inc: bool,
    temp: &Temporal,
    has_bbox: bool,
) {
    buf.put_u8(tag);
    buf.put_u8(match value_type {
        ValueType::Int => VTYPE_INT,
        ValueType::Float => VTYPE_FLOAT,
        ValueType::SumCount => VTYPE_SUM_COUNT,
    });
    buf.put_u32_le(count as u32);
    let mut flags = 0u8;
    if lower_inc {
        flags |= FLAG_LOWER_INC;
    }
    if upper_inc {
        flags |= FLAG_UPPER_INC;
    }
    if temp.interpolation() == Interpolation::Linear {
        flags |= FLAG_LINEAR;
    }
    if has_bbox {
        flags |= FLAG_HAS_BBOX;
    }
    buf.put_u8(flags);
    if has_bbox {
        let bbox = temp.bounding_box();
        buf.put_f64_le(bbox.vmin());
        buf.put_f64_le(bbox.vmax());
        buf.put_i64_le(bbox.period().lower.as_micros());
        buf.put_i64_le(bbox.period().upper.as_micros());
        let mut bounds = 0u8;
        if bbox.period().lower_inc {
            bounds |= FLAG_LOWER_INC;
        }
        if bbox.period().upper_inc {
            bounds |= FLAG_UPPER_INC;
        }
        buf.put_u8(bounds);
    }
}

fn put_instant(buf: &mut BytesMut, inst: &TInstant) {
    match inst.value() {
        Value::Int(v) => buf.put_i32_le(v),
        Value::Float(v) => buf.put_f64_le(v),
        Value::SumCount(sc) => {
            buf.put_f64_le(sc.sum);
            buf.put_i64_le(sc.count);
        }
    }
    buf.put_i64_le(inst.timestamp().as_micros());
}

fn decode_one(reader: &mut Reader<'_>) -> Result<Temporal> {
    let tag = reader.u8()?;
    let value_type = match reader.u8()? {
        VTYPE_INT => ValueType::Int,
        VTYPE_FLOAT => ValueType::Float,
        VTYPE_SUM_COUNT => ValueType::SumCount,
        other => {
            return Err(TemporaError::Serialization(format!(
                "unknown value type tag {}",
                other
            )));
        }
    };
    let count = reader.u32()? as usize;
    if count == 0 {
        return Err(TemporaError::Serialization(
            "a temporal value encodes at least one element".to_string(),
        ));
    }
    let flags = reader.u8()?;
    let lower_inc = flags & FLAG_LOWER_INC != 0;
    let upper_inc = flags & FLAG_UPPER_INC != 0;
    let interp = if flags & FLAG_LINEAR != 0 {
        Interpolation::Linear
    } else {
        Interpolation::Stepwise
    };
    if flags & FLAG_HAS_BBOX != 0 {
        // The box is rebuilt by the constructors; the encoded copy only
        // serves index layers that scan headers without materializing.
        reader.skip(8 + 8 + 8 + 8 + 1)?;
    }

    match tag {
        TAG_INSTANT => {
            if count != 1 {
                return Err(TemporaError::Serialization(format!(
                    "an instant encodes exactly one element, header claims {}",
                    count
                )));
            }
            let inst = read_instant(reader, value_type)?;
            Ok(Temporal::Instant(inst))
        }
        TAG_INSTANT_SET => {
            let instants = read_instants(reader, value_type, count)?;
            Ok(Temporal::InstantSet(TInstantSet::new(instants)?))
        }
        TAG_SEQUENCE => {
            let instants = read_instants(reader, value_type, count)?;
            Ok(Temporal::Sequence(TSequence::new(
                instants, lower_inc, upper_inc, interp,
            )?))
        }
        TAG_SEQUENCE_SET => {
            let mut sequences = Vec::with_capacity(count);
            for _ in 0..count {
                match decode_one(reader)? {
                    Temporal::Sequence(seq) => sequences.push(seq),
                    other => {
                        return Err(TemporaError::Serialization(format!(
                            "sequence set components must be sequences, found tag for {:?}",
                            other.value_type()
                        )));
                    }
                }
            }
            Ok(Temporal::SequenceSet(TSequenceSet::new(sequences)?))
        }
        other => Err(TemporaError::Serialization(format!(
            "unknown duration tag {}",
            other
        ))),
    }
}

fn read_instants(
    reader: &mut Reader<'_>,
    value_type: ValueType,
    count: usize,
) -> Result<Vec<TInstant>> {
    let mut instants = Vec::with_capacity(count);
    for _ in 0..count {
        instants.push(read_instant(reader, value_type)?);
    }
    Ok(instants)
}

fn read_instant(reader: &mut Reader<'_>, value_type: ValueType) -> Result<TInstant> {
    let value = match value_type {
        ValueType::Int => Value::Int(reader.i32()?),
        ValueType::Float => Value::Float(reader.f64()?),
        ValueType::SumCount => Value::SumCount(SumCount {
            sum: reader.f64()?,
            count: reader.i64()?,
        }),
    };
    TInstant::new(value, Timestamp::from_micros(reader.i64()?))
}

/// Bounds-checked little-endian reader over a byte slice.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(TemporaError::Serialization(format!(
                "truncated value: needed {} bytes, {} left",
                n,
                self.bytes.len()
            )));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes(raw.try_into().expect("4 bytes taken")))
    }

    fn i32(&mut self) -> Result<i32> {
        let raw = self.take(4)?;
        Ok(i32::from_le_bytes(raw.try_into().expect("4 bytes taken")))
    }

    fn i64(&mut self) -> Result<i64> {
        let raw = self.take(8)?;
        Ok(i64::from_le_bytes(raw.try_into().expect("8 bytes taken")))
    }

    fn f64(&mut self) -> Result<f64> {
        let raw = self.take(8)?;
        Ok(f64::from_le_bytes(raw.try_into().expect("8 bytes taken")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finst(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn test_instant_round_trip() {
        let temp = Temporal::Instant(
            TInstant::new(Value::Int(42), Timestamp::from_micros(123_456)).unwrap(),
        );
        assert_eq!(decode(&encode(&temp)).unwrap(), temp);
    }

    #[test]
    fn test_sequence_round_trip_keeps_flags() {
        let temp = Temporal::Sequence(
            TSequence::new(
                vec![finst(1.5, 0), finst(2.5, 10), finst(-3.0, 20)],
                false,
                true,
                Interpolation::Linear,
            )
            .unwrap(),
        );
        let decoded = decode(&encode(&temp)).unwrap();
        assert_eq!(decoded, temp);
        let Temporal::Sequence(seq) = decoded else {
            panic!("expected a sequence");
        };
        assert!(!seq.lower_inc());
        assert!(seq.upper_inc());
    }

    #[test]
    fn test_sequence_set_round_trip() {
        let set = TSequenceSet::new(vec![
            TSequence::new(
                vec![finst(1.0, 0), finst(2.0, 10)],
                true,
                false,
                Interpolation::Stepwise,
            )
            .unwrap(),
            TSequence::new(
                vec![finst(7.0, 10), finst(8.0, 20)],
                true,
                true,
                Interpolation::Stepwise,
            )
            .unwrap(),
        ])
        .unwrap();
        let temp = Temporal::SequenceSet(set);
        assert_eq!(decode(&encode(&temp)).unwrap(), temp);
    }

    #[test]
    fn test_sum_count_round_trip() {
        let temp = Temporal::Instant(
            TInstant::new(
                Value::SumCount(SumCount { sum: 9.5, count: 3 }),
                Timestamp::from_secs(1),
            )
            .unwrap(),
        );
        assert_eq!(decode(&encode(&temp)).unwrap(), temp);
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let bytes = encode(&Temporal::Instant(finst(1.0, 0)));
        for cut in 0..bytes.len() {
            assert!(decode(&bytes[..cut]).is_err());
        }
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        let mut bytes = encode(&Temporal::Instant(finst(1.0, 0))).to_vec();
        bytes.push(0);
        assert!(matches!(
            decode(&bytes),
            Err(TemporaError::Serialization(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_tags() {
        let mut bytes = encode(&Temporal::Instant(finst(1.0, 0))).to_vec();
        bytes[0] = 9;
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_revalidates_ordering() {
        // A sequence whose instants are out of order must fail through the
        // constructor, leaving no partial value.
        let good = Temporal::Sequence(
            TSequence::new(
                vec![finst(1.0, 0), finst(2.0, 10)],
                true,
                true,
                Interpolation::Linear,
            )
            .unwrap(),
        );
        let mut bytes = encode(&good).to_vec();
        let len = bytes.len();
        // Zero the second instant's timestamp so it collides with the first.
        bytes[len - 8..].fill(0);
        assert!(decode(&bytes).is_err());
    }
}
