//! the CBOR idioms shared with the haskell implementation

pub mod util {
    //! the envelope and container shapes the wire format keeps reusing:
    //! 2-element sum types, tag 24 wrapped encodings, the CRC32 address
    //! envelope and indefinite-length streams.

    use crate::crc32::crc32;
    use cbor_event::{self, de::Deserializer, se::Serializer, Len};
    use std::io::{BufRead, Write};

    /// read the `[tag, value…]` header of a 2-element sum type and
    /// return the tag; the value is left in the reader.
    pub fn decode_sum_type<R: BufRead>(raw: &mut Deserializer<R>) -> cbor_event::Result<u64> {
        raw.tuple(2, "sum type")?;
        raw.unsigned_integer()
    }

    /// write `t` as tag 24 over its own serialization wrapped in a
    /// byte string
    pub fn encode_cbor_in_tag24<'se, T, W>(
        t: &T,
        s: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>>
    where
        T: cbor_event::se::Serialize,
        W: Write + Sized,
    {
        s.write_tag(24)?.write_bytes(&to_bytes(t)?)
    }

    /// expect tag 24 and return the wrapped encoding
    pub fn raw_from_tag24<R: BufRead>(raw: &mut Deserializer<R>) -> cbor_event::Result<Vec<u8>> {
        let tag = raw.tag()?;
        if tag != 24 {
            return Err(cbor_event::Error::CustomError(format!(
                "Invalid Tag: {} but expected 24",
                tag
            )));
        }
        raw.bytes()
    }

    /// serialize the given object wrapped in the tag-24/CRC32 envelope:
    /// `[ tag24(bytes(cbor(t))), crc32(cbor(t)) ]`
    pub fn encode_with_crc32_<'se, T, W>(
        t: &T,
        s: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>>
    where
        T: cbor_event::se::Serialize,
        W: Write + Sized,
    {
        let bytes = to_bytes(t)?;
        let crc = crc32(&bytes) as u64;
        s.write_array(Len::Len(2))?
            .write_tag(24)?
            .write_bytes(&bytes)?
            .write_unsigned_integer(crc)
    }

    /// read back a tag-24/CRC32 envelope, verify the checksum and
    /// return the inner CBOR bytes.
    pub fn raw_with_crc32<R: BufRead>(raw: &mut Deserializer<R>) -> cbor_event::Result<Vec<u8>> {
        raw.tuple(2, "crc32 envelope")?;
        let bytes = raw_from_tag24(raw)?;
        let stored = raw.unsigned_integer()?;
        let computed = crc32(&bytes) as u64;
        if stored != computed {
            return Err(cbor_event::Error::CustomError(format!(
                "Invalid CRC32: 0x{:x} but expected 0x{:x}",
                stored, computed
            )));
        }
        Ok(bytes)
    }

    /// read an indefinite-length array up to its break
    pub fn read_indefinite_array<R, T>(raw: &mut Deserializer<R>) -> cbor_event::Result<Vec<T>>
    where
        R: BufRead,
        T: cbor_event::de::Deserialize,
    {
        let len = raw.array()?;
        if len != Len::Indefinite {
            return Err(cbor_event::Error::CustomError(format!(
                "expected an indefinite-length array but received {:?}",
                len
            )));
        }
        let mut vec = Vec::new();
        loop {
            if raw.cbor_type()? == cbor_event::Type::Special {
                let brk = raw.special()?;
                if brk != cbor_event::Special::Break {
                    return Err(cbor_event::Error::CustomError(format!(
                        "unexpected special value in an indefinite array: {:?}",
                        brk
                    )));
                }
                return Ok(vec);
            }
            vec.push(raw.deserialize()?);
        }
    }

    fn to_bytes<T: cbor_event::se::Serialize>(t: &T) -> cbor_event::Result<Vec<u8>> {
        let mut se = Serializer::new_vec();
        t.serialize(&mut se)?;
        Ok(se.finalize())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use cbor_event::se::Serializer;
        use std::io::Cursor;

        struct Plain(&'static [u8]);
        impl cbor_event::se::Serialize for Plain {
            fn serialize<'se, W: std::io::Write>(
                &self,
                serializer: &'se mut Serializer<W>,
            ) -> cbor_event::Result<&'se mut Serializer<W>> {
                serializer.write_bytes(self.0)
            }
        }

        const ENVELOPE: &'static [u8] = &[
            0x82, 0xd8, 0x18, 0x53, 0x52, 0x73, 0x6f, 0x6d, 0x65, 0x20, 0x72, 0x61, 0x6e, 0x64,
            0x6f, 0x6d, 0x20, 0x73, 0x74, 0x72, 0x69, 0x6e, 0x67, 0x1a, 0x71, 0xad, 0x58, 0x36,
        ];

        #[test]
        fn envelope_round_trip() {
            let mut se = Serializer::new_vec();
            encode_with_crc32_(&Plain(b"some random string"), &mut se).unwrap();
            let bytes = se.finalize();
            assert_eq!(ENVELOPE, bytes.as_slice());

            let mut raw = Deserializer::from(Cursor::new(&bytes));
            let inner = raw_with_crc32(&mut raw).unwrap();
            // the inner cbor is the bytes-wrapped payload
            assert_eq!(&inner[1..], b"some random string");
        }

        #[test]
        fn envelope_rejects_bad_crc() {
            let mut corrupted = ENVELOPE.to_vec();
            let last = corrupted.len() - 1;
            corrupted[last] ^= 0xff;
            let mut raw = Deserializer::from(Cursor::new(&corrupted));
            assert!(raw_with_crc32(&mut raw).is_err());
        }

        #[test]
        fn indefinite_array_requires_its_break() {
            // [_ 1, 2] without the closing break
            let truncated = [0x9f, 0x01, 0x02];
            let mut raw = Deserializer::from(Cursor::new(&truncated[..]));
            assert!(read_indefinite_array::<_, u32>(&mut raw).is_err());

            let complete = [0x9f, 0x01, 0x02, 0xff];
            let mut raw = Deserializer::from(Cursor::new(&complete[..]));
            assert_eq!(read_indefinite_array::<_, u32>(&mut raw).unwrap(), vec![1, 2]);
        }
    }
}
