//! Conversion between wire records and their text form.
//!
//! Native buffers cannot be written as text, so [`encode_text`] lowers them
//! through the codec into descriptors plus an out-of-band [`TransferList`].
//! [`decode_text`] does the reverse and raises every descriptor back into a
//! native buffer, which lets the deserializer skip conversion entirely.

use crate::codec::{self, CodecPolicy, TransferList};
use crate::serialize::{DeserializeError, SerializeError};

use super::format::{self, Format};
use super::types::{FORMAT_VERSION, RecordHeader, WireRecord};

/// A wire record in text form, with the raw buffers its descriptors index.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    pub text: String,
    pub buffers: TransferList,
}

/// Encode `record` as text.
///
/// Native buffers are lowered with `policy` (forced to the transfer
/// transport). Plain sequences and existing descriptors are written as they
/// are; descriptors are only meaningful if the caller ships matching
/// buffers, see [`encode_text_with`].
pub fn encode_text(
    record: WireRecord,
    format: Format,
    policy: &CodecPolicy,
) -> Result<EncodedRecord, SerializeError> {
    encode_text_with(record, TransferList::new(), format, policy)
}

/// Encode `record` whose descriptors already index `buffers`.
///
/// Lowered native buffers are appended to `buffers`, and the combined list
/// is returned with the text.
pub fn encode_text_with(
    mut record: WireRecord,
    mut buffers: TransferList,
    format: Format,
    policy: &CodecPolicy,
) -> Result<EncodedRecord, SerializeError> {
    record.try_for_each_attribute_mut(|_, _, attribute| {
        let wire = std::mem::replace(&mut attribute.array, codec::WireBuffer::Plain(Vec::new()));
        attribute.array = codec::lower(wire, policy, &mut buffers);
        Ok::<_, SerializeError>(())
    })?;
    let text = format::encode(&record, format)?;
    log::debug!(
        "encoded wire record: {} bytes of text, {} out-of-band buffers",
        text.len(),
        buffers.len()
    );
    Ok(EncodedRecord { text, buffers })
}

/// Decode text produced by [`encode_text`] (or any compatible writer).
///
/// The header is checked before the body is parsed, so a record from a
/// newer writer fails with [`DeserializeError::UnsupportedVersion`] even if
/// its body no longer matches this schema.
pub fn decode_text(
    text: &str,
    buffers: &TransferList,
    format: Format,
) -> Result<WireRecord, DeserializeError> {
    let header: RecordHeader = format::decode(text, format)?;
    check_version(header.metadata.version)?;

    let mut record: WireRecord = format::decode(text, format)?;
    record.try_for_each_attribute_mut(|geometry, name, attribute| {
        let wire = std::mem::replace(&mut attribute.array, codec::WireBuffer::Plain(Vec::new()));
        attribute.array =
            codec::raise(wire, buffers).map_err(|source| DeserializeError::Codec {
                geometry: geometry.to_owned(),
                attribute: name.to_owned(),
                source,
            })?;
        Ok::<_, DeserializeError>(())
    })?;
    Ok(record)
}

pub(crate) fn check_version(found: u32) -> Result<(), DeserializeError> {
    if found > FORMAT_VERSION {
        return Err(DeserializeError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::codec::{AttributeArray, ElementType, WireBuffer};
    use crate::record::{AttributeRecord, GeometryData, GeometryRecord, NodeRecord};
    use crate::resource::ResourceId;
    use crate::scene::NodeKind;

    fn record_with(array: WireBuffer) -> WireRecord {
        let mut attributes = IndexMap::new();
        attributes.insert(
            "position".to_owned(),
            AttributeRecord {
                item_size: 3,
                element_type: ElementType::Float32,
                array,
                normalized: false,
            },
        );
        let mut record = WireRecord::new(NodeRecord::new("root", NodeKind::Scene));
        record.geometries.push(GeometryRecord {
            id: ResourceId(0),
            uuid: "geo".into(),
            kind: "BufferGeometry".into(),
            name: None,
            data: GeometryData {
                attributes,
                index: None,
            },
        });
        record
    }

    fn position(record: &WireRecord) -> &WireBuffer {
        &record.geometries[0].data.attributes["position"].array
    }

    #[test]
    fn native_buffers_travel_out_of_band() {
        let array = AttributeArray::from(vec![0.25f32; 3000]);
        let record = record_with(WireBuffer::Native(array.clone()));

        let encoded = encode_text(record, Format::Json, &CodecPolicy::shared()).unwrap();
        assert!(encoded.text.contains("\"__type\":\"TypedArray\""));
        assert_eq!(encoded.buffers.len(), 1);

        let decoded = decode_text(&encoded.text, &encoded.buffers, Format::Json).unwrap();
        match position(&decoded) {
            WireBuffer::Native(native) => assert!(native.same_allocation(&array)),
            other => panic!("expected native, got {other:?}"),
        }
    }

    #[test]
    fn small_native_buffers_become_plain_text() {
        let array = AttributeArray::from(vec![1.0f32, 2.0, 3.0]);
        let record = record_with(WireBuffer::Native(array));

        let encoded = encode_text(record, Format::Json, &CodecPolicy::default()).unwrap();
        assert!(encoded.buffers.is_empty());
        assert!(encoded.text.contains("\"array\":[1.0,2.0,3.0]"));

        let decoded = decode_text(&encoded.text, &encoded.buffers, Format::Json).unwrap();
        assert_eq!(position(&decoded), &WireBuffer::Plain(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn newer_version_is_rejected_before_body_parse() {
        let text = r#"{"metadata":{"version":9,"type":"Object","generator":"future"},"scene":{}}"#;
        let err = decode_text(text, &TransferList::new(), Format::Json).unwrap_err();
        assert!(matches!(
            err,
            DeserializeError::UnsupportedVersion {
                found: 9,
                supported: 1
            }
        ));
    }

    #[test]
    fn missing_transfer_names_the_attribute() {
        let record = record_with(WireBuffer::Native(AttributeArray::from(vec![0u16; 900])));
        let encoded = encode_text(record, Format::Json, &CodecPolicy::default()).unwrap();

        let err = decode_text(&encoded.text, &TransferList::new(), Format::Json).unwrap_err();
        match err {
            DeserializeError::Codec {
                geometry,
                attribute,
                ..
            } => {
                assert_eq!(geometry, "geo");
                assert_eq!(attribute, "position");
            }
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn existing_descriptors_keep_their_buffers() {
        let shipped = AttributeArray::from(vec![7u32; 600]);
        let mut buffers = TransferList::new();
        let wire = codec::encode(&shipped, &CodecPolicy::transfer(), &mut buffers);
        let mut record = record_with(wire);
        let extra = AttributeArray::from(vec![0.5f32; 900]);
        record.geometries[0].data.index = Some(AttributeRecord {
            item_size: 1,
            element_type: ElementType::Float32,
            array: WireBuffer::Native(extra.clone()),
            normalized: false,
        });

        let encoded =
            encode_text_with(record, buffers, Format::Json, &CodecPolicy::shared()).unwrap();
        assert_eq!(encoded.buffers.len(), 2);
        assert!(encoded.buffers.get(0).unwrap().same_allocation(&shipped));
        assert!(encoded.buffers.get(1).unwrap().same_allocation(&extra));

        let decoded = decode_text(&encoded.text, &encoded.buffers, Format::Json).unwrap();
        match position(&decoded) {
            WireBuffer::Native(native) => assert!(native.same_allocation(&shipped)),
            other => panic!("expected native, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_plain_values_load_as_nan() {
        let array = AttributeArray::from(vec![f32::NAN, 0.0, 1.0, f32::INFINITY, 2.0, 3.0]);
        let record = record_with(WireBuffer::Native(array));

        let encoded = encode_text(record, Format::Json, &CodecPolicy::default()).unwrap();
        assert!(encoded.text.contains("\"array\":[null,0.0,1.0,null,2.0,3.0]"));

        let decoded = decode_text(&encoded.text, &encoded.buffers, Format::Json).unwrap();
        let WireBuffer::Plain(values) = position(&decoded) else {
            panic!("expected plain values");
        };
        assert!(values[0].is_nan());
        assert!(values[3].is_nan());
        assert_eq!(values[4..], [2.0, 3.0]);
    }

    #[test]
    fn trailing_text_is_malformed() {
        let record = record_with(WireBuffer::Plain(vec![0.0; 3]));
        let mut text = encode_text(record, Format::Json, &CodecPolicy::default())
            .unwrap()
            .text;
        text.push_str(" {}");
        let err = decode_text(&text, &TransferList::new(), Format::Json).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn garbage_text_is_malformed() {
        let err = decode_text("{not json", &TransferList::new(), Format::Json).unwrap_err();
        assert!(err.is_malformed());
    }
}
