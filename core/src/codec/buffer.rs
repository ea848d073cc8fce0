//! Encoding and decoding of attribute buffers.

use super::array::{AttributeArray, ElementType};
use super::error::CodecError;
use super::policy::{CodecPolicy, Transport};
use super::wire::{BufferDescriptor, TransferList, WireBuffer};

/// Encode a native buffer into its wire form.
///
/// Small buffers become plain sequences. Large ones either travel as the
/// native handle ([`Transport::Shared`]) or are pushed onto `transfers`
/// and replaced by a descriptor ([`Transport::Transfer`]).
pub fn encode(
    array: &AttributeArray,
    policy: &CodecPolicy,
    transfers: &mut TransferList,
) -> WireBuffer {
    if policy.inlines(array.len()) {
        return WireBuffer::Plain(array.to_f64_vec());
    }
    match policy.transport {
        Transport::Shared => WireBuffer::Native(array.clone()),
        Transport::Transfer => {
            let id = transfers.push(array);
            WireBuffer::Descriptor(BufferDescriptor::new(
                id,
                array.element_type(),
                0,
                array.len(),
            ))
        }
    }
}

/// Decode a wire buffer back into a native buffer.
///
/// `declared` is the element type recorded next to the buffer; it types
/// plain sequences, which carry no element type of their own. Native input
/// passes through unchanged.
pub fn decode(
    wire: &WireBuffer,
    declared: ElementType,
    transfers: &TransferList,
) -> Result<AttributeArray, CodecError> {
    match wire {
        WireBuffer::Plain(values) => Ok(AttributeArray::from_f64(declared, values)),
        WireBuffer::Native(array) => Ok(array.clone()),
        WireBuffer::Descriptor(desc) => decode_descriptor(desc, transfers),
    }
}

fn decode_descriptor(
    desc: &BufferDescriptor,
    transfers: &TransferList,
) -> Result<AttributeArray, CodecError> {
    let raw = transfers
        .get(desc.id)
        .ok_or(CodecError::MissingTransfer {
            id: desc.id,
            available: transfers.len(),
        })?;

    let ty = ElementType::from_ctor_name(&desc.ctor).unwrap_or_else(|| {
        log::warn!(
            "unknown buffer constructor {:?}, decoding as Float32Array",
            desc.ctor
        );
        ElementType::Float32
    });

    // The transferred buffer is exactly what the descriptor asks for.
    if raw.element_type() == ty && desc.byte_offset == 0 && raw.len() == desc.length {
        return Ok(raw.clone());
    }

    let width = ty.width();
    if desc.byte_offset % width != 0 {
        return Err(CodecError::Misaligned {
            offset: desc.byte_offset,
            width,
            ctor: ty.ctor_name(),
        });
    }
    let bytes = raw.as_bytes();
    let end = desc
        .length
        .checked_mul(width)
        .and_then(|len| len.checked_add(desc.byte_offset))
        .filter(|&end| end <= bytes.len())
        .ok_or(CodecError::OutOfBounds {
            offset: desc.byte_offset,
            end: desc.byte_offset.saturating_add(desc.length.saturating_mul(width)),
            byte_len: bytes.len(),
        })?;
    AttributeArray::from_bytes(ty, &bytes[desc.byte_offset..end])
}

/// Make a wire buffer safe for text output.
///
/// Native buffers are re-encoded with `policy` forced to
/// [`Transport::Transfer`]; plain sequences and descriptors are unchanged.
pub fn lower(wire: WireBuffer, policy: &CodecPolicy, transfers: &mut TransferList) -> WireBuffer {
    match wire {
        WireBuffer::Native(array) => encode(&array, &policy.for_text(), transfers),
        other => other,
    }
}

/// Resolve a descriptor read from text into a native buffer.
///
/// Plain sequences stay plain; they are typed later against the declared
/// element type.
pub fn raise(wire: WireBuffer, transfers: &TransferList) -> Result<WireBuffer, CodecError> {
    match wire {
        WireBuffer::Descriptor(desc) => decode_descriptor(&desc, transfers).map(WireBuffer::Native),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ty: ElementType, len: usize) -> AttributeArray {
        let values: Vec<f64> = (0..len).map(|i| (i % 97) as f64 - 40.0).collect();
        AttributeArray::from_f64(ty, &values)
    }

    #[test]
    fn small_buffers_encode_plain() {
        let array = AttributeArray::from(vec![1.0f32, 2.0, 3.0]);
        let mut transfers = TransferList::new();
        let wire = encode(&array, &CodecPolicy::transfer(), &mut transfers);
        assert_eq!(wire, WireBuffer::Plain(vec![1.0, 2.0, 3.0]));
        assert!(transfers.is_empty());
    }

    #[test]
    fn large_buffers_encode_as_descriptor_when_transferring() {
        let array = sample(ElementType::Float32, 1024);
        let mut transfers = TransferList::new();
        let wire = encode(&array, &CodecPolicy::transfer(), &mut transfers);
        match &wire {
            WireBuffer::Descriptor(desc) => {
                assert_eq!(desc.id, 0);
                assert_eq!(desc.ctor, "Float32Array");
                assert_eq!(desc.length, 1024);
            }
            other => panic!("expected descriptor, got {other:?}"),
        }
        assert!(transfers.get(0).unwrap().same_allocation(&array));
    }

    #[test]
    fn large_buffers_stay_native_when_shared() {
        let array = sample(ElementType::Uint32, 1024);
        let mut transfers = TransferList::new();
        let wire = encode(&array, &CodecPolicy::shared(), &mut transfers);
        match &wire {
            WireBuffer::Native(native) => assert!(native.same_allocation(&array)),
            other => panic!("expected native, got {other:?}"),
        }
        assert!(transfers.is_empty());
    }

    #[test]
    fn roundtrip_every_type_through_both_branches() {
        for ty in ElementType::ALL {
            for len in [0, 9, 255, 256, 4096] {
                let array = sample(ty, len);
                let mut transfers = TransferList::new();
                let wire = encode(&array, &CodecPolicy::transfer(), &mut transfers);
                let back = decode(&wire, ty, &transfers).unwrap();
                assert_eq!(back, array, "{ty} x {len}");
            }
        }
    }

    #[test]
    fn exact_descriptor_decodes_without_copy() {
        let array = sample(ElementType::Int16, 2048);
        let mut transfers = TransferList::new();
        let wire = encode(&array, &CodecPolicy::transfer(), &mut transfers);
        let back = decode(&wire, ElementType::Int16, &transfers).unwrap();
        assert!(back.same_allocation(&array));
    }

    #[test]
    fn descriptor_with_offset_reads_sub_range() {
        let raw = AttributeArray::from(vec![0u8, 0, 0, 0, 0, 0, 128, 63, 0, 0, 0, 64]);
        let transfers = TransferList::from_buffers(vec![raw]);
        let desc = BufferDescriptor::new(0, ElementType::Float32, 4, 2);
        let back = decode(&WireBuffer::Descriptor(desc), ElementType::Float32, &transfers).unwrap();
        assert_eq!(back, AttributeArray::from(vec![1.0f32, 2.0]));
    }

    #[test]
    fn descriptor_errors() {
        let transfers = TransferList::from_buffers(vec![AttributeArray::from(vec![0u8; 8])]);

        let missing = BufferDescriptor::new(3, ElementType::Uint8, 0, 1);
        assert_eq!(
            decode(&WireBuffer::Descriptor(missing), ElementType::Uint8, &transfers),
            Err(CodecError::MissingTransfer {
                id: 3,
                available: 1
            })
        );

        let misaligned = BufferDescriptor::new(0, ElementType::Float32, 2, 1);
        assert!(matches!(
            decode(&WireBuffer::Descriptor(misaligned), ElementType::Float32, &transfers),
            Err(CodecError::Misaligned { offset: 2, .. })
        ));

        let too_long = BufferDescriptor::new(0, ElementType::Uint16, 4, 3);
        assert!(matches!(
            decode(&WireBuffer::Descriptor(too_long), ElementType::Uint16, &transfers),
            Err(CodecError::OutOfBounds { byte_len: 8, .. })
        ));
    }

    #[test]
    fn unknown_ctor_falls_back_to_float32() {
        let raw = AttributeArray::from(vec![1.5f32, 2.5]);
        let transfers = TransferList::from_buffers(vec![raw]);
        let mut desc = BufferDescriptor::new(0, ElementType::Float32, 0, 2);
        desc.ctor = "BigFloatArray".into();
        let back = decode(&WireBuffer::Descriptor(desc), ElementType::Uint8, &transfers).unwrap();
        assert_eq!(back, AttributeArray::from(vec![1.5f32, 2.5]));
    }

    #[test]
    fn lower_then_raise_restores_native() {
        let array = sample(ElementType::Float64, 1000);
        let mut transfers = TransferList::new();
        let lowered = lower(
            WireBuffer::Native(array.clone()),
            &CodecPolicy::shared(),
            &mut transfers,
        );
        assert!(matches!(lowered, WireBuffer::Descriptor(_)));

        let raised = raise(lowered, &transfers).unwrap();
        match raised {
            WireBuffer::Native(native) => assert!(native.same_allocation(&array)),
            other => panic!("expected native, got {other:?}"),
        }
    }
}
