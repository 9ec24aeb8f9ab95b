//! Property checks for the codec laws: any value survives a round trip
//! through arbitrarily small buffers, and every integer and header takes the
//! narrowest encoding.

use std::io::Cursor;

use boltr_packstream::io::{BufferedChannelInput, BufferedChannelOutput};
use boltr_packstream::packstream::{Packer, Unpacker};
use boltr_packstream::types::{PackStruct, PackValue};
use proptest::prelude::*;

type TestPacker = Packer<BufferedChannelOutput<Vec<u8>>>;

fn encode_with(capacity: usize, f: impl FnOnce(&mut TestPacker)) -> Vec<u8> {
    let mut packer = Packer::new(BufferedChannelOutput::with_channel(Vec::new(), capacity));
    f(&mut packer);
    packer.into_inner().into_inner().unwrap().unwrap()
}

fn decode_with(capacity: usize, bytes: Vec<u8>) -> (PackValue, bool) {
    let input = BufferedChannelInput::with_channel(Cursor::new(bytes), capacity);
    let mut unpacker = Unpacker::new(input);
    let value = unpacker.unpack_value().unwrap();
    (value, unpacker.has_next().unwrap())
}

fn scalar() -> impl Strategy<Value = PackValue> {
    prop_oneof![
        Just(PackValue::Null),
        any::<bool>().prop_map(PackValue::from),
        any::<i64>().prop_map(PackValue::from),
        (-200i64..200).prop_map(PackValue::from),
        any::<f64>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(PackValue::from),
        ".{0,40}".prop_map(PackValue::from),
        prop::collection::vec(any::<u8>(), 0..300).prop_map(PackValue::from),
    ]
}

fn value() -> impl Strategy<Value = PackValue> {
    scalar().prop_recursive(4, 256, 20, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..20).prop_map(PackValue::List),
            prop::collection::vec(("[a-z]{0,8}", inner.clone()), 0..20).prop_map(PackValue::Map),
            (any::<u8>(), prop::collection::vec(inner, 0..20)).prop_map(|(signature, fields)| {
                PackValue::Struct(PackStruct::new(signature, fields))
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_values_round_trip(v in value(), out_cap in 8usize..64, in_cap in 8usize..64) {
        let bytes = encode_with(out_cap, |p| p.pack_value(&v).unwrap());
        let (decoded, trailing) = decode_with(in_cap, bytes);
        prop_assert_eq!(decoded, v);
        prop_assert!(!trailing);
    }

    #[test]
    fn prop_integers_take_narrowest_width(n in any::<i64>()) {
        let bytes = encode_with(16, |p| p.pack_i64(n).unwrap());
        let width = if (-16..=127).contains(&n) {
            1
        } else if i8::try_from(n).is_ok() {
            2
        } else if i16::try_from(n).is_ok() {
            3
        } else if i32::try_from(n).is_ok() {
            5
        } else {
            9
        };
        prop_assert_eq!(bytes.len(), width);
        prop_assert_eq!(decode_with(8, bytes).0, PackValue::Integer(n));
    }

    #[test]
    fn prop_list_header_width(size in 0usize..(1 << 24)) {
        let bytes = encode_with(16, |p| p.pack_list_header(size).unwrap());
        let width = match size {
            s if s < 16 => 1,
            s if s < 128 => 2,
            s if s < 32768 => 3,
            _ => 5,
        };
        prop_assert_eq!(bytes.len(), width);
    }

    #[test]
    fn prop_streamed_lists_match_sized(items in prop::collection::vec(scalar(), 0..40)) {
        let streamed = encode_with(8, |p| {
            p.pack_list_stream_header().unwrap();
            for item in &items {
                p.pack_value(item).unwrap();
            }
            p.pack_end_of_stream().unwrap();
        });
        let sized = encode_with(8, |p| p.pack_value(&PackValue::List(items.clone())).unwrap());
        prop_assert_eq!(decode_with(8, streamed).0, decode_with(8, sized).0);
    }
}
