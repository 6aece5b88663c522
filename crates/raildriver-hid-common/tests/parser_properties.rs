//! Property tests for the report cursor and builder.

use proptest::prelude::*;
use raildriver_hid_common::{HidCommonError, ReportBuilder, ReportParser};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_parser_reads_every_byte_in_order(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut parser = ReportParser::new(&data);
        let mut seen = Vec::with_capacity(data.len());
        while let Ok(byte) = parser.read_u8() {
            seen.push(byte);
        }
        prop_assert_eq!(parser.remaining(), 0);
        prop_assert_eq!(&seen, &data);
    }

    #[test]
    fn prop_skip_never_passes_end(
        data in proptest::collection::vec(any::<u8>(), 0..32),
        skip in 0usize..128,
    ) {
        let mut parser = ReportParser::new(&data);
        parser.skip(skip);
        prop_assert!(parser.position() <= data.len());
        prop_assert_eq!(parser.remaining(), data.len().saturating_sub(skip));
    }

    #[test]
    fn prop_builder_keeps_length(len in 1usize..64, offset in 0usize..128, value in any::<u8>()) {
        let mut builder = ReportBuilder::new(len);
        let result = builder.put_u8(offset, value).map(|_| ());
        if offset < len {
            prop_assert!(result.is_ok());
            prop_assert_eq!(builder.as_slice().get(offset).copied(), Some(value));
        } else {
            let rejected = matches!(result, Err(HidCommonError::InvalidReportSize { .. }));
            prop_assert!(rejected);
        }
        prop_assert_eq!(builder.len(), len);
    }
}
